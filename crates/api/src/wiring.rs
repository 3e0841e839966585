//! Picks the backends named by the configuration and assembles the state.

use std::sync::Arc;

use cart::{HttpCartService, InMemoryCartService};
use event_channel::{InMemoryEventChannel, OrderEventPublisher};
use orders::{InMemoryOrderStore, PostgresOrderStore};
use payment::{
    InMemoryPaymentLedger, PaymentConfig, PaymentProcessor, PostgresPaymentLedger, ScriptedGateway,
};
use saga::{HttpPaymentClient, LocalPaymentClient, OrderSaga, SagaConfig};
use sqlx::postgres::PgPoolOptions;

use crate::config::Config;
use crate::error::StartupError;
use crate::{AppState, SharedCartService, SharedLedger, SharedOrderStore, SharedPaymentClient};

/// Everything the process runs: the HTTP state plus the pieces the cart
/// clearing consumer needs.
pub struct Services {
    pub state: Arc<AppState>,
    pub channel: InMemoryEventChannel,
    pub carts: SharedCartService,
}

impl Services {
    /// Assembles services from already-built backends.
    ///
    /// The payment endpoint is always served in-process; the saga reaches it
    /// through `payment_client` when given, or directly otherwise.
    pub fn assemble(
        config: &Config,
        orders: SharedOrderStore,
        ledger: SharedLedger,
        carts: SharedCartService,
        gateway: ScriptedGateway,
        payment_client: Option<SharedPaymentClient>,
    ) -> Self {
        let channel = InMemoryEventChannel::new(config.event_partitions);
        let payments = Arc::new(PaymentProcessor::with_config(
            ledger,
            gateway,
            PaymentConfig {
                gateway_timeout: config.gateway_timeout,
            },
        ));
        let payment_client: SharedPaymentClient = match payment_client {
            Some(client) => client,
            None => Arc::new(LocalPaymentClient::new(Arc::clone(&payments))),
        };

        let saga = OrderSaga::with_config(
            orders,
            Arc::clone(&carts),
            payment_client,
            OrderEventPublisher::new(channel.clone()),
            SagaConfig {
                cart_timeout: config.cart_timeout,
                payment_timeout: config.payment_timeout,
            },
        );

        Self {
            state: Arc::new(AppState { saga, payments }),
            channel,
            carts,
        }
    }

    /// All-in-memory services around the given cart service and gateway.
    pub fn in_memory(config: &Config, carts: SharedCartService, gateway: ScriptedGateway) -> Self {
        Self::assemble(
            config,
            Arc::new(InMemoryOrderStore::new()),
            Arc::new(InMemoryPaymentLedger::new()),
            carts,
            gateway,
            None,
        )
    }
}

/// Builds services from configuration, connecting to PostgreSQL and the
/// remote cart and payment services when their URLs are set.
pub async fn build_services(config: &Config) -> Result<Services, StartupError> {
    let orders: SharedOrderStore;
    let ledger: SharedLedger;
    match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new().max_connections(10).connect(url).await?;
            let store = PostgresOrderStore::new(pool.clone());
            store.run_migrations().await?;
            tracing::info!("using PostgreSQL stores");
            orders = Arc::new(store);
            ledger = Arc::new(PostgresPaymentLedger::new(pool));
        }
        None => {
            tracing::info!("DATABASE_URL not set, using in-memory stores");
            orders = Arc::new(InMemoryOrderStore::new());
            ledger = Arc::new(InMemoryPaymentLedger::new());
        }
    }

    let carts: SharedCartService = match &config.cart_service_url {
        Some(url) => {
            tracing::info!(%url, "using remote cart service");
            Arc::new(HttpCartService::new(url.clone(), config.cart_timeout)?)
        }
        None => {
            tracing::info!("CART_SERVICE_URL not set, using in-memory carts");
            Arc::new(InMemoryCartService::new())
        }
    };

    let payment_client: Option<SharedPaymentClient> = match &config.payment_service_url {
        Some(url) => {
            tracing::info!(%url, "using remote payment service");
            Some(Arc::new(HttpPaymentClient::new(
                url.clone(),
                config.payment_timeout,
            )?))
        }
        None => None,
    };

    Ok(Services::assemble(
        config,
        orders,
        ledger,
        carts,
        ScriptedGateway::new(),
        payment_client,
    ))
}
