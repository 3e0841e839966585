//! Cart snapshot and caller credentials.

use common::{Money, ProductId};
use serde::{Deserialize, Deserializer, Serialize};

/// One line of a customer's cart as the cart service reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    #[serde(deserialize_with = "product_id_from_any")]
    pub product_id: ProductId,
    pub product_name: String,

    /// Current catalog price. Copied into the order at checkout.
    #[serde(alias = "price", with = "common::money::decimal")]
    pub unit_price: Money,
    pub quantity: u32,
}

impl CartLine {
    pub fn new(
        product_id: impl Into<ProductId>,
        product_name: impl Into<String>,
        unit_price: Money,
        quantity: u32,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            product_name: product_name.into(),
            unit_price,
            quantity,
        }
    }
}

/// A customer's cart. Unknown fields in the service's response are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    pub items: Vec<CartLine>,
}

impl Cart {
    pub fn new(items: Vec<CartLine>) -> Self {
        Self { items }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// The cart service keys products by numeric id; other catalogs use strings.
fn product_id_from_any<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ProductId, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Number(n) => ProductId::new(n.to_string()),
        RawId::Text(s) => ProductId::new(s),
    })
}

/// The caller's credentials, forwarded verbatim to the cart service.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    authorization: Option<String>,
}

impl AuthContext {
    /// An empty context, for in-process callers.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Wraps a raw `Authorization` header value.
    pub fn from_header(value: impl Into<String>) -> Self {
        Self {
            authorization: Some(value.into()),
        }
    }

    pub fn bearer(token: &str) -> Self {
        Self::from_header(format!("Bearer {token}"))
    }

    pub fn authorization(&self) -> Option<&str> {
        self.authorization.as_deref()
    }
}

impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shown = self.authorization.as_ref().map(|_| "<redacted>");
        f.debug_struct("AuthContext")
            .field("authorization", &shown)
            .finish()
    }
}
