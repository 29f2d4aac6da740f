use super::ProductId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: u64,
}

impl Product {
    /// Creates a product with a fresh id.
    pub fn new(name: impl Into<String>, price: u64) -> Self {
        Self {
            id: ProductId::new(),
            name: name.into(),
            price,
        }
    }
}
