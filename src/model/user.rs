use super::UserId;
use serde::{Deserialize, Serialize};

/// A customer with a spendable balance, in minor currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub balance: u64,
}

impl User {
    /// Creates a user with a fresh id.
    pub fn new(name: impl Into<String>, balance: u64) -> Self {
        Self {
            id: UserId::new(),
            name: name.into(),
            balance,
        }
    }

    pub fn can_afford(&self, price: u64) -> bool {
        self.balance >= price
    }
}
