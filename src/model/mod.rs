//! Entities and request types of the order use case.

mod ids;
mod order;
mod product;
mod user;

pub use ids::{OrderId, ProductId, UserId};
pub use order::{CreateOrderRequest, Order};
pub use product::Product;
pub use user::User;
