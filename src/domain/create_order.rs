use super::OrderError;
use crate::context::CreateOrderContext;
use crate::model::Order;
use pipeline_framework::{DomainOperation, UseCaseError};
use tracing::{debug, info};

/// Places an order if the loaded user can afford the loaded product.
///
/// Reads `user` and `product` from the context and writes `result`. On
/// [`OrderError::InsufficientFunds`] the result slot stays empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateOrder;

impl DomainOperation<CreateOrderContext> for CreateOrder {
    fn run(&self, ctx: &mut CreateOrderContext) -> Result<(), UseCaseError> {
        let user = ctx.user().ok_or_else(|| missing("user"))?;
        let product = ctx.product().ok_or_else(|| missing("product"))?;

        if !user.can_afford(product.price) {
            debug!(user_id = %user.id, balance = user.balance, price = product.price, "Rejected");
            return Err(UseCaseError::validation(OrderError::InsufficientFunds {
                balance: user.balance,
                price: product.price,
            }));
        }

        let order = Order::new(user.id, product.id);
        info!(order_id = %order.id, user_id = %order.user_id, product_id = %order.product_id, "Order constructed");
        ctx.set_result(order)
    }
}

fn missing(entity: &'static str) -> UseCaseError {
    UseCaseError::InvariantViolation(OrderError::MissingEntity(entity).to_string())
}
