//! Per-invocation state of the create-order use case.
//!
//! The pipeline owns the context for the duration of one invocation and lends it mutably to each
//! hook and to the domain operation. Every slot is written at most once, in a fixed order:
//! `user`, then `product`, then `result`. An out-of-order or repeated write is a defect in a hook
//! and is rejected with [`UseCaseError::InvariantViolation`].

use crate::model::{CreateOrderRequest, Order, Product, User};
use pipeline_framework::UseCaseError;

#[derive(Debug, Clone)]
pub struct CreateOrderContext {
    request: CreateOrderRequest,
    user: Option<User>,
    product: Option<Product>,
    result: Option<Order>,
}

impl CreateOrderContext {
    pub fn new(request: CreateOrderRequest) -> Self {
        Self {
            request,
            user: None,
            product: None,
            result: None,
        }
    }

    pub fn request(&self) -> &CreateOrderRequest {
        &self.request
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn product(&self) -> Option<&Product> {
        self.product.as_ref()
    }

    pub fn result(&self) -> Option<&Order> {
        self.result.as_ref()
    }

    /// Consumes the context, yielding the produced order if there is one.
    pub fn into_result(self) -> Option<Order> {
        self.result
    }

    pub fn set_user(&mut self, user: User) -> Result<(), UseCaseError> {
        if self.user.is_some() {
            return Err(rewrite("user"));
        }
        self.user = Some(user);
        Ok(())
    }

    pub fn set_product(&mut self, product: Product) -> Result<(), UseCaseError> {
        if self.product.is_some() {
            return Err(rewrite("product"));
        }
        if self.user.is_none() {
            return Err(out_of_order("product", "user"));
        }
        self.product = Some(product);
        Ok(())
    }

    pub fn set_result(&mut self, order: Order) -> Result<(), UseCaseError> {
        if self.result.is_some() {
            return Err(rewrite("result"));
        }
        if self.product.is_none() {
            return Err(out_of_order("result", "product"));
        }
        self.result = Some(order);
        Ok(())
    }
}

fn rewrite(slot: &str) -> UseCaseError {
    UseCaseError::InvariantViolation(format!("context {slot} written twice"))
}

fn out_of_order(slot: &str, missing: &str) -> UseCaseError {
    UseCaseError::InvariantViolation(format!("context {slot} written before {missing}"))
}
