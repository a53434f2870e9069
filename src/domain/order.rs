use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Product;
use crate::error::{ServiceError, ServiceResult};

/// A product as it was when the order was placed, plus the bought quantity.
///
/// Embedded by value so later catalog edits never touch placed orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedProduct {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub quantity: u32,
}

impl OrderedProduct {
    pub fn snapshot(product: &Product, quantity: u32) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            quantity,
        }
    }

    /// `price × quantity`, or `None` when it does not fit a `Decimal`.
    pub fn line_total(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.quantity))
    }
}

/// A placed order. Immutable once persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub account_id: String,
    pub created_at: DateTime<Utc>,
    pub total_price: Decimal,
    pub products: Vec<OrderedProduct>,
}

impl Order {
    /// Assembles an order, computing the total from the given lines.
    ///
    /// Fails with `Validation` when the total does not fit a `Decimal`.
    pub fn new(
        id: impl Into<String>,
        account_id: impl Into<String>,
        created_at: DateTime<Utc>,
        products: Vec<OrderedProduct>,
    ) -> ServiceResult<Self> {
        let total_price = products
            .iter()
            .try_fold(Decimal::ZERO, |total, line| {
                line.line_total().and_then(|amount| total.checked_add(amount))
            })
            .ok_or_else(|| ServiceError::Validation("order total overflows".to_string()))?;

        Ok(Self {
            id: id.into(),
            account_id: account_id.into(),
            created_at,
            total_price,
            products,
        })
    }
}

/// One requested item of a place-order call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: String,
    pub quantity: u32,
}

impl OrderLine {
    pub fn new(product_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}
