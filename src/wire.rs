//! Wire representation of orders crossing the order service boundary.
//!
//! `created_at` travels as RFC 3339 text with nanosecond precision, so a
//! decoded order carries exactly the instant that was stored.

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{Order, OrderedProduct};
use crate::error::ServiceError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderedProductWire {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderWire {
    pub id: String,
    pub account_id: String,
    pub created_at: String,
    pub total_price: Decimal,
    pub products: Vec<OrderedProductWire>,
}

pub fn encode_timestamp(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_timestamp(text: &str) -> Result<DateTime<Utc>, ServiceError> {
    DateTime::parse_from_rfc3339(text)
        .map(|instant| instant.with_timezone(&Utc))
        .map_err(|e| ServiceError::Internal(format!("malformed created_at {text:?}: {e}")))
}

impl From<&Order> for OrderWire {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.clone(),
            account_id: order.account_id.clone(),
            created_at: encode_timestamp(&order.created_at),
            total_price: order.total_price,
            products: order
                .products
                .iter()
                .map(|p| OrderedProductWire {
                    id: p.id.clone(),
                    name: p.name.clone(),
                    description: p.description.clone(),
                    price: p.price,
                    quantity: p.quantity,
                })
                .collect(),
        }
    }
}

impl TryFrom<OrderWire> for Order {
    type Error = ServiceError;

    fn try_from(wire: OrderWire) -> Result<Self, Self::Error> {
        Ok(Order {
            created_at: decode_timestamp(&wire.created_at)?,
            id: wire.id,
            account_id: wire.account_id,
            // Stored total is authoritative; never recomputed on read.
            total_price: wire.total_price,
            products: wire
                .products
                .into_iter()
                .map(|p| OrderedProduct {
                    id: p.id,
                    name: p.name,
                    description: p.description,
                    price: p.price,
                    quantity: p.quantity,
                })
                .collect(),
        })
    }
}
