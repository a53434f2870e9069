//! Typed query surface of the gateway and the shapes it responds with.
//!
//! Responses serialize in GraphQL response form: a `data` tree where a field
//! that failed to resolve is `null`, plus an `errors` list naming the path of
//! each failed field.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

use crate::domain::{Account, Order, OrderedProduct, Pagination, Product};
use crate::error::ServiceError;

// =============================================================================
// Arguments and selections
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct AccountsArgs {
    pub pagination: Pagination,
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProductsArgs {
    pub pagination: Pagination,
    pub query: Option<String>,
    pub id: Option<String>,
}

/// Which nested fields of `Account` to resolve. `id` and `name` come with
/// the account itself; `orders` costs one remote call per account.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccountSelection {
    pub orders: bool,
}

impl AccountSelection {
    pub fn with_orders() -> Self {
        Self { orders: true }
    }
}

/// A query document: the top-level fields to resolve.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub accounts: Option<(AccountsArgs, AccountSelection)>,
    pub products: Option<ProductsArgs>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accounts(mut self, args: AccountsArgs, selection: AccountSelection) -> Self {
        self.accounts = Some((args, selection));
        self
    }

    pub fn products(mut self, args: ProductsArgs) -> Self {
        self.products = Some(args);
        self
    }
}

// =============================================================================
// Field values and errors
// =============================================================================

/// State of one resolvable field in a response.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<T> {
    /// Not requested; left out of the serialized response.
    Unselected,
    Resolved(T),
    /// Resolution failed; serialized as `null`, with a matching [`FieldError`].
    Failed,
}

impl<T> FieldValue<T> {
    pub fn is_unselected(&self) -> bool {
        matches!(self, FieldValue::Unselected)
    }

    pub fn resolved(&self) -> Option<&T> {
        match self {
            FieldValue::Resolved(value) => Some(value),
            _ => None,
        }
    }
}

impl<T: Serialize> Serialize for FieldValue<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Resolved(value) => value.serialize(serializer),
            FieldValue::Unselected | FieldValue::Failed => serializer.serialize_none(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(name: &str) -> Self {
        PathSegment::Field(name.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorExtensions {
    pub code: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub message: String,
    pub path: Vec<PathSegment>,
    pub extensions: ErrorExtensions,
}

impl FieldError {
    pub fn new(path: Vec<PathSegment>, error: &ServiceError) -> Self {
        Self {
            message: error.to_string(),
            path,
            extensions: ErrorExtensions { code: error.kind() },
        }
    }
}

/// Value of one field plus the errors raised while resolving it and its
/// children.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution<T> {
    pub value: FieldValue<T>,
    pub errors: Vec<FieldError>,
}

impl<T> Resolution<T> {
    pub fn ok(value: T, errors: Vec<FieldError>) -> Self {
        Self {
            value: FieldValue::Resolved(value),
            errors,
        }
    }

    pub fn failed(error: FieldError) -> Self {
        Self {
            value: FieldValue::Failed,
            errors: vec![error],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryData {
    #[serde(skip_serializing_if = "FieldValue::is_unselected")]
    pub accounts: FieldValue<Vec<AccountView>>,
    #[serde(skip_serializing_if = "FieldValue::is_unselected")]
    pub products: FieldValue<Vec<ProductView>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResponse {
    pub data: QueryData,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

// =============================================================================
// Object views
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountView {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "FieldValue::is_unselected")]
    pub orders: FieldValue<Vec<OrderView>>,
}

impl AccountView {
    pub fn new(account: Account, orders: FieldValue<Vec<OrderView>>) -> Self {
        Self {
            id: account.id,
            name: account.name,
            orders,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub total_price: Decimal,
    pub products: Vec<OrderedProductView>,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.clone(),
            created_at: order.created_at,
            total_price: order.total_price,
            products: order.products.iter().map(OrderedProductView::from).collect(),
        }
    }
}

/// `Product` in the ordered-product context, where `quantity` is present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderedProductView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub quantity: i32,
}

impl From<&OrderedProduct> for OrderedProductView {
    fn from(product: &OrderedProduct) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            // Int is 32-bit signed on this surface.
            quantity: i32::try_from(product.quantity).unwrap_or(i32::MAX),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: Decimal,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            price: product.price,
        }
    }
}
