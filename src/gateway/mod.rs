//! Aggregation gateway.
//!
//! Resolves a [`Query`] against the three services. Each `Account.orders`
//! field is its own remote call with its own deadline, and a failure there
//! only nulls that field: the rest of the response still resolves.
//!
//! All child calls run inside the future returned by [`Gateway::execute`],
//! so dropping that future cancels every call still in flight.

pub mod schema;

pub use schema::{
    AccountSelection, AccountView, AccountsArgs, FieldError, FieldValue, OrderView, OrderedProductView,
    PathSegment, ProductView, ProductsArgs, Query, QueryData, QueryResponse, Resolution,
};

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::clients::{AccountApi, CatalogApi, OrderApi};
use crate::domain::{Account, Order};
use crate::error::ServiceResult;

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_ORDERS_FIELD_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy)]
pub struct GatewayConfig {
    /// Deadline for top-level `accounts` and `products` lookups.
    pub call_timeout: Duration,
    /// Deadline for each `Account.orders` lookup.
    pub orders_field_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            call_timeout: DEFAULT_CALL_TIMEOUT,
            orders_field_timeout: DEFAULT_ORDERS_FIELD_TIMEOUT,
        }
    }
}

pub struct Gateway {
    accounts: Arc<dyn AccountApi>,
    catalog: Arc<dyn CatalogApi>,
    orders: Arc<dyn OrderApi>,
    config: GatewayConfig,
}

impl Gateway {
    pub fn new(
        accounts: Arc<dyn AccountApi>,
        catalog: Arc<dyn CatalogApi>,
        orders: Arc<dyn OrderApi>,
        config: GatewayConfig,
    ) -> Self {
        Self {
            accounts,
            catalog,
            orders,
            config,
        }
    }

    /// Resolves every selected top-level field concurrently.
    #[instrument(skip_all)]
    pub async fn execute(&self, query: &Query) -> QueryResponse {
        let accounts = async {
            match &query.accounts {
                Some((args, selection)) => Some(self.accounts(args, *selection).await),
                None => None,
            }
        };
        let products = async {
            match &query.products {
                Some(args) => Some(self.products(args).await),
                None => None,
            }
        };
        let (accounts, products) = tokio::join!(accounts, products);

        let mut errors = Vec::new();
        let accounts = match accounts {
            Some(resolution) => {
                errors.extend(resolution.errors);
                resolution.value
            }
            None => FieldValue::Unselected,
        };
        let products = match products {
            Some(resolution) => {
                errors.extend(resolution.errors);
                resolution.value
            }
            None => FieldValue::Unselected,
        };

        info!(errors = errors.len(), "Query resolved");
        QueryResponse {
            data: QueryData { accounts, products },
            errors,
        }
    }

    /// `accounts(pagination, id)` with `orders` resolved per account when
    /// selected.
    #[instrument(skip(self, args), fields(id = ?args.id))]
    pub async fn accounts(&self, args: &AccountsArgs, selection: AccountSelection) -> Resolution<Vec<AccountView>> {
        let deadline = Instant::now() + self.config.call_timeout;
        let fetched = match &args.id {
            Some(id) => self.accounts.get_account(id, deadline).await.map(|account| vec![account]),
            None => self.accounts.get_accounts(args.pagination, deadline).await,
        };
        let accounts = match fetched {
            Ok(accounts) => accounts,
            Err(e) => {
                warn!(error = %e, "accounts failed");
                return Resolution::failed(FieldError::new(vec!["accounts".into()], &e));
            }
        };

        if !selection.orders {
            let views = accounts
                .into_iter()
                .map(|account| AccountView::new(account, FieldValue::Unselected))
                .collect();
            return Resolution::ok(views, Vec::new());
        }

        debug!(fan_out = accounts.len(), "Resolving Account.orders");
        let resolved = join_all(accounts.iter().map(|account| self.account_orders(account))).await;

        let mut errors = Vec::new();
        let mut views = Vec::with_capacity(accounts.len());
        for (index, (account, orders)) in accounts.into_iter().zip(resolved).enumerate() {
            let orders = match orders {
                Ok(orders) => FieldValue::Resolved(orders.iter().map(OrderView::from).collect()),
                Err(e) => {
                    errors.push(FieldError::new(
                        vec!["accounts".into(), index.into(), "orders".into()],
                        &e,
                    ));
                    FieldValue::Failed
                }
            };
            views.push(AccountView::new(account, orders));
        }
        Resolution::ok(views, errors)
    }

    /// `Account.orders` for one parent account.
    #[instrument(skip(self, account), fields(account_id = %account.id))]
    async fn account_orders(&self, account: &Account) -> ServiceResult<Vec<Order>> {
        let deadline = Instant::now() + self.config.orders_field_timeout;
        let result = self.orders.get_orders_for_account(&account.id, deadline).await;
        if let Err(e) = &result {
            warn!(error = %e, retryable = e.is_retryable(), "Account.orders failed");
        }
        result
    }

    /// `products(pagination, query, id)`.
    #[instrument(skip(self, args), fields(id = ?args.id, query = ?args.query))]
    pub async fn products(&self, args: &ProductsArgs) -> Resolution<Vec<ProductView>> {
        let deadline = Instant::now() + self.config.call_timeout;
        let query = args.query.as_deref().filter(|q| !q.trim().is_empty());

        let fetched = match (&args.id, query) {
            (Some(id), _) => self.catalog.get_product(id, deadline).await.map(|product| vec![product]),
            (None, Some(query)) => self.catalog.search_products(query, args.pagination, deadline).await,
            (None, None) => self.catalog.get_products(args.pagination, deadline).await,
        };

        match fetched {
            Ok(products) => Resolution::ok(products.into_iter().map(ProductView::from).collect(), Vec::new()),
            Err(e) => {
                warn!(error = %e, "products failed");
                Resolution::failed(FieldError::new(vec!["products".into()], &e))
            }
        }
    }
}
