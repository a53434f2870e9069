//! Order placement: validate the buyer, resolve items against the catalog,
//! reconcile quantities and persist one immutable order.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use tokio::time::Instant;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::clients::{AccountApi, CatalogApi};
use crate::domain::{Account, Order, OrderLine, OrderedProduct, Product};
use crate::error::{ServiceError, ServiceResult};
use crate::repository::OrderRepository;

pub struct OrderOrchestrator {
    accounts: Arc<dyn AccountApi>,
    catalog: Arc<dyn CatalogApi>,
    repository: Arc<dyn OrderRepository>,
}

impl OrderOrchestrator {
    pub fn new(
        accounts: Arc<dyn AccountApi>,
        catalog: Arc<dyn CatalogApi>,
        repository: Arc<dyn OrderRepository>,
    ) -> Self {
        Self {
            accounts,
            catalog,
            repository,
        }
    }

    /// Places an order for `account_id`.
    ///
    /// Account validation and catalog resolution run concurrently; if either
    /// fails the other is abandoned and nothing is written. Lines whose
    /// product is unknown or whose quantity is zero are dropped without
    /// error, so an order may come back with no products and a zero total.
    #[instrument(skip(self, items, deadline), fields(lines = items.len()))]
    pub async fn place_order(
        &self,
        account_id: &str,
        items: &[OrderLine],
        deadline: Instant,
    ) -> ServiceResult<Order> {
        info!("Processing place_order request");

        let product_ids = distinct_product_ids(items);
        let (account, catalog_products) = tokio::try_join!(
            self.validate_account(account_id, deadline),
            self.resolve_products(product_ids, deadline),
        )?;
        info!(account_name = %account.name, "Account validation successful");

        let products = reconcile(&catalog_products, items);
        if products.len() < items.len() {
            info!(
                requested = items.len(),
                kept = products.len(),
                "Dropped unmatched or zero-quantity lines"
            );
        }

        let order = Order::new(Uuid::new_v4().to_string(), account.id, Utc::now(), products)
            .inspect_err(|e| warn!(error = %e, "Order rejected"))?;

        if Instant::now() >= deadline {
            warn!("Deadline passed before persisting");
            return Err(ServiceError::Unavailable("deadline exceeded before persisting order".to_string()));
        }
        self.persist(order.clone()).await?;

        info!(order_id = %order.id, total = %order.total_price, "Order placed successfully");
        Ok(order)
    }

    #[instrument(skip(self, deadline))]
    pub async fn list_orders_for_account(&self, account_id: &str, deadline: Instant) -> ServiceResult<Vec<Order>> {
        let orders = tokio::time::timeout_at(deadline, self.repository.get_orders_for_account(account_id))
            .await
            .map_err(|_| ServiceError::Unavailable("deadline exceeded listing orders".to_string()))??;
        info!(order_count = orders.len(), "Listed orders");
        Ok(orders)
    }

    /// Writes the order in its own task. Once started the write runs to
    /// completion even if the caller goes away.
    async fn persist(&self, order: Order) -> ServiceResult<()> {
        let repository = self.repository.clone();
        let write = tokio::spawn(async move { repository.put_order(order).await });

        match write.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                error!(error = %e, "Persisting order failed");
                Err(e)
            }
            Err(e) => {
                error!(error = %e, "Persist task failed");
                Err(ServiceError::Internal(format!("persist task failed: {e}")))
            }
        }
    }

    async fn validate_account(&self, account_id: &str, deadline: Instant) -> ServiceResult<Account> {
        match self.accounts.get_account(account_id, deadline).await {
            Ok(account) => Ok(account),
            Err(ServiceError::NotFound(_)) => {
                warn!("Account not found");
                Err(ServiceError::Validation("account not found".to_string()))
            }
            Err(e) => {
                error!(error = %e, "Account validation failed");
                Err(e)
            }
        }
    }

    async fn resolve_products(&self, ids: Vec<String>, deadline: Instant) -> ServiceResult<Vec<Product>> {
        self.catalog
            .get_products_by_ids(ids, deadline)
            .await
            .inspect_err(|e| error!(error = %e, "Catalog resolution failed"))
    }
}

fn distinct_product_ids(items: &[OrderLine]) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter(|line| seen.insert(line.product_id.as_str()))
        .map(|line| line.product_id.clone())
        .collect()
}

/// Pairs each catalog product with the first requested line for it and
/// keeps the pairs with a positive quantity, in catalog order.
fn reconcile(catalog_products: &[Product], items: &[OrderLine]) -> Vec<OrderedProduct> {
    let mut requested: HashMap<&str, u32> = HashMap::new();
    for line in items {
        requested.entry(line.product_id.as_str()).or_insert(line.quantity);
    }

    catalog_products
        .iter()
        .filter_map(|product| match requested.get(product.id.as_str()) {
            Some(&quantity) if quantity > 0 => Some(OrderedProduct::snapshot(product, quantity)),
            _ => None,
        })
        .collect()
}
