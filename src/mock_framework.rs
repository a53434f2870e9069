//! # Mock Framework
//!
//! Utilities for testing components in isolation.
//!
//! Two flavours:
//! - **Mock clients**: [`create_mock_account_client`] and friends return a real
//!   channel client plus the receiving end of its channel. Helpers like
//!   [`expect_get_account`] pull the next request off the channel so a test
//!   can assert on it and answer (or not answer) it.
//! - **Fakes**: [`FakeAccounts`], [`FakeCatalog`], [`FakeOrders`] and
//!   [`RecordingOrderRepository`] implement the capability traits directly,
//!   with optional failures and delays, for orchestrator and gateway tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::clients::{AccountApi, AccountClient, CatalogApi, CatalogClient, OrderApi, OrderClient};
use crate::domain::{Account, Order, OrderLine, OrderedProduct, Pagination, Product};
use crate::error::{ServiceError, ServiceResult};
use crate::messages::{AccountRequest, CatalogRequest, OrderRequest, ServiceResponse};
use crate::repository::OrderRepository;
use crate::wire::OrderWire;

// =============================================================================
// Mock clients
// =============================================================================

pub fn create_mock_account_client(buffer_size: usize) -> (AccountClient, mpsc::Receiver<AccountRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (AccountClient::new(sender), receiver)
}

pub fn create_mock_catalog_client(buffer_size: usize) -> (CatalogClient, mpsc::Receiver<CatalogRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (CatalogClient::new(sender), receiver)
}

pub fn create_mock_order_client(buffer_size: usize) -> (OrderClient, mpsc::Receiver<OrderRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (OrderClient::new(sender), receiver)
}

/// Helper to verify that the next message is a GetAccount request
pub async fn expect_get_account(
    receiver: &mut mpsc::Receiver<AccountRequest>,
) -> Option<(String, ServiceResponse<Account>)> {
    match receiver.recv().await {
        Some(AccountRequest::GetAccount { id, respond_to, .. }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a GetProductsByIds request
pub async fn expect_get_products_by_ids(
    receiver: &mut mpsc::Receiver<CatalogRequest>,
) -> Option<(Vec<String>, ServiceResponse<Vec<Product>>)> {
    match receiver.recv().await {
        Some(CatalogRequest::GetProductsByIds { ids, respond_to, .. }) => Some((ids, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a GetOrdersForAccount request
pub async fn expect_get_orders_for_account(
    receiver: &mut mpsc::Receiver<OrderRequest>,
) -> Option<(String, ServiceResponse<Vec<OrderWire>>)> {
    match receiver.recv().await {
        Some(OrderRequest::GetOrdersForAccount {
            account_id,
            respond_to,
            ..
        }) => Some((account_id, respond_to)),
        _ => None,
    }
}

// =============================================================================
// Fakes
// =============================================================================

/// Waits `delay`, giving up with `Unavailable` once `deadline` passes.
async fn stall(delay: Duration, deadline: Instant) -> ServiceResult<()> {
    if delay.is_zero() {
        return Ok(());
    }
    tokio::time::timeout_at(deadline, tokio::time::sleep(delay))
        .await
        .map_err(|_| ServiceError::Unavailable("deadline exceeded".to_string()))
}

fn page_of<T: Clone>(items: &[T], page: Pagination) -> Vec<T> {
    let (skip, take) = page.bounds();
    items.iter().skip(skip as usize).take(take as usize).cloned().collect()
}

#[derive(Default)]
pub struct FakeAccounts {
    accounts: Vec<Account>,
    failure: Option<ServiceError>,
    delay: Duration,
    pub calls: AtomicUsize,
}

impl FakeAccounts {
    pub fn with(accounts: Vec<Account>) -> Self {
        Self {
            accounts,
            ..Self::default()
        }
    }

    pub fn failing(error: ServiceError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    async fn begin(&self, deadline: Instant) -> ServiceResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        stall(self.delay, deadline).await?;
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AccountApi for FakeAccounts {
    async fn post_account(&self, name: &str, deadline: Instant) -> ServiceResult<Account> {
        self.begin(deadline).await?;
        Ok(Account::new(format!("acc_{}", self.accounts.len() + 1), name))
    }

    async fn get_account(&self, id: &str, deadline: Instant) -> ServiceResult<Account> {
        self.begin(deadline).await?;
        self.accounts
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("account {id}")))
    }

    async fn get_accounts(&self, page: Pagination, deadline: Instant) -> ServiceResult<Vec<Account>> {
        self.begin(deadline).await?;
        Ok(page_of(&self.accounts, page))
    }
}

#[derive(Default)]
pub struct FakeCatalog {
    products: Vec<Product>,
    failure: Option<ServiceError>,
    delay: Duration,
    pub calls: AtomicUsize,
    pub requested_ids: Mutex<Vec<Vec<String>>>,
    pub searches: Mutex<Vec<String>>,
}

impl FakeCatalog {
    pub fn with(products: Vec<Product>) -> Self {
        Self {
            products,
            ..Self::default()
        }
    }

    pub fn failing(error: ServiceError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    async fn begin(&self, deadline: Instant) -> ServiceResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        stall(self.delay, deadline).await?;
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CatalogApi for FakeCatalog {
    async fn post_product(
        &self,
        name: &str,
        description: &str,
        price: Decimal,
        deadline: Instant,
    ) -> ServiceResult<Product> {
        self.begin(deadline).await?;
        Ok(Product::new(format!("p_{}", self.products.len() + 1), name, description, price))
    }

    async fn get_product(&self, id: &str, deadline: Instant) -> ServiceResult<Product> {
        self.begin(deadline).await?;
        self.products
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("product {id}")))
    }

    async fn get_products(&self, page: Pagination, deadline: Instant) -> ServiceResult<Vec<Product>> {
        self.begin(deadline).await?;
        Ok(page_of(&self.products, page))
    }

    async fn get_products_by_ids(&self, ids: Vec<String>, deadline: Instant) -> ServiceResult<Vec<Product>> {
        self.requested_ids.lock().unwrap().push(ids.clone());
        self.begin(deadline).await?;
        // Catalog order, not request order.
        Ok(self
            .products
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn search_products(
        &self,
        query: &str,
        page: Pagination,
        deadline: Instant,
    ) -> ServiceResult<Vec<Product>> {
        self.searches.lock().unwrap().push(query.to_string());
        self.begin(deadline).await?;
        let needle = query.to_lowercase();
        let hits: Vec<Product> = self
            .products
            .iter()
            .filter(|p| p.searchable_text().to_lowercase().contains(&needle))
            .cloned()
            .collect();
        Ok(page_of(&hits, page))
    }
}

#[derive(Default)]
pub struct FakeOrders {
    orders: Vec<Order>,
    failure: Option<ServiceError>,
    failing_accounts: HashSet<String>,
    delay: Duration,
    pub calls: AtomicUsize,
}

impl FakeOrders {
    pub fn with(orders: Vec<Order>) -> Self {
        Self {
            orders,
            ..Self::default()
        }
    }

    pub fn failing(error: ServiceError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    /// Fail only lookups for the given account.
    pub fn failing_for(mut self, account_id: &str) -> Self {
        self.failing_accounts.insert(account_id.to_string());
        self
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl OrderApi for FakeOrders {
    async fn post_order(&self, account_id: &str, items: Vec<OrderLine>, deadline: Instant) -> ServiceResult<Order> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        stall(self.delay, deadline).await?;
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        let lines = items
            .iter()
            .map(|line| {
                let product = Product::new(line.product_id.clone(), "", "", Decimal::ZERO);
                OrderedProduct::snapshot(&product, line.quantity)
            })
            .collect();
        Order::new("o_fake", account_id, Utc::now(), lines)
    }

    async fn get_orders_for_account(&self, account_id: &str, deadline: Instant) -> ServiceResult<Vec<Order>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        stall(self.delay, deadline).await?;
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        if self.failing_accounts.contains(account_id) {
            return Err(ServiceError::Unavailable(format!("orders for {account_id}")));
        }
        Ok(self
            .orders
            .iter()
            .filter(|o| o.account_id == account_id)
            .cloned()
            .collect())
    }
}

/// Order repository that counts writes. A write counts when it starts and
/// lands in `stored()` once its delay has passed.
#[derive(Default)]
pub struct RecordingOrderRepository {
    orders: Mutex<Vec<Order>>,
    failure: Option<ServiceError>,
    delay: Duration,
    pub writes: AtomicUsize,
}

impl RecordingOrderRepository {
    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing(error: ServiceError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn stored(&self) -> Vec<Order> {
        self.orders.lock().unwrap().clone()
    }
}

#[async_trait]
impl OrderRepository for RecordingOrderRepository {
    async fn put_order(&self, order: Order) -> ServiceResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        self.orders.lock().unwrap().push(order);
        Ok(())
    }

    async fn get_orders_for_account(&self, account_id: &str) -> ServiceResult<Vec<Order>> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        Ok(self
            .orders
            .lock()
            .unwrap()
            .iter()
            .filter(|o| o.account_id == account_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_catalog_client() {
        let (client, mut receiver) = create_mock_catalog_client(10);

        let call = tokio::spawn(async move {
            client
                .get_products_by_ids(
                    vec!["p1".to_string(), "p2".to_string()],
                    Instant::now() + Duration::from_secs(1),
                )
                .await
        });

        let (ids, responder) = expect_get_products_by_ids(&mut receiver)
            .await
            .expect("Expected GetProductsByIds request");
        assert_eq!(ids, vec!["p1", "p2"]);
        let lamp = Product::new("p1", "Lamp", "desk lamp", Decimal::new(1000, 2));
        responder.send(Ok(vec![lamp.clone()])).unwrap();

        assert_eq!(call.await.unwrap(), Ok(vec![lamp]));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fake_respects_deadline() {
        let accounts = FakeAccounts::with(vec![Account::new("acc1", "Alice")]).slow(Duration::from_secs(10));
        let result = accounts
            .get_account("acc1", Instant::now() + Duration::from_secs(1))
            .await;
        assert!(matches!(result, Err(ServiceError::Unavailable(_))));
    }
}
