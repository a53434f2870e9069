//! Storage contracts consumed by the services, plus their in-memory
//! implementations on top of [`StoreClient`].

use async_trait::async_trait;

use crate::actor_framework::{Record, StoreClient};
use crate::domain::{Account, Order, Product};
use crate::error::ServiceResult;

#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn put_account(&self, account: Account) -> ServiceResult<()>;
    async fn get_account_by_id(&self, id: &str) -> ServiceResult<Option<Account>>;
    async fn list_accounts(&self, skip: u64, take: u64) -> ServiceResult<Vec<Account>>;
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn put_product(&self, product: Product) -> ServiceResult<()>;
    async fn get_product_by_id(&self, id: &str) -> ServiceResult<Option<Product>>;
    async fn list_products(&self, skip: u64, take: u64) -> ServiceResult<Vec<Product>>;
    async fn list_products_with_ids(&self, ids: Vec<String>) -> ServiceResult<Vec<Product>>;
    async fn search_products(&self, query: &str, skip: u64, take: u64) -> ServiceResult<Vec<Product>>;
}

/// Orders are write-once: there is no update or delete.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Single atomic write of a complete order.
    async fn put_order(&self, order: Order) -> ServiceResult<()>;
    /// Orders of one account, in storage order.
    async fn get_orders_for_account(&self, account_id: &str) -> ServiceResult<Vec<Order>>;
}

impl Record for Account {
    const KIND: &'static str = "account";

    fn key(&self) -> &str {
        &self.id
    }
}

impl Record for Product {
    const KIND: &'static str = "product";

    fn key(&self) -> &str {
        &self.id
    }

    fn search_text(&self) -> Option<String> {
        Some(self.searchable_text())
    }
}

impl Record for Order {
    const KIND: &'static str = "order";

    fn key(&self) -> &str {
        &self.id
    }
}

#[async_trait]
impl AccountRepository for StoreClient<Account> {
    async fn put_account(&self, account: Account) -> ServiceResult<()> {
        self.put(account).await
    }

    async fn get_account_by_id(&self, id: &str) -> ServiceResult<Option<Account>> {
        self.get(id).await
    }

    async fn list_accounts(&self, skip: u64, take: u64) -> ServiceResult<Vec<Account>> {
        self.page(skip, take).await
    }
}

#[async_trait]
impl ProductRepository for StoreClient<Product> {
    async fn put_product(&self, product: Product) -> ServiceResult<()> {
        self.put(product).await
    }

    async fn get_product_by_id(&self, id: &str) -> ServiceResult<Option<Product>> {
        self.get(id).await
    }

    async fn list_products(&self, skip: u64, take: u64) -> ServiceResult<Vec<Product>> {
        self.page(skip, take).await
    }

    async fn list_products_with_ids(&self, ids: Vec<String>) -> ServiceResult<Vec<Product>> {
        self.get_many(ids).await
    }

    async fn search_products(&self, query: &str, skip: u64, take: u64) -> ServiceResult<Vec<Product>> {
        self.search(query, skip, take).await
    }
}

#[async_trait]
impl OrderRepository for StoreClient<Order> {
    async fn put_order(&self, order: Order) -> ServiceResult<()> {
        self.put(order).await
    }

    async fn get_orders_for_account(&self, account_id: &str) -> ServiceResult<Vec<Order>> {
        let account_id = account_id.to_string();
        self.select(move |order| order.account_id == account_id).await
    }
}
