//! Service client adapters.
//!
//! Each service is reached through a capability trait ([`AccountApi`],
//! [`CatalogApi`], [`OrderApi`]) so consumers can be handed a fake in tests.
//! The channel-backed clients are the production implementations.

mod account_client;
mod catalog_client;
mod order_client;

pub use account_client::AccountClient;
pub use catalog_client::CatalogClient;
pub use order_client::OrderClient;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::domain::{Account, Order, OrderLine, Pagination, Product};
use crate::error::{ServiceError, ServiceResult};
use crate::messages::ServiceResponse;

#[async_trait]
pub trait AccountApi: Send + Sync {
    async fn post_account(&self, name: &str, deadline: Instant) -> ServiceResult<Account>;
    async fn get_account(&self, id: &str, deadline: Instant) -> ServiceResult<Account>;
    async fn get_accounts(&self, page: Pagination, deadline: Instant) -> ServiceResult<Vec<Account>>;
}

#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn post_product(
        &self,
        name: &str,
        description: &str,
        price: Decimal,
        deadline: Instant,
    ) -> ServiceResult<Product>;
    async fn get_product(&self, id: &str, deadline: Instant) -> ServiceResult<Product>;
    async fn get_products(&self, page: Pagination, deadline: Instant) -> ServiceResult<Vec<Product>>;
    /// Unknown ids are left out of the result; order is not guaranteed.
    async fn get_products_by_ids(&self, ids: Vec<String>, deadline: Instant) -> ServiceResult<Vec<Product>>;
    async fn search_products(
        &self,
        query: &str,
        page: Pagination,
        deadline: Instant,
    ) -> ServiceResult<Vec<Product>>;
}

#[async_trait]
pub trait OrderApi: Send + Sync {
    async fn post_order(&self, account_id: &str, items: Vec<OrderLine>, deadline: Instant) -> ServiceResult<Order>;
    async fn get_orders_for_account(&self, account_id: &str, deadline: Instant) -> ServiceResult<Vec<Order>>;
}

/// Request side of a service's channel. Opened once at startup and shared by
/// every call to that service.
pub struct RpcChannel<R> {
    service: &'static str,
    sender: mpsc::Sender<R>,
}

impl<R> Clone for RpcChannel<R> {
    fn clone(&self) -> Self {
        Self {
            service: self.service,
            sender: self.sender.clone(),
        }
    }
}

impl<R: Send + 'static> RpcChannel<R> {
    pub fn new(service: &'static str, sender: mpsc::Sender<R>) -> Self {
        Self { service, sender }
    }

    /// Sends a request and waits for the reply until `deadline`.
    ///
    /// A closed service, a dropped reply or a missed deadline all come back
    /// as `Unavailable`.
    pub async fn call<T: Send>(
        &self,
        deadline: Instant,
        make: impl FnOnce(ServiceResponse<T>) -> R + Send,
    ) -> ServiceResult<T> {
        debug!(service = self.service, "Sending request");
        let (respond_to, response) = oneshot::channel();
        let request = make(respond_to);

        let exchange = async {
            self.sender.send(request).await.map_err(|_| {
                ServiceError::Unavailable(format!("{} is not accepting requests", self.service))
            })?;
            response
                .await
                .map_err(|_| ServiceError::Unavailable(format!("{} dropped the request", self.service)))?
        };

        match tokio::time::timeout_at(deadline, exchange).await {
            Ok(result) => result,
            Err(_) => {
                warn!(service = self.service, "Deadline exceeded");
                Err(ServiceError::Unavailable(format!("{} deadline exceeded", self.service)))
            }
        }
    }

    /// Fire-and-forget message such as a shutdown request.
    pub async fn notify(&self, request: R) -> ServiceResult<()> {
        self.sender
            .send(request)
            .await
            .map_err(|_| ServiceError::Unavailable(format!("{} is not accepting requests", self.service)))
    }
}
