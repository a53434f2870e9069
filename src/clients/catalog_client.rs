use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::instrument;

use super::{CatalogApi, RpcChannel};
use crate::domain::{Pagination, Product};
use crate::error::ServiceResult;
use crate::messages::CatalogRequest;

/// Client for the catalog service.
#[derive(Clone)]
pub struct CatalogClient {
    channel: RpcChannel<CatalogRequest>,
}

impl CatalogClient {
    pub fn new(sender: mpsc::Sender<CatalogRequest>) -> Self {
        Self {
            channel: RpcChannel::new("catalog service", sender),
        }
    }

    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> ServiceResult<()> {
        self.channel.notify(CatalogRequest::Shutdown).await
    }
}

#[async_trait]
impl CatalogApi for CatalogClient {
    #[instrument(skip(self, description, deadline))]
    async fn post_product(
        &self,
        name: &str,
        description: &str,
        price: Decimal,
        deadline: Instant,
    ) -> ServiceResult<Product> {
        let name = name.to_string();
        let description = description.to_string();
        self.channel
            .call(deadline, |respond_to| CatalogRequest::PostProduct {
                name,
                description,
                price,
                deadline,
                respond_to,
            })
            .await
    }

    #[instrument(skip(self, deadline))]
    async fn get_product(&self, id: &str, deadline: Instant) -> ServiceResult<Product> {
        let id = id.to_string();
        self.channel
            .call(deadline, |respond_to| CatalogRequest::GetProduct {
                id,
                deadline,
                respond_to,
            })
            .await
    }

    #[instrument(skip(self, deadline))]
    async fn get_products(&self, page: Pagination, deadline: Instant) -> ServiceResult<Vec<Product>> {
        self.channel
            .call(deadline, |respond_to| CatalogRequest::GetProducts {
                page,
                deadline,
                respond_to,
            })
            .await
    }

    #[instrument(skip(self, deadline), fields(count = ids.len()))]
    async fn get_products_by_ids(&self, ids: Vec<String>, deadline: Instant) -> ServiceResult<Vec<Product>> {
        self.channel
            .call(deadline, |respond_to| CatalogRequest::GetProductsByIds {
                ids,
                deadline,
                respond_to,
            })
            .await
    }

    #[instrument(skip(self, deadline))]
    async fn search_products(
        &self,
        query: &str,
        page: Pagination,
        deadline: Instant,
    ) -> ServiceResult<Vec<Product>> {
        let query = query.to_string();
        self.channel
            .call(deadline, |respond_to| CatalogRequest::SearchProducts {
                query,
                page,
                deadline,
                respond_to,
            })
            .await
    }
}
