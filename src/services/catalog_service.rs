use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn, Instrument};
use uuid::Uuid;

use crate::clients::CatalogClient;
use crate::domain::{Pagination, Product};
use crate::error::ServiceError;
use crate::messages::{serve_within, CatalogRequest, ServiceResponse};
use crate::repository::ProductRepository;

/// Catalog actor. Plain CRUD and search over its repository.
pub struct CatalogService {
    receiver: mpsc::Receiver<CatalogRequest>,
    repository: Arc<dyn ProductRepository>,
}

impl CatalogService {
    pub fn new(buffer_size: usize, repository: Arc<dyn ProductRepository>) -> (Self, CatalogClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let service = Self { receiver, repository };
        (service, CatalogClient::new(sender))
    }

    #[instrument(name = "catalog_service", skip(self))]
    pub async fn run(mut self) {
        info!("CatalogService starting");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                CatalogRequest::PostProduct {
                    name,
                    description,
                    price,
                    deadline,
                    respond_to,
                } => self.handle_post_product(name, description, price, deadline, respond_to),
                CatalogRequest::GetProduct {
                    id,
                    deadline,
                    respond_to,
                } => self.handle_get_product(id, deadline, respond_to),
                CatalogRequest::GetProducts {
                    page,
                    deadline,
                    respond_to,
                } => self.handle_get_products(page, deadline, respond_to),
                CatalogRequest::GetProductsByIds {
                    ids,
                    deadline,
                    respond_to,
                } => self.handle_get_products_by_ids(ids, deadline, respond_to),
                CatalogRequest::SearchProducts {
                    query,
                    page,
                    deadline,
                    respond_to,
                } => self.handle_search_products(query, page, deadline, respond_to),
                CatalogRequest::Shutdown => {
                    info!("CatalogService shutting down");
                    break;
                }
            }
        }

        info!("CatalogService stopped");
    }

    #[instrument(
        fields(product_name = %name, price = %price),
        skip(self, name, description, deadline, respond_to)
    )]
    fn handle_post_product(
        &self,
        name: String,
        description: String,
        price: Decimal,
        deadline: Instant,
        respond_to: ServiceResponse<Product>,
    ) {
        debug!("Processing post_product request");
        let repository = self.repository.clone();

        let work = async move {
            let name = name.trim();
            if name.is_empty() {
                warn!("Validation failed: empty name");
                return Err(ServiceError::Validation("product name is required".to_string()));
            }
            if price.is_sign_negative() {
                warn!("Validation failed: negative price");
                return Err(ServiceError::Validation(format!("price must not be negative, got {price}")));
            }
            let product = Product::new(Uuid::new_v4().to_string(), name, description, price);
            repository.put_product(product.clone()).await?;
            info!(product_id = %product.id, "Product created successfully");
            Ok(product)
        };
        tokio::spawn(serve_within(deadline, respond_to, work).in_current_span());
    }

    #[instrument(fields(product_id = %id), skip(self, id, deadline, respond_to))]
    fn handle_get_product(&self, id: String, deadline: Instant, respond_to: ServiceResponse<Product>) {
        debug!("Processing get_product request");
        let repository = self.repository.clone();

        let work = async move {
            repository
                .get_product_by_id(&id)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("product {id}")))
        };
        tokio::spawn(serve_within(deadline, respond_to, work).in_current_span());
    }

    #[instrument(skip(self, deadline, respond_to))]
    fn handle_get_products(&self, page: Pagination, deadline: Instant, respond_to: ServiceResponse<Vec<Product>>) {
        debug!("Processing get_products request");
        let repository = self.repository.clone();

        let work = async move {
            let (skip, take) = page.bounds();
            repository.list_products(skip, take).await
        };
        tokio::spawn(serve_within(deadline, respond_to, work).in_current_span());
    }

    #[instrument(fields(count = ids.len()), skip(self, ids, deadline, respond_to))]
    fn handle_get_products_by_ids(
        &self,
        ids: Vec<String>,
        deadline: Instant,
        respond_to: ServiceResponse<Vec<Product>>,
    ) {
        debug!("Processing get_products_by_ids request");
        let repository = self.repository.clone();

        let work = async move {
            let products = repository.list_products_with_ids(ids).await?;
            info!(found = products.len(), "Resolved products");
            Ok(products)
        };
        tokio::spawn(serve_within(deadline, respond_to, work).in_current_span());
    }

    #[instrument(skip(self, deadline, respond_to))]
    fn handle_search_products(
        &self,
        query: String,
        page: Pagination,
        deadline: Instant,
        respond_to: ServiceResponse<Vec<Product>>,
    ) {
        debug!("Processing search_products request");
        let repository = self.repository.clone();

        let work = async move {
            let (skip, take) = page.bounds();
            let hits = repository.search_products(&query, skip, take).await?;
            info!(hits = hits.len(), "Search completed");
            Ok(hits)
        };
        tokio::spawn(serve_within(deadline, respond_to, work).in_current_span());
    }
}
