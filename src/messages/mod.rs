use std::future::Future;
use rust_decimal::Decimal;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::domain::{Account, OrderLine, Pagination, Product};
use crate::error::{ServiceError, ServiceResult};
use crate::wire::OrderWire;

/// Reply channel of a service call.
pub type ServiceResponse<T> = oneshot::Sender<ServiceResult<T>>;

/// Typed request envelopes, one enum per service. Every call carries the
/// caller's deadline so the serving side can stop when it passes.

#[derive(Debug)]
pub enum AccountRequest {
    PostAccount {
        name: String,
        deadline: Instant,
        respond_to: ServiceResponse<Account>,
    },
    GetAccount {
        id: String,
        deadline: Instant,
        respond_to: ServiceResponse<Account>,
    },
    GetAccounts {
        page: Pagination,
        deadline: Instant,
        respond_to: ServiceResponse<Vec<Account>>,
    },
    Shutdown,
}

#[derive(Debug)]
pub enum CatalogRequest {
    PostProduct {
        name: String,
        description: String,
        price: Decimal,
        deadline: Instant,
        respond_to: ServiceResponse<Product>,
    },
    GetProduct {
        id: String,
        deadline: Instant,
        respond_to: ServiceResponse<Product>,
    },
    GetProducts {
        page: Pagination,
        deadline: Instant,
        respond_to: ServiceResponse<Vec<Product>>,
    },
    GetProductsByIds {
        ids: Vec<String>,
        deadline: Instant,
        respond_to: ServiceResponse<Vec<Product>>,
    },
    SearchProducts {
        query: String,
        page: Pagination,
        deadline: Instant,
        respond_to: ServiceResponse<Vec<Product>>,
    },
    Shutdown,
}

#[derive(Debug)]
pub enum OrderRequest {
    PostOrder {
        account_id: String,
        items: Vec<OrderLine>,
        deadline: Instant,
        respond_to: ServiceResponse<OrderWire>,
    },
    GetOrdersForAccount {
        account_id: String,
        deadline: Instant,
        respond_to: ServiceResponse<Vec<OrderWire>>,
    },
    Shutdown,
}

/// Runs `work` on behalf of a caller and replies with its result.
///
/// Work stops when the caller's deadline passes (the caller gets
/// `Unavailable`) or when the caller stops waiting for the reply.
pub async fn serve_within<T, F>(deadline: Instant, respond_to: ServiceResponse<T>, work: F)
where
    F: Future<Output = ServiceResult<T>>,
{
    let bounded = async move {
        tokio::time::timeout_at(deadline, work).await.unwrap_or_else(|_| {
            warn!("Deadline passed while serving request");
            Err(ServiceError::Unavailable("deadline exceeded".to_string()))
        })
    };
    serve(respond_to, bounded).await
}

/// Like [`serve_within`] for work that enforces the deadline itself: it is
/// only abandoned when the caller stops waiting.
pub async fn serve<T, F>(mut respond_to: ServiceResponse<T>, work: F)
where
    F: Future<Output = ServiceResult<T>>,
{
    let outcome = tokio::select! {
        _ = respond_to.closed() => None,
        result = work => Some(result),
    };

    match outcome {
        Some(result) => {
            let _ = respond_to.send(result);
        }
        None => debug!("Caller went away, request abandoned"),
    }
}
