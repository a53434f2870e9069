use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{error, info, warn};

use super::PlatformConfig;
use crate::actor_framework::StoreActor;
use crate::clients::{AccountClient, CatalogClient, OrderClient};
use crate::domain::{Account, Order, Product};
use crate::error::{ServiceError, ServiceResult};
use crate::gateway::Gateway;
use crate::orchestrator::OrderOrchestrator;
use crate::services::{AccountService, CatalogService, OrderService};

/// The whole platform running in one process.
///
/// Starts a store and a service actor per domain, wires the order
/// orchestrator to the account and catalog clients, and builds the gateway
/// on top of the three service clients.
pub struct Platform {
    pub accounts: AccountClient,
    pub catalog: CatalogClient,
    pub orders: OrderClient,
    gateway: Arc<Gateway>,
    config: PlatformConfig,
    account_handle: JoinHandle<()>,
    catalog_handle: JoinHandle<()>,
    order_handle: JoinHandle<()>,
    store_handles: Vec<JoinHandle<()>>,
}

impl Platform {
    pub fn start(config: PlatformConfig) -> Self {
        let buffer = config.channel_buffer;

        // 1. Stores
        let (account_store, account_repository) = StoreActor::<Account>::new(buffer);
        let (product_store, product_repository) = StoreActor::<Product>::new(buffer);
        let (order_store, order_repository) = StoreActor::<Order>::new(buffer);
        let store_handles = vec![
            tokio::spawn(account_store.run()),
            tokio::spawn(product_store.run()),
            tokio::spawn(order_store.run()),
        ];

        // 2. Account and catalog services
        let (account_service, accounts) = AccountService::new(buffer, Arc::new(account_repository));
        let account_handle = tokio::spawn(account_service.run());
        let (catalog_service, catalog) = CatalogService::new(buffer, Arc::new(product_repository));
        let catalog_handle = tokio::spawn(catalog_service.run());

        // 3. Order service, calling the other two through their clients
        let orchestrator = OrderOrchestrator::new(
            Arc::new(accounts.clone()),
            Arc::new(catalog.clone()),
            Arc::new(order_repository),
        );
        let (order_service, orders) = OrderService::new(buffer, orchestrator);
        let order_handle = tokio::spawn(order_service.run());

        // 4. Gateway
        let gateway = Arc::new(Gateway::new(
            Arc::new(accounts.clone()),
            Arc::new(catalog.clone()),
            Arc::new(orders.clone()),
            config.gateway(),
        ));

        info!(channel_buffer = buffer, "Platform started");
        Self {
            accounts,
            catalog,
            orders,
            gateway,
            config,
            account_handle,
            catalog_handle,
            order_handle,
            store_handles,
        }
    }

    pub fn gateway(&self) -> Arc<Gateway> {
        self.gateway.clone()
    }

    /// Deadline for a call made now with the configured call timeout.
    pub fn call_deadline(&self) -> Instant {
        Instant::now() + self.config.call_timeout
    }

    /// Stops the order service first, since it calls the other two, then the
    /// account and catalog services. Stores stop once the last repository
    /// handle is dropped.
    pub async fn shutdown(self) -> ServiceResult<()> {
        info!("Shutting down platform...");
        let Platform {
            accounts,
            catalog,
            orders,
            gateway,
            account_handle,
            catalog_handle,
            order_handle,
            store_handles,
            ..
        } = self;
        drop(gateway);

        if let Err(e) = orders.shutdown().await {
            warn!(error = %e, "Order service already stopped");
        }
        join("order service", order_handle).await?;

        if let Err(e) = accounts.shutdown().await {
            warn!(error = %e, "Account service already stopped");
        }
        if let Err(e) = catalog.shutdown().await {
            warn!(error = %e, "Catalog service already stopped");
        }
        join("account service", account_handle).await?;
        join("catalog service", catalog_handle).await?;

        drop(orders);
        drop(accounts);
        drop(catalog);
        for handle in store_handles {
            join("store", handle).await?;
        }

        info!("Platform shutdown complete.");
        Ok(())
    }
}

async fn join(task: &'static str, handle: JoinHandle<()>) -> ServiceResult<()> {
    handle.await.map_err(|e| {
        error!(task, error = ?e, "Actor task failed");
        ServiceError::Internal(format!("{task} task failed: {e}"))
    })
}
