use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, instrument, Instrument};

use crate::clients::OrderClient;
use crate::domain::OrderLine;
use crate::messages::{serve, serve_within, OrderRequest, ServiceResponse};
use crate::orchestrator::OrderOrchestrator;
use crate::wire::OrderWire;

/// Order actor. Exposes the [`OrderOrchestrator`] and encodes its results
/// to the wire format.
pub struct OrderService {
    receiver: mpsc::Receiver<OrderRequest>,
    orchestrator: Arc<OrderOrchestrator>,
}

impl OrderService {
    pub fn new(buffer_size: usize, orchestrator: OrderOrchestrator) -> (Self, OrderClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let service = Self {
            receiver,
            orchestrator: Arc::new(orchestrator),
        };
        (service, OrderClient::new(sender))
    }

    #[instrument(name = "order_service", skip(self))]
    pub async fn run(mut self) {
        info!("OrderService starting");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                OrderRequest::PostOrder {
                    account_id,
                    items,
                    deadline,
                    respond_to,
                } => self.handle_post_order(account_id, items, deadline, respond_to),
                OrderRequest::GetOrdersForAccount {
                    account_id,
                    deadline,
                    respond_to,
                } => self.handle_get_orders_for_account(account_id, deadline, respond_to),
                OrderRequest::Shutdown => {
                    info!("OrderService shutting down");
                    break;
                }
            }
        }

        info!("OrderService stopped");
    }

    #[instrument(
        fields(account_id = %account_id, lines = items.len()),
        skip(self, account_id, items, deadline, respond_to)
    )]
    fn handle_post_order(
        &self,
        account_id: String,
        items: Vec<OrderLine>,
        deadline: Instant,
        respond_to: ServiceResponse<OrderWire>,
    ) {
        debug!("Processing post_order request");
        let orchestrator = self.orchestrator.clone();

        let work = async move {
            let order = orchestrator.place_order(&account_id, &items, deadline).await?;
            Ok(OrderWire::from(&order))
        };
        // The orchestrator checks the deadline before writing; a started
        // write is never cut short.
        tokio::spawn(serve(respond_to, work).in_current_span());
    }

    #[instrument(fields(account_id = %account_id), skip(self, account_id, deadline, respond_to))]
    fn handle_get_orders_for_account(
        &self,
        account_id: String,
        deadline: Instant,
        respond_to: ServiceResponse<Vec<OrderWire>>,
    ) {
        debug!("Processing get_orders_for_account request");
        let orchestrator = self.orchestrator.clone();

        let work = async move {
            let orders = orchestrator.list_orders_for_account(&account_id, deadline).await?;
            Ok(orders.iter().map(OrderWire::from).collect())
        };
        tokio::spawn(serve_within(deadline, respond_to, work).in_current_span());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor_framework::StoreActor;
    use crate::clients::OrderApi;
    use crate::domain::{Account, Order, Product};
    use crate::error::ServiceError;
    use crate::mock_framework::{FakeAccounts, FakeCatalog};
    use rust_decimal::Decimal;
    use std::time::Duration;

    fn start() -> OrderClient {
        let (store, repository) = StoreActor::<Order>::new(32);
        tokio::spawn(store.run());
        let accounts = FakeAccounts::with(vec![Account::new("acc1", "Alice"), Account::new("acc2", "Bob")]);
        let catalog = FakeCatalog::with(vec![
            Product::new("P1", "Lamp", "desk lamp", Decimal::new(1000, 2)),
            Product::new("P2", "Bulb", "spare bulb", Decimal::new(500, 2)),
            Product::new("P9", "Vault", "priceless", Decimal::MAX),
        ]);
        let orchestrator = OrderOrchestrator::new(Arc::new(accounts), Arc::new(catalog), Arc::new(repository));
        let (service, client) = OrderService::new(32, orchestrator);
        tokio::spawn(service.run());
        client
    }

    fn deadline() -> Instant {
        Instant::now() + Duration::from_secs(5)
    }

    #[tokio::test]
    async fn placed_orders_are_listed_exactly_per_account() {
        let orders = start();
        let mut placed = Vec::new();
        for _ in 0..3 {
            let order = orders
                .post_order("acc1", vec![OrderLine::new("P1", 1), OrderLine::new("P2", 2)], deadline())
                .await
                .unwrap();
            placed.push(order);
        }
        orders
            .post_order("acc2", vec![OrderLine::new("P2", 1)], deadline())
            .await
            .unwrap();

        let listed = orders.get_orders_for_account("acc1", deadline()).await.unwrap();
        assert_eq!(listed.len(), 3);
        for (got, want) in listed.iter().zip(&placed) {
            assert_eq!(got.created_at, want.created_at);
            assert_eq!(got.total_price, Decimal::new(2000, 2));
        }
        assert_eq!(listed, placed);
    }

    #[tokio::test]
    async fn overflowing_order_is_a_validation_error() {
        let orders = start();

        let err = orders
            .post_order("acc1", vec![OrderLine::new("P9", 2)], deadline())
            .await
            .unwrap_err();

        assert_eq!(err, ServiceError::Validation("order total overflows".to_string()));
        assert!(orders.get_orders_for_account("acc1", deadline()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_account_leaves_no_order_behind() {
        let orders = start();

        let err = orders
            .post_order("ghost", vec![OrderLine::new("P1", 1)], deadline())
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(orders.get_orders_for_account("ghost", deadline()).await.unwrap().is_empty());
    }
}
