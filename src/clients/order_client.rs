use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::instrument;

use super::{OrderApi, RpcChannel};
use crate::domain::{Order, OrderLine};
use crate::error::ServiceResult;
use crate::messages::OrderRequest;

/// Client for the order service. Decodes orders from their wire form.
#[derive(Clone)]
pub struct OrderClient {
    channel: RpcChannel<OrderRequest>,
}

impl OrderClient {
    pub fn new(sender: mpsc::Sender<OrderRequest>) -> Self {
        Self {
            channel: RpcChannel::new("order service", sender),
        }
    }

    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> ServiceResult<()> {
        self.channel.notify(OrderRequest::Shutdown).await
    }
}

#[async_trait]
impl OrderApi for OrderClient {
    #[instrument(skip(self, items, deadline), fields(lines = items.len()))]
    async fn post_order(&self, account_id: &str, items: Vec<OrderLine>, deadline: Instant) -> ServiceResult<Order> {
        let account_id = account_id.to_string();
        let wire = self
            .channel
            .call(deadline, |respond_to| OrderRequest::PostOrder {
                account_id,
                items,
                deadline,
                respond_to,
            })
            .await?;
        Order::try_from(wire)
    }

    #[instrument(skip(self, deadline))]
    async fn get_orders_for_account(&self, account_id: &str, deadline: Instant) -> ServiceResult<Vec<Order>> {
        let account_id = account_id.to_string();
        let wires = self
            .channel
            .call(deadline, |respond_to| OrderRequest::GetOrdersForAccount {
                account_id,
                deadline,
                respond_to,
            })
            .await?;
        wires.into_iter().map(Order::try_from).collect()
    }
}
