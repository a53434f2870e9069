use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::instrument;

use super::{AccountApi, RpcChannel};
use crate::domain::{Account, Pagination};
use crate::error::ServiceResult;
use crate::messages::AccountRequest;

/// Client for the account service.
#[derive(Clone)]
pub struct AccountClient {
    channel: RpcChannel<AccountRequest>,
}

impl AccountClient {
    pub fn new(sender: mpsc::Sender<AccountRequest>) -> Self {
        Self {
            channel: RpcChannel::new("account service", sender),
        }
    }

    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> ServiceResult<()> {
        self.channel.notify(AccountRequest::Shutdown).await
    }
}

#[async_trait]
impl AccountApi for AccountClient {
    #[instrument(skip(self, deadline))]
    async fn post_account(&self, name: &str, deadline: Instant) -> ServiceResult<Account> {
        let name = name.to_string();
        self.channel
            .call(deadline, |respond_to| AccountRequest::PostAccount {
                name,
                deadline,
                respond_to,
            })
            .await
    }

    #[instrument(skip(self, deadline))]
    async fn get_account(&self, id: &str, deadline: Instant) -> ServiceResult<Account> {
        let id = id.to_string();
        self.channel
            .call(deadline, |respond_to| AccountRequest::GetAccount {
                id,
                deadline,
                respond_to,
            })
            .await
    }

    #[instrument(skip(self, deadline))]
    async fn get_accounts(&self, page: Pagination, deadline: Instant) -> ServiceResult<Vec<Account>> {
        self.channel
            .call(deadline, |respond_to| AccountRequest::GetAccounts {
                page,
                deadline,
                respond_to,
            })
            .await
    }
}
