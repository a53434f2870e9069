use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn, Instrument};
use uuid::Uuid;

use crate::clients::AccountClient;
use crate::domain::{Account, Pagination};
use crate::error::ServiceError;
use crate::messages::{serve_within, AccountRequest, ServiceResponse};
use crate::repository::AccountRepository;

/// Account actor. Plain CRUD over its repository.
pub struct AccountService {
    receiver: mpsc::Receiver<AccountRequest>,
    repository: Arc<dyn AccountRepository>,
}

impl AccountService {
    pub fn new(buffer_size: usize, repository: Arc<dyn AccountRepository>) -> (Self, AccountClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let service = Self { receiver, repository };
        (service, AccountClient::new(sender))
    }

    #[instrument(name = "account_service", skip(self))]
    pub async fn run(mut self) {
        info!("AccountService starting");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                AccountRequest::PostAccount {
                    name,
                    deadline,
                    respond_to,
                } => self.handle_post_account(name, deadline, respond_to),
                AccountRequest::GetAccount {
                    id,
                    deadline,
                    respond_to,
                } => self.handle_get_account(id, deadline, respond_to),
                AccountRequest::GetAccounts {
                    page,
                    deadline,
                    respond_to,
                } => self.handle_get_accounts(page, deadline, respond_to),
                AccountRequest::Shutdown => {
                    info!("AccountService shutting down");
                    break;
                }
            }
        }

        info!("AccountService stopped");
    }

    #[instrument(fields(account_name = %name), skip(self, name, deadline, respond_to))]
    fn handle_post_account(&self, name: String, deadline: Instant, respond_to: ServiceResponse<Account>) {
        debug!("Processing post_account request");
        let repository = self.repository.clone();

        let work = async move {
            let name = name.trim();
            if name.is_empty() {
                warn!("Validation failed: empty name");
                return Err(ServiceError::Validation("account name is required".to_string()));
            }
            let account = Account::new(Uuid::new_v4().to_string(), name);
            repository.put_account(account.clone()).await?;
            info!(account_id = %account.id, "Account created successfully");
            Ok(account)
        };
        tokio::spawn(serve_within(deadline, respond_to, work).in_current_span());
    }

    #[instrument(fields(account_id = %id), skip(self, id, deadline, respond_to))]
    fn handle_get_account(&self, id: String, deadline: Instant, respond_to: ServiceResponse<Account>) {
        debug!("Processing get_account request");
        let repository = self.repository.clone();

        let work = async move {
            match repository.get_account_by_id(&id).await? {
                Some(account) => {
                    debug!(account_name = %account.name, "Account found");
                    Ok(account)
                }
                None => {
                    debug!("Account not found");
                    Err(ServiceError::NotFound(format!("account {id}")))
                }
            }
        };
        tokio::spawn(serve_within(deadline, respond_to, work).in_current_span());
    }

    #[instrument(skip(self, deadline, respond_to))]
    fn handle_get_accounts(&self, page: Pagination, deadline: Instant, respond_to: ServiceResponse<Vec<Account>>) {
        debug!("Processing get_accounts request");
        let repository = self.repository.clone();

        let work = async move {
            let (skip, take) = page.bounds();
            let accounts = repository.list_accounts(skip, take).await?;
            info!(account_count = accounts.len(), "Listed accounts");
            Ok(accounts)
        };
        tokio::spawn(serve_within(deadline, respond_to, work).in_current_span());
    }
}
