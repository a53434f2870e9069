use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, instrument};

use crate::error::{ServiceError, ServiceResult};

// =============================================================================
// 1. THE ABSTRACTION
// =============================================================================

/// Anything a [`StoreActor`] can hold.
pub trait Record: Clone + Send + Sync + Debug + 'static {
    /// Record kind, used in logs and errors.
    const KIND: &'static str;

    /// Unique key of the record.
    fn key(&self) -> &str;

    /// Text matched by [`StoreRequest::Search`]. Records without searchable
    /// text never match a search.
    fn search_text(&self) -> Option<String> {
        None
    }
}

// =============================================================================
// 2. THE GENERIC MESSAGES
// =============================================================================

pub type Response<T> = oneshot::Sender<T>;
pub type Predicate<T> = Box<dyn Fn(&T) -> bool + Send>;

pub enum StoreRequest<T: Record> {
    Put {
        record: T,
        respond_to: Response<()>,
    },
    Get {
        key: String,
        respond_to: Response<Option<T>>,
    },
    GetMany {
        keys: Vec<String>,
        respond_to: Response<Vec<T>>,
    },
    Page {
        skip: u64,
        take: u64,
        respond_to: Response<Vec<T>>,
    },
    Search {
        query: String,
        skip: u64,
        take: u64,
        respond_to: Response<Vec<T>>,
    },
    Select {
        predicate: Predicate<T>,
        respond_to: Response<Vec<T>>,
    },
}

// =============================================================================
// 3. THE GENERIC ACTOR SERVER
// =============================================================================

/// Serializes every read and write for one record type, which gives
/// read-your-writes and atomic single-record puts for free.
///
/// Records are kept in insertion order; an upsert keeps the original slot.
pub struct StoreActor<T: Record> {
    receiver: mpsc::Receiver<StoreRequest<T>>,
    records: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T: Record> StoreActor<T> {
    pub fn new(buffer_size: usize) -> (Self, StoreClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            records: Vec::new(),
            index: HashMap::new(),
        };
        (actor, StoreClient { sender })
    }

    #[instrument(name = "store", fields(kind = T::KIND), skip(self))]
    pub async fn run(mut self) {
        debug!("Store starting");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                StoreRequest::Put { record, respond_to } => {
                    self.put(record);
                    let _ = respond_to.send(());
                }
                StoreRequest::Get { key, respond_to } => {
                    let record = self.index.get(&key).map(|&slot| self.records[slot].clone());
                    let _ = respond_to.send(record);
                }
                StoreRequest::GetMany { keys, respond_to } => {
                    let wanted: HashSet<&str> = keys.iter().map(String::as_str).collect();
                    let found = self
                        .records
                        .iter()
                        .filter(|record| wanted.contains(record.key()))
                        .cloned()
                        .collect();
                    let _ = respond_to.send(found);
                }
                StoreRequest::Page {
                    skip,
                    take,
                    respond_to,
                } => {
                    let page = window(self.records.iter(), skip, take);
                    let _ = respond_to.send(page);
                }
                StoreRequest::Search {
                    query,
                    skip,
                    take,
                    respond_to,
                } => {
                    let needle = query.to_lowercase();
                    let hits = self.records.iter().filter(|record| {
                        record
                            .search_text()
                            .is_some_and(|text| text.to_lowercase().contains(&needle))
                    });
                    let _ = respond_to.send(window(hits, skip, take));
                }
                StoreRequest::Select {
                    predicate,
                    respond_to,
                } => {
                    let selected = self
                        .records
                        .iter()
                        .filter(|record| predicate(record))
                        .cloned()
                        .collect();
                    let _ = respond_to.send(selected);
                }
            }
        }

        info!(records = self.records.len(), "Store stopped");
    }

    fn put(&mut self, record: T) {
        match self.index.get(record.key()) {
            Some(&slot) => self.records[slot] = record,
            None => {
                self.index.insert(record.key().to_string(), self.records.len());
                self.records.push(record);
            }
        }
    }
}

fn window<'a, T: Clone + 'a>(records: impl Iterator<Item = &'a T>, skip: u64, take: u64) -> Vec<T> {
    let skip = usize::try_from(skip).unwrap_or(usize::MAX);
    let take = usize::try_from(take).unwrap_or(usize::MAX);
    records.skip(skip).take(take).cloned().collect()
}

// =============================================================================
// 4. THE GENERIC CLIENT
// =============================================================================

pub struct StoreClient<T: Record> {
    sender: mpsc::Sender<StoreRequest<T>>,
}

impl<T: Record> Clone for StoreClient<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T: Record> StoreClient<T> {
    async fn request<R>(&self, make: impl FnOnce(Response<R>) -> StoreRequest<T>) -> ServiceResult<R> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(make(respond_to))
            .await
            .map_err(|_| ServiceError::Internal(format!("{} store closed", T::KIND)))?;
        response
            .await
            .map_err(|_| ServiceError::Internal(format!("{} store dropped request", T::KIND)))
    }

    pub async fn put(&self, record: T) -> ServiceResult<()> {
        self.request(|respond_to| StoreRequest::Put { record, respond_to }).await
    }

    pub async fn get(&self, key: &str) -> ServiceResult<Option<T>> {
        let key = key.to_string();
        self.request(|respond_to| StoreRequest::Get { key, respond_to }).await
    }

    pub async fn get_many(&self, keys: Vec<String>) -> ServiceResult<Vec<T>> {
        self.request(|respond_to| StoreRequest::GetMany { keys, respond_to }).await
    }

    pub async fn page(&self, skip: u64, take: u64) -> ServiceResult<Vec<T>> {
        self.request(|respond_to| StoreRequest::Page {
            skip,
            take,
            respond_to,
        })
        .await
    }

    pub async fn search(&self, query: &str, skip: u64, take: u64) -> ServiceResult<Vec<T>> {
        let query = query.to_string();
        self.request(|respond_to| StoreRequest::Search {
            query,
            skip,
            take,
            respond_to,
        })
        .await
    }

    pub async fn select(&self, predicate: impl Fn(&T) -> bool + Send + 'static) -> ServiceResult<Vec<T>> {
        let predicate: Predicate<T> = Box::new(predicate);
        self.request(|respond_to| StoreRequest::Select {
            predicate,
            respond_to,
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Note {
        id: String,
        body: String,
        author: String,
    }

    impl Note {
        fn new(id: &str, body: &str, author: &str) -> Self {
            Self {
                id: id.into(),
                body: body.into(),
                author: author.into(),
            }
        }
    }

    impl Record for Note {
        const KIND: &'static str = "note";

        fn key(&self) -> &str {
            &self.id
        }

        fn search_text(&self) -> Option<String> {
            Some(self.body.clone())
        }
    }

    fn start() -> StoreClient<Note> {
        let (actor, client) = StoreActor::<Note>::new(10);
        tokio::spawn(actor.run());
        client
    }

    #[tokio::test]
    async fn put_then_get_reads_own_write() {
        let store = start();
        store.put(Note::new("n1", "first", "ann")).await.unwrap();

        let note = store.get("n1").await.unwrap();
        assert_eq!(note, Some(Note::new("n1", "first", "ann")));
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn upsert_keeps_insertion_slot() {
        let store = start();
        store.put(Note::new("n1", "first", "ann")).await.unwrap();
        store.put(Note::new("n2", "second", "bob")).await.unwrap();
        store.put(Note::new("n1", "edited", "ann")).await.unwrap();

        let all = store.page(0, 10).await.unwrap();
        let bodies: Vec<_> = all.iter().map(|n| n.body.as_str()).collect();
        assert_eq!(bodies, vec!["edited", "second"]);
    }

    #[tokio::test]
    async fn page_search_and_select() {
        let store = start();
        for (id, body, author) in [
            ("n1", "Red lamp", "ann"),
            ("n2", "Blue chair", "bob"),
            ("n3", "red chair", "ann"),
        ] {
            store.put(Note::new(id, body, author)).await.unwrap();
        }

        let page = store.page(1, 1).await.unwrap();
        assert_eq!(page[0].id, "n2");

        let hits = store.search("RED", 0, 10).await.unwrap();
        let ids: Vec<_> = hits.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["n1", "n3"]);

        let by_ann = store.select(|n| n.author == "ann").await.unwrap();
        assert_eq!(by_ann.len(), 2);

        let many = store
            .get_many(vec!["n3".into(), "nope".into(), "n1".into()])
            .await
            .unwrap();
        let ids: Vec<_> = many.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["n1", "n3"]);
    }

    #[tokio::test]
    async fn closed_store_is_internal_error() {
        let (actor, client) = StoreActor::<Note>::new(1);
        drop(actor);

        let err = client.get("n1").await.unwrap_err();
        assert!(matches!(err, ServiceError::Internal(_)));
    }
}
