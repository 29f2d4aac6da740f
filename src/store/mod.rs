//! # In-Memory Store Actor
//!
//! A generic, single-owner record store running in its own Tokio task. One actor per entity
//! type holds a `HashMap` and processes requests sequentially, so the map needs no lock. Callers
//! talk to it through a cloneable [`StoreClient`].
//!
//! | Request | Response |
//! |---------|----------|
//! | `Find { id }` | `Option<T>` |
//! | `Insert { record }` | the record's id, or [`StoreError::Duplicate`] |
//! | `Count` | number of stored records |
//!
//! The actor stops when every client has been dropped.

use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::hash::Hash;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// A value the store can hold, keyed by its own id.
pub trait Record: Clone + Debug + Send + Sync + 'static {
    type Id: Eq + Hash + Copy + Send + Sync + Display + Debug;

    fn id(&self) -> Self::Id;
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store actor closed")]
    ActorClosed,
    #[error("Store actor dropped response channel")]
    ActorDropped,
    #[error("Record not found: {0}")]
    NotFound(String),
    #[error("Record already exists: {0}")]
    Duplicate(String),
}

/// One-shot response channel used by the store actor.
pub type Response<T> = oneshot::Sender<Result<T, StoreError>>;

#[derive(Debug)]
pub enum StoreRequest<T: Record> {
    Find {
        id: T::Id,
        respond_to: Response<Option<T>>,
    },
    Insert {
        record: T,
        respond_to: Response<T::Id>,
    },
    Count {
        respond_to: Response<usize>,
    },
}

/// Server half: owns the records and the request receiver.
pub struct StoreActor<T: Record> {
    receiver: mpsc::Receiver<StoreRequest<T>>,
    records: HashMap<T::Id, T>,
}

impl<T: Record> StoreActor<T> {
    pub fn new(buffer_size: usize) -> (Self, StoreClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            records: HashMap::new(),
        };
        (actor, StoreClient::new(sender))
    }

    /// Processes requests until the channel closes.
    pub async fn run(mut self) {
        let record_type = short_type_name::<T>();
        info!(record_type, "Store started");

        while let Some(request) = self.receiver.recv().await {
            match request {
                StoreRequest::Find { id, respond_to } => {
                    let record = self.records.get(&id).cloned();
                    debug!(record_type, %id, found = record.is_some(), "Find");
                    let _ = respond_to.send(Ok(record));
                }
                StoreRequest::Insert { record, respond_to } => {
                    let id = record.id();
                    if self.records.contains_key(&id) {
                        warn!(record_type, %id, "Duplicate insert");
                        let _ = respond_to.send(Err(StoreError::Duplicate(id.to_string())));
                        continue;
                    }
                    self.records.insert(id, record);
                    info!(record_type, %id, size = self.records.len(), "Inserted");
                    let _ = respond_to.send(Ok(id));
                }
                StoreRequest::Count { respond_to } => {
                    let _ = respond_to.send(Ok(self.records.len()));
                }
            }
        }

        info!(record_type, size = self.records.len(), "Store shutdown");
    }
}

/// Client half: a cheap, cloneable handle to a [`StoreActor`].
#[derive(Debug)]
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
    pub fn new(sender: mpsc::Sender<StoreRequest<T>>) -> Self {
        Self { sender }
    }

    pub async fn find(&self, id: T::Id) -> Result<Option<T>, StoreError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(StoreRequest::Find { id, respond_to })
            .await
            .map_err(|_| StoreError::ActorClosed)?;
        response.await.map_err(|_| StoreError::ActorDropped)?
    }

    /// Like [`find`](Self::find), but a missing record is [`StoreError::NotFound`].
    pub async fn get(&self, id: T::Id) -> Result<T, StoreError> {
        self.find(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    pub async fn insert(&self, record: T) -> Result<T::Id, StoreError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(StoreRequest::Insert { record, respond_to })
            .await
            .map_err(|_| StoreError::ActorClosed)?;
        response.await.map_err(|_| StoreError::ActorDropped)?
    }

    pub async fn count(&self) -> Result<usize, StoreError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(StoreRequest::Count { respond_to })
            .await
            .map_err(|_| StoreError::ActorClosed)?;
        response.await.map_err(|_| StoreError::ActorDropped)?
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Note {
        id: u32,
        text: &'static str,
    }

    impl Record for Note {
        type Id = u32;

        fn id(&self) -> u32 {
            self.id
        }
    }

    #[tokio::test]
    async fn test_insert_find_count() {
        let (actor, client) = StoreActor::<Note>::new(8);
        tokio::spawn(actor.run());

        let note = Note { id: 7, text: "hello" };
        assert_eq!(client.insert(note.clone()).await.unwrap(), 7);
        assert_eq!(client.find(7).await.unwrap(), Some(note));
        assert_eq!(client.find(8).await.unwrap(), None);
        assert_eq!(client.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_rejected() {
        let (actor, client) = StoreActor::<Note>::new(8);
        tokio::spawn(actor.run());

        client.insert(Note { id: 1, text: "a" }).await.unwrap();
        let err = client.insert(Note { id: 1, text: "b" }).await.unwrap_err();
        assert_eq!(err, StoreError::Duplicate("1".to_string()));
        assert_eq!(client.get(1).await.unwrap().text, "a");
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let (actor, client) = StoreActor::<Note>::new(8);
        tokio::spawn(actor.run());

        assert_eq!(client.get(3).await, Err(StoreError::NotFound("3".to_string())));
    }

    #[tokio::test]
    async fn test_closed_actor_is_reported() {
        let (actor, client) = StoreActor::<Note>::new(8);
        drop(actor);

        assert_eq!(client.count().await, Err(StoreError::ActorClosed));
    }
}
