use async_trait::async_trait;
use quiz_core::model::{AnswerEvent, QuestionId, User, UserId, UserName};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Provenance record: which file a question id was first registered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionIndexEntry {
    pub question_id: QuestionId,
    pub file_name: String,
}

impl QuestionIndexEntry {
    #[must_use]
    pub fn new(question_id: QuestionId, file_name: impl Into<String>) -> Self {
        Self {
            question_id,
            file_name: file_name.into(),
        }
    }
}

/// An answer event joined with the name of the user who gave it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedAnswerEvent {
    pub user_name: String,
    pub event: AnswerEvent,
}

/// Durable user directory.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create the user unless the name is taken; returns the id either way.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the user cannot be stored or read back.
    async fn insert_user_if_absent(&self, name: &UserName) -> Result<UserId, StorageError>;

    /// Look a user up by exact name.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures; a missing user is `Ok(None)`.
    async fn find_user(&self, name: &UserName) -> Result<Option<User>, StorageError>;

    /// All users ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_users(&self) -> Result<Vec<User>, StorageError>;
}

/// Durable question provenance.
#[async_trait]
pub trait QuestionIndexRepository: Send + Sync {
    /// Insert every entry whose id is not registered yet, atomically.
    ///
    /// Returns the number of new entries. Existing ids keep their first file.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the batch cannot be written; nothing is
    /// written in that case.
    async fn register_sources(&self, entries: &[QuestionIndexEntry]) -> Result<u64, StorageError>;

    /// File a question id was first registered from.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn source_of(&self, id: QuestionId) -> Result<Option<String>, StorageError>;
}

/// Append-only answer log.
#[async_trait]
pub trait AnswerEventRepository: Send + Sync {
    /// Append one event and return its row id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the user does not exist, or other
    /// storage errors.
    async fn append_event(&self, event: &AnswerEvent) -> Result<i64, StorageError>;

    /// Events of one user in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn events_for_user(&self, user_id: UserId) -> Result<Vec<AnswerEvent>, StorageError>;

    /// Every event joined with its user's name, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn all_events_named(&self) -> Result<Vec<NamedAnswerEvent>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    users: Arc<Mutex<Vec<User>>>,
    question_index: Arc<Mutex<BTreeMap<QuestionId, String>>>,
    events: Arc<Mutex<Vec<AnswerEvent>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn insert_user_if_absent(&self, name: &UserName) -> Result<UserId, StorageError> {
        let mut guard = self.users.lock().map_err(poisoned)?;
        if let Some(existing) = guard.iter().find(|u| u.name() == name) {
            return Ok(existing.id());
        }
        let next = guard.last().map_or(1, |u| u.id().value() + 1);
        let id = UserId::new(next);
        guard.push(User::new(id, name.clone()));
        Ok(id)
    }

    async fn find_user(&self, name: &UserName) -> Result<Option<User>, StorageError> {
        let guard = self.users.lock().map_err(poisoned)?;
        Ok(guard.iter().find(|u| u.name() == name).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, StorageError> {
        let guard = self.users.lock().map_err(poisoned)?;
        Ok(guard.clone())
    }
}

#[async_trait]
impl QuestionIndexRepository for InMemoryRepository {
    async fn register_sources(&self, entries: &[QuestionIndexEntry]) -> Result<u64, StorageError> {
        let mut guard = self.question_index.lock().map_err(poisoned)?;
        let mut inserted = 0;
        for entry in entries {
            if !guard.contains_key(&entry.question_id) {
                guard.insert(entry.question_id, entry.file_name.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn source_of(&self, id: QuestionId) -> Result<Option<String>, StorageError> {
        let guard = self.question_index.lock().map_err(poisoned)?;
        Ok(guard.get(&id).cloned())
    }
}

#[async_trait]
impl AnswerEventRepository for InMemoryRepository {
    async fn append_event(&self, event: &AnswerEvent) -> Result<i64, StorageError> {
        let known = {
            let users = self.users.lock().map_err(poisoned)?;
            users.iter().any(|u| u.id() == event.user_id)
        };
        if !known {
            return Err(StorageError::Conflict);
        }

        let mut guard = self.events.lock().map_err(poisoned)?;
        guard.push(event.clone());
        i64::try_from(guard.len())
            .map_err(|_| StorageError::Serialization("row id overflow".into()))
    }

    async fn events_for_user(&self, user_id: UserId) -> Result<Vec<AnswerEvent>, StorageError> {
        let guard = self.events.lock().map_err(poisoned)?;
        Ok(guard
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn all_events_named(&self) -> Result<Vec<NamedAnswerEvent>, StorageError> {
        let users = self.users.lock().map_err(poisoned)?.clone();
        let guard = self.events.lock().map_err(poisoned)?;
        let mut out: Vec<NamedAnswerEvent> = guard
            .iter()
            .filter_map(|event| {
                users
                    .iter()
                    .find(|u| u.id() == event.user_id)
                    .map(|u| NamedAnswerEvent {
                        user_name: u.name().to_string(),
                        event: event.clone(),
                    })
            })
            .collect();
        out.sort_by_key(|e| e.event.answered_at);
        Ok(out)
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn UserRepository>,
    pub question_index: Arc<dyn QuestionIndexRepository>,
    pub answers: Arc<dyn AnswerEventRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let users: Arc<dyn UserRepository> = Arc::new(repo.clone());
        let question_index: Arc<dyn QuestionIndexRepository> = Arc::new(repo.clone());
        let answers: Arc<dyn AnswerEventRepository> = Arc::new(repo);
        Self {
            users,
            question_index,
            answers,
        }
    }
}
