use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use exam_core::model::{Exam, ExamId, ExamResult, ExamResultId, User, UserId};

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

/// A persisted result together with its storage-assigned id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    pub id: ExamResultId,
    pub result: ExamResult,
}

/// A user together with the stored credential.
///
/// The password stays in the storage layer; authentication compares it and
/// hands out only the inner `User`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub user: User,
    pub password: String,
}

/// Repository contract for question sets.
///
/// All operations succeed or fail as a unit; callers never observe a partial
/// write. `set_live` owns the single-live invariant: it clears the flag on
/// every other exam and raises it on the target in one atomic step.
#[async_trait]
pub trait ExamRepository: Send + Sync {
    /// Insert a new exam, letting storage assign the id.
    ///
    /// The id carried by `exam` is ignored and the stored exam is never
    /// live; publishing goes through `set_live`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the exam cannot be stored.
    async fn insert_new_exam(&self, exam: &Exam) -> Result<ExamId, StorageError>;

    /// Persist or update an exam under its own id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the exam carries the live flag
    /// while a different exam is already live.
    /// Returns `StorageError` if the exam cannot be stored.
    async fn upsert_exam(&self, exam: &Exam) -> Result<(), StorageError>;

    /// Fetch an exam by id. Returns `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn get_exam(&self, id: ExamId) -> Result<Option<Exam>, StorageError>;

    /// List all exams ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn list_exams(&self) -> Result<Vec<Exam>, StorageError>;

    /// Delete an exam.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if it does not exist.
    async fn delete_exam(&self, id: ExamId) -> Result<(), StorageError>;

    /// Make `id` the single live exam: clear the flag everywhere else and set
    /// it on `id`, atomically.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if `id` does not exist; no flag
    /// changes in that case.
    async fn set_live(&self, id: ExamId) -> Result<(), StorageError>;

    /// Clear the live flag on every exam.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn clear_live(&self) -> Result<(), StorageError>;

    /// The at-most-one exam currently flagged live.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn get_live(&self) -> Result<Option<Exam>, StorageError>;
}

/// Append-only sink for completed-session outcomes.
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Append a result and return the assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the result cannot be stored.
    async fn append_result(&self, result: &ExamResult) -> Result<ExamResultId, StorageError>;

    /// Fetch a persisted result by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing.
    async fn get_result(&self, id: ExamResultId) -> Result<ExamResult, StorageError>;

    /// Most recent results first, up to `limit`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn list_recent_results(&self, limit: u32) -> Result<Vec<ResultRow>, StorageError>;
}

/// Repository contract for accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account, letting storage assign the id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the username is already taken.
    async fn insert_new_user(&self, record: &UserRecord) -> Result<UserId, StorageError>;

    /// Persist or update an account under its own id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the account cannot be stored.
    async fn upsert_user(&self, record: &UserRecord) -> Result<(), StorageError>;

    /// Look up an account by username. Returns `Ok(None)` when unknown.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StorageError>;

    /// List all accounts ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn list_users(&self) -> Result<Vec<User>, StorageError>;

    /// Delete an account.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if it does not exist.
    async fn delete_user(&self, id: UserId) -> Result<(), StorageError>;
}

/// In-memory implementation of all three contracts, for tests and
/// prototyping. A single mutex per collection keeps each operation atomic.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    exams: Arc<Mutex<HashMap<ExamId, Exam>>>,
    results: Arc<Mutex<Vec<ExamResult>>>,
    users: Arc<Mutex<HashMap<UserId, UserRecord>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock<T>(mutex: &Mutex<T>) -> Result<std::sync::MutexGuard<'_, T>, StorageError> {
        mutex
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl ExamRepository for InMemoryRepository {
    async fn insert_new_exam(&self, exam: &Exam) -> Result<ExamId, StorageError> {
        let mut guard = Self::lock(&self.exams)?;
        let next = guard.keys().map(ExamId::value).max().unwrap_or(0) + 1;
        let id = ExamId::new(next);
        let mut stored = reid_exam(exam, id)?;
        stored.set_live(false);
        guard.insert(id, stored);
        Ok(id)
    }

    async fn upsert_exam(&self, exam: &Exam) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.exams)?;
        // A live upsert may not pull the flag away from another exam.
        if exam.is_live()
            && guard
                .values()
                .any(|other| other.id() != exam.id() && other.is_live())
        {
            return Err(StorageError::Conflict);
        }
        guard.insert(exam.id(), exam.clone());
        Ok(())
    }

    async fn get_exam(&self, id: ExamId) -> Result<Option<Exam>, StorageError> {
        let guard = Self::lock(&self.exams)?;
        Ok(guard.get(&id).cloned())
    }

    async fn list_exams(&self) -> Result<Vec<Exam>, StorageError> {
        let guard = Self::lock(&self.exams)?;
        let mut exams: Vec<Exam> = guard.values().cloned().collect();
        exams.sort_by_key(Exam::id);
        Ok(exams)
    }

    async fn delete_exam(&self, id: ExamId) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.exams)?;
        guard.remove(&id).map(|_| ()).ok_or(StorageError::NotFound)
    }

    async fn set_live(&self, id: ExamId) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.exams)?;
        if !guard.contains_key(&id) {
            return Err(StorageError::NotFound);
        }
        for (exam_id, exam) in guard.iter_mut() {
            exam.set_live(*exam_id == id);
        }
        Ok(())
    }

    async fn clear_live(&self) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.exams)?;
        for exam in guard.values_mut() {
            exam.set_live(false);
        }
        Ok(())
    }

    async fn get_live(&self) -> Result<Option<Exam>, StorageError> {
        let guard = Self::lock(&self.exams)?;
        Ok(guard.values().find(|exam| exam.is_live()).cloned())
    }
}

#[async_trait]
impl ResultSink for InMemoryRepository {
    async fn append_result(&self, result: &ExamResult) -> Result<ExamResultId, StorageError> {
        let mut guard = Self::lock(&self.results)?;
        guard.push(result.clone());
        Ok(guard.len() as ExamResultId)
    }

    async fn get_result(&self, id: ExamResultId) -> Result<ExamResult, StorageError> {
        let guard = Self::lock(&self.results)?;
        let index = usize::try_from(id.checked_sub(1).ok_or(StorageError::NotFound)?)
            .map_err(|_| StorageError::NotFound)?;
        guard.get(index).cloned().ok_or(StorageError::NotFound)
    }

    async fn list_recent_results(&self, limit: u32) -> Result<Vec<ResultRow>, StorageError> {
        let guard = Self::lock(&self.results)?;
        Ok(guard
            .iter()
            .enumerate()
            .rev()
            .take(limit as usize)
            .map(|(index, result)| ResultRow {
                id: (index + 1) as ExamResultId,
                result: result.clone(),
            })
            .collect())
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn insert_new_user(&self, record: &UserRecord) -> Result<UserId, StorageError> {
        let mut guard = Self::lock(&self.users)?;
        if guard
            .values()
            .any(|existing| existing.user.username() == record.user.username())
        {
            return Err(StorageError::Conflict);
        }
        let next = guard.keys().map(UserId::value).max().unwrap_or(0) + 1;
        let id = UserId::new(next);
        let stored = UserRecord {
            user: reid_user(&record.user, id)?,
            password: record.password.clone(),
        };
        guard.insert(id, stored);
        Ok(id)
    }

    async fn upsert_user(&self, record: &UserRecord) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.users)?;
        let id = record.user.id();
        if guard
            .iter()
            .any(|(other, existing)| *other != id && existing.user.username() == record.user.username())
        {
            return Err(StorageError::Conflict);
        }
        guard.insert(id, record.clone());
        Ok(())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StorageError> {
        let guard = Self::lock(&self.users)?;
        Ok(guard
            .values()
            .find(|record| record.user.username() == username)
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, StorageError> {
        let guard = Self::lock(&self.users)?;
        let mut users: Vec<User> = guard.values().map(|record| record.user.clone()).collect();
        users.sort_by_key(User::id);
        Ok(users)
    }

    async fn delete_user(&self, id: UserId) -> Result<(), StorageError> {
        let mut guard = Self::lock(&self.users)?;
        guard.remove(&id).map(|_| ()).ok_or(StorageError::NotFound)
    }
}

fn reid_exam(exam: &Exam, id: ExamId) -> Result<Exam, StorageError> {
    Exam::new(
        id,
        exam.title(),
        exam.description(),
        exam.category().map(str::to_owned),
        exam.time_limit_minutes(),
        exam.is_live(),
        exam.questions().to_vec(),
    )
    .map_err(|e| StorageError::Serialization(e.to_string()))
}

fn reid_user(user: &User, id: UserId) -> Result<User, StorageError> {
    User::new(
        id,
        user.username(),
        user.display_name(),
        user.role(),
        user.position().map(str::to_owned),
        user.language().map(str::to_owned),
    )
    .map_err(|e| StorageError::Serialization(e.to_string()))
}

/// Aggregates the three contracts behind trait objects for easy backend
/// swapping.
#[derive(Clone)]
pub struct Storage {
    pub exams: Arc<dyn ExamRepository>,
    pub results: Arc<dyn ResultSink>,
    pub users: Arc<dyn UserRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            exams: Arc::new(repo.clone()),
            results: Arc::new(repo.clone()),
            users: Arc::new(repo),
        }
    }
}
