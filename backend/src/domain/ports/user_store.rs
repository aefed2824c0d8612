//! Port abstraction for user persistence adapters and their errors.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::{NewUser, User, UserId, UserPatch};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user store adapters.
    pub enum UserStoreError {
        /// Store connection could not be established.
        Connection { message: String } => "user store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user store query failed: {message}",
        /// Insert violated the unique email constraint.
        DuplicateEmail { email: String } => "a user with email {email} already exists",
    }
}

/// Durable storage for user records.
///
/// Lookup by identifier or email returns `Ok(None)` for a missing record;
/// `Err` is reserved for store faults.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persist a validated draft, assigning identity and timestamps.
    async fn insert(&self, user: NewUser) -> Result<User, UserStoreError>;

    /// Fetch the record matching an email address exactly.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserStoreError>;

    /// Fetch every stored record.
    async fn list_all(&self) -> Result<Vec<User>, UserStoreError>;

    /// Apply a validated patch to the record with the given id, returning
    /// the updated record.
    async fn update(&self, id: &UserId, patch: UserPatch) -> Result<Option<User>, UserStoreError>;

    /// Remove the record with the given id, returning its final snapshot.
    async fn delete(&self, id: &UserId) -> Result<Option<User>, UserStoreError>;
}

/// In-process store used by tests and as the no-database fallback.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: Mutex<Vec<User>>,
}

impl InMemoryUserStore {
    fn guard(&self) -> MutexGuard<'_, Vec<User>> {
        self.users.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, user: NewUser) -> Result<User, UserStoreError> {
        let mut users = self.guard();
        if users.iter().any(|existing| existing.email == user.email) {
            return Err(UserStoreError::duplicate_email(user.email));
        }
        let record = user.into_record(UserId::random(), Utc::now());
        users.push(record.clone());
        Ok(record)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserStoreError> {
        let users = self.guard();
        Ok(users
            .iter()
            .find(|user| user.email.as_ref() == email)
            .cloned())
    }

    async fn list_all(&self) -> Result<Vec<User>, UserStoreError> {
        Ok(self.guard().clone())
    }

    async fn update(&self, id: &UserId, patch: UserPatch) -> Result<Option<User>, UserStoreError> {
        let mut users = self.guard();
        let Some(user) = users.iter_mut().find(|user| user.id == *id) else {
            return Ok(None);
        };
        patch.apply(user, Utc::now());
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: &UserId) -> Result<Option<User>, UserStoreError> {
        let mut users = self.guard();
        let position = users.iter().position(|user| user.id == *id);
        Ok(position.map(|index| users.remove(index)))
    }
}
