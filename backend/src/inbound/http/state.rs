//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::UserStore;

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Durable storage for user records.
    pub users: Arc<dyn UserStore>,
}

impl HttpState {
    /// Construct state around a user store implementation.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use backend::domain::ports::InMemoryUserStore;
    /// use backend::inbound::http::state::HttpState;
    ///
    /// let state = HttpState::new(Arc::new(InMemoryUserStore::default()));
    /// let _users = state.users.clone();
    /// ```
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }
}
