//! Persistence adapters.

mod mongo_user_store;

pub use mongo_user_store::{MongoConfig, MongoUserStore};
