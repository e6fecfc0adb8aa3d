//! User storage contract shared by single shards and the shard router.

use async_trait::async_trait;
use thiserror::Error;

use crate::db::models::User;

pub mod router;
pub mod shard;

pub use router::ShardRouter;
pub use shard::Shard;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("username '{username}' already exists in {shard}")]
    Duplicate { shard: String, username: String },

    #[error("query failed on {shard}: {source}")]
    Query {
        shard: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("failed to open {shard}: {source}")]
    Connect {
        shard: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("shard router needs at least one shard")]
    NoShards,
}

/// Save/fetch by username. Implemented by every shard backend and by the
/// router that composes them, so callers never know which one they hold.
#[async_trait]
pub trait UserStorage: Send + Sync {
    /// Insert a new user. An existing username is an error, never an update.
    async fn save(&self, username: &str, password: &str) -> Result<(), StorageError>;

    /// Exact-match lookup. `Ok(None)` when no row matches.
    async fn fetch(&self, username: &str) -> Result<Option<User>, StorageError>;
}
