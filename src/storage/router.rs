//! Static hash routing of usernames onto a fixed, ordered list of shards.
//!
//! The shard for a key is `sha256(key)[0] mod N`. It depends on nothing but
//! the key bytes and the list length, so it is recomputed on every call and
//! never stored.
//!
//! Limitations:
//! - Only the leading digest byte is used. When N does not divide 256, the
//!   indices below `256 mod N` own one more byte value than the others, so
//!   the higher indices are slightly under-weighted.
//! - Changing N or reordering the list remaps nearly every key. Resizing the
//!   cluster means migrating all rows.

use std::sync::Arc;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::db::models::User;
use crate::storage::{StorageError, UserStorage};

/// Index of the shard that owns `key` among `shard_count` shards.
///
/// The key is hashed as-is: no case folding, no trimming.
pub fn shard_index(key: &str, shard_count: usize) -> usize {
    let digest = Sha256::digest(key.as_bytes());
    usize::from(digest[0]) % shard_count
}

#[derive(Clone)]
pub struct ShardRouter {
    shards: Arc<[Arc<dyn UserStorage>]>,
}

impl ShardRouter {
    pub fn new(shards: Vec<Arc<dyn UserStorage>>) -> Result<Self, StorageError> {
        if shards.is_empty() {
            return Err(StorageError::NoShards);
        }

        Ok(Self {
            shards: shards.into(),
        })
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    pub fn shard_for(&self, username: &str) -> &dyn UserStorage {
        let index = shard_index(username, self.shards.len());
        tracing::debug!(shard_index = index, "routed key");
        self.shards[index].as_ref()
    }
}

#[async_trait]
impl UserStorage for ShardRouter {
    async fn save(&self, username: &str, password: &str) -> Result<(), StorageError> {
        self.shard_for(username).save(username, password).await
    }

    async fn fetch(&self, username: &str) -> Result<Option<User>, StorageError> {
        self.shard_for(username).fetch(username).await
    }
}
