use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A user row. `id` is assigned by the shard that stores it and is only
/// unique within that shard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password: String,
}
