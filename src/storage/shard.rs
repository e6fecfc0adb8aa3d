use std::time::Duration;

use async_trait::async_trait;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};

use crate::db::models::User;
use crate::db::repo;
use crate::storage::{StorageError, UserStorage};

/// One independent SQLite database holding a disjoint slice of the users.
#[derive(Clone)]
pub struct Shard {
    name: String,
    pool: SqlitePool,
}

impl Shard {
    pub async fn connect(name: &str, url: &str, max_connections: u32) -> Result<Self, StorageError> {
        let connect_err = |source: sqlx::Error| StorageError::Connect {
            shard: name.to_string(),
            source,
        };

        // Each new connection gets the schema, including a replacement opened
        // after the previous one dropped.
        let options = SqlitePoolOptions::new().after_connect(|conn, _meta| {
            Box::pin(async move { repo::create_user_table(conn).await })
        });

        // Every connection to `:memory:` opens a fresh database, so keep exactly
        // one and never let the pool recycle it. If that connection is lost
        // anyway, its replacement starts with an empty `users` table.
        let options = if url.contains(":memory:") {
            options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            options.max_connections(max_connections)
        };

        let pool = options.connect(url).await.map_err(connect_err)?;

        Ok(Self {
            name: name.to_string(),
            pool,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn query_error(&self, source: sqlx::Error) -> StorageError {
        StorageError::Query {
            shard: self.name.clone(),
            source,
        }
    }
}

#[async_trait]
impl UserStorage for Shard {
    async fn save(&self, username: &str, password: &str) -> Result<(), StorageError> {
        repo::insert_user(&self.pool, username, password)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => StorageError::Duplicate {
                    shard: self.name.clone(),
                    username: username.to_string(),
                },
                other => self.query_error(other),
            })?;

        tracing::info!(shard = %self.name, "insert on shard");

        Ok(())
    }

    async fn fetch(&self, username: &str) -> Result<Option<User>, StorageError> {
        repo::get_user(&self.pool, username)
            .await
            .map_err(|e| self.query_error(e))
    }
}
