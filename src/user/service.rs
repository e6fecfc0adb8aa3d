use std::sync::Arc;

use crate::db::models::User;
use crate::storage::{StorageError, UserStorage};

/// Seam between the HTTP layer and whatever storage sits behind it.
#[derive(Clone)]
pub struct UserService {
    storage: Arc<dyn UserStorage>,
}

impl UserService {
    pub fn new(storage: Arc<dyn UserStorage>) -> Self {
        Self { storage }
    }

    pub async fn create_user(&self, username: &str, password: &str) -> Result<(), StorageError> {
        self.storage.save(username, password).await
    }

    pub async fn get_user(&self, username: &str) -> Result<Option<User>, StorageError> {
        self.storage.fetch(username).await
    }
}
