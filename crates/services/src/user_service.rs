use std::sync::Arc;

use quiz_core::model::{UserId, UserName};
use storage::repository::UserRepository;

use crate::error::UserServiceError;

/// Registers and looks up quiz users.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    #[must_use]
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Register `name`, or return the id it already has.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::InvalidName` for blank names, or storage errors.
    pub async fn register(&self, name: &str) -> Result<UserId, UserServiceError> {
        let name = UserName::new(name)?;
        let id = self.users.insert_user_if_absent(&name).await?;
        Ok(id)
    }

    /// Names of every registered user, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::Storage` on backend failures.
    pub async fn list_users(&self) -> Result<Vec<String>, UserServiceError> {
        let users = self.users.list_users().await?;
        Ok(users.iter().map(|u| u.name().to_string()).collect())
    }

    /// Id of an existing user.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::NotFound` if nobody is registered under `name`.
    pub async fn resolve(&self, name: &str) -> Result<UserId, UserServiceError> {
        let parsed = UserName::new(name)?;
        self.users
            .find_user(&parsed)
            .await?
            .map(|u| u.id())
            .ok_or_else(|| UserServiceError::NotFound {
                name: parsed.to_string(),
            })
    }
}
