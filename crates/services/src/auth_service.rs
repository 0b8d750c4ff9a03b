use std::sync::Arc;

use exam_core::model::User;
use storage::repository::UserRepository;

use crate::error::AuthError;

/// Credential check against the user store.
///
/// Credentials are compared as stored; a failed lookup and a wrong password
/// both come back as `None` so callers cannot probe for usernames.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
}

impl AuthService {
    #[must_use]
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Look the credentials up and return the matching user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if repository access fails.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, AuthError> {
        let Some(record) = self.users.find_by_username(username).await? else {
            return Ok(None);
        };
        if record.password != password {
            return Ok(None);
        }
        Ok(Some(record.user))
    }
}
