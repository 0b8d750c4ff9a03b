use std::sync::Arc;

use exam_core::model::{Role, User, UserId};
use storage::repository::{StorageError, UserRecord, UserRepository};

use crate::error::UserServiceError;

/// Orchestrates account administration.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    #[must_use]
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Create an account and persist it.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::User` for validation failures.
    /// Returns `UserServiceError::Storage` with `Conflict` when the username
    /// is taken, or if persistence fails.
    pub async fn create_user(
        &self,
        username: String,
        display_name: String,
        password: String,
        role: Role,
        position: Option<String>,
        language: Option<String>,
    ) -> Result<UserId, UserServiceError> {
        let user = User::new(
            UserId::new(1),
            username,
            display_name,
            role,
            position,
            language,
        )?;
        let user_id = self
            .users
            .insert_new_user(&UserRecord { user, password })
            .await?;
        Ok(user_id)
    }

    /// Replace an account's profile and password.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::User` if validation fails.
    /// Returns `UserServiceError::Storage` if the account is missing or
    /// repository access fails.
    pub async fn update_user(
        &self,
        user_id: UserId,
        username: String,
        display_name: String,
        password: String,
        role: Role,
        position: Option<String>,
        language: Option<String>,
    ) -> Result<(), UserServiceError> {
        let user = User::new(user_id, username, display_name, role, position, language)?;
        self.users
            .upsert_user(&UserRecord { user, password })
            .await?;
        Ok(())
    }

    /// List all accounts, without passwords.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::Storage` if repository access fails.
    pub async fn list_users(&self) -> Result<Vec<User>, UserServiceError> {
        let users = self.users.list_users().await?;
        Ok(users)
    }

    /// Delete an account.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::Storage` if the account is missing or
    /// repository access fails.
    pub async fn delete_user(&self, user_id: UserId) -> Result<(), UserServiceError> {
        self.users.delete_user(user_id).await?;
        Ok(())
    }

    /// Make sure an admin account exists, seeding the default one on first
    /// run. Returns the admin's id.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::User` if the seed record fails validation.
    /// Returns `UserServiceError::Storage` if repository access fails.
    pub async fn ensure_admin(&self) -> Result<UserId, UserServiceError> {
        let existing = self.users.list_users().await?;
        if let Some(admin) = existing.iter().find(|u| u.is_admin()) {
            return Ok(admin.id());
        }

        let user = User::new(
            UserId::new(1),
            "admin",
            "Administrator",
            Role::Admin,
            None,
            None,
        )?;
        let record = UserRecord {
            user,
            password: "123".to_owned(),
        };
        match self.users.insert_new_user(&record).await {
            Ok(id) => Ok(id),
            // Lost a race with another bootstrap; the account is there now.
            Err(StorageError::Conflict) => {
                let users = self.users.list_users().await?;
                users
                    .iter()
                    .find(|u| u.is_admin())
                    .map(User::id)
                    .ok_or(UserServiceError::Storage(StorageError::Conflict))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::Storage;

    #[tokio::test]
    async fn ensure_admin_seeds_once() {
        let storage = Storage::in_memory();
        let service = UserService::new(storage.users);

        let first = service.ensure_admin().await.unwrap();
        let second = service.ensure_admin().await.unwrap();
        assert_eq!(first, second);

        let users = service.list_users().await.unwrap();
        assert_eq!(users.len(), 1);
        assert!(users[0].is_admin());
        assert_eq!(users[0].username(), "admin");
    }

    #[tokio::test]
    async fn duplicate_usernames_conflict() {
        let storage = Storage::in_memory();
        let service = UserService::new(storage.users);

        service
            .create_user(
                "omar".to_owned(),
                "Omar".to_owned(),
                "pw".to_owned(),
                Role::Candidate,
                None,
                None,
            )
            .await
            .unwrap();
        let err = service
            .create_user(
                "omar".to_owned(),
                "Other Omar".to_owned(),
                "pw2".to_owned(),
                Role::Candidate,
                None,
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            UserServiceError::Storage(StorageError::Conflict)
        ));
    }

    #[tokio::test]
    async fn update_replaces_profile_and_password() {
        let storage = Storage::in_memory();
        let service = UserService::new(Arc::clone(&storage.users));

        let id = service
            .create_user(
                "lena".to_owned(),
                "Lena".to_owned(),
                "old".to_owned(),
                Role::Candidate,
                None,
                None,
            )
            .await
            .unwrap();
        service
            .update_user(
                id,
                "lena".to_owned(),
                "Lena M.".to_owned(),
                "new".to_owned(),
                Role::Admin,
                Some("Inspector".to_owned()),
                None,
            )
            .await
            .unwrap();

        let record = storage.users.find_by_username("lena").await.unwrap().unwrap();
        assert_eq!(record.user.display_name(), "Lena M.");
        assert_eq!(record.password, "new");
        assert!(record.user.is_admin());
    }
}
