use std::sync::Arc;

use exam_core::model::UserId;
use exam_core::time::Clock;
use storage::repository::Storage;

use crate::auth_service::AuthService;
use crate::catalog_service::CatalogService;
use crate::error::{AppServicesError, UserServiceError};
use crate::results_service::ResultsService;
use crate::session::{SessionSettings, SessionWorkflow};
use crate::users_service::UserService;

/// Assembles app-facing services over one storage backend and guarantees an
/// admin account exists.
#[derive(Clone)]
pub struct AppServices {
    admin_id: UserId,
    sessions: Arc<SessionWorkflow>,
    catalog: Arc<CatalogService>,
    auth: Arc<AuthService>,
    users: Arc<UserService>,
    results: Arc<ResultsService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or the admin
    /// seed fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        settings: SessionSettings,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::over(storage, clock, settings).await
    }

    /// Build services over in-memory storage, for tests and demos.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the admin seed fails.
    pub async fn new_in_memory(
        clock: Clock,
        settings: SessionSettings,
    ) -> Result<Self, AppServicesError> {
        Self::over(Storage::in_memory(), clock, settings).await
    }

    async fn over(
        storage: Storage,
        clock: Clock,
        settings: SessionSettings,
    ) -> Result<Self, AppServicesError> {
        let users = Arc::new(UserService::new(Arc::clone(&storage.users)));
        let admin_id = match users.ensure_admin().await {
            Ok(id) => id,
            Err(UserServiceError::User(e)) => return Err(e.into()),
            Err(UserServiceError::Storage(e)) => return Err(e.into()),
        };

        let sessions = Arc::new(SessionWorkflow::new(
            clock,
            Arc::clone(&storage.exams),
            Arc::clone(&storage.results),
            settings,
        ));
        let catalog = Arc::new(CatalogService::new(Arc::clone(&storage.exams)));
        let auth = Arc::new(AuthService::new(Arc::clone(&storage.users)));
        let results = Arc::new(ResultsService::new(Arc::clone(&storage.results)));

        Ok(Self {
            admin_id,
            sessions,
            catalog,
            auth,
            users,
            results,
        })
    }

    /// Id of the seeded (or pre-existing) admin account.
    #[must_use]
    pub fn admin_id(&self) -> UserId {
        self.admin_id
    }

    #[must_use]
    pub fn sessions(&self) -> Arc<SessionWorkflow> {
        Arc::clone(&self.sessions)
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn auth(&self) -> Arc<AuthService> {
        Arc::clone(&self.auth)
    }

    #[must_use]
    pub fn users(&self) -> Arc<UserService> {
        Arc::clone(&self.users)
    }

    #[must_use]
    pub fn results(&self) -> Arc<ResultsService> {
        Arc::clone(&self.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::time::fixed_clock;

    #[tokio::test]
    async fn boots_with_a_seeded_admin() {
        let app = AppServices::new_in_memory(fixed_clock(), SessionSettings::default())
            .await
            .unwrap();

        let admin = app.auth().login("admin", "123").await.unwrap().unwrap();
        assert_eq!(admin.id(), app.admin_id());
        assert!(admin.is_admin());
    }
}
