#![forbid(unsafe_code)]

pub mod app_services;
pub mod auth_service;
pub mod catalog_service;
pub mod error;
pub mod results_service;
pub mod session;
pub mod users_service;

pub use exam_core::time::Clock;

pub use app_services::AppServices;
pub use auth_service::AuthService;
pub use catalog_service::{CatalogService, QuestionDraft};
pub use error::{
    AppServicesError, AuthError, CatalogError, ResultsError, SessionError, UserServiceError,
};
pub use results_service::ResultsService;
pub use users_service::UserService;

pub use session::{
    ExamSession, Phase, Progress, ProgressMetric, SessionEvent, SessionSettings, SessionWorkflow,
    session_progress,
};
