mod engine;
mod progress;
mod settings;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use engine::{ExamSession, Phase, SessionEvent};
pub use progress::{Progress, session_progress};
pub use settings::{
    DEFAULT_GRACE_SECONDS, MAX_GRACE_SECONDS, ProgressMetric, SessionSettings,
    SessionSettingsError,
};
pub use workflow::SessionWorkflow;
