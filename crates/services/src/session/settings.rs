use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default grace period between clock exhaustion and forced scoring.
pub const DEFAULT_GRACE_SECONDS: u32 = 3;

/// Longest grace period an operator can configure.
pub const MAX_GRACE_SECONDS: u32 = 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionSettingsError {
    #[error("grace period must be between 1 and {MAX_GRACE_SECONDS} seconds, got {0}")]
    InvalidGraceSeconds(u32),
}

/// Which quantity the progress percentage tracks.
///
/// The original deployments disagreed on this, so it is a knob rather than a
/// constant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressMetric {
    /// Percent of questions reached (position-based).
    #[default]
    Questions,
    /// Percent of the time budget already spent.
    Time,
}

/// Per-deployment tuning for exam sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    grace_seconds: u32,
    progress_metric: ProgressMetric,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            grace_seconds: DEFAULT_GRACE_SECONDS,
            progress_metric: ProgressMetric::Questions,
        }
    }
}

impl SessionSettings {
    /// Creates validated settings.
    ///
    /// # Errors
    ///
    /// Returns `SessionSettingsError::InvalidGraceSeconds` when the grace
    /// period is zero or longer than `MAX_GRACE_SECONDS`.
    pub fn new(
        grace_seconds: u32,
        progress_metric: ProgressMetric,
    ) -> Result<Self, SessionSettingsError> {
        if grace_seconds == 0 || grace_seconds > MAX_GRACE_SECONDS {
            return Err(SessionSettingsError::InvalidGraceSeconds(grace_seconds));
        }

        Ok(Self {
            grace_seconds,
            progress_metric,
        })
    }

    #[must_use]
    pub fn grace_seconds(&self) -> u32 {
        self.grace_seconds
    }

    #[must_use]
    pub fn progress_metric(&self) -> ProgressMetric {
        self.progress_metric
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = SessionSettings::default();
        assert_eq!(settings.grace_seconds(), DEFAULT_GRACE_SECONDS);
        assert_eq!(settings.progress_metric(), ProgressMetric::Questions);
    }

    #[test]
    fn rejects_zero_grace() {
        let err = SessionSettings::new(0, ProgressMetric::Time).unwrap_err();
        assert_eq!(err, SessionSettingsError::InvalidGraceSeconds(0));
    }

    #[test]
    fn accepts_bounds() {
        assert!(SessionSettings::new(1, ProgressMetric::Questions).is_ok());
        assert!(SessionSettings::new(MAX_GRACE_SECONDS, ProgressMetric::Time).is_ok());
        assert!(SessionSettings::new(MAX_GRACE_SECONDS + 1, ProgressMetric::Time).is_err());
    }
}
