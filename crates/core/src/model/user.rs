use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::UserId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UserError {
    #[error("username cannot be empty")]
    EmptyUsername,

    #[error("display name cannot be empty")]
    EmptyDisplayName,
}

/// Error type for parsing a role from a string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid role: {0:?}")]
pub struct ParseRoleError(pub String);

/// Account role: administrators author and publish exams, candidates sit them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Candidate,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Candidate => "candidate",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "candidate" => Ok(Self::Candidate),
            other => Err(ParseRoleError(other.to_owned())),
        }
    }
}

/// An account known to the platform.
///
/// Credentials live in the storage layer; this type is what authentication
/// hands back after a successful lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    username: String,
    display_name: String,
    role: Role,
    position: Option<String>,
    language: Option<String>,
}

impl User {
    /// Creates a validated user.
    ///
    /// # Errors
    ///
    /// Returns `UserError` when the username or display name is blank.
    pub fn new(
        id: UserId,
        username: impl Into<String>,
        display_name: impl Into<String>,
        role: Role,
        position: Option<String>,
        language: Option<String>,
    ) -> Result<Self, UserError> {
        let username = username.into();
        if username.trim().is_empty() {
            return Err(UserError::EmptyUsername);
        }
        let display_name = display_name.into();
        if display_name.trim().is_empty() {
            return Err(UserError::EmptyDisplayName);
        }

        Ok(Self {
            id,
            username,
            display_name,
            role,
            position,
            language,
        })
    }

    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn position(&self) -> Option<&str> {
        self.position.as_deref()
    }

    #[must_use]
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
