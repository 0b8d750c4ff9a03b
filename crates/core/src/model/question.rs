use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("a question needs between {min} and {max} answer options, got {got}")]
    OptionCountOutOfRange { min: usize, max: usize, got: usize },

    #[error("answer option {0} cannot be empty")]
    EmptyOption(OptionLabel),

    #[error("correct option {0} is not among the provided options")]
    CorrectOptionMissing(OptionLabel),

    #[error("invalid image url: {0}")]
    InvalidImageUrl(String),
}

/// Error type for parsing an option label from a string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid option label: {0:?}")]
pub struct ParseLabelError(pub String);

//
// ─── OPTION LABEL ──────────────────────────────────────────────────────────────
//

/// One of the fixed answer slots a question can offer.
///
/// The label set is closed: a question presents at least slots A and B and at
/// most A through D, and the test-taker's selection is always one of these.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum OptionLabel {
    A,
    B,
    C,
    D,
}

impl OptionLabel {
    /// All labels in display order.
    pub const ALL: [OptionLabel; 4] = [Self::A, Self::B, Self::C, Self::D];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }
}

impl fmt::Display for OptionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionLabel {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            "D" => Ok(Self::D),
            other => Err(ParseLabelError(other.to_owned())),
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Minimum number of answer options a question must offer.
pub const MIN_OPTIONS: usize = 2;
/// Maximum number of answer options a question can offer.
pub const MAX_OPTIONS: usize = 4;

/// A single multiple-choice question.
///
/// Immutable once a session has snapshotted the containing exam; the admin
/// editor replaces whole questions rather than mutating them in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    image_url: Option<String>,
    options: BTreeMap<OptionLabel, String>,
    correct_option: OptionLabel,
}

impl Question {
    /// Creates a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the prompt is empty, the option count is
    /// outside 2–4, any option text is empty, the correct label is not among
    /// the offered options, or the image reference is not a valid URL.
    pub fn new(
        id: QuestionId,
        prompt: impl Into<String>,
        image_url: Option<String>,
        options: BTreeMap<OptionLabel, String>,
        correct_option: OptionLabel,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&options.len()) {
            return Err(QuestionError::OptionCountOutOfRange {
                min: MIN_OPTIONS,
                max: MAX_OPTIONS,
                got: options.len(),
            });
        }
        for (label, text) in &options {
            if text.trim().is_empty() {
                return Err(QuestionError::EmptyOption(*label));
            }
        }
        if !options.contains_key(&correct_option) {
            return Err(QuestionError::CorrectOptionMissing(correct_option));
        }
        if let Some(raw) = &image_url {
            Url::parse(raw).map_err(|_| QuestionError::InvalidImageUrl(raw.clone()))?;
        }

        Ok(Self {
            id,
            prompt,
            image_url,
            options,
            correct_option,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    /// Offered answer options keyed by label, in label order.
    #[must_use]
    pub fn options(&self) -> &BTreeMap<OptionLabel, String> {
        &self.options
    }

    #[must_use]
    pub fn correct_option(&self) -> OptionLabel {
        self.correct_option
    }

    /// True when this question offers the given label.
    #[must_use]
    pub fn offers(&self, label: OptionLabel) -> bool {
        self.options.contains_key(&label)
    }
}
