//! Error types for identity tokens

use thiserror::Error;

use crate::FamilyKey;

/// Identity token errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UniqIdError {
    /// A construction asked for a label the family already fixed differently.
    #[error("Label conflict in family {family}: label is fixed to {existing:?}, requested {requested:?}")]
    LabelConflict {
        family: FamilyKey,
        existing: String,
        requested: String,
    },

    /// An operation requiring liveness ran on a token that was transferred away.
    #[error("Invalid token: {family} serial {serial} is no longer held by this instance")]
    InvalidToken { family: FamilyKey, serial: u64 },

    /// Every serial from the family's start offset up to `u64::MAX` is taken.
    #[error("Serials exhausted in family {family}")]
    SerialsExhausted { family: FamilyKey },
}

impl UniqIdError {
    pub fn is_label_conflict(&self) -> bool {
        matches!(self, UniqIdError::LabelConflict { .. })
    }

    pub fn is_invalid_token(&self) -> bool {
        matches!(self, UniqIdError::InvalidToken { .. })
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, UniqIdError::SerialsExhausted { .. })
    }
}

/// Result type for identity token operations
pub type UniqIdResult<T> = Result<T, UniqIdError>;
