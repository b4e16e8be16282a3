use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("Target index {index} out of range ({len} targets)")]
    TargetOutOfRange { index: usize, len: usize },

    #[error("Field `{0}` cannot be changed on an existing deployment")]
    ImmutableField(&'static str),

    #[error("Invalid field path: {0}")]
    InvalidPath(String),

    #[error("Invalid value for `{path}`: {reason}")]
    InvalidValue { path: String, reason: String },

    #[error("A deployment needs at least one target")]
    EmptyTargets,

    #[error("Draft is not linked to an existing deployment")]
    NotLinked,

    #[error("A submission is already in progress for this draft")]
    SubmissionInFlight,

    #[error("Draft session {0} not found")]
    SessionNotFound(Uuid),
}
