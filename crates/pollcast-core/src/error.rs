use pollcast_db::DbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("You have already voted on this poll")]
    DuplicateVote,
    #[error("{0}")]
    InvalidOption(String),
    #[error("Multiple answers are not allowed for this poll")]
    MultipleAnswersNotAllowed,
    #[error("Poll not found")]
    NotFound,
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] DbError),
    #[error("poll is being updated concurrently, retry later")]
    WriteContention,
}
