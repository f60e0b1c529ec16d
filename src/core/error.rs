use thiserror::Error;

/// Failures raised by the work order store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("work order store unavailable: {0}")]
    Unavailable(#[from] rusqlite::Error),

    /// Contract violation: the caller touched a fingerprint that was never
    /// inserted. Not an expected runtime condition.
    #[error("no work order on file for fingerprint {0}")]
    NotFound(String),
}

/// Failures from the external classification collaborator.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("classification transport failure: {0}")]
    Transport(#[source] anyhow::Error),

    /// The service answered but the payload failed boundary validation.
    /// Never retried.
    #[error("malformed classification response: {0}")]
    Malformed(String),
}

impl ClassifyError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<reqwest::Error> for ClassifyError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.into())
    }
}

/// Failures from the outbound notification channel. Logged, never fatal.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("notifier rejected delivery: {0}")]
    Rejected(String),
}

/// Per-incident processing failures surfaced to the operator.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Blank input after trimming. Doubles as the interactive exit signal.
    #[error("empty incident report")]
    EmptyInput,

    #[error("classification service unavailable after {attempts} attempt(s): {source}")]
    ClassificationUnavailable {
        attempts: u32,
        #[source]
        source: ClassifyError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}
