use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("not found: {0}")]
    NotFound(&'static str),
    #[error("invalid input: {0}")]
    Invalid(&'static str),
    #[error("conflict: {0}")]
    Conflict(&'static str),
    #[error("forbidden: {0}")]
    Forbidden(&'static str),
    #[error("storage error: {0}")]
    Storage(&'static str),
    #[error("remote error {status}: {message}")]
    Remote { status: u16, message: String },
    #[error("cancelled")]
    Cancelled,
    /// A user-facing action failed; `action` names it ("save note").
    #[error("failed to {action}: {source}")]
    ActionFailed {
        action: String,
        #[source]
        source: Box<CoreError>,
    },
    /// A multi-step save stopped after `completed` of its steps.
    #[error("partial write: {failed_step} failed after {completed} step(s): {source}")]
    PartialWrite {
        completed: usize,
        failed_step: &'static str,
        #[source]
        source: Box<CoreError>,
    },
}

impl CoreError {
    /// Wraps `source` as the failure of a named action. Cancellation passes through.
    pub fn action(action: impl Into<String>, source: CoreError) -> Self {
        if source.is_cancelled() {
            return source;
        }
        CoreError::ActionFailed {
            action: action.into(),
            source: Box::new(source),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, CoreError::Cancelled)
    }
}
