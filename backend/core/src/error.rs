use thiserror::Error;
use uuid::Uuid;

/// Top-level error type for the docsight client.
#[derive(Debug, Error)]
pub enum DocsightError {
    #[error("no message with id {0}")]
    UnknownMessage(Uuid),

    #[error("message {0} is no longer streaming")]
    NotStreaming(Uuid),

    /// A request to the analysis service failed. `status` is set when the
    /// service answered with a non-success code.
    #[error("{message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DocsightError {
    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        DocsightError::Transport {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            DocsightError::Transport { status, .. } => *status,
            _ => None,
        }
    }
}
