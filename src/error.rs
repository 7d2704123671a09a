use thiserror::Error;

#[derive(Debug, Error)]
pub enum LipSyncError {
    #[error("I/O error while {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON parse error while {context}: {source}")]
    Json {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{context}: {message}")]
    Collaborator {
        context: &'static str,
        message: String,
    },
    #[error("no pronunciation found for word '{word}'")]
    MissingPronunciation { word: String },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl LipSyncError {
    pub(crate) fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    pub(crate) fn json(context: &'static str, source: serde_json::Error) -> Self {
        Self::Json { context, source }
    }

    pub(crate) fn collaborator(context: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Collaborator {
            context,
            message: err.to_string(),
        }
    }

    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}
