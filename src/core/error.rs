use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    #[error("Command initialization failed: {0}")]
    CommandInitializationFailed(String),

    #[error("Session connect failed: {message}")]
    SessionConnect {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Session disconnect failed: {0}")]
    SessionDisconnect(String),

    #[error("Operation execution failed: {message}")]
    PluginExecutionFailed {
        message: String,
        #[source]
        source: Option<Box<Error>>,
    },

    #[error("Execution interrupted: {0}")]
    InterruptedExecution(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Error::CommandInitializationFailed(_) => "COMMAND_INITIALIZATION_FAILED",
            Error::SessionConnect { .. } => "SESSION_CONNECT_FAILED",
            Error::SessionDisconnect(_) => "SESSION_DISCONNECT_FAILED",
            Error::PluginExecutionFailed { .. } => "PLUGIN_EXECUTION_FAILED",
            Error::InterruptedExecution(_) => "EXECUTION_INTERRUPTED",
            Error::InvalidArgument(_) => "INVALID_ARGUMENT",
            Error::Io(_) => "IO_ERROR",
            Error::Json(_) => "JSON_ERROR",
        }
    }

    pub fn session_connect(message: impl Into<String>) -> Self {
        Error::SessionConnect {
            message: message.into(),
            source: None,
        }
    }

    pub fn session_connect_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Error::SessionConnect {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn plugin_execution_failed(message: impl Into<String>) -> Self {
        Error::PluginExecutionFailed {
            message: message.into(),
            source: None,
        }
    }

    pub fn plugin_execution_failed_with_source(message: impl Into<String>, source: Error) -> Self {
        Error::PluginExecutionFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}
