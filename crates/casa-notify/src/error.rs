use casa_core::{ErrorMetadata, LogLevel};

/// Push gateway errors. Per-recipient failures are tickets, not errors.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Push gateway request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Push gateway returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid push gateway response: {0}")]
    InvalidResponse(String),

    #[error("Batch of {size} exceeds the gateway limit of {limit}")]
    BatchTooLarge { size: usize, limit: usize },
}

/// Table access errors.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Table request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Table {table} returned HTTP {status}: {body}")]
    Status {
        table: &'static str,
        status: u16,
        body: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

#[derive(Debug, thiserror::Error)]
pub enum BroadcastError {
    #[error("Invalid notification: {0}")]
    InvalidNotice(String),

    #[error("Could not load the audience: {0}")]
    Audience(#[source] RepositoryError),
}

impl ErrorMetadata for BroadcastError {
    fn error_code(&self) -> &'static str {
        match self {
            BroadcastError::InvalidNotice(_) => "INVALID_NOTIFICATION",
            BroadcastError::Audience(_) => "AUDIENCE_UNAVAILABLE",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, BroadcastError::Audience(_))
    }

    fn suggested_action(&self) -> Option<&'static str> {
        match self {
            BroadcastError::InvalidNotice(_) => Some("Enter a title and a message"),
            BroadcastError::Audience(_) => Some("Check your internet connection and try again"),
        }
    }

    fn client_message(&self) -> String {
        match self {
            BroadcastError::InvalidNotice(msg) => msg.clone(),
            BroadcastError::Audience(_) => "Could not load the list of recipients.".to_string(),
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            BroadcastError::InvalidNotice(_) => LogLevel::Debug,
            BroadcastError::Audience(_) => LogLevel::Error,
        }
    }
}
