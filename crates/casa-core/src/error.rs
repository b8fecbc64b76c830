//! Error metadata shared by every Casa crate.
//!
//! Each crate defines its own closed `thiserror` enum (storage, pipeline,
//! notification). The screens that call into those crates only need to know
//! how to present an error and whether offering a retry makes sense, so every
//! user-facing error implements [`ErrorMetadata`].

use std::error::Error;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected outcomes such as a user abandoning a flow
    Debug,
    /// Warning level - for recoverable issues like connectivity loss
    Warn,
    /// Error level - for unexpected failures or misconfiguration
    Error,
}

/// Describes how an error should be presented to the person using the app.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "BUCKET_NOT_FOUND")
    fn error_code(&self) -> &'static str;

    /// Whether the user can fix this by simply trying again
    fn is_recoverable(&self) -> bool;

    /// Suggested next step for the user
    fn suggested_action(&self) -> Option<&'static str>;

    /// Human-readable message shown on screen
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Render an error and its source chain, one cause per line.
pub fn detailed_message(err: &dyn Error) -> String {
    let mut details = err.to_string();

    let mut source = err.source();
    let mut depth = 0;
    while let Some(cause) = source {
        depth += 1;
        if depth > 5 {
            details.push_str("\n  ... (truncated)");
            break;
        }
        details.push_str(&format!("\n  Caused by: {}", cause));
        source = cause.source();
    }

    details
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("outer failure")]
    struct Outer(#[source] Inner);

    #[derive(Debug, thiserror::Error)]
    #[error("inner failure")]
    struct Inner;

    #[test]
    fn test_detailed_message_includes_causes() {
        let err = Outer(Inner);
        let message = detailed_message(&err);
        assert_eq!(message, "outer failure\n  Caused by: inner failure");
    }

    #[test]
    fn test_detailed_message_without_source() {
        assert_eq!(detailed_message(&Inner), "inner failure");
    }
}
