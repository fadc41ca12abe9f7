use std::time::Duration;

/// Errors that can occur when proxying requests to the Claude Code CLI.
///
/// Errors are organized by category:
/// - Spawn errors: failed to start the CLI subprocess
/// - IO errors: communication failures with the subprocess
/// - Wire errors: unexpected or malformed CLI output
/// - Runtime errors: failures during execution
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    // -------------------------------------------------------------------------
    // Spawn errors
    // -------------------------------------------------------------------------
    /// The claude CLI binary was not found.
    #[error("claude CLI not found (searched: {path})")]
    CliNotFound { path: String },

    /// Failed to spawn the claude subprocess.
    #[error("failed to spawn claude process: {0}")]
    Spawn(#[source] std::io::Error),

    // -------------------------------------------------------------------------
    // IO errors
    // -------------------------------------------------------------------------
    /// IO error communicating with the claude subprocess.
    #[error("IO error: {0}")]
    Io(#[source] std::io::Error),

    // -------------------------------------------------------------------------
    // Wire errors
    // -------------------------------------------------------------------------
    /// A recognized message type carried a payload that failed to decode.
    ///
    /// Unrecognized message types are skipped by the parser; this error is
    /// reserved for corruption in messages we claim to understand.
    #[error("failed to parse {kind} message: {source}")]
    WireParse {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    /// A single NDJSON record exceeded the maximum line length.
    #[error("wire record exceeds {limit} byte limit")]
    OversizedRecord { limit: usize },

    /// The stream ended before a result message was seen.
    #[error("stream ended before a result message")]
    UnexpectedEof,

    // -------------------------------------------------------------------------
    // Runtime errors
    // -------------------------------------------------------------------------
    /// The backend reported an error result.
    #[error("claude error: {message}")]
    Backend { message: String },

    /// The backend rejected the request due to rate limiting.
    #[error("rate limited: {message}")]
    RateLimited { message: String },

    /// The claude subprocess exited with a non-zero code.
    #[error("claude process exited with code {code}: {stderr}")]
    ProcessExited { code: i32, stderr: String },

    /// The request exceeded the configured timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

/// A specialized Result type for cc-proxy operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an IO error.
    pub fn io(source: std::io::Error) -> Self {
        Self::Io(source)
    }

    /// Create a wire-parse error for the given message kind.
    pub fn wire_parse(kind: impl Into<String>, source: serde_json::Error) -> Self {
        Self::WireParse {
            kind: kind.into(),
            source,
        }
    }

    /// Check if this error is a backend rate limit.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::RateLimited { .. })
    }

    /// Check if this error occurred before the subprocess produced output.
    pub fn is_spawn_error(&self) -> bool {
        matches!(self, Error::CliNotFound { .. } | Error::Spawn(_))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::WireParse {
            kind: "unknown".to_string(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }

    #[test]
    fn rate_limit_detection() {
        assert!(Error::RateLimited {
            message: "slow down".into()
        }
        .is_rate_limited());
        assert!(!Error::UnexpectedEof.is_rate_limited());
        assert!(!Error::Backend {
            message: "boom".into()
        }
        .is_rate_limited());
    }

    #[test]
    fn spawn_error_detection() {
        assert!(Error::CliNotFound {
            path: "claude".into()
        }
        .is_spawn_error());
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(Error::Spawn(io_err).is_spawn_error());
        assert!(!Error::Timeout(Duration::from_secs(30)).is_spawn_error());
    }

    #[test]
    fn process_exited_display() {
        let err = Error::ProcessExited {
            code: 2,
            stderr: "fatal: bad flag".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("code 2"));
        assert!(msg.contains("fatal: bad flag"));
    }

    #[test]
    fn question_mark_operator_io() {
        fn fallible_io() -> Result<()> {
            let _file = std::fs::File::open("/nonexistent/path/that/does/not/exist")?;
            Ok(())
        }
        let result = fallible_io();
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn question_mark_operator_json() {
        fn fallible_json() -> Result<()> {
            let _: serde_json::Value = serde_json::from_str("not valid json")?;
            Ok(())
        }
        let result = fallible_json();
        assert!(matches!(result, Err(Error::WireParse { .. })));
    }
}
