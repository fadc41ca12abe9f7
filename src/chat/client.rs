//! Client configuration and query entry point.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use super::process;
use super::stream::Stream;
use crate::Result;

/// Reasoning effort level passed to the CLI via `--effort`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effort {
    Low,
    Medium,
    High,
}

impl fmt::Display for Effort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effort::Low => write!(f, "low"),
            Effort::Medium => write!(f, "medium"),
            Effort::High => write!(f, "high"),
        }
    }
}

impl FromStr for Effort {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "low" => Ok(Effort::Low),
            "medium" => Ok(Effort::Medium),
            "high" => Ok(Effort::High),
            other => Err(format!(
                "invalid effort {other:?}: must be low, medium, or high"
            )),
        }
    }
}

/// Configuration for a [`Client`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Path to the claude binary.
    pub cli_path: String,
    /// Default model passed via `--model`. Empty means CLI default.
    pub model: String,
    /// Maximum number of concurrent subprocesses. 0 means unlimited.
    pub max_concurrent: usize,
    /// Per-query timeout covering the whole subprocess lifetime.
    pub default_timeout: Option<Duration>,
    /// Working directory for spawned subprocesses.
    pub work_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            cli_path: "claude".to_string(),
            model: String::new(),
            max_concurrent: 0,
            default_timeout: None,
            work_dir: None,
        }
    }
}

/// Per-query options.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Replaces the CLI's default system prompt via `--system-prompt`.
    /// Always passed, even when empty, so prompt caching stays
    /// deterministic across requests.
    pub system_prompt: String,
    /// Adds `--include-partial-messages` for incremental stream events.
    pub streaming: bool,
    /// Overrides the client's default model for this query.
    pub model: String,
    /// Sets the `--effort` flag.
    pub effort: Option<Effort>,
}

/// Manages Claude Code CLI subprocess interactions.
///
/// Each [`query`](Client::query) spawns a fresh subprocess; the client
/// itself holds only configuration and the concurrency semaphore, so it is
/// cheap to share across tasks behind an `Arc`.
#[derive(Debug)]
pub struct Client {
    config: ClientConfig,
    semaphore: Option<Arc<Semaphore>>,
}

impl Client {
    /// Create a new client with the given configuration.
    pub fn new(mut config: ClientConfig) -> Self {
        if config.cli_path.is_empty() {
            config.cli_path = "claude".to_string();
        }
        let semaphore = (config.max_concurrent > 0)
            .then(|| Arc::new(Semaphore::new(config.max_concurrent)));
        Self { config, semaphore }
    }

    /// Get a reference to the client's configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Start a subprocess with the given prompt and options.
    ///
    /// The prompt is delivered over the child's stdin. Blocks while all
    /// concurrency slots are taken; dropping the returned future while it
    /// waits gives the slot up without spawning anything.
    ///
    /// The caller must call [`Stream::close`] when done, whether or not the
    /// stream was read to completion.
    pub async fn query(&self, prompt: &str, opts: QueryOptions) -> Result<Stream> {
        let permit = match &self.semaphore {
            Some(sem) => Some(
                Arc::clone(sem)
                    .acquire_owned()
                    .await
                    .expect("semaphore is never closed"),
            ),
            None => None,
        };

        // A spawn failure drops the permit right here, so the slot is
        // returned without ever constructing a Stream.
        let spawned = process::spawn(&self.config, &opts, prompt).await?;

        Ok(Stream::new(spawned, permit, self.config.default_timeout))
    }

    #[cfg(test)]
    pub(crate) fn available_permits(&self) -> Option<usize> {
        self.semaphore.as_ref().map(|s| s.available_permits())
    }
}
