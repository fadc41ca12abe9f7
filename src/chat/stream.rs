//! Message stream bound to one running subprocess.

use std::time::Duration;

use tokio::io::BufReader;
use tokio::process::{Child, ChildStdout};
use tokio::sync::OwnedSemaphorePermit;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::process::SpawnedProcess;
use crate::wire::{Parser, ResultMessage, WireMessage};
use crate::{Error, Result};

/// Reads typed [`WireMessage`] values from a running subprocess.
///
/// A stream holds two resources that must be released: the subprocess and a
/// concurrency slot on the parent [`Client`](super::Client). Callers must
/// call [`close`](Stream::close) when finished. Close is idempotent, and
/// dropping an unclosed stream still kills the child and returns the slot.
pub struct Stream {
    child: Child,
    parser: Parser<BufReader<ChildStdout>>,
    stderr_task: Option<JoinHandle<String>>,
    permit: Option<OwnedSemaphorePermit>,
    timeout: Option<Duration>,
    deadline: Option<Instant>,
    done: bool,
    closed: bool,
    result: Option<ResultMessage>,
}

impl Stream {
    pub(crate) fn new(
        spawned: SpawnedProcess,
        permit: Option<OwnedSemaphorePermit>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            child: spawned.child,
            parser: Parser::new(spawned.stdout),
            stderr_task: Some(spawned.stderr_task),
            permit,
            timeout,
            deadline: timeout.map(|t| Instant::now() + t),
            done: false,
            closed: false,
            result: None,
        }
    }

    /// Read the next message from the stream.
    ///
    /// When all messages have been consumed, waits for the subprocess to
    /// exit. A clean exit yields `Ok(None)`; a non-zero exit yields
    /// [`Error::ProcessExited`] with the captured stderr. An assistant
    /// message carrying the `rate_limit` marker yields
    /// [`Error::RateLimited`]. After EOF, further calls return `Ok(None)`
    /// immediately.
    ///
    /// The last result message seen is cached and available via
    /// [`result`](Stream::result).
    pub async fn next(&mut self) -> Result<Option<WireMessage>> {
        if self.done {
            return Ok(None);
        }

        let read = self.parser.next();
        let parsed = match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, read)
                .await
                .map_err(|_| Error::Timeout(self.timeout.unwrap_or_default()))?,
            None => read.await,
        }?;

        let Some(msg) = parsed else {
            self.done = true;
            let status = self.child.wait().await.map_err(Error::io)?;
            if !status.success() {
                return Err(Error::ProcessExited {
                    code: status.code().unwrap_or(-1),
                    stderr: self.collect_stderr().await,
                });
            }
            return Ok(None);
        };

        if let WireMessage::Assistant(assistant) = &msg {
            if assistant.error.as_deref() == Some("rate_limit") {
                let message = assistant
                    .message
                    .content
                    .iter()
                    .find_map(|block| block.text())
                    .filter(|text| !text.is_empty())
                    .map(str::to_owned)
                    .unwrap_or_else(|| "rate limit exceeded".to_string());
                return Err(Error::RateLimited { message });
            }
        }

        if let WireMessage::Result(result) = &msg {
            self.result = Some(result.clone());
        }

        Ok(Some(msg))
    }

    /// Drain the stream and return the final result message.
    ///
    /// Intermediate messages are discarded. Fails with
    /// [`Error::UnexpectedEof`] if the stream ended without a result (e.g.
    /// the process was killed).
    pub async fn result(&mut self) -> Result<ResultMessage> {
        while self.next().await?.is_some() {}
        self.result.clone().ok_or(Error::UnexpectedEof)
    }

    /// Terminate the stream and release all associated resources.
    ///
    /// If the subprocess is still running it is killed and reaped. The
    /// concurrency slot on the parent client is released exactly once no
    /// matter how many times close is called or whether the stream was
    /// ever read.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if !self.done {
            let _ = self.child.start_kill();
            let _ = self.child.wait().await;
            self.done = true;
        }

        if let Some(task) = self.stderr_task.take() {
            task.abort();
        }

        self.permit.take();
    }

    async fn collect_stderr(&mut self) -> String {
        match self.stderr_task.take() {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        }
    }
}

impl Drop for Stream {
    fn drop(&mut self) {
        // Deferred-cleanup backstop: kill_on_drop reaps the child in the
        // background, and the permit is released when the struct goes away.
        if !self.done {
            let _ = self.child.start_kill();
        }
    }
}
