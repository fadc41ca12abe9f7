//! Streaming NDJSON parser for CLI output.

use std::pin::Pin;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use super::messages::WireMessage;
use crate::{Error, Result};

/// Maximum accepted length of a single NDJSON record. Large assistant
/// responses and tool results fit comfortably; anything bigger is treated
/// as corruption.
pub const MAX_RECORD_BYTES: usize = 10 * 1024 * 1024;

/// Initial line buffer capacity.
const INITIAL_BUFFER_BYTES: usize = 1024 * 1024;

/// A streaming NDJSON parser over CLI stdout.
///
/// Each line of input is a JSON object whose `type` field selects a
/// [`WireMessage`] variant. The parser is tolerant where it must be and
/// strict where it can be:
///
/// - empty lines are skipped;
/// - lines that do not decode far enough to reveal a `type` are skipped;
/// - lines with an unrecognized `type` are skipped (new event kinds appear
///   across CLI versions);
/// - lines with a recognized `type` but a malformed payload are an error,
///   so corruption is surfaced rather than swallowed.
///
/// A parser is owned by a single [`Stream`](crate::chat::Stream) and lives
/// for the duration of one subprocess.
pub struct Parser<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: AsyncBufRead + Unpin> Parser<R> {
    /// Create a parser reading NDJSON lines from `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::with_capacity(INITIAL_BUFFER_BYTES),
        }
    }

    /// Read and return the next typed message.
    ///
    /// Returns `Ok(None)` when the underlying reader is exhausted.
    pub async fn next(&mut self) -> Result<Option<WireMessage>> {
        loop {
            if !self.read_record().await? {
                return Ok(None);
            }
            if let Some(msg) = WireMessage::from_json_line(&self.buf)? {
                return Ok(Some(msg));
            }
        }
    }

    /// Fill `self.buf` with the next newline-delimited record.
    ///
    /// Returns false at EOF. A final line without a trailing newline is
    /// still returned. Records over [`MAX_RECORD_BYTES`] fail without
    /// buffering the rest of the line.
    async fn read_record(&mut self) -> Result<bool> {
        self.buf.clear();
        loop {
            let available = self.reader.fill_buf().await.map_err(Error::io)?;
            if available.is_empty() {
                return Ok(!self.buf.is_empty());
            }
            match available.iter().position(|&b| b == b'\n') {
                Some(pos) => {
                    self.buf.extend_from_slice(&available[..pos]);
                    Pin::new(&mut self.reader).consume(pos + 1);
                    if self.buf.len() > MAX_RECORD_BYTES {
                        return Err(Error::OversizedRecord {
                            limit: MAX_RECORD_BYTES,
                        });
                    }
                    return Ok(true);
                }
                None => {
                    let n = available.len();
                    self.buf.extend_from_slice(available);
                    Pin::new(&mut self.reader).consume(n);
                    if self.buf.len() > MAX_RECORD_BYTES {
                        return Err(Error::OversizedRecord {
                            limit: MAX_RECORD_BYTES,
                        });
                    }
                }
            }
        }
    }
}
