//! Subprocess lifecycle management for the Claude Code CLI.
//!
//! Each query spawns a fresh, isolated CLI process:
//!
//! ```text
//! cc-proxy                            claude CLI
//! ┌──────────────┐                    ┌─────────────┐
//! │ chat::Stream │───stdin (prompt)──▶│             │
//! │              │◀──stdout (NDJSON)──│             │
//! │              │◀──stderr (logs)────│             │
//! └──────────────┘                    └─────────────┘
//! ```
//!
//! The [`Client`] enforces bounded concurrency through a counting semaphore
//! and layers a per-query deadline over every stream read. A [`Stream`] owns
//! its subprocess exclusively; [`Stream::close`] kills, reaps, and releases
//! the concurrency slot idempotently.

mod client;
mod process;
mod stream;

pub use client::{Client, ClientConfig, Effort, QueryOptions};
pub use stream::Stream;
