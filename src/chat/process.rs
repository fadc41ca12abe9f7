//! Subprocess spawning and argument construction.

use std::process::Stdio;

use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;

use super::client::{ClientConfig, QueryOptions};
use crate::{Error, Result};

/// A freshly spawned CLI subprocess with its IO endpoints wired up.
pub(crate) struct SpawnedProcess {
    pub child: Child,
    pub stdout: BufReader<ChildStdout>,
    /// Background task accumulating stderr for error reporting.
    pub stderr_task: JoinHandle<String>,
}

/// Spawn a claude subprocess for one query.
///
/// The prompt is written to stdin by a background task and stdin is closed
/// afterwards; it is never passed as an argument, which keeps arbitrarily
/// large conversations clear of OS argv limits.
pub(crate) async fn spawn(
    config: &ClientConfig,
    opts: &QueryOptions,
    prompt: &str,
) -> Result<SpawnedProcess> {
    let args = build_args(config, opts);

    let mut cmd = Command::new(&config.cli_path);
    cmd.args(&args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(dir) = &config.work_dir {
        cmd.current_dir(dir);
    }

    let mut child = cmd.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::CliNotFound {
                path: config.cli_path.clone(),
            }
        } else {
            Error::Spawn(e)
        }
    })?;

    let mut stdin = child.stdin.take().expect("stdin was configured");
    let prompt = prompt.to_owned();
    tokio::spawn(async move {
        if let Err(e) = stdin.write_all(prompt.as_bytes()).await {
            tracing::debug!("writing prompt to claude stdin failed: {e}");
            return;
        }
        let _ = stdin.shutdown().await;
    });

    let stderr = child.stderr.take().expect("stderr was configured");
    let stderr_task = tokio::spawn(async move {
        let mut buf = String::new();
        let _ = BufReader::new(stderr).read_to_string(&mut buf).await;
        buf
    });

    let stdout = child.stdout.take().expect("stdout was configured");

    Ok(SpawnedProcess {
        child,
        stdout: BufReader::new(stdout),
        stderr_task,
    })
}

/// Build the CLI argument vector for one query.
///
/// Built-in tools, slash commands, session persistence, setting sources and
/// loose MCP configs are all disabled: every invocation is an isolated,
/// text-only completion. The system prompt flag is always present (even
/// empty) so the CLI's own large default prompt never varies the cache key.
pub(crate) fn build_args(config: &ClientConfig, opts: &QueryOptions) -> Vec<String> {
    let mut args = vec![
        "--print".to_string(),
        "--output-format=stream-json".to_string(),
        "--verbose".to_string(),
        "--tools=".to_string(),
        "--disable-slash-commands".to_string(),
        "--no-session-persistence".to_string(),
        "--setting-sources=".to_string(),
        "--strict-mcp-config".to_string(),
    ];

    let model = if opts.model.is_empty() {
        &config.model
    } else {
        &opts.model
    };
    if !model.is_empty() {
        args.push(format!("--model={model}"));
    }

    args.push(format!("--system-prompt={}", opts.system_prompt));

    if opts.streaming {
        args.push("--include-partial-messages".to_string());
    }

    if let Some(effort) = opts.effort {
        args.push(format!("--effort={effort}"));
    }

    args
}
