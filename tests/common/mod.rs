//! Test utilities: fake CLI scripts and a minimal HTTP client.
//!
//! Subprocess tests run against generated shell scripts that replay canned
//! NDJSON, so they pass on any machine without the real claude binary.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use cc_proxy::chat::Client;
use cc_proxy::server::{Server, ServerConfig};

/// Write an executable shell script that plays the part of the claude CLI.
///
/// The body runs under `/bin/sh` after a `cat >/dev/null` line that drains
/// the prompt from stdin. Returns the script path for `cli_path`.
pub fn write_fake_cli(name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let dir = std::env::temp_dir().join(format!("cc-proxy-tests-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("creating fake CLI dir");

    let path = dir.join(name);
    let script = format!("#!/bin/sh\ncat >/dev/null\n{body}\n");
    std::fs::write(&path, script).expect("writing fake CLI script");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("marking fake CLI executable");
    path
}

/// A fake CLI body for a successful text response.
pub fn text_response_body(text: &str) -> String {
    format!(
        concat!(
            "echo '{{\"type\":\"system\",\"subtype\":\"init\",\"session_id\":\"sess-1\",\"model\":\"sonnet\",\"tools\":[]}}'\n",
            "echo '{{\"type\":\"assistant\",\"message\":{{\"id\":\"m1\",\"role\":\"assistant\",\"model\":\"claude-sonnet-4-5\",\"content\":[{{\"type\":\"text\",\"text\":\"{text}\"}}],\"stop_reason\":\"end_turn\"}},\"session_id\":\"sess-1\"}}'\n",
            "echo '{{\"type\":\"result\",\"subtype\":\"success\",\"is_error\":false,\"result\":\"{text}\",\"session_id\":\"sess-1\",\"total_cost_usd\":0.001,\"usage\":{{\"input_tokens\":100,\"output_tokens\":5,\"cache_read_input_tokens\":10,\"cache_creation_input_tokens\":0}}}}'\n",
        ),
        text = text
    )
}

/// Start the proxy server on an ephemeral port, serving from `client`.
pub async fn start_server(client: Arc<Client>, api_key: &str) -> SocketAddr {
    let server = Server::new(
        ServerConfig {
            addr: String::new(),
            api_key: api_key.to_string(),
        },
        client,
    );
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("binding test listener");
    let addr = listener.local_addr().expect("test listener addr");
    let router = server.router();
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("test server");
    });
    addr
}

/// Issue one HTTP/1.0 request and return (status code, body).
///
/// HTTP/1.0 keeps the response un-chunked, so the body is everything after
/// the header block once the server closes the connection.
pub async fn http_request(addr: SocketAddr, raw: &str) -> (u16, String) {
    let mut stream = TcpStream::connect(addr).await.expect("connecting");
    stream
        .write_all(raw.as_bytes())
        .await
        .expect("writing request");

    let mut response = Vec::new();
    stream
        .read_to_end(&mut response)
        .await
        .expect("reading response");
    let response = String::from_utf8_lossy(&response).into_owned();

    let status = response
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .expect("status code");
    let body = response
        .split_once("\r\n\r\n")
        .map(|(_, body)| body.to_string())
        .unwrap_or_default();
    (status, body)
}

/// Build a POST /v1/chat/completions request with the given JSON body.
pub fn chat_request(body: &str, api_key: Option<&str>) -> String {
    let auth = match api_key {
        Some(key) => format!("Authorization: Bearer {key}\r\n"),
        None => String::new(),
    };
    format!(
        "POST /v1/chat/completions HTTP/1.0\r\nContent-Type: application/json\r\n{auth}Content-Length: {}\r\n\r\n{body}",
        body.len()
    )
}
