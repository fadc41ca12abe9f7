//! Route handlers for chat completions and the model list.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use super::{error_response, AppState};
use crate::bridge::{request_to_query, result_to_response, StreamState};
use crate::chat;
use crate::oai::{ChatCompletionRequest, ModelList, OaiClient};
use crate::wire::{AssistantMessage, ResultMessage, WireMessage};
use crate::Error;

/// Maximum accepted request body size.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

pub(crate) async fn chat_completions(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Response {
    let body = match axum::body::to_bytes(request.into_body(), MAX_BODY_BYTES).await {
        Ok(body) => body,
        Err(_) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "invalid_request",
                "Request body too large or unreadable",
            )
        }
    };

    let req: ChatCompletionRequest = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "invalid_request",
                &format!("Invalid JSON: {e}"),
            )
        }
    };

    if req.messages.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "invalid_request",
            "Messages array is required",
        );
    }

    let has_tools = !req.tools.is_empty();
    let streaming = req.stream;
    let (prompt, opts) = request_to_query(&req);

    let stream = match state.client.query(&prompt, opts).await {
        Ok(stream) => stream,
        Err(e) => {
            return error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                &format!("Failed to start claude process: {e}"),
            )
        }
    };

    if streaming {
        streaming_response(stream, has_tools)
    } else {
        non_streaming_response(stream, has_tools).await
    }
}

pub(crate) async fn models() -> Json<ModelList> {
    Json(ModelList {
        object: "list".to_string(),
        data: OaiClient::list_models(),
    })
}

pub(crate) async fn post_only() -> Response {
    error_response(
        StatusCode::METHOD_NOT_ALLOWED,
        "method_not_allowed",
        "Only POST is accepted",
    )
}

pub(crate) async fn get_only() -> Response {
    error_response(
        StatusCode::METHOD_NOT_ALLOWED,
        "method_not_allowed",
        "Only GET is accepted",
    )
}

async fn non_streaming_response(mut stream: chat::Stream, has_tools: bool) -> Response {
    let outcome = drain(&mut stream).await;
    stream.close().await;

    let (last_assistant, result) = match outcome {
        Ok(messages) => messages,
        Err(e) => return stream_error_response(&e),
    };

    let Some(result) = result else {
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "No result received from claude",
        );
    };

    if result.is_error {
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "claude_error",
            &result.result,
        );
    }

    Json(result_to_response(&result, last_assistant.as_ref(), has_tools)).into_response()
}

async fn drain(
    stream: &mut chat::Stream,
) -> crate::Result<(Option<AssistantMessage>, Option<ResultMessage>)> {
    let mut last_assistant = None;
    let mut result = None;
    loop {
        match stream.next().await? {
            Some(WireMessage::Assistant(assistant)) => last_assistant = Some(assistant),
            Some(WireMessage::Result(res)) => result = Some(res),
            Some(_) => {}
            None => return Ok((last_assistant, result)),
        }
    }
}

fn stream_error_response(err: &Error) -> Response {
    if err.is_rate_limited() {
        return error_response(
            StatusCode::TOO_MANY_REQUESTS,
            "rate_limit_exceeded",
            &err.to_string(),
        );
    }
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        &format!("Stream error: {err}"),
    )
}

/// Drive the subprocess stream from a background task and forward chunks as
/// SSE events. Mid-stream errors are logged, not surfaced: whatever content
/// already went out stays valid and the stream ends with `[DONE]`.
fn streaming_response(mut stream: chat::Stream, has_tools: bool) -> Response {
    let (tx, rx) = mpsc::channel::<std::result::Result<Event, Infallible>>(64);

    tokio::spawn(async move {
        let mut state = StreamState::new(has_tools);

        'read: loop {
            match stream.next().await {
                Ok(Some(WireMessage::StreamEvent(ev))) => {
                    for chunk in state.handle_event(&ev) {
                        if send_chunk(&tx, &chunk).await.is_err() {
                            break 'read;
                        }
                    }
                }
                Ok(Some(WireMessage::Result(result))) => {
                    for chunk in state.finish() {
                        if send_chunk(&tx, &chunk).await.is_err() {
                            break 'read;
                        }
                    }
                    if result.is_error {
                        tracing::error!("claude error: {}", result.result);
                    }
                }
                Ok(Some(_)) => {}
                Ok(None) => break,
                Err(e) => {
                    tracing::error!("stream error: {e}");
                    break;
                }
            }
        }

        let _ = tx.send(Ok(Event::default().data("[DONE]"))).await;
        stream.close().await;
    });

    let mut response = Sse::new(ReceiverStream::new(rx)).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    response
}

async fn send_chunk(
    tx: &mpsc::Sender<std::result::Result<Event, Infallible>>,
    chunk: &crate::oai::ChatCompletionChunk,
) -> std::result::Result<(), ()> {
    let event = Event::default().json_data(chunk).map_err(|_| ())?;
    tx.send(Ok(event)).await.map_err(|_| ())
}
