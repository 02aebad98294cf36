//! Request utilities for HTTP endpoints.

use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::{body::Bytes, Request, Response};
use percent_encoding::percent_decode_str;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::time;

use crate::router::{AppState, RouterError};
use course_db_core::config::DbConfig;
use course_db_core::error::DbError;
use course_db_core::query::ListQuery;
use course_db_runtime::{ApiRequest, ResponseSender};

/// Type alias for matchit parameters with explicit lifetimes
pub type MatchitParams<'a, 'b> = matchit::Params<'a, 'b>;

/// Reads at most `max_bytes` of the request body within `timeout_ms`.
///
/// The read stops as soon as the limit is crossed, whether or not the
/// client sent a Content-Length.
pub async fn read_request_body_with_timeout<B>(
    req: Request<B>,
    timeout_ms: u64,
    max_bytes: usize,
) -> Result<Bytes, RouterError>
where
    B: hyper::body::Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let timeout_duration = time::Duration::from_millis(timeout_ms);
    let body = Limited::new(req.into_body(), max_bytes);
    let collected = time::timeout(timeout_duration, body.collect())
        .await
        .map_err(|_| RouterError::Timeout)?
        .map_err(|e| {
            if e.downcast_ref::<LengthLimitError>().is_some() {
                RouterError::PayloadTooLarge(max_bytes)
            } else {
                RouterError::BadRequest(format!("Failed to read request body: {}", e))
            }
        })?;
    Ok(collected.to_bytes())
}

/// Reads the request body and decodes it as JSON.
pub async fn read_json_body<T: DeserializeOwned>(
    req: Request<hyper::body::Incoming>,
    config: &DbConfig,
) -> Result<T, RouterError> {
    let body_bytes =
        read_request_body_with_timeout(req, config.request_timeout_ms, config.max_body_bytes)
            .await?;
    parse_json_body(&body_bytes)
}

/// Decodes a JSON request body.
pub fn parse_json_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, RouterError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(RouterError::BadRequest("Request body is empty".to_string()));
    }
    serde_json::from_slice(body)
        .map_err(|e| RouterError::BadRequest(format!("Failed to parse request: {}", e)))
}

/// Helper function to wait for response with timeout
pub async fn wait_for_response_with_timeout<T>(
    rx: oneshot::Receiver<T>,
    timeout_ms: u64,
) -> Result<T, RouterError> {
    let timeout_duration = time::Duration::from_millis(timeout_ms);
    time::timeout(timeout_duration, rx)
        .await
        .map_err(|_| RouterError::Timeout)?
        .map_err(|e| RouterError::InternalError(format!("Response channel closed: {}", e)))
}

/// Sends a request to the runtime and waits for its answer.
///
/// # Arguments
/// * `state` - Shared application state
/// * `build` - Wraps the response sender into the request to send
pub async fn call_runtime<F>(state: &AppState, build: F) -> Result<Value, RouterError>
where
    F: FnOnce(ResponseSender) -> ApiRequest,
{
    let (tx, rx) = oneshot::channel();
    state
        .api_tx
        .send(build(tx))
        .await
        .map_err(|e| RouterError::InternalError(format!("Channel closed: {}", e)))?;

    let result = wait_for_response_with_timeout(rx, state.config.response_timeout_ms).await?;
    result.map_err(map_db_error_to_router_error)
}

/// Map DbError to appropriate RouterError
pub fn map_db_error_to_router_error(e: DbError) -> RouterError {
    match e {
        e if e.is_not_found() => RouterError::NotFound(e.to_string()),
        DbError::Validation { .. } => RouterError::BadRequest(e.to_string()),
        _ => RouterError::InternalError(format!("Runtime error: {}", e)),
    }
}

/// Parses the `{id}` route parameter.
pub fn parse_id_param(params: &MatchitParams<'_, '_>) -> Result<u64, RouterError> {
    let id_str = params
        .get("id")
        .ok_or_else(|| RouterError::BadRequest("Missing record ID".to_string()))?;
    id_str
        .parse()
        .map_err(|e| RouterError::BadRequest(format!("Invalid record ID '{}': {}", id_str, e)))
}

/// Helper to build HTTP response with proper error handling
pub fn build_response(status: u16, json: Vec<u8>) -> Result<Response<Bytes>, RouterError> {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Bytes::from(json))
        .map_err(|e| RouterError::InternalError(format!("Failed to build response: {}", e)))
}

/// Serializes `data` and builds a JSON response.
pub fn json_response<T: Serialize>(status: u16, data: &T) -> Result<Response<Bytes>, RouterError> {
    let json = serde_json::to_vec(data)
        .map_err(|e| RouterError::InternalError(format!("Failed to serialize response: {}", e)))?;
    build_response(status, json)
}

/// Helper to build empty HTTP response (for 204 No Content)
pub fn build_empty_response(status: u16) -> Result<Response<Bytes>, RouterError> {
    Response::builder()
        .status(status)
        .body(Bytes::new())
        .map_err(|e| RouterError::InternalError(format!("Failed to build response: {}", e)))
}

/// Decodes one form-encoded query component.
fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, RouterError>
where
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e| {
        RouterError::BadRequest(format!("Invalid {} value '{}': {}", key, value, e))
    })
}

/// Parse list filters and pagination from the URL query string.
///
/// Empty values and unknown keys are ignored.
pub fn parse_query_params(query_str: Option<&str>) -> Result<ListQuery, RouterError> {
    let mut query = ListQuery::default();

    let Some(query_str) = query_str else {
        return Ok(query);
    };

    for pair in query_str.split('&').filter(|pair| !pair.is_empty()) {
        let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = decode_component(raw_key);
        let value = decode_component(raw_value);
        if value.is_empty() {
            continue;
        }

        match key.as_str() {
            "id" => query.id = Some(parse_number(&key, &value)?),
            "name" => query.name = Some(value),
            "limit" => query.limit = Some(parse_number(&key, &value)?),
            "offset" => query.offset = Some(parse_number(&key, &value)?),
            _ => {}
        }
    }

    Ok(query)
}
