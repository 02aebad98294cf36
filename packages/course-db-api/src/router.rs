//! Matchit routing configuration.

use std::sync::Arc;

use hyper::{body::Bytes, Method, Request, Response};
use matchit::{InsertError, Router as MatchitRouter};
use tokio::sync::mpsc;

use crate::handlers;
use course_db_core::config::DbConfig;
use course_db_runtime::ApiRequest;

/// Prefix shared by every API route.
pub const API_PREFIX: &str = "/api/v1";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database configuration
    pub config: Arc<DbConfig>,
    /// API request sender to runtime
    pub api_tx: mpsc::Sender<ApiRequest>,
}

/// HTTP request router.
pub struct Router {
    inner: MatchitRouter<RouteHandler>,
    state: AppState,
}

impl Router {
    /// Creates a router with the course and student routes.
    ///
    /// Every route answers with and without a trailing slash.
    pub fn new(
        config: Arc<DbConfig>,
        api_tx: mpsc::Sender<ApiRequest>,
    ) -> Result<Self, InsertError> {
        let mut router = MatchitRouter::new();

        insert_route(&mut router, "", RouteHandler::Root)?;
        insert_route(&mut router, "/courses", RouteHandler::Courses)?;
        insert_route(&mut router, "/courses/{id}", RouteHandler::Courses)?;
        insert_route(&mut router, "/students", RouteHandler::Students)?;
        insert_route(&mut router, "/students/{id}", RouteHandler::Students)?;

        Ok(Self {
            inner: router,
            state: AppState { config, api_tx },
        })
    }

    /// Routes an incoming request to the appropriate handler.
    ///
    /// # Arguments
    /// * `req` - HTTP request
    ///
    /// # Returns
    /// `Result<Response<Bytes>, RouterError>` containing the response or an error.
    pub async fn route(
        &self,
        req: Request<hyper::body::Incoming>,
    ) -> Result<Response<Bytes>, RouterError> {
        let path = req.uri().path().to_string();

        match self.inner.at(&path) {
            Ok(matched) => {
                matched
                    .value
                    .handle(req, matched.params, self.state.clone())
                    .await
            }
            Err(_) => {
                let error_response = handlers::error_response(
                    404,
                    "Not Found".to_string(),
                    Some(format!("No route found for {}", path)),
                );
                handlers::request_utils::json_response(404, &error_response)
            }
        }
    }
}

fn insert_route(
    router: &mut MatchitRouter<RouteHandler>,
    path: &str,
    handler: RouteHandler,
) -> Result<(), InsertError> {
    router.insert(format!("{}{}", API_PREFIX, path), handler)?;
    router.insert(format!("{}{}/", API_PREFIX, path), handler)
}

/// Route handler function.
#[derive(Clone, Copy)]
enum RouteHandler {
    Root,
    Courses,
    Students,
}

impl RouteHandler {
    /// Handles a request with the given route parameters.
    async fn handle(
        &self,
        req: Request<hyper::body::Incoming>,
        params: matchit::Params<'_, '_>,
        state: AppState,
    ) -> Result<Response<Bytes>, RouterError> {
        let has_id_param = params.get("id").is_some();
        let method = req.method().clone();

        match self {
            RouteHandler::Root => {
                if method == Method::GET {
                    handlers::api_root(req, params, state).await
                } else {
                    Err(RouterError::MethodNotAllowed)
                }
            }
            RouteHandler::Courses => {
                if method == Method::GET && !has_id_param {
                    handlers::list_courses(req, params, state).await
                } else if method == Method::POST && !has_id_param {
                    handlers::create_course(req, params, state).await
                } else if method == Method::GET && has_id_param {
                    handlers::read_course(req, params, state).await
                } else if method == Method::PUT && has_id_param {
                    handlers::update_course(req, params, state).await
                } else if method == Method::PATCH && has_id_param {
                    handlers::partial_update_course(req, params, state).await
                } else if method == Method::DELETE && has_id_param {
                    handlers::delete_course(req, params, state).await
                } else {
                    Err(RouterError::MethodNotAllowed)
                }
            }
            RouteHandler::Students => {
                if method == Method::GET && !has_id_param {
                    handlers::list_students(req, params, state).await
                } else if method == Method::POST && !has_id_param {
                    handlers::create_student(req, params, state).await
                } else if method == Method::GET && has_id_param {
                    handlers::read_student(req, params, state).await
                } else if method == Method::PUT && has_id_param {
                    handlers::update_student(req, params, state).await
                } else if method == Method::PATCH && has_id_param {
                    handlers::partial_update_student(req, params, state).await
                } else if method == Method::DELETE && has_id_param {
                    handlers::delete_student(req, params, state).await
                } else {
                    Err(RouterError::MethodNotAllowed)
                }
            }
        }
    }
}

/// Router error type.
#[derive(Debug)]
pub enum RouterError {
    MethodNotAllowed,
    InternalError(String),
    Timeout,
    BadRequest(String),
    NotFound(String),
    PayloadTooLarge(usize),
}

impl RouterError {
    /// HTTP status code for this error.
    pub fn status(&self) -> u16 {
        match self {
            RouterError::MethodNotAllowed => 405,
            RouterError::InternalError(_) => 500,
            RouterError::Timeout => 408,
            RouterError::BadRequest(_) => 400,
            RouterError::NotFound(_) => 404,
            RouterError::PayloadTooLarge(_) => 413,
        }
    }
}

impl std::fmt::Display for RouterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouterError::MethodNotAllowed => write!(f, "Method Not Allowed"),
            RouterError::InternalError(msg) => write!(f, "Internal Error: {}", msg),
            RouterError::Timeout => write!(f, "Request Timeout"),
            RouterError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            RouterError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            RouterError::PayloadTooLarge(limit) => {
                write!(f, "Request body exceeds {} bytes", limit)
            }
        }
    }
}

impl std::error::Error for RouterError {}

impl From<RouterError> for Response<Bytes> {
    fn from(err: RouterError) -> Self {
        let status = err.status();
        let message = match err {
            RouterError::InternalError(msg)
            | RouterError::BadRequest(msg)
            | RouterError::NotFound(msg) => msg,
            other => other.to_string(),
        };

        let error_response = handlers::error_response(status, message, None);
        let body = serde_json::to_vec(&error_response).unwrap_or_else(|_| {
            br#"{"success":false,"error":{"code":"500","message":"Failed to serialize error"}}"#
                .to_vec()
        });

        let mut response = Response::new(Bytes::from(body));
        *response.status_mut() =
            hyper::StatusCode::from_u16(status).unwrap_or(hyper::StatusCode::INTERNAL_SERVER_ERROR);
        response.headers_mut().insert(
            hyper::header::CONTENT_TYPE,
            hyper::header::HeaderValue::from_static("application/json"),
        );
        response
    }
}
