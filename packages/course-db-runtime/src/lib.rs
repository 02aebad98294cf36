//! Request runtime for the course service.
//!
//! HTTP handlers never touch the tables directly. They send an
//! [`ApiRequest`] to the [`Runtime`], which applies operations one at a
//! time in arrival order, answers each on its oneshot channel, and
//! periodically flushes a snapshot.

mod api_handlers;
mod api_request;
mod runtime;

use course_db_core::error::DbError;
use tokio::sync::{mpsc, oneshot};

pub use api_handlers::ApiHandlers;
pub use api_request::{ApiRequest, CourseOperation, StudentOperation};
pub use runtime::Runtime;

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, DbError>;

/// Response sender for API requests
pub type ResponseSender = oneshot::Sender<Result<serde_json::Value>>;

/// Creates the bounded channel connecting the API layer to the runtime.
pub fn api_channel(capacity: usize) -> (mpsc::Sender<ApiRequest>, mpsc::Receiver<ApiRequest>) {
    mpsc::channel(capacity.max(1))
}
