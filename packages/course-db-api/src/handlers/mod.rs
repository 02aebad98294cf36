//! HTTP endpoint implementations for the course and student resources.

mod course_handlers;
pub mod request_utils;
pub mod response;
mod student_handlers;

pub use course_handlers::{
    create_course, delete_course, list_courses, partial_update_course, read_course,
    update_course,
};
pub use response::{error_response, ApiError, ErrorResponse};
pub use student_handlers::{
    create_student, delete_student, list_students, partial_update_student, read_student,
    update_student,
};

use hyper::{body::Bytes, Request, Response};

use crate::router::{AppState, RouterError};
use request_utils::{json_response, MatchitParams};
use response::ApiRoot;

/// Lists the resource collections.
///
/// # Endpoint
/// `GET /api/v1/`
pub async fn api_root(
    _req: Request<hyper::body::Incoming>,
    _params: MatchitParams<'_, '_>,
    _state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    json_response(
        200,
        &ApiRoot {
            courses: "/api/v1/courses/",
            students: "/api/v1/students/",
        },
    )
}
