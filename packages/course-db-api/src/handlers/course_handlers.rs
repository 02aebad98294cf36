//! Course endpoint handlers.

use hyper::{body::Bytes, Request, Response};

use crate::router::{AppState, RouterError};
use course_db_core::{CoursePatch, NewCourse};
use course_db_runtime::{ApiRequest, CourseOperation};

use super::request_utils::{
    build_empty_response, call_runtime, json_response, parse_id_param, parse_query_params,
    read_json_body, MatchitParams,
};

async fn run_course_operation(
    state: &AppState,
    operation: CourseOperation,
) -> Result<serde_json::Value, RouterError> {
    call_runtime(state, |response| ApiRequest::Course {
        operation,
        response,
    })
    .await
}

/// Lists courses, optionally filtered.
///
/// # Endpoint
/// `GET /api/v1/courses/`
///
/// # Query Parameters
/// - `id`: only the course with this id
/// - `name`: only courses whose name matches exactly
/// - `limit`, `offset`: pagination over the filtered result
///
/// Filters combine with AND. Results are ordered by ascending id.
///
/// # Response
/// - **200 OK**: JSON array of courses, possibly empty
/// ```json
/// [
///   {"id": 1, "name": "math", "students": [3, 4]}
/// ]
/// ```
///
/// # Errors
/// - **400 Bad Request**: Non-numeric `id`, `limit` or `offset`
///
/// # Example
/// ```bash
/// curl 'http://localhost:8000/api/v1/courses/?name=math'
/// ```
pub async fn list_courses(
    req: Request<hyper::body::Incoming>,
    _params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let query = parse_query_params(req.uri().query())?;
    let courses = run_course_operation(&state, CourseOperation::Query { query }).await?;
    json_response(200, &courses)
}

/// Creates a course.
///
/// # Endpoint
/// `POST /api/v1/courses/`
///
/// # Request Body
/// ```json
/// {"name": "math", "students": [3, 4]}
/// ```
/// `students` may be omitted.
///
/// # Response
/// - **201 Created**: The stored course with its assigned id
///
/// # Errors
/// - **400 Bad Request**: Malformed JSON, blank or over-long name, unknown student id
///
/// # Example
/// ```bash
/// curl -X POST http://localhost:8000/api/v1/courses/ \
///   -H "Content-Type: application/json" \
///   -d '{"name": "math"}'
/// ```
pub async fn create_course(
    req: Request<hyper::body::Incoming>,
    _params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let course: NewCourse = read_json_body(req, &state.config).await?;
    let created = run_course_operation(&state, CourseOperation::Create { course }).await?;
    json_response(201, &created)
}

/// Reads one course.
///
/// # Endpoint
/// `GET /api/v1/courses/{id}/`
///
/// # Errors
/// - **400 Bad Request**: Non-numeric id
/// - **404 Not Found**: No course with this id
pub async fn read_course(
    _req: Request<hyper::body::Incoming>,
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let id = parse_id_param(&params)?;
    let course = run_course_operation(&state, CourseOperation::Read { id }).await?;
    json_response(200, &course)
}

/// Replaces every mutable field of a course.
///
/// # Endpoint
/// `PUT /api/v1/courses/{id}/`
///
/// Same body as create. An omitted `students` list clears the enrollment.
pub async fn update_course(
    req: Request<hyper::body::Incoming>,
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let id = parse_id_param(&params)?;
    let course: NewCourse = read_json_body(req, &state.config).await?;
    let replaced = run_course_operation(&state, CourseOperation::Replace { id, course }).await?;
    json_response(200, &replaced)
}

/// Updates only the fields present in the body.
///
/// # Endpoint
/// `PATCH /api/v1/courses/{id}/`
///
/// # Request Body
/// ```json
/// {"name": "new_name"}
/// ```
///
/// # Response
/// - **200 OK**: The full course after the update
///
/// # Errors
/// - **400 Bad Request**: Malformed JSON or invalid field value
/// - **404 Not Found**: No course with this id
pub async fn partial_update_course(
    req: Request<hyper::body::Incoming>,
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let id = parse_id_param(&params)?;
    let patch: CoursePatch = read_json_body(req, &state.config).await?;
    let updated = run_course_operation(&state, CourseOperation::Update { id, patch }).await?;
    json_response(200, &updated)
}

/// Deletes a course.
///
/// # Endpoint
/// `DELETE /api/v1/courses/{id}/`
///
/// # Response
/// - **204 No Content**: Empty body
///
/// # Errors
/// - **404 Not Found**: No course with this id
pub async fn delete_course(
    _req: Request<hyper::body::Incoming>,
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let id = parse_id_param(&params)?;
    run_course_operation(&state, CourseOperation::Delete { id }).await?;
    build_empty_response(204)
}
