//! Student endpoint handlers.
//!
//! Same shape as the course endpoints under `/api/v1/students/`.

use hyper::{body::Bytes, Request, Response};

use crate::router::{AppState, RouterError};
use course_db_core::{NewStudent, StudentPatch};
use course_db_runtime::{ApiRequest, StudentOperation};

use super::request_utils::{
    build_empty_response, call_runtime, json_response, parse_id_param, parse_query_params,
    read_json_body, MatchitParams,
};

async fn run_student_operation(
    state: &AppState,
    operation: StudentOperation,
) -> Result<serde_json::Value, RouterError> {
    call_runtime(state, |response| ApiRequest::Student {
        operation,
        response,
    })
    .await
}

/// `GET /api/v1/students/`
pub async fn list_students(
    req: Request<hyper::body::Incoming>,
    _params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let query = parse_query_params(req.uri().query())?;
    let students = run_student_operation(&state, StudentOperation::Query { query }).await?;
    json_response(200, &students)
}

/// `POST /api/v1/students/`
///
/// Body: `{"name": "ann", "birth_date": "2001-04-30"}`, `birth_date` optional.
pub async fn create_student(
    req: Request<hyper::body::Incoming>,
    _params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let student: NewStudent = read_json_body(req, &state.config).await?;
    let created = run_student_operation(&state, StudentOperation::Create { student }).await?;
    json_response(201, &created)
}

/// `GET /api/v1/students/{id}/`
pub async fn read_student(
    _req: Request<hyper::body::Incoming>,
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let id = parse_id_param(&params)?;
    let student = run_student_operation(&state, StudentOperation::Read { id }).await?;
    json_response(200, &student)
}

/// `PUT /api/v1/students/{id}/`
pub async fn update_student(
    req: Request<hyper::body::Incoming>,
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let id = parse_id_param(&params)?;
    let student: NewStudent = read_json_body(req, &state.config).await?;
    let replaced =
        run_student_operation(&state, StudentOperation::Replace { id, student }).await?;
    json_response(200, &replaced)
}

/// `PATCH /api/v1/students/{id}/`
pub async fn partial_update_student(
    req: Request<hyper::body::Incoming>,
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let id = parse_id_param(&params)?;
    let patch: StudentPatch = read_json_body(req, &state.config).await?;
    let updated = run_student_operation(&state, StudentOperation::Update { id, patch }).await?;
    json_response(200, &updated)
}

/// `DELETE /api/v1/students/{id}/`
///
/// The student is also removed from every course it was enrolled in.
pub async fn delete_student(
    _req: Request<hyper::body::Incoming>,
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let id = parse_id_param(&params)?;
    run_student_operation(&state, StudentOperation::Delete { id }).await?;
    build_empty_response(204)
}
