//! API request types

use course_db_core::query::ListQuery;
use course_db_core::{CoursePatch, NewCourse, NewStudent, StudentPatch};

use crate::ResponseSender;

/// API request from REST server
#[derive(Debug)]
pub enum ApiRequest {
    /// Course operation
    Course {
        operation: CourseOperation,
        response: ResponseSender,
    },
    /// Student operation
    Student {
        operation: StudentOperation,
        response: ResponseSender,
    },
    /// Write a snapshot now if anything changed
    Flush { response: ResponseSender },
}

impl ApiRequest {
    /// Returns true if this request can change the store.
    pub fn is_write(&self) -> bool {
        match self {
            ApiRequest::Course { operation, .. } => !matches!(
                operation,
                CourseOperation::Read { .. } | CourseOperation::Query { .. }
            ),
            ApiRequest::Student { operation, .. } => !matches!(
                operation,
                StudentOperation::Read { .. } | StudentOperation::Query { .. }
            ),
            ApiRequest::Flush { .. } => false,
        }
    }
}

/// Course operation types
#[derive(Debug)]
pub enum CourseOperation {
    Create { course: NewCourse },
    Read { id: u64 },
    Query { query: ListQuery },
    Update { id: u64, patch: CoursePatch },
    Replace { id: u64, course: NewCourse },
    Delete { id: u64 },
}

/// Student operation types
#[derive(Debug)]
pub enum StudentOperation {
    Create { student: NewStudent },
    Read { id: u64 },
    Query { query: ListQuery },
    Update { id: u64, patch: StudentPatch },
    Replace { id: u64, student: NewStudent },
    Delete { id: u64 },
}
