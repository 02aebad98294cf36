//! API request handlers

use std::sync::Arc;

use course_db_core::database::Database;
use course_db_core::error::DbError;
use serde::Serialize;
use serde_json::Value;

use crate::api_request::{CourseOperation, StudentOperation};
use crate::{ResponseSender, Result};

/// Applies course and student operations to the database.
pub struct ApiHandlers {
    /// Database instance
    database: Arc<Database>,
}

impl ApiHandlers {
    /// Create new API handlers
    pub fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    /// Runs a course operation and sends the result to the caller.
    pub fn handle_course(&self, operation: CourseOperation, response: ResponseSender) {
        let result = self.apply_course(operation);
        if response.send(result).is_err() {
            tracing::debug!("Caller dropped before course response was sent");
        }
    }

    /// Runs a student operation and sends the result to the caller.
    pub fn handle_student(&self, operation: StudentOperation, response: ResponseSender) {
        let result = self.apply_student(operation);
        if response.send(result).is_err() {
            tracing::debug!("Caller dropped before student response was sent");
        }
    }

    /// Applies a course operation.
    ///
    /// # Returns
    /// The affected course as JSON, an array for queries, or null for deletes.
    pub fn apply_course(&self, operation: CourseOperation) -> Result<Value> {
        let db = &self.database;
        match operation {
            CourseOperation::Create { course } => {
                tracing::debug!("Creating course {:?}", course.name);
                to_json(&db.create_course(course)?)
            }
            CourseOperation::Read { id } => to_json(&db.get_course(id)?),
            CourseOperation::Query { query } => {
                tracing::debug!("Querying courses with {:?}", query);
                to_json(&db.list_courses(&query)?)
            }
            CourseOperation::Update { id, patch } => {
                tracing::debug!("Updating course {}", id);
                to_json(&db.update_course(id, patch)?)
            }
            CourseOperation::Replace { id, course } => {
                tracing::debug!("Replacing course {}", id);
                to_json(&db.replace_course(id, course)?)
            }
            CourseOperation::Delete { id } => {
                db.delete_course(id)?;
                Ok(Value::Null)
            }
        }
    }

    /// Applies a student operation.
    pub fn apply_student(&self, operation: StudentOperation) -> Result<Value> {
        let db = &self.database;
        match operation {
            StudentOperation::Create { student } => {
                tracing::debug!("Creating student {:?}", student.name);
                to_json(&db.create_student(student)?)
            }
            StudentOperation::Read { id } => to_json(&db.get_student(id)?),
            StudentOperation::Query { query } => {
                tracing::debug!("Querying students with {:?}", query);
                to_json(&db.list_students(&query)?)
            }
            StudentOperation::Update { id, patch } => {
                tracing::debug!("Updating student {}", id);
                to_json(&db.update_student(id, patch)?)
            }
            StudentOperation::Replace { id, student } => {
                tracing::debug!("Replacing student {}", id);
                to_json(&db.replace_student(id, student)?)
            }
            StudentOperation::Delete { id } => {
                db.delete_student(id)?;
                Ok(Value::Null)
            }
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| DbError::SerializationError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use course_db_core::query::ListQuery;
    use course_db_core::{CoursePatch, NewCourse};

    #[test]
    fn test_course_operations_return_json() {
        let handlers = ApiHandlers::new(Arc::new(Database::new()));

        let created = handlers
            .apply_course(CourseOperation::Create {
                course: NewCourse::new("math"),
            })
            .unwrap();
        assert_eq!(
            created,
            serde_json::json!({"id": 1, "name": "math", "students": []})
        );

        let listed = handlers
            .apply_course(CourseOperation::Query {
                query: ListQuery::all(),
            })
            .unwrap();
        assert_eq!(listed, serde_json::json!([created]));

        let updated = handlers
            .apply_course(CourseOperation::Update {
                id: 1,
                patch: CoursePatch::name("new_name"),
            })
            .unwrap();
        assert_eq!(updated["name"], "new_name");

        assert_eq!(
            handlers
                .apply_course(CourseOperation::Delete { id: 1 })
                .unwrap(),
            Value::Null
        );
        assert_eq!(
            handlers.apply_course(CourseOperation::Read { id: 1 }),
            Err(DbError::CourseNotFound { id: 1 })
        );
    }
}
