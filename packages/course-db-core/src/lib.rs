//! Core storage for the course service.
//!
//! Provides the course and student records, id-keyed tables with
//! list queries, the shared database container, and checksummed
//! snapshot persistence.

pub mod config;
pub mod database;
pub mod error;
#[cfg(feature = "factory")]
pub mod factory;
pub mod persistence;
pub mod query;
pub mod record;
pub mod table;

pub use database::Database;
pub use error::DbError;
pub use record::{Course, CoursePatch, NewCourse, NewStudent, Student, StudentPatch};
