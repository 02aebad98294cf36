//! Test-data factories.
//!
//! A factory writes records straight into a [`Database`], the way an
//! ORM fixture would, so HTTP tests can assert against known data.
//! Unset fields get random values.
//!
//! ```
//! use course_db_core::{factory::CourseFactory, Database};
//!
//! let db = Database::new();
//! let courses = CourseFactory::new(&db).make(3).unwrap();
//! assert_eq!(courses.len(), 3);
//! ```

use chrono::NaiveDate;
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::database::Database;
use crate::error::DbError;
use crate::record::{Course, NewCourse, NewStudent, Student};

/// Length of generated names.
pub const GENERATED_NAME_LENGTH: usize = 32;

/// Returns a random alphanumeric name.
pub fn random_name() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_NAME_LENGTH)
        .map(char::from)
        .collect()
}

/// Generates persisted courses.
#[derive(Debug, Clone)]
pub struct CourseFactory<'a> {
    db: &'a Database,
    name: Option<String>,
    students: Vec<u64>,
}

impl<'a> CourseFactory<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            name: None,
            students: Vec::new(),
        }
    }

    /// Uses `name` for every generated course instead of a random one.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Enrolls `students` in every generated course.
    pub fn with_students(mut self, students: Vec<u64>) -> Self {
        self.students = students;
        self
    }

    pub fn make_one(&self) -> Result<Course, DbError> {
        self.db.create_course(NewCourse {
            name: self.name.clone().unwrap_or_else(random_name),
            students: self.students.clone(),
        })
    }

    /// Creates `quantity` courses, returned in creation order.
    pub fn make(&self, quantity: usize) -> Result<Vec<Course>, DbError> {
        (0..quantity).map(|_| self.make_one()).collect()
    }
}

/// Generates persisted students.
#[derive(Debug, Clone)]
pub struct StudentFactory<'a> {
    db: &'a Database,
    name: Option<String>,
    birth_date: Option<NaiveDate>,
}

impl<'a> StudentFactory<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            name: None,
            birth_date: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_birth_date(mut self, birth_date: NaiveDate) -> Self {
        self.birth_date = Some(birth_date);
        self
    }

    pub fn make_one(&self) -> Result<Student, DbError> {
        self.db.create_student(NewStudent {
            name: self.name.clone().unwrap_or_else(random_name),
            birth_date: self.birth_date,
        })
    }

    /// Creates `quantity` students, returned in creation order.
    pub fn make(&self, quantity: usize) -> Result<Vec<Student>, DbError> {
        (0..quantity).map(|_| self.make_one()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_quantity_in_order() {
        let db = Database::new();
        let courses = CourseFactory::new(&db).make(10).unwrap();

        assert_eq!(courses.len(), 10);
        let ids: Vec<u64> = courses.iter().map(|c| c.id).collect();
        assert_eq!(ids, (1..=10).collect::<Vec<_>>());
        for course in &courses {
            assert_eq!(course.name.len(), GENERATED_NAME_LENGTH);
            assert_eq!(db.get_course(course.id).unwrap(), *course);
        }
    }

    #[test]
    fn test_overrides() {
        let db = Database::new();
        let students = StudentFactory::new(&db).with_name("ann").make(2).unwrap();
        let ids: Vec<u64> = students.iter().map(|s| s.id).collect();

        let course = CourseFactory::new(&db)
            .with_name("math")
            .with_students(ids.clone())
            .make_one()
            .unwrap();
        assert_eq!(course.name, "math");
        assert_eq!(course.students, ids);
        assert!(students.iter().all(|s| s.name == "ann"));
    }
}
