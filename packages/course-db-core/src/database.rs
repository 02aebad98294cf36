//! Database container managing the course and student tables.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::DbConfig;
use crate::error::DbError;
use crate::query::ListQuery;
use crate::record::{Course, CoursePatch, NewCourse, NewStudent, Student, StudentPatch};
use crate::table::validation::{validate_enrollment, validate_name};
use crate::table::Table;

/// Database container holding both tables.
///
/// Locks are always taken students-first, then courses.
#[derive(Debug)]
pub struct Database {
    courses: RwLock<Table<Course>>,
    students: RwLock<Table<Student>>,
    /// Maximum name length in characters
    max_name_length: usize,
    /// Incremented on every successful mutation
    changes: AtomicU64,
}

impl Database {
    /// Creates a new empty database with default limits.
    pub fn new() -> Self {
        Self::with_config(&DbConfig::default())
    }

    /// Creates a new empty database using the limits in `config`.
    pub fn with_config(config: &DbConfig) -> Self {
        Self::from_tables(Table::new(), Table::new(), config)
    }

    /// Creates a database from existing tables.
    pub fn from_tables(
        courses: Table<Course>,
        students: Table<Student>,
        config: &DbConfig,
    ) -> Self {
        Self {
            courses: RwLock::new(courses),
            students: RwLock::new(students),
            max_name_length: config.max_name_length,
            changes: AtomicU64::new(0),
        }
    }

    /// Returns the number of mutations applied since the database was opened.
    pub fn change_count(&self) -> u64 {
        self.changes.load(Ordering::Acquire)
    }

    fn touch(&self) {
        self.changes.fetch_add(1, Ordering::AcqRel);
    }

    fn courses(&self) -> Result<RwLockReadGuard<'_, Table<Course>>, DbError> {
        self.courses.read().map_err(|_| DbError::LockPoisoned)
    }

    fn courses_mut(&self) -> Result<RwLockWriteGuard<'_, Table<Course>>, DbError> {
        self.courses.write().map_err(|_| DbError::LockPoisoned)
    }

    fn students(&self) -> Result<RwLockReadGuard<'_, Table<Student>>, DbError> {
        self.students.read().map_err(|_| DbError::LockPoisoned)
    }

    fn students_mut(&self) -> Result<RwLockWriteGuard<'_, Table<Student>>, DbError> {
        self.students.write().map_err(|_| DbError::LockPoisoned)
    }

    /// Creates a course.
    ///
    /// # Errors
    /// `Validation` for a blank or overlong name or an unknown student id.
    pub fn create_course(&self, new: NewCourse) -> Result<Course, DbError> {
        validate_name("name", &new.name, self.max_name_length)?;
        let students = self.students()?;
        let mut courses = self.courses_mut()?;

        let mut course = new.into_course();
        course.students = validate_enrollment(course.students, &students)?;
        let course = courses.create_record(course)?;
        self.touch();
        tracing::info!("Created course {} ({:?})", course.id, course.name);
        Ok(course)
    }

    /// Reads a course by id.
    pub fn get_course(&self, id: u64) -> Result<Course, DbError> {
        self.courses()?.read_record(id).cloned()
    }

    /// Lists courses matching `query`, in creation order.
    pub fn list_courses(&self, query: &ListQuery) -> Result<Vec<Course>, DbError> {
        Ok(self.courses()?.query_records(query))
    }

    /// Applies a partial update to a course.
    pub fn update_course(&self, id: u64, patch: CoursePatch) -> Result<Course, DbError> {
        if let Some(name) = &patch.name {
            validate_name("name", name, self.max_name_length)?;
        }
        let students = self.students()?;
        let mut courses = self.courses_mut()?;

        let course = courses.record_mut(id)?;
        let patch = CoursePatch {
            students: patch
                .students
                .map(|ids| validate_enrollment(ids, &students))
                .transpose()?,
            ..patch
        };
        patch.apply(course);
        let updated = course.clone();
        self.touch();
        Ok(updated)
    }

    /// Replaces every mutable field of a course.
    pub fn replace_course(&self, id: u64, new: NewCourse) -> Result<Course, DbError> {
        validate_name("name", &new.name, self.max_name_length)?;
        let students = self.students()?;
        let mut courses = self.courses_mut()?;

        let course = courses.record_mut(id)?;
        let enrolled = validate_enrollment(new.students, &students)?;
        course.name = new.name;
        course.students = enrolled;
        let replaced = course.clone();
        self.touch();
        Ok(replaced)
    }

    /// Deletes a course.
    pub fn delete_course(&self, id: u64) -> Result<Course, DbError> {
        let removed = self.courses_mut()?.delete_record(id)?;
        self.touch();
        tracing::info!("Deleted course {}", id);
        Ok(removed)
    }

    /// Creates a student.
    pub fn create_student(&self, new: NewStudent) -> Result<Student, DbError> {
        validate_name("name", &new.name, self.max_name_length)?;
        let student = self.students_mut()?.create_record(new.into_student())?;
        self.touch();
        tracing::info!("Created student {} ({:?})", student.id, student.name);
        Ok(student)
    }

    /// Reads a student by id.
    pub fn get_student(&self, id: u64) -> Result<Student, DbError> {
        self.students()?.read_record(id).cloned()
    }

    /// Lists students matching `query`, in creation order.
    pub fn list_students(&self, query: &ListQuery) -> Result<Vec<Student>, DbError> {
        Ok(self.students()?.query_records(query))
    }

    /// Applies a partial update to a student.
    pub fn update_student(&self, id: u64, patch: StudentPatch) -> Result<Student, DbError> {
        if let Some(name) = &patch.name {
            validate_name("name", name, self.max_name_length)?;
        }
        let mut students = self.students_mut()?;
        let student = students.record_mut(id)?;
        patch.apply(student);
        let updated = student.clone();
        self.touch();
        Ok(updated)
    }

    /// Replaces every mutable field of a student.
    pub fn replace_student(&self, id: u64, new: NewStudent) -> Result<Student, DbError> {
        validate_name("name", &new.name, self.max_name_length)?;
        let mut students = self.students_mut()?;
        let student = students.record_mut(id)?;
        student.name = new.name;
        student.birth_date = new.birth_date;
        let replaced = student.clone();
        self.touch();
        Ok(replaced)
    }

    /// Deletes a student and drops it from every course enrollment.
    pub fn delete_student(&self, id: u64) -> Result<Student, DbError> {
        let mut students = self.students_mut()?;
        let mut courses = self.courses_mut()?;

        let removed = students.delete_record(id)?;
        let mut unenrolled = 0usize;
        for course in courses.records_mut() {
            let before = course.students.len();
            course.students.retain(|&student_id| student_id != id);
            unenrolled += before - course.students.len();
        }
        self.touch();
        tracing::info!("Deleted student {} (removed from {} courses)", id, unenrolled);
        Ok(removed)
    }

    /// Returns the number of courses.
    pub fn course_count(&self) -> Result<usize, DbError> {
        Ok(self.courses()?.record_count())
    }

    /// Returns the number of students.
    pub fn student_count(&self) -> Result<usize, DbError> {
        Ok(self.students()?.record_count())
    }

    /// Executes a closure with read access to both tables.
    ///
    /// Both locks are held for the duration of the closure, so the
    /// closure sees a consistent view.
    pub fn with_tables<F, R>(&self, f: F) -> Result<R, DbError>
    where
        F: FnOnce(&Table<Course>, &Table<Student>) -> R,
    {
        let students = self.students()?;
        let courses = self.courses()?;
        Ok(f(&courses, &students))
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}
