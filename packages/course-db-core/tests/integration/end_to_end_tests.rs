//! End-to-end workflow tests.
//!
//! Verify the tables, validation and factories working together.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use course_db_core::factory::{CourseFactory, StudentFactory};
use course_db_core::query::ListQuery;
use course_db_core::{CoursePatch, Database, DbError, NewCourse};

/// Full lifecycle: create courses, read, filter, update, delete.
#[test]
fn test_full_crud_lifecycle() -> anyhow::Result<()> {
    let db = Database::new();
    let created = CourseFactory::new(&db).make(10)?;

    let listed = db.list_courses(&ListQuery::all())?;
    assert_eq!(listed, created);

    let third = &created[2];
    assert_eq!(db.get_course(third.id)?.name, third.name);
    assert_eq!(
        db.list_courses(&ListQuery::by_id(third.id))?,
        vec![third.clone()]
    );
    assert_eq!(
        db.list_courses(&ListQuery::by_name(third.name.clone()))?,
        vec![third.clone()]
    );

    let renamed = db.update_course(third.id, CoursePatch::name("new_name"))?;
    assert_eq!(renamed.name, "new_name");
    assert_eq!(renamed.id, third.id);

    db.delete_course(third.id)?;
    assert_eq!(
        db.get_course(third.id),
        Err(DbError::CourseNotFound { id: third.id })
    );
    assert_eq!(db.course_count()?, 9);
    Ok(())
}

/// Names round-trip byte for byte, including whitespace and non-ASCII text.
#[test]
fn test_names_are_not_normalized() {
    let db = Database::new();
    for name in ["  Rust  ", "Курс программирования", "tab\tname", "MiXeD"] {
        let course = db.create_course(NewCourse::new(name)).unwrap();
        assert_eq!(db.get_course(course.id).unwrap().name, name);
        assert_eq!(db.list_courses(&ListQuery::by_name(name)).unwrap().len(), 1);
    }
}

/// Deleting a student unenrolls it everywhere.
#[test]
fn test_student_deletion_cascades_to_enrollments() -> anyhow::Result<()> {
    let db = Database::new();
    let students = StudentFactory::new(&db).make(3)?;
    let ids: Vec<u64> = students.iter().map(|s| s.id).collect();
    let courses = CourseFactory::new(&db).with_students(ids.clone()).make(4)?;

    db.delete_student(ids[1])?;

    for course in courses {
        assert_eq!(db.get_course(course.id)?.students, vec![ids[0], ids[2]]);
    }
    Ok(())
}

/// Concurrent writers never receive the same id.
#[test]
fn test_concurrent_creates_get_unique_ids() {
    let db = Arc::new(Database::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let db = Arc::clone(&db);
            thread::spawn(move || CourseFactory::new(&db).make(50).unwrap())
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        for course in handle.join().unwrap() {
            assert!(ids.insert(course.id), "duplicate id {}", course.id);
        }
    }
    assert_eq!(ids.len(), 400);
    assert_eq!(db.course_count().unwrap(), 400);
    assert_eq!(db.change_count(), 400);
}
