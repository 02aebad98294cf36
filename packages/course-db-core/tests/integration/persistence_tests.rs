//! Persistence integration tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use ntest::timeout;
use tempfile::tempdir;

use course_db_core::config::DbConfig;
use course_db_core::factory::{CourseFactory, StudentFactory};
use course_db_core::persistence::PersistenceManager;
use course_db_core::query::ListQuery;
use course_db_core::Database;

/// Flushing while writers are active always leaves a loadable snapshot.
#[timeout(10000)]
#[test]
fn test_flush_with_active_writes() {
    let temp_dir = tempdir().unwrap();
    let config = DbConfig {
        data_dir: temp_dir.path().to_path_buf(),
        ..Default::default()
    };
    let persistence = PersistenceManager::new(&config);
    let db = Arc::new(Database::with_config(&config));
    let done = Arc::new(AtomicBool::new(false));

    let writer = {
        let db = Arc::clone(&db);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let students = StudentFactory::new(&db).make(5).unwrap();
            let ids: Vec<u64> = students.iter().map(|s| s.id).collect();
            for _ in 0..200 {
                CourseFactory::new(&db)
                    .with_students(ids.clone())
                    .make_one()
                    .unwrap();
            }
            done.store(true, Ordering::Release);
        })
    };

    while !done.load(Ordering::Acquire) {
        persistence.flush_if_dirty(&db).unwrap();
        // Every intermediate snapshot must load cleanly
        let loaded = PersistenceManager::new(&config).load(&config).unwrap();
        assert!(loaded.course_count().unwrap() <= 200);
    }
    writer.join().unwrap();

    persistence.flush_if_dirty(&db).unwrap();
    let loaded = PersistenceManager::new(&config).load(&config).unwrap();
    assert_eq!(
        loaded.list_courses(&ListQuery::all()).unwrap(),
        db.list_courses(&ListQuery::all()).unwrap()
    );
    assert_eq!(loaded.student_count().unwrap(), 5);
}
