//! Runtime integration tests.
//!
//! Drive the runtime over its channels: request ordering, error
//! propagation, snapshot flushing and shutdown.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tempfile::tempdir;
use tokio::sync::{mpsc, oneshot};

use course_db_core::config::DbConfig;
use course_db_core::database::Database;
use course_db_core::error::DbError;
use course_db_core::factory::CourseFactory;
use course_db_core::persistence::PersistenceManager;
use course_db_core::query::ListQuery;
use course_db_core::{CoursePatch, NewCourse, NewStudent};
use course_db_runtime::{api_channel, ApiRequest, CourseOperation, Runtime, StudentOperation};

async fn send_course(
    api_tx: &mpsc::Sender<ApiRequest>,
    operation: CourseOperation,
) -> Result<Value, DbError> {
    let (response, rx) = oneshot::channel();
    api_tx
        .send(ApiRequest::Course {
            operation,
            response,
        })
        .await
        .unwrap();
    rx.await.unwrap()
}

fn spawn_runtime(
    db: Arc<Database>,
    config: DbConfig,
    persistence: Option<Arc<PersistenceManager>>,
) -> (
    mpsc::Sender<ApiRequest>,
    tokio::task::JoinHandle<Result<(), DbError>>,
) {
    let (api_tx, api_rx) = api_channel(config.api_channel_capacity);
    let runtime = Runtime::new(db, config, api_rx, persistence);
    (api_tx, tokio::spawn(runtime.run()))
}

/// Requests are applied in arrival order.
#[tokio::test]
async fn test_requests_processed_in_order() {
    let db = Arc::new(Database::new());
    let (api_tx, handle) = spawn_runtime(db.clone(), DbConfig::in_memory(), None);

    let mut receivers = Vec::new();
    for i in 0..20 {
        let (response, rx) = oneshot::channel();
        api_tx
            .send(ApiRequest::Course {
                operation: CourseOperation::Create {
                    course: NewCourse::new(format!("course {}", i)),
                },
                response,
            })
            .await
            .unwrap();
        receivers.push(rx);
    }

    for (i, rx) in receivers.into_iter().enumerate() {
        let created = rx.await.unwrap().unwrap();
        assert_eq!(created["id"], json!(i as u64 + 1));
        assert_eq!(created["name"], json!(format!("course {}", i)));
    }

    drop(api_tx);
    handle.await.unwrap().unwrap();
    assert_eq!(db.course_count().unwrap(), 20);
}

/// Store errors reach the caller unchanged.
#[tokio::test]
async fn test_errors_are_returned_to_caller() {
    let db = Arc::new(Database::new());
    let (api_tx, handle) = spawn_runtime(db, DbConfig::in_memory(), None);

    let missing = send_course(
        &api_tx,
        CourseOperation::Update {
            id: 5,
            patch: CoursePatch::name("x"),
        },
    )
    .await;
    assert_eq!(missing, Err(DbError::CourseNotFound { id: 5 }));

    let invalid = send_course(
        &api_tx,
        CourseOperation::Create {
            course: NewCourse {
                name: "math".to_string(),
                students: vec![1],
            },
        },
    )
    .await;
    assert!(matches!(invalid, Err(DbError::Validation { .. })));

    drop(api_tx);
    handle.await.unwrap().unwrap();
}

/// Factory-created records are visible through the runtime.
#[tokio::test]
async fn test_query_sees_factory_records() {
    let db = Arc::new(Database::new());
    let created = CourseFactory::new(&db).make(3).unwrap();
    let (api_tx, handle) = spawn_runtime(db, DbConfig::in_memory(), None);

    let listed = send_course(
        &api_tx,
        CourseOperation::Query {
            query: ListQuery::by_name(created[1].name.clone()),
        },
    )
    .await
    .unwrap();
    assert_eq!(listed, json!([created[1]]));

    drop(api_tx);
    handle.await.unwrap().unwrap();
}

/// Student deletion through the runtime unenrolls the student.
#[tokio::test]
async fn test_student_operations() {
    let db = Arc::new(Database::new());
    let (api_tx, handle) = spawn_runtime(db.clone(), DbConfig::in_memory(), None);

    let (response, rx) = oneshot::channel();
    api_tx
        .send(ApiRequest::Student {
            operation: StudentOperation::Create {
                student: NewStudent::new("ann"),
            },
            response,
        })
        .await
        .unwrap();
    let ann = rx.await.unwrap().unwrap();
    let ann_id = ann["id"].as_u64().unwrap();

    let course = send_course(
        &api_tx,
        CourseOperation::Create {
            course: NewCourse {
                name: "math".to_string(),
                students: vec![ann_id],
            },
        },
    )
    .await
    .unwrap();
    assert_eq!(course["students"], json!([ann_id]));

    let (response, rx) = oneshot::channel();
    api_tx
        .send(ApiRequest::Student {
            operation: StudentOperation::Delete { id: ann_id },
            response,
        })
        .await
        .unwrap();
    assert_eq!(rx.await.unwrap(), Ok(Value::Null));
    assert!(db.get_course(1).unwrap().students.is_empty());

    drop(api_tx);
    handle.await.unwrap().unwrap();
}

/// An explicit flush writes a snapshot only when something changed.
#[tokio::test]
async fn test_flush_request() {
    let temp_dir = tempdir().unwrap();
    let config = DbConfig {
        data_dir: temp_dir.path().to_path_buf(),
        persistence_interval_ms: 60_000,
        ..Default::default()
    };
    let persistence = Arc::new(PersistenceManager::new(&config));
    let db = Arc::new(Database::with_config(&config));
    let (api_tx, handle) = spawn_runtime(db, config.clone(), Some(persistence));

    let flush = |api_tx: mpsc::Sender<ApiRequest>| async move {
        let (response, rx) = oneshot::channel();
        api_tx.send(ApiRequest::Flush { response }).await.unwrap();
        rx.await.unwrap()
    };

    assert_eq!(flush(api_tx.clone()).await, Ok(Value::Bool(false)));
    send_course(
        &api_tx,
        CourseOperation::Create {
            course: NewCourse::new("math"),
        },
    )
    .await
    .unwrap();
    assert_eq!(flush(api_tx.clone()).await, Ok(Value::Bool(true)));
    assert!(temp_dir.path().join("manifest.json").exists());

    drop(api_tx);
    handle.await.unwrap().unwrap();
}

/// The interval flush and the final flush both persist changes.
#[tokio::test]
async fn test_periodic_and_shutdown_flush() {
    let temp_dir = tempdir().unwrap();
    let config = DbConfig {
        data_dir: temp_dir.path().to_path_buf(),
        persistence_interval_ms: 20,
        ..Default::default()
    };
    let persistence = Arc::new(PersistenceManager::new(&config));
    let db = Arc::new(Database::with_config(&config));
    let (api_tx, api_rx) = api_channel(16);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let runtime = Runtime::new(db.clone(), config.clone(), api_rx, Some(persistence));
    let handle = tokio::spawn(runtime.run_with_shutdown(async move {
        let _ = shutdown_rx.await;
    }));

    send_course(
        &api_tx,
        CourseOperation::Create {
            course: NewCourse::new("first"),
        },
    )
    .await
    .unwrap();

    // Wait for the interval flush to pick it up
    let manifest = temp_dir.path().join("manifest.json");
    while !manifest.exists() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    db.create_course(NewCourse::new("second")).unwrap();
    shutdown_tx.send(()).unwrap();
    handle.await.unwrap().unwrap();

    let loaded = PersistenceManager::new(&config).load(&config).unwrap();
    let names: Vec<String> = loaded
        .list_courses(&ListQuery::all())
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["first", "second"]);
}
