//! HTTP contract tests for `/api/v1/students/`.

mod common;

use chrono::NaiveDate;
use common::TestServer;
use course_db_core::factory::{CourseFactory, StudentFactory};
use course_db_core::Student;
use serde_json::{json, Value};

#[tokio::test]
async fn test_create_and_retrieve_student() {
    let server = TestServer::start().await;

    let response = server
        .client
        .post(server.url("/students/"))
        .json(&json!({"name": "ann", "birth_date": "2001-04-30"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let created: Value = response.json().await.unwrap();
    assert_eq!(created["birth_date"], "2001-04-30");

    let id = created["id"].as_u64().unwrap();
    let fetched: Value = server
        .client
        .get(server.url(&format!("/students/{}", id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_list_and_filter_students() {
    let server = TestServer::start().await;
    let students = StudentFactory::new(&server.db).make(4).unwrap();

    let listed: Vec<Student> = server
        .client
        .get(server.url("/students/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed, students);

    let filtered: Vec<Student> = server
        .client
        .get(server.url("/students/"))
        .query(&[("name", students[2].name.as_str())])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(filtered, vec![students[2].clone()]);
}

#[tokio::test]
async fn test_patch_and_replace_student() {
    let server = TestServer::start().await;
    let student = StudentFactory::new(&server.db)
        .with_birth_date(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap())
        .make_one()
        .unwrap();
    let url = server.url(&format!("/students/{}/", student.id));

    let patched: Student = server
        .client
        .patch(&url)
        .json(&json!({"name": "renamed"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(patched.name, "renamed");
    assert_eq!(patched.birth_date, student.birth_date);

    let response = server
        .client
        .patch(&url)
        .json(&json!({"birth_date": null}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    assert_eq!(
        server.db.get_student(student.id).unwrap().birth_date,
        student.birth_date
    );

    let replaced: Student = server
        .client
        .put(&url)
        .json(&json!({"name": "replaced"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(replaced.name, "replaced");
    assert_eq!(replaced.birth_date, None);
}

#[tokio::test]
async fn test_invalid_birth_date_is_rejected() {
    let server = TestServer::start().await;

    let response = server
        .client
        .post(server.url("/students/"))
        .json(&json!({"name": "ann", "birth_date": "not a date"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    assert_eq!(server.db.student_count().unwrap(), 0);
}

#[tokio::test]
async fn test_delete_student_unenrolls() {
    let server = TestServer::start().await;
    let students = StudentFactory::new(&server.db).make(2).unwrap();
    let course = CourseFactory::new(&server.db)
        .with_students(students.iter().map(|s| s.id).collect())
        .make_one()
        .unwrap();

    let response = server
        .client
        .delete(server.url(&format!("/students/{}/", students[0].id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    let course: Value = server
        .client
        .get(server.url(&format!("/courses/{}/", course.id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(course["students"], json!([students[1].id]));

    let response = server
        .client
        .get(server.url(&format!("/students/{}/", students[0].id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}
