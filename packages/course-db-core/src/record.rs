//! Course and student records and their write payloads.

use chrono::NaiveDate;
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::DbError;

/// A record stored in an id-keyed [`Table`](crate::table::Table).
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Table name, also used for the snapshot file name.
    const TABLE: &'static str;

    /// Server-assigned identifier.
    fn id(&self) -> u64;

    /// Assigns the identifier. Only the owning table calls this.
    fn set_id(&mut self, id: u64);

    /// Display name, matched exactly by the `name` filter.
    fn name(&self) -> &str;

    /// Error reported when no record with `id` exists.
    fn not_found(id: u64) -> DbError;
}

/// A course with its enrolled students.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: u64,
    pub name: String,
    /// Ids of enrolled students, in enrollment order
    #[serde(default)]
    pub students: Vec<u64>,
}

impl Record for Course {
    const TABLE: &'static str = "courses";

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn not_found(id: u64) -> DbError {
        DbError::CourseNotFound { id }
    }
}

/// A student that can be enrolled in courses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
}

impl Record for Student {
    const TABLE: &'static str = "students";

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn not_found(id: u64) -> DbError {
        DbError::StudentNotFound { id }
    }
}

/// Payload for creating or fully replacing a course.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCourse {
    pub name: String,
    #[serde(default)]
    pub students: Vec<u64>,
}

impl NewCourse {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            students: Vec::new(),
        }
    }

    pub(crate) fn into_course(self) -> Course {
        Course {
            id: 0,
            name: self.name,
            students: self.students,
        }
    }
}

/// Rejects an explicit `null` for a patch field. An absent field still
/// deserializes to `None` through `#[serde(default)]`.
fn non_null<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    match Option::<T>::deserialize(deserializer)? {
        Some(value) => Ok(Some(value)),
        None => Err(de::Error::custom(
            "null is not allowed, omit the field to keep its value",
        )),
    }
}

/// Partial course update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoursePatch {
    #[serde(default, deserialize_with = "non_null")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "non_null")]
    pub students: Option<Vec<u64>>,
}

impl CoursePatch {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            students: None,
        }
    }

    pub(crate) fn apply(self, course: &mut Course) {
        if let Some(name) = self.name {
            course.name = name;
        }
        if let Some(students) = self.students {
            course.students = students;
        }
    }
}

/// Payload for creating or fully replacing a student.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStudent {
    pub name: String,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
}

impl NewStudent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            birth_date: None,
        }
    }

    pub(crate) fn into_student(self) -> Student {
        Student {
            id: 0,
            name: self.name,
            birth_date: self.birth_date,
        }
    }
}

/// Partial student update. A patch can set `birth_date` but not clear it;
/// clearing goes through a full replacement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentPatch {
    #[serde(default, deserialize_with = "non_null")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "non_null")]
    pub birth_date: Option<NaiveDate>,
}

impl StudentPatch {
    pub(crate) fn apply(self, student: &mut Student) {
        if let Some(name) = self.name {
            student.name = name;
        }
        if let Some(birth_date) = self.birth_date {
            student.birth_date = Some(birth_date);
        }
    }
}
