//! Field validation for incoming record payloads.

use super::Table;
use crate::error::DbError;
use crate::record::Student;

/// Validates a required name field.
///
/// # Arguments
/// * `field` - Field name used in the error
/// * `value` - Submitted value, stored as-is when valid
/// * `max_length` - Maximum length in characters
pub(crate) fn validate_name(field: &str, value: &str, max_length: usize) -> Result<(), DbError> {
    if value.trim().is_empty() {
        return Err(DbError::validation(field, "This field may not be blank."));
    }
    if value.chars().count() > max_length {
        return Err(DbError::validation(
            field,
            format!("Ensure this field has no more than {} characters.", max_length),
        ));
    }
    Ok(())
}

/// Checks that every enrolled id names an existing student and drops repeats.
///
/// # Returns
/// The ids in first-seen order.
pub(crate) fn validate_enrollment(
    ids: Vec<u64>,
    students: &Table<Student>,
) -> Result<Vec<u64>, DbError> {
    let mut seen = std::collections::HashSet::with_capacity(ids.len());
    let mut enrolled = Vec::with_capacity(ids.len());
    for id in ids {
        if !students.contains(id) {
            return Err(DbError::validation(
                "students",
                format!("Invalid pk \"{}\" - object does not exist.", id),
            ));
        }
        if seen.insert(id) {
            enrolled.push(id);
        }
    }
    Ok(enrolled)
}
