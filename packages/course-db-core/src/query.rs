//! List query parameters.

/// Equality filters and pagination for list endpoints.
///
/// Filters combine with AND. `offset` is applied before `limit`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Only the record with this id
    pub id: Option<u64>,
    /// Only records whose name equals this exactly
    pub name: Option<String>,
    /// Maximum number of records to return
    pub limit: Option<usize>,
    /// Number of matching records to skip
    pub offset: Option<usize>,
}

impl ListQuery {
    /// Query that matches every record.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(id: u64) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Returns true if `id` and `name` pass every filter.
    pub fn matches(&self, id: u64, name: &str) -> bool {
        if self.id.is_some_and(|wanted| wanted != id) {
            return false;
        }
        if let Some(wanted) = &self.name {
            if wanted != name {
                return false;
            }
        }
        true
    }
}
