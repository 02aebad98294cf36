//! Query-related methods for table operations.

use super::Table;
use crate::query::ListQuery;
use crate::record::Record;

impl<R: Record> Table<R> {
    /// Queries records with equality filters and pagination.
    ///
    /// # Returns
    /// Matching records in ascending id order.
    ///
    /// # Performance
    /// - O(log n) when filtering by id
    /// - O(n) otherwise
    pub fn query_records(&self, query: &ListQuery) -> Vec<R> {
        let skip_count = query.offset.unwrap_or(0);
        let take_count = query.limit.unwrap_or(usize::MAX);

        if let Some(id) = query.id {
            return self
                .read_record(id)
                .ok()
                .filter(|record| query.matches(record.id(), record.name()))
                .into_iter()
                .skip(skip_count)
                .take(take_count)
                .cloned()
                .collect();
        }

        self.records()
            .filter(|record| query.matches(record.id(), record.name()))
            .skip(skip_count)
            .take(take_count)
            .cloned()
            .collect()
    }
}
