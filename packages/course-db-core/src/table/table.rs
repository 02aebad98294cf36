//! Record storage for a single table.
//!
//! Each table has:
//! - Records keyed by id, iterated in ascending id order
//! - A record id sequence that starts at 1 and never reuses ids

use std::collections::BTreeMap;

use crate::error::DbError;
use crate::record::Record;

/// Record storage for a single table.
#[derive(Debug, Clone)]
pub struct Table<R: Record> {
    /// Table name
    pub name: &'static str,
    /// Records keyed by id
    records: BTreeMap<u64, R>,
    /// Next record ID to assign
    next_id: u64,
}

impl<R: Record> Table<R> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            name: R::TABLE,
            records: BTreeMap::new(),
            next_id: 1, // Start IDs at 1
        }
    }

    /// Rebuilds a table from persisted records and its id counter.
    ///
    /// # Errors
    /// `DataCorruption` if ids repeat or are not below `next_id`.
    pub fn from_parts(records: Vec<R>, next_id: u64) -> Result<Self, DbError> {
        let mut table = Self {
            name: R::TABLE,
            records: BTreeMap::new(),
            next_id: next_id.max(1),
        };
        for record in records {
            let id = record.id();
            if id == 0 || id >= table.next_id {
                return Err(DbError::DataCorruption(format!(
                    "Record id {} out of range for table '{}' (next id {})",
                    id, table.name, table.next_id
                )));
            }
            if table.records.insert(id, record).is_some() {
                return Err(DbError::DataCorruption(format!(
                    "Duplicate record id {} in table '{}'",
                    id, table.name
                )));
            }
        }
        Ok(table)
    }

    /// Inserts a record under a freshly assigned id.
    ///
    /// # Returns
    /// The stored record, with its id set.
    pub fn create_record(&mut self, mut record: R) -> Result<R, DbError> {
        let id = self.next_id;
        self.next_id = id.checked_add(1).ok_or(DbError::CapacityOverflow {
            operation: "record id allocation",
        })?;
        record.set_id(id);
        self.records.insert(id, record.clone());
        Ok(record)
    }

    /// Reads a record by id.
    pub fn read_record(&self, id: u64) -> Result<&R, DbError> {
        self.records.get(&id).ok_or_else(|| R::not_found(id))
    }

    /// Mutable access to a record by id.
    pub fn record_mut(&mut self, id: u64) -> Result<&mut R, DbError> {
        self.records.get_mut(&id).ok_or_else(|| R::not_found(id))
    }

    /// Removes a record. Its id is not reused.
    pub fn delete_record(&mut self, id: u64) -> Result<R, DbError> {
        self.records.remove(&id).ok_or_else(|| R::not_found(id))
    }

    pub fn contains(&self, id: u64) -> bool {
        self.records.contains_key(&id)
    }

    /// Returns the number of live records.
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Returns the id the next created record will get.
    pub fn current_next_id(&self) -> u64 {
        self.next_id
    }

    /// Iterates records in ascending id order.
    pub fn records(&self) -> impl Iterator<Item = &R> {
        self.records.values()
    }

    pub(crate) fn records_mut(&mut self) -> impl Iterator<Item = &mut R> {
        self.records.values_mut()
    }
}

impl<R: Record> Default for Table<R> {
    fn default() -> Self {
        Self::new()
    }
}
