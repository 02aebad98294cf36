//! Snapshot persistence and recovery.
//!
//! A snapshot is one JSON data file per table plus `manifest.json`.
//! Each flush writes a new generation of data files named
//! `<table>.<generation>.json`, then renames a manifest naming them into
//! place. The manifest rename is the commit point: a crash before it
//! leaves the previous manifest and its data files untouched. The old
//! generation is removed only after the new manifest is durable.

pub mod io_utils;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::config::DbConfig;
use crate::database::Database;
use crate::error::DbError;
use crate::record::{Course, Record, Student};
use crate::table::Table;

use io_utils::{checksum, classify_io_error, retry_io_operation, sync_dir, write_atomic};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

const MANIFEST_FILE: &str = "manifest.json";

/// Snapshot manifest.
#[derive(Debug, Serialize, Deserialize)]
pub struct Manifest {
    /// Snapshot format version
    pub version: u32,
    /// Flush generation, incremented by every committed snapshot
    pub generation: u64,
    /// Data file name per table
    pub files: BTreeMap<String, String>,
    /// Next record id per table
    pub next_ids: BTreeMap<String, u64>,
    /// Data file checksums for corruption detection
    pub checksums: BTreeMap<String, u32>,
}

/// Persistence manager for snapshot files.
#[derive(Debug)]
pub struct PersistenceManager {
    /// Data directory path
    data_dir: PathBuf,
    max_retries: u32,
    retry_delay_ms: u64,
    /// Database change count covered by the last successful flush
    flushed_changes: AtomicU64,
    /// Serializes flushes so generations are committed one at a time
    flush_lock: Mutex<()>,
}

impl PersistenceManager {
    /// Creates a new persistence manager with the given configuration.
    pub fn new(config: &DbConfig) -> Self {
        Self {
            data_dir: config.data_dir.clone(),
            max_retries: config.persistence_max_retries,
            retry_delay_ms: config.persistence_retry_delay_ms,
            flushed_changes: AtomicU64::new(0),
            flush_lock: Mutex::new(()),
        }
    }

    fn manifest_path(&self) -> PathBuf {
        self.data_dir.join(MANIFEST_FILE)
    }

    /// Loads the database from the snapshot in the data directory.
    ///
    /// A missing manifest yields an empty database.
    ///
    /// # Errors
    /// `DataCorruption` on a version, checksum or consistency failure.
    pub fn load(&self, config: &DbConfig) -> Result<Database, DbError> {
        let manifest_path = self.manifest_path();
        if !manifest_path.exists() {
            tracing::info!(
                "No snapshot in {}, starting empty",
                self.data_dir.display()
            );
            return Ok(Database::with_config(config));
        }

        let manifest_bytes = self.read_file(&manifest_path)?;
        let manifest: Manifest = serde_json::from_slice(&manifest_bytes)
            .map_err(|e| DbError::DataCorruption(format!("Failed to parse manifest: {}", e)))?;
        if manifest.version != SNAPSHOT_VERSION {
            return Err(DbError::DataCorruption(format!(
                "Unsupported snapshot version {} (expected {})",
                manifest.version, SNAPSHOT_VERSION
            )));
        }

        let courses: Table<Course> = self.load_table(&manifest)?;
        let students: Table<Student> = self.load_table(&manifest)?;

        for course in courses.records() {
            if let Some(missing) = course.students.iter().find(|&&id| !students.contains(id)) {
                return Err(DbError::DataCorruption(format!(
                    "Course {} enrolls unknown student {}",
                    course.id, missing
                )));
            }
        }

        tracing::info!(
            "Loaded snapshot generation {}: {} courses, {} students",
            manifest.generation,
            courses.record_count(),
            students.record_count()
        );
        Ok(Database::from_tables(courses, students, config))
    }

    fn load_table<R: Record>(&self, manifest: &Manifest) -> Result<Table<R>, DbError> {
        let expected = manifest.checksums.get(R::TABLE).ok_or_else(|| {
            DbError::DataCorruption(format!("Manifest has no checksum for '{}'", R::TABLE))
        })?;
        let next_id = manifest.next_ids.get(R::TABLE).copied().ok_or_else(|| {
            DbError::DataCorruption(format!("Manifest has no id counter for '{}'", R::TABLE))
        })?;

        let file_name = manifest.files.get(R::TABLE).ok_or_else(|| {
            DbError::DataCorruption(format!("Manifest has no data file for '{}'", R::TABLE))
        })?;
        let data = self.read_file(&self.data_dir.join(file_name))?;
        let actual = checksum(&data);
        if actual != *expected {
            return Err(DbError::DataCorruption(format!(
                "Checksum mismatch for table '{}': expected {:08x}, got {:08x}",
                R::TABLE,
                expected,
                actual
            )));
        }

        let records: Vec<R> = serde_json::from_slice(&data).map_err(|e| {
            DbError::DataCorruption(format!("Failed to parse table '{}': {}", R::TABLE, e))
        })?;
        Table::from_parts(records, next_id)
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>, DbError> {
        retry_io_operation(
            || {
                fs::read(path).map_err(|e| {
                    classify_io_error(e, &format!("Failed to read {}", path.display()))
                })
            },
            self.max_retries,
            self.retry_delay_ms,
            "snapshot read",
        )
    }

    /// Writes a snapshot if the database changed since the last flush.
    ///
    /// # Returns
    /// Whether a snapshot was written.
    pub fn flush_if_dirty(&self, db: &Database) -> Result<bool, DbError> {
        if db.change_count() == self.flushed_changes.load(Ordering::Acquire) {
            return Ok(false);
        }
        self.flush(db)?;
        Ok(true)
    }

    /// Writes a full snapshot of the database.
    ///
    /// Data files of the new generation are written first, the manifest
    /// rename commits them, and only then is the previous generation
    /// removed.
    pub fn flush(&self, db: &Database) -> Result<(), DbError> {
        let _guard = self.flush_lock.lock().map_err(|_| DbError::LockPoisoned)?;

        // Read before taking the table locks: a mutation racing with the
        // flush is then flushed again on the next call.
        let changes = db.change_count();

        fs::create_dir_all(&self.data_dir)
            .map_err(|e| classify_io_error(e, "Failed to create data directory"))?;
        let previous = self.committed_manifest();
        let generation = previous.as_ref().map_or(0, |m| m.generation) + 1;

        let (courses, students, manifest) = db.with_tables(|courses, students| {
            let course_bytes = encode_table(courses)?;
            let student_bytes = encode_table(students)?;
            let manifest = Manifest {
                version: SNAPSHOT_VERSION,
                generation,
                files: BTreeMap::from([
                    (Course::TABLE.to_string(), data_file_name(Course::TABLE, generation)),
                    (Student::TABLE.to_string(), data_file_name(Student::TABLE, generation)),
                ]),
                next_ids: BTreeMap::from([
                    (Course::TABLE.to_string(), courses.current_next_id()),
                    (Student::TABLE.to_string(), students.current_next_id()),
                ]),
                checksums: BTreeMap::from([
                    (Course::TABLE.to_string(), checksum(&course_bytes)),
                    (Student::TABLE.to_string(), checksum(&student_bytes)),
                ]),
            };
            Ok::<_, DbError>((course_bytes, student_bytes, manifest))
        })??;

        for (table, bytes) in [(Course::TABLE, &courses), (Student::TABLE, &students)] {
            self.write_file(&self.data_dir.join(&manifest.files[table]), bytes)?;
        }
        sync_dir(&self.data_dir)?;

        let manifest_bytes = serde_json::to_vec_pretty(&manifest)
            .map_err(|e| DbError::SerializationError(e.to_string()))?;
        self.write_file(&self.manifest_path(), &manifest_bytes)?;
        sync_dir(&self.data_dir)?;

        if let Some(previous) = previous {
            self.remove_generation(&previous, &manifest);
        }

        self.flushed_changes.fetch_max(changes, Ordering::AcqRel);
        tracing::debug!(
            "Flushed snapshot generation {} to {} (change {})",
            generation,
            self.data_dir.display(),
            changes
        );
        Ok(())
    }

    /// Reads the manifest currently on disk, if it is usable.
    fn committed_manifest(&self) -> Option<Manifest> {
        let bytes = fs::read(self.manifest_path()).ok()?;
        match serde_json::from_slice::<Manifest>(&bytes) {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                tracing::warn!("Ignoring unreadable manifest during flush: {}", e);
                None
            }
        }
    }

    /// Deletes data files of `previous` that `current` no longer names.
    fn remove_generation(&self, previous: &Manifest, current: &Manifest) {
        let live: Vec<&String> = current.files.values().collect();
        for file_name in previous.files.values().filter(|name| !live.contains(name)) {
            let path = self.data_dir.join(file_name);
            if let Err(e) = fs::remove_file(&path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!("Failed to remove old snapshot file {}: {}", path.display(), e);
                }
            }
        }
    }

    fn write_file(&self, path: &Path, bytes: &[u8]) -> Result<(), DbError> {
        retry_io_operation(
            || write_atomic(path, bytes),
            self.max_retries,
            self.retry_delay_ms,
            "snapshot write",
        )
    }
}

fn data_file_name(table: &str, generation: u64) -> String {
    format!("{}.{}.json", table, generation)
}

fn encode_table<R: Record>(table: &Table<R>) -> Result<Vec<u8>, DbError> {
    let records: Vec<&R> = table.records().collect();
    serde_json::to_vec_pretty(&records).map_err(|e| DbError::SerializationError(e.to_string()))
}
