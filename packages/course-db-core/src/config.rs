//! Service configuration.

use std::path::PathBuf;

/// Service configuration shared by the store, runtime and API layers.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Data directory for snapshot files
    pub data_dir: PathBuf,
    /// Whether snapshots are written and loaded at all
    pub persist: bool,
    /// Interval between snapshot flushes in milliseconds
    pub persistence_interval_ms: u64,
    /// Maximum retry attempts for transient I/O errors
    pub persistence_max_retries: u32,
    /// Delay between retry attempts in milliseconds
    pub persistence_retry_delay_ms: u64,
    /// Request body read timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Largest accepted request body in bytes
    pub max_body_bytes: usize,
    /// Runtime response timeout in milliseconds
    pub response_timeout_ms: u64,
    /// Capacity of the API request channel
    pub api_channel_capacity: usize,
    /// Maximum length of a course or student name, in characters
    pub max_name_length: usize,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            persist: true,
            persistence_interval_ms: 1000,
            persistence_max_retries: 3,
            persistence_retry_delay_ms: 100,
            request_timeout_ms: 5000,
            max_body_bytes: 1024 * 1024,
            response_timeout_ms: 10000,
            api_channel_capacity: 1000,
            max_name_length: 256,
        }
    }
}

impl DbConfig {
    /// Memory-only configuration, used by tests and `--no-persist`.
    pub fn in_memory() -> Self {
        Self {
            persist: false,
            ..Default::default()
        }
    }
}
