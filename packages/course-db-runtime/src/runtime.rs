//! Runtime loop: request processing and periodic snapshot flushes.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use course_db_core::config::DbConfig;
use course_db_core::database::Database;
use course_db_core::error::DbError;
use course_db_core::persistence::PersistenceManager;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};

use crate::api_handlers::ApiHandlers;
use crate::api_request::ApiRequest;
use crate::Result;

/// Main runtime loop
pub struct Runtime {
    /// Configuration
    config: DbConfig,
    /// API request receiver
    api_rx: mpsc::Receiver<ApiRequest>,
    /// API handlers
    api_handlers: ApiHandlers,
    /// Snapshot writer, absent when persistence is disabled
    persistence: Option<Arc<PersistenceManager>>,
    /// Database instance
    database: Arc<Database>,
    /// Requests processed so far
    processed: u64,
    /// Of those, requests that could change the store
    writes: u64,
}

impl Runtime {
    /// Create a new runtime
    pub fn new(
        database: Arc<Database>,
        config: DbConfig,
        api_rx: mpsc::Receiver<ApiRequest>,
        persistence: Option<Arc<PersistenceManager>>,
    ) -> Self {
        Self {
            api_handlers: ApiHandlers::new(Arc::clone(&database)),
            config,
            api_rx,
            persistence,
            database,
            processed: 0,
            writes: 0,
        }
    }

    /// Runs until every sender has been dropped.
    pub async fn run(self) -> Result<()> {
        self.run_with_shutdown(std::future::pending()).await
    }

    /// Runs until `shutdown` resolves or every sender has been dropped,
    /// then writes a final snapshot.
    pub async fn run_with_shutdown<F>(mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let period = Duration::from_millis(self.config.persistence_interval_ms.max(1));
        let mut flush_interval = time::interval_at(time::Instant::now() + period, period);
        flush_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        tracing::info!(
            "Runtime started (persistence: {})",
            if self.persistence.is_some() { "on" } else { "off" }
        );

        loop {
            tokio::select! {
                request = self.api_rx.recv() => match request {
                    Some(request) => self.process(request).await,
                    None => {
                        tracing::debug!("API channel closed");
                        break;
                    }
                },
                _ = flush_interval.tick() => {
                    if let Err(e) = self.flush().await {
                        tracing::error!("Periodic snapshot flush failed: {}", e);
                    }
                }
                _ = &mut shutdown => {
                    tracing::debug!("Shutdown requested");
                    break;
                }
            }
        }

        // Answer whatever is already queued before the final flush
        self.api_rx.close();
        while let Some(request) = self.api_rx.recv().await {
            self.process(request).await;
        }

        self.flush().await?;
        tracing::info!(
            "Runtime stopped after {} requests ({} writes)",
            self.processed,
            self.writes
        );
        Ok(())
    }

    /// Processes a single request.
    pub async fn process(&mut self, request: ApiRequest) {
        self.processed += 1;
        if request.is_write() {
            self.writes += 1;
        }
        match request {
            ApiRequest::Course {
                operation,
                response,
            } => self.api_handlers.handle_course(operation, response),
            ApiRequest::Student {
                operation,
                response,
            } => self.api_handlers.handle_student(operation, response),
            ApiRequest::Flush { response } => {
                let result = self.flush().await.map(Value::Bool);
                let _ = response.send(result);
            }
        }
    }

    /// Writes a snapshot on the blocking pool if anything changed.
    ///
    /// # Returns
    /// Whether a snapshot was written. Always false without persistence.
    pub async fn flush(&self) -> Result<bool> {
        let Some(persistence) = &self.persistence else {
            return Ok(false);
        };
        let persistence = Arc::clone(persistence);
        let database = Arc::clone(&self.database);
        tokio::task::spawn_blocking(move || persistence.flush_if_dirty(&database))
            .await
            .map_err(|e| DbError::IoError(format!("Flush task failed: {}", e)))?
    }
}
