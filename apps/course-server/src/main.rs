//! REST API server for courses and students.
//!
//! Loads the last snapshot, starts the runtime loop and serves the API
//! until Ctrl+C, then writes a final snapshot.

use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::Parser;
use course_db_api::{router::Router, server::Server};
use course_db_core::config::DbConfig;
use course_db_core::database::Database;
use course_db_core::error::DbError;
use course_db_core::persistence::PersistenceManager;
use course_db_runtime::{api_channel, Runtime};
use tokio::net::lookup_host;
use tokio::signal;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Command-line arguments for the course server.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = 8000)]
    port: u16,

    /// Host name or address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Data directory for snapshots
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,

    /// Keep everything in memory, no snapshots are read or written
    #[arg(long)]
    no_persist: bool,

    /// Interval between snapshot flushes in milliseconds
    #[arg(long, default_value_t = 1000)]
    persistence_interval_ms: u64,

    /// Request timeout in milliseconds
    #[arg(long, default_value_t = 5000)]
    request_timeout_ms: u64,

    /// Response timeout in milliseconds
    #[arg(long, default_value_t = 10000)]
    response_timeout_ms: u64,

    /// Maximum length of a name in characters
    #[arg(long, default_value_t = 256)]
    max_name_length: usize,
}

impl Args {
    fn to_config(&self) -> DbConfig {
        DbConfig {
            data_dir: self.data_dir.clone(),
            persist: !self.no_persist,
            persistence_interval_ms: self.persistence_interval_ms,
            request_timeout_ms: self.request_timeout_ms,
            response_timeout_ms: self.response_timeout_ms,
            max_name_length: self.max_name_length,
            ..DbConfig::default()
        }
    }
}

/// Resolves `host` to the first address it names.
async fn resolve_listen_addr(host: &str, port: u16) -> anyhow::Result<SocketAddr> {
    lookup_host((host, port))
        .await
        .with_context(|| format!("Failed to resolve {}", host))?
        .next()
        .ok_or_else(|| anyhow!("{} resolved to no addresses", host))
}

/// Waits for `stop_signal` or for the server task to end on its own,
/// then tells the server and the runtime to shut down.
///
/// # Errors
/// Returns an error if the server stopped without being asked to.
async fn supervise<S>(
    stop_signal: S,
    mut server_handle: JoinHandle<std::io::Result<()>>,
    shutdown_tx: &watch::Sender<bool>,
) -> anyhow::Result<()>
where
    S: Future<Output = std::io::Result<()>>,
{
    let early_exit = tokio::select! {
        result = stop_signal => {
            if let Err(e) = result {
                tracing::error!("Failed to listen for ctrl_c: {}", e);
            }
            tracing::info!("Shutting down");
            None
        }
        result = &mut server_handle => Some(result),
    };
    let _ = shutdown_tx.send(true);

    match early_exit {
        None => {
            if let Err(e) = server_handle.await? {
                tracing::error!("Server error: {}", e);
            }
            Ok(())
        }
        Some(result) => {
            let reason = match result {
                Ok(Ok(())) => "serve loop returned".to_string(),
                Ok(Err(e)) => e.to_string(),
                Err(e) => e.to_string(),
            };
            tracing::error!("Server stopped unexpectedly: {}", reason);
            Err(anyhow!("Server stopped unexpectedly: {}", reason))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt::init();

    let config = args.to_config();

    let persistence = config
        .persist
        .then(|| Arc::new(PersistenceManager::new(&config)));

    let db = match &persistence {
        Some(persistence) => match persistence.load(&config) {
            Ok(db) => db,
            Err(DbError::DataCorruption(msg)) => {
                tracing::error!("Snapshot corruption detected: {}", msg);
                tracing::error!("Server cannot start. Restore the data directory from backup.");
                std::process::exit(1);
            }
            Err(e) => return Err(e).context("Failed to load snapshot"),
        },
        None => Database::with_config(&config),
    };
    let db = Arc::new(db);
    tracing::info!(
        "Loaded {} courses and {} students",
        db.course_count()?,
        db.student_count()?
    );

    let (api_tx, api_rx) = api_channel(config.api_channel_capacity);
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let runtime = Runtime::new(Arc::clone(&db), config.clone(), api_rx, persistence);
    let mut runtime_shutdown = shutdown_rx.clone();
    let runtime_handle = tokio::spawn(runtime.run_with_shutdown(async move {
        let _ = runtime_shutdown.changed().await;
    }));

    let router = Router::new(Arc::new(config.clone()), api_tx).context("Failed to build routes")?;
    let addr = resolve_listen_addr(&args.host, args.port).await?;
    let server = Server::bind(addr, router)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!(
        "Starting course server (data directory: {}, persistence: {})",
        config.data_dir.display(),
        if config.persist { "on" } else { "off" }
    );

    let server_handle = tokio::spawn(server.serve_with_shutdown(async move {
        let _ = shutdown_rx.changed().await;
    }));

    // The final flush runs whichever way the server stopped
    let outcome = supervise(signal::ctrl_c(), server_handle, &shutdown_tx).await;
    runtime_handle
        .await?
        .context("Final snapshot flush failed")?;

    outcome
}
