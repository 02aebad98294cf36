//! Test server harness shared by the HTTP contract tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use course_db_api::router::Router;
use course_db_api::server::Server;
use course_db_core::config::DbConfig;
use course_db_core::database::Database;
use course_db_runtime::{api_channel, ApiRequest, Runtime};
use tokio::sync::mpsc;

/// A server on an ephemeral port with its own in-memory database.
pub struct TestServer {
    pub db: Arc<Database>,
    pub client: reqwest::Client,
    addr: SocketAddr,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with_config(DbConfig::in_memory()).await
    }

    pub async fn start_with_config(config: DbConfig) -> Self {
        let db = Arc::new(Database::with_config(&config));
        let (api_tx, api_rx) = api_channel(config.api_channel_capacity);
        let runtime = Runtime::new(Arc::clone(&db), config.clone(), api_rx, None);
        tokio::spawn(runtime.run());

        Self::serve(db, config, api_tx).await
    }

    /// A server with no runtime behind it. Requests queue on the returned
    /// receiver unanswered; dropping it closes the channel.
    pub async fn start_stalled(config: DbConfig) -> (Self, mpsc::Receiver<ApiRequest>) {
        let db = Arc::new(Database::with_config(&config));
        let (api_tx, api_rx) = api_channel(config.api_channel_capacity);
        (Self::serve(db, config, api_tx).await, api_rx)
    }

    async fn serve(db: Arc<Database>, config: DbConfig, api_tx: mpsc::Sender<ApiRequest>) -> Self {
        let router = Router::new(Arc::new(config), api_tx).unwrap();
        let server = Server::bind("127.0.0.1:0".parse().unwrap(), router)
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        tokio::spawn(server.serve());

        Self {
            db,
            client: reqwest::Client::new(),
            addr,
        }
    }

    /// Absolute URL for a path under the API prefix.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}/api/v1{}", self.addr, path)
    }
}
