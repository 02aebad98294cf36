//! Hyper server setup and request handling.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use http_body_util::Full;
use hyper::body::{Bytes, Incoming as IncomingBody};
use hyper::{Request, Response};
use hyper_util::rt::TokioExecutor;
use hyper_util::rt::TokioIo;
use hyper_util::server::conn::auto::Builder as ConnectionBuilder;
use tokio::net::TcpListener;
use tokio::time;

use crate::router::Router;

/// Pause after a failed accept, so descriptor exhaustion does not spin.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// HTTP server for the course API.
pub struct Server {
    listener: TcpListener,
    router: Arc<Router>,
}

impl Server {
    /// Binds the listening socket.
    ///
    /// # Arguments
    /// * `addr` - Socket address to bind to, port 0 picks a free port
    /// * `router` - Request router
    pub async fn bind(addr: SocketAddr, router: Router) -> Result<Self, std::io::Error> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            router: Arc::new(router),
        })
    }

    /// Address the server is listening on.
    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.listener.local_addr()
    }

    /// Serves connections until the process exits.
    pub async fn serve(self) -> Result<(), std::io::Error> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Serves connections until `shutdown` resolves.
    ///
    /// Connections already accepted run to completion on their own tasks.
    /// A failed accept is logged and retried; it never stops the server.
    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()>,
    {
        tracing::info!("Server listening on http://{}", self.local_addr()?);
        tokio::pin!(shutdown);

        loop {
            let (stream, peer) = tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok(connection) => connection,
                    Err(e) => {
                        tracing::warn!("Failed to accept connection: {}", e);
                        time::sleep(ACCEPT_ERROR_BACKOFF).await;
                        continue;
                    }
                },
                _ = &mut shutdown => {
                    tracing::info!("Server shutting down");
                    return Ok(());
                }
            };
            let io = TokioIo::new(stream);
            let router = Arc::clone(&self.router);

            tokio::task::spawn(async move {
                let builder = ConnectionBuilder::new(TokioExecutor::new());
                if let Err(err) = builder
                    .serve_connection(
                        io,
                        hyper::service::service_fn(move |req| handle_request(req, router.clone())),
                    )
                    .await
                {
                    tracing::warn!("Error serving connection from {}: {}", peer, err);
                }
            });
        }
    }
}

/// Handles an incoming HTTP request.
async fn handle_request(
    req: Request<IncomingBody>,
    router: Arc<Router>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = match router.route(req).await {
        Ok(response) => response,
        Err(err) => {
            if err.status() >= 500 {
                tracing::error!("{} {} failed: {}", method, path, err);
            } else {
                tracing::debug!("{} {} rejected: {}", method, path, err);
            }
            err.into()
        }
    };

    tracing::debug!("{} {} -> {}", method, path, response.status());
    Ok(response.map(Full::new))
}
