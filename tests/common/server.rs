//! Mock server lifecycle management
//!
//! Each mock binds to a random port on 127.0.0.1 and shuts down gracefully
//! when its handle is dropped.

use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;

use super::constants::SERVER_READY_TIMEOUT_MS;

/// A running axum app on a random local port.
pub struct MockServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

/// Bind a random port and return the listener with its base URL.
///
/// Split from [`MockServer::serve`] so that handlers can know their own
/// base URL before the router is built.
pub async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let port = listener
        .local_addr()
        .expect("Failed to get local address")
        .port();
    (listener, format!("http://127.0.0.1:{}", port))
}

impl MockServer {
    /// Serve `app` on `listener` in a background task.
    pub async fn serve(listener: TcpListener, base_url: String, app: Router) -> Self {
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Mock server failed");
        });

        let server = Self {
            base_url,
            _shutdown_tx: Some(shutdown_tx),
        };
        server.wait_for_ready().await;
        server
    }

    /// Poll the socket until it accepts connections.
    async fn wait_for_ready(&self) {
        let addr = self.base_url.trim_start_matches("http://").to_string();
        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        while start.elapsed() < timeout {
            if tokio::net::TcpStream::connect(&addr).await.is_ok() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("Mock server at {} did not become ready", self.base_url);
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
