use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::info;

use rkv_store::{InMemoryStore, KvStore};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::registry::FunctionRegistry;
use crate::router::build_router;
use crate::state::AppState;

/// Riak-compatible HTTP server over an injected store.
pub struct RkvServer {
    config: ServerConfig,
    store: Arc<dyn KvStore>,
    registry: Arc<FunctionRegistry>,
}

impl RkvServer {
    /// A server over a fresh in-memory store with the stock map functions.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            store: Arc::new(InMemoryStore::new()),
            registry: Arc::new(FunctionRegistry::new()),
        }
    }

    pub fn with_store(mut self, store: Arc<dyn KvStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_registry(mut self, registry: FunctionRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn KvStore> {
        &self.store
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        let state = AppState::new(Arc::clone(&self.store), Arc::clone(&self.registry));
        build_router(state, &self.config)
    }

    /// Serve until the process is stopped.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        info!(addr = %listener.local_addr()?, "rkv server listening");
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }

    /// Bind and serve in the background.
    pub async fn start(self) -> ServerResult<ServerHandle> {
        let app = self.router();
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        let local_addr = listener.local_addr()?;
        let (shutdown, signal) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    // a dropped sender also stops the server
                    let _ = signal.await;
                })
                .await
        });
        info!(addr = %local_addr, "rkv server started");
        Ok(ServerHandle {
            local_addr,
            shutdown: Some(shutdown),
            task,
        })
    }
}

impl fmt::Debug for RkvServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RkvServer")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// A running server started with [`RkvServer::start`].
#[derive(Debug)]
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<std::io::Result<()>>,
}

impl ServerHandle {
    /// The bound address; the port is real even when port 0 was requested.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    /// Stop accepting connections and wait for in-flight requests to finish.
    pub async fn stop(mut self) -> ServerResult<()> {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        let task = &mut self.task;
        task.await
            .map_err(|e| ServerError::Internal(format!("server task failed: {e}")))??;
        info!(addr = %self.local_addr, "rkv server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    fn ephemeral() -> ServerConfig {
        ServerConfig::default().with_bind_addr("127.0.0.1:0".parse().unwrap())
    }

    async fn raw_request(addr: SocketAddr, request: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[test]
    fn server_construction() {
        let server = RkvServer::new(ServerConfig::default());
        assert_eq!(server.config().bind_addr, "127.0.0.1:8098".parse().unwrap());
    }

    #[test]
    fn router_builds() {
        let server = RkvServer::new(ServerConfig::default());
        let _router = server.router();
    }

    #[tokio::test]
    async fn start_serves_then_stops() {
        let handle = RkvServer::new(ephemeral()).start().await.unwrap();
        assert_ne!(handle.port(), 0);

        let response = raw_request(
            handle.local_addr(),
            "GET /buckets?buckets=true HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 200"), "{response}");
        assert!(response.contains("\"buckets\""));

        let addr = handle.local_addr();
        handle.stop().await.unwrap();
        assert!(TcpStream::connect(addr).await.is_err());
    }

    #[tokio::test]
    async fn injected_store_is_served() {
        let store = Arc::new(InMemoryStore::new());
        store.put_value("seeded", "k", serde_json::json!({"a": 1})).unwrap();

        let handle = RkvServer::new(ephemeral())
            .with_store(store)
            .start()
            .await
            .unwrap();
        let response = raw_request(
            handle.local_addr(),
            "GET /riak/seeded/k HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 200"), "{response}");
        assert!(response.contains("{\"a\":1}"));
        handle.stop().await.unwrap();
    }
}
