//! Server Implementation
//!
//! Binds the configured listeners (UNIX socket and/or TCP), starts one
//! supervising task per printer and serves the API until shutdown.

use crate::core::{BackgroundTasks, Result, ServerError, ServerState};
use crate::services::build_router;
use futures::FutureExt;
use futures::future::{BoxFuture, try_join_all};
use std::path::{Path, PathBuf};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

pub struct Server {
    state: ServerState,
    force_listen: bool,
}

impl Server {
    /// `force_listen` removes an existing socket file before binding
    pub fn new(state: ServerState, force_listen: bool) -> Self {
        Self {
            state,
            force_listen,
        }
    }

    /// Serve until Ctrl-C or SIGTERM
    pub async fn run(self) -> Result<()> {
        let stop = CancellationToken::new();
        let signal_stop = stop.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            tracing::info!("Shutting down...");
            signal_stop.cancel();
        });
        self.run_until(stop).await
    }

    /// Serve until `stop` is cancelled
    ///
    /// Listeners are bound before any supervisor starts, so a bind failure
    /// aborts startup cleanly.
    pub async fn run_until(self, stop: CancellationToken) -> Result<()> {
        let config = self.state.config.clone();
        let app = build_router(self.state.clone());
        let mut listeners: Vec<BoxFuture<'static, Result<()>>> = Vec::new();

        // TCP is bound first so a failed bind leaves no socket file behind
        let tcp = if config.listen_tcp {
            let address = config.listen_tcp_address.clone();
            let listener = TcpListener::bind(&address)
                .await
                .map_err(|source| ServerError::Bind {
                    address: address.clone(),
                    source,
                })?;
            tracing::info!(address = %address, "Listening on TCP");
            Some(listener)
        } else {
            None
        };

        let mut socket_path: Option<PathBuf> = None;
        if config.listen_socket {
            let path = config.listen_socket_path.clone();
            let listener = bind_unix(&path, self.force_listen)?;
            tracing::info!(path = %path.display(), "Listening on UNIX socket");
            socket_path = Some(path);

            let (app, stop) = (app.clone(), stop.clone());
            listeners.push(
                async move {
                    axum::serve(listener, app)
                        .with_graceful_shutdown(stop.cancelled_owned())
                        .await
                        .map_err(|e| ServerError::Internal(e.into()))
                }
                .boxed(),
            );
        }

        if let Some(listener) = tcp {
            let (app, stop) = (app.clone(), stop.clone());
            listeners.push(
                async move {
                    axum::serve(listener, app)
                        .with_graceful_shutdown(stop.cancelled_owned())
                        .await
                        .map_err(|e| ServerError::Internal(e.into()))
                }
                .boxed(),
            );
        }

        let mut tasks = BackgroundTasks::new();
        self.state.registry.spawn_all(&mut tasks);
        tasks.log_summary();

        let served = try_join_all(listeners).await;
        stop.cancel();
        tasks.shutdown().await;

        if let Some(path) = socket_path {
            match std::fs::remove_file(&path) {
                Ok(()) => tracing::debug!(path = %path.display(), "Removed socket"),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove socket"),
            }
        }

        served.map(|_| ())
    }
}

#[cfg(unix)]
fn bind_unix(path: &Path, force_listen: bool) -> Result<tokio::net::UnixListener> {
    let bind_err = |source| ServerError::Bind {
        address: path.display().to_string(),
        source,
    };

    if path.symlink_metadata().is_ok() {
        if !force_listen {
            return Err(ServerError::SocketInUse(path.to_path_buf()));
        }
        std::fs::remove_file(path).map_err(bind_err)?;
        tracing::warn!(path = %path.display(), "Removed existing socket");
    }
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(bind_err)?;
    }

    tokio::net::UnixListener::bind(path).map_err(bind_err)
}

#[cfg(not(unix))]
fn bind_unix(path: &Path, _force_listen: bool) -> Result<TcpListener> {
    Err(ServerError::Internal(anyhow::anyhow!(
        "UNIX sockets are not supported on this platform: {}",
        path.display()
    )))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::core::Config;
    use printer_client::SimulatedFactory;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::UnixStream;

    fn state_for(socket: &Path) -> ServerState {
        let config = Config {
            listen_socket_path: socket.to_path_buf(),
            ..Config::default()
        };
        ServerState::new(config, Arc::new(SimulatedFactory::new()))
    }

    async fn get_over_socket(socket: &Path, uri: &str) -> String {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        let mut stream = loop {
            match UnixStream::connect(socket).await {
                Ok(stream) => break stream,
                Err(_) if tokio::time::Instant::now() < deadline => {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
                Err(e) => panic!("socket never came up: {}", e),
            }
        };
        let request = format!(
            "GET {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
            uri
        );
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn test_serves_over_unix_socket_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("printerd.sock");
        let stop = CancellationToken::new();

        let server = tokio::spawn(Server::new(state_for(&socket), false).run_until(stop.clone()));

        let response = get_over_socket(&socket, "/api/v1/printers").await;
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.ends_with(r#"{"result":[],"error":null}"#));

        stop.cancel();
        server.await.unwrap().unwrap();
        assert!(!socket.exists());
    }

    #[tokio::test]
    async fn test_failed_tcp_bind_leaves_no_socket() {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("printerd.sock");
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let address = taken.local_addr().unwrap().to_string();

        let config = Config {
            listen_socket_path: socket.clone(),
            listen_tcp: true,
            listen_tcp_address: address,
            ..Config::default()
        };
        let state = ServerState::new(config, Arc::new(SimulatedFactory::new()));

        let result = Server::new(state, false)
            .run_until(CancellationToken::new())
            .await;
        assert!(matches!(result, Err(ServerError::Bind { .. })));
        assert!(!socket.exists());

        // A restart without force_listen is not blocked by a stale socket
        let stop = CancellationToken::new();
        let server = tokio::spawn(Server::new(state_for(&socket), false).run_until(stop.clone()));
        let response = get_over_socket(&socket, "/health").await;
        assert!(response.starts_with("HTTP/1.1 200"));

        stop.cancel();
        server.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_existing_socket_requires_force() {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("printerd.sock");
        std::fs::write(&socket, b"").unwrap();

        let result = Server::new(state_for(&socket), false)
            .run_until(CancellationToken::new())
            .await;
        assert!(matches!(result, Err(ServerError::SocketInUse(_))));
        assert!(socket.exists());

        let stop = CancellationToken::new();
        let server = tokio::spawn(Server::new(state_for(&socket), true).run_until(stop.clone()));
        let response = get_over_socket(&socket, "/health").await;
        assert!(response.starts_with("HTTP/1.1 200"));

        stop.cancel();
        server.await.unwrap().unwrap();
    }
}
