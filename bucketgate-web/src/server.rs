//! Bucketgate Web Server
//!
//! Server lifecycle: bind, serve until shutdown, sweep expired sessions in
//! the background.

use crate::{create_app, AppState, WebError, WebResult};
use bucketgate_core::{
    config_error, ContentStore, CredentialStore, GatewayConfig, SessionAuthenticator,
    StoreBackend,
};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Main Bucketgate web server
pub struct GatewayServer {
    state: AppState,
}

impl GatewayServer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Bind the configured address
    pub async fn bind(&self) -> WebResult<TcpListener> {
        let address = self.state.config.server.address();
        let listener = TcpListener::bind(&address).await?;
        info!(%address, "Server listening");
        Ok(listener)
    }

    /// Bind and serve until Ctrl-C or SIGTERM
    pub async fn start(self) -> WebResult<()> {
        let listener = self.bind().await?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on `listener` until `shutdown` resolves, then drain in-flight
    /// requests.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> WebResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!(
            backend = self.state.gateway.store().backend(),
            bucket = self.state.gateway.store().bucket(),
            "Starting Bucketgate"
        );

        let sweeper = spawn_session_sweeper(
            self.state.auth.clone(),
            Duration::from_secs(self.state.config.session.sweep_interval_secs),
        );

        let app = create_app(self.state.clone());
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await;

        sweeper.abort();

        if let Err(e) = result {
            error!(error = %e, "Server error");
            return Err(WebError::Server(e));
        }

        info!("Server shut down gracefully");
        Ok(())
    }

    /// Get application state
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

/// Periodically drop expired sessions. A zero interval disables the sweep.
pub fn spawn_session_sweeper(auth: SessionAuthenticator, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        if every.is_zero() {
            return;
        }

        let mut interval = tokio::time::interval(every);
        // The first tick completes immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            let purged = auth.purge_expired().await;
            if purged > 0 {
                debug!(purged, "Expired sessions removed");
            }
        }
    })
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received SIGINT"),
        () = terminate => info!("received SIGTERM"),
    }
}

/// Builder for GatewayServer
pub struct GatewayServerBuilder {
    config: GatewayConfig,
    credentials: Option<CredentialStore>,
    store: Option<Arc<dyn ContentStore>>,
}

impl GatewayServerBuilder {
    /// Create a new server builder
    pub fn new() -> Self {
        Self::from_config(GatewayConfig::default())
    }

    pub fn from_config(config: GatewayConfig) -> Self {
        Self {
            config,
            credentials: None,
            store: None,
        }
    }

    /// Set the server host
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.config.server.host = host.into();
        self
    }

    /// Set the server port
    pub fn port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    /// Set static files directory
    pub fn static_dir<P: Into<PathBuf>>(mut self, static_dir: P) -> Self {
        self.config.server.static_dir = static_dir.into();
        self
    }

    /// Keep objects in memory instead of S3
    pub fn memory_store(mut self) -> Self {
        self.config.storage.backend = StoreBackend::Memory;
        self
    }

    pub fn credentials(mut self, credentials: CredentialStore) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Use an already constructed store, ignoring `storage.backend`
    pub fn store(mut self, store: Arc<dyn ContentStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Validate the configuration and build the server
    pub async fn build(self) -> WebResult<GatewayServer> {
        self.config.validate()?;

        let credentials = self
            .credentials
            .ok_or_else(|| config_error!("no credentials configured", "server"))?;

        let state = match self.store {
            Some(store) => AppState::with_store(self.config, credentials, store),
            None => AppState::new(self.config, credentials).await?,
        };

        Ok(GatewayServer::new(state))
    }
}

impl Default for GatewayServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
