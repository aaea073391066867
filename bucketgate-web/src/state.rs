//! Shared application state

use crate::WebResult;
use bucketgate_core::{
    AccessGate, ContentStore, CredentialStore, GatewayConfig, MemoryStore, ObjectGateway,
    S3Store, SessionAuthenticator, SessionStore, StoreBackend,
};
use std::sync::Arc;
use tracing::info;

/// Everything a handler needs, cheap to clone per request.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Configuration
    pub config: Arc<GatewayConfig>,
    /// Credential check and session tracking
    pub auth: SessionAuthenticator,
    /// Allow / redirect / deny policy
    pub gate: Arc<AccessGate>,
    /// Object operations against the configured store
    pub gateway: ObjectGateway,
}

impl AppState {
    /// Build the state, connecting to the store the configuration selects.
    pub async fn new(config: GatewayConfig, credentials: CredentialStore) -> WebResult<Self> {
        let store: Arc<dyn ContentStore> = match config.storage.backend {
            StoreBackend::S3 => {
                let store = S3Store::from_config(&config.storage).await;
                if config.storage.create_bucket {
                    store.ensure_bucket().await?;
                }
                Arc::new(store)
            }
            StoreBackend::Memory => Arc::new(MemoryStore::new(config.storage.bucket.clone())),
        };

        Ok(Self::with_store(config, credentials, store))
    }

    /// Build the state around an already constructed store.
    pub fn with_store(
        config: GatewayConfig,
        credentials: CredentialStore,
        store: Arc<dyn ContentStore>,
    ) -> Self {
        info!(
            backend = store.backend(),
            bucket = store.bucket(),
            users = credentials.len(),
            "Application state initialised"
        );

        let auth = SessionAuthenticator::new(
            Arc::new(credentials),
            Arc::new(SessionStore::new()),
            config.session.remember_for(),
        );

        Self {
            config: Arc::new(config),
            auth,
            gate: Arc::new(AccessGate::new()),
            gateway: ObjectGateway::new(store),
        }
    }
}
