//! Integration test helpers
//!
//! Spawns the full application on an ephemeral port and drives it with a
//! cookie-keeping reqwest client that does not follow redirects.

#![allow(dead_code)]

use bucketgate_core::{
    async_trait, ContentStore, Credential, CredentialStore, GatewayConfig, MemoryStore,
    ObjectBody, ObjectPayload, StorageError, StorageResult,
};
use bucketgate_web::{create_app, AppState};
use serde_json::json;
use std::sync::{Arc, LazyLock};
use tokio::net::TcpListener;

pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "secret";

// Ensure tracing is only initialised once
static TRACING: LazyLock<()> = LazyLock::new(|| {
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    } else {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_writer(std::io::sink)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }
});

/// A running test application
pub struct TestApp {
    pub address: String,
    pub api_client: reqwest::Client,
    pub state: AppState,
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.api_client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_json(&self, path: &str) -> reqwest::Response {
        self.api_client
            .get(self.url(path))
            .header("Accept", "application/json")
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// JSON login
    pub async fn post_login(&self, username: &str, password: &str, remember: bool) -> reqwest::Response {
        self.api_client
            .post(self.url("/login"))
            .json(&json!({
                "username": username,
                "password": password,
                "remember": remember
            }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// HTML form login
    pub async fn post_do_login(&self, username: &str, password: &str) -> reqwest::Response {
        self.api_client
            .post(self.url("/do-login"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Log in with the default test credentials
    pub async fn login(&self) {
        let response = self.post_login(USERNAME, PASSWORD, false).await;
        assert_eq!(response.status().as_u16(), 200, "test login failed");
    }

    pub async fn logout(&self) -> reqwest::Response {
        self.get("/logout").await
    }

    pub async fn upload(&self, file_name: &str, data: Vec<u8>) -> reqwest::Response {
        let part = reqwest::multipart::Part::bytes(data).file_name(file_name.to_string());
        // Send the name verbatim so path separators reach the server.
        let form = reqwest::multipart::Form::new()
            .percent_encode_noop()
            .part("file", part);

        self.api_client
            .post(self.url("/upload"))
            .header("Accept", "application/json")
            .multipart(form)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn list_files(&self) -> reqwest::Response {
        self.get_json("/files").await
    }

    pub async fn download(&self, key: &str) -> reqwest::Response {
        self.api_client
            .get(self.url(&format!("/download/{}", urlencoding::encode(key))))
            .header("Accept", "application/json")
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn delete(&self, key: &str) -> reqwest::Response {
        self.api_client
            .delete(self.url(&format!("/delete/{}", urlencoding::encode(key))))
            .header("Accept", "application/json")
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

pub fn test_credentials() -> CredentialStore {
    CredentialStore::new(vec![Credential::new(USERNAME, PASSWORD)]).unwrap()
}

/// Spawn the app over an in-memory store
pub async fn spawn_app() -> TestApp {
    spawn_app_with_store(Arc::new(MemoryStore::default())).await
}

/// Spawn the app over `store`
pub async fn spawn_app_with_store(store: Arc<dyn ContentStore>) -> TestApp {
    LazyLock::force(&TRACING);

    let state = AppState::with_store(GatewayConfig::default(), test_credentials(), store);
    let app = create_app(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        address: format!("http://{}", addr),
        api_client: client,
        state,
    }
}

/// Store whose every operation fails, for error mapping tests.
#[derive(Debug, Default)]
pub struct FailingStore;

#[async_trait]
impl ContentStore for FailingStore {
    fn backend(&self) -> &'static str {
        "failing"
    }

    fn bucket(&self) -> &str {
        "uploads"
    }

    async fn put_object(&self, key: &str, _body: ObjectBody<'_>) -> StorageResult<u64> {
        Err(StorageError::write_failed(key, "store unavailable"))
    }

    async fn get_object(&self, key: &str) -> StorageResult<ObjectPayload> {
        Err(StorageError::read_failed(key, "store unavailable"))
    }

    async fn list_objects(&self) -> StorageResult<Vec<String>> {
        Err(StorageError::list_failed("store unavailable"))
    }

    async fn delete_object(&self, key: &str) -> StorageResult<()> {
        Err(StorageError::delete_failed(key, "store unavailable"))
    }
}

/// Assert the response is a redirect to `location`
pub fn assert_is_redirect_to(response: &reqwest::Response, location: &str) {
    assert_eq!(response.status().as_u16(), 303);
    assert_eq!(response.headers().get("Location").unwrap(), location);
}
