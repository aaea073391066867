//! Server built from on-disk credentials and a static asset directory

use bucketgate_core::CredentialStore;
use bucketgate_web::GatewayServerBuilder;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

#[tokio::test]
async fn test_server_from_credentials_file_serves_static_and_login() {
    let mut credentials_file = NamedTempFile::new().unwrap();
    write!(
        credentials_file,
        r#"[{{"username":"ops","password":"hunter2"}}]"#
    )
    .unwrap();
    let credentials = CredentialStore::from_file(credentials_file.path()).unwrap();

    let static_dir = TempDir::new().unwrap();
    std::fs::write(static_dir.path().join("app.css"), "body { margin: 0 }").unwrap();

    let server = GatewayServerBuilder::new()
        .static_dir(static_dir.path())
        .memory_store()
        .credentials(credentials)
        .build()
        .await
        .unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());
    let (stop, stopped) = oneshot::channel::<()>();
    let handle = tokio::spawn(server.serve(listener, async move {
        stopped.await.ok();
    }));

    let client = reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    let css = client
        .get(format!("{address}/static/app.css"))
        .send()
        .await
        .unwrap();
    assert_eq!(css.status().as_u16(), 200);
    assert_eq!(css.text().await.unwrap(), "body { margin: 0 }");

    let login = client
        .post(format!("{address}/login"))
        .json(&serde_json::json!({ "username": "ops", "password": "hunter2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(login.status().as_u16(), 200);

    let files = client
        .get(format!("{address}/files"))
        .header("Accept", "application/json")
        .send()
        .await
        .unwrap();
    assert_eq!(files.status().as_u16(), 200);

    stop.send(()).unwrap();
    handle.await.unwrap().unwrap();
}
