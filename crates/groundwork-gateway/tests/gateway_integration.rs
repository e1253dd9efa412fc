use std::net::TcpListener;

use groundwork_config::{AppConfig, Environment};
use groundwork_gateway::GatewayServer;
use serde_json::Value;

/// Pick a random available port.
fn random_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind to random port");
    listener.local_addr().unwrap().port()
}

/// Build a config with an unreachable database so the gateway boots without
/// one.
fn test_config(port: u16) -> AppConfig {
    let mut config = AppConfig::default();
    config.gateway.host = "127.0.0.1".to_string();
    config.gateway.port = port;
    config.gateway.uploads_dir = std::env::temp_dir().join(format!("groundwork-uploads-{port}"));
    config.database.url = "postgres://127.0.0.1:1/groundwork_test".to_string();
    config.database.acquire_timeout_secs = 1;
    config
}

/// Start the gateway in the background and return its base URL.
async fn start_test_gateway(config: AppConfig) -> String {
    let port = config.gateway.port;
    tokio::spawn(async move {
        let server = GatewayServer::new(config);
        let _ = server.run().await;
    });

    // Wait for the server to be ready
    for _ in 0..50 {
        if TcpListener::bind(format!("127.0.0.1:{port}")).is_err() {
            break; // port is in use = server is up
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }

    format!("http://127.0.0.1:{port}")
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let base = start_test_gateway(test_config(random_port())).await;

    let resp = reqwest::get(format!("{base}/api/health"))
        .await
        .expect("health request failed");
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());
    assert_eq!(body["database"], "unavailable");
}

#[tokio::test]
async fn unknown_routes_return_json_404() {
    let base = start_test_gateway(test_config(random_port())).await;

    let resp = reqwest::get(format!("{base}/api/nope")).await.unwrap();
    assert_eq!(resp.status(), 404);

    let body: Value = resp.json().await.unwrap();
    assert!(body["error"]["message"].is_string());
}

#[tokio::test]
async fn preflight_allows_configured_frontend_origin() {
    let base = start_test_gateway(test_config(random_port())).await;

    let resp = reqwest::Client::new()
        .request(reqwest::Method::OPTIONS, format!("{base}/api/health"))
        .header("Origin", "http://localhost:3000")
        .header("Access-Control-Request-Method", "GET")
        .send()
        .await
        .unwrap();

    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:3000")
    );
    assert_eq!(
        resp.headers()
            .get("access-control-allow-credentials")
            .and_then(|v| v.to_str().ok()),
        Some("true")
    );
}

#[tokio::test]
async fn preflight_allows_other_localhost_ports_in_development() {
    let base = start_test_gateway(test_config(random_port())).await;

    let resp = reqwest::Client::new()
        .request(reqwest::Method::OPTIONS, format!("{base}/api/health"))
        .header("Origin", "http://localhost:5173")
        .header("Access-Control-Request-Method", "GET")
        .send()
        .await
        .unwrap();

    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:5173")
    );
}

#[tokio::test]
async fn preflight_rejects_foreign_origins_in_production() {
    let mut config = test_config(random_port());
    config.environment = Environment::Production;
    config.gateway.frontend_url = "https://app.example.com".to_string();
    let base = start_test_gateway(config).await;

    let resp = reqwest::Client::new()
        .request(reqwest::Method::OPTIONS, format!("{base}/api/health"))
        .header("Origin", "http://localhost:5173")
        .header("Access-Control-Request-Method", "GET")
        .send()
        .await
        .unwrap();

    assert!(resp.headers().get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn uploads_are_served_statically() {
    let config = test_config(random_port());
    std::fs::create_dir_all(&config.gateway.uploads_dir).unwrap();
    std::fs::write(config.gateway.uploads_dir.join("hello.txt"), "hi there").unwrap();

    let base = start_test_gateway(config).await;

    let resp = reqwest::get(format!("{base}/uploads/hello.txt")).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "hi there");
}
