//! Engine bootstrap from a real configuration file.

use std::io::Write;

use gonyx::prelude::*;
use gonyx::Engine;

struct Health;

impl RestfulController for Health {
    fn name(&self) -> &str {
        "Health"
    }

    fn routes(&self) -> Vec<RouteSpec> {
        vec![RouteSpec::get("/live", || async { "up" }).named("health.live")]
    }
}

fn write_config() -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
    write!(
        f,
        r#"
[app]
name = "demo"

[[http.servers]]
name = "default"
addr = "127.0.0.1:0"
versions = ["v1"]
"#
    )
    .unwrap();
    f
}

async fn http_get(addr: std::net::SocketAddr, path: &str) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    let req = format!("GET {path} HTTP/1.1\r\nhost: {addr}\r\nconnection: close\r\n\r\n");
    stream.write_all(req.as_bytes()).await.unwrap();
    let mut buf = String::new();
    stream.read_to_string(&mut buf).await.unwrap();
    buf
}

#[tokio::test]
async fn engine_serves_controller_routes() {
    let file = write_config();
    let mut engine = Engine::from_path(file.path().to_str()).unwrap();
    engine.register_controller("default", &Health).unwrap();

    let info = engine
        .http()
        .server("default")
        .unwrap()
        .route_by_name("health.live")
        .unwrap();
    assert_eq!(info.mounts, vec!["/health/live"]);

    engine.http_mut().start_all().await.unwrap();
    let addr = engine
        .http()
        .server("default")
        .unwrap()
        .local_addr()
        .unwrap();

    let response = http_get(addr, "/health/live").await;
    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.ends_with("up"));

    let missing = http_get(addr, "/v1/health/live").await;
    assert!(missing.starts_with("HTTP/1.1 404"));

    engine.shutdown().await.unwrap();
}

#[tokio::test]
async fn reapplying_the_same_snapshot_preserves_routes_and_serving() {
    let file = write_config();
    let mut engine = Engine::from_path(file.path().to_str()).unwrap();
    engine.register_controller("default", &Health).unwrap();
    engine.http_mut().start_all().await.unwrap();

    let before = engine.http().server("default").unwrap().routes();
    engine.apply_config().await.unwrap();
    let after = engine.http().server("default").unwrap().routes();
    assert_eq!(before, after);

    // The restarted server still answers.
    let addr = engine
        .http()
        .server("default")
        .unwrap()
        .local_addr()
        .unwrap();
    let response = http_get(addr, "/health/live").await;
    assert!(response.starts_with("HTTP/1.1 200"));

    engine.shutdown().await.unwrap();
}
