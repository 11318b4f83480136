//! End-to-end tests through the gateway server.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use skew_protection::config::loader::parse_config;
use skew_protection::config::{GatewayConfig, SkewProtectionConfig};
use skew_protection::engine::now_ms;
use skew_protection::host::DeploymentContext;
use skew_protection::http::GatewayServer;
use skew_protection::lifecycle::Shutdown;
use skew_protection::token::{self, Payload};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

const SECRET: &str = "gateway-secret";

fn env() -> HashMap<String, String> {
    HashMap::from([("SKEW_PROTECTION_SECRET".to_string(), SECRET.to_string())])
}

fn config(upstream: SocketAddr, sibling: &MockServer) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.upstream.address = upstream.to_string();
    config.deployment = DeploymentContext::published("dep-B", "site-name");
    config.skew_protection = SkewProtectionConfig::entrypoints(["/", "/index.html"]);
    config.reroute.origin_template = sibling.uri();
    config.reroute.timeout_secs = 5;
    config
}

fn pin(deployment_id: &str) -> String {
    let token = token::sign(&Payload::new(deployment_id, now_ms()), SECRET).unwrap();
    format!("nf_sp={token}")
}

async fn sibling() -> MockServer {
    let sibling = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/file.js"))
        .respond_with(ResponseTemplate::new(200).set_body_string("from dep-A"))
        .mount(&sibling)
        .await;
    sibling
}

async fn start_gateway(config: GatewayConfig) -> (SocketAddr, Shutdown) {
    let server = GatewayServer::with_environment(config, &env()).unwrap();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    (addr, shutdown)
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_entrypoint_sets_pin_cookie() {
    let upstream = common::start_mock_backend("current").await;
    let sibling = sibling().await;
    let (addr, shutdown) = start_gateway(config(upstream, &sibling)).await;

    let res = client()
        .get(format!("http://{addr}/"))
        .send()
        .await
        .expect("Gateway unreachable");

    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));

    let cookies: Vec<_> = res
        .headers()
        .get_all("set-cookie")
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert_eq!(cookies.len(), 1);
    let cookie = &cookies[0];
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Secure"));
    assert!(cookie.contains("SameSite=None"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Expires="));

    let value = cookie
        .strip_prefix("nf_sp=")
        .and_then(|rest| rest.split(';').next())
        .unwrap();
    let payload = token::verify(value, SECRET).unwrap();
    assert_eq!(payload.deployment_id, "dep-B");

    assert_eq!(res.text().await.unwrap(), "current");
    shutdown.trigger();
}

#[tokio::test]
async fn test_pinned_client_served_by_original_deployment() {
    let upstream = common::start_mock_backend("current").await;
    let sibling = sibling().await;
    let (addr, shutdown) = start_gateway(config(upstream, &sibling)).await;

    let res = client()
        .get(format!("http://{addr}/file.js"))
        .header("cookie", pin("dep-A"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert!(res.headers().get("set-cookie").is_none());
    assert_eq!(res.text().await.unwrap(), "from dep-A");
    shutdown.trigger();
}

#[tokio::test]
async fn test_current_pin_and_no_pin_pass_through() {
    let upstream = common::start_mock_backend("current").await;
    let sibling = sibling().await;
    let (addr, shutdown) = start_gateway(config(upstream, &sibling)).await;

    for cookie in [Some(pin("dep-B")), None] {
        let mut request = client().get(format!("http://{addr}/file.js"));
        if let Some(cookie) = cookie {
            request = request.header("cookie", cookie);
        }
        let res = request.send().await.unwrap();

        assert_eq!(res.status(), 200);
        assert!(res.headers().get("set-cookie").is_none());
        assert_eq!(res.text().await.unwrap(), "current");
    }
    shutdown.trigger();
}

#[tokio::test]
async fn test_invalid_pin_deleted() {
    let upstream = common::start_mock_backend("current").await;
    let sibling = sibling().await;
    let (addr, shutdown) = start_gateway(config(upstream, &sibling)).await;

    let res = client()
        .get(format!("http://{addr}/file.js"))
        .header("cookie", "nf_sp=deadbeef.cafe")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let cookie = res.headers()["set-cookie"].to_str().unwrap().to_string();
    assert!(cookie.starts_with("nf_sp=;"));
    assert!(cookie.contains("Max-Age=0"));
    assert_eq!(res.text().await.unwrap(), "current");
    shutdown.trigger();
}

#[tokio::test]
async fn test_unpublished_deployment_ignores_pins() {
    let upstream = common::start_mock_backend("current").await;
    let sibling = sibling().await;
    let mut config = config(upstream, &sibling);
    config.deployment.is_published = false;
    let (addr, shutdown) = start_gateway(config).await;

    let res = client()
        .get(format!("http://{addr}/file.js"))
        .header("cookie", pin("dep-A"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.text().await.unwrap(), "current");

    let res = client().get(format!("http://{addr}/")).send().await.unwrap();
    assert!(res.headers().get("set-cookie").is_none());
    shutdown.trigger();
}

#[tokio::test]
async fn test_inconsistent_classifier_passes_everything_through() {
    let upstream = common::start_mock_backend("current").await;
    let sibling = sibling().await;

    let mut loaded = parse_config(
        r#"
        [skew_protection]
        mode = "spa"
        entrypoints = ["/"]
        "#,
    )
    .expect("Inconsistent classifier must not reject the config");
    let base = config(upstream, &sibling);
    loaded.upstream = base.upstream;
    loaded.deployment = base.deployment;
    loaded.reroute = base.reroute;
    let (addr, shutdown) = start_gateway(loaded).await;

    let res = client()
        .get(format!("http://{addr}/"))
        .header("accept", "text/html")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.headers().get("set-cookie").is_none());
    assert_eq!(res.text().await.unwrap(), "current");

    let res = client()
        .get(format!("http://{addr}/file.js"))
        .header("cookie", pin("dep-A"))
        .send()
        .await
        .unwrap();
    assert!(res.headers().get("set-cookie").is_none());
    assert_eq!(res.text().await.unwrap(), "current");

    assert!(sibling.received_requests().await.unwrap().is_empty());
    shutdown.trigger();
}

#[tokio::test]
async fn test_non_get_requests_bypass_engine() {
    let upstream = common::start_mock_backend("current").await;
    let sibling = sibling().await;
    let server = GatewayServer::with_environment(config(upstream, &sibling), &env()).unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/file.js")
        .header("cookie", pin("dep-A"))
        .body(Body::empty())
        .unwrap();
    let response = server.router().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"current");
}

#[tokio::test]
async fn test_upstream_down_is_bad_gateway() {
    let sibling = sibling().await;
    let unused: SocketAddr = "127.0.0.1:1".parse().unwrap();
    let server = GatewayServer::with_environment(config(unused, &sibling), &env()).unwrap();

    let request = Request::builder().uri("/file.js").body(Body::empty()).unwrap();
    let response = server.router().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}
