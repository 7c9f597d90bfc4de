use std::{net::SocketAddr, time::Duration};

use axum::{
    body::Bytes,
    http::{header, HeaderMap, StatusCode},
    routing::{get, post, put},
    Router,
};
use shared::{domain::RequestKey, status};
use tokio::{net::TcpListener, runtime::Runtime};

use super::*;
use crate::test_support::WAIT;

fn header_text(headers: &HeaderMap, name: header::HeaderName) -> String {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

async fn ping() -> &'static str {
    "pong"
}

async fn echo(headers: HeaderMap, body: String) -> String {
    format!("{}|{body}", header_text(&headers, header::CONTENT_TYPE))
}

async fn upload(headers: HeaderMap, body: Bytes) -> String {
    format!("{}|{}", header_text(&headers, header::CONTENT_TYPE), body.len())
}

async fn whoami(headers: HeaderMap) -> String {
    format!(
        "{}|{}",
        header_text(&headers, header::USER_AGENT),
        header_text(&headers, header::AUTHORIZATION)
    )
}

async fn created() -> (StatusCode, &'static str) {
    (StatusCode::CREATED, "made")
}

/// Serve the test routes on an ephemeral port for as long as the runtime lives.
fn spawn_server() -> (Runtime, SocketAddr) {
    let runtime = Runtime::new().expect("runtime");
    let app = Router::new()
        .route("/v1/ping", get(ping))
        .route("/v1/echo", post(echo).patch(echo).put(echo))
        .route("/v1/upload", put(upload))
        .route("/v1/whoami", get(whoami))
        .route("/v1/created", post(created));

    let listener = runtime
        .block_on(TcpListener::bind("127.0.0.1:0"))
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    runtime.spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    (runtime, addr)
}

fn live_pool(addr: SocketAddr) -> (NetworkerPool, crossbeam_channel::Receiver<RequestOutcome>) {
    let (handler, rx) = completion_channel();
    let config = NetConfig {
        worker_count: 2,
        interactive_workers: 1,
        idle_wait: Duration::from_millis(10),
        user_agent: "networker-e2e/0.1".to_string(),
        default_host: Some(format!("http://{addr}")),
        request_timeout: Some(Duration::from_secs(5)),
        ..NetConfig::default()
    };
    let pool = NetworkerPool::new(config, Some(handler)).expect("pool");
    pool.init().expect("init");
    (pool, rx)
}

#[test]
fn get_returns_body_and_round_trips_key() {
    let (_runtime, addr) = spawn_server();
    let (pool, rx) = live_pool(addr);

    pool.submit(
        true,
        RequestParams::get(format!("http://{addr}/v1/ping")).with_key(1234u64),
    )
    .expect("submit");

    let outcome = rx.recv_timeout(WAIT).expect("outcome");
    assert_eq!(outcome.status, status::OK);
    assert_eq!(outcome.response, "pong");
    assert_eq!(outcome.key, RequestKey(1234));
    pool.kill().expect("kill");
}

#[test]
fn bodies_carry_content_types() {
    let (_runtime, addr) = spawn_server();
    let (pool, rx) = live_pool(addr);

    pool.submit(true, RequestParams::post_json("/v1/echo", r#"{"content":"hi"}"#))
        .expect("submit");
    let outcome = rx.recv_timeout(WAIT).expect("outcome");
    assert_eq!(outcome.response, r#"application/json|{"content":"hi"}"#);

    pool.submit(
        true,
        RequestParams::new(RequestKind::Post, "/v1/echo").with_text("a=1&b=2"),
    )
    .expect("submit");
    let outcome = rx.recv_timeout(WAIT).expect("outcome");
    assert_eq!(outcome.response, "application/x-www-form-urlencoded|a=1&b=2");

    pool.submit(false, RequestParams::put_octets("/v1/upload", vec![7; 4096]))
        .expect("submit");
    let outcome = rx.recv_timeout(WAIT).expect("outcome");
    assert_eq!(outcome.response, "application/octet-stream|4096");

    pool.kill().expect("kill");
}

#[test]
fn sends_user_agent_and_authorization() {
    let (_runtime, addr) = spawn_server();
    let (pool, rx) = live_pool(addr);

    pool.submit(
        true,
        RequestParams::get("/v1/whoami").with_authorization("Bearer t0ken"),
    )
    .expect("submit");

    let outcome = rx.recv_timeout(WAIT).expect("outcome");
    assert_eq!(outcome.response, "networker-e2e/0.1|Bearer t0ken");
    pool.kill().expect("kill");
}

#[test]
fn non_ok_statuses_report_reason() {
    let (_runtime, addr) = spawn_server();
    let (pool, rx) = live_pool(addr);

    pool.submit(true, RequestParams::get("/v1/nowhere")).expect("submit");
    let outcome = rx.recv_timeout(WAIT).expect("outcome");
    assert_eq!(outcome.status, status::NOT_FOUND);
    assert_eq!(outcome.response, "Not Found");

    pool.submit(true, RequestParams::post_json("/v1/created", "{}"))
        .expect("submit");
    let outcome = rx.recv_timeout(WAIT).expect("outcome");
    assert_eq!(outcome.status, status::CREATED);
    assert_eq!(outcome.response, "Created");
    assert!(outcome.is_success());

    pool.kill().expect("kill");
}

#[test]
fn refused_connection_reports_transport_failure() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr")
    };
    let (pool, rx) = live_pool(addr);

    pool.submit(true, RequestParams::get("/v1/ping").with_key(8u64))
        .expect("submit");

    let outcome = rx.recv_timeout(WAIT).expect("outcome");
    assert_eq!(outcome.status, status::TRANSPORT_FAILURE);
    assert!(!outcome.response.is_empty());
    assert_eq!(outcome.key, RequestKey(8));
    pool.kill().expect("kill");
}
