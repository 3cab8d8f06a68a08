#![allow(dead_code)]

use authmux::config::{extract_config, ConfigV1};
use authmux::startup::{build_service, create_router};
use authmux::Service;
use axum::body::{to_bytes, Body};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, Request};
use axum::response::Response;
use axum::Router;
use figment::providers::{Format, Yaml};
use figment::Figment;

pub const TEST_CONFIG: &str = r#"
version: "1.0.0"
bind_address: 127.0.0.1:8080
logging:
  level: debug
  format: json
auth:
  secret: test-secret
  issuer: my-test-app
  url: http://127.0.0.1:8080
  disable_xsrf: true
providers:
  - name: dev
  - name: github
    cid: gh-cid
    csecret: gh-secret
"#;

pub fn load(yaml: &str) -> ConfigV1 {
    extract_config(Figment::new().merge(Yaml::string(yaml))).expect("test config should parse")
}

pub fn build_app(yaml: &str) -> (Router, Service) {
    let config = load(yaml);
    let service = build_service(&config).expect("service should build");
    (create_router(&service), service)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("failed to build request")
}

pub fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(COOKIE, cookie)
        .body(Body::empty())
        .expect("failed to build request")
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body")
        .to_vec()
}

/// Value of the named cookie among the response's `Set-Cookie` headers.
pub fn set_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with(&prefix))
        .and_then(|value| value[prefix.len()..].split(';').next())
        .map(str::to_string)
}
