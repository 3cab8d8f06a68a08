mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use authmux::middleware::ValidatorFunc;
use authmux::models::User;
use authmux::providers::{ProviderHandler, ProviderService};
use authmux::token::{Claims, SecretFunc};
use authmux::{AuthError, Opts, Service};
use axum::extract::Request;
use axum::http::header::{SET_COOKIE, WWW_AUTHENTICATE};
use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Router};
use common::{body_bytes, build_app, get_with_cookie, set_cookie_value, TEST_CONFIG};
use tower::ServiceExt;

fn opts() -> Opts {
    Opts {
        secret_reader: Some(Arc::new(SecretFunc::new(|_: &str| Ok("secret".to_string())))),
        url: "http://127.0.0.1:8080".to_string(),
        ..Default::default()
    }
}

struct Counting(Arc<AtomicUsize>);

#[async_trait]
impl ProviderHandler for Counting {
    async fn handle(&self, _request: Request) -> Response {
        self.0.fetch_add(1, Ordering::SeqCst);
        StatusCode::ACCEPTED.into_response()
    }
}

fn counting_provider(name: &str, hits: Arc<AtomicUsize>) -> ProviderService {
    ProviderService {
        name: name.to_string(),
        cid: String::new(),
        csecret: String::new(),
        issuer: "go-pkgz/auth".to_string(),
        handler: Arc::new(Counting(hits)),
    }
}

#[tokio::test]
async fn test_list_preserves_registration_order() {
    let (app, _) = build_app(TEST_CONFIG);

    let response = app.oneshot(common::get("/auth/list")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let names: Vec<String> = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(names, vec!["dev", "github"]);
}

#[tokio::test]
async fn test_list_keeps_duplicates() {
    let service = Service::new(opts()).unwrap();
    service.add_provider("github", "1", "");
    service.add_provider("dev", "", "");
    service.add_provider("github", "2", "");
    let (auth, _) = service.handlers();

    let response = auth.oneshot(common::get("/auth/list")).await.unwrap();
    let names: Vec<String> = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(names, vec!["github", "dev", "github"]);
    assert_eq!(service.provider("github").unwrap().cid, "1");
}

#[tokio::test]
async fn test_unknown_provider_is_bad_request() {
    let (app, _) = build_app(TEST_CONFIG);

    let response = app.oneshot(common::get("/auth/foo/bar")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_bytes(response).await,
        br#"{"error":"provider foo not supported"}"#.to_vec()
    );
}

#[tokio::test]
async fn test_single_segment_is_bad_request() {
    let service = Service::new(opts()).unwrap();
    service.add_provider("dev", "", "");
    let (auth, _) = service.handlers();

    let response = auth.oneshot(common::get("/singleseg")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn test_logout_goes_to_first_provider() {
    let first_hits = Arc::new(AtomicUsize::new(0));
    let second_hits = Arc::new(AtomicUsize::new(0));
    let service = Service::new(opts()).unwrap();
    service.add_custom_provider(counting_provider("first", first_hits.clone()));
    service.add_custom_provider(counting_provider("second", second_hits.clone()));
    let (auth, _) = service.handlers();

    let response = auth
        .oneshot(common::get("/auth/second/logout"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(first_hits.load(Ordering::SeqCst), 1);
    assert_eq!(second_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_logout_clears_session_cookie() {
    let (app, _) = build_app(TEST_CONFIG);

    let response = app
        .oneshot(common::get("/auth/anything/logout"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(set_cookie_value(response.headers(), "JWT"), Some(String::new()));
    let cookie = response.headers()[SET_COOKIE].to_str().unwrap();
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_logout_without_providers_is_not_found() {
    let (auth, _) = Service::new(opts()).unwrap().handlers();

    let response = auth.oneshot(common::get("/auth/dev/logout")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_avatar_mount_without_store() {
    let (app, _) = build_app(TEST_CONFIG);

    let response = app
        .oneshot(common::get("/avatar/some-id.image"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_avatar_mount_with_store() {
    let yaml = format!("{}avatar:\n  enabled: true\n", TEST_CONFIG);
    let (app, service) = build_app(&yaml);

    let proxy = service.avatar_proxy().expect("avatar proxy should be configured");
    let png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A];
    let avatar_id = proxy.store.put("github_1", png.clone()).await.unwrap();

    let response = app
        .oneshot(common::get(&format!("/avatar/{}", avatar_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, png);
}

#[tokio::test]
async fn test_private_route_requires_token() {
    let (app, _) = build_app(TEST_CONFIG);

    let response = app.oneshot(common::get("/private")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers()[WWW_AUTHENTICATE],
        "Bearer realm=\"my-test-app\", providers=\"dev,github\""
    );
}

#[tokio::test]
async fn test_open_and_health_routes() {
    let (app, _) = build_app(TEST_CONFIG);

    let response = app.clone().oneshot(common::get("/open")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(common::get("/health")).await.unwrap();
    assert_eq!(body_bytes(response).await, b"OK".to_vec());
}

#[tokio::test]
async fn test_dev_login_then_private_route() {
    let (app, _) = build_app(TEST_CONFIG);

    let response = app
        .clone()
        .oneshot(common::get("/auth/dev/login?user=dev_alice&site=my-site"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let jwt = set_cookie_value(response.headers(), "JWT").expect("login should set the JWT cookie");

    let logged_in: User = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(logged_in.id, "dev_dev_alice");

    let response = app
        .clone()
        .oneshot(get_with_cookie("/private", &format!("JWT={}", jwt)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let user: User = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(user.name, "dev_alice");

    let request = axum::http::Request::builder()
        .uri("/private")
        .header("X-JWT", jwt)
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_validator_rejects_users() {
    let service = Service::new(Opts {
        validator: Some(Arc::new(ValidatorFunc::new(|_: &str, claims: &Claims| {
            claims
                .user
                .as_ref()
                .map(|user| user.name.starts_with("dev_"))
                .unwrap_or(false)
        }))),
        disable_xsrf: true,
        ..opts()
    })
    .unwrap();
    service.add_provider("dev", "", "");

    let (auth, _) = service.handlers();
    let private = Router::new()
        .route("/private", get(|Extension(user): Extension<User>| async move { user.name }))
        .route_layer(from_fn_with_state(service.middleware(), authmux::middleware::auth));
    let app = Router::new().nest_service("/auth", auth).merge(private);

    for (name, expected) in [("dev_ok", StatusCode::OK), ("intruder", StatusCode::UNAUTHORIZED)] {
        let response = app
            .clone()
            .oneshot(common::get(&format!("/auth/dev/login?user={}", name)))
            .await
            .unwrap();
        let jwt = set_cookie_value(response.headers(), "JWT").unwrap();

        let response = app
            .clone()
            .oneshot(get_with_cookie("/private", &format!("JWT={}", jwt)))
            .await
            .unwrap();
        assert_eq!(response.status(), expected, "user {}", name);
    }
}

#[tokio::test]
async fn test_middleware_taken_before_registration() {
    let service = Service::new(opts()).unwrap();
    let middleware = service.middleware();
    let private = Router::new()
        .route("/private", get(|| async { "ok" }))
        .route_layer(from_fn_with_state(middleware, authmux::middleware::auth));

    service.add_provider("github", "cid", "csecret");
    service.add_provider("dev", "", "");

    let response = private.oneshot(common::get("/private")).await.unwrap();
    assert_eq!(
        response.headers()[WWW_AUTHENTICATE],
        "Bearer realm=\"go-pkgz/auth\", providers=\"github,dev\""
    );
}

#[test]
fn test_lookup_errors() {
    let service = Service::new(opts()).unwrap();
    service.add_provider("Dev", "cid", "csecret");
    service.add_provider("nope", "cid", "csecret");

    let dev = service.provider("dev").unwrap();
    assert_eq!(dev.issuer, "go-pkgz/auth");
    assert_eq!(service.providers(), vec!["dev"]);

    let err = service.provider("unknown-provider").unwrap_err();
    assert!(matches!(err, AuthError::ProviderNotFound(_)));
    assert_eq!(err.to_string(), "provider unknown-provider not found");
}

#[test]
fn test_missing_secret_reader() {
    let err = Service::new(Opts::default()).err().expect("construction must fail");
    assert_eq!(err.to_string(), "missing secret source");
}
