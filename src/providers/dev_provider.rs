use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::Request;
use axum::http::HeaderMap;
use axum::response::Response;
use tracing::debug;

use super::base::{complete_login, logout, query_params, unsupported};
use super::{Params, ProviderHandler, ProviderService};
use crate::models::User;
use crate::token::TokenService;
use crate::utils::http_helpers::path_segments;

pub const DEV_USER: &str = "dev_user";

/// Local provider for development: `login` signs in the requested user
/// (`?user=<name>`, default "dev_user") without an external exchange.
pub struct DevProvider {
    name: String,
    url: String,
    token_service: Arc<TokenService>,
}

pub fn new_dev(params: Params) -> ProviderService {
    let name = "dev".to_string();
    ProviderService {
        name: name.clone(),
        cid: params.cid,
        csecret: params.csecret,
        issuer: params.issuer,
        handler: Arc::new(DevProvider {
            name,
            url: params.url,
            token_service: params.token_service,
        }),
    }
}

#[async_trait]
impl ProviderHandler for DevProvider {
    async fn handle(&self, request: Request) -> Response {
        let path = request.uri().path().to_string();
        match path_segments(&path).last().copied() {
            Some("login") => {
                let params = query_params(&request);
                let username = params
                    .get("user")
                    .filter(|u| !u.is_empty())
                    .map(String::as_str)
                    .unwrap_or(DEV_USER);
                let site = params.get("site").map(String::as_str).unwrap_or("");
                let from = params.get("from").map(String::as_str).unwrap_or("");

                debug!("Dev login for user '{}' on site '{}'", username, site);
                let user = User::new(
                    username.to_string(),
                    format!("{}_{}", self.name, username),
                    None,
                    None,
                );
                complete_login(&self.token_service, HeaderMap::new(), user, site, from, &self.url)
            }
            Some("logout") => logout(&self.token_service),
            _ => unsupported(&path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{SecretFunc, TokenOpts};
    use axum::body::{to_bytes, Body};
    use axum::http::header::{LOCATION, SET_COOKIE};
    use axum::http::StatusCode;
    use std::time::Duration;

    fn params() -> Params {
        let token_service = Arc::new(TokenService::new(TokenOpts {
            secret_reader: Arc::new(SecretFunc::new(|_: &str| Ok("secret".to_string()))),
            claims_upd: None,
            secure_cookies: false,
            token_duration: Duration::from_secs(60),
            cookie_duration: Duration::from_secs(3600),
            disable_xsrf: true,
            jwt_cookie_name: String::new(),
            jwt_header_key: String::new(),
            xsrf_cookie_name: String::new(),
            xsrf_header_key: String::new(),
            issuer: "test-app".to_string(),
        }));
        Params {
            url: "http://127.0.0.1:8080".to_string(),
            token_service,
            issuer: "test-app".to_string(),
            avatar_proxy: None,
            cid: "cid".to_string(),
            csecret: "csecret".to_string(),
        }
    }

    fn get(uri: &str) -> Request {
        axum::http::Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[test]
    fn test_new_dev_descriptor() {
        let provider = new_dev(params());
        assert_eq!(provider.name, "dev");
        assert_eq!(provider.cid, "cid");
        assert_eq!(provider.csecret, "csecret");
        assert_eq!(provider.issuer, "test-app");
    }

    #[tokio::test]
    async fn test_login_returns_user_and_cookie() {
        let provider = new_dev(params());
        let response = provider.handler.handle(get("/auth/dev/login?site=my-test-site")).await;

        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response.headers()[SET_COOKIE].to_str().unwrap().to_string();
        assert!(cookie.starts_with("JWT="));

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let user: User = serde_json::from_slice(&body).unwrap();
        assert_eq!(user.name, "dev_user");
        assert_eq!(user.id, "dev_dev_user");
    }

    #[tokio::test]
    async fn test_login_custom_user_with_redirect() {
        let provider = new_dev(params());
        let response = provider
            .handler
            .handle(get("/auth/dev/login?user=dev_alice&from=http%3A%2F%2F127.0.0.1%3A8080%2Fweb"))
            .await;

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()[LOCATION], "http://127.0.0.1:8080/web");
        assert!(response.headers().get(SET_COOKIE).is_some());
    }

    #[tokio::test]
    async fn test_login_ignores_foreign_redirect() {
        let provider = new_dev(params());
        let response = provider
            .handler
            .handle(get("/auth/dev/login?from=https%3A%2F%2Fevil.example%2F"))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(LOCATION).is_none());
        assert!(response.headers().get(SET_COOKIE).is_some());
    }

    #[tokio::test]
    async fn test_logout_resets_cookie() {
        let provider = new_dev(params());
        let response = provider.handler.handle(get("/auth/dev/logout")).await;

        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response.headers()[SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("JWT=;"));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn test_unknown_action() {
        let provider = new_dev(params());
        let response = provider.handler.handle(get("/auth/dev/whatever")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
