use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Query, Request};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use reqwest::Url;
use tracing::{info, warn};

use super::{dev_provider, oauth2_provider};
use crate::avatar::AvatarProxy;
use crate::models::User;
use crate::token::{Claims, TokenService};
use crate::utils::http_helpers::HTTPError;

/// Fully services one provider request (login, callback, logout).
#[async_trait]
pub trait ProviderHandler: Send + Sync {
    async fn handle(&self, request: Request) -> Response;
}

/// A registered provider: its identity plus the handler serving its routes.
#[derive(Clone)]
pub struct ProviderService {
    pub name: String,
    pub cid: String,
    pub csecret: String,
    pub issuer: String,
    pub handler: Arc<dyn ProviderHandler>,
}

impl fmt::Debug for ProviderService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderService")
            .field("name", &self.name)
            .field("cid", &self.cid)
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

/// Everything a provider constructor gets from the service.
#[derive(Clone)]
pub struct Params {
    /// Root url of the service, e.g. http://auth.example.com
    pub url: String,
    pub token_service: Arc<TokenService>,
    pub issuer: String,
    pub avatar_proxy: Option<Arc<AvatarProxy>>,
    pub cid: String,
    pub csecret: String,
}

/// Builds a provider of one kind.
pub type ProviderFactory = fn(Params) -> ProviderService;

/// Supported provider kinds, in the order they are documented.
/// "yandex" is wired to the facebook constructor and registers as "facebook".
pub const PROVIDER_KINDS: &[(&str, ProviderFactory)] = &[
    ("github", oauth2_provider::new_github),
    ("google", oauth2_provider::new_google),
    ("facebook", oauth2_provider::new_facebook),
    ("yandex", oauth2_provider::new_facebook),
    ("dev", dev_provider::new_dev),
];

/// Find the constructor for a provider kind. Matching is case-insensitive.
pub fn provider_factory(kind: &str) -> Option<ProviderFactory> {
    let kind = kind.to_lowercase();
    PROVIDER_KINDS
        .iter()
        .find(|(name, _)| *name == kind)
        .map(|(_, factory)| *factory)
}

/// Query parameters of a provider request, empty when absent or malformed.
pub(crate) fn query_params(request: &Request) -> HashMap<String, String> {
    Query::<HashMap<String, String>>::try_from_uri(request.uri())
        .map(|Query(params)| params)
        .unwrap_or_default()
}

/// Issue the session for `user` and either redirect to `from` or return the user as JSON.
/// Redirects are limited to relative paths and to the origin of `root_url`.
pub(crate) fn complete_login(
    token_service: &TokenService,
    mut headers: HeaderMap,
    user: User,
    aud: &str,
    from: &str,
    root_url: &str,
) -> Response {
    let claims = Claims::for_user(user.clone(), aud);
    if let Err(e) = token_service.set(&mut headers, claims) {
        warn!("Failed to set token for user '{}': {}", user.id, e);
        return HTTPError::new(StatusCode::INTERNAL_SERVER_ERROR, "failed to set token", None)
            .into_response();
    }

    info!("User '{}' logged in on site '{}'", user.id, aud);
    if from.is_empty() {
        return (headers, Json(user)).into_response();
    }
    if !is_local_redirect(from, root_url) {
        warn!("Ignoring redirect to foreign location '{}' after login of '{}'", from, user.id);
        return (headers, Json(user)).into_response();
    }
    (headers, Redirect::temporary(from)).into_response()
}

/// True for a relative path, or an absolute url on the same origin as `root_url`.
pub(crate) fn is_local_redirect(from: &str, root_url: &str) -> bool {
    if from.starts_with('/') {
        return !from.starts_with("//") && !from.contains('\\');
    }
    match (Url::parse(from), Url::parse(root_url)) {
        (Ok(target), Ok(root)) => target.origin() == root.origin(),
        _ => false,
    }
}

/// Reset the session cookies. Same for every provider.
pub(crate) fn logout(token_service: &TokenService) -> Response {
    let mut headers = HeaderMap::new();
    token_service.reset(&mut headers);
    (StatusCode::OK, headers).into_response()
}

pub(crate) fn unsupported(path: &str) -> Response {
    HTTPError::new(
        StatusCode::NOT_FOUND,
        format!("unsupported request {}", path),
        None,
    )
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_factory_known_kinds() {
        for kind in ["github", "google", "facebook", "yandex", "dev"] {
            assert!(provider_factory(kind).is_some(), "{} should be supported", kind);
        }
    }

    #[test]
    fn test_provider_factory_case_insensitive() {
        assert!(provider_factory("GitHub").is_some());
        assert!(provider_factory("DEV").is_some());
    }

    #[test]
    fn test_is_local_redirect() {
        let root = "http://127.0.0.1:8080";
        assert!(is_local_redirect("/web/index.html", root));
        assert!(is_local_redirect("http://127.0.0.1:8080/web", root));
        assert!(!is_local_redirect("https://evil.example/", root));
        assert!(!is_local_redirect("http://127.0.0.1:9090/web", root));
        assert!(!is_local_redirect("//evil.example/x", root));
        assert!(!is_local_redirect("/\\evil.example", root));
        assert!(!is_local_redirect("javascript:alert(1)", root));
        assert!(!is_local_redirect("https://evil.example/", ""));
    }

    #[test]
    fn test_provider_factory_unknown() {
        assert!(provider_factory("myspace").is_none());
        assert!(provider_factory("").is_none());
    }
}
