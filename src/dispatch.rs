//! Fans the auth mount out to registered providers and serves the avatar mount.

use std::sync::Arc;

use axum::extract::{OriginalUri, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use tracing::{debug, warn};

use crate::avatar::AvatarProxy;
use crate::service::Service;
use crate::utils::http_helpers::{empty_response, path_segments, HTTPError};

/// Router serving `{prefix}/list`, `{prefix}/logout` and `{prefix}/{provider}/...`.
pub fn auth_router(service: Service) -> Router {
    Router::new().fallback(dispatch).with_state(service)
}

/// Router serving stored avatars; answers 404 when no avatar store is configured.
pub fn avatar_router(proxy: Option<Arc<AvatarProxy>>) -> Router {
    Router::new().fallback(dispatch_avatar).with_state(proxy)
}

async fn dispatch(State(service): State<Service>, request: Request) -> Response {
    // Nested routers see a stripped uri; the provider name is read from the full path.
    let path = request
        .extensions()
        .get::<OriginalUri>()
        .map(|OriginalUri(uri)| uri.path().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let segments = path_segments(&path);
    if segments.len() < 2 {
        debug!("Malformed auth request {}", path);
        return empty_response(StatusCode::BAD_REQUEST);
    }

    match segments[segments.len() - 1] {
        "list" => Json(service.providers()).into_response(),
        "logout" => match service.registry().first() {
            // The session cookie is shared, so any provider can clear it.
            Some(provider) => provider.handler.handle(request).await,
            None => {
                warn!("Logout requested with no providers registered");
                HTTPError::new(StatusCode::NOT_FOUND, "no providers registered", None).into_response()
            }
        },
        _ => {
            let name = segments[segments.len() - 2];
            match service.provider(name) {
                Ok(provider) => provider.handler.handle(request).await,
                Err(e) => {
                    debug!("Dispatch failed for {}: {}", path, e);
                    HTTPError::new(
                        StatusCode::BAD_REQUEST,
                        format!("provider {} not supported", name),
                        None,
                    )
                    .into_response()
                }
            }
        }
    }
}

async fn dispatch_avatar(
    State(proxy): State<Option<Arc<AvatarProxy>>>,
    request: Request,
) -> Response {
    match proxy {
        Some(proxy) => proxy.handle(request).await,
        None => {
            debug!("Avatar requested but no avatar store configured");
            empty_response(StatusCode::NOT_FOUND)
        }
    }
}
