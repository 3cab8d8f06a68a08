use std::sync::Arc;

use axum::body::Body;
use axum::extract::Request;
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::{debug, warn};

use super::AvatarStore;
use crate::error::{AuthError, Result};
use crate::models::User;
use crate::utils::http_helpers::{empty_response, path_segments, HTTPError};

/// Fixed mount path of the avatar handler.
pub const AVATAR_ROUTE_PATH: &str = "/avatar";

/// Pulls user pictures from providers into the store and serves them back.
pub struct AvatarProxy {
    pub store: Arc<dyn AvatarStore>,
    /// Root url of the service, used to build public avatar links.
    pub url: String,
    pub route_path: String,
    client: reqwest::Client,
}

impl AvatarProxy {
    pub fn new(store: Arc<dyn AvatarStore>, url: &str) -> Self {
        AvatarProxy {
            store,
            url: url.trim_end_matches('/').to_string(),
            route_path: AVATAR_ROUTE_PATH.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Fetch the user's remote picture, store it, and return the proxied url.
    pub async fn put(&self, user: &User) -> Result<String> {
        if user.picture.is_empty() {
            return Err(AuthError::Avatar(format!("no picture for user {}", user.id)));
        }

        let response = self.client.get(&user.picture).send().await?;
        if !response.status().is_success() {
            return Err(AuthError::Avatar(format!(
                "failed to fetch avatar from {}, status {}",
                user.picture,
                response.status()
            )));
        }
        let image = response.bytes().await?.to_vec();

        let avatar_id = self
            .store
            .put(&user.id, image)
            .await
            .map_err(AuthError::Avatar)?;
        debug!("Saved avatar for user '{}' as '{}'", user.id, avatar_id);
        Ok(format!("{}{}/{}", self.url, self.route_path, avatar_id))
    }

    /// Serve `.../<avatar id>`.
    pub async fn handle(&self, request: Request) -> Response {
        let path = request.uri().path().to_string();
        let Some(avatar_id) = path_segments(&path)
            .last()
            .copied()
            .filter(|id| !id.is_empty())
        else {
            return empty_response(StatusCode::BAD_REQUEST);
        };

        match self.store.get(avatar_id).await {
            Ok(Some(image)) => {
                let content_type = sniff_content_type(&image);
                ([(CONTENT_TYPE, content_type)], Body::from(image)).into_response()
            }
            Ok(None) => {
                debug!("Avatar '{}' not found", avatar_id);
                empty_response(StatusCode::NOT_FOUND)
            }
            Err(e) => {
                warn!("Failed to load avatar '{}': {}", avatar_id, e);
                HTTPError::new(StatusCode::INTERNAL_SERVER_ERROR, "can't load avatar", None)
                    .into_response()
            }
        }
    }
}

fn sniff_content_type(image: &[u8]) -> &'static str {
    if image.starts_with(&[0x89, b'P', b'N', b'G']) {
        "image/png"
    } else if image.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if image.starts_with(b"GIF8") {
        "image/gif"
    } else {
        "application/octet-stream"
    }
}
