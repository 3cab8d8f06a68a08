use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::Request;
use axum::http::header::LOCATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::base::{complete_login, logout, query_params, unsupported};
use super::{Params, ProviderHandler, ProviderService};
use crate::avatar::AvatarProxy;
use crate::error::{AuthError, Result};
use crate::models::User;
use crate::token::{Handshake, TokenService};
use crate::utils::http_helpers::{path_segments, HTTPError};
use crate::utils::value::field_string;

/// Turns a provider's user-info document into a user. The id is the raw provider id.
pub type UserMapper = fn(&Value) -> Option<User>;

/// Where a provider's authorization-code flow lives.
#[derive(Debug, Clone)]
pub struct Oauth2Endpoints {
    pub auth_url: String,
    pub token_url: String,
    pub info_url: String,
    pub scopes: Vec<String>,
}

/// Generic OAuth2 authorization-code handler.
pub struct Oauth2Provider {
    name: String,
    cid: String,
    csecret: String,
    url: String,
    redirect_url: String,
    endpoints: Oauth2Endpoints,
    map_user: UserMapper,
    token_service: Arc<TokenService>,
    avatar_proxy: Option<Arc<AvatarProxy>>,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl Oauth2Provider {
    pub fn new(name: &str, params: &Params, endpoints: Oauth2Endpoints, map_user: UserMapper) -> Self {
        Oauth2Provider {
            name: name.to_string(),
            cid: params.cid.clone(),
            csecret: params.csecret.clone(),
            url: params.url.clone(),
            redirect_url: format!("{}/auth/{}/callback", params.url.trim_end_matches('/'), name),
            endpoints,
            map_user,
            token_service: params.token_service.clone(),
            avatar_proxy: params.avatar_proxy.clone(),
            client: reqwest::Client::new(),
        }
    }

    /// Wrap the handler into a registrable provider.
    pub fn into_service(self, params: Params) -> ProviderService {
        ProviderService {
            name: self.name.clone(),
            cid: params.cid,
            csecret: params.csecret,
            issuer: params.issuer,
            handler: Arc::new(self),
        }
    }

    fn login(&self, request: &Request) -> Response {
        let params = query_params(request);
        let site = params.get("site").cloned().unwrap_or_default();
        let handshake = Handshake {
            state: Uuid::new_v4().to_string(),
            from: params.get("from").cloned().unwrap_or_default(),
        };

        let scope = self.endpoints.scopes.join(" ");
        let auth_url = match Url::parse_with_params(
            &self.endpoints.auth_url,
            &[
                ("client_id", self.cid.as_str()),
                ("redirect_uri", self.redirect_url.as_str()),
                ("response_type", "code"),
                ("scope", scope.as_str()),
                ("state", handshake.state.as_str()),
            ],
        ) {
            Ok(url) => url,
            Err(e) => {
                warn!("Invalid auth url for provider '{}': {}", self.name, e);
                return HTTPError::new(StatusCode::INTERNAL_SERVER_ERROR, "invalid auth url", None)
                    .into_response();
            }
        };

        let mut headers = HeaderMap::new();
        if let Err(e) = self.token_service.set_handshake(&mut headers, handshake, &site) {
            warn!("Failed to set handshake for provider '{}': {}", self.name, e);
            return HTTPError::new(StatusCode::INTERNAL_SERVER_ERROR, "failed to make login state", None)
                .into_response();
        }

        debug!("Redirecting login to provider '{}'", self.name);
        (StatusCode::FOUND, headers, [(LOCATION, auth_url.to_string())]).into_response()
    }

    async fn callback(&self, request: Request) -> Response {
        let params = query_params(&request);
        let (handshake, site) = match self.token_service.get_handshake(request.headers()) {
            Ok(found) => found,
            Err(e) => {
                warn!("Callback for provider '{}' without valid handshake: {}", self.name, e);
                return HTTPError::new(StatusCode::FORBIDDEN, "invalid handshake token", None)
                    .into_response();
            }
        };

        if params.get("state") != Some(&handshake.state) {
            warn!("Callback for provider '{}' with unexpected state", self.name);
            return HTTPError::new(StatusCode::FORBIDDEN, "unexpected state", None).into_response();
        }

        let Some(code) = params.get("code").filter(|c| !c.is_empty()) else {
            return HTTPError::new(StatusCode::BAD_REQUEST, "no code in callback", None)
                .into_response();
        };

        let mut user = match self.exchange(code).await {
            Ok(user) => user,
            Err(e) => {
                warn!("Exchange failed for provider '{}': {}", self.name, e);
                return HTTPError::new(StatusCode::INTERNAL_SERVER_ERROR, "failed to exchange token", None)
                    .into_response();
            }
        };

        if let Some(proxy) = &self.avatar_proxy {
            if !user.picture.is_empty() {
                match proxy.put(&user).await {
                    Ok(url) => user.picture = url,
                    Err(e) => warn!("Failed to proxy avatar for '{}': {}", user.id, e),
                }
            }
        }

        info!("Provider '{}' authenticated user '{}'", self.name, user.id);
        let mut headers = HeaderMap::new();
        self.token_service.clear_handshake(&mut headers);
        complete_login(&self.token_service, headers, user, &site, &handshake.from, &self.url)
    }

    /// Trade the code for an access token and load the user behind it.
    async fn exchange(&self, code: &str) -> Result<User> {
        let token: TokenResponse = self
            .client
            .post(&self.endpoints.token_url)
            .header("Accept", "application/json")
            .form(&[
                ("client_id", self.cid.as_str()),
                ("client_secret", self.csecret.as_str()),
                ("code", code),
                ("redirect_uri", self.redirect_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let info: Value = self
            .client
            .get(&self.endpoints.info_url)
            .header("User-Agent", "authmux")
            .bearer_auth(&token.access_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut user = (self.map_user)(&info)
            .ok_or_else(|| AuthError::Exchange(format!("no user id in {} user info", self.name)))?;
        user.id = format!("{}_{}", self.name, user.id);
        Ok(user)
    }
}

#[async_trait]
impl ProviderHandler for Oauth2Provider {
    async fn handle(&self, request: Request) -> Response {
        let path = request.uri().path().to_string();
        match path_segments(&path).last().copied() {
            Some("login") => self.login(&request),
            Some("callback") => self.callback(request).await,
            Some("logout") => logout(&self.token_service),
            _ => unsupported(&path),
        }
    }
}

fn github_user(info: &Value) -> Option<User> {
    let id = field_string(info, "/id")?;
    let name = field_string(info, "/name")
        .or_else(|| field_string(info, "/login"))
        .unwrap_or_default();
    let mut user = User::new(name, id, field_string(info, "/avatar_url"), None);
    user.email = field_string(info, "/email").unwrap_or_default();
    Some(user)
}

fn google_user(info: &Value) -> Option<User> {
    let id = field_string(info, "/sub").or_else(|| field_string(info, "/id"))?;
    let name = field_string(info, "/name").unwrap_or_default();
    let mut user = User::new(name, id, field_string(info, "/picture"), None);
    user.email = field_string(info, "/email").unwrap_or_default();
    Some(user)
}

fn facebook_user(info: &Value) -> Option<User> {
    let id = field_string(info, "/id")?;
    let name = field_string(info, "/name").unwrap_or_default();
    Some(User::new(name, id, field_string(info, "/picture/data/url"), None))
}

pub fn github_endpoints() -> Oauth2Endpoints {
    Oauth2Endpoints {
        auth_url: "https://github.com/login/oauth/authorize".to_string(),
        token_url: "https://github.com/login/oauth/access_token".to_string(),
        info_url: "https://api.github.com/user".to_string(),
        scopes: vec!["user:email".to_string()],
    }
}

pub fn google_endpoints() -> Oauth2Endpoints {
    Oauth2Endpoints {
        auth_url: "https://accounts.google.com/o/oauth2/auth".to_string(),
        token_url: "https://oauth2.googleapis.com/token".to_string(),
        info_url: "https://www.googleapis.com/oauth2/v3/userinfo".to_string(),
        scopes: vec!["https://www.googleapis.com/auth/userinfo.profile".to_string()],
    }
}

pub fn facebook_endpoints() -> Oauth2Endpoints {
    Oauth2Endpoints {
        auth_url: "https://www.facebook.com/dialog/oauth".to_string(),
        token_url: "https://graph.facebook.com/oauth/access_token".to_string(),
        info_url: "https://graph.facebook.com/me?fields=id,name,picture".to_string(),
        scopes: vec!["public_profile".to_string()],
    }
}

pub fn new_github(params: Params) -> ProviderService {
    Oauth2Provider::new("github", &params, github_endpoints(), github_user).into_service(params)
}

pub fn new_google(params: Params) -> ProviderService {
    Oauth2Provider::new("google", &params, google_endpoints(), google_user).into_service(params)
}

pub fn new_facebook(params: Params) -> ProviderService {
    Oauth2Provider::new("facebook", &params, facebook_endpoints(), facebook_user).into_service(params)
}

/// Provider with custom endpoints, e.g. a self-hosted OAuth2 server.
pub fn new_custom(
    name: &str,
    params: Params,
    endpoints: Oauth2Endpoints,
    map_user: UserMapper,
) -> ProviderService {
    Oauth2Provider::new(name, &params, endpoints, map_user).into_service(params)
}

/// Mapper for servers returning `{"id": ..., "name": ..., "picture": ...}`.
pub fn default_user(info: &Value) -> Option<User> {
    facebook_user(info).map(|mut user| {
        if user.picture.is_empty() {
            user.picture = field_string(info, "/picture").unwrap_or_default();
        }
        user
    })
}
