use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::{engine::general_purpose, Engine as _};
use chrono::Utc;
use tracing::{debug, warn};

use super::Validator;
use crate::models::User;
use crate::providers::ProviderRegistry;
use crate::token::TokenService;
use crate::utils::http_helpers::HTTPError;

/// User name accepted by the basic-auth dev bypass.
pub const DEV_BASIC_USER: &str = "dev";

/// Token middleware state.
///
/// `providers` is a live view of the service registry: providers registered
/// after this value was handed out are visible here too.
#[derive(Clone)]
pub struct Authenticator {
    token_service: Arc<TokenService>,
    validator: Option<Arc<dyn Validator>>,
    dev_passwd: String,
    providers: ProviderRegistry,
}

impl Authenticator {
    pub fn new(
        token_service: Arc<TokenService>,
        validator: Option<Arc<dyn Validator>>,
        dev_passwd: String,
        providers: ProviderRegistry,
    ) -> Self {
        Authenticator {
            token_service,
            validator,
            dev_passwd,
            providers,
        }
    }

    /// Names of the providers a user can log in with.
    pub fn providers(&self) -> Vec<String> {
        self.providers.names()
    }

    /// `WWW-Authenticate` value pointing clients at the available providers.
    pub fn challenge(&self) -> String {
        format!(
            "Bearer realm=\"{}\", providers=\"{}\"",
            self.token_service.issuer(),
            self.providers().join(",")
        )
    }

    /// Resolve the user behind a request.
    ///
    /// Expired tokens still inside the cookie lifetime are re-issued; the new
    /// cookies are appended to `refreshed` for the caller to send back.
    pub fn authenticate(&self, headers: &HeaderMap, refreshed: &mut HeaderMap) -> Result<User, String> {
        if let Some(user) = self.dev_user(headers) {
            return Ok(user);
        }

        let parsed = self.token_service.get(headers).map_err(|e| e.to_string())?;
        let mut claims = parsed.claims;
        let mut token = parsed.token;

        if parsed.expired {
            let cookie_duration = self.token_service.opts().cookie_duration.as_secs() as i64;
            if claims.iat + cookie_duration <= Utc::now().timestamp() {
                return Err("token expired".to_string());
            }
            claims = self
                .token_service
                .set(refreshed, claims)
                .map_err(|e| e.to_string())?;
            // validators see the token the client will hold from now on
            token = self.token_service.token(&claims).map_err(|e| e.to_string())?;
            debug!("Refreshed expired token {}", claims.jti);
        }

        if claims.user.is_none() {
            return Err("no user info presented in the claim".to_string());
        }

        if let Some(validator) = &self.validator {
            if !validator.validate(&token, &claims) {
                return Err("user rejected by validator".to_string());
            }
        }

        claims
            .user
            .ok_or_else(|| "no user info presented in the claim".to_string())
    }

    /// Basic auth "dev:<dev_passwd>", only when a dev password is configured.
    fn dev_user(&self, headers: &HeaderMap) -> Option<User> {
        if self.dev_passwd.is_empty() {
            return None;
        }
        let encoded = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Basic "))?;
        let decoded = general_purpose::STANDARD.decode(encoded.trim()).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (username, password) = decoded.split_once(':')?;

        if username == DEV_BASIC_USER && password == self.dev_passwd {
            debug!("Dev password bypass used");
            return Some(User::new(
                DEV_BASIC_USER.to_string(),
                DEV_BASIC_USER.to_string(),
                None,
                None,
            ));
        }
        warn!("Basic auth attempt with wrong dev credentials");
        None
    }
}

/// Middleware requiring a valid user. Use with `axum::middleware::from_fn_with_state`.
pub async fn auth(
    State(authenticator): State<Authenticator>,
    mut request: Request,
    next: Next,
) -> Response {
    let mut refreshed = HeaderMap::new();
    match authenticator.authenticate(request.headers(), &mut refreshed) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            let mut response = next.run(request).await;
            response.headers_mut().extend(refreshed);
            response
        }
        Err(reason) => {
            debug!("Rejecting {}: {}", request.uri().path(), reason);
            HTTPError::new(
                StatusCode::UNAUTHORIZED,
                "Unauthorized",
                Some(authenticator.challenge()),
            )
            .into_response()
        }
    }
}

/// Middleware attaching the user when there is one, never rejecting.
pub async fn trace(
    State(authenticator): State<Authenticator>,
    mut request: Request,
    next: Next,
) -> Response {
    let mut refreshed = HeaderMap::new();
    match authenticator.authenticate(request.headers(), &mut refreshed) {
        Ok(user) => {
            request.extensions_mut().insert(user);
        }
        Err(reason) => debug!("No user for {}: {}", request.uri().path(), reason),
    }
    let mut response = next.run(request).await;
    response.headers_mut().extend(refreshed);
    response
}
