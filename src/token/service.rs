use std::sync::Arc;
use std::time::Duration;

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use http::header::SET_COOKIE;
use http::{HeaderMap, HeaderValue};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{Claims, ClaimsUpdater, Handshake, SecretReader};
use crate::error::{AuthError, Result};

pub const DEFAULT_TOKEN_DURATION: Duration = Duration::from_secs(15 * 60);
pub const DEFAULT_COOKIE_DURATION: Duration = Duration::from_secs(31 * 24 * 60 * 60);
pub const DEFAULT_JWT_COOKIE_NAME: &str = "JWT";
pub const DEFAULT_JWT_HEADER_KEY: &str = "X-JWT";
pub const DEFAULT_XSRF_COOKIE_NAME: &str = "XSRF-TOKEN";
pub const DEFAULT_XSRF_HEADER_KEY: &str = "X-XSRF-TOKEN";
pub const DEFAULT_ISSUER: &str = "go-pkgz/auth";

/// Cookie holding the OAuth2 login handshake between redirect and callback.
pub const HANDSHAKE_COOKIE_NAME: &str = "auth_handshake";
const HANDSHAKE_DURATION: Duration = Duration::from_secs(15 * 60);

/// Settings for the token service. Empty names and zero durations fall back to defaults.
#[derive(Clone)]
pub struct TokenOpts {
    pub secret_reader: Arc<dyn SecretReader>,
    pub claims_upd: Option<Arc<dyn ClaimsUpdater>>,
    pub secure_cookies: bool,
    pub token_duration: Duration,
    pub cookie_duration: Duration,
    pub disable_xsrf: bool,
    pub jwt_cookie_name: String,
    pub jwt_header_key: String,
    pub xsrf_cookie_name: String,
    pub xsrf_header_key: String,
    pub issuer: String,
}

/// A verified token. Expired tokens are still returned, flagged, so callers can refresh them.
#[derive(Debug, Clone)]
pub struct ParsedToken {
    pub claims: Claims,
    pub token: String,
    pub expired: bool,
}

/// Issues, verifies and stores JWTs in cookies/headers.
pub struct TokenService {
    opts: TokenOpts,
}

fn or_default(value: String, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}

fn or_default_duration(value: Duration, default: Duration) -> Duration {
    if value.is_zero() {
        default
    } else {
        value
    }
}

impl TokenService {
    pub fn new(opts: TokenOpts) -> Self {
        let opts = TokenOpts {
            token_duration: or_default_duration(opts.token_duration, DEFAULT_TOKEN_DURATION),
            cookie_duration: or_default_duration(opts.cookie_duration, DEFAULT_COOKIE_DURATION),
            jwt_cookie_name: or_default(opts.jwt_cookie_name, DEFAULT_JWT_COOKIE_NAME),
            jwt_header_key: or_default(opts.jwt_header_key, DEFAULT_JWT_HEADER_KEY),
            xsrf_cookie_name: or_default(opts.xsrf_cookie_name, DEFAULT_XSRF_COOKIE_NAME),
            xsrf_header_key: or_default(opts.xsrf_header_key, DEFAULT_XSRF_HEADER_KEY),
            issuer: or_default(opts.issuer, DEFAULT_ISSUER),
            ..opts
        };
        TokenService { opts }
    }

    /// The effective settings, defaults applied.
    pub fn opts(&self) -> &TokenOpts {
        &self.opts
    }

    pub fn issuer(&self) -> &str {
        &self.opts.issuer
    }

    fn secret(&self, aud: &str) -> Result<String> {
        self.opts.secret_reader.get(aud).map_err(AuthError::Secret)
    }

    /// Sign the claims with the secret of their site.
    pub fn token(&self, claims: &Claims) -> Result<String> {
        let secret = self.secret(&claims.aud)?;
        let token = encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )?;
        Ok(token)
    }

    /// Verify signature and issuer. Expiry is reported, not enforced.
    pub fn parse(&self, token: &str) -> Result<ParsedToken> {
        // the site secret depends on `aud`, so peek at the payload before verifying it
        let mut peek = Validation::new(Algorithm::HS256);
        peek.insecure_disable_signature_validation();
        peek.validate_exp = false;
        peek.validate_aud = false;
        peek.required_spec_claims.clear();
        let unverified = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &peek)?;

        let secret = self.secret(&unverified.claims.aud)?;
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();
        validation.set_issuer(&[self.opts.issuer.as_str()]);

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )?;

        let expired = data.claims.exp != 0 && data.claims.exp < Utc::now().timestamp();
        Ok(ParsedToken {
            claims: data.claims,
            token: token.to_string(),
            expired,
        })
    }

    /// Stamp, sign and attach the session cookies. Returns the claims as signed.
    pub fn set(&self, headers: &mut HeaderMap, claims: Claims) -> Result<Claims> {
        let mut claims = match &self.opts.claims_upd {
            Some(upd) => upd.update(claims),
            None => claims,
        };

        let now = Utc::now().timestamp();
        if claims.jti.is_empty() {
            claims.jti = Uuid::new_v4().to_string();
        }
        if claims.iat == 0 {
            claims.iat = now;
        }
        claims.iss = self.opts.issuer.clone();
        claims.exp = now + self.opts.token_duration.as_secs() as i64;

        let token = self.token(&claims)?;
        let max_age = self.opts.cookie_duration.as_secs() as i64;
        append_cookie(
            headers,
            self.cookie(&self.opts.jwt_cookie_name, token, max_age, true),
        );
        if !self.opts.disable_xsrf {
            append_cookie(
                headers,
                self.cookie(&self.opts.xsrf_cookie_name, claims.jti.clone(), max_age, false),
            );
        }
        Ok(claims)
    }

    /// Read the token from the JWT header, falling back to the cookie.
    /// Cookie tokens must be matched by the XSRF header unless XSRF is disabled.
    pub fn get(&self, headers: &HeaderMap) -> Result<ParsedToken> {
        if let Some(token) = header_str(headers, &self.opts.jwt_header_key) {
            return self.parse(token);
        }

        let jar = CookieJar::from_headers(headers);
        let cookie = jar
            .get(&self.opts.jwt_cookie_name)
            .ok_or_else(|| AuthError::Token("token cookie was not presented".to_string()))?;
        let parsed = self.parse(cookie.value())?;

        if !self.opts.disable_xsrf {
            let xsrf = header_str(headers, &self.opts.xsrf_header_key).unwrap_or("");
            if xsrf != parsed.claims.jti {
                warn!("XSRF header does not match token id");
                return Err(AuthError::Token("xsrf mismatch".to_string()));
            }
        }
        Ok(parsed)
    }

    /// Expire the session cookies.
    pub fn reset(&self, headers: &mut HeaderMap) {
        debug!("Resetting session cookies");
        append_cookie(
            headers,
            self.cookie(&self.opts.jwt_cookie_name, String::new(), 0, true),
        );
        append_cookie(
            headers,
            self.cookie(&self.opts.xsrf_cookie_name, String::new(), 0, false),
        );
    }

    /// Store the OAuth2 handshake in its own short-lived signed cookie.
    pub fn set_handshake(&self, headers: &mut HeaderMap, handshake: Handshake, aud: &str) -> Result<()> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            handshake: Some(handshake),
            jti: Uuid::new_v4().to_string(),
            iss: self.opts.issuer.clone(),
            aud: aud.to_string(),
            iat: now,
            exp: now + HANDSHAKE_DURATION.as_secs() as i64,
            user: None,
        };
        let token = self.token(&claims)?;
        append_cookie(
            headers,
            self.cookie(
                HANDSHAKE_COOKIE_NAME,
                token,
                HANDSHAKE_DURATION.as_secs() as i64,
                true,
            ),
        );
        Ok(())
    }

    /// Read back a live handshake; its `aud` is the site the login started for.
    pub fn get_handshake(&self, headers: &HeaderMap) -> Result<(Handshake, String)> {
        let jar = CookieJar::from_headers(headers);
        let cookie = jar
            .get(HANDSHAKE_COOKIE_NAME)
            .ok_or_else(|| AuthError::Token("handshake cookie was not presented".to_string()))?;
        let parsed = self.parse(cookie.value())?;
        if parsed.expired {
            return Err(AuthError::Token("handshake expired".to_string()));
        }
        let handshake = parsed
            .claims
            .handshake
            .ok_or_else(|| AuthError::Token("no handshake in token".to_string()))?;
        Ok((handshake, parsed.claims.aud))
    }

    pub fn clear_handshake(&self, headers: &mut HeaderMap) {
        append_cookie(
            headers,
            self.cookie(HANDSHAKE_COOKIE_NAME, String::new(), 0, true),
        );
    }

    fn cookie(&self, name: &str, value: String, max_age: i64, http_only: bool) -> Cookie<'static> {
        Cookie::build((name.to_string(), value))
            .path("/")
            .http_only(http_only)
            .secure(self.opts.secure_cookies)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::seconds(max_age))
            .build()
    }
}

fn header_str<'a>(headers: &'a HeaderMap, key: &str) -> Option<&'a str> {
    headers
        .get(key)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
}

fn append_cookie(headers: &mut HeaderMap, cookie: Cookie<'static>) {
    match HeaderValue::from_str(&cookie.to_string()) {
        Ok(value) => {
            headers.append(SET_COOKIE, value);
        }
        Err(e) => warn!("Dropping invalid cookie '{}': {}", cookie.name(), e),
    }
}
