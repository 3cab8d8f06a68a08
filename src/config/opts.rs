use std::sync::Arc;
use std::time::Duration;

use crate::avatar::AvatarStore;
use crate::middleware::Validator;
use crate::token::{ClaimsUpdater, SecretReader};

/// Full set of parameters to build a `Service`.
///
/// Only `secret_reader` is mandatory. Empty names, zero durations and an empty
/// issuer fall back to the token service defaults (`JWT`, `X-JWT`,
/// `XSRF-TOKEN`, `X-XSRF-TOKEN`, 15 minutes, 31 days, "go-pkgz/auth").
#[derive(Clone, Default)]
pub struct Opts {
    /// Returns the signing secret for a site id (aud).
    pub secret_reader: Option<Arc<dyn SecretReader>>,
    /// Adds or modifies values stored in the token.
    pub claims_upd: Option<Arc<dyn ClaimsUpdater>>,
    pub secure_cookies: bool,
    /// Token TTL, refreshed automatically while the cookie lives.
    pub token_duration: Duration,
    /// TTL of the cookie storing the token.
    pub cookie_duration: Duration,
    /// Useful for testing/debugging only.
    pub disable_xsrf: bool,

    pub jwt_cookie_name: String,
    pub jwt_header_key: String,
    pub xsrf_cookie_name: String,
    pub xsrf_header_key: String,

    /// Value of the `iss` claim, usually the application name.
    pub issuer: String,

    /// Root url of the service, e.g. http://auth.example.com
    pub url: String,
    /// Rejects some valid tokens with application logic.
    pub validator: Option<Arc<dyn Validator>>,
    /// When set, basic auth "dev:<dev_passwd>" is accepted.
    pub dev_passwd: String,

    pub avatar_store: Option<Arc<dyn AvatarStore>>,
}
