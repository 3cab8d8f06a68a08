//! Composition root: token service, provider registry, middleware and avatar proxy.

use std::sync::Arc;

use axum::Router;
use tracing::{info, warn};

use crate::avatar::AvatarProxy;
use crate::config::Opts;
use crate::dispatch;
use crate::error::{AuthError, Result};
use crate::middleware::Authenticator;
use crate::providers::{provider_factory, Params, ProviderRegistry, ProviderService};
use crate::token::{TokenOpts, TokenService, DEFAULT_ISSUER};

/// Main auth object, built once at startup and shared by the handlers.
///
/// Cloning is cheap and every clone shares the same registry.
#[derive(Clone)]
pub struct Service {
    opts: Opts,
    token_service: Arc<TokenService>,
    providers: ProviderRegistry,
    authenticator: Authenticator,
    avatar_proxy: Option<Arc<AvatarProxy>>,
    issuer: String,
}

impl Service {
    /// Build the service. Fails only when no secret reader is configured.
    pub fn new(opts: Opts) -> Result<Self> {
        let secret_reader = opts
            .secret_reader
            .clone()
            .ok_or(AuthError::MissingSecretReader)?;

        let issuer = if opts.issuer.is_empty() {
            DEFAULT_ISSUER.to_string()
        } else {
            opts.issuer.clone()
        };

        let token_service = Arc::new(TokenService::new(TokenOpts {
            secret_reader,
            claims_upd: opts.claims_upd.clone(),
            secure_cookies: opts.secure_cookies,
            token_duration: opts.token_duration,
            cookie_duration: opts.cookie_duration,
            disable_xsrf: opts.disable_xsrf,
            jwt_cookie_name: opts.jwt_cookie_name.clone(),
            jwt_header_key: opts.jwt_header_key.clone(),
            xsrf_cookie_name: opts.xsrf_cookie_name.clone(),
            xsrf_header_key: opts.xsrf_header_key.clone(),
            issuer: issuer.clone(),
        }));

        let providers = ProviderRegistry::new();
        let authenticator = Authenticator::new(
            token_service.clone(),
            opts.validator.clone(),
            opts.dev_passwd.clone(),
            providers.clone(),
        );

        let avatar_proxy = opts
            .avatar_store
            .clone()
            .map(|store| Arc::new(AvatarProxy::new(store, &opts.url)));

        info!(
            "Auth service for issuer '{}' ready (avatar proxy: {}, dev bypass: {})",
            issuer,
            avatar_proxy.is_some(),
            !opts.dev_passwd.is_empty()
        );

        Ok(Service {
            opts,
            token_service,
            providers,
            authenticator,
            avatar_proxy,
            issuer,
        })
    }

    /// Register a provider of a known kind. Names are case-insensitive;
    /// unknown kinds are skipped with a warning.
    pub fn add_provider(&self, name: &str, cid: &str, csecret: &str) {
        let kind = name.to_lowercase();
        let Some(factory) = provider_factory(&kind) else {
            warn!("Provider kind '{}' is not supported, skipping", name);
            return;
        };

        let provider = factory(self.params(cid, csecret));
        info!("Registered provider '{}' (kind '{}')", provider.name, kind);
        self.providers.push(provider);
    }

    /// Register a provider built outside the factory table.
    pub fn add_custom_provider(&self, provider: ProviderService) {
        info!("Registered custom provider '{}'", provider.name);
        self.providers.push(provider);
    }

    /// Shared constructor arguments for providers of this service.
    pub fn params(&self, cid: &str, csecret: &str) -> Params {
        Params {
            url: self.opts.url.clone(),
            token_service: self.token_service.clone(),
            issuer: self.issuer.clone(),
            avatar_proxy: self.avatar_proxy.clone(),
            cid: cid.to_string(),
            csecret: csecret.to_string(),
        }
    }

    /// First registered provider with this name.
    pub fn provider(&self, name: &str) -> Result<ProviderService> {
        self.providers
            .find(name)
            .ok_or_else(|| AuthError::ProviderNotFound(name.to_string()))
    }

    pub fn providers(&self) -> Vec<String> {
        self.providers.names()
    }

    /// Middleware state for `axum::middleware::from_fn_with_state`.
    /// Sees providers registered after this call too.
    pub fn middleware(&self) -> Authenticator {
        self.authenticator.clone()
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn token_service(&self) -> Arc<TokenService> {
        self.token_service.clone()
    }

    pub fn avatar_proxy(&self) -> Option<Arc<AvatarProxy>> {
        self.avatar_proxy.clone()
    }

    pub(crate) fn registry(&self) -> &ProviderRegistry {
        &self.providers
    }

    /// Routers for the auth mount and the avatar mount, in that order.
    pub fn handlers(&self) -> (Router, Router) {
        (
            dispatch::auth_router(self.clone()),
            dispatch::avatar_router(self.avatar_proxy.clone()),
        )
    }
}
