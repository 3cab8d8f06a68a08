use std::sync::Arc;
use std::time::Duration;

use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::logging::LoggingConfig;
use super::opts::Opts;
use crate::token::SecretFunc;

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0: listener, logging, auth settings and providers.
#[derive(Deserialize, Serialize, Debug, JsonSchema)]
pub struct ConfigV1 {
    pub bind_address: String,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub auth: AuthSettings,
    #[serde(default)]
    pub providers: Vec<ProviderSettings>,
    #[serde(default)]
    pub avatar: AvatarSettings,
}

/// Token and cookie settings. Durations are in seconds; 0 keeps the default.
#[derive(Deserialize, Serialize, Debug, Default, JsonSchema)]
pub struct AuthSettings {
    pub secret: String,
    #[serde(default)]
    pub token_duration: u64,
    #[serde(default)]
    pub cookie_duration: u64,
    #[serde(default)]
    pub secure_cookies: bool,
    #[serde(default)]
    pub disable_xsrf: bool,
    #[serde(default)]
    pub jwt_cookie_name: String,
    #[serde(default)]
    pub jwt_header_key: String,
    #[serde(default)]
    pub xsrf_cookie_name: String,
    #[serde(default)]
    pub xsrf_header_key: String,
    #[serde(default)]
    pub issuer: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub dev_passwd: String,
}

/// A provider to register at startup.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct ProviderSettings {
    pub name: String,
    #[serde(default)]
    pub cid: String,
    #[serde(default)]
    pub csecret: String,
}

/// Enables the in-process avatar store and the `/avatar` mount.
#[derive(Deserialize, Serialize, Debug, Default, JsonSchema)]
pub struct AvatarSettings {
    #[serde(default)]
    pub enabled: bool,
}

impl AuthSettings {
    /// Library options from the file settings. One shared secret serves every site;
    /// an empty secret leaves the secret reader unset.
    pub fn to_opts(&self) -> Opts {
        let secret_reader = if self.secret.is_empty() {
            None
        } else {
            let secret = self.secret.clone();
            Some(Arc::new(SecretFunc::new(move |_: &str| Ok(secret.clone())))
                as Arc<dyn crate::token::SecretReader>)
        };

        Opts {
            secret_reader,
            secure_cookies: self.secure_cookies,
            token_duration: Duration::from_secs(self.token_duration),
            cookie_duration: Duration::from_secs(self.cookie_duration),
            disable_xsrf: self.disable_xsrf,
            jwt_cookie_name: self.jwt_cookie_name.clone(),
            jwt_header_key: self.jwt_header_key.clone(),
            xsrf_cookie_name: self.xsrf_cookie_name.clone(),
            xsrf_header_key: self.xsrf_header_key.clone(),
            issuer: self.issuer.clone(),
            url: self.url.clone(),
            dev_passwd: self.dev_passwd.clone(),
            ..Default::default()
        }
    }
}

/// Extract a v1 config from any figment.
pub fn extract_config(figment: Figment) -> Result<ConfigV1, String> {
    match figment.extract::<Config>() {
        Ok(Config::ConfigV1(c)) => Ok(c),
        Err(e) => Err(format!("Error loading configuration: {}", e)),
    }
}

/// Load config from "./config.yaml", overridden by `AUTHMUX_` environment
/// variables (`AUTHMUX_AUTH__SECRET` sets `auth.secret`).
pub fn load_config() -> Result<ConfigV1, String> {
    extract_config(
        Figment::new()
            .merge(Yaml::file("./config.yaml"))
            .merge(Env::prefixed("AUTHMUX_").split("__")),
    )
}

/// Print the JSON schema for the configuration to stdout.
pub fn print_schema() -> Result<(), String> {
    let schema = schema_for!(Config);
    let rendered = serde_json::to_string_pretty(&schema).map_err(|e| e.to_string())?;
    println!("{}", rendered);
    Ok(())
}
