use serde::{Deserialize, Serialize};

use crate::models::User;

/// Token payload. `aud` selects the site secret, `jti` doubles as the XSRF value.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handshake: Option<Handshake>,
    #[serde(default)]
    pub jti: String,
    #[serde(default)]
    pub iss: String,
    #[serde(default)]
    pub aud: String,
    #[serde(default)]
    pub iat: i64,
    #[serde(default)]
    pub exp: i64,
}

/// State carried between an OAuth2 login redirect and its callback.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Handshake {
    pub state: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub from: String,
}

impl Claims {
    /// Session claims for a user on the given site.
    pub fn for_user(user: User, aud: &str) -> Self {
        Claims {
            user: Some(user),
            aud: aud.to_string(),
            ..Default::default()
        }
    }
}
