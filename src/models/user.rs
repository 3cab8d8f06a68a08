use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The User struct represents an authenticated user, as carried in the token claims.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct User {
    pub name: String,
    /// Provider-scoped identifier, e.g. "github_1234".
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub picture: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ip: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, String>,
}

impl User {
    /// Construct a new User with an optional picture and attributes.
    pub fn new(
        name: String,
        id: String,
        picture: Option<String>,
        attributes: Option<HashMap<String, String>>,
    ) -> Self {
        User {
            name,
            id,
            picture: picture.unwrap_or_default(),
            email: String::new(),
            ip: String::new(),
            attributes: attributes.unwrap_or_default(),
        }
    }
}
