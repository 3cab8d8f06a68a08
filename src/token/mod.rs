//! JWT issuing and verification, plus the session and XSRF cookie mechanics.

pub mod claims;
pub mod secret;
pub mod service;

pub use claims::{Claims, Handshake};
pub use secret::{ClaimsUpdFunc, ClaimsUpdater, SecretFunc, SecretReader};
pub use service::{ParsedToken, TokenOpts, TokenService, DEFAULT_ISSUER};
