//! Request authentication for arbitrary routes.

pub mod authenticator;
pub mod validator;

pub use authenticator::{auth, trace, Authenticator, DEV_BASIC_USER};
pub use validator::{Validator, ValidatorFunc};
