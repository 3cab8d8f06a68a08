//! Library exports for authmux, shared between the binary and tests.

pub mod avatar;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod middleware;
pub mod models;
pub mod providers;
pub mod service;
pub mod startup;
pub mod token;
pub mod utils;

pub use config::Opts;
pub use error::{AuthError, Result};
pub use service::Service;
