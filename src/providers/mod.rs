pub mod base;
pub mod dev_provider;
pub mod oauth2_provider;
pub mod registry;

// Re-export from base.rs so we can do "use crate::providers::*;"
pub use base::*;
pub use registry::ProviderRegistry;
