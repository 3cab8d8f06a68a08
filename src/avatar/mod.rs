//! Avatar images: a pluggable store and the proxy serving them under `/avatar`.

pub mod memory_store;
pub mod proxy;
pub mod store;

pub use memory_store::MemoryStore;
pub use proxy::{AvatarProxy, AVATAR_ROUTE_PATH};
pub use store::AvatarStore;
