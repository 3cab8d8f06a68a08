use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::AvatarStore;

/// In-process avatar store. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    images: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Avatar ids are stable per user, so a new picture replaces the old one.
    pub fn avatar_id(user_id: &str) -> String {
        format!(
            "{}.image",
            Uuid::new_v5(&Uuid::NAMESPACE_OID, user_id.as_bytes()).simple()
        )
    }
}

#[async_trait]
impl AvatarStore for MemoryStore {
    async fn put(&self, user_id: &str, image: Vec<u8>) -> Result<String, String> {
        if image.is_empty() {
            return Err(format!("empty avatar image for user {}", user_id));
        }
        let avatar_id = Self::avatar_id(user_id);
        debug!("Storing avatar '{}' for user '{}'", avatar_id, user_id);
        self.images.write().await.insert(avatar_id.clone(), image);
        Ok(avatar_id)
    }

    async fn get(&self, avatar_id: &str) -> Result<Option<Vec<u8>>, String> {
        Ok(self.images.read().await.get(avatar_id).cloned())
    }
}
