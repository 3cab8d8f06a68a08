use async_trait::async_trait;

/// The AvatarStore trait abstracts avatar persistence (save and load by id).
#[async_trait]
pub trait AvatarStore: Send + Sync {
    /// Save the image for a user id and return the avatar id it can be fetched by.
    async fn put(&self, user_id: &str, image: Vec<u8>) -> Result<String, String>;
    /// Load an image by avatar id. `Ok(None)` when nothing is stored under that id.
    async fn get(&self, avatar_id: &str) -> Result<Option<Vec<u8>>, String>;
}
