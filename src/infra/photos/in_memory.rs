use crate::core::moderation::{Photo, PhotoStore, StoreError};
use async_trait::async_trait;
use dashmap::DashMap;

/// Photo store kept in process memory. Pairs with `InMemoryMemorialStore`.
pub struct InMemoryPhotoStore {
    photos: DashMap<String, Photo>,
}

impl InMemoryPhotoStore {
    pub fn new() -> Self {
        Self {
            photos: DashMap::new(),
        }
    }
}

impl Default for InMemoryPhotoStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PhotoStore for InMemoryPhotoStore {
    async fn put_photo(&self, key: &str, photo: Photo) -> Result<(), StoreError> {
        self.photos.insert(key.to_string(), photo);
        Ok(())
    }

    async fn get_photo(&self, key: &str) -> Result<Option<Photo>, StoreError> {
        Ok(self.photos.get(key).map(|photo| photo.clone()))
    }

    async fn delete_photo(&self, key: &str) -> Result<(), StoreError> {
        self.photos.remove(key);
        Ok(())
    }
}
