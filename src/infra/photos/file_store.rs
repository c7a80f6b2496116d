use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::core::moderation::{is_valid_photo_key, Photo, PhotoStore, StoreError};

/// Sidecar written next to each photo so it can be served with the right type.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PhotoMeta {
    content_type: String,
}

/// Photo store on the local filesystem: `<dir>/<key>` holds the bytes and
/// `<dir>/<key>.json` the content type.
pub struct FilePhotoStore {
    dir: PathBuf,
}

impl FilePhotoStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn paths(&self, key: &str) -> (PathBuf, PathBuf) {
        (
            self.dir.join(key),
            self.dir.join(format!("{}.json", key)),
        )
    }
}

fn io_error(e: std::io::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

#[async_trait]
impl PhotoStore for FilePhotoStore {
    async fn put_photo(&self, key: &str, photo: Photo) -> Result<(), StoreError> {
        if !is_valid_photo_key(key) {
            return Err(StoreError::Backend(format!("invalid photo key {:?}", key)));
        }

        fs::create_dir_all(&self.dir).await.map_err(io_error)?;

        let (data_path, meta_path) = self.paths(key);
        let meta = serde_json::to_vec(&PhotoMeta {
            content_type: photo.content_type,
        })
        .map_err(|e| StoreError::Backend(e.to_string()))?;

        fs::write(&data_path, &photo.bytes).await.map_err(io_error)?;
        fs::write(&meta_path, meta).await.map_err(io_error)
    }

    async fn get_photo(&self, key: &str) -> Result<Option<Photo>, StoreError> {
        if !is_valid_photo_key(key) {
            return Ok(None);
        }

        let (data_path, meta_path) = self.paths(key);
        let bytes = match fs::read(&data_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(e)),
        };

        // A missing sidecar only loses the content type, not the photo.
        let content_type = match fs::read(&meta_path).await {
            Ok(raw) => serde_json::from_slice::<PhotoMeta>(&raw)
                .map(|meta| meta.content_type)
                .unwrap_or_else(|_| "application/octet-stream".to_string()),
            Err(e) if e.kind() == ErrorKind::NotFound => "application/octet-stream".to_string(),
            Err(e) => return Err(io_error(e)),
        };

        Ok(Some(Photo {
            bytes,
            content_type,
        }))
    }

    async fn delete_photo(&self, key: &str) -> Result<(), StoreError> {
        if !is_valid_photo_key(key) {
            return Ok(());
        }

        let (data_path, meta_path) = self.paths(key);
        for path in [data_path, meta_path] {
            match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(io_error(e)),
            }
        }
        Ok(())
    }
}
