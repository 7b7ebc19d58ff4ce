//! Object storage for community images, one object per user, overwritten in
//! place. Speaks the storage service's HTTP API directly.

use crate::db;
use crate::error::StoreError;

pub const BUCKET: &str = "community_profile_pictures";

#[derive(Debug, Clone)]
pub struct Storage {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
}

/// The per-user object key is the sole identifier for a community image.
pub fn object_key(user_id: &str) -> String {
    format!("{user_id}/space.png")
}

impl Storage {
    pub fn new(base_url: &str, service_key: &str) -> Self {
        Storage {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            service_key: service_key.to_owned(),
        }
    }

    pub fn public_url(&self, user_id: &str) -> String {
        format!("{}/object/public/{BUCKET}/{}", self.base_url, object_key(user_id))
    }

    /// Public URL with a cache-busting timestamp, for clients that would
    /// otherwise keep showing the previous upload.
    pub fn image_url(&self, user_id: &str) -> String {
        format!("{}?t={}", self.public_url(user_id), db::now_millis())
    }

    /// Upload-with-overwrite; returns the public URL of the stored object.
    pub async fn save_image(&self, user_id: &str, image: Vec<u8>) -> Result<String, StoreError> {
        let url = format!("{}/object/{BUCKET}/{}", self.base_url, object_key(user_id));
        let response = self.http.post(url)
            .bearer_auth(&self.service_key)
            .header("x-upsert", "true")
            .header(reqwest::header::CONTENT_TYPE, "image/png")
            .body(image)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StoreError::Rejected(response.status().as_u16()));
        }
        Ok(self.public_url(user_id))
    }

    /// Idempotent: removing an object that is not there counts as removed.
    pub async fn delete_image(&self, user_id: &str) -> Result<(), StoreError> {
        let url = format!("{}/object/{BUCKET}/{}", self.base_url, object_key(user_id));
        let response = self.http.delete(url)
            .bearer_auth(&self.service_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() && status.as_u16() != 404 {
            return Err(StoreError::Rejected(status.as_u16()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_key_is_per_user() {
        assert_eq!(object_key("u-1"), "u-1/space.png");
    }

    #[test]
    fn public_url_targets_the_bucket() {
        let storage = Storage::new("http://localhost:54321/storage/v1/", "key");
        assert_eq!(
            storage.public_url("u-1"),
            "http://localhost:54321/storage/v1/object/public/community_profile_pictures/u-1/space.png"
        );
    }

    #[test]
    fn image_url_carries_a_cache_buster() {
        let storage = Storage::new("http://localhost:54321/storage/v1", "key");
        let url = storage.image_url("u-1");
        let (base, query) = url.split_once("?t=").expect("cache-bust query present");
        assert_eq!(base, storage.public_url("u-1"));
        assert!(query.parse::<i64>().is_ok());
    }
}
