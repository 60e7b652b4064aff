//! Supabase Storage client for slide, banner and prescription images.
//!
//! Talks to the Storage REST API directly with `reqwest`, authenticated with
//! the service key. Objects are public, so the stored URL is built locally.

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::config::SupabaseConfig;

/// Errors that can occur when talking to object storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Storage returned an error response.
    #[error("storage API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Object path or key could not be used.
    #[error("invalid storage request: {0}")]
    Invalid(String),
}

/// Storage buckets used by the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Slides,
    CategoryBanners,
    ShapeBanners,
    PrescriptionImages,
}

impl Bucket {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Slides => "slides",
            Self::CategoryBanners => "category-banners",
            Self::ShapeBanners => "shape-banners",
            Self::PrescriptionImages => "prescription-images",
        }
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Object storage client.
#[derive(Clone)]
pub struct StorageClient {
    client: reqwest::Client,
    base_url: Url,
}

impl StorageClient {
    /// Create a new storage client.
    ///
    /// # Errors
    ///
    /// Returns error if the key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &SupabaseConfig) -> Result<Self, StorageError> {
        let key = config.service_key.expose_secret();
        let mut headers = HeaderMap::new();

        let mut bearer = HeaderValue::from_str(&format!("Bearer {key}"))
            .map_err(|e| StorageError::Invalid(format!("invalid service key: {e}")))?;
        bearer.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, bearer);

        let mut api_key = HeaderValue::from_str(key)
            .map_err(|e| StorageError::Invalid(format!("invalid service key: {e}")))?;
        api_key.set_sensitive(true);
        headers.insert("apikey", api_key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.clone(),
        })
    }

    /// Upload an object, replacing any existing object at `path`.
    ///
    /// Returns the public URL of the stored object.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or storage rejects the upload.
    #[instrument(skip(self, bytes), fields(bucket = %bucket, size = bytes.len()))]
    pub async fn upload(
        &self,
        bucket: Bucket,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let url = self.object_url(bucket, path)?;

        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await?;
        Self::check(response).await?;

        tracing::info!(bucket = %bucket, path, "Uploaded object");
        self.public_url(bucket, path)
    }

    /// Delete an object. Deleting a missing object is not an error.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or storage rejects the delete.
    #[instrument(skip(self), fields(bucket = %bucket))]
    pub async fn delete(&self, bucket: Bucket, path: &str) -> Result<(), StorageError> {
        let url = self.object_url(bucket, path)?;
        let response = self.client.delete(url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            tracing::warn!(bucket = %bucket, path, "Object already gone");
            return Ok(());
        }
        Self::check(response).await
    }

    /// Public URL for an object in a public bucket.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Invalid` if the path is empty or escapes the bucket.
    pub fn public_url(&self, bucket: Bucket, path: &str) -> Result<String, StorageError> {
        let url = self.build_url(&["storage", "v1", "object", "public", bucket.name()], path)?;
        Ok(url.into())
    }

    /// Whether `url` points at an object in `bucket` of this project.
    ///
    /// Used to accept only URLs the storefront handed out itself.
    #[must_use]
    pub fn is_public_url(&self, bucket: Bucket, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        if parsed.origin() != self.base_url.origin() {
            return false;
        }
        let prefix = ["storage", "v1", "object", "public", bucket.name()];
        let Some(segments) = parsed.path_segments() else {
            return false;
        };
        let segments: Vec<&str> = segments.collect();
        match segments.strip_prefix(prefix.as_slice()) {
            Some(object) if !object.is_empty() => object_segments(&object.join("/")).is_ok(),
            _ => false,
        }
    }

    fn object_url(&self, bucket: Bucket, path: &str) -> Result<Url, StorageError> {
        self.build_url(&["storage", "v1", "object", bucket.name()], path)
    }

    fn build_url(&self, prefix: &[&str], path: &str) -> Result<Url, StorageError> {
        let segments = object_segments(path)?;
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| StorageError::Invalid("base URL cannot have a path".to_string()))?
            .pop_if_empty()
            .extend(prefix)
            .extend(segments);
        Ok(url)
    }

    async fn check(response: reqwest::Response) -> Result<(), StorageError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let message = response.text().await.unwrap_or_default();
        Err(StorageError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Split an object path into URL segments, rejecting traversal.
fn object_segments(path: &str) -> Result<Vec<&str>, StorageError> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return Err(StorageError::Invalid("empty object path".to_string()));
    }
    if segments.iter().any(|s| *s == "." || *s == "..") {
        return Err(StorageError::Invalid(format!("invalid object path: {path}")));
    }
    Ok(segments)
}

/// Object name for an upload: `<prefix>/<millis>-<uuid>.<ext>`.
///
/// The extension is taken from the client's file name and lowercased; names
/// without a usable extension fall back to `bin`.
#[must_use]
pub fn object_path(prefix: &str, file_name: Option<&str>) -> String {
    let extension = file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "bin".to_string());

    format!(
        "{prefix}/{}-{}.{extension}",
        chrono::Utc::now().timestamp_millis(),
        uuid::Uuid::new_v4().simple()
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn client() -> StorageClient {
        StorageClient::new(&SupabaseConfig {
            url: Url::parse("https://abcd.supabase.co").unwrap(),
            service_key: SecretString::from("service-role-key"),
        })
        .unwrap()
    }

    #[test]
    fn test_bucket_names() {
        assert_eq!(Bucket::Slides.name(), "slides");
        assert_eq!(Bucket::CategoryBanners.name(), "category-banners");
        assert_eq!(Bucket::ShapeBanners.name(), "shape-banners");
        assert_eq!(Bucket::PrescriptionImages.name(), "prescription-images");
    }

    #[test]
    fn test_public_url() {
        let url = client()
            .public_url(Bucket::ShapeBanners, "round/banner.webp")
            .unwrap();
        assert_eq!(
            url,
            "https://abcd.supabase.co/storage/v1/object/public/shape-banners/round/banner.webp"
        );
    }

    #[test]
    fn test_object_url_escapes_segments() {
        let url = client()
            .object_url(Bucket::Slides, "home/summer sale.jpg")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://abcd.supabase.co/storage/v1/object/slides/home/summer%20sale.jpg"
        );
    }

    #[test]
    fn test_rejects_traversal_and_empty_paths() {
        let client = client();
        assert!(client.public_url(Bucket::Slides, "../secrets").is_err());
        assert!(client.public_url(Bucket::Slides, "").is_err());
        assert!(client.public_url(Bucket::Slides, "///").is_err());
    }

    #[test]
    fn test_object_path_extension() {
        let path = object_path("slides", Some("Hero.JPG"));
        assert!(path.starts_with("slides/"));
        assert!(path.ends_with(".jpg"));

        assert!(object_path("rx", None).ends_with(".bin"));
        assert!(object_path("rx", Some("noext")).ends_with(".bin"));
        assert!(object_path("rx", Some("x.../etc")).ends_with(".bin"));
    }

    #[test]
    fn test_is_public_url() {
        let client = client();
        let url = client
            .public_url(Bucket::PrescriptionImages, "guest/1-abc.png")
            .unwrap();
        assert!(client.is_public_url(Bucket::PrescriptionImages, &url));
        assert!(!client.is_public_url(Bucket::Slides, &url));
        assert!(!client.is_public_url(
            Bucket::PrescriptionImages,
            "https://evil.example/storage/v1/object/public/prescription-images/x.png"
        ));
        assert!(!client.is_public_url(
            Bucket::PrescriptionImages,
            "https://abcd.supabase.co/storage/v1/object/public/prescription-images/"
        ));
        assert!(!client.is_public_url(Bucket::PrescriptionImages, "not a url"));
    }

    #[test]
    fn test_is_public_url_needs_the_full_prefix() {
        let client = client();
        for url in [
            "https://abcd.supabase.co/storage/v1/object/public/prescription-images",
            "https://abcd.supabase.co/storage/v1/object/public",
            "https://abcd.supabase.co/storage",
            "https://abcd.supabase.co/",
            "https://abcd.supabase.co/storage/v1/object/prescription-images/x.png",
        ] {
            assert!(!client.is_public_url(Bucket::PrescriptionImages, url), "{url}");
        }
        assert!(client.is_public_url(
            Bucket::PrescriptionImages,
            "https://abcd.supabase.co/storage/v1/object/public/prescription-images/guest/x.png"
        ));
    }
}
