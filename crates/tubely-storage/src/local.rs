use crate::keys::validate_key;
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Local filesystem storage implementation
///
/// Objects are served by the API under `base_url`; presigned URLs carry an `expires` unix
/// timestamp and an HMAC-SHA256 `signature` over the key and expiry, checked by
/// [`LocalStorage::verify_presigned`] on every read.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
    signing_key: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/tubely/assets")
    /// * `base_url` - Base URL for serving files (e.g., "http://localhost:8091/assets")
    /// * `signing_key` - Secret used to sign and verify presigned URLs
    pub async fn new(
        base_path: impl Into<PathBuf>,
        base_url: String,
        signing_key: String,
    ) -> StorageResult<Self> {
        let base_path = base_path.into();

        if signing_key.is_empty() {
            return Err(StorageError::ConfigError(
                "Local storage signing key must not be empty".to_string(),
            ));
        }

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
            signing_key,
        })
    }

    /// Convert storage key to filesystem path, rejecting keys that escape the base directory.
    pub fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        if !validate_key(storage_key) {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }
        Ok(self.base_path.join(storage_key))
    }

    fn generate_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    fn mac(&self, storage_key: &str, expires: i64) -> StorageResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(self.signing_key.as_bytes())
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;
        mac.update(storage_key.as_bytes());
        mac.update(b"\n");
        mac.update(expires.to_string().as_bytes());
        Ok(mac)
    }

    /// Presign `storage_key` as if issued at `issued_at`.
    pub fn presign_at(
        &self,
        storage_key: &str,
        expires_in: Duration,
        issued_at: DateTime<Utc>,
    ) -> StorageResult<String> {
        self.key_to_path(storage_key)?;
        let expires = issued_at.timestamp() + expires_in.as_secs() as i64;
        let signature = hex::encode(self.mac(storage_key, expires)?.finalize().into_bytes());
        Ok(format!(
            "{}?expires={}&signature={}",
            self.generate_url(storage_key),
            expires,
            signature
        ))
    }

    /// Check a presigned request: the signature must match and `now` must not be past `expires`.
    pub fn verify_presigned(
        &self,
        storage_key: &str,
        expires: i64,
        signature: &str,
        now: DateTime<Utc>,
    ) -> StorageResult<()> {
        self.key_to_path(storage_key)?;

        let provided = hex::decode(signature)
            .map_err(|_| StorageError::InvalidSignature(storage_key.to_string()))?;
        self.mac(storage_key, expires)?
            .verify_slice(&provided)
            .map_err(|_| StorageError::InvalidSignature(storage_key.to_string()))?;

        if now.timestamp() > expires {
            return Err(StorageError::Expired(storage_key.to_string()));
        }
        Ok(())
    }

    /// Open a stored object for reading, returning the file and its length.
    pub async fn open(&self, storage_key: &str) -> StorageResult<(fs::File, u64)> {
        let path = self.key_to_path(storage_key)?;
        let file = match fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(storage_key.to_string()))
            }
            Err(e) => return Err(StorageError::IoError(e)),
        };
        let len = file.metadata().await?.len();
        Ok((file, len))
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload_file(
        &self,
        local_path: &Path,
        storage_key: &str,
        _content_type: &str,
    ) -> StorageResult<String> {
        let path = self.key_to_path(storage_key)?;
        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        // Copy next to the destination first so readers never observe a partial object.
        let staging = path.with_extension(format!("{}.partial", Uuid::new_v4().simple()));
        let copied = match fs::copy(local_path, &staging).await {
            Ok(copied) => copied,
            Err(e) => {
                let _ = fs::remove_file(&staging).await;
                return Err(StorageError::UploadFailed(format!(
                    "Failed to copy {} to {}: {}",
                    local_path.display(),
                    staging.display(),
                    e
                )));
            }
        };

        let finalize = async {
            fs::File::open(&staging).await?.sync_all().await?;
            fs::rename(&staging, &path).await
        };
        if let Err(e) = finalize.await {
            let _ = fs::remove_file(&staging).await;
            return Err(StorageError::UploadFailed(format!(
                "Failed to finalize {}: {}",
                path.display(),
                e
            )));
        }

        tracing::info!(
            path = %path.display(),
            key = %storage_key,
            size_bytes = copied,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(self.generate_url(storage_key))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let path = self.key_to_path(storage_key)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(path = %path.display(), key = %storage_key, "Local storage delete successful");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "Failed to delete file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn presigned_get_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        self.presign_at(storage_key, expires_in, Utc::now())
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(storage_key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    async fn content_length(&self, storage_key: &str) -> StorageResult<u64> {
        let path = self.key_to_path(storage_key)?;
        match fs::metadata(&path).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(storage_key.to_string()))
            }
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use tempfile::tempdir;

    const BASE_URL: &str = "http://localhost:8091/assets";

    async fn storage(dir: &Path) -> LocalStorage {
        LocalStorage::new(
            dir.join("assets"),
            BASE_URL.to_string(),
            "signing-secret".to_string(),
        )
        .await
        .unwrap()
    }

    fn query_param<'a>(url: &'a str, name: &str) -> &'a str {
        let query = url.split_once('?').unwrap().1;
        query
            .split('&')
            .find_map(|pair| pair.strip_prefix(&format!("{}=", name)))
            .unwrap()
    }

    #[tokio::test]
    async fn test_upload_file_copies_and_keeps_source() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;
        let source = dir.path().join("source.mp4");
        fs::write(&source, b"fake mp4 bytes").await.unwrap();

        let url = storage
            .upload_file(&source, "landscape/abc123.mp4", "video/mp4")
            .await
            .unwrap();

        assert_eq!(url, format!("{}/landscape/abc123.mp4", BASE_URL));
        assert!(source.exists());
        assert!(storage.exists("landscape/abc123.mp4").await.unwrap());
        assert_eq!(
            storage.content_length("landscape/abc123.mp4").await.unwrap(),
            14
        );

        // No staging files are left next to the object.
        let mut entries = fs::read_dir(dir.path().join("assets/landscape")).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        assert_eq!(names, vec!["abc123.mp4".to_string()]);
    }

    #[tokio::test]
    async fn test_upload_is_idempotent_for_same_key() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;
        let source = dir.path().join("source.mp4");
        fs::write(&source, b"same content").await.unwrap();

        storage
            .upload_file(&source, "other/k.mp4", "video/mp4")
            .await
            .unwrap();
        storage
            .upload_file(&source, "other/k.mp4", "video/mp4")
            .await
            .unwrap();

        let (_, len) = storage.open("other/k.mp4").await.unwrap();
        assert_eq!(len, 12);
    }

    #[tokio::test]
    async fn test_upload_missing_source_fails() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;
        let result = storage
            .upload_file(&dir.path().join("missing.mp4"), "other/x.mp4", "video/mp4")
            .await;
        assert!(matches!(result, Err(StorageError::UploadFailed(_))));
        assert!(!storage.exists("other/x.mp4").await.unwrap());
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let result = storage.delete("../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.exists("/etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_delete_nonexistent_is_ok() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;
        assert!(storage.delete("portrait/nothing.mp4").await.is_ok());
    }

    #[tokio::test]
    async fn test_presigned_urls_honour_their_own_expiry() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;
        let key = "landscape/abc123.mp4";
        let expiry = Duration::from_secs(3600);

        let first_issued = Utc::now();
        let second_issued = first_issued + ChronoDuration::minutes(30);
        let first = storage.presign_at(key, expiry, first_issued).unwrap();
        let second = storage.presign_at(key, expiry, second_issued).unwrap();
        assert_ne!(first, second);

        for (url, issued) in [(&first, first_issued), (&second, second_issued)] {
            let expires: i64 = query_param(url, "expires").parse().unwrap();
            let signature = query_param(url, "signature");
            assert_eq!(expires, issued.timestamp() + 3600);

            let just_before = issued + ChronoDuration::seconds(3599);
            assert!(storage
                .verify_presigned(key, expires, signature, just_before)
                .is_ok());

            let just_after = issued + ChronoDuration::seconds(3601);
            assert!(matches!(
                storage.verify_presigned(key, expires, signature, just_after),
                Err(StorageError::Expired(_))
            ));
        }

        // The first URL is already dead while the second is still valid.
        let check_at = first_issued + ChronoDuration::seconds(3700);
        let first_expires: i64 = query_param(&first, "expires").parse().unwrap();
        let second_expires: i64 = query_param(&second, "expires").parse().unwrap();
        assert!(storage
            .verify_presigned(key, first_expires, query_param(&first, "signature"), check_at)
            .is_err());
        assert!(storage
            .verify_presigned(key, second_expires, query_param(&second, "signature"), check_at)
            .is_ok());
    }

    #[tokio::test]
    async fn test_tampered_presigned_url_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;
        let key = "portrait/abc.mp4";
        let now = Utc::now();
        let url = storage
            .presign_at(key, Duration::from_secs(60), now)
            .unwrap();
        let expires: i64 = query_param(&url, "expires").parse().unwrap();
        let signature = query_param(&url, "signature");

        // Extending the expiry invalidates the signature.
        assert!(matches!(
            storage.verify_presigned(key, expires + 3600, signature, now),
            Err(StorageError::InvalidSignature(_))
        ));
        // A signature for one key does not open another.
        assert!(matches!(
            storage.verify_presigned("portrait/other.mp4", expires, signature, now),
            Err(StorageError::InvalidSignature(_))
        ));
        assert!(matches!(
            storage.verify_presigned(key, expires, "not-hex", now),
            Err(StorageError::InvalidSignature(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_signing_key_rejected() {
        let dir = tempdir().unwrap();
        let result = LocalStorage::new(dir.path(), BASE_URL.to_string(), String::new()).await;
        assert!(matches!(result, Err(StorageError::ConfigError(_))));
    }
}
