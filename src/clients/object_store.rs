//! Blob storage for product images.
//!
//! `S3ObjectStore` uploads to Amazon S3; `LocalObjectStore` writes the same
//! bucket/key layout beneath a directory on disk (`base_path/{bucket}/{key}`).

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};
use thiserror::Error;
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::debug;
use uuid::Uuid;

const MAX_OBJECT_KEY_LEN: usize = 1024;
const IMAGE_CONTENT_TYPE: &str = "image/jpeg";

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("invalid object key `{0}`")]
    InvalidObjectKey(String),
    #[error("upload of `{key}` to bucket `{bucket}` failed: {source}")]
    S3 {
        bucket: String,
        key: String,
        #[source]
        source: Box<aws_sdk_s3::Error>,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type ObjectStoreResult<T> = Result<T, ObjectStoreError>;

/// Write-only blob storage capability.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `payload` at `bucket/key`, replacing any existing object.
    async fn upload(&self, payload: Bytes, bucket: &str, key: &str) -> ObjectStoreResult<()>;
}

/// Public URL of an object in S3's virtual-hosted style.
pub fn public_url(bucket: &str, key: &str) -> String {
    format!("https://{}.s3.amazonaws.com/{}", bucket, key)
}

/// Amazon S3 backed object store.
#[derive(Clone)]
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn upload(&self, payload: Bytes, bucket: &str, key: &str) -> ObjectStoreResult<()> {
        let digest = md5::compute(&payload);
        let size = payload.len();

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(IMAGE_CONTENT_TYPE)
            .content_md5(general_purpose::STANDARD.encode(digest.0))
            .body(payload.into())
            .send()
            .await
            .map_err(|err| ObjectStoreError::S3 {
                bucket: bucket.to_string(),
                key: key.to_string(),
                source: Box::new(err.into()),
            })?;

        debug!(bucket, key, size, "uploaded object to s3");
        Ok(())
    }
}

/// Filesystem backed object store used by the local backend.
#[derive(Clone, Debug)]
pub struct LocalObjectStore {
    base_path: PathBuf,
}

impl LocalObjectStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Rejects keys that could escape the bucket directory. Dots are fine
    /// inside a segment (`Wait....jpg`); only `.` and `..` segments are not.
    fn ensure_key_safe(key: &str) -> ObjectStoreResult<()> {
        let unsafe_key = key.is_empty()
            || key.len() > MAX_OBJECT_KEY_LEN
            || key.starts_with('/')
            || key.split('/').any(|seg| seg == "." || seg == "..")
            || key.bytes().any(|b| b.is_ascii_control() || b == b'\\');
        if unsafe_key {
            return Err(ObjectStoreError::InvalidObjectKey(key.to_string()));
        }
        Ok(())
    }

    /// Location of `bucket/key` on disk. Parent directories may not exist yet.
    pub fn object_path(&self, bucket: &str, key: &str) -> PathBuf {
        let mut path = self.base_path.clone();
        path.push(bucket);
        path.push(key);
        path
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    /// Writes to a temporary sibling, fsyncs, then renames into place.
    async fn upload(&self, payload: Bytes, bucket: &str, key: &str) -> ObjectStoreResult<()> {
        Self::ensure_key_safe(key)?;
        if bucket.is_empty() || bucket.contains('/') || bucket == "." || bucket == ".." {
            return Err(ObjectStoreError::InvalidObjectKey(format!("{}/{}", bucket, key)));
        }

        let file_path = self.object_path(bucket, key);
        let parent = file_path.parent().map(Path::to_path_buf).ok_or_else(|| {
            io::Error::new(ErrorKind::Other, "object path missing parent directory")
        })?;
        fs::create_dir_all(&parent).await?;

        let tmp_path = parent.join(format!(".tmp-{}", Uuid::new_v4()));
        if let Err(err) = write_synced(&tmp_path, &payload).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(err.into());
        }

        if let Err(err) = fs::rename(&tmp_path, &file_path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(err.into());
        }

        debug!(
            bucket,
            key,
            size = payload.len(),
            etag = %format!("{:x}", md5::compute(&payload)),
            "stored object on disk"
        );
        Ok(())
    }
}

async fn write_synced(path: &Path, payload: &[u8]) -> io::Result<()> {
    let mut file = File::create(path).await?;
    file.write_all(payload).await?;
    file.flush().await?;
    file.sync_all().await
}
