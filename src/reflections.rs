//! Reflection photo storage references and presigned URLs.
//!
//! Photos live in external object storage. This service only names the
//! object (`{user_id}/{filename}` in the configured bucket) and hands out
//! time-limited URLs for uploading and viewing it.

use crate::error::{Error, Result};
use crate::model::unix_now;
use reqwest::Url;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;

/// Lifetime of issued URLs, in seconds.
pub const PRESIGN_TTL_SECS: i64 = 3600;

const S3_SCHEME: &str = "s3://";

/// An `s3://bucket/path` object reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Uri {
    pub bucket: String,
    pub path: String,
}

impl S3Uri {
    pub fn new(bucket: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            path: path.into(),
        }
    }

    /// Parse an `s3://bucket/path` string.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when the scheme, bucket or path is missing,
    /// or when the path has an empty, `.` or `..` segment.
    pub fn parse(value: &str) -> Result<Self> {
        let invalid = || Error::InvalidArgument(format!("Invalid s3Uri '{value}'"));

        let rest = value.trim().strip_prefix(S3_SCHEME).ok_or_else(invalid)?;
        let (bucket, path) = rest.split_once('/').ok_or_else(invalid)?;
        if bucket.is_empty() || !path.split('/').all(is_plain_segment) {
            return Err(invalid());
        }
        Ok(Self::new(bucket, path))
    }
}

impl fmt::Display for S3Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{S3_SCHEME}{}/{}", self.bucket, self.path)
    }
}

/// HTTP verb a presigned URL is valid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresignMethod {
    Put,
    Get,
}

impl PresignMethod {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Put => "PUT",
            Self::Get => "GET",
        }
    }
}

/// A time-limited URL and the Unix second it stops working.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUrl {
    pub url: String,
    pub expires_at: i64,
}

/// Issues presigned URLs for object storage.
pub trait Presigner: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the URL cannot be built.
    fn presign(
        &self,
        method: PresignMethod,
        bucket: &str,
        path: &str,
        ttl_secs: i64,
    ) -> Result<PresignedUrl>;

    /// URL the client PUTs the photo bytes to.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be built.
    fn presign_put(&self, bucket: &str, path: &str, ttl_secs: i64) -> Result<PresignedUrl> {
        self.presign(PresignMethod::Put, bucket, path, ttl_secs)
    }

    /// URL the client GETs the photo from.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be built.
    fn presign_get(&self, bucket: &str, path: &str, ttl_secs: i64) -> Result<PresignedUrl> {
        self.presign(PresignMethod::Get, bucket, path, ttl_secs)
    }
}

/// Presigner for a storage gateway that checks a shared-secret SHA-256
/// signature over method, bucket, path and expiry.
#[derive(Debug, Clone)]
pub struct SignedUrlPresigner {
    base_url: Url,
    secret: String,
}

impl SignedUrlPresigner {
    /// # Errors
    ///
    /// Returns `Config` when `base_url` is not an absolute URL.
    pub fn new(base_url: &str, secret: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("invalid storage URL '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "storage URL '{base_url}' cannot carry a path"
            )));
        }
        Ok(Self {
            base_url,
            secret: secret.to_string(),
        })
    }

    fn sign(&self, method: PresignMethod, bucket: &str, path: &str, expires: i64) -> String {
        let mut hasher = Sha256::new();
        for part in [
            self.secret.as_str(),
            method.as_str(),
            bucket,
            path,
            &expires.to_string(),
        ] {
            hasher.update(part.as_bytes());
            hasher.update(b"\n");
        }
        format!("{:x}", hasher.finalize())
    }

    /// Check a signature and that `now` is before the expiry.
    #[must_use]
    pub fn verify(
        &self,
        method: PresignMethod,
        bucket: &str,
        path: &str,
        expires: i64,
        signature: &str,
        now: i64,
    ) -> bool {
        now < expires && self.sign(method, bucket, path, expires) == signature
    }

    fn presign_at(
        &self,
        method: PresignMethod,
        bucket: &str,
        path: &str,
        expires: i64,
    ) -> Result<PresignedUrl> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::Config("storage URL cannot carry a path".into()))?
            .pop_if_empty()
            .push(bucket)
            .extend(path.split('/'));
        url.query_pairs_mut()
            .append_pair("method", method.as_str())
            .append_pair("expires", &expires.to_string())
            .append_pair("signature", &self.sign(method, bucket, path, expires));

        Ok(PresignedUrl {
            url: url.into(),
            expires_at: expires,
        })
    }
}

impl Presigner for SignedUrlPresigner {
    fn presign(
        &self,
        method: PresignMethod,
        bucket: &str,
        path: &str,
        ttl_secs: i64,
    ) -> Result<PresignedUrl> {
        self.presign_at(method, bucket, path, unix_now() + ttl_secs)
    }
}

/// A single object name: non-empty, no separators, no dot segments.
fn is_plain_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && !segment.contains(['/', '\\'])
        && !segment.contains("..")
}

/// Object path for a user's reflection photo.
///
/// A blank or missing filename becomes `{unix_millis}.jpg`.
///
/// # Errors
///
/// Returns `InvalidArgument` for filenames containing path separators or `..`.
pub fn reflection_path(user_id: &str, filename: Option<&str>) -> Result<String> {
    match filename.map(str::trim).filter(|f| !f.is_empty()) {
        Some(name) => {
            if !is_plain_segment(name) {
                return Err(Error::InvalidArgument(format!(
                    "filename must not contain path segments: '{name}'"
                )));
            }
            Ok(format!("{user_id}/{name}"))
        }
        None => Ok(format!(
            "{user_id}/{}.jpg",
            chrono::Utc::now().timestamp_millis()
        )),
    }
}
