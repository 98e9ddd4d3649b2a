//! Remote media host used by the upload endpoints.
//!
//! Abstracted as a trait so tests can use an in-memory fake instead of the
//! real service.

use crate::config::MediaConfig;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// User agent string used for outgoing requests.
pub const USER_AGENT: &str = concat!("cms-server/", env!("CARGO_PKG_VERSION"));

/// One file received from a client, buffered in memory.
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

#[derive(Debug, Error)]
pub enum HostError {
    /// No credentials were configured at startup.
    #[error("media host is not configured")]
    NotConfigured,

    /// Network failures, or failures decoding the host's response.
    #[error("media host request failed: {context}")]
    Reqwest {
        context: String,
        #[source]
        cause: reqwest::Error,
    },

    /// The host answered with a non-success status.
    #[error("media host rejected {operation} ({status}): {message}")]
    Rejected {
        operation: &'static str,
        status: u16,
        message: String,
    },

    /// The upload succeeded but the response carried no URL.
    #[error("media host response carried no URL")]
    MissingUrl,
}

pub type HostResult<T> = Result<T, HostError>;

#[async_trait]
pub trait MediaHost: Send + Sync {
    /// Store `file` and return its public URL.
    async fn upload(&self, file: MediaFile) -> HostResult<String>;

    /// Remove the asset with the given public id, returning the host's verdict
    /// (for example `ok` or `not found`).
    async fn destroy(&self, public_id: &str) -> HostResult<String>;
}

/// Stand-in installed when no credentials are configured.
#[derive(Debug, Default)]
pub struct UnconfiguredHost;

#[async_trait]
impl MediaHost for UnconfiguredHost {
    async fn upload(&self, _file: MediaFile) -> HostResult<String> {
        Err(HostError::NotConfigured)
    }

    async fn destroy(&self, _public_id: &str) -> HostResult<String> {
        Err(HostError::NotConfigured)
    }
}

/// Cloudinary upload API client using signed, buffered multipart requests.
pub struct CloudinaryHost {
    client: reqwest::Client,
    base_url: String,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    folder: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    url: Option<String>,
}

#[derive(Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl CloudinaryHost {
    /// Build a client from configuration. Returns `None` when credentials
    /// are incomplete.
    pub fn from_config(cfg: &MediaConfig) -> HostResult<Option<Self>> {
        let (Some(cloud_name), Some(api_key), Some(api_secret)) = (
            cfg.cloud_name.clone(),
            cfg.api_key.clone(),
            cfg.api_secret.clone(),
        ) else {
            return Ok(None);
        };

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|cause| HostError::Reqwest {
                context: "building HTTP client".into(),
                cause,
            })?;

        Ok(Some(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            cloud_name,
            api_key,
            api_secret,
            folder: cfg.folder.clone(),
        }))
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{}/v1_1/{}/image/{}", self.base_url, self.cloud_name, action)
    }

    async fn read_error(operation: &'static str, response: reqwest::Response) -> HostError {
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&text)
            .map(|e| e.error.message)
            .unwrap_or(text);
        HostError::Rejected {
            operation,
            status,
            message,
        }
    }
}

#[async_trait]
impl MediaHost for CloudinaryHost {
    async fn upload(&self, file: MediaFile) -> HostResult<String> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = sign(
            &[("folder", self.folder.as_str()), ("timestamp", timestamp.as_str())],
            &self.api_secret,
        );

        let mut part = reqwest::multipart::Part::bytes(file.bytes.to_vec())
            .file_name(file.file_name.unwrap_or_else(|| "upload".into()));
        if let Some(content_type) = file.content_type.as_deref() {
            part = part.mime_str(content_type).map_err(|cause| HostError::Reqwest {
                context: format!("invalid content type `{}`", content_type),
                cause,
            })?;
        }
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("api_key", self.api_key.clone())
            .text("folder", self.folder.clone())
            .text("timestamp", timestamp)
            .text("signature", signature)
            .text("signature_algorithm", "sha256");

        let response = self
            .client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|cause| HostError::Reqwest {
                context: "sending upload".into(),
                cause,
            })?;
        if !response.status().is_success() {
            return Err(Self::read_error("upload", response).await);
        }

        let body: UploadResponse = response.json().await.map_err(|cause| HostError::Reqwest {
            context: "decoding upload response".into(),
            cause,
        })?;
        let url = body.secure_url.or(body.url).ok_or(HostError::MissingUrl)?;
        debug!("uploaded asset to {}", url);
        Ok(url)
    }

    async fn destroy(&self, public_id: &str) -> HostResult<String> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = sign(
            &[("public_id", public_id), ("timestamp", timestamp.as_str())],
            &self.api_secret,
        );

        let response = self
            .client
            .post(self.endpoint("destroy"))
            .form(&[
                ("public_id", public_id),
                ("api_key", self.api_key.as_str()),
                ("timestamp", timestamp.as_str()),
                ("signature", signature.as_str()),
                ("signature_algorithm", "sha256"),
            ])
            .send()
            .await
            .map_err(|cause| HostError::Reqwest {
                context: format!("sending destroy for `{}`", public_id),
                cause,
            })?;
        if !response.status().is_success() {
            return Err(Self::read_error("destroy", response).await);
        }

        let body: DestroyResponse = response.json().await.map_err(|cause| HostError::Reqwest {
            context: "decoding destroy response".into(),
            cause,
        })?;
        Ok(body.result)
    }
}

/// Request signature: parameters sorted by name, joined as `k=v&k=v`, the
/// secret appended, then SHA-256 in lowercase hex.
pub fn sign(params: &[(&str, &str)], secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Recover the host's public id from a delivery URL.
///
/// Takes everything after `/upload/`, drops a leading `v<digits>/` version
/// segment, then drops the extension. Folders are kept as part of the id.
/// Transformation segments are not recognised and stay in the result.
pub fn public_id_from_url(url: &str) -> Option<String> {
    let (_, after) = url.split_once("/upload/")?;

    let without_version = match after.strip_prefix('v') {
        Some(rest) => match rest.split_once('/') {
            Some((digits, tail))
                if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) =>
            {
                tail
            }
            _ => after,
        },
        None => after,
    };

    let public_id = match without_version.rfind('.') {
        Some(dot) if dot > 0 => &without_version[..dot],
        _ => without_version,
    };

    if public_id.is_empty() {
        None
    } else {
        Some(public_id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_id_strips_version_and_extension() {
        assert_eq!(
            public_id_from_url(
                "https://res.cloudinary.com/demo/image/upload/v1712345678/uploads/cat.png"
            )
            .as_deref(),
            Some("uploads/cat")
        );
    }

    #[test]
    fn public_id_without_version_segment() {
        assert_eq!(
            public_id_from_url("https://res.cloudinary.com/demo/image/upload/sample.jpg")
                .as_deref(),
            Some("sample")
        );
    }

    #[test]
    fn public_id_keeps_folder_named_like_a_version_prefix() {
        assert_eq!(
            public_id_from_url("https://host/image/upload/videos/clip.mp4").as_deref(),
            Some("videos/clip")
        );
        assert_eq!(
            public_id_from_url("https://host/image/upload/v12a/clip.mp4").as_deref(),
            Some("v12a/clip")
        );
    }

    #[test]
    fn public_id_only_strips_last_extension() {
        assert_eq!(
            public_id_from_url("https://host/image/upload/v1/archive.tar.gz").as_deref(),
            Some("archive.tar")
        );
    }

    #[test]
    fn public_id_keeps_leading_dot_names() {
        assert_eq!(
            public_id_from_url("https://host/image/upload/.hidden").as_deref(),
            Some(".hidden")
        );
    }

    #[test]
    fn public_id_rejects_foreign_urls() {
        assert_eq!(public_id_from_url("https://example.com/images/cat.png"), None);
        assert_eq!(public_id_from_url("https://host/image/upload/"), None);
        assert_eq!(public_id_from_url(""), None);
    }

    #[test]
    fn signature_is_order_independent() {
        let a = sign(&[("timestamp", "1"), ("folder", "uploads")], "secret");
        let b = sign(&[("folder", "uploads"), ("timestamp", "1")], "secret");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, sign(&[("folder", "uploads"), ("timestamp", "1")], "other"));
    }

    #[test]
    fn incomplete_credentials_build_no_client() {
        let cfg = MediaConfig {
            base_url: "https://api.cloudinary.com".into(),
            cloud_name: Some("demo".into()),
            api_key: None,
            api_secret: Some("secret".into()),
            folder: "uploads".into(),
        };
        assert!(CloudinaryHost::from_config(&cfg).unwrap().is_none());
    }

    #[tokio::test]
    async fn unconfigured_host_fails_every_call() {
        let host = UnconfiguredHost;
        let file = MediaFile {
            file_name: None,
            content_type: None,
            bytes: Bytes::from_static(b"x"),
        };
        assert!(matches!(host.upload(file).await, Err(HostError::NotConfigured)));
        assert!(matches!(host.destroy("id").await, Err(HostError::NotConfigured)));
    }
}
