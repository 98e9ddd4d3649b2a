//! MediaService: forwards uploads to the media host and keeps one
//! `UploadRecord` per upload call.

use crate::{
    models::upload::{DeleteReport, RemoteDeletion, UploadRecord},
    services::media_host::{HostError, MediaFile, MediaHost, public_id_from_url},
};
use chrono::Utc;
use futures::future::try_join_all;
use sqlx::{SqlitePool, types::Json};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Upper bound on files accepted by one multi-file upload.
pub const MAX_FILES_PER_UPLOAD: usize = 8;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("upload record `{0}` not found")]
    NotFound(Uuid),
    #[error("no image provided")]
    NoImage,
    #[error("at most {max} files may be uploaded at once")]
    TooManyFiles { max: usize },
    #[error(transparent)]
    Host(#[from] HostError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type MediaResult<T> = Result<T, MediaError>;

/// What a single-image upload carries.
#[derive(Debug, Clone)]
pub enum UploadSource {
    /// Bytes to forward to the media host.
    File(MediaFile),
    /// An already-hosted URL, stored as is.
    Url(String),
}

const COLUMNS: &str = "id, images, created_at, updated_at";

#[derive(Clone)]
pub struct MediaService {
    pub db: Arc<SqlitePool>,
    host: Arc<dyn MediaHost>,
}

impl MediaService {
    pub fn new(db: Arc<SqlitePool>, host: Arc<dyn MediaHost>) -> Self {
        Self { db, host }
    }

    /// Store one image: uploaded when it is a file, recorded as is when it
    /// is a URL.
    pub async fn upload_single(&self, source: Option<UploadSource>) -> MediaResult<UploadRecord> {
        let url = match source {
            Some(UploadSource::File(file)) => self.host.upload(file).await?,
            Some(UploadSource::Url(url)) if !url.trim().is_empty() => url.trim().to_string(),
            _ => return Err(MediaError::NoImage),
        };
        self.store(vec![url]).await
    }

    /// Upload every file concurrently and record the URLs in submission order.
    /// Nothing is recorded if any upload fails.
    pub async fn upload_many(&self, files: Vec<MediaFile>) -> MediaResult<UploadRecord> {
        if files.is_empty() {
            return Err(MediaError::NoImage);
        }
        if files.len() > MAX_FILES_PER_UPLOAD {
            return Err(MediaError::TooManyFiles {
                max: MAX_FILES_PER_UPLOAD,
            });
        }

        let urls = try_join_all(files.into_iter().map(|file| self.host.upload(file))).await?;
        self.store(urls).await
    }

    pub async fn get(&self, id: Uuid) -> MediaResult<UploadRecord> {
        sqlx::query_as::<_, UploadRecord>(&format!("SELECT {COLUMNS} FROM uploads WHERE id = ?"))
            .bind(id)
            .fetch_one(&*self.db)
            .await
            .map_err(|err| match err {
                sqlx::Error::RowNotFound => MediaError::NotFound(id),
                other => MediaError::Sqlx(other),
            })
    }

    /// Delete the record, first asking the host to destroy each asset when
    /// `delete_remote` is set. Remote failures are reported per URL and do
    /// not stop the local deletion.
    pub async fn delete(&self, id: Uuid, delete_remote: bool) -> MediaResult<DeleteReport> {
        let record = self.get(id).await?;
        let mut report = DeleteReport::default();

        if delete_remote {
            for url in record.images {
                report.cloud_results.push(self.destroy_remote(url).await);
            }
        }

        let result = sqlx::query("DELETE FROM uploads WHERE id = ?")
            .bind(id)
            .execute(&*self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(MediaError::NotFound(id));
        }
        report.deleted_from_db = true;
        info!("deleted upload record {}", id);
        Ok(report)
    }

    async fn destroy_remote(&self, url: String) -> RemoteDeletion {
        let Some(public_id) = public_id_from_url(&url) else {
            return RemoteDeletion {
                url,
                error: Some("could not parse public id from URL".into()),
                ..RemoteDeletion::default()
            };
        };

        match self.host.destroy(&public_id).await {
            Ok(result) => RemoteDeletion {
                url,
                public_id: Some(public_id),
                result: Some(result),
                error: None,
            },
            Err(err) => {
                warn!("remote delete of {} failed: {}", public_id, err);
                RemoteDeletion {
                    url,
                    public_id: Some(public_id),
                    result: None,
                    error: Some(err.to_string()),
                }
            }
        }
    }

    async fn store(&self, images: Vec<String>) -> MediaResult<UploadRecord> {
        let now = Utc::now();
        let record = sqlx::query_as::<_, UploadRecord>(&format!(
            "INSERT INTO uploads ({COLUMNS}) VALUES (?, ?, ?, ?) RETURNING {COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(Json(&images))
        .bind(now)
        .bind(now)
        .fetch_one(&*self.db)
        .await?;

        debug!("stored upload record {} with {} images", record.id, images.len());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Fake host: URLs derive from the file name; slower for earlier files so
    /// concurrent completion order differs from submission order.
    #[derive(Default)]
    struct FakeHost {
        destroyed: Mutex<Vec<String>>,
        fail_destroy: bool,
    }

    #[async_trait]
    impl MediaHost for FakeHost {
        async fn upload(&self, file: MediaFile) -> Result<String, HostError> {
            let name = file.file_name.unwrap_or_default();
            let delay = 40u64.saturating_sub(name.len() as u64 * 5);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(format!(
                "https://res.example.com/demo/image/upload/v1700000000/uploads/{}",
                name
            ))
        }

        async fn destroy(&self, public_id: &str) -> Result<String, HostError> {
            if self.fail_destroy {
                return Err(HostError::Rejected {
                    operation: "destroy",
                    status: 500,
                    message: "boom".into(),
                });
            }
            self.destroyed.lock().unwrap().push(public_id.to_string());
            Ok("ok".into())
        }
    }

    fn file(name: &str) -> MediaFile {
        MediaFile {
            file_name: Some(name.into()),
            content_type: Some("image/png".into()),
            bytes: Bytes::from_static(b"\x89PNG"),
        }
    }

    async fn service(host: Arc<FakeHost>) -> MediaService {
        MediaService::new(Arc::new(db::connect_in_memory().await.unwrap()), host)
    }

    #[tokio::test]
    async fn many_uploads_keep_submission_order() {
        let svc = service(Arc::new(FakeHost::default())).await;
        let record = svc
            .upload_many(vec![file("a.png"), file("bb.png"), file("ccc.png")])
            .await
            .unwrap();

        assert_eq!(
            record.images,
            vec![
                "https://res.example.com/demo/image/upload/v1700000000/uploads/a.png",
                "https://res.example.com/demo/image/upload/v1700000000/uploads/bb.png",
                "https://res.example.com/demo/image/upload/v1700000000/uploads/ccc.png",
            ]
        );
        assert_eq!(svc.get(record.id).await.unwrap().images, record.images);
    }

    #[tokio::test]
    async fn upload_limits_are_enforced() {
        let svc = service(Arc::new(FakeHost::default())).await;
        assert!(matches!(svc.upload_many(vec![]).await, Err(MediaError::NoImage)));

        let too_many = (0..=MAX_FILES_PER_UPLOAD)
            .map(|i| file(&format!("{}.png", i)))
            .collect();
        assert!(matches!(
            svc.upload_many(too_many).await,
            Err(MediaError::TooManyFiles { max: 8 })
        ));
        assert!(matches!(svc.upload_single(None).await, Err(MediaError::NoImage)));
        assert!(matches!(
            svc.upload_single(Some(UploadSource::Url("  ".into()))).await,
            Err(MediaError::NoImage)
        ));
    }

    #[tokio::test]
    async fn url_source_is_stored_verbatim() {
        let svc = service(Arc::new(FakeHost::default())).await;
        let record = svc
            .upload_single(Some(UploadSource::Url("https://cdn.example.com/x.jpg".into())))
            .await
            .unwrap();
        assert_eq!(record.images, vec!["https://cdn.example.com/x.jpg"]);
    }

    #[tokio::test]
    async fn delete_reports_each_url_and_removes_record() {
        let host = Arc::new(FakeHost::default());
        let svc = service(host.clone()).await;
        let uploaded = svc.upload_single(Some(UploadSource::File(file("cat.png")))).await.unwrap();
        let mut images = uploaded.images.clone();
        images.push("https://elsewhere.example.com/dog.png".into());
        let record = svc.store(images).await.unwrap();

        let report = svc.delete(record.id, true).await.unwrap();

        assert!(report.deleted_from_db);
        assert_eq!(report.cloud_results.len(), 2);
        assert_eq!(report.cloud_results[0].public_id.as_deref(), Some("uploads/cat"));
        assert_eq!(report.cloud_results[0].result.as_deref(), Some("ok"));
        assert!(report.cloud_results[1].public_id.is_none());
        assert!(report.cloud_results[1].error.is_some());
        assert_eq!(*host.destroyed.lock().unwrap(), vec!["uploads/cat"]);
        assert!(matches!(svc.get(record.id).await, Err(MediaError::NotFound(_))));
    }

    #[tokio::test]
    async fn remote_failure_does_not_block_local_delete() {
        let host = Arc::new(FakeHost {
            fail_destroy: true,
            ..FakeHost::default()
        });
        let svc = service(host).await;
        let record = svc.upload_single(Some(UploadSource::File(file("cat.png")))).await.unwrap();

        let report = svc.delete(record.id, true).await.unwrap();

        assert!(report.deleted_from_db);
        assert!(report.cloud_results[0].error.as_deref().unwrap().contains("boom"));
    }

    #[tokio::test]
    async fn local_only_delete_skips_host() {
        let host = Arc::new(FakeHost::default());
        let svc = service(host.clone()).await;
        let record = svc.upload_single(Some(UploadSource::File(file("cat.png")))).await.unwrap();

        let report = svc.delete(record.id, false).await.unwrap();

        assert!(report.deleted_from_db);
        assert!(report.cloud_results.is_empty());
        assert!(host.destroyed.lock().unwrap().is_empty());
    }
}
