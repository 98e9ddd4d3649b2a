//! HTTP handlers for image uploads under `/api/media`.
//!
//! Multipart parts are buffered one at a time; the multi-file endpoint stops
//! reading as soon as the file limit is exceeded.

use crate::{
    errors::{ApiForm, ApiJson, ApiQuery, AppError, parse_id},
    models::{
        query_flag,
        upload::{DeleteReport, UploadRecord},
    },
    services::{
        media_host::MediaFile,
        media_service::{MAX_FILES_PER_UPLOAD, MediaError, MediaService, UploadSource},
    },
};
use axum::{
    Json,
    extract::{
        FromRequest, Multipart, Path, Request, State,
        multipart::{Field, MultipartRejection},
    },
    http::{StatusCode, header},
};
use serde::{Deserialize, Serialize};

/// Request body cap for the upload routes.
pub const MAX_UPLOAD_BODY_BYTES: usize = 32 * 1024 * 1024;

const SINGLE_FIELD: &str = "image";
const MULTI_FIELD: &str = "images";

#[derive(Debug, Deserialize)]
pub struct ImageUrlBody {
    pub image: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteUploadQuery {
    #[serde(
        default,
        rename = "deleteFromCloud",
        deserialize_with = "query_flag::deserialize"
    )]
    pub delete_from_cloud: bool,
}

#[derive(Serialize)]
pub struct UploadResponse {
    message: &'static str,
    data: UploadRecord,
}

#[derive(Serialize)]
pub struct DeleteUploadResponse {
    message: &'static str,
    results: DeleteReport,
}

/// POST `/api/media/upload`
///
/// Accepts multipart (`image` as a file or a text URL), an url-encoded form
/// `image=<url>`, or JSON `{"image": url}`.
pub async fn upload_image(
    State(service): State<MediaService>,
    request: Request,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let source = match content_type(&request) {
        Some(ct) if ct.starts_with("multipart/form-data") => {
            let mut multipart = Multipart::from_request(request, &()).await?;
            single_source(&mut multipart).await?
        }
        Some(ct) if ct.starts_with("application/x-www-form-urlencoded") => {
            let ApiForm(body) = ApiForm::<ImageUrlBody>::from_request(request, &()).await?;
            body.image.map(UploadSource::Url)
        }
        _ => {
            let ApiJson(body) = ApiJson::<ImageUrlBody>::from_request(request, &()).await?;
            body.image.map(UploadSource::Url)
        }
    };

    let record = service.upload_single(source).await?;
    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: "Uploaded",
            data: record,
        }),
    ))
}

/// POST `/api/media/upload-multiple`
pub async fn upload_multiple(
    State(service): State<MediaService>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let mut multipart = multipart?;
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(MULTI_FIELD) {
            continue;
        }
        if files.len() == MAX_FILES_PER_UPLOAD {
            return Err(MediaError::TooManyFiles {
                max: MAX_FILES_PER_UPLOAD,
            }
            .into());
        }
        let file = read_file(field).await?;
        if !file.bytes.is_empty() {
            files.push(file);
        }
    }

    let record = service.upload_many(files).await?;
    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: "Uploaded",
            data: record,
        }),
    ))
}

/// GET `/api/media/{id}`
pub async fn get_upload(
    State(service): State<MediaService>,
    Path(id): Path<String>,
) -> Result<Json<UploadRecord>, AppError> {
    let id = parse_id(&id)?;
    Ok(Json(service.get(id).await?))
}

/// DELETE `/api/media/{id}`: `?deleteFromCloud=true` also removes the hosted assets.
pub async fn delete_upload(
    State(service): State<MediaService>,
    Path(id): Path<String>,
    ApiQuery(query): ApiQuery<DeleteUploadQuery>,
) -> Result<Json<DeleteUploadResponse>, AppError> {
    let id = parse_id(&id)?;
    let report = service.delete(id, query.delete_from_cloud).await?;
    Ok(Json(DeleteUploadResponse {
        message: "Upload deleted",
        results: report,
    }))
}

fn content_type(request: &Request) -> Option<String> {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_ascii_lowercase)
}

/// First `image` part wins: a part with a file name is a file, anything
/// else is read as a URL.
async fn single_source(multipart: &mut Multipart) -> Result<Option<UploadSource>, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(SINGLE_FIELD) {
            continue;
        }
        if field.file_name().is_some() {
            let file = read_file(field).await?;
            if file.bytes.is_empty() {
                return Ok(None);
            }
            return Ok(Some(UploadSource::File(file)));
        }
        let text = field.text().await?;
        return Ok(Some(UploadSource::Url(text)));
    }
    Ok(None)
}

async fn read_file(field: Field<'_>) -> Result<MediaFile, AppError> {
    let file_name = field.file_name().map(str::to_string);
    let content_type = field.content_type().map(str::to_string);
    let bytes = field.bytes().await?;
    Ok(MediaFile {
        file_name,
        content_type,
        bytes,
    })
}
