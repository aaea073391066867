//! Object operation handlers

use super::types::{ErrorResponse, FileOperationResponse};
use super::ApiError;
use crate::{auth::CurrentUser, AppState};
use axum::{
    body::Body,
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE},
        HeaderMap, HeaderValue,
    },
    response::{IntoResponse, Json, Response},
};
use bucketgate_core::ObjectKey;
use futures::{StreamExt, TryStreamExt};
use tracing::{debug, info};

/// Multipart field carrying the uploaded file
const FILE_FIELD: &str = "file";

/// Upload a file
#[utoipa::path(
    post,
    path = "/upload",
    tag = "Files",
    description = "Multipart form upload; the file goes in the `file` field",
    responses(
        (status = 200, description = "File stored", body = FileOperationResponse),
        (status = 400, description = "No file uploaded", body = ErrorResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 500, description = "Upload failed", body = ErrorResponse)
    )
)]
pub async fn upload_file(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<FileOperationResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| {
        debug!(error = %e, "Upload request is not multipart");
        ApiError::NoFileUploaded
    })?;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!(error = %e, "Malformed multipart body");
        ApiError::NoFileUploaded
    })? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let Some(file_name) = field.file_name().map(str::to_string) else {
            return Err(ApiError::NoFileUploaded);
        };

        // Chunks go to the store as they arrive.
        let body = field.map_err(std::io::Error::other).boxed();
        let stored = state.gateway.upload(&file_name, body).await?;

        info!(
            username = %user.username,
            key = %stored.key,
            size = stored.size,
            "File uploaded"
        );
        return Ok(Json(FileOperationResponse::ok(stored.key.into_string())));
    }

    Err(ApiError::NoFileUploaded)
}

/// List all stored files
#[utoipa::path(
    get,
    path = "/files",
    tag = "Files",
    responses(
        (status = 200, description = "Every object key in the bucket", body = Vec<String>),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 500, description = "Failed to list files", body = ErrorResponse)
    )
)]
pub async fn list_files(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    let keys = state.gateway.list().await?;
    debug!(count = keys.len(), "Listed files");
    Ok(Json(keys.into_iter().map(ObjectKey::into_string).collect()))
}

/// Download a file
#[utoipa::path(
    get,
    path = "/download/{filename}",
    tag = "Files",
    params(
        ("filename" = String, Path, description = "Object key")
    ),
    responses(
        (status = 200, description = "File contents as an attachment", body = Vec<u8>, content_type = "application/octet-stream"),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse),
        (status = 500, description = "Download failed", body = ErrorResponse)
    )
)]
pub async fn download_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let download = state.gateway.download(&filename).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    headers.insert(CONTENT_DISPOSITION, content_disposition(&download.file_name));
    if let Some(length) = download.payload.content_length {
        headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
    }

    debug!(key = %download.key, "Streaming download");
    Ok((headers, Body::from_stream(download.payload.body)).into_response())
}

/// Delete a file
#[utoipa::path(
    delete,
    path = "/delete/{filename}",
    tag = "Files",
    params(
        ("filename" = String, Path, description = "Object key")
    ),
    responses(
        (status = 200, description = "File deleted (or never existed)", body = FileOperationResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 500, description = "Delete failed", body = ErrorResponse)
    )
)]
pub async fn delete_file(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(filename): Path<String>,
) -> Result<Json<FileOperationResponse>, ApiError> {
    state.gateway.delete(&filename).await?;
    info!(username = %user.username, key = %filename, "File deleted");
    Ok(Json(FileOperationResponse::ok(filename)))
}

/// `attachment` disposition for `file_name`.
///
/// The plain `filename` parameter is restricted to printable ASCII without
/// quotes or backslashes; when that loses information the exact name is sent
/// as an RFC 5987 `filename*` parameter as well.
pub fn content_disposition(file_name: &str) -> HeaderValue {
    let file_name = if file_name.is_empty() {
        "download"
    } else {
        file_name
    };

    let fallback: String = file_name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();

    let value = if fallback == file_name {
        format!("attachment; filename=\"{fallback}\"")
    } else {
        format!(
            "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
            urlencoding::encode(file_name)
        )
    };

    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disposition(name: &str) -> String {
        content_disposition(name).to_str().unwrap().to_string()
    }

    #[test]
    fn test_plain_name_is_quoted_as_is() {
        assert_eq!(
            disposition("1700000000000-report final.pdf"),
            r#"attachment; filename="1700000000000-report final.pdf""#
        );
    }

    #[test]
    fn test_quotes_and_control_characters_are_replaced() {
        assert_eq!(
            disposition("a\"b\\c\r\nd.txt"),
            r#"attachment; filename="a_b_c__d.txt"; filename*=UTF-8''a%22b%5Cc%0D%0Ad.txt"#
        );
    }

    #[test]
    fn test_non_ascii_name_is_carried_in_extended_parameter() {
        assert_eq!(
            disposition("résumé.pdf"),
            "attachment; filename=\"r_sum_.pdf\"; filename*=UTF-8''r%C3%A9sum%C3%A9.pdf"
        );
    }

    #[test]
    fn test_empty_name_falls_back() {
        assert_eq!(disposition(""), r#"attachment; filename="download""#);
    }
}
