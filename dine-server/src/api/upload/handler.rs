//! Image Upload Handler
//!
//! Accepts JPEG, PNG, WebP and GIF. Files are stored content-addressed as
//! `{sha256}.{ext}`, so uploading the same bytes twice yields the same URL.

use std::path::Path as FsPath;

use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Multipart, Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use image::ImageFormat;
use sha2::{Digest, Sha256};
use shared::client::UploadResponse;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::{AppError, AppResult, ErrorCode};

/// Maximum file size (2MB)
pub const MAX_FILE_SIZE: usize = 2 * 1024 * 1024;

/// Allowed formats: MIME type and stored extension
const ALLOWED: &[(&str, ImageFormat, &str)] = &[
    ("image/jpeg", ImageFormat::Jpeg, "jpg"),
    ("image/png", ImageFormat::Png, "png"),
    ("image/webp", ImageFormat::WebP, "webp"),
    ("image/gif", ImageFormat::Gif, "gif"),
];

fn calculate_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Check size, declared type and actual content; returns `(mime, ext)`
fn validate_image(
    data: &[u8],
    declared: Option<&str>,
) -> Result<(&'static str, &'static str), AppError> {
    if data.is_empty() {
        return Err(AppError::new(ErrorCode::EmptyFile));
    }
    if data.len() > MAX_FILE_SIZE {
        return Err(AppError::with_message(
            ErrorCode::FileTooLarge,
            format!(
                "File too large. Maximum size is {}MB",
                MAX_FILE_SIZE / 1024 / 1024
            ),
        )
        .with_detail("max_bytes", MAX_FILE_SIZE)
        .with_detail("size", data.len()));
    }

    let supported = || {
        ALLOWED
            .iter()
            .map(|(mime, _, _)| *mime)
            .collect::<Vec<_>>()
            .join(", ")
    };

    let declared = declared.map(|d| d.trim().to_ascii_lowercase());
    if let Some(declared) = &declared
        && !ALLOWED.iter().any(|(mime, _, _)| mime == declared)
    {
        return Err(AppError::with_message(
            ErrorCode::UnsupportedFileFormat,
            format!("Unsupported content type '{declared}'. Supported: {}", supported()),
        ));
    }

    let sniffed = image::guess_format(data).map_err(|e| {
        AppError::with_message(ErrorCode::InvalidImageFile, format!("Not an image: {e}"))
    })?;
    let &(mime, format, ext) = ALLOWED
        .iter()
        .find(|(_, f, _)| *f == sniffed)
        .ok_or_else(|| {
            AppError::with_message(
                ErrorCode::UnsupportedFileFormat,
                format!("Unsupported image format {sniffed:?}. Supported: {}", supported()),
            )
        })?;

    if let Some(declared) = &declared
        && declared != mime
    {
        return Err(AppError::with_message(
            ErrorCode::InvalidImageFile,
            format!("Declared type '{declared}' does not match content ({mime})"),
        ));
    }

    // Decode to reject truncated or corrupt files
    image::load_from_memory_with_format(data, format).map_err(|e| {
        AppError::with_message(ErrorCode::InvalidImageFile, format!("Invalid image file: {e}"))
    })?;

    Ok((mime, ext))
}

/// POST /api/upload
pub async fn upload(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    let mut file: Option<(Bytes, Option<String>, Option<String>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Invalid multipart request: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let original_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(|e| {
            // The body limit trips while streaming the field
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                AppError::new(ErrorCode::FileTooLarge)
            } else {
                AppError::validation(format!("Multipart error: {e}"))
            }
        })?;
        file = Some((data, original_name, content_type));
        break;
    }

    let (data, original_name, content_type) =
        file.ok_or_else(|| AppError::new(ErrorCode::NoFileProvided))?;

    // Generic types from browsers say nothing, rely on sniffing
    let declared = content_type
        .as_deref()
        .filter(|ct| *ct != "application/octet-stream");
    let (mime, ext) = validate_image(&data, declared)?;

    let hash = calculate_hash(&data);
    let filename = format!("{hash}.{ext}");
    let dir = state.config.uploads_dir();
    let path = dir.join(&filename);

    if tokio::fs::try_exists(&path).await.unwrap_or(false) {
        tracing::info!(%filename, "Duplicate image, returning existing file");
    } else {
        tokio::fs::create_dir_all(&dir).await.map_err(storage_error)?;
        tokio::fs::write(&path, &data).await.map_err(storage_error)?;
        tracing::info!(
            %filename,
            original_name = original_name.as_deref().unwrap_or("-"),
            size = data.len(),
            user = %current_user.username,
            "Image uploaded"
        );
    }

    Ok(Json(UploadResponse {
        url: format!("/api/image/{filename}"),
        filename,
        size: data.len(),
        content_type: mime.to_string(),
    }))
}

fn storage_error(e: std::io::Error) -> AppError {
    tracing::error!(error = %e, "Failed to store image");
    AppError::with_message(ErrorCode::FileStorageFailed, format!("Failed to store file: {e}"))
}

/// Reject anything that could escape the uploads dir
fn is_safe_filename(filename: &str) -> bool {
    !filename.is_empty()
        && !filename.starts_with('.')
        && !filename.contains("..")
        && filename
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_')
        && FsPath::new(filename).file_name().is_some_and(|n| n == filename)
}

/// GET /api/image/{filename}
pub async fn serve(State(state): State<ServerState>, Path(filename): Path<String>) -> Response {
    if !is_safe_filename(&filename) {
        return (StatusCode::BAD_REQUEST, "Invalid filename").into_response();
    }

    let path = state.config.uploads_dir().join(&filename);
    match tokio::fs::read(&path).await {
        Ok(content) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, mime.essence_str().to_string()),
                    (
                        header::CACHE_CONTROL,
                        "public, max-age=31536000, immutable".to_string(),
                    ),
                ],
                content,
            )
                .into_response()
        }
        Err(e) => {
            tracing::debug!(%filename, error = %e, "Image not found");
            (StatusCode::NOT_FOUND, "File not found").into_response()
        }
    }
}
