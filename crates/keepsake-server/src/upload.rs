//! Upload pipeline: one multipart batch in, per-file results out.
//!
//! Files are processed independently and in input order.  The response is
//! 201 whenever at least one file part was submitted, even if every
//! accepted file failed; callers must inspect `results[].status`, not the
//! HTTP status code, to detect partial failure.

use std::collections::HashMap;

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::{debug, warn};

use keepsake_store::{NewMedia, META_MIRROR_URL, META_ORIGINAL_NAME};

use crate::api::AppState;
use crate::error::ApiError;

/// Multipart field name the gallery client uses for file parts.
const MEDIA_FIELD: &str = "media";

/// Outcome for one accepted file in a batch.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum UploadResult {
    Success { id: u64, file_name: String },
    Error { file_name: String, message: String },
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub results: Vec<UploadResult>,
}

pub async fn media_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let mut results = Vec::new();
    let mut file_parts = 0usize;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(MEDIA_FIELD) {
            continue;
        }
        file_parts += 1;

        let file_name = field.file_name().unwrap_or("unnamed").to_string();
        let file_type = field.content_type().unwrap_or("").to_string();

        // Transport filter: only photos and videos reach the pipeline.
        // Anything else is dropped without a result entry.
        if !is_media_type(&file_type) {
            debug!(name = %file_name, content_type = %file_type, "Dropped non-media part");
            continue;
        }

        let bytes = field.bytes().await.map_err(multipart_error)?;

        results.push(process_file(&state, file_name, file_type, &bytes).await);
    }

    if file_parts == 0 {
        return Err(ApiError::BadRequest("No files uploaded".to_string()));
    }

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: format!("Processed {} file(s)", results.len()),
            results,
        }),
    ))
}

/// Run one accepted file through validation, optional mirroring, and
/// registry persistence.  Failures land in the result entry, never in the
/// batch status.
async fn process_file(
    state: &AppState,
    file_name: String,
    file_type: String,
    bytes: &[u8],
) -> UploadResult {
    let mut new = NewMedia {
        file_name: file_name.clone(),
        file_type,
        file_size: bytes.len() as u64,
        metadata: HashMap::from([(META_ORIGINAL_NAME.to_string(), file_name.clone())]),
    };

    if let Err(message) = validate(&new) {
        return UploadResult::Error { file_name, message };
    }

    // Mirror before registering so the URL lands in the record's one-time
    // write.  The local store stays authoritative: a mirror failure is
    // logged and the upload continues without a mirrorUrl.
    if let Some(mirror) = &state.mirror {
        match mirror
            .upload(&new.file_name, &new.file_type, bytes.to_vec())
            .await
        {
            Ok(url) => {
                new.metadata.insert(META_MIRROR_URL.to_string(), url);
            }
            Err(e) => warn!(name = %new.file_name, error = %e, "Mirror upload failed"),
        }
    }

    match state.media.create_media(new, bytes).await {
        Ok(record) => UploadResult::Success {
            id: record.id,
            file_name: record.file_name,
        },
        Err(e) => {
            warn!(name = %file_name, error = %e, "Failed to persist upload");
            UploadResult::Error {
                file_name,
                message: e.to_string(),
            }
        }
    }
}

/// Shape checks for a new record.  A violation fails the single file,
/// never the batch.
fn validate(new: &NewMedia) -> Result<(), String> {
    if new.file_name.trim().is_empty() {
        return Err("File name is empty".to_string());
    }

    if new.file_size == 0 {
        return Err("File is empty".to_string());
    }

    match new.file_type.split_once('/') {
        Some((kind, subtype)) if !kind.is_empty() && !subtype.is_empty() => Ok(()),
        _ => Err(format!("Malformed MIME type '{}'", new.file_type)),
    }
}

fn is_media_type(content_type: &str) -> bool {
    content_type.starts_with("image/") || content_type.starts_with("video/")
}

/// The body limit surfaces through the multipart stream; keep its 413
/// distinct from garden-variety malformed input.
fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge("Upload exceeds the size limit".to_string())
    } else {
        ApiError::BadRequest(format!("Multipart error: {e}"))
    }
}
