use axum::extract::{Json, Multipart, rejection::JsonRejection};
use roster::payment::{check_size, check_type};
use tracing::warn;

use crate::error::AppError::{self, MalformedPayload};

pub const FILE_FIELD: &str = "file";
pub const NO_FILE: &str = "No file selected";

pub struct Upload {
    pub file_name: Option<String>,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Reads the `file` part, checking its type before any bytes are read and its
/// size as chunks arrive, so an oversized upload is dropped at the limit.
pub async fn read_upload(mut multipart: Multipart) -> Result<Upload, AppError> {
    while let Some(mut field) = multipart.next_field().await.map_err(|_| MalformedPayload)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        check_type(&content_type)?;

        let file_name = field.file_name().map(str::to_string);
        let mut bytes = Vec::new();

        while let Some(chunk) = field.chunk().await.map_err(|_| MalformedPayload)? {
            bytes.extend_from_slice(&chunk);
            check_size(bytes.len() as u64)?;
        }

        if bytes.is_empty() {
            break;
        }

        return Ok(Upload {
            file_name,
            content_type,
            bytes,
        });
    }

    Err(AppError::BadRequest(NO_FILE.to_string()))
}

pub fn json_payload<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload.map(|Json(value)| value).map_err(|e| {
        warn!("Rejected payload: {e}");
        MalformedPayload
    })
}
