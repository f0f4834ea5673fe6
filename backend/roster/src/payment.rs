//! # Payment Proof
//!
//! Registrants upload one screenshot or PDF of their payment after registering.
//!
//! - Accepted: JPEG, PNG, PDF
//! - Max size: 5 MiB
//! - Stored under `payment-screenshots/{registration id}_{unix millis}.{ext}`
//! - Public URL is written back to `registrations.payment_screenshot`
use serde::Serialize;
use thiserror::Error;

pub const MAX_BYTES: u64 = 5 * 1024 * 1024;
pub const FOLDER: &str = "payment-screenshots";
pub const CACHE_CONTROL: &str = "max-age=3600";

pub const ACCEPTED_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "application/pdf"];

#[derive(Error, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentRejection {
    #[error("Please upload a JPEG, PNG, or PDF file")]
    InvalidType,

    #[error("File size should be less than 5MB")]
    TooLarge,
}

/// `Image/PNG; charset=binary` -> `image/png`
pub fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

pub fn check_type(content_type: &str) -> Result<(), PaymentRejection> {
    if ACCEPTED_TYPES.contains(&essence(content_type).as_str()) {
        Ok(())
    } else {
        Err(PaymentRejection::InvalidType)
    }
}

pub fn check_size(size: u64) -> Result<(), PaymentRejection> {
    if size > MAX_BYTES {
        Err(PaymentRejection::TooLarge)
    } else {
        Ok(())
    }
}

/// Type wins over size: a GIF is an invalid type no matter how small.
pub fn check(content_type: &str, size: u64) -> Result<(), PaymentRejection> {
    check_type(content_type)?;
    check_size(size)
}

pub fn extension(file_name: Option<&str>, content_type: &str) -> String {
    let from_name = file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.trim().to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    from_name.unwrap_or_else(|| {
        match essence(content_type).as_str() {
            "application/pdf" => "pdf",
            "image/png" => "png",
            _ => "jpg",
        }
        .to_string()
    })
}

/// Ids end up in the storage path, so only plain row ids are accepted.
pub fn is_valid_registration_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

pub fn object_path(registration_id: &str, timestamp_millis: i64, extension: &str) -> String {
    format!("{FOLDER}/{registration_id}_{timestamp_millis}.{extension}")
}
