use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use roster::{
    RegistrationForm, RemoteError,
    payment::{extension, is_valid_registration_id, object_path},
    registration::TABLE,
    tracks::DOMAINS,
    validation::validate,
};
use serde_json::json;
use tracing::{error, info, warn};

use crate::{
    error::AppError,
    events::{Change, ChangeKind},
    state::AppState,
    utils::{json_payload, read_upload},
};

pub const PAYMENT_PAGE: &str = "/payment";
pub const ALREADY_PAID: &str = "Payment proof already submitted for this registration";

pub async fn domains_handler() -> impl IntoResponse {
    Json(DOMAINS)
}

pub async fn count_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let count = state.store.count_registrations().await?;

    Ok(Json(json!({ "count": count })))
}

pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegistrationForm>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let form = json_payload(payload)?;
    let record = validate(&form)?;

    let stored = state.store.insert_registration(&record).await?;

    info!("Registered team {} ({})", stored.team_name, stored.id);
    state
        .changes
        .publish(Change::new(TABLE, ChangeKind::Insert, &stored.id));

    let redirect = format!("{PAYMENT_PAGE}?registration={}", stored.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "id": stored.id, "redirect": redirect })),
    ))
}

pub async fn payment_handler(
    State(state): State<Arc<AppState>>,
    Path(registration_id): Path<String>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    if !is_valid_registration_id(&registration_id) {
        warn!("Payment upload for malformed registration id {registration_id:?}");
        return Err(AppError::BadRequest("Invalid registration id".to_string()));
    }

    let upload = read_upload(multipart).await?;

    // proof is set once, nothing is stored for unknown or paid registrations
    if state.store.registration(&registration_id).await?.is_paid() {
        return Err(AppError::Conflict(ALREADY_PAID.to_string()));
    }

    let ext = extension(upload.file_name.as_deref(), &upload.content_type);
    let path = object_path(&registration_id, Utc::now().timestamp_millis(), &ext);
    let bucket = &state.config.payment_bucket;

    state
        .store
        .upload_object(bucket, &path, &upload.content_type, upload.bytes)
        .await?;

    let url = state.store.public_url(bucket, &path);

    state
        .store
        .link_payment(&registration_id, url.clone())
        .await
        .map_err(|e| {
            error!("Payment proof {path} stored but not linked to {registration_id}: {e}");

            match e {
                RemoteError::NotFound => AppError::Conflict(ALREADY_PAID.to_string()),
                other => AppError::from(other),
            }
        })?;

    info!("Payment proof uploaded for {registration_id}");
    state
        .changes
        .publish(Change::new(TABLE, ChangeKind::Update, &registration_id));

    Ok(Json(json!({ "success": true, "url": url })))
}

pub async fn not_found_handler() -> impl IntoResponse {
    AppError::NotFound
}
