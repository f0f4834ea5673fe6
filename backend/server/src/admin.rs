//! # Admin Dashboard
//!
//! Review, edit and contact registered teams. Every handler requires an
//! [`Admin`]; store calls run with the admin's token.
//!
//! Status flow: `pending -> approved | rejected`, and approved/rejected can be
//! swapped. Status writes are in-place updates stamped with `updated_at`.
use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::{
        StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    response::{
        IntoResponse,
        sse::{Event, KeepAlive, Sse},
    },
};
use chrono::Utc;
use futures_util::Stream;
use roster::{
    Registration, RemoteError, Status,
    export::{file_name, to_csv},
    mail::{EmailKind, EmailRequest, OutgoingEmail, TEMPLATES},
    registration::{RegistrationPatch, TABLE},
    review::{Stats, filter},
    tracks::{NewProblemStatement, NewWinner, PROBLEMS_TABLE, RESULTS_TABLE},
    validation::{is_valid_email, is_valid_phone, is_valid_year},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::{
    auth::{Admin, Bearer},
    error::AppError,
    events::{Change, ChangeKind, event_stream},
    state::AppState,
    utils::json_payload,
};

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct SearchQuery {
    pub q: String,
}

#[derive(Deserialize)]
pub struct StatusChange {
    pub status: Status,
}

async fn filtered(
    admin: &Admin,
    state: &AppState,
    query: &str,
) -> Result<Vec<Registration>, AppError> {
    let registrations = admin.store(state).list_registrations().await?;

    Ok(filter(&registrations, query).into_iter().cloned().collect())
}

pub async fn list_handler(
    admin: Admin,
    State(state): State<Arc<AppState>>,
    Query(search): Query<SearchQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(filtered(&admin, &state, &search.q).await?))
}

pub async fn stats_handler(
    admin: Admin,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let registrations = admin.store(&state).list_registrations().await?;

    Ok(Json(Stats::tally(&registrations)))
}

pub async fn export_handler(
    admin: Admin,
    State(state): State<Arc<AppState>>,
    Query(search): Query<SearchQuery>,
) -> Result<impl IntoResponse, AppError> {
    let registrations = filtered(&admin, &state, &search.q).await?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        file_name(Utc::now().date_naive())
    );

    info!("Exporting {} registrations", registrations.len());

    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        to_csv(&registrations),
    ))
}

pub async fn edit_handler(
    admin: Admin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<RegistrationPatch>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let mut patch = json_payload(payload)?.trimmed();

    // registrants own the payment proof
    patch.payment_screenshot = None;
    patch.updated_at = None;

    if patch.is_empty() {
        return Err(AppError::BadRequest("Nothing to update".to_string()));
    }
    if patch.team_name.as_deref().is_some_and(str::is_empty) {
        return Err(AppError::BadRequest("Team name cannot be empty".to_string()));
    }
    if patch.contact_email.as_deref().is_some_and(|v| !is_valid_email(v)) {
        return Err(AppError::BadRequest("Enter a valid email address.".to_string()));
    }
    if patch.contact_phone.as_deref().is_some_and(|v| !is_valid_phone(v)) {
        return Err(AppError::BadRequest("Use digits only (10-15 characters).".to_string()));
    }
    if patch.year_of_study.as_deref().is_some_and(|v| !is_valid_year(v)) {
        return Err(AppError::BadRequest("Choose year 1, 2 or 3.".to_string()));
    }

    patch.updated_at = Some(Utc::now());

    let updated = admin.store(&state).update_registration(&id, &patch).await?;

    info!("Registration {id} edited");
    state.changes.publish(Change::new(TABLE, ChangeKind::Update, &id));

    Ok(Json(updated))
}

pub async fn status_handler(
    admin: Admin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<StatusChange>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let StatusChange { status } = json_payload(payload)?;
    let store = admin.store(&state);

    let current = store.registration(&id).await?;
    let next = current.status.transition(status)?;

    let updated = store
        .change_status(&id, current.status, next)
        .await
        .map_err(|e| match e {
            RemoteError::NotFound => AppError::Conflict(format!(
                "Registration {id} changed while updating, reload and try again"
            )),
            other => AppError::from(other),
        })?;

    info!("Registration {id}: {} -> {}", current.status, updated.status);
    state.changes.publish(Change::new(TABLE, ChangeKind::Update, &id));

    Ok(Json(updated))
}

pub async fn templates_handler(_admin: Admin) -> impl IntoResponse {
    Json(TEMPLATES)
}

pub async fn events_handler(
    _admin: Admin,
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    Sse::new(event_stream(state.changes.subscribe())).keep_alive(KeepAlive::default())
}

/// Request checks run before the token is verified, so a bad request never
/// leaves the process.
pub async fn send_email_handler(
    State(state): State<Arc<AppState>>,
    bearer: Bearer,
    payload: Result<Json<EmailRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let request = json_payload(payload)?;
    request.validate()?;

    let admin = bearer.verify(&state).await?;

    let recipients: Vec<String> = match request.kind {
        EmailKind::Single => request.email.iter().cloned().collect(),
        EmailKind::Broadcast => match &state.service_store {
            Some(store) => store.contact_emails().await?,
            None => admin.store(&state).contact_emails().await?,
        },
    };

    let email = OutgoingEmail::new(&request, recipients, state.mailer.default_from())?;

    let data = state.mailer.send(&email).await.map_err(|e| {
        error!("Email dispatch failed: {e}");
        AppError::from(e)
    })?;

    info!(
        "{} email sent to {} recipient(s) by {}",
        match request.kind {
            EmailKind::Single => "Single",
            EmailKind::Broadcast => "Broadcast",
        },
        email.to.len(),
        admin.user.email.as_deref().unwrap_or(&admin.user.id)
    );

    Ok(Json(json!({ "success": true, "data": data })))
}

pub async fn list_problems_handler(
    admin: Admin,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(admin.store(&state).list_problems().await?))
}

pub async fn add_problem_handler(
    admin: Admin,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewProblemStatement>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let problem = json_payload(payload)?
        .trimmed()
        .ok_or_else(|| AppError::BadRequest("Title is required".to_string()))?;

    let stored = admin.store(&state).insert_problem(&problem).await?;

    info!("Problem statement added: {}", stored.title);
    state
        .changes
        .publish(Change::new(PROBLEMS_TABLE, ChangeKind::Insert, &stored.id));

    Ok((StatusCode::CREATED, Json(stored)))
}

pub async fn delete_problem_handler(
    admin: Admin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    admin.store(&state).delete_problem(&id).await?;

    state
        .changes
        .publish(Change::new(PROBLEMS_TABLE, ChangeKind::Delete, &id));

    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle_problem_handler(
    admin: Admin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let store = admin.store(&state);

    let current = store.problem(&id).await?;
    let updated = store.set_problem_active(&id, !current.is_active).await?;

    state
        .changes
        .publish(Change::new(PROBLEMS_TABLE, ChangeKind::Update, &id));

    Ok(Json(updated))
}

pub async fn list_winners_handler(
    admin: Admin,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(admin.store(&state).list_winners().await?))
}

pub async fn add_winner_handler(
    admin: Admin,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewWinner>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let winner = json_payload(payload)?;

    if !winner.is_valid() {
        return Err(AppError::BadRequest(
            "Pick a registration and a rank from 1 to 3".to_string(),
        ));
    }

    let stored = admin.store(&state).insert_winner(&winner).await?;

    info!("Winner added: rank {} -> {}", stored.rank, stored.registration_id);
    state
        .changes
        .publish(Change::new(RESULTS_TABLE, ChangeKind::Insert, &stored.id));

    Ok((StatusCode::CREATED, Json(stored)))
}

pub async fn delete_winner_handler(
    admin: Admin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    admin.store(&state).delete_winner(&id).await?;

    state
        .changes
        .publish(Change::new(RESULTS_TABLE, ChangeKind::Delete, &id));

    Ok(StatusCode::NO_CONTENT)
}
