//! # Admin Sessions
//!
//! Admins sign in with email + password against the hosted auth provider and
//! send the returned access token as `Authorization: Bearer <token>`.
//! Browsers cannot set headers on an `EventSource`, so the token may also
//! arrive as `?access_token=`.
//!
//! - [`Bearer`]: token pulled from the request, nothing verified yet
//! - [`Admin`]: token the provider confirmed belongs to a user
use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRequestParts, Query, State, rejection::JsonRejection},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::IntoResponse,
};
use roster::{
    RemoteError, Store,
    remote::{Session, User},
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::{error::AppError, state::AppState, utils::json_payload};

#[derive(Deserialize)]
struct TokenQuery {
    access_token: String,
}

#[derive(Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

pub struct Bearer(pub String);

pub struct Admin {
    pub user: User,
    pub token: String,
}

impl Bearer {
    pub async fn verify(self, state: &AppState) -> Result<Admin, AppError> {
        let user = state
            .store
            .authorized(&self.0)
            .user()
            .await
            .map_err(|e| match e {
                RemoteError::Service { status, message } if status == 401 || status == 403 => {
                    warn!("Rejected admin token: {message}");
                    AppError::Unauthorized("Session expired, please sign in again".to_string())
                }
                other => AppError::from(other),
            })?;

        Ok(Admin {
            user,
            token: self.0,
        })
    }
}

impl Admin {
    /// Store handle acting as this admin, so row-level security applies.
    pub fn store(&self, state: &AppState) -> Store {
        state.store.authorized(&self.token)
    }
}

fn token_from_parts(parts: &Parts) -> Option<String> {
    let from_header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string());

    from_header
        .or_else(|| {
            Query::<TokenQuery>::try_from_uri(&parts.uri)
                .ok()
                .map(|Query(query)| query.access_token)
        })
        .filter(|token| !token.is_empty())
}

impl<S: Send + Sync> FromRequestParts<S> for Bearer {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        token_from_parts(parts)
            .map(Bearer)
            .ok_or_else(|| AppError::Unauthorized("Please sign in to continue".to_string()))
    }
}

impl FromRequestParts<Arc<AppState>> for Admin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Bearer::from_request_parts(parts, state)
            .await?
            .verify(state)
            .await
    }
}

pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<Session>, AppError> {
    let credentials = json_payload(payload)?;
    let email = credentials.email.trim();

    if email.is_empty() || credentials.password.is_empty() {
        return Err(AppError::BadRequest(
            "Please enter email and password".to_string(),
        ));
    }

    let session = state
        .store
        .sign_in(email, &credentials.password)
        .await
        .map_err(|e| match e {
            RemoteError::Service { message, .. } => {
                warn!("Sign in failed for {email}: {message}");
                AppError::Unauthorized(message)
            }
            other => AppError::from(other),
        })?;

    info!("Admin signed in: {email}");

    Ok(Json(session))
}

pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    Bearer(token): Bearer,
) -> Result<impl IntoResponse, AppError> {
    state.store.authorized(&token).sign_out().await?;

    Ok(StatusCode::NO_CONTENT)
}
