//! # Hosted Store
//!
//! Thin client over the backend-as-a-service REST surface.
//!
//! - Tables: `{url}/rest/v1/{table}`, PostgREST filters like `id=eq.{id}`
//! - Storage: `{url}/storage/v1/object/{bucket}/{path}`
//! - Auth: `{url}/auth/v1/...`
//!
//! Every request carries the project key as `apikey`. `Authorization` carries
//! the signed-in user's token when there is one, else the project key, so
//! row-level security decides what each caller may touch.
//!
//! One attempt per call. Failures keep the provider's own message so callers
//! can surface it as is.
use reqwest::{
    Client, Method, RequestBuilder, Response, StatusCode,
    header::{CONTENT_RANGE, CONTENT_TYPE},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

use crate::{
    payment::CACHE_CONTROL,
    registration::{NewRegistration, Registration, RegistrationPatch, Status, TABLE},
    tracks::{
        NewProblemStatement, NewWinner, PROBLEMS_TABLE, ProblemStatement, RESULTS_TABLE, Winner,
    },
};

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("{message}")]
    Service { status: u16, message: String },

    #[error("Record not found")]
    NotFound,

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: u64,
    #[serde(default)]
    pub refresh_token: String,
    pub user: User,
}

#[derive(Deserialize)]
struct ContactEmail {
    contact_email: Option<String>,
}

#[derive(Clone)]
pub struct Store {
    client: Client,
    base_url: String,
    api_key: String,
    bearer: Option<String>,
}

impl Store {
    pub fn new(client: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            bearer: None,
        }
    }

    /// Same project, acting as the user behind `token`.
    pub fn authorized(&self, token: &str) -> Self {
        Self {
            bearer: Some(token.to_string()),
            ..self.clone()
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(self.bearer.as_deref().unwrap_or(&self.api_key))
    }

    fn table(&self, method: Method, table: &str) -> RequestBuilder {
        self.request(method, format!("{}/rest/v1/{table}", self.base_url))
    }

    // Registrations

    pub async fn insert_registration(
        &self,
        registration: &NewRegistration,
    ) -> Result<Registration, RemoteError> {
        first(self.insert(TABLE, registration).await?)
    }

    pub async fn list_registrations(&self) -> Result<Vec<Registration>, RemoteError> {
        self.select(TABLE, &[("select", "*"), ("order", "created_at.desc")])
            .await
    }

    pub async fn registration(&self, id: &str) -> Result<Registration, RemoteError> {
        let filter = format!("eq.{id}");

        first(self.select(TABLE, &[("select", "*"), ("id", filter.as_str())]).await?)
    }

    pub async fn update_registration(
        &self,
        id: &str,
        patch: &RegistrationPatch,
    ) -> Result<Registration, RemoteError> {
        first(self.update(TABLE, id, &[], patch).await?)
    }

    /// Links a payment proof only while the row has none. An empty result
    /// means the id is unknown or another upload got there first.
    pub async fn link_payment(&self, id: &str, url: String) -> Result<Registration, RemoteError> {
        let patch = RegistrationPatch::payment(url);

        first(
            self.update(TABLE, id, &[("payment_screenshot", "is.null")], &patch)
                .await?,
        )
    }

    /// Moves the row to `to` only if it is still at `from`.
    pub async fn change_status(
        &self,
        id: &str,
        from: Status,
        to: Status,
    ) -> Result<Registration, RemoteError> {
        let guard = format!("eq.{from}");
        let patch = RegistrationPatch::status(to);

        first(
            self.update(TABLE, id, &[("status", guard.as_str())], &patch)
                .await?,
        )
    }

    pub async fn count_registrations(&self) -> Result<u64, RemoteError> {
        let response = send(
            self.table(Method::HEAD, TABLE)
                .query(&[("select", "id")])
                .header("Prefer", "count=exact"),
        )
        .await?;

        let range = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| RemoteError::Decode("missing Content-Range".to_string()))?;

        parse_total(range).ok_or_else(|| RemoteError::Decode(format!("bad Content-Range {range}")))
    }

    pub async fn contact_emails(&self) -> Result<Vec<String>, RemoteError> {
        let rows: Vec<ContactEmail> = self
            .select(
                TABLE,
                &[("select", "contact_email"), ("contact_email", "not.is.null")],
            )
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| row.contact_email)
            .filter(|email| !email.trim().is_empty())
            .collect())
    }

    // Problem statements

    pub async fn list_problems(&self) -> Result<Vec<ProblemStatement>, RemoteError> {
        self.select(PROBLEMS_TABLE, &[("select", "*"), ("order", "created_at.desc")])
            .await
    }

    pub async fn problem(&self, id: &str) -> Result<ProblemStatement, RemoteError> {
        let filter = format!("eq.{id}");

        first(
            self.select(PROBLEMS_TABLE, &[("select", "*"), ("id", filter.as_str())])
                .await?,
        )
    }

    pub async fn insert_problem(
        &self,
        problem: &NewProblemStatement,
    ) -> Result<ProblemStatement, RemoteError> {
        first(self.insert(PROBLEMS_TABLE, problem).await?)
    }

    pub async fn set_problem_active(
        &self,
        id: &str,
        is_active: bool,
    ) -> Result<ProblemStatement, RemoteError> {
        first(
            self.update(PROBLEMS_TABLE, id, &[], &json!({ "is_active": is_active }))
                .await?,
        )
    }

    pub async fn delete_problem(&self, id: &str) -> Result<(), RemoteError> {
        self.delete::<ProblemStatement>(PROBLEMS_TABLE, id)
            .await
            .map(drop)
    }

    // Results

    pub async fn list_winners(&self) -> Result<Vec<Winner>, RemoteError> {
        self.select(RESULTS_TABLE, &[("select", "*"), ("order", "rank.asc")])
            .await
    }

    pub async fn insert_winner(&self, winner: &NewWinner) -> Result<Winner, RemoteError> {
        first(self.insert(RESULTS_TABLE, winner).await?)
    }

    pub async fn delete_winner(&self, id: &str) -> Result<(), RemoteError> {
        self.delete::<Winner>(RESULTS_TABLE, id).await.map(drop)
    }

    // Storage

    pub async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), RemoteError> {
        let url = format!("{}/storage/v1/object/{bucket}/{path}", self.base_url);

        send(
            self.request(Method::POST, url)
                .header(CONTENT_TYPE, content_type)
                .header("cache-control", CACHE_CONTROL)
                .header("x-upsert", "false")
                .body(bytes),
        )
        .await?;

        Ok(())
    }

    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{bucket}/{path}", self.base_url)
    }

    // Auth

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, RemoteError> {
        let url = format!("{}/auth/v1/token", self.base_url);

        json_body(
            send(
                self.request(Method::POST, url)
                    .query(&[("grant_type", "password")])
                    .json(&json!({ "email": email, "password": password })),
            )
            .await?,
        )
        .await
    }

    pub async fn user(&self) -> Result<User, RemoteError> {
        let url = format!("{}/auth/v1/user", self.base_url);

        json_body(send(self.request(Method::GET, url)).await?).await
    }

    pub async fn sign_out(&self) -> Result<(), RemoteError> {
        let url = format!("{}/auth/v1/logout", self.base_url);

        send(self.request(Method::POST, url)).await?;

        Ok(())
    }

    // Table plumbing

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, RemoteError> {
        json_body(send(self.table(Method::GET, table).query(query)).await?).await
    }

    async fn insert<B, T>(&self, table: &str, row: &B) -> Result<Vec<T>, RemoteError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        json_body(
            send(
                self.table(Method::POST, table)
                    .header("Prefer", "return=representation")
                    .json(&[row]),
            )
            .await?,
        )
        .await
    }

    async fn update<B, T>(
        &self,
        table: &str,
        id: &str,
        guard: &[(&str, &str)],
        patch: &B,
    ) -> Result<Vec<T>, RemoteError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        json_body(
            send(
                self.table(Method::PATCH, table)
                    .query(&[("id", format!("eq.{id}"))])
                    .query(guard)
                    .header("Prefer", "return=representation")
                    .json(patch),
            )
            .await?,
        )
        .await
    }

    async fn delete<T: DeserializeOwned>(&self, table: &str, id: &str) -> Result<T, RemoteError> {
        first(
            json_body(
                send(
                    self.table(Method::DELETE, table)
                        .query(&[("id", format!("eq.{id}"))])
                        .header("Prefer", "return=representation"),
                )
                .await?,
            )
            .await?,
        )
    }
}

/// Row-level security turns a forbidden write into an empty result rather
/// than an error, so an empty representation reads as not found.
fn first<T>(rows: Vec<T>) -> Result<T, RemoteError> {
    rows.into_iter().next().ok_or(RemoteError::NotFound)
}

async fn send(builder: RequestBuilder) -> Result<Response, RemoteError> {
    let response = builder.send().await?;
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    debug!("Store responded {status}: {body}");

    Err(RemoteError::Service {
        status: status.as_u16(),
        message: error_message(status, &body),
    })
}

async fn json_body<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
    let bytes = response.bytes().await?;

    serde_json::from_slice(&bytes).map_err(|e| RemoteError::Decode(e.to_string()))
}

/// Providers disagree on where the message lives: PostgREST uses `message`,
/// auth uses `msg` or `error_description`, storage and edge functions `error`.
pub fn error_message(status: StatusCode, body: &str) -> String {
    let from_body = serde_json::from_str::<Value>(body).ok().and_then(|value| {
        ["message", "msg", "error_description", "error"]
            .iter()
            .find_map(|key| match value.get(key) {
                Some(Value::String(message)) if !message.is_empty() => Some(message.clone()),
                Some(Value::Object(inner)) => inner
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                _ => None,
            })
    });

    from_body.unwrap_or_else(|| match status.canonical_reason() {
        Some(reason) => format!("{} {reason}", status.as_u16()),
        None => format!("HTTP {}", status.as_u16()),
    })
}

/// `Content-Range: 0-24/573` or `*/0`.
pub fn parse_total(range: &str) -> Option<u64> {
    range.rsplit_once('/')?.1.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_total() {
        assert_eq!(parse_total("0-24/573"), Some(573));
        assert_eq!(parse_total("*/0"), Some(0));
        assert_eq!(parse_total("0-24/*"), None);
        assert_eq!(parse_total("garbage"), None);
    }

    #[test]
    fn test_error_message_sources() {
        let status = StatusCode::BAD_REQUEST;

        assert_eq!(
            error_message(
                status,
                r#"{"code":"42501","message":"new row violates row-level security policy"}"#
            ),
            "new row violates row-level security policy"
        );
        assert_eq!(
            error_message(
                status,
                r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#
            ),
            "Invalid login credentials"
        );
        assert_eq!(error_message(status, r#"{"msg":"Token expired"}"#), "Token expired");
        assert_eq!(
            error_message(status, r#"{"error":{"message":"Domain not verified"}}"#),
            "Domain not verified"
        );
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, "<html>"), "502 Bad Gateway");
    }
}
