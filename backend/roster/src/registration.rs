//! # Registrations
//!
//! Rows of the `registrations` table and the payloads that produce them.
//!
//! ## Columns
//! - team_name, contact_email, contact_phone, institution, year_of_study, department: **string**
//! - team_members: **json array**, leader always at index 0
//! - problem_statement, problem_domain, experience_level: **string**
//! - status: `pending` | `approved` | `rejected`
//! - payment_screenshot: public URL of the uploaded proof, **nullable**
//! - created_at, updated_at: **timestamp**
//!
//! ## Notes
//! - Older rows were written with `team_members` serialized twice, so it can
//!   come back as a JSON string. Reading decodes it and falls back to an empty list.
use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

pub const TABLE: &str = "registrations";

pub const DEFAULT_PROBLEM_STATEMENT: &str = "Not specified";
pub const DEFAULT_EXPERIENCE_LEVEL: &str = "beginner";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Pending,
    Approved,
    Rejected,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Cannot move a registration from {from} to {to}")]
pub struct TransitionError {
    pub from: Status,
    pub to: Status,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Approved => "approved",
            Status::Rejected => "rejected",
        }
    }

    /// Review decisions only ever land on approved or rejected, and can be
    /// reversed between the two. Nothing goes back to pending.
    pub fn transition(self, to: Status) -> Result<Status, TransitionError> {
        match (self, to) {
            (Status::Pending, Status::Approved)
            | (Status::Pending, Status::Rejected)
            | (Status::Approved, Status::Rejected)
            | (Status::Rejected, Status::Approved) => Ok(to),
            _ => Err(TransitionError { from: self, to }),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Unknown status {0}, expected pending, approved or rejected")]
pub struct UnknownStatus(pub String);

impl FromStr for Status {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Status::Pending),
            "approved" => Ok(Status::Approved),
            "rejected" => Ok(Status::Rejected),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Member {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub college: String,
    pub year: String,
    pub department: String,
}

/// A row as stored.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Registration {
    pub id: String,
    pub team_name: String,
    #[serde(default, deserialize_with = "lenient_members")]
    pub team_members: Vec<Member>,
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub contact_phone: String,
    #[serde(default)]
    pub institution: String,
    #[serde(default)]
    pub year_of_study: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub department: String,
    #[serde(default = "default_problem_statement", deserialize_with = "null_as_problem_statement")]
    pub problem_statement: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub problem_domain: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub experience_level: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: Status,
    #[serde(default)]
    pub payment_screenshot: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Registration {
    pub fn leader_name(&self) -> &str {
        self.team_members
            .first()
            .map(|leader| leader.name.as_str())
            .unwrap_or("")
    }

    pub fn is_paid(&self) -> bool {
        self.payment_screenshot
            .as_deref()
            .is_some_and(|url| !url.is_empty())
    }
}

/// Normalized insert payload, produced only by [`crate::validation::validate`].
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct NewRegistration {
    pub team_name: String,
    pub team_members: Vec<Member>,
    pub contact_email: String,
    pub contact_phone: String,
    pub institution: String,
    pub year_of_study: String,
    pub department: String,
    pub problem_statement: String,
    pub problem_domain: String,
    pub experience_level: String,
    pub status: Status,
    pub created_at: DateTime<Utc>,
}

/// Candidate team as sent by the registration form. Absent fields read as blank.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationForm {
    pub team_name: String,
    pub leader_name: String,
    pub email: String,
    pub phone: String,
    pub college: String,
    pub year: String,
    pub department: String,
    pub problem_domain: String,
    pub experience_level: Option<String>,
    /// Additional members only; the leader is built from the fields above.
    pub members: Vec<MemberForm>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct MemberForm {
    pub name: String,
    pub email: Option<String>,
    pub phone: String,
    pub college: String,
    pub year: String,
    pub department: Option<String>,
}

/// Admin edit. Only the fields present are written.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct RegistrationPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_of_study: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem_statement: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_screenshot: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl RegistrationPatch {
    pub fn status(status: Status) -> Self {
        Self {
            status: Some(status),
            updated_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    pub fn payment(url: String) -> Self {
        Self {
            payment_screenshot: Some(url),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn trimmed(self) -> Self {
        let trim = |value: Option<String>| value.map(|s| s.trim().to_string());

        Self {
            team_name: trim(self.team_name),
            contact_email: trim(self.contact_email),
            contact_phone: trim(self.contact_phone),
            institution: trim(self.institution),
            year_of_study: trim(self.year_of_study),
            department: trim(self.department),
            problem_statement: trim(self.problem_statement),
            ..self
        }
    }
}

fn default_problem_statement() -> String {
    DEFAULT_PROBLEM_STATEMENT.to_string()
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_problem_statement<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|s| !s.is_empty())
        .unwrap_or_else(default_problem_statement))
}

fn lenient_members<'de, D>(deserializer: D) -> Result<Vec<Member>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;

    let value = match value {
        Value::String(raw) => match serde_json::from_str(&raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Unreadable team_members string: {e}");
                return Ok(Vec::new());
            }
        },
        other => other,
    };

    match value {
        Value::Null => Ok(Vec::new()),
        other => Ok(serde_json::from_value(other).unwrap_or_else(|e| {
            warn!("Unreadable team_members value: {e}");
            Vec::new()
        })),
    }
}
