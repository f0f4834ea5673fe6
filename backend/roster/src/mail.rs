//! # Email Dispatch
//!
//! Requests accepted by the send-email endpoint and the canned review templates.
//!
//! ## Payload
//! `{ type: "single" | "broadcast", email?, subject, html, from? }`
//!
//! - single: one address, taken from `email`
//! - broadcast: every stored contact email, resolved by the caller
//!
//! Checks here run before any network call.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validation::is_valid_email;

pub const DEFAULT_HTML: &str = "<p>No content provided</p>";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmailKind {
    Single,
    Broadcast,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EmailRequest {
    #[serde(rename = "type")]
    pub kind: EmailKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub html: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MailError {
    #[error("Please enter a subject")]
    MissingSubject,

    #[error("Please provide a recipient email")]
    MissingRecipient,

    #[error("Invalid recipient email: {0}")]
    InvalidRecipient(String),

    #[error("No emails provided")]
    NoRecipients,
}

impl EmailRequest {
    pub fn validate(&self) -> Result<(), MailError> {
        if self.subject.trim().is_empty() {
            return Err(MailError::MissingSubject);
        }

        if self.kind == EmailKind::Single {
            let email = self
                .email
                .as_deref()
                .map(str::trim)
                .filter(|email| !email.is_empty())
                .ok_or(MailError::MissingRecipient)?;

            if !is_valid_email(email) {
                return Err(MailError::InvalidRecipient(email.to_string()));
            }
        }

        Ok(())
    }

    pub fn html_or_default(&self) -> &str {
        if self.html.trim().is_empty() {
            DEFAULT_HTML
        } else {
            &self.html
        }
    }
}

/// Body sent to the email API.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: Vec<String>,
    pub from: String,
    pub subject: String,
    pub html: String,
}

impl OutgoingEmail {
    pub fn new(
        request: &EmailRequest,
        to: Vec<String>,
        default_from: &str,
    ) -> Result<Self, MailError> {
        request.validate()?;

        let to: Vec<String> = to
            .into_iter()
            .map(|address| address.trim().to_string())
            .filter(|address| !address.is_empty())
            .collect();

        if to.is_empty() {
            return Err(MailError::NoRecipients);
        }

        Ok(Self {
            to,
            from: request
                .from
                .clone()
                .filter(|from| !from.trim().is_empty())
                .unwrap_or_else(|| default_from.to_string()),
            subject: request.subject.trim().to_string(),
            html: request.html_or_default().to_string(),
        })
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pub subject: &'static str,
    pub body: &'static str,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Templates {
    pub selected: Template,
    pub rejected: Template,
}

pub const TEMPLATES: Templates = Templates {
    selected: Template {
        subject: "Congratulations! You are selected for Zayathon 2025",
        body: "<h2>🎉 Congratulations!</h2>\n\
<p>Dear Team,</p>\n\
<p>We are pleased to inform you that your team has been <strong>SELECTED</strong> for Zayathon 2025!</p>\n\
<p>Get ready for an amazing hackathon experience. We will share more details soon.</p>\n\
<p>Best regards,<br>Zayathon Team</p>",
    },
    rejected: Template {
        subject: "Update on your Zayathon 2025 application",
        body: "<h2>Thank you for applying</h2>\n\
<p>Dear Team,</p>\n\
<p>Thank you for your interest in Zayathon 2025.</p>\n\
<p>After careful review, we regret to inform you that your team was not <strong>SELECTED</strong> this time.</p>\n\
<p>We encourage you to participate in future events.</p>\n\
<p>Best regards,<br>Zayathon Team</p>",
    },
};

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn broadcast(subject: &str) -> EmailRequest {
        EmailRequest {
            kind: EmailKind::Broadcast,
            email: None,
            subject: subject.to_string(),
            html: String::new(),
            from: None,
        }
    }

    #[test]
    fn test_broadcast_needs_subject() {
        assert_eq!(broadcast("").validate(), Err(MailError::MissingSubject));
        assert_eq!(broadcast("   ").validate(), Err(MailError::MissingSubject));
        assert_eq!(broadcast("Schedule").validate(), Ok(()));
    }

    #[test]
    fn test_single_needs_valid_recipient() {
        let mut request = broadcast("Hello");
        request.kind = EmailKind::Single;
        assert_eq!(request.validate(), Err(MailError::MissingRecipient));

        request.email = Some("nope".to_string());
        assert_eq!(
            request.validate(),
            Err(MailError::InvalidRecipient("nope".to_string()))
        );

        request.email = Some(" lead@college.edu ".to_string());
        assert_eq!(request.validate(), Ok(()));
    }

    #[test]
    fn test_parses_wire_format() {
        let request: EmailRequest = serde_json::from_value(json!({
            "type": "single",
            "email": "lead@college.edu",
            "subject": "Hi",
            "html": "<p>Hi</p>"
        }))
        .unwrap();

        assert_eq!(request.kind, EmailKind::Single);
        assert_eq!(request.from, None);
    }

    #[test]
    fn test_outgoing_defaults() {
        let outgoing = OutgoingEmail::new(
            &broadcast(" Schedule "),
            vec!["a@b.co".to_string(), " ".to_string()],
            "Zayathon <noreply@zayathon.dev>",
        )
        .unwrap();

        assert_eq!(outgoing.to, vec!["a@b.co"]);
        assert_eq!(outgoing.subject, "Schedule");
        assert_eq!(outgoing.html, DEFAULT_HTML);
        assert_eq!(outgoing.from, "Zayathon <noreply@zayathon.dev>");
    }

    #[test]
    fn test_outgoing_without_recipients() {
        assert_eq!(
            OutgoingEmail::new(&broadcast("Schedule"), Vec::new(), "x"),
            Err(MailError::NoRecipients)
        );
    }
}
