//! # Registration Export
//!
//! Offline counterpart of the dashboard's CSV button. Pulls every row with the
//! service key, so row-level security does not hide anything.
use std::{fs::write, path::Path};

use anyhow::Context;
use reqwest::Client;
use roster::{
    Registration, Status, Store,
    export::to_csv,
    review::{Stats, filter},
};

pub struct Summary {
    pub written: usize,
    pub stats: Stats,
}

/// Dashboard search first, then the optional status filter.
pub fn select<'a>(
    registrations: &'a [Registration],
    query: &str,
    status: Option<Status>,
) -> Vec<&'a Registration> {
    filter(registrations, query)
        .into_iter()
        .filter(|registration| status.is_none_or(|status| registration.status == status))
        .collect()
}

pub async fn export(
    url: &str,
    key: &str,
    out: &Path,
    query: &str,
    status: Option<Status>,
) -> anyhow::Result<Summary> {
    let store = Store::new(Client::new(), url, key);

    let registrations = store
        .list_registrations()
        .await
        .context("Failed to fetch registrations")?;
    let selected = select(&registrations, query, status);

    write(out, to_csv(selected.iter().copied()))
        .with_context(|| format!("Failed to write {}", out.display()))?;

    Ok(Summary {
        written: selected.len(),
        stats: Stats::tally(&registrations),
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn registration(team: &str, status: Status) -> Registration {
        Registration {
            id: team.to_lowercase(),
            team_name: team.to_string(),
            team_members: Vec::new(),
            contact_email: format!("{}@college.edu", team.to_lowercase()),
            contact_phone: "9876543210".to_string(),
            institution: "State College".to_string(),
            year_of_study: "2".to_string(),
            department: "CSE".to_string(),
            problem_statement: "Not specified".to_string(),
            problem_domain: "FinTech".to_string(),
            experience_level: "beginner".to_string(),
            status,
            payment_screenshot: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_select_without_filters() {
        let rows = vec![
            registration("Alpha", Status::Pending),
            registration("Beta", Status::Approved),
        ];

        assert_eq!(select(&rows, "", None).len(), 2);
    }

    #[test]
    fn test_select_by_status_and_query() {
        let rows = vec![
            registration("Alpha", Status::Approved),
            registration("Beta", Status::Approved),
            registration("Gamma", Status::Rejected),
        ];

        let approved = select(&rows, "", Some(Status::Approved));
        assert_eq!(approved.len(), 2);

        let beta = select(&rows, "BETA", Some(Status::Approved));
        assert_eq!(beta.len(), 1);
        assert_eq!(beta[0].team_name, "Beta");

        assert!(select(&rows, "gamma", Some(Status::Approved)).is_empty());
    }
}
