//! # Admin Review
//!
//! Dashboard helpers over the full registration list. The list is always
//! refetched whole, so everything here works on a slice.
use serde::Serialize;

use crate::registration::{Registration, Status};

/// Case-insensitive substring match over team name, contact email and institution.
pub fn matches(registration: &Registration, query: &str) -> bool {
    let query = query.trim().to_lowercase();

    if query.is_empty() {
        return true;
    }

    [
        &registration.team_name,
        &registration.contact_email,
        &registration.institution,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&query))
}

pub fn filter<'a>(registrations: &'a [Registration], query: &str) -> Vec<&'a Registration> {
    registrations
        .iter()
        .filter(|registration| matches(registration, query))
        .collect()
}

#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub total: usize,
    pub approved: usize,
    pub pending: usize,
    pub rejected: usize,
    pub paid: usize,
}

impl Stats {
    pub fn tally<'a>(registrations: impl IntoIterator<Item = &'a Registration>) -> Self {
        registrations
            .into_iter()
            .fold(Self::default(), |mut stats, registration| {
                stats.total += 1;

                match registration.status {
                    Status::Approved => stats.approved += 1,
                    Status::Pending => stats.pending += 1,
                    Status::Rejected => stats.rejected += 1,
                }

                if registration.is_paid() {
                    stats.paid += 1;
                }

                stats
            })
    }
}
