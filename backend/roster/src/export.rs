//! # CSV Export
//!
//! Spreadsheet dump of the registration list, one row per team.
use chrono::NaiveDate;

use crate::registration::Registration;

pub const HEADERS: [&str; 11] = [
    "Team Name",
    "Leader Name",
    "Email",
    "Phone",
    "College",
    "Year",
    "Department",
    "Problem Statement",
    "Status",
    "Payment Status",
    "Created At",
];

pub fn file_name(date: NaiveDate) -> String {
    format!("registrations-{}.csv", date.format("%Y-%m-%d"))
}

pub fn to_csv<'a>(registrations: impl IntoIterator<Item = &'a Registration>) -> String {
    let mut lines = vec![HEADERS.join(",")];

    for registration in registrations {
        let created_at = registration.created_at.to_rfc3339();
        let cells: [&str; 11] = [
            registration.team_name.as_str(),
            registration.leader_name(),
            &registration.contact_email,
            &registration.contact_phone,
            &registration.institution,
            &registration.year_of_study,
            &registration.department,
            &registration.problem_statement,
            registration.status.as_str(),
            if registration.is_paid() { "Paid" } else { "Pending" },
            &created_at,
        ];

        lines.push(cells.iter().map(|cell| quote(cell)).collect::<Vec<_>>().join(","));
    }

    lines.join("\n")
}

fn quote(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::registration::{Member, Status};

    #[test]
    fn test_csv_rows() {
        let registration = Registration {
            id: "1".to_string(),
            team_name: "The \"Quoted\" Team".to_string(),
            team_members: vec![Member {
                name: "Asha Rao".to_string(),
                ..Default::default()
            }],
            contact_email: "lead@state.edu".to_string(),
            contact_phone: "9876543210".to_string(),
            institution: "State College, Main".to_string(),
            year_of_study: "2".to_string(),
            department: "CSE".to_string(),
            problem_statement: "Agentic AI".to_string(),
            problem_domain: "Agentic AI".to_string(),
            experience_level: "beginner".to_string(),
            status: Status::Approved,
            payment_screenshot: Some("https://store/p.png".to_string()),
            created_at: Utc.with_ymd_and_hms(2025, 11, 2, 10, 15, 0).unwrap(),
            updated_at: None,
        };

        let csv = to_csv(&[registration]);
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Team Name,Leader Name,Email"));
        assert_eq!(
            lines[1],
            "\"The \"\"Quoted\"\" Team\",\"Asha Rao\",\"lead@state.edu\",\"9876543210\",\
             \"State College, Main\",\"2\",\"CSE\",\"Agentic AI\",\"approved\",\"Paid\",\
             \"2025-11-02T10:15:00+00:00\""
        );
    }

    #[test]
    fn test_empty_export_is_headers_only() {
        assert_eq!(to_csv(&Vec::<Registration>::new()), HEADERS.join(","));
    }

    #[test]
    fn test_file_name() {
        let date = NaiveDate::from_ymd_opt(2025, 11, 2).unwrap();
        assert_eq!(file_name(date), "registrations-2025-11-02.csv");
    }
}
