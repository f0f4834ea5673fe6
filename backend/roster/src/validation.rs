//! # Registration Validation
//!
//! Turns a [`RegistrationForm`] into a [`NewRegistration`] or a [`Rejection`].
//!
//! ## Order
//! 1. Trim everything
//! 2. Required fields: if any are blank, report all of them and stop
//! 3. Field rules: report every violation at once
//!
//! ## Rules
//! - Names: letters, spaces, `.`, `'` and `-`, starting with a letter, at least 2 chars
//! - Phone: `^\+?\d{10,15}$`
//! - Email: `.+@.+\..+`
//! - Year: `1`, `2` or `3`
//! - Team: leader + up to 3 members
use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::registration::{
    DEFAULT_EXPERIENCE_LEVEL, Member, MemberForm, NewRegistration, RegistrationForm, Status,
};

pub const MAX_TEAM_SIZE: usize = 4;
pub const MAX_ADDITIONAL_MEMBERS: usize = MAX_TEAM_SIZE - 1;
pub const YEARS: [&str; 3] = ["1", "2", "3"];

static NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z\s.'-]{1,}$").expect("name pattern"));
static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?\d{10,15}$").expect("phone pattern"));
static EMAIL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r".+@.+\..+").expect("email pattern"));

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("Please fill in: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("{}", summarize(.0))]
    Invalid(Vec<FieldError>),
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn is_valid_name(value: &str) -> bool {
    NAME.is_match(value.trim())
}

pub fn is_valid_phone(value: &str) -> bool {
    PHONE.is_match(value.trim())
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL.is_match(value.trim())
}

pub fn is_valid_year(value: &str) -> bool {
    YEARS.contains(&value.trim())
}

pub fn validate(form: &RegistrationForm) -> Result<NewRegistration, Rejection> {
    let team_name = form.team_name.trim();
    let leader_name = form.leader_name.trim();
    let email = form.email.trim();
    let phone = form.phone.trim();
    let college = form.college.trim();
    let year = form.year.trim();
    let department = form.department.trim();
    let problem_domain = form.problem_domain.trim();

    let required = [
        ("Team Name", team_name),
        ("Team Leader Name", leader_name),
        ("Email Address", email),
        ("Phone Number", phone),
        ("College/University", college),
        ("Year of Study", year),
        ("Department", department),
        ("Problem Domain", problem_domain),
    ];

    let missing: Vec<&'static str> = required
        .iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(label, _)| *label)
        .collect();

    if !missing.is_empty() {
        return Err(Rejection::Missing(missing));
    }

    let mut errors = Vec::new();

    if !is_valid_name(team_name) {
        errors.push(FieldError::new(
            "teamName",
            "Team name must contain letters/spaces only.",
        ));
    }
    if !is_valid_email(email) {
        errors.push(FieldError::new("email", "Please enter a valid email address."));
    }
    if !is_valid_phone(phone) {
        errors.push(FieldError::new("phone", "Enter digits only, 10-15 characters."));
    }
    if !is_valid_name(leader_name) {
        errors.push(FieldError::new(
            "leaderName",
            "Names should include letters/spaces only.",
        ));
    }
    if !is_valid_year(year) {
        errors.push(FieldError::new("year", "Choose year 1, 2 or 3."));
    }

    if form.members.len() > MAX_ADDITIONAL_MEMBERS {
        errors.push(FieldError::new(
            "members",
            format!("A maximum of {MAX_TEAM_SIZE} members (including leader) is allowed."),
        ));
    }

    let members: Vec<Member> = form.members.iter().map(normalize_member).collect();

    for (index, member) in members.iter().enumerate() {
        check_member(index, member, &mut errors);
    }

    if !errors.is_empty() {
        return Err(Rejection::Invalid(errors));
    }

    let leader = Member {
        name: leader_name.to_string(),
        email: email.to_string(),
        phone: phone.to_string(),
        college: college.to_string(),
        year: year.to_string(),
        department: department.to_string(),
    };

    let mut team_members = Vec::with_capacity(members.len() + 1);
    team_members.push(leader);
    team_members.extend(members);

    let experience_level = form
        .experience_level
        .as_deref()
        .map(str::trim)
        .filter(|level| !level.is_empty())
        .unwrap_or(DEFAULT_EXPERIENCE_LEVEL);

    Ok(NewRegistration {
        team_name: team_name.to_string(),
        team_members,
        contact_email: email.to_string(),
        contact_phone: phone.to_string(),
        institution: college.to_string(),
        year_of_study: year.to_string(),
        department: department.to_string(),
        problem_statement: problem_domain.to_string(),
        problem_domain: problem_domain.to_string(),
        experience_level: experience_level.to_string(),
        status: Status::Pending,
        created_at: Utc::now(),
    })
}

fn normalize_member(member: &MemberForm) -> Member {
    Member {
        name: member.name.trim().to_string(),
        email: member.email.as_deref().unwrap_or("").trim().to_string(),
        phone: member.phone.trim().to_string(),
        college: member.college.trim().to_string(),
        year: member.year.trim().to_string(),
        department: member.department.as_deref().unwrap_or("").trim().to_string(),
    }
}

fn check_member(index: usize, member: &Member, errors: &mut Vec<FieldError>) {
    let field = |name: &str| format!("members[{index}].{name}");
    let position = index + 2;

    if !is_valid_name(&member.name) {
        errors.push(FieldError::new(
            field("name"),
            format!("Member {position}: use letters and spaces only for the name."),
        ));
    }
    if !is_valid_phone(&member.phone) {
        errors.push(FieldError::new(
            field("phone"),
            format!("Member {position}: phone should be 10-15 digits."),
        ));
    }
    if member.college.is_empty() {
        errors.push(FieldError::new(
            field("college"),
            format!("Member {position}: please fill in the college."),
        ));
    }
    if !is_valid_year(&member.year) {
        errors.push(FieldError::new(
            field("year"),
            format!("Member {position}: choose year 1, 2 or 3."),
        ));
    }
    if !member.email.is_empty() && !is_valid_email(&member.email) {
        errors.push(FieldError::new(
            field("email"),
            format!("Member {position}: check the email address."),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(name: &str) -> MemberForm {
        MemberForm {
            name: name.to_string(),
            email: None,
            phone: "9123456780".to_string(),
            college: "State College".to_string(),
            year: "1".to_string(),
            department: None,
        }
    }

    fn form() -> RegistrationForm {
        RegistrationForm {
            team_name: "  Null Pointers ".to_string(),
            leader_name: "Asha Rao".to_string(),
            email: "asha@college.edu ".to_string(),
            phone: "9876543210".to_string(),
            college: "State College".to_string(),
            year: "2".to_string(),
            department: "CSE".to_string(),
            problem_domain: "Agentic AI".to_string(),
            experience_level: None,
            members: vec![member("Ben Oduya")],
        }
    }

    fn invalid_fields(rejection: Rejection) -> Vec<String> {
        match rejection {
            Rejection::Invalid(errors) => errors.into_iter().map(|e| e.field).collect(),
            other => panic!("expected invalid, got {other:?}"),
        }
    }

    #[test]
    fn test_phone() {
        assert!(is_valid_phone("9876543210"));
        assert!(is_valid_phone("+919876543210"));
        assert!(is_valid_phone("123456789012345"));
        assert!(!is_valid_phone("123"));
        assert!(!is_valid_phone("1234567890123456"));
        assert!(!is_valid_phone("98765-43210"));
        assert!(!is_valid_phone("++9876543210"));
    }

    #[test]
    fn test_name() {
        assert!(is_valid_name("Asha Rao"));
        assert!(is_valid_name("D'Souza-Lee Jr."));
        assert!(!is_valid_name("A"));
        assert!(!is_valid_name("1337 Crew"));
        assert!(!is_valid_name(".Asha"));
        assert!(!is_valid_name("Team #1"));
    }

    #[test]
    fn test_email_and_year() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("plainaddress"));
        assert!(is_valid_year(" 3 "));
        assert!(!is_valid_year("4"));
        assert!(!is_valid_year("one"));
    }

    #[test]
    fn test_valid_form_is_normalized() {
        let record = validate(&form()).unwrap();

        assert_eq!(record.team_name, "Null Pointers");
        assert_eq!(record.contact_email, "asha@college.edu");
        assert_eq!(record.team_members.len(), 2);
        assert_eq!(record.team_members[0].name, "Asha Rao");
        assert_eq!(record.team_members[0].department, "CSE");
        assert_eq!(record.team_members[1].name, "Ben Oduya");
        assert_eq!(record.problem_statement, "Agentic AI");
        assert_eq!(record.problem_domain, "Agentic AI");
        assert_eq!(record.experience_level, DEFAULT_EXPERIENCE_LEVEL);
        assert_eq!(record.status, Status::Pending);
    }

    #[test]
    fn test_missing_fields_are_exactly_the_blank_ones() {
        let mut form = form();
        form.email = "   ".to_string();
        form.year = String::new();
        form.problem_domain = String::new();
        // an invalid phone is not reported while required fields are missing
        form.phone = "123".to_string();

        assert_eq!(
            validate(&form),
            Err(Rejection::Missing(vec![
                "Email Address",
                "Year of Study",
                "Problem Domain"
            ]))
        );
    }

    #[test]
    fn test_everything_missing() {
        let rejection = validate(&RegistrationForm::default()).unwrap_err();

        match rejection {
            Rejection::Missing(labels) => assert_eq!(labels.len(), 8),
            other => panic!("expected missing, got {other:?}"),
        }
    }

    #[test]
    fn test_all_violations_reported() {
        let mut form = form();
        form.team_name = "Team #1".to_string();
        form.phone = "123".to_string();
        form.year = "5".to_string();

        assert_eq!(
            invalid_fields(validate(&form).unwrap_err()),
            vec!["teamName", "phone", "year"]
        );
    }

    #[test]
    fn test_team_of_four_accepted() {
        let mut form = form();
        form.members = vec![member("Ben Oduya"), member("Cara Lin"), member("Dev Patel")];

        assert_eq!(validate(&form).unwrap().team_members.len(), 4);
    }

    #[test]
    fn test_team_of_five_rejected() {
        let mut form = form();
        form.members = vec![
            member("Ben Oduya"),
            member("Cara Lin"),
            member("Dev Patel"),
            member("Eli Stone"),
        ];

        assert_eq!(invalid_fields(validate(&form).unwrap_err()), vec!["members"]);
    }

    #[test]
    fn test_member_rules() {
        let mut form = form();
        let mut bad = member("Cara Lin");
        bad.phone = "555".to_string();
        bad.college = " ".to_string();
        bad.year = "4".to_string();
        bad.email = Some("not-an-email".to_string());
        form.members.push(bad);

        assert_eq!(
            invalid_fields(validate(&form).unwrap_err()),
            vec![
                "members[1].phone",
                "members[1].college",
                "members[1].year",
                "members[1].email"
            ]
        );
    }

    #[test]
    fn test_member_email_optional() {
        let mut form = form();
        form.members[0].email = Some("   ".to_string());

        let record = validate(&form).unwrap();
        assert_eq!(record.team_members[1].email, "");
    }

    #[test]
    fn test_rejection_messages() {
        let missing = Rejection::Missing(vec!["Team Name", "Department"]);
        assert_eq!(missing.to_string(), "Please fill in: Team Name, Department");
    }
}
