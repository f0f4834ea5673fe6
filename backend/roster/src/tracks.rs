//! # Tracks
//!
//! Problem domains offered on the registration form, plus the admin-managed
//! problem statements and results tables.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DOMAINS: [&str; 9] = [
    "Agentic AI",
    "Robotics & Autonomous Systems",
    "Cybersecurity & Threat Intelligence",
    "HealthTech & MedAI",
    "FinTech & Blockchain",
    "Smart Cities & IoT",
    "Agritech & Rural Innovation",
    "Transportation & Logistics",
    "Open Innovation",
];

pub const PROBLEMS_TABLE: &str = "problem_statements";
pub const RESULTS_TABLE: &str = "results";

pub const RANKS: [u8; 3] = [1, 2, 3];

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProblemStatement {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NewProblemStatement {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default = "active")]
    pub is_active: bool,
}

fn active() -> bool {
    true
}

impl NewProblemStatement {
    pub fn trimmed(self) -> Option<Self> {
        let title = self.title.trim().to_string();

        (!title.is_empty()).then(|| Self {
            title,
            description: self.description.trim().to_string(),
            category: self.category.trim().to_string(),
            ..self
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Winner {
    pub id: String,
    pub registration_id: String,
    #[serde(default)]
    pub team_name: Option<String>,
    pub rank: u8,
    #[serde(default)]
    pub prize: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NewWinner {
    pub registration_id: String,
    pub rank: u8,
    #[serde(default)]
    pub prize: String,
}

impl NewWinner {
    pub fn is_valid(&self) -> bool {
        !self.registration_id.trim().is_empty() && RANKS.contains(&self.rank)
    }
}
