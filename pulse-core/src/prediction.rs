//! Two-option prediction polls

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::PulseError;

/// A two-option prediction readers can vote on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub id: String,
    pub question: String,
    pub option_a: String,
    pub option_b: String,
    pub votes_a: u64,
    pub votes_b: u64,
    pub closes_at: DateTime<Utc>,
}

/// Vote option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteChoice {
    A,
    B,
}

impl VoteChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteChoice::A => "a",
            VoteChoice::B => "b",
        }
    }
}

impl FromStr for VoteChoice {
    type Err = PulseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "a" => Ok(VoteChoice::A),
            "b" => Ok(VoteChoice::B),
            other => Err(PulseError::validation(format!("invalid vote choice: {other}"))),
        }
    }
}

/// Vote counts after a vote was recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteTally {
    pub votes_a: u64,
    pub votes_b: u64,
}
