use std::fmt;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Record {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Roll Number", alias = "Roll No", default)]
    pub roll: Option<String>,
    #[serde(rename = "Email", default)]
    pub email: Option<String>,
    #[serde(rename = "Course Name")]
    pub course: String,
    #[serde(rename = "Course Code")]
    pub code: String,
    #[serde(rename = "Present")]
    pub present: String,
    #[serde(rename = "Total Sessions")]
    pub total: String,
    #[serde(rename = "Average")]
    pub average: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StudentKey {
    pub name: String,
    pub roll: Option<String>,
}

impl fmt::Display for StudentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.roll {
            Some(roll) => write!(f, "{} ({})", self.name, roll),
            None => write!(f, "{}", self.name),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Group {
    pub key: StudentKey,
    pub records: Vec<Record>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    SkippedNoAddress,
    SkippedNoQualifyingRows,
    Failed(String),
}

impl fmt::Display for SendOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendOutcome::Sent => write!(f, "sent"),
            SendOutcome::SkippedNoAddress => write!(f, "skipped, no address"),
            SendOutcome::SkippedNoQualifyingRows => write!(f, "skipped, no qualifying rows"),
            SendOutcome::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecipientStatus {
    pub student: StudentKey,
    pub address: Option<String>,
    pub outcome: SendOutcome,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub sent: usize,
    pub skipped_no_address: usize,
    pub skipped_no_rows: usize,
    pub failed: usize,
    pub statuses: Vec<RecipientStatus>,
}

impl RunSummary {
    pub fn record(&mut self, status: RecipientStatus) {
        match status.outcome {
            SendOutcome::Sent => self.sent += 1,
            SendOutcome::SkippedNoAddress => self.skipped_no_address += 1,
            SendOutcome::SkippedNoQualifyingRows => self.skipped_no_rows += 1,
            SendOutcome::Failed(_) => self.failed += 1,
        }
        self.statuses.push(status);
    }

    pub fn total(&self) -> usize {
        self.statuses.len()
    }
}
