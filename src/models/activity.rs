use std::fmt;
use std::str::FromStr;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum ActivityValidationError {
    #[error("Hours spent must be a non-negative number (got {0})")]
    InvalidHours(f64),
}

/// Time logged against a project.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Activity {
    id: Uuid,
    project_id: Uuid,
    description: String,
    hours_spent: f64,
    date: Timestamp,
    activity_type: ActivityType,
}

impl Activity {
    pub fn new(
        id: Uuid,
        project_id: Uuid,
        description: impl Into<String>,
        hours_spent: f64,
        date: Timestamp,
        activity_type: ActivityType,
    ) -> Result<Activity, ActivityValidationError> {
        if !hours_spent.is_finite() || hours_spent < 0.0 {
            return Err(ActivityValidationError::InvalidHours(hours_spent));
        }
        Ok(Activity {
            id,
            project_id,
            description: description.into(),
            hours_spent,
            date,
            activity_type,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn project_id(&self) -> Uuid {
        self.project_id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn hours_spent(&self) -> f64 {
        self.hours_spent
    }

    pub fn date(&self) -> Timestamp {
        self.date
    }

    pub fn activity_type(&self) -> ActivityType {
        self.activity_type
    }
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActivityType {
    Planning,
    Development,
    Testing,
    Meeting,
    #[default]
    Other,
}

impl ActivityType {
    pub const ALL: [ActivityType; 5] = [
        ActivityType::Planning,
        ActivityType::Development,
        ActivityType::Testing,
        ActivityType::Meeting,
        ActivityType::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActivityType::Planning => "Planning",
            ActivityType::Development => "Development",
            ActivityType::Testing => "Testing",
            ActivityType::Meeting => "Meeting",
            ActivityType::Other => "Other",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("Unknown activity type '{0}'")]
pub struct UnknownActivityType(pub String);

impl FromStr for ActivityType {
    type Err = UnknownActivityType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ActivityType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| UnknownActivityType(value.to_string()))
    }
}
