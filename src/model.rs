use serde::Deserialize;
use std::str::FromStr;

use crate::error::WatchError;

/// First entry of the `homeworks` list. Both fields are optional on the wire;
/// the formatter decides whether their absence is an error.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct HomeworkRecord {
    #[serde(default)]
    pub homework_name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl HomeworkRecord {
    pub fn new(name: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            homework_name: Some(name.into()),
            status: Some(status.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeworkStatus {
    Approved,
    Reviewing,
    Rejected,
}

impl HomeworkStatus {
    pub fn verdict(&self) -> &'static str {
        match self {
            HomeworkStatus::Approved => "Работа проверена: ревьюеру всё понравилось. Ура!",
            HomeworkStatus::Reviewing => "Работа взята на проверку ревьюером.",
            HomeworkStatus::Rejected => "Работа проверена: у ревьюера есть замечания.",
        }
    }
}

impl FromStr for HomeworkStatus {
    type Err = WatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approved" => Ok(HomeworkStatus::Approved),
            "reviewing" => Ok(HomeworkStatus::Reviewing),
            "rejected" => Ok(HomeworkStatus::Rejected),
            other => Err(WatchError::UnknownStatusCode(other.to_string())),
        }
    }
}
