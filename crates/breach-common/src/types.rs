//! Ledger vocabulary shared across the workspace

use crate::error::{BreachError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Human-readable format of a logical date, e.g. `November 19 2020`
pub const LOGICAL_DATE_FORMAT: &str = "%B %d %Y";

/// Terminal state of one import run as written to the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportState {
    /// Every line and batch was accepted
    Done,
    /// At least one row or batch error was counted
    Error,
}

impl ImportState {
    /// Derive the terminal state from a run's error counter
    pub fn from_error_count(errors: u64) -> Self {
        if errors > 0 {
            ImportState::Error
        } else {
            ImportState::Done
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImportState::Done => "done",
            ImportState::Error => "error",
        }
    }
}

impl std::fmt::Display for ImportState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ImportState {
    type Err = BreachError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "done" => Ok(ImportState::Done),
            "error" => Ok(ImportState::Error),
            other => Err(BreachError::UnknownState(other.to_string())),
        }
    }
}

/// Vintage of a corpus, supplied by the operator.
///
/// This is the publication date of the data, not the wall-clock time of the
/// import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LogicalDate(NaiveDate);

impl LogicalDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Parse an optional CLI value, treating absence as an error
    pub fn parse_required(input: Option<&str>) -> Result<Self> {
        match input.map(str::trim) {
            None | Some("") => Err(BreachError::MissingDate),
            Some(value) => value.parse(),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for LogicalDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl std::str::FromStr for LogicalDate {
    type Err = BreachError;

    fn from_str(s: &str) -> Result<Self> {
        NaiveDate::parse_from_str(s.trim(), LOGICAL_DATE_FORMAT)
            .map(Self)
            .map_err(|_| BreachError::InvalidDate {
                input: s.to_string(),
            })
    }
}

impl std::fmt::Display for LogicalDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%B %-d %Y"))
    }
}
