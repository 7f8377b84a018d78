//! Row and ledger types flowing through the pipeline

use breach_common::types::{ImportState, LogicalDate};
use serde::{Deserialize, Serialize};

/// Primary key column of the credential table
pub const IDENTIFIER_COLUMN: &str = "hibp_id";
pub const COUNT_COLUMN: &str = "count";
pub const PASSWORD_COLUMN: &str = "password";

/// Which variant of [`Row`] a run produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    /// `hexdigest:count` lines, count column updated on conflict
    Count,
    /// `hexdigest:plaintext` lines, password column updated on conflict
    Password,
    /// Identifier only, first writer wins
    Presence,
}

/// What an upsert does when the identifier already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Overwrite exactly these columns from the incoming row
    UpdateColumns(&'static [&'static str]),
    /// Keep the existing record untouched
    DoNothing,
}

impl RowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowKind::Count => "count",
            RowKind::Password => "password",
            RowKind::Presence => "presence",
        }
    }

    /// Insert column list, identifier first
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            RowKind::Count => &[IDENTIFIER_COLUMN, COUNT_COLUMN],
            RowKind::Password => &[IDENTIFIER_COLUMN, PASSWORD_COLUMN],
            RowKind::Presence => &[IDENTIFIER_COLUMN],
        }
    }

    pub fn conflict_policy(&self) -> ConflictPolicy {
        match self {
            RowKind::Count => ConflictPolicy::UpdateColumns(&[COUNT_COLUMN]),
            RowKind::Password => ConflictPolicy::UpdateColumns(&[PASSWORD_COLUMN]),
            RowKind::Presence => ConflictPolicy::DoNothing,
        }
    }

    /// Bound parameters contributed by one row
    pub fn params_per_row(&self) -> usize {
        self.columns().len()
    }
}

impl std::fmt::Display for RowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One accepted input line, ready to be upserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    Count { identifier: String, count: i32 },
    Password { identifier: String, password: String },
    Presence { identifier: String },
}

impl Row {
    pub fn kind(&self) -> RowKind {
        match self {
            Row::Count { .. } => RowKind::Count,
            Row::Password { .. } => RowKind::Password,
            Row::Presence { .. } => RowKind::Presence,
        }
    }

    pub fn identifier(&self) -> &str {
        match self {
            Row::Count { identifier, .. }
            | Row::Password { identifier, .. }
            | Row::Presence { identifier } => identifier,
        }
    }
}

/// Audit record of one completed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub source_name: String,
    pub state: ImportState,
    pub logical_date: LogicalDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_lead_with_identifier() {
        for kind in [RowKind::Count, RowKind::Password, RowKind::Presence] {
            assert_eq!(kind.columns()[0], IDENTIFIER_COLUMN);
        }
        assert_eq!(RowKind::Count.params_per_row(), 2);
        assert_eq!(RowKind::Presence.params_per_row(), 1);
    }

    #[test]
    fn test_conflict_policy_touches_only_own_column() {
        assert_eq!(
            RowKind::Count.conflict_policy(),
            ConflictPolicy::UpdateColumns(&[COUNT_COLUMN])
        );
        assert_eq!(
            RowKind::Password.conflict_policy(),
            ConflictPolicy::UpdateColumns(&[PASSWORD_COLUMN])
        );
        assert_eq!(RowKind::Presence.conflict_policy(), ConflictPolicy::DoNothing);
    }

    #[test]
    fn test_row_accessors() {
        let row = Row::Password {
            identifier: "abc".to_string(),
            password: "hunter2".to_string(),
        };
        assert_eq!(row.kind(), RowKind::Password);
        assert_eq!(row.identifier(), "abc");
    }
}
