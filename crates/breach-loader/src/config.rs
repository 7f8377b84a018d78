//! Per-run configuration
//!
//! Batch size and table layout are policy, so they live here as values with
//! per-kind defaults rather than as constants in the pipeline.

use crate::error::ConfigError;
use crate::identifier::IdentifierEncoding;
use crate::models::RowKind;
use serde::{Deserialize, Serialize};

// ============================================================================
// Defaults
// ============================================================================

/// Postgres accepts at most this many bind parameters in one statement.
pub const PG_MAX_BIND_PARAMS: usize = 65_535;

/// Batch size for two-column rows (count or password)
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

/// Batch size for single-column presence rows
pub const DEFAULT_PRESENCE_BATCH_SIZE: usize = 60_000;

/// Credential table for hex identifiers (count and password runs)
pub const DEFAULT_TABLE: &str = "hibp";

/// Credential table for Ascii85 identifiers (presence runs)
pub const DEFAULT_COMPACT_TABLE: &str = "hibp_compact";

pub const DEFAULT_LEDGER_TABLE: &str = "imports";

/// Digest length of the corpora's SHA-1 keys, in bytes
pub const SHA1_DIGEST_LEN: usize = 20;

/// Longest table name Postgres keeps without truncation
const MAX_IDENTIFIER_LEN: usize = 63;

/// Column widths and name of the credential table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableLayout {
    pub table: String,
    pub identifier_width: u16,
    pub password_width: u16,
}

impl TableLayout {
    /// Hex identifiers up to SHA-1 width and long passwords
    pub fn wide() -> Self {
        Self {
            table: DEFAULT_TABLE.to_string(),
            identifier_width: 40,
            password_width: 200,
        }
    }

    /// Ascii85 identifiers of a SHA-1 digest, kept apart from hex identifiers
    pub fn compact() -> Self {
        Self {
            table: DEFAULT_COMPACT_TABLE.to_string(),
            identifier_width: 25,
            password_width: 150,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_table_name(&self.table)?;
        if self.identifier_width == 0 || self.password_width == 0 {
            return Err(ConfigError::ZeroWidth);
        }
        Ok(())
    }
}

/// Everything one pipeline run needs to know besides its input and stores
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    pub kind: RowKind,
    pub encoding: IdentifierEncoding,
    pub batch_size: usize,
    pub layout: TableLayout,
    pub ledger_table: String,
    /// Name recorded in the ledger for this corpus
    pub source_name: String,
}

impl RunConfig {
    /// Defaults for a run producing rows of `kind`
    pub fn for_kind(kind: RowKind) -> Self {
        let (encoding, batch_size, layout, source_name) = match kind {
            RowKind::Count => (
                IdentifierEncoding::LowerHex,
                DEFAULT_BATCH_SIZE,
                TableLayout::wide(),
                "pwned-passwords-sha1",
            ),
            RowKind::Password => (
                IdentifierEncoding::LowerHex,
                DEFAULT_BATCH_SIZE,
                TableLayout::wide(),
                "pwned-passwords-plain",
            ),
            RowKind::Presence => (
                IdentifierEncoding::Ascii85,
                DEFAULT_PRESENCE_BATCH_SIZE,
                TableLayout::compact(),
                "pwned-passwords-sha1-compact",
            ),
        };

        Self {
            kind,
            encoding,
            batch_size,
            layout,
            ledger_table: DEFAULT_LEDGER_TABLE.to_string(),
            source_name: source_name.to_string(),
        }
    }

    pub fn with_encoding(mut self, encoding: IdentifierEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.layout.table = table.into();
        self
    }

    pub fn with_identifier_width(mut self, width: u16) -> Self {
        self.layout.identifier_width = width;
        self
    }

    pub fn with_ledger_table(mut self, table: impl Into<String>) -> Self {
        self.ledger_table = table.into();
        self
    }

    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = name.into();
        self
    }

    /// Check the run can be executed against Postgres as configured
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }

        let params = self.batch_size.saturating_mul(self.kind.params_per_row());
        if params > PG_MAX_BIND_PARAMS {
            return Err(ConfigError::TooManyParameters {
                batch_size: self.batch_size,
                params,
                limit: PG_MAX_BIND_PARAMS,
            });
        }

        self.layout.validate()?;

        let needed = self.encoding.encoded_width(SHA1_DIGEST_LEN);
        if needed > usize::from(self.layout.identifier_width) {
            return Err(ConfigError::IdentifierTooWide {
                encoding: self.encoding,
                needed,
                width: self.layout.identifier_width,
            });
        }

        validate_table_name(&self.ledger_table)
    }
}

/// Accept `name` or `schema.name` made of lowercase ASCII, digits and `_`.
///
/// Table names are interpolated into SQL, so nothing else is allowed.
pub fn validate_table_name(name: &str) -> Result<(), ConfigError> {
    let invalid = || ConfigError::InvalidTableName(name.to_string());

    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() > 2 {
        return Err(invalid());
    }

    for part in parts {
        let mut chars = part.chars();
        let first_ok = chars
            .next()
            .is_some_and(|c| c.is_ascii_lowercase() || c == '_');
        let rest_ok = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !first_ok || !rest_ok || part.len() > MAX_IDENTIFIER_LEN {
            return Err(invalid());
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_per_kind() {
        let count = RunConfig::for_kind(RowKind::Count);
        assert_eq!(count.encoding, IdentifierEncoding::LowerHex);
        assert_eq!(count.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(count.layout.identifier_width, 40);
        assert_eq!(count.source_name, "pwned-passwords-sha1");

        let presence = RunConfig::for_kind(RowKind::Presence);
        assert_eq!(presence.encoding, IdentifierEncoding::Ascii85);
        assert_eq!(presence.batch_size, DEFAULT_PRESENCE_BATCH_SIZE);
        assert_eq!(presence.layout.identifier_width, 25);
        assert_eq!(presence.layout.table, DEFAULT_COMPACT_TABLE);

        for kind in [RowKind::Count, RowKind::Password, RowKind::Presence] {
            RunConfig::for_kind(kind).validate().unwrap();
        }
    }

    #[test]
    fn test_batch_size_limits() {
        let zero = RunConfig::for_kind(RowKind::Count).with_batch_size(0);
        assert_eq!(zero.validate(), Err(ConfigError::ZeroBatchSize));

        // Two parameters per row: 40_000 rows is over the limit
        let wide = RunConfig::for_kind(RowKind::Password).with_batch_size(40_000);
        assert!(matches!(
            wide.validate(),
            Err(ConfigError::TooManyParameters { params: 80_000, .. })
        ));

        // One parameter per row: 65_535 rows still fit
        let presence = RunConfig::for_kind(RowKind::Presence).with_batch_size(65_535);
        assert!(presence.validate().is_ok());
    }

    #[test]
    fn test_hex_and_ascii85_runs_use_separate_tables() {
        let count = RunConfig::for_kind(RowKind::Count);
        let password = RunConfig::for_kind(RowKind::Password);
        let presence = RunConfig::for_kind(RowKind::Presence);

        assert_eq!(count.layout.table, DEFAULT_TABLE);
        assert_eq!(password.layout.table, count.layout.table);
        assert_ne!(presence.layout.table, count.layout.table);
    }

    #[test]
    fn test_identifier_must_fit_column() {
        // Hex into a compact column
        let narrow = RunConfig::for_kind(RowKind::Count).with_identifier_width(25);
        assert_eq!(
            narrow.validate(),
            Err(ConfigError::IdentifierTooWide {
                encoding: IdentifierEncoding::LowerHex,
                needed: 40,
                width: 25,
            })
        );

        let hex_presence =
            RunConfig::for_kind(RowKind::Presence).with_encoding(IdentifierEncoding::LowerHex);
        assert!(matches!(
            hex_presence.validate(),
            Err(ConfigError::IdentifierTooWide { needed: 40, .. })
        ));

        // Ascii85 fits the wide column
        let compact_count =
            RunConfig::for_kind(RowKind::Count).with_encoding(IdentifierEncoding::Ascii85);
        assert!(compact_count.validate().is_ok());
    }

    #[test]
    fn test_table_names() {
        assert!(validate_table_name("hibp").is_ok());
        assert!(validate_table_name("breach.hibp_v8").is_ok());
        assert!(validate_table_name("_staging").is_ok());

        assert!(validate_table_name("").is_err());
        assert!(validate_table_name("Hibp").is_err());
        assert!(validate_table_name("9lives").is_err());
        assert!(validate_table_name("hibp; DROP TABLE imports").is_err());
        assert!(validate_table_name("a.b.c").is_err());
        assert!(validate_table_name(&"x".repeat(64)).is_err());
    }

    #[test]
    fn test_overrides() {
        let config = RunConfig::for_kind(RowKind::Count)
            .with_table("hibp_compact")
            .with_identifier_width(25)
            .with_encoding(IdentifierEncoding::Ascii85)
            .with_ledger_table("ledger")
            .with_source_name("combo-list");

        assert_eq!(config.layout.table, "hibp_compact");
        assert_eq!(config.layout.identifier_width, 25);
        assert_eq!(config.encoding, IdentifierEncoding::Ascii85);
        assert_eq!(config.ledger_table, "ledger");
        assert_eq!(config.source_name, "combo-list");
        assert!(config.validate().is_ok());

        let bad = config.with_ledger_table("Imports");
        assert!(bad.validate().is_err());
    }
}
