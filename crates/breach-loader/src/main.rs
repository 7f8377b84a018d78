//! Breach Loader - bulk import of breached-credential corpora

use anyhow::{Context, Result};
use breach_common::logging::{init_logging, LogConfig, LogLevel};
use breach_common::types::LogicalDate;
use breach_loader::config::{RunConfig, DEFAULT_LEDGER_TABLE};
use breach_loader::db::{create_pool, server_version, DbConfig};
use breach_loader::identifier::IdentifierEncoding;
use breach_loader::ledger::PgImportLedger;
use breach_loader::models::RowKind;
use breach_loader::pipeline::ImportPipeline;
use breach_loader::writer::PgUpsertWriter;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// Reads `DATABASE_URL` from the environment (or `.env`).
///
/// Without any input file the command only checks connectivity.
#[derive(Parser, Debug)]
#[command(name = "breach-loader")]
#[command(author, version, about = "Bulk loader for breached-credential corpora")]
struct Cli {
    /// `hexdigest:count` file, e.g. pwned-passwords-sha1-ordered-by-hash-v8.txt
    #[arg(long, value_name = "PATH")]
    count_file: Option<PathBuf>,

    /// `hexdigest:plaintext` file
    #[arg(long, value_name = "PATH")]
    password_file: Option<PathBuf>,

    /// `hexdigest:count` file stored as compact identifiers only
    #[arg(long, value_name = "PATH")]
    presence_file: Option<PathBuf>,

    /// Publication date of the corpus, e.g. "November 19 2020"
    #[arg(long, value_name = "DATE")]
    date: Option<String>,

    /// Rows per upsert statement, applied to every file (defaults depend on the file kind)
    #[arg(long)]
    batch_size: Option<usize>,

    /// Identifier encoding (defaults depend on the file kind); single file only
    #[arg(long, value_enum)]
    identifier_encoding: Option<IdentifierEncoding>,

    /// Destination table (defaults: hibp, hibp_compact for presence); single file only
    #[arg(long)]
    table: Option<String>,

    /// Width of the identifier column when the table is created; single file only
    #[arg(long)]
    identifier_width: Option<u16>,

    /// Ledger table
    #[arg(long, default_value = DEFAULT_LEDGER_TABLE)]
    ledger_table: String,

    /// Ledger source name, applied to every file of this invocation
    #[arg(long)]
    source_name: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Files to import, in the order they run
    fn jobs(&self) -> Vec<(RowKind, PathBuf)> {
        [
            (RowKind::Count, &self.count_file),
            (RowKind::Password, &self.password_file),
            (RowKind::Presence, &self.presence_file),
        ]
        .into_iter()
        .filter_map(|(kind, path)| path.clone().map(|path| (kind, path)))
        .collect()
    }

    /// Table and identifier overrides cannot be shared by files whose
    /// default tables or encodings differ
    fn check_overrides(&self) -> Result<()> {
        let files = self.jobs().len();
        let overridden: Vec<&str> = [
            ("--table", self.table.is_some()),
            ("--identifier-encoding", self.identifier_encoding.is_some()),
            ("--identifier-width", self.identifier_width.is_some()),
        ]
        .into_iter()
        .filter_map(|(flag, set)| set.then_some(flag))
        .collect();

        if files > 1 && !overridden.is_empty() {
            anyhow::bail!(
                "{} can only be used with a single input file, {} were given",
                overridden.join(", "),
                files
            );
        }
        Ok(())
    }

    fn run_config(&self, kind: RowKind) -> RunConfig {
        let mut config = RunConfig::for_kind(kind).with_ledger_table(self.ledger_table.clone());

        if let Some(batch_size) = self.batch_size {
            config = config.with_batch_size(batch_size);
        }
        if let Some(encoding) = self.identifier_encoding {
            config = config.with_encoding(encoding);
        }
        if let Some(ref table) = self.table {
            config = config.with_table(table.clone());
        }
        if let Some(width) = self.identifier_width {
            config = config.with_identifier_width(width);
        }
        if let Some(ref name) = self.source_name {
            config = config.with_source_name(name.clone());
        }

        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    // Environment variables take precedence
    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("breach-loader")
        .filter_directives("sqlx=warn")
        .build()
        .merge_env()?;

    let _log_guard = init_logging(&log_config)?;

    cli.check_overrides()?;
    let jobs = cli.jobs();
    let logical_date = if jobs.is_empty() {
        None
    } else {
        Some(LogicalDate::parse_required(cli.date.as_deref())?)
    };

    // Validate every run before touching the database
    let configs = jobs
        .iter()
        .map(|(kind, path)| {
            let config = cli.run_config(*kind);
            config
                .validate()
                .with_context(|| format!("Invalid settings for {}", path.display()))?;
            Ok(config)
        })
        .collect::<Result<Vec<_>>>()?;

    let db_config = DbConfig::from_env()?;
    let pool = create_pool(&db_config)
        .await
        .context("Failed to connect to database")?;
    info!("Connected to PG: {}", server_version(&pool).await?);

    let Some(logical_date) = logical_date else {
        info!("No input file given, connectivity check only");
        return Ok(());
    };
    info!(date = %logical_date, "File import date");

    for ((kind, path), config) in jobs.into_iter().zip(configs) {
        let pipeline = ImportPipeline::new(
            config.clone(),
            PgUpsertWriter::new(pool.clone(), config.layout.clone()),
            PgImportLedger::new(pool.clone(), config.ledger_table.clone()),
        )?;

        let summary = pipeline
            .run(&path, logical_date)
            .await
            .with_context(|| format!("Import of {} aborted", path.display()))?;

        info!(
            kind = %kind,
            accepted = summary.accepted,
            errors = summary.errors(),
            state = %summary.state,
            "{} import {} records",
            kind,
            summary.accepted
        );
    }

    pool.close().await;
    Ok(())
}
