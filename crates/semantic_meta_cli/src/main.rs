//! Operator CLI for the semantic metadata store.
//!
//! # Responsibility
//! - Run retention sweeps (or dry-run counts) against a store database.
//! - Print version and schema information for quick sanity checks.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use semantic_meta_core::db::migrations::latest_version;
use semantic_meta_core::{
    core_version, init_logging, now_epoch_ms, open_db_with_config, EntityKind, RetentionSweeper,
    StoreConfig,
};
use std::path::PathBuf;

/// Semantic metadata store maintenance.
#[derive(Debug, Parser)]
#[command(name = "semantic-meta")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// SQLite database file.
    #[arg(long, env = "SEMANTIC_META_DB")]
    db: Option<PathBuf>,

    /// JSON configuration file.
    #[arg(long, env = "SEMANTIC_META_CONFIG")]
    config: Option<PathBuf>,

    /// Absolute directory for rolling log files; logging is off when unset.
    #[arg(long, env = "SEMANTIC_META_LOG_DIR")]
    log_dir: Option<String>,

    /// Log level override (`trace|debug|info|warn|error`).
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Physically remove expired tombstones.
    Sweep(SweepArgs),
    /// Print crate and schema versions.
    Version,
}

#[derive(Debug, Args)]
struct SweepArgs {
    /// Entity kind to sweep; every kind when omitted.
    #[arg(long, value_parser = parse_kind)]
    kind: Option<EntityKind>,

    /// Remove tombstones older than this epoch-ms instant instead of the
    /// configured retention window.
    #[arg(long)]
    cutoff_ms: Option<i64>,

    /// Maximum rows removed per table.
    #[arg(long)]
    limit: Option<u32>,

    /// Count eligible rows without deleting.
    #[arg(long)]
    dry_run: bool,
}

fn parse_kind(value: &str) -> Result<EntityKind, String> {
    EntityKind::parse(value).ok_or_else(|| {
        format!("unknown kind `{value}`; expected metric|word_root|value_domain|metric_modifier|unit")
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    if let Some(log_dir) = &cli.log_dir {
        init_logging(&config.log_level, log_dir).context("failed to initialize logging")?;
    }

    match &cli.command {
        Commands::Sweep(args) => run_sweep(&cli, &config, args),
        Commands::Version => {
            println!("semantic-meta version={}", core_version());
            println!("semantic-meta schema_version={}", latest_version());
            Ok(())
        }
    }
}

fn load_config(cli: &Cli) -> Result<StoreConfig> {
    let mut config = match &cli.config {
        Some(path) => StoreConfig::from_json_file(path)
            .with_context(|| format!("failed to load config `{}`", path.display()))?,
        None => StoreConfig::default(),
    };
    if let Some(level) = &cli.log_level {
        config.log_level = level.trim().to_ascii_lowercase();
        config.validate().context("invalid --log-level")?;
    }
    Ok(config)
}

fn run_sweep(cli: &Cli, config: &StoreConfig, args: &SweepArgs) -> Result<()> {
    let Some(db_path) = &cli.db else {
        bail!("--db is required for sweep");
    };
    let conn = open_db_with_config(db_path, config)
        .with_context(|| format!("failed to open `{}`", db_path.display()))?;
    let sweeper = RetentionSweeper::try_new(&conn, config.clone())?;

    let cutoff_ms = args
        .cutoff_ms
        .unwrap_or_else(|| config.retention_cutoff(now_epoch_ms()));
    let limit = args.limit.unwrap_or(config.sweep_batch_limit);
    let kinds = match args.kind {
        Some(kind) => vec![kind],
        None => EntityKind::ALL.to_vec(),
    };

    let mut total = 0;
    for kind in kinds {
        let count = if args.dry_run {
            sweeper.pending(kind, cutoff_ms)?
        } else {
            sweeper.sweep(kind, cutoff_ms, limit)?
        };
        let label = if args.dry_run { "pending" } else { "removed" };
        println!("kind={kind} {label}={count}");
        total += count;
    }

    info!(
        "event=cli_sweep module=cli status=ok dry_run={} cutoff_ms={} total={}",
        args.dry_run, cutoff_ms, total
    );
    println!("total={total}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Cli, Commands};
    use clap::Parser;
    use semantic_meta_core::EntityKind;

    #[test]
    fn sweep_arguments_parse() {
        let cli = Cli::try_parse_from([
            "semantic-meta",
            "--db",
            "/tmp/store.db",
            "sweep",
            "--kind",
            "word-root",
            "--limit",
            "10",
            "--dry-run",
        ])
        .unwrap();

        let Commands::Sweep(args) = cli.command else {
            panic!("expected sweep command");
        };
        assert_eq!(args.kind, Some(EntityKind::WordRoot));
        assert_eq!(args.limit, Some(10));
        assert!(args.dry_run);
        assert!(args.cutoff_ms.is_none());
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let result = Cli::try_parse_from(["semantic-meta", "sweep", "--kind", "table"]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
