//! Command-line front end for the document engine.
//!
//! # Responsibility
//! - Expose normalize/sections/render over JSON files or stdin.
//! - Load and save records in a SQLite database through the adapter.

use adlog_core::{
    extract_sections, init_logging, normalize_document_with, open_db, to_html, to_markdown,
    to_plain_text, EditSession, EngineConfig, ExtractContext, NormalizeLimits, PersistenceAdapter,
    SqliteRecordStore, StorageBackend, StoredRecord,
};
use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use serde::Serialize;
use serde_json::Value;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Normalize, inspect and persist ad log documents
#[derive(Parser, Debug)]
#[command(name = "adlog")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = adlog_core::default_log_level())]
    log_level: String,

    /// Absolute directory for log files; logging is off when omitted
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Deepest block nesting kept while normalizing
    #[arg(long, global = true)]
    max_depth: Option<usize>,

    /// Maximum number of blocks kept per document
    #[arg(long, global = true)]
    max_blocks: Option<usize>,

    /// Section date when a record has none (YYYY-MM-DD)
    #[arg(long, global = true)]
    date: Option<String>,

    /// Log write payload previews
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the canonical form of a block document
    Normalize {
        /// Block document file, `-` for stdin
        #[arg(default_value = "-")]
        input: String,
    },

    /// Print the sections derived from a raw stored record
    Sections {
        /// Record file, `-` for stdin
        #[arg(default_value = "-")]
        input: String,
    },

    /// Render a block document as text
    Render {
        /// Block document file, `-` for stdin
        #[arg(default_value = "-")]
        input: String,

        #[arg(short, long, value_enum, default_value_t = RenderFormat::Markdown)]
        format: RenderFormat,
    },

    /// Print the sections of a record stored in a database
    Load {
        /// SQLite database path
        #[arg(long)]
        db: PathBuf,

        record_id: String,
    },

    /// Replace the first section of a stored record with a block document
    Save {
        /// SQLite database path
        #[arg(long)]
        db: PathBuf,

        record_id: String,

        /// Block document file, `-` for stdin
        #[arg(default_value = "-")]
        input: String,

        /// Section title
        #[arg(short, long)]
        title: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum RenderFormat {
    Plain,
    Markdown,
    Html,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = engine_config(&cli)?;

    if let (Some(level), Some(log_dir)) = (&config.log_level, &config.log_dir) {
        init_logging(level, log_dir)
            .map_err(|err| anyhow!("failed to initialize logging: {err}"))?;
    }

    match cli.command {
        Command::Normalize { input } => {
            let document = read_json(&input)?;
            let normalized = normalize_document_with(&document, config.limits);
            print_json(&normalized.blocks)?;
        }
        Command::Sections { input } => {
            let raw = read_json(&input)?;
            let record_id = raw
                .get(adlog_core::model::record::FIELD_RECORD_ID)
                .and_then(Value::as_str)
                .unwrap_or("stdin")
                .to_string();
            let record = StoredRecord::from_value(record_id, &raw);
            let context = ExtractContext {
                fallback_date: config.fallback_date.clone(),
                limits: config.limits,
            };
            print_json(&extract_sections(&record, &context).sections)?;
        }
        Command::Render { input, format } => {
            let document = read_json(&input)?;
            let blocks = normalize_document_with(&document, config.limits).blocks;
            let rendered = match format {
                RenderFormat::Plain => to_plain_text(&blocks),
                RenderFormat::Markdown => to_markdown(&blocks),
                RenderFormat::Html => to_html(&blocks),
            };
            println!("{rendered}");
        }
        Command::Load { record_id, .. } => {
            let mut conn = open_db(sqlite_path(&config.backend)?)?;
            let store = SqliteRecordStore::try_new(&mut conn)?;
            let adapter = PersistenceAdapter::new(store, config.adapter_options());
            print_json(&adapter.load(&record_id)?.sections)?;
        }
        Command::Save {
            record_id,
            input,
            title,
            ..
        } => {
            let document = read_json(&input)?;
            let mut conn = open_db(sqlite_path(&config.backend)?)?;
            let store = SqliteRecordStore::try_new(&mut conn)?;
            let mut adapter = PersistenceAdapter::new(store, config.adapter_options());

            let mut session = EditSession::open(&adapter, &record_id)?;
            let section_id = session
                .sections()
                .first()
                .map(|section| section.id.clone())
                .ok_or_else(|| anyhow!("record {record_id} has no sections"))?;
            session.apply_edit(&section_id, &document)?;
            if let Some(title) = title {
                session.set_title(&section_id, title)?;
            }
            let outcome = session.save(&mut adapter)?;
            info!(
                "event=cli_save module=cli status=ok record_id={record_id} shape={}",
                outcome.shape.as_str()
            );
            println!(
                "saved {record_id} as {} after {} attempt(s)",
                outcome.shape.as_str(),
                outcome.attempts
            );
        }
    }

    Ok(())
}

fn engine_config(cli: &Cli) -> Result<EngineConfig> {
    let backend = match &cli.command {
        Command::Load { db, .. } | Command::Save { db, .. } => {
            StorageBackend::Sqlite { path: db.clone() }
        }
        _ => StorageBackend::Memory,
    };
    let config = EngineConfig {
        backend,
        log_level: Some(cli.global.log_level.clone()),
        log_dir: cli.global.log_dir.clone(),
        limits: NormalizeLimits {
            max_depth: cli.global.max_depth,
            max_blocks: cli.global.max_blocks,
        },
        verbose: cli.global.verbose,
        fallback_date: cli.global.date.clone(),
    };
    config.validate()?;
    Ok(config)
}

// Records only persist across runs in a database.
fn sqlite_path(backend: &StorageBackend) -> Result<&Path> {
    match backend {
        StorageBackend::Sqlite { path } => Ok(path.as_path()),
        StorageBackend::Memory => bail!("load and save need a sqlite backend"),
    }
}

fn read_json(input: &str) -> Result<Value> {
    let text = if input == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read stdin")?;
        buffer
    } else {
        let path = Path::new(input);
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?
    };
    serde_json::from_str(&text).with_context(|| format!("{input} is not valid JSON"))
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
