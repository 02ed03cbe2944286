//! `billdoc` command-line entry point.
//!
//! # Responsibility
//! - Resolve configuration from the environment and global flags.
//! - Dispatch subcommands to the core submission and erasure services.
//! - Print results and failures as JSON on stdout.
//!
//! # Exit codes
//! - `0` success, `1` operation rejected or failed, `2` setup error.

use billdoc_core::logging::{normalize_level, normalize_log_dir};
use billdoc_core::{
    init_logging, open_db, open_db_in_memory, Binary, CallerIdentity, CoreConfig, CoreContext,
    Document, DocumentRules, Invoice, Issue, OperationOutcome, Resource, ResourceKind,
    ResourceStore, Severity, SqliteResourceStore, StoreError, SubjectAccessPolicy,
    SubmissionMode, TypedId, UuidTokenGenerator,
};
use clap::{Parser, Subcommand};
use log::{error, info};
use rusqlite::Connection;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Billing document intake and erasure.
#[derive(Parser, Debug)]
#[command(name = "billdoc", version, about)]
struct Cli {
    /// SQLite database file; overrides `BILLDOC_DB_PATH`.
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Log level; overrides `BILLDOC_LOG_LEVEL`.
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Absolute log directory; overrides `BILLDOC_LOG_DIR`.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a document JSON file and, in normal mode, store it.
    Submit {
        file: PathBuf,
        /// `normal` persists; anything else only validates.
        #[arg(long, default_value = "test")]
        mode: String,
    },
    /// Erase a trashed document and everything it references.
    Erase {
        id: String,
        /// Check access for this subject before erasing.
        #[arg(long = "as")]
        subject: Option<String>,
    },
    /// Tag a stored document as trash.
    Trash { id: String },
    /// Print a stored resource.
    Show {
        /// `DocumentReference`, `Invoice` or `Binary`.
        kind: String,
        id: String,
    },
}

/// Command result: JSON payload plus success flag.
type Reply = (Value, bool);

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(message) => return setup_failure(&message),
    };
    if let Err(message) = init_logging(config.log_level, config.log_target()) {
        return setup_failure(&message);
    }

    let opened = match &config.db_path {
        Some(path) => open_db(path),
        None => open_db_in_memory(),
    };
    let conn = match opened {
        Ok(conn) => conn,
        Err(err) => return setup_failure(&format!("failed to open database: {err}")),
    };

    let (payload, ok) = run(&conn, cli.command);
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string())
    );
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

fn resolve_config(cli: &Cli) -> Result<CoreConfig, String> {
    let mut config = CoreConfig::from_env().map_err(|err| err.to_string())?;
    if let Some(db) = &cli.db {
        config.db_path = Some(db.clone());
    }
    if let Some(level) = &cli.log_level {
        config.log_level = normalize_level(level)?;
    }
    if let Some(dir) = &cli.log_dir {
        config.log_dir = Some(normalize_log_dir(dir)?);
    }
    Ok(config)
}

fn setup_failure(message: &str) -> ExitCode {
    eprintln!("billdoc: {message}");
    ExitCode::from(2)
}

fn run(conn: &Connection, command: Commands) -> Reply {
    let context = CoreContext::new(
        SqliteResourceStore::new(conn),
        DocumentRules,
        UuidTokenGenerator,
    );

    match command {
        Commands::Submit { file, mode } => submit(&context, &file, SubmissionMode::parse(&mode)),
        Commands::Erase { id, subject } => erase(&context, &id, subject),
        Commands::Trash { id } => trash(context.store(), &id),
        Commands::Show { kind, id } => show(context.store(), &kind, &id),
    }
}

type SqliteContext<'conn> =
    CoreContext<SqliteResourceStore<'conn>, DocumentRules, UuidTokenGenerator>;

fn submit(context: &SqliteContext<'_>, file: &Path, mode: SubmissionMode) -> Reply {
    let document = match read_document(file) {
        Ok(document) => document,
        Err(message) => return rejection(None, message),
    };

    match context.submission().submit(Some(&document), mode) {
        Ok(outcome) => (
            json!({
                "mode": mode.as_str(),
                "warnings": outcome.warnings,
                "transformed": outcome.transformed,
            }),
            true,
        ),
        Err(err) => (json!({ "outcome": err.to_outcome() }), false),
    }
}

fn erase(context: &SqliteContext<'_>, id: &str, subject: Option<String>) -> Reply {
    let cascade = context.erasure();
    let result = match subject {
        Some(subject) => cascade.erase_as(&CallerIdentity::new(subject), &SubjectAccessPolicy, id),
        None => cascade.erase(id),
    };

    match result {
        Ok(report) => (
            json!({
                "root": report.root.to_reference(),
                "deleted": references(&report.deleted),
                "skipped": references(&report.skipped),
                "outcome": report.outcome,
            }),
            true,
        ),
        Err(err) => (json!({ "outcome": err.to_outcome() }), false),
    }
}

fn trash(store: &SqliteResourceStore<'_>, id: &str) -> Reply {
    let target = match TypedId::document(id) {
        Ok(target) => target,
        Err(err) => return rejection(None, err.to_string()),
    };

    let result = store.in_transaction(|tx| -> Result<Option<Document>, StoreError> {
        let Some(mut document) = tx.read::<Document>(&target.id)? else {
            return Ok(None);
        };
        document.mark_trash();
        Ok(Some(tx.update(&document)?.resource))
    });

    match result {
        Ok(Some(document)) => {
            info!("event=document_trash module=cli status=ok target={target}");
            (json!({ "trashed": document }), true)
        }
        Ok(None) => rejection(Some(&target), "resource not found".to_string()),
        Err(err) => {
            error!("event=document_trash module=cli status=error target={target} error={err}");
            rejection(Some(&target), err.to_string())
        }
    }
}

fn show(store: &SqliteResourceStore<'_>, kind: &str, id: &str) -> Reply {
    let Some(kind) = ResourceKind::parse(kind) else {
        return rejection(None, format!("unknown resource kind `{kind}`"));
    };
    let target = match TypedId::new(kind, id) {
        Ok(target) => target,
        Err(err) => return rejection(None, err.to_string()),
    };

    let loaded = match kind {
        ResourceKind::Document => load::<Document>(store, &target.id),
        ResourceKind::Invoice => load::<Invoice>(store, &target.id),
        ResourceKind::Binary => load::<Binary>(store, &target.id),
    };
    match loaded {
        Ok(Some(value)) => (value, true),
        Ok(None) => rejection(Some(&target), "resource not found".to_string()),
        Err(message) => rejection(Some(&target), message),
    }
}

fn load<R: Resource>(store: &SqliteResourceStore<'_>, id: &str) -> Result<Option<Value>, String> {
    match store.read::<R>(id) {
        Ok(Some(resource)) => serde_json::to_value(resource)
            .map(Some)
            .map_err(|err| err.to_string()),
        Ok(None) => Ok(None),
        Err(err) => Err(err.to_string()),
    }
}

fn read_document(file: &Path) -> Result<Document, String> {
    let raw = std::fs::read_to_string(file)
        .map_err(|err| format!("failed to read `{}`: {err}", file.display()))?;
    serde_json::from_str(&raw)
        .map_err(|err| format!("`{}` is not a document: {err}", file.display()))
}

fn references(targets: &[TypedId]) -> Vec<String> {
    targets.iter().map(TypedId::to_reference).collect()
}

fn rejection(target: Option<&TypedId>, message: String) -> Reply {
    let issue = Issue::new(
        Severity::Error,
        target.map(TypedId::to_reference),
        message,
    );
    (json!({ "outcome": OperationOutcome::single(issue) }), false)
}
