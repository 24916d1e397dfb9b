// src/main.rs

use anyhow::{Context, Result};
use chrono::DateTime;
use clap::{Parser, Subcommand};
use serde_json::json;
use swdb::db::{self, history, paths};
use swdb::Transaction;
use tracing::info;

#[derive(Parser)]
#[command(name = "swdb")]
#[command(author, version, about = "Inspect the package transaction history", long_about = None)]
struct Cli {
    /// Database path (default: $SWDB_DB_DIR/history.db or /var/lib/swdb/history.db)
    #[arg(short, long, global = true)]
    db_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the history database
    Init,
    /// List recorded transactions, newest first
    List,
    /// Show one transaction with its items
    Info {
        /// Transaction ID (default: the most recent one)
        id: Option<i64>,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show why a package was installed
    Reason {
        /// Package name
        name: String,
        /// Restrict to one architecture
        #[arg(long)]
        arch: Option<String>,
    },
}

fn format_ts(ts: Option<i64>) -> String {
    ts.and_then(|ts| DateTime::from_timestamp(ts, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn cmd_list(db_path: &str) -> Result<()> {
    let conn = db::open(db_path)?;
    let summaries = history::list_transactions(&conn)?;

    if summaries.is_empty() {
        println!("No transactions recorded");
        return Ok(());
    }

    println!("{:>6} | {:<19} | {:<8} | {:>5} | Command line", "ID", "Started", "State", "Items");
    for summary in summaries {
        let record = &summary.transaction;
        println!(
            "{:>6} | {:<19} | {:<8} | {:>5} | {}",
            record.id.unwrap_or_default(),
            format_ts(record.start_ts),
            record.state.as_str(),
            summary.item_count,
            record.cmdline
        );
    }
    Ok(())
}

fn cmd_info(db_path: &str, id: Option<i64>, as_json: bool) -> Result<()> {
    let conn = db::open(db_path)?;
    let id = match id {
        Some(id) => id,
        None => history::last_transaction_id(&conn)?.context("No transactions recorded")?,
    };
    let trans = Transaction::load(&conn, id)?
        .with_context(|| format!("Transaction {} not found", id))?;

    if as_json {
        let mut items = Vec::new();
        for handle in trans.handles() {
            let item = trans.item(handle)?;
            let replaced_by: Vec<i64> = trans
                .replaced_by(handle)?
                .iter()
                .filter_map(|target| target.id())
                .collect();
            let attributes = item.kind().serialize_attributes()?;
            items.push(json!({
                "id": item.id(),
                "item": attributes,
                "repo_id": item.repo_id(),
                "action": item.action(),
                "reason": item.reason(),
                "state": item.state(),
                "replaced_by": replaced_by,
            }));
        }

        let doc = json!({
            "id": trans.id(),
            "state": trans.state(),
            "releasever": trans.releasever(),
            "user_id": trans.user_id(),
            "cmdline": trans.cmdline(),
            "comment": trans.comment(),
            "rpmdb_version_begin": trans.rpmdb_version_begin(),
            "rpmdb_version_end": trans.rpmdb_version_end(),
            "start_ts": trans.start_ts(),
            "end_ts": trans.end_ts(),
            "items": items,
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    println!("Transaction ID : {}", id);
    println!("State          : {}", trans.state());
    println!("Begin time     : {}", format_ts(trans.start_ts()));
    println!("Begin rpmdb    : {}", trans.rpmdb_version_begin());
    println!("End time       : {}", format_ts(trans.end_ts()));
    println!("End rpmdb      : {}", trans.rpmdb_version_end());
    println!("User           : {}", trans.user_id());
    println!("Releasever     : {}", trans.releasever());
    println!("Command line   : {}", trans.cmdline());
    if !trans.comment().is_empty() {
        println!("Comment        : {}", trans.comment());
    }
    println!("Items:");
    for handle in trans.handles() {
        let item = trans.item(handle)?;
        println!("  {:<7} {}", item.state().as_str(), item);
        for replacement in trans.replaced_by(handle)? {
            println!("          replaced by {}", replacement.kind());
        }
    }
    Ok(())
}

fn cmd_reason(db_path: &str, name: &str, arch: Option<&str>) -> Result<()> {
    let conn = db::open(db_path)?;
    match history::resolve_reason(&conn, name, arch)? {
        Some(reason) => println!("{}: {}", name, reason),
        None => println!("{}: not installed", name),
    }
    Ok(())
}

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db_path = cli
        .db_path
        .unwrap_or_else(|| paths::default_db_path().to_string_lossy().into_owned());

    match cli.command {
        Some(Commands::Init) => {
            info!("Initializing history database at: {}", db_path);
            db::init(&db_path)?;
            println!("Database initialized successfully at: {}", db_path);
            Ok(())
        }
        Some(Commands::List) => cmd_list(&db_path),
        Some(Commands::Info { id, json }) => cmd_info(&db_path, id, json),
        Some(Commands::Reason { name, arch }) => cmd_reason(&db_path, &name, arch.as_deref()),
        None => {
            println!("swdb v{}", env!("CARGO_PKG_VERSION"));
            println!("Run 'swdb --help' for usage information");
            Ok(())
        }
    }
}
