//! # Contact Book CLI (`cbook`)
//!
//! The `cbook` binary manages a local contact database and imports vCard
//! files into it.
//!
//! ## Usage
//!
//! ```bash
//! cbook --config ./config/contacts.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `cbook init` | Create the SQLite database and its tables |
//! | `cbook import <file>` | Import every card of a `.vcf` file |
//! | `cbook list <table>` | List row ids with their display column |
//! | `cbook show <table> <id>` | Print one row |
//! | `cbook attributes <table>` | Print column names and types |
//! | `cbook save <table> --set col=value` | Insert a row, or update one with `--id` |
//! | `cbook delete <table> <id>` | Delete one row |
//! | `cbook clear` | Delete every row of every table |
//! | `cbook stats` | Row counts and database size |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the database
//! cbook init
//!
//! # Preview an import, then run it
//! cbook import ./export.vcf --dry-run
//! cbook import ./export.vcf
//!
//! # Fix a phone number by hand
//! cbook save contact --id 3 --set tel=555-0100
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `warn`); logs go to stderr.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use contact_book::store::Table;
use contact_book::{config, edit, get, ingest, migrate, stats};

/// Contact Book CLI: a local contact database with vCard import.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/contacts.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "cbook",
    about = "Contact Book: a local contact database with vCard import",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/contacts.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the contact, groups, role,
    /// is_in and other tables. Running it again leaves existing rows alone.
    Init,

    /// Import a vCard file.
    ///
    /// Every card becomes one contact row, plus group, role, membership
    /// and other rows when the card carries that data. Importing the same
    /// file twice stores every card twice.
    Import {
        /// Path to the `.vcf` file.
        file: PathBuf,

        /// Parse and assemble the cards without writing anything.
        #[arg(long)]
        dry_run: bool,
    },

    /// List row ids and their display column.
    List {
        /// Table name: contact, groups, role or other.
        table: Table,
    },

    /// Show every column of one row.
    Show {
        table: Table,
        id: i64,

        /// Print JSON instead of aligned text. Blobs are base64.
        #[arg(long)]
        json: bool,
    },

    /// Print the column names and declared types of a table.
    Attributes { table: Table },

    /// Insert a row, or update an existing one with `--id`.
    Save {
        table: Table,

        /// Row to update. Omit to insert.
        #[arg(long)]
        id: Option<i64>,

        /// Column assignment; repeatable. Empty value stores NULL; blob
        /// columns take `@path` or base64.
        #[arg(long = "set", value_parser = parse_key_val, required = true)]
        fields: Vec<(String, String)>,
    },

    /// Delete one row. Rows that reference it are kept.
    Delete { table: Table, id: i64 },

    /// Delete every row of every table.
    Clear,

    /// Show row counts and database size.
    Stats,
}

/// Parse a `key=value` pair for `--set` arguments.
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no '=' found in '{}'", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Import { file, dry_run } => {
            ingest::run_import(&cfg, &file, dry_run).await?;
        }
        Commands::List { table } => {
            get::run_list(&cfg, table).await?;
        }
        Commands::Show { table, id, json } => {
            get::run_show(&cfg, table, id, json).await?;
        }
        Commands::Attributes { table } => {
            get::run_attributes(&cfg, table).await?;
        }
        Commands::Save { table, id, fields } => {
            edit::run_save(&cfg, table, id, &fields).await?;
        }
        Commands::Delete { table, id } => {
            edit::run_delete(&cfg, table, id).await?;
        }
        Commands::Clear => {
            edit::run_clear(&cfg).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}
