//! Read-only row access for the CLI.
//!
//! `cbook list`, `cbook show` and `cbook attributes` all go through
//! [`crate::store`]; nothing here writes.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::db;
use crate::store::{self, StoredRow, Table};

/// Fetches one row, failing when the id does not exist.
pub async fn get_row(config: &Config, table: Table, id: i64) -> Result<StoredRow> {
    let pool = db::connect(config).await?;
    let mut conn = pool.acquire().await?;
    let row = store::fetch(&mut conn, table, id).await?;
    drop(conn);
    pool.close().await;

    match row {
        Some(row) => Ok(row),
        None => bail!("{} row not found: {}", table, id),
    }
}

pub async fn run_show(config: &Config, table: Table, id: i64, json: bool) -> Result<()> {
    let row = get_row(config, table, id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&row.to_json())?);
        return Ok(());
    }

    let width = table
        .columns()
        .iter()
        .map(|c| c.name.len())
        .max()
        .unwrap_or(0)
        + 1;

    println!("--- {} {} ---", table, row.id);
    for (name, value) in &row.fields {
        println!("{:<width$} {}", format!("{}:", name), value.display());
    }

    Ok(())
}

pub async fn run_list(config: &Config, table: Table) -> Result<()> {
    let pool = db::connect(config).await?;
    let mut conn = pool.acquire().await?;
    let labels = store::list_labels(&mut conn, table).await;
    drop(conn);
    pool.close().await;

    let labels = labels?;
    if labels.is_empty() {
        println!("No rows in {}.", table);
        return Ok(());
    }

    for (id, label) in labels {
        println!("{:>6}  {}", id, label.as_deref().unwrap_or("(unnamed)"));
    }

    Ok(())
}

pub async fn run_attributes(config: &Config, table: Table) -> Result<()> {
    let pool = db::connect(config).await?;
    let mut conn = pool.acquire().await?;
    let columns = store::list_columns(&mut conn, table).await;
    drop(conn);
    pool.close().await;

    let columns = columns?;
    if columns.is_empty() {
        bail!("table {} does not exist. Run `cbook init` first.", table);
    }

    for (name, kind) in columns {
        println!("{:<14} {}", name, kind);
    }

    Ok(())
}
