//! Write commands for direct row edits: `save`, `delete` and `clear`.
//!
//! Values arrive as `column=value` text from the command line and are
//! converted to the column's storage class here. An empty value stores
//! `NULL`. Blob columns take `@path` to read a file, or base64 text.

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::config::Config;
use crate::db;
use crate::store::{self, ColumnKind, FieldValue, Table};

/// Converts one `column=value` pair to a typed field for `table`.
pub fn parse_field(table: Table, column: &str, raw: &str) -> Result<(&'static str, FieldValue)> {
    let Some(col) = table.column(column) else {
        bail!("table {} has no column '{}'", table, column);
    };

    let value = match col.kind {
        ColumnKind::Text if raw.is_empty() => FieldValue::Text(None),
        ColumnKind::Text => FieldValue::Text(Some(raw.to_string())),
        ColumnKind::Integer if raw.is_empty() => FieldValue::Integer(None),
        ColumnKind::Integer => FieldValue::Integer(Some(
            raw.parse::<i64>()
                .with_context(|| format!("{}.{} expects an integer", table, column))?,
        )),
        ColumnKind::Blob if raw.is_empty() => FieldValue::Blob(None),
        ColumnKind::Blob => {
            let bytes = match raw.strip_prefix('@') {
                Some(path) => std::fs::read(path)
                    .with_context(|| format!("Failed to read {} for {}.{}", path, table, column))?,
                None => STANDARD
                    .decode(raw.trim())
                    .with_context(|| format!("{}.{} expects @path or base64", table, column))?,
            };
            FieldValue::Blob(Some(bytes))
        }
    };

    Ok((col.name, value))
}

/// Inserts a new row, or updates row `id` when given.
pub async fn run_save(
    config: &Config,
    table: Table,
    id: Option<i64>,
    assignments: &[(String, String)],
) -> Result<()> {
    let fields = assignments
        .iter()
        .map(|(column, raw)| parse_field(table, column, raw))
        .collect::<Result<Vec<_>>>()?;

    let pool = db::connect(config).await?;
    let mut conn = pool.acquire().await?;

    let outcome = match id {
        Some(id) => store::update(&mut conn, table, id, &fields)
            .await
            .map(|found| found.then_some(id)),
        None => store::insert(&mut conn, table, &fields).await.map(Some),
    };

    drop(conn);
    pool.close().await;

    match (outcome?, id) {
        (Some(saved), Some(_)) => println!("updated {} {}", table, saved),
        (Some(saved), None) => println!("inserted {} {}", table, saved),
        (None, _) => bail!("{} row not found: {}", table, id.unwrap_or_default()),
    }

    Ok(())
}

pub async fn run_delete(config: &Config, table: Table, id: i64) -> Result<()> {
    let pool = db::connect(config).await?;
    let mut conn = pool.acquire().await?;
    let deleted = store::delete(&mut conn, table, id).await;
    drop(conn);
    pool.close().await;

    if !deleted? {
        bail!("{} row not found: {}", table, id);
    }
    println!("deleted {} {}", table, id);
    Ok(())
}

pub async fn run_clear(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let mut conn = pool.acquire().await?;
    let cleared = store::clear_all(&mut conn).await;
    drop(conn);
    pool.close().await;

    cleared?;
    println!("cleared all tables");
    Ok(())
}
