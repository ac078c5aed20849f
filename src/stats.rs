//! Database statistics.
//!
//! Row counts for every table plus the size of the database file, so
//! `cbook stats` can confirm an import landed where expected.

use anyhow::Result;

use crate::config::Config;
use crate::db;
use crate::store::{self, Table};

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let mut conn = pool.acquire().await?;

    let mut counts = Vec::with_capacity(Table::ALL.len());
    for table in Table::ALL {
        counts.push((table, store::count(&mut conn, table).await?));
    }

    // Contacts with no membership row.
    let unaffiliated: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM contact c WHERE NOT EXISTS \
         (SELECT 1 FROM is_in i WHERE i.contact_id = c.contact_id)",
    )
    .fetch_one(&mut *conn)
    .await?;

    drop(conn);
    pool.close().await;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Contact Book Database Stats");
    println!("===========================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    for (table, count) in &counts {
        println!("  {:<12} {:>6}", format!("{}:", table), count);
    }
    println!();
    println!("  Contacts without a group: {}", unaffiliated);
    println!();

    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
