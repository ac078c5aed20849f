use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    create_tables(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Creates the five tables if they are missing. Safe to run repeatedly.
pub async fn create_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS contact (
            contact_id INTEGER PRIMARY KEY AUTOINCREMENT,
            fn TEXT,
            n TEXT,
            nickname TEXT,
            photo BLOB,
            bday TEXT,
            anniversary TEXT,
            gender TEXT,
            adr TEXT,
            tel TEXT,
            email TEXT,
            impp TEXT,
            lang TEXT,
            tz TEXT,
            geo TEXT,
            note TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS groups (
            group_id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT,
            logo BLOB,
            org TEXT,
            related TEXT,
            url TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS role (
            role_id INTEGER PRIMARY KEY AUTOINCREMENT,
            role TEXT,
            member TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS is_in (
            is_in_id INTEGER PRIMARY KEY AUTOINCREMENT,
            contact_id INTEGER,
            group_id INTEGER,
            role_id INTEGER,
            FOREIGN KEY (contact_id) REFERENCES contact(contact_id),
            FOREIGN KEY (group_id) REFERENCES groups(group_id),
            FOREIGN KEY (role_id) REFERENCES role(role_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS other (
            other_id INTEGER PRIMARY KEY AUTOINCREMENT,
            contact_id INTEGER,
            categories TEXT,
            prodid TEXT,
            rev TEXT,
            sound TEXT,
            uid TEXT,
            clientpidmap TEXT,
            version TEXT,
            key TEXT,
            fburl TEXT,
            caladruri TEXT,
            caluri TEXT,
            FOREIGN KEY (contact_id) REFERENCES contact(contact_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_is_in_contact_id ON is_in(contact_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_other_contact_id ON other(contact_id)")
        .execute(pool)
        .await?;

    Ok(())
}
