//! Row-level access to the contact tables.
//!
//! Every operation takes a `&mut SqliteConnection` so callers decide the
//! commit scope: pass a pooled connection to commit per statement, or a
//! transaction (which derefs to a connection) to commit as one unit.
//!
//! | Function | Purpose |
//! |----------|---------|
//! | [`insert`] | Insert a row, returning its new id |
//! | [`update`] | Overwrite columns of an existing row |
//! | [`delete`] | Delete one row (no cascade) |
//! | [`fetch`] | Read one row by id |
//! | [`list_labels`] | Ids with their display column |
//! | [`list_columns`] | Column names and declared types |
//! | [`count`] / [`clear_all`] | Table housekeeping |

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments};
use sqlx::{Row, SqliteConnection};
use std::fmt;
use std::str::FromStr;

/// The five tables of the contact schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Contact,
    Groups,
    Role,
    IsIn,
    Other,
}

/// Storage class of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Blob,
    Integer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

const fn text(name: &'static str) -> Column {
    Column {
        name,
        kind: ColumnKind::Text,
    }
}

const fn blob(name: &'static str) -> Column {
    Column {
        name,
        kind: ColumnKind::Blob,
    }
}

const fn integer(name: &'static str) -> Column {
    Column {
        name,
        kind: ColumnKind::Integer,
    }
}

const CONTACT_COLUMNS: &[Column] = &[
    integer("contact_id"),
    text("fn"),
    text("n"),
    text("nickname"),
    blob("photo"),
    text("bday"),
    text("anniversary"),
    text("gender"),
    text("adr"),
    text("tel"),
    text("email"),
    text("impp"),
    text("lang"),
    text("tz"),
    text("geo"),
    text("note"),
];

const GROUP_COLUMNS: &[Column] = &[
    integer("group_id"),
    text("title"),
    blob("logo"),
    text("org"),
    text("related"),
    text("url"),
];

const ROLE_COLUMNS: &[Column] = &[integer("role_id"), text("role"), text("member")];

const IS_IN_COLUMNS: &[Column] = &[
    integer("is_in_id"),
    integer("contact_id"),
    integer("group_id"),
    integer("role_id"),
];

const OTHER_COLUMNS: &[Column] = &[
    integer("other_id"),
    integer("contact_id"),
    text("categories"),
    text("prodid"),
    text("rev"),
    text("sound"),
    text("uid"),
    text("clientpidmap"),
    text("version"),
    text("key"),
    text("fburl"),
    text("caladruri"),
    text("caluri"),
];

impl Table {
    pub const ALL: [Table; 5] = [
        Table::Contact,
        Table::Groups,
        Table::Role,
        Table::IsIn,
        Table::Other,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Table::Contact => "contact",
            Table::Groups => "groups",
            Table::Role => "role",
            Table::IsIn => "is_in",
            Table::Other => "other",
        }
    }

    pub fn id_column(self) -> &'static str {
        self.columns()[0].name
    }

    /// Column shown next to the id in listings.
    pub fn label_column(self) -> Option<&'static str> {
        match self {
            Table::Contact => Some("fn"),
            Table::Groups => Some("title"),
            Table::Role => Some("role"),
            Table::Other => Some("uid"),
            Table::IsIn => None,
        }
    }

    /// All columns in schema order, id first.
    pub fn columns(self) -> &'static [Column] {
        match self {
            Table::Contact => CONTACT_COLUMNS,
            Table::Groups => GROUP_COLUMNS,
            Table::Role => ROLE_COLUMNS,
            Table::IsIn => IS_IN_COLUMNS,
            Table::Other => OTHER_COLUMNS,
        }
    }

    pub fn column(self, name: &str) -> Option<&'static Column> {
        self.columns().iter().find(|c| c.name == name)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Table {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "contact" | "contacts" | "persons" => Ok(Table::Contact),
            "group" | "groups" => Ok(Table::Groups),
            "role" | "roles" => Ok(Table::Role),
            "is_in" | "membership" | "memberships" => Ok(Table::IsIn),
            "other" => Ok(Table::Other),
            _ => Err(format!(
                "unknown table '{}'. Available: contact, groups, role, is_in, other",
                s
            )),
        }
    }
}

/// A column value. `None` is SQL `NULL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(Option<String>),
    Blob(Option<Vec<u8>>),
    Integer(Option<i64>),
}

impl FieldValue {
    pub fn kind(&self) -> ColumnKind {
        match self {
            FieldValue::Text(_) => ColumnKind::Text,
            FieldValue::Blob(_) => ColumnKind::Blob,
            FieldValue::Integer(_) => ColumnKind::Integer,
        }
    }

    /// Non-null and, for text and blobs, non-empty.
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Text(v) => v.as_deref().is_some_and(|s| !s.is_empty()),
            FieldValue::Blob(v) => v.as_deref().is_some_and(|b| !b.is_empty()),
            FieldValue::Integer(v) => v.is_some(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(v) => v.as_deref(),
            _ => None,
        }
    }

    /// JSON form; blobs become base64 strings.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Text(Some(s)) => Value::String(s.clone()),
            FieldValue::Blob(Some(b)) => Value::String(STANDARD.encode(b)),
            FieldValue::Integer(Some(i)) => Value::from(*i),
            _ => Value::Null,
        }
    }

    /// One-line rendering for terminal output.
    pub fn display(&self) -> String {
        match self {
            FieldValue::Text(Some(s)) => s.replace('\n', "\\n"),
            FieldValue::Blob(Some(b)) => format!("<{} bytes>", b.len()),
            FieldValue::Integer(Some(i)) => i.to_string(),
            _ => "NULL".to_string(),
        }
    }
}

/// A full row read back from a table.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRow {
    pub table: Table,
    pub id: i64,
    /// Every column except the id, in schema order.
    pub fields: Vec<(&'static str, FieldValue)>,
}

impl StoredRow {
    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| value)
    }

    pub fn text(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(FieldValue::as_text)
    }

    pub fn to_json(&self) -> Value {
        let mut map = serde_json::Map::new();
        map.insert(self.table.id_column().to_string(), Value::from(self.id));
        for (name, value) in &self.fields {
            map.insert((*name).to_string(), value.to_json());
        }
        Value::Object(map)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("table {table} has no column '{column}'")]
    UnknownColumn { table: Table, column: String },
    #[error("{table}.{column} is assigned by the database and cannot be written")]
    IdColumn { table: Table, column: String },
    #[error("{table}.{column} expects a {expected:?} value")]
    KindMismatch {
        table: Table,
        column: String,
        expected: ColumnKind,
    },
    #[error("no columns to write to {table}")]
    NoFields { table: Table },
    #[error("table {table} has no display column")]
    NoLabel { table: Table },
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

fn validate(table: Table, fields: &[(&str, FieldValue)]) -> Result<(), StoreError> {
    for (name, value) in fields {
        let column = table.column(name).ok_or_else(|| StoreError::UnknownColumn {
            table,
            column: name.to_string(),
        })?;
        if column.name == table.id_column() {
            return Err(StoreError::IdColumn {
                table,
                column: name.to_string(),
            });
        }
        if column.kind != value.kind() {
            return Err(StoreError::KindMismatch {
                table,
                column: name.to_string(),
                expected: column.kind,
            });
        }
    }
    Ok(())
}

fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &FieldValue,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        FieldValue::Text(v) => query.bind(v.clone()),
        FieldValue::Blob(v) => query.bind(v.clone()),
        FieldValue::Integer(v) => query.bind(*v),
    }
}

/// Inserts one row and returns the id the database assigned.
pub async fn insert(
    conn: &mut SqliteConnection,
    table: Table,
    fields: &[(&str, FieldValue)],
) -> Result<i64, StoreError> {
    validate(table, fields)?;

    let sql = if fields.is_empty() {
        format!("INSERT INTO \"{}\" DEFAULT VALUES", table.name())
    } else {
        let columns = fields
            .iter()
            .map(|(name, _)| format!("\"{}\"", name))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; fields.len()].join(", ");
        format!(
            "INSERT INTO \"{}\" ({}) VALUES ({})",
            table.name(),
            columns,
            placeholders
        )
    };

    let mut query = sqlx::query(&sql);
    for (_, value) in fields {
        query = bind_value(query, value);
    }
    let result = query.execute(&mut *conn).await?;

    Ok(result.last_insert_rowid())
}

/// Overwrites the given columns of row `id`. Returns `false` when no row
/// has that id.
pub async fn update(
    conn: &mut SqliteConnection,
    table: Table,
    id: i64,
    fields: &[(&str, FieldValue)],
) -> Result<bool, StoreError> {
    validate(table, fields)?;
    if fields.is_empty() {
        return Err(StoreError::NoFields { table });
    }

    let assignments = fields
        .iter()
        .map(|(name, _)| format!("\"{}\" = ?", name))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "UPDATE \"{}\" SET {} WHERE \"{}\" = ?",
        table.name(),
        assignments,
        table.id_column()
    );

    let mut query = sqlx::query(&sql);
    for (_, value) in fields {
        query = bind_value(query, value);
    }
    let result = query.bind(id).execute(&mut *conn).await?;

    Ok(result.rows_affected() > 0)
}

/// Deletes row `id`. Rows that reference it are left alone.
pub async fn delete(conn: &mut SqliteConnection, table: Table, id: i64) -> Result<bool, StoreError> {
    let sql = format!(
        "DELETE FROM \"{}\" WHERE \"{}\" = ?",
        table.name(),
        table.id_column()
    );
    let result = sqlx::query(&sql).bind(id).execute(&mut *conn).await?;
    Ok(result.rows_affected() > 0)
}

pub async fn fetch(
    conn: &mut SqliteConnection,
    table: Table,
    id: i64,
) -> Result<Option<StoredRow>, StoreError> {
    let columns = table
        .columns()
        .iter()
        .map(|c| format!("\"{}\"", c.name))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT {} FROM \"{}\" WHERE \"{}\" = ?",
        columns,
        table.name(),
        table.id_column()
    );

    let Some(row) = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
    else {
        return Ok(None);
    };

    let mut fields = Vec::with_capacity(table.columns().len() - 1);
    for column in &table.columns()[1..] {
        let value = match column.kind {
            ColumnKind::Text => FieldValue::Text(row.try_get(column.name)?),
            ColumnKind::Blob => FieldValue::Blob(row.try_get(column.name)?),
            ColumnKind::Integer => FieldValue::Integer(row.try_get(column.name)?),
        };
        fields.push((column.name, value));
    }

    Ok(Some(StoredRow {
        table,
        id: row.try_get(table.id_column())?,
        fields,
    }))
}

/// `(id, label)` for every row, in id order.
pub async fn list_labels(
    conn: &mut SqliteConnection,
    table: Table,
) -> Result<Vec<(i64, Option<String>)>, StoreError> {
    let label = table.label_column().ok_or(StoreError::NoLabel { table })?;
    let sql = format!(
        "SELECT \"{}\" AS id, \"{}\" AS label FROM \"{}\" ORDER BY \"{}\"",
        table.id_column(),
        label,
        table.name(),
        table.id_column()
    );

    let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;
    rows.iter()
        .map(|row| -> Result<_, StoreError> { Ok((row.try_get("id")?, row.try_get("label")?)) })
        .collect()
}

/// Column names and declared types as the database reports them.
pub async fn list_columns(
    conn: &mut SqliteConnection,
    table: Table,
) -> Result<Vec<(String, String)>, StoreError> {
    let sql = format!("PRAGMA table_info(\"{}\")", table.name());
    let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;
    rows.iter()
        .map(|row| -> Result<_, StoreError> { Ok((row.try_get("name")?, row.try_get("type")?)) })
        .collect()
}

pub async fn count(conn: &mut SqliteConnection, table: Table) -> Result<i64, StoreError> {
    let sql = format!("SELECT COUNT(*) FROM \"{}\"", table.name());
    let n: i64 = sqlx::query_scalar(&sql).fetch_one(&mut *conn).await?;
    Ok(n)
}

/// Deletes every row of every table.
pub async fn clear_all(conn: &mut SqliteConnection) -> Result<(), StoreError> {
    for table in Table::ALL {
        let sql = format!("DELETE FROM \"{}\"", table.name());
        sqlx::query(&sql).execute(&mut *conn).await?;
    }
    Ok(())
}
