//! vCard import pipeline.
//!
//! Reads a `.vcf` file, splits it into cards and, for each card in file
//! order, builds a [`Contact`] plus the optional [`Other`], [`Group`],
//! [`Role`] and [`Membership`] rows, then writes them through
//! [`crate::store::insert`]. Fields that cannot be read degrade to `NULL`
//! or a marker string and are reported as [`CardWarning`]s; only storage
//! faults abort a run.

use anyhow::{Context, Result};
use sqlx::{SqliteConnection, SqlitePool};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::{CommitPolicy, Config, ImportConfig};
use crate::db;
use crate::extract::{extract_or_else, ExtractError, Extracted};
use crate::models::{Contact, Group, Membership, Other, Record, Role};
use crate::store::{self, StoreError};
use crate::stringify::{Stringifier, StringifyFault};
use crate::vcard::{self, data_uri_payload, decode_base64, Card, NodeId, ParseError, PropertyValue};

/// Why a field of a card was degraded.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WarningKind {
    #[error("{0}")]
    Parse(ParseError),
    #[error("{0}")]
    Extract(ExtractError),
    #[error("{0}")]
    Stringify(StringifyFault),
    #[error("payload is neither binary nor base64")]
    Undecodable,
}

/// A degraded field; `field` is `None` for faults not tied to one column.
#[derive(Debug, Clone, PartialEq)]
pub struct CardWarning {
    pub field: Option<&'static str>,
    pub kind: WarningKind,
}

impl fmt::Display for CardWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.field {
            Some(field) => write!(f, "{}: {}", field, self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// Rows built from one card, not yet written.
#[derive(Debug, Clone, Default)]
pub struct AssembledCard {
    pub contact: Contact,
    pub other: Other,
    pub group: Group,
    pub role: Role,
    pub warnings: Vec<CardWarning>,
}

impl AssembledCard {
    /// Whether persisting this card will write a membership row.
    pub fn links_membership(&self) -> bool {
        self.group.has_content() && self.role.has_content()
    }
}

/// What was written for one card.
#[derive(Debug, Clone, PartialEq)]
pub struct CardReport {
    /// Position in the file, starting at 1.
    pub index: usize,
    pub contact_id: i64,
    pub other_id: Option<i64>,
    pub group_id: Option<i64>,
    pub role_id: Option<i64>,
    pub membership_id: Option<i64>,
    pub warnings: Vec<CardWarning>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportSummary {
    pub path: PathBuf,
    pub cards: Vec<CardReport>,
}

impl ImportSummary {
    pub fn contacts(&self) -> usize {
        self.cards.len()
    }

    pub fn groups(&self) -> usize {
        self.cards.iter().filter(|c| c.group_id.is_some()).count()
    }

    pub fn roles(&self) -> usize {
        self.cards.iter().filter(|c| c.role_id.is_some()).count()
    }

    pub fn memberships(&self) -> usize {
        self.cards.iter().filter(|c| c.membership_id.is_some()).count()
    }

    pub fn others(&self) -> usize {
        self.cards.iter().filter(|c| c.other_id.is_some()).count()
    }

    pub fn warnings(&self) -> usize {
        self.cards.iter().map(|c| c.warnings.len()).sum()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to store card {card}")]
    Storage {
        card: usize,
        #[source]
        source: StoreError,
    },
    #[error("failed to open or commit the import transaction")]
    Transaction(#[source] sqlx::Error),
}

/// Reads the properties of one card, collecting warnings as it goes.
struct CardReader<'a> {
    card: &'a Card,
    address_separator: &'a str,
    warnings: Vec<CardWarning>,
}

impl<'a> CardReader<'a> {
    fn new(card: &'a Card, cfg: &'a ImportConfig) -> Self {
        let warnings = card
            .faults
            .iter()
            .map(|fault| CardWarning {
                field: None,
                kind: WarningKind::Parse(fault.clone()),
            })
            .collect();
        Self {
            card,
            address_separator: &cfg.address_separator,
            warnings,
        }
    }

    fn warn(&mut self, field: &'static str, kind: WarningKind) {
        warn!(card_line = self.card.line, field, "{}", kind);
        self.record(field, kind);
    }

    fn record(&mut self, field: &'static str, kind: WarningKind) {
        self.warnings.push(CardWarning {
            field: Some(field),
            kind,
        });
    }

    fn extracted(&mut self, field: &'static str) -> Extracted {
        let mut fault = None;
        let extracted = extract_or_else(self.card, field, |e| fault = Some(e));
        if let Some(e) = fault {
            self.record(field, WarningKind::Extract(e));
        }
        extracted
    }

    fn value(&self, node: NodeId) -> Option<&'a PropertyValue> {
        self.card.values.get(node)
    }

    fn render(&mut self, field: &'static str, nodes: &[NodeId]) -> String {
        let mut stringifier = Stringifier::new(&self.card.values);
        let text = stringifier.render_all(nodes);
        for fault in stringifier.into_faults() {
            self.warn(field, WarningKind::Stringify(fault));
        }
        text
    }

    /// Every occurrence, joined.
    fn text(&mut self, field: &'static str) -> Option<String> {
        let extracted = self.extracted(field);
        if extracted.is_absent() {
            return None;
        }
        Some(self.render(field, extracted.nodes()))
    }

    /// First occurrence only.
    fn first_text(&mut self, field: &'static str) -> Option<String> {
        let node = self.extracted(field).first()?;
        Some(self.render(field, &[node]))
    }

    /// Non-empty components of a structured value joined by `separator`.
    fn joined(&mut self, field: &'static str, separator: &str) -> Option<String> {
        let node = self.extracted(field).first()?;
        match self.value(node) {
            Some(PropertyValue::Sequence(items)) => {
                let parts: Vec<String> = items
                    .iter()
                    .map(|&item| self.render(field, &[item]))
                    .filter(|part| !part.is_empty())
                    .collect();
                Some(parts.join(separator))
            }
            _ => Some(self.render(field, &[node])),
        }
    }

    fn date(&mut self, field: &'static str) -> Option<String> {
        let node = self.extracted(field).first()?;
        match self.value(node) {
            Some(PropertyValue::Date(date)) => Some(date.format("%Y-%m-%d").to_string()),
            _ => Some(self.render(field, &[node])),
        }
    }

    fn address(&mut self) -> Option<String> {
        let separator = self.address_separator;
        let joined = self.joined("adr", separator)?;
        Some(joined.replace("\r\n", separator).replace('\n', separator))
    }

    fn binary(&mut self, field: &'static str) -> Option<Vec<u8>> {
        let node = self.extracted(field).first()?;
        let decoded = match self.value(node) {
            Some(PropertyValue::Binary(bytes)) => Some(bytes.clone()),
            Some(PropertyValue::Scalar(text)) => {
                decode_base64(data_uri_payload(text).unwrap_or(text))
            }
            _ => None,
        };
        if decoded.is_none() {
            self.warn(field, WarningKind::Undecodable);
        }
        decoded
    }
}

/// Builds the rows for one card. Never fails; see [`AssembledCard::warnings`].
pub fn assemble(card: &Card, cfg: &ImportConfig) -> AssembledCard {
    let mut r = CardReader::new(card, cfg);

    let contact = Contact {
        formatted_name: r.text("fn"),
        n: r.joined("n", " "),
        nickname: r.text("nickname"),
        photo: r.binary("photo"),
        bday: r.date("bday"),
        anniversary: r.date("anniversary"),
        gender: r.text("gender"),
        adr: r.address(),
        tel: r.first_text("tel"),
        email: r.first_text("email"),
        impp: r.first_text("impp"),
        lang: r.first_text("lang"),
        tz: r.text("tz"),
        geo: r.text("geo"),
        note: r.text("note"),
    };

    let other = Other {
        categories: r.text("categories"),
        prodid: r.text("prodid"),
        rev: r.text("rev"),
        sound: r.text("sound"),
        uid: r.text("uid"),
        clientpidmap: r.text("clientpidmap"),
        version: r.text("version"),
        key: r.text("key"),
        fburl: r.text("fburl"),
        caladruri: r.text("caladruri"),
        caluri: r.text("caluri"),
    };

    let group = Group {
        title: r.text("title"),
        logo: r.binary("logo"),
        org: r.text("org"),
        related: r.text("related"),
        url: r.text("url"),
    };

    let role = Role {
        role: r.text("role"),
        member: r.text("member"),
    };

    AssembledCard {
        contact,
        other,
        group,
        role,
        warnings: r.warnings,
    }
}

/// Parses `text` and assembles every card, in file order.
pub fn assemble_text(text: &str, cfg: &ImportConfig) -> Vec<AssembledCard> {
    vcard::parse(text)
        .iter()
        .map(|card| assemble(card, cfg))
        .collect()
}

async fn insert_record<R: Record>(conn: &mut SqliteConnection, record: &R) -> Result<i64, StoreError> {
    store::insert(conn, R::TABLE, &record.fields()).await
}

/// Writes one assembled card. The contact row is always inserted; the
/// others only when they carry content, and the membership only when
/// both a group and a role were written.
pub async fn persist(
    conn: &mut SqliteConnection,
    card: AssembledCard,
    index: usize,
) -> Result<CardReport, StoreError> {
    let contact_id = insert_record(conn, &card.contact).await?;

    let other_id = if card.other.has_content() {
        Some(store::insert(conn, Other::TABLE, &card.other.fields_for(contact_id)).await?)
    } else {
        None
    };

    let group_id = if card.group.has_content() {
        Some(insert_record(conn, &card.group).await?)
    } else {
        None
    };

    let role_id = if card.role.has_content() {
        Some(insert_record(conn, &card.role).await?)
    } else {
        None
    };

    let membership_id = match (group_id, role_id) {
        (Some(group_id), Some(role_id)) => {
            let link = Membership {
                contact_id,
                group_id,
                role_id,
            };
            Some(insert_record(conn, &link).await?)
        }
        _ => None,
    };

    debug!(index, contact_id, ?group_id, ?role_id, "card stored");

    Ok(CardReport {
        index,
        contact_id,
        other_id,
        group_id,
        role_id,
        membership_id,
        warnings: card.warnings,
    })
}

/// Imports every card of `text` over one connection, stopping at the
/// first storage fault.
pub async fn import_text(
    conn: &mut SqliteConnection,
    text: &str,
    cfg: &ImportConfig,
) -> Result<Vec<CardReport>, ImportError> {
    let mut reports = Vec::new();
    for (i, card) in assemble_text(text, cfg).into_iter().enumerate() {
        let index = i + 1;
        let report = persist(conn, card, index)
            .await
            .map_err(|source| ImportError::Storage { card: index, source })?;
        reports.push(report);
    }
    Ok(reports)
}

/// Imports one file under the configured commit policy.
///
/// With [`CommitPolicy::File`] a storage fault leaves the database as it
/// was before the call. With [`CommitPolicy::Statement`] the cards stored
/// before the fault remain.
#[tracing::instrument(skip(pool, cfg), fields(path = %path.display()))]
pub async fn import_file(
    pool: &SqlitePool,
    path: &Path,
    cfg: &ImportConfig,
) -> Result<ImportSummary, ImportError> {
    let text = std::fs::read_to_string(path).map_err(|source| ImportError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let cards = match cfg.commit {
        CommitPolicy::File => {
            let mut tx = pool.begin().await.map_err(ImportError::Transaction)?;
            let cards = import_text(&mut tx, &text, cfg).await?;
            tx.commit().await.map_err(ImportError::Transaction)?;
            cards
        }
        CommitPolicy::Statement => {
            let mut conn = pool.acquire().await.map_err(ImportError::Transaction)?;
            import_text(&mut conn, &text, cfg).await?
        }
    };

    Ok(ImportSummary {
        path: path.to_path_buf(),
        cards,
    })
}

pub async fn run_import(config: &Config, path: &Path, dry_run: bool) -> Result<()> {
    if dry_run {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read vCard file: {}", path.display()))?;
        let cards = assemble_text(&text, &config.import);

        println!("import {} (dry-run)", path.display());
        println!("  cards found: {}", cards.len());
        println!(
            "  groups: {}",
            cards.iter().filter(|c| c.group.has_content()).count()
        );
        println!(
            "  roles: {}",
            cards.iter().filter(|c| c.role.has_content()).count()
        );
        println!(
            "  memberships: {}",
            cards.iter().filter(|c| c.links_membership()).count()
        );
        let warnings: usize = cards.iter().map(|c| c.warnings.len()).sum();
        println!("  warnings: {}", warnings);
        return Ok(());
    }

    let pool = db::connect(config).await?;
    let result = import_file(&pool, path, &config.import).await;
    pool.close().await;
    let summary = result.with_context(|| format!("Import of {} failed", path.display()))?;

    println!("import {}", summary.path.display());
    println!("  contacts inserted: {}", summary.contacts());
    println!("  groups inserted: {}", summary.groups());
    println!("  roles inserted: {}", summary.roles());
    println!("  memberships inserted: {}", summary.memberships());
    println!("  other rows inserted: {}", summary.others());
    println!("  warnings: {}", summary.warnings());
    for card in &summary.cards {
        for warning in &card.warnings {
            println!("    card {}: {}", card.index, warning);
        }
    }
    println!("ok");

    Ok(())
}
