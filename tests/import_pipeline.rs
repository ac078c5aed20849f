use std::fs;
use std::path::PathBuf;

use contact_book::config::{CommitPolicy, Config, ImportConfig};
use contact_book::ingest::{import_file, import_text, ImportError};
use contact_book::store::{self, StoreError, Table};
use contact_book::{db, migrate};
use sqlx::SqlitePool;
use tempfile::TempDir;

const THREE_CARDS: &str = "BEGIN:VCARD\r\n\
VERSION:4.0\r\n\
FN:First Person\r\n\
END:VCARD\r\n\
BEGIN:VCARD\r\n\
VERSION:4.0\r\n\
FN:Second Person\r\n\
ORG:Acme\r\n\
ROLE:Engineer\r\n\
END:VCARD\r\n\
BEGIN:VCARD\r\n\
VERSION:4.0\r\n\
FN:Third Person\r\n\
END:VCARD\r\n";

async fn setup() -> (TempDir, SqlitePool) {
    let tmp = TempDir::new().unwrap();
    let cfg = Config::with_db_path(tmp.path().join("data").join("contacts.sqlite"));
    let pool = db::connect(&cfg).await.unwrap();
    migrate::create_tables(&pool).await.unwrap();
    (tmp, pool)
}

fn write_cards(tmp: &TempDir, text: &str) -> PathBuf {
    let path = tmp.path().join("cards.vcf");
    fs::write(&path, text).unwrap();
    path
}

async fn count(pool: &SqlitePool, table: Table) -> i64 {
    let mut conn = pool.acquire().await.unwrap();
    store::count(&mut conn, table).await.unwrap()
}

fn policy(commit: CommitPolicy) -> ImportConfig {
    ImportConfig {
        commit,
        ..ImportConfig::default()
    }
}

#[test_log::test(tokio::test)]
async fn contact_only_card_has_no_links() {
    let (_tmp, pool) = setup().await;
    let mut conn = pool.acquire().await.unwrap();

    let reports = import_text(
        &mut conn,
        "BEGIN:VCARD\nFN:Solo\nTEL:555-0000\nEMAIL:solo@example.com\nEND:VCARD\n",
        &ImportConfig::default(),
    )
    .await
    .unwrap();
    drop(conn);

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].group_id, None);
    assert_eq!(reports[0].role_id, None);
    assert_eq!(reports[0].membership_id, None);
    assert_eq!(count(&pool, Table::Contact).await, 1);
    assert_eq!(count(&pool, Table::Groups).await, 0);
    assert_eq!(count(&pool, Table::Role).await, 0);
    assert_eq!(count(&pool, Table::IsIn).await, 0);
    assert_eq!(count(&pool, Table::Other).await, 0);
}

#[test_log::test(tokio::test)]
async fn full_card_links_all_three_rows() {
    let (tmp, pool) = setup().await;
    let path = write_cards(
        &tmp,
        "BEGIN:VCARD\r\nVERSION:4.0\r\nFN:Jane Doe\r\nTEL:555-1111\r\nTEL:555-2222\r\n\
         ORG:Acme\r\nTITLE:Lead\r\nROLE:Manager\r\nEND:VCARD\r\n",
    );

    let summary = import_file(&pool, &path, &ImportConfig::default())
        .await
        .unwrap();
    assert_eq!(summary.contacts(), 1);
    assert_eq!(summary.memberships(), 1);
    let report = &summary.cards[0];

    let mut conn = pool.acquire().await.unwrap();
    let contact = store::fetch(&mut conn, Table::Contact, report.contact_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(contact.text("fn"), Some("Jane Doe"));
    assert_eq!(contact.text("tel"), Some("555-1111"));

    let group_id = report.group_id.unwrap();
    let group = store::fetch(&mut conn, Table::Groups, group_id).await.unwrap().unwrap();
    assert_eq!(group.text("org"), Some("Acme"));
    assert_eq!(group.text("title"), Some("Lead"));

    let role_id = report.role_id.unwrap();
    let role = store::fetch(&mut conn, Table::Role, role_id).await.unwrap().unwrap();
    assert_eq!(role.text("role"), Some("Manager"));

    let link = store::fetch(&mut conn, Table::IsIn, report.membership_id.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(link.to_json()["contact_id"], report.contact_id);
    assert_eq!(link.to_json()["group_id"], group_id);
    assert_eq!(link.to_json()["role_id"], role_id);

    let other = store::fetch(&mut conn, Table::Other, report.other_id.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(other.text("version"), Some("4.0"));
    assert_eq!(other.to_json()["contact_id"], report.contact_id);
}

#[test_log::test(tokio::test)]
async fn group_without_role_stays_unlinked() {
    let (_tmp, pool) = setup().await;
    let mut conn = pool.acquire().await.unwrap();

    let reports = import_text(
        &mut conn,
        "BEGIN:VCARD\nFN:Half\nORG:Acme\nEND:VCARD\n",
        &ImportConfig::default(),
    )
    .await
    .unwrap();
    drop(conn);

    assert!(reports[0].group_id.is_some());
    assert_eq!(reports[0].role_id, None);
    assert_eq!(reports[0].membership_id, None);
    assert_eq!(count(&pool, Table::Groups).await, 1);
    assert_eq!(count(&pool, Table::IsIn).await, 0);
}

#[test_log::test(tokio::test)]
async fn cards_are_stored_in_file_order() {
    let (tmp, pool) = setup().await;
    let path = write_cards(&tmp, THREE_CARDS);

    let summary = import_file(&pool, &path, &ImportConfig::default())
        .await
        .unwrap();
    let ids: Vec<i64> = summary.cards.iter().map(|c| c.contact_id).collect();
    assert!(ids.windows(2).all(|w| w[0] < w[1]));

    let mut conn = pool.acquire().await.unwrap();
    let labels = store::list_labels(&mut conn, Table::Contact).await.unwrap();
    let names: Vec<_> = labels.iter().map(|(_, name)| name.as_deref().unwrap()).collect();
    assert_eq!(names, ["First Person", "Second Person", "Third Person"]);
}

#[test_log::test(tokio::test)]
async fn reimport_duplicates_every_row() {
    let (tmp, pool) = setup().await;
    let path = write_cards(&tmp, THREE_CARDS);

    import_file(&pool, &path, &ImportConfig::default()).await.unwrap();
    import_file(&pool, &path, &ImportConfig::default()).await.unwrap();

    assert_eq!(count(&pool, Table::Contact).await, 6);
    assert_eq!(count(&pool, Table::IsIn).await, 2);
}

#[test_log::test(tokio::test)]
async fn storage_fault_rolls_back_whole_file() {
    let (tmp, pool) = setup().await;
    let path = write_cards(&tmp, THREE_CARDS);
    sqlx::query("DROP TABLE role").execute(&pool).await.unwrap();

    let err = import_file(&pool, &path, &policy(CommitPolicy::File))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ImportError::Storage {
            card: 2,
            source: StoreError::Database(_)
        }
    ));

    assert_eq!(count(&pool, Table::Contact).await, 0);
    assert_eq!(count(&pool, Table::Groups).await, 0);
}

#[test_log::test(tokio::test)]
async fn storage_fault_keeps_earlier_statements() {
    let (tmp, pool) = setup().await;
    let path = write_cards(&tmp, THREE_CARDS);
    sqlx::query("DROP TABLE role").execute(&pool).await.unwrap();

    let err = import_file(&pool, &path, &policy(CommitPolicy::Statement))
        .await
        .unwrap_err();
    assert!(matches!(err, ImportError::Storage { card: 2, .. }));

    // card 1 in full, card 2 up to its group row, card 3 never reached
    assert_eq!(count(&pool, Table::Contact).await, 2);
    assert_eq!(count(&pool, Table::Groups).await, 1);
    assert_eq!(count(&pool, Table::IsIn).await, 0);
}

#[test_log::test(tokio::test)]
async fn missing_file_is_a_read_error() {
    let (tmp, pool) = setup().await;

    let err = import_file(&pool, &tmp.path().join("absent.vcf"), &ImportConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ImportError::Read { .. }));
    assert_eq!(count(&pool, Table::Contact).await, 0);
}

#[test_log::test(tokio::test)]
async fn degraded_fields_are_reported_not_fatal() {
    let (_tmp, pool) = setup().await;
    let mut conn = pool.acquire().await.unwrap();

    let reports = import_text(
        &mut conn,
        "BEGIN:VCARD\nFN:Broken Photo\nPHOTO:https://example.com/p.jpg\nthis line is junk\nEND:VCARD\n",
        &ImportConfig::default(),
    )
    .await
    .unwrap();

    assert_eq!(reports[0].warnings.len(), 2);
    let photo = store::fetch(&mut conn, Table::Contact, reports[0].contact_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(photo.text("fn"), Some("Broken Photo"));
    assert_eq!(photo.get("photo"), Some(&store::FieldValue::Blob(None)));
}
