use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const JANE: &str = "BEGIN:VCARD\r\n\
VERSION:4.0\r\n\
FN:Jane Doe\r\n\
N:Doe;Jane;;;\r\n\
TEL;TYPE=work:555-1111\r\n\
TEL;TYPE=home:555-2222\r\n\
ORG:Acme\r\n\
TITLE:Lead\r\n\
ROLE:Manager\r\n\
END:VCARD\r\n";

const TWO_PLAIN: &str = "BEGIN:VCARD\n\
VERSION:3.0\n\
FN:Alan Turing\n\
EMAIL:alan@example.org\n\
END:VCARD\n\
BEGIN:VCARD\n\
VERSION:3.0\n\
FN:Ada Lovelace\n\
NOTE:Analytical\\, engine\n\
END:VCARD\n";

fn cbook_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("cbook");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let cards_dir = root.join("cards");
    fs::create_dir_all(&cards_dir).unwrap();
    fs::write(cards_dir.join("jane.vcf"), JANE).unwrap();
    fs::write(cards_dir.join("two.vcf"), TWO_PLAIN).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/contacts.sqlite"

[import]
commit = "file"
"#,
        root.display()
    );

    let config_path = config_dir.join("contacts.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn card_path(config_path: &Path, name: &str) -> String {
    config_path
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("cards")
        .join(name)
        .display()
        .to_string()
}

fn run_cbook(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = cbook_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run cbook binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn show_json(config_path: &Path, table: &str, id: &str) -> serde_json::Value {
    let (stdout, stderr, success) = run_cbook(config_path, &["show", table, id, "--json"]);
    assert!(success, "show failed: stdout={}, stderr={}", stdout, stderr);
    serde_json::from_str(&stdout).unwrap()
}

#[test]
fn test_init_creates_database() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_cbook(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_cbook(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_cbook(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_import_end_to_end() {
    let (_tmp, config_path) = setup_test_env();
    let jane = card_path(&config_path, "jane.vcf");

    run_cbook(&config_path, &["init"]);
    let (stdout, stderr, success) = run_cbook(&config_path, &["import", &jane]);
    assert!(success, "import failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("contacts inserted: 1"));
    assert!(stdout.contains("groups inserted: 1"));
    assert!(stdout.contains("roles inserted: 1"));
    assert!(stdout.contains("memberships inserted: 1"));
    assert!(stdout.contains("ok"));

    let contact = show_json(&config_path, "contact", "1");
    assert_eq!(contact["fn"], "Jane Doe");
    assert_eq!(contact["n"], "Doe Jane");
    assert_eq!(contact["tel"], "555-1111");
    assert!(contact["photo"].is_null());

    let group = show_json(&config_path, "groups", "1");
    assert_eq!(group["org"], "Acme");
    assert_eq!(group["title"], "Lead");

    let role = show_json(&config_path, "role", "1");
    assert_eq!(role["role"], "Manager");
    assert!(role["member"].is_null());

    let link = show_json(&config_path, "is_in", "1");
    assert_eq!(link["contact_id"], 1);
    assert_eq!(link["group_id"], 1);
    assert_eq!(link["role_id"], 1);
}

#[test]
fn test_import_without_affiliation() {
    let (_tmp, config_path) = setup_test_env();
    let two = card_path(&config_path, "two.vcf");

    run_cbook(&config_path, &["init"]);
    let (stdout, _, success) = run_cbook(&config_path, &["import", &two]);
    assert!(success);
    assert!(stdout.contains("contacts inserted: 2"));
    assert!(stdout.contains("groups inserted: 0"));
    assert!(stdout.contains("memberships inserted: 0"));
    // VERSION lands in `other` for both cards
    assert!(stdout.contains("other rows inserted: 2"));

    let (stdout, _, success) = run_cbook(&config_path, &["list", "contact"]);
    assert!(success);
    let alan = stdout.find("Alan Turing").unwrap();
    let ada = stdout.find("Ada Lovelace").unwrap();
    assert!(alan < ada, "cards out of order: {}", stdout);

    let ada = show_json(&config_path, "contact", "2");
    assert_eq!(ada["note"], "Analytical, engine");
}

#[test]
fn test_reimport_duplicates_rows() {
    let (_tmp, config_path) = setup_test_env();
    let jane = card_path(&config_path, "jane.vcf");

    run_cbook(&config_path, &["init"]);
    run_cbook(&config_path, &["import", &jane]);
    let (_, _, success) = run_cbook(&config_path, &["import", &jane]);
    assert!(success);

    let (stdout, _, _) = run_cbook(&config_path, &["list", "contact"]);
    assert_eq!(stdout.matches("Jane Doe").count(), 2);

    let (stdout, _, _) = run_cbook(&config_path, &["stats"]);
    assert!(stdout.contains("is_in:"));
    assert!(stdout.lines().any(|l| l.contains("groups:") && l.trim_end().ends_with('2')));
}

#[test]
fn test_import_dry_run_writes_nothing() {
    let (_tmp, config_path) = setup_test_env();
    let jane = card_path(&config_path, "jane.vcf");

    run_cbook(&config_path, &["init"]);
    let (stdout, _, success) = run_cbook(&config_path, &["import", &jane, "--dry-run"]);
    assert!(success);
    assert!(stdout.contains("dry-run"));
    assert!(stdout.contains("cards found: 1"));
    assert!(stdout.contains("memberships: 1"));

    let (stdout, _, _) = run_cbook(&config_path, &["list", "contact"]);
    assert!(stdout.contains("No rows"));
}

#[test]
fn test_import_missing_file_fails() {
    let (_tmp, config_path) = setup_test_env();

    run_cbook(&config_path, &["init"]);
    let (_, stderr, success) = run_cbook(&config_path, &["import", "/nonexistent/cards.vcf"]);
    assert!(!success);
    assert!(stderr.contains("/nonexistent/cards.vcf"));
}

#[test]
fn test_save_update_delete() {
    let (_tmp, config_path) = setup_test_env();

    run_cbook(&config_path, &["init"]);
    let (stdout, stderr, success) = run_cbook(
        &config_path,
        &["save", "contact", "--set", "fn=Grace Hopper", "--set", "tel=555-0100"],
    );
    assert!(success, "save failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("inserted contact 1"));

    let (stdout, _, success) = run_cbook(
        &config_path,
        &["save", "contact", "--id", "1", "--set", "tel="],
    );
    assert!(success);
    assert!(stdout.contains("updated contact 1"));

    let grace = show_json(&config_path, "contact", "1");
    assert_eq!(grace["fn"], "Grace Hopper");
    assert!(grace["tel"].is_null());

    let (_, _, success) = run_cbook(&config_path, &["save", "contact", "--set", "bogus=1"]);
    assert!(!success);

    let (_, _, success) = run_cbook(&config_path, &["delete", "contact", "1"]);
    assert!(success);
    let (_, stderr, success) = run_cbook(&config_path, &["show", "contact", "1"]);
    assert!(!success);
    assert!(stderr.contains("not found"));
}

#[test]
fn test_attributes_and_clear() {
    let (_tmp, config_path) = setup_test_env();
    let jane = card_path(&config_path, "jane.vcf");

    run_cbook(&config_path, &["init"]);
    let (stdout, _, success) = run_cbook(&config_path, &["attributes", "groups"]);
    assert!(success);
    assert!(stdout.contains("logo"));
    assert!(stdout.contains("BLOB"));

    run_cbook(&config_path, &["import", &jane]);
    let (stdout, _, success) = run_cbook(&config_path, &["clear"]);
    assert!(success);
    assert!(stdout.contains("cleared"));

    let (stdout, _, _) = run_cbook(&config_path, &["list", "groups"]);
    assert!(stdout.contains("No rows"));
}

#[test]
fn test_unknown_table_rejected() {
    let (_tmp, config_path) = setup_test_env();

    let (_, stderr, success) = run_cbook(&config_path, &["list", "documents"]);
    assert!(!success);
    assert!(stderr.contains("unknown table"));
}
