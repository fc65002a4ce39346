//! Integration tests for the phonebooker command line

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

/// Isolated config file pointing at a phone book inside a temp directory
struct TestEnv {
    temp_dir: TempDir,
    config_path: PathBuf,
    book_path: PathBuf,
}

impl TestEnv {
    fn new() -> Self {
        Self::with_config("")
    }

    /// `extra` is appended to a config that already sets `book`.
    fn with_config(extra: &str) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let book_path = temp_dir.path().join("book.xml");

        let config = format!("book = {:?}\n{}", book_path.to_str().unwrap(), extra);
        fs::write(&config_path, config).unwrap();

        Self {
            temp_dir,
            config_path,
            book_path,
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    fn cmd(&self) -> Command {
        let mut cmd = phonebooker_cmd();
        cmd.arg("--config").arg(&self.config_path);
        cmd
    }

    fn add(&self, first: &str, last: &str, phone: &str, extra: &[&str]) {
        self.cmd()
            .args(["add", "--first", first, "--last", last, "--phone", phone])
            .args(extra)
            .assert()
            .success();
    }

    fn write_csv(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, content).unwrap();
        path
    }
}

fn phonebooker_cmd() -> Command {
    let mut cmd = Command::cargo_bin("phonebooker").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "command failed: {:?}", output);
    String::from_utf8(output.stdout).unwrap()
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

// =============================================================================
// Book Management Tests
// =============================================================================

#[test]
fn add_creates_book_and_lists_sorted() {
    let env = TestEnv::new();
    env.add("Zoe", "Adams", "0400000001", &["--group", "Family"]);
    env.add("Adam", "Zimmer", "0400000002", &["--type", "Work", "--company", "Acme"]);

    assert!(env.book_path.exists());

    let listing = stdout_of(env.cmd().arg("list"));
    let lines: Vec<&str> = listing.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "0\tZoe Adams\tMobile\t0400000001\tFamily\t");
    assert_eq!(lines[1], "1\tAdam Zimmer\tWork\t0400000002\t\tAcme");
}

#[test]
fn add_rejects_unknown_group() {
    let env = TestEnv::new();
    env.cmd()
        .args(["add", "--first", "Ann", "--phone", "1", "--group", "Chess"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Chess"));
    assert!(!env.book_path.exists());
}

#[test]
fn edit_and_remove_by_index() {
    let env = TestEnv::new();
    env.add("John", "Smith", "412345678", &["--group", "Work"]);
    env.add("Mary", "Jones", "0400111222", &[]);

    env.cmd()
        .args(["edit", "1", "--company", "Globex", "--clear-groups"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated John Smith."));

    let listing = stdout_of(env.cmd().arg("list"));
    assert!(listing.contains("1\tJohn Smith\tMobile\t412345678\t\tGlobex"));

    env.cmd()
        .args(["remove", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed Mary Jones."));

    env.cmd()
        .args(["remove", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no contact at index 5"));

    let listing = stdout_of(env.cmd().arg("list"));
    assert_eq!(listing.lines().count(), 1);
}

#[test]
fn missing_book_is_reported() {
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("config.toml");
    fs::write(&config_path, "").unwrap();

    phonebooker_cmd()
        .arg("--config")
        .arg(&config_path)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no phone book given"));
}

#[test]
fn explicit_config_must_exist() {
    let temp = TempDir::new().unwrap();
    phonebooker_cmd()
        .arg("--config")
        .arg(temp.path().join("absent.toml"))
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration file not found"));
}

// =============================================================================
// Group Tests
// =============================================================================

#[test]
fn groups_lists_defaults_with_offset_ids() {
    let env = TestEnv::new();
    env.add("Ann", "Lee", "1", &[]);

    let listing = stdout_of(env.cmd().arg("groups"));
    let lines: Vec<&str> = listing.lines().collect();
    assert_eq!(lines.first(), Some(&"4\tBlocklist"));
    assert_eq!(lines.last(), Some(&"10\tWhitelist"));
}

#[test]
fn groups_add_and_remove_persist() {
    let env = TestEnv::new();
    env.cmd()
        .args(["groups", "add", "Climbing"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Group Climbing has id 11."));

    env.add("Ann", "Lee", "1", &["--group", "Climbing"]);
    assert!(read(&env.book_path).contains("Climbing"));

    env.cmd()
        .args(["groups", "remove", "Climbing"])
        .assert()
        .success();

    let listing = stdout_of(env.cmd().arg("list"));
    assert_eq!(listing, "0\tAnn Lee\tMobile\t1\t\t\n");

    env.cmd()
        .args(["groups", "remove", "Climbing"])
        .assert()
        .failure();
}

#[test]
fn removed_default_group_stays_removed() {
    let env = TestEnv::new();
    env.add("Ann", "Lee", "1", &["--group", "Blacklist"]);

    env.cmd()
        .args(["groups", "remove", "Blacklist"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed group Blacklist."));

    let listing = stdout_of(env.cmd().arg("groups"));
    assert!(!listing.contains("Blacklist"), "{listing}");
    assert!(listing.contains("8\tFamily"));
    assert!(listing.contains("10\tWhitelist"));

    env.cmd()
        .args(["add", "--first", "Bob", "--phone", "2", "--group", "Blacklist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Blacklist"));
}

#[test]
fn group_changes_on_vcard_book_are_refused() {
    let env = TestEnv::new();
    let vcf = env.path("book.vcf");
    env.cmd()
        .args(["add", "--first", "Ann", "--phone", "1", "--book"])
        .arg(&vcf)
        .assert()
        .success();
    let before = read(&vcf);

    env.cmd()
        .args(["groups", "--book"])
        .arg(&vcf)
        .args(["add", "Climbing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("extra_groups"));

    env.cmd()
        .args(["groups", "--book"])
        .arg(&vcf)
        .args(["remove", "Work"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("extra_groups"));

    assert_eq!(read(&vcf), before);

    let listing = stdout_of(env.cmd().args(["groups", "--book"]).arg(&vcf));
    assert!(listing.contains("6\tWork"));
}

#[test]
fn extra_groups_from_config() {
    let env = TestEnv::with_config("extra_groups = [\"Choir\"]\n");
    env.add("Ann", "Lee", "1", &["--group", "Choir"]);

    let listing = stdout_of(env.cmd().arg("groups"));
    assert!(listing.contains("11\tChoir"));
}

// =============================================================================
// CSV Import Tests
// =============================================================================

#[test]
fn import_skips_duplicate_numbers() {
    let env = TestEnv::new();
    let csv = env.write_csv(
        "export.csv",
        "id,kind,phone,name\n1,x,61412345678,kate katherine jones\n2,x,412345678,Someone Else\n",
    );

    env.cmd()
        .arg("import")
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 1 contacts."))
        .stdout(predicate::str::contains("Skipped 1 duplicates."));

    let listing = stdout_of(env.cmd().arg("list"));
    assert_eq!(listing, "0\tKatherine Jones\tHome\t412345678\tWork\t\n");

    // Re-importing the same export adds nothing.
    env.cmd()
        .arg("import")
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 0 contacts."));
}

#[test]
fn import_honours_configured_group_and_delimiter() {
    let env = TestEnv::with_config("[import]\ngroup = \"Friends\"\ndelimiter = \";\"\n");
    let csv = env.write_csv("export.csv", "a;b;phone;name\n;;0400123123;Bob Stone\n");

    env.cmd().arg("import").arg(&csv).assert().success();

    let listing = stdout_of(env.cmd().arg("list"));
    assert!(listing.contains("Bob Stone\tMobile\t0400123123\tFriends"));
}

#[test]
fn import_missing_csv_fails() {
    let env = TestEnv::new();
    env.cmd()
        .arg("import")
        .arg(env.path("absent.csv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to import"));
}

// =============================================================================
// Query Tests
// =============================================================================

fn query_env() -> TestEnv {
    let env = TestEnv::new();
    env.add("John", "Smith", "412345678", &["--group", "Work", "--company", "Acme"]);
    env.add(
        "Mary",
        "Jones",
        "0400111222",
        &["--group", "Family", "--company", "555 Holdings"],
    );
    env
}

#[test]
fn query_scope_isolation() {
    let env = query_env();

    let phone = stdout_of(env.cmd().args(["query", "--scope", "phone", "555"]));
    assert!(phone.is_empty());

    let company = stdout_of(env.cmd().args(["query", "--scope", "company", "555"]));
    assert!(company.contains("Mary Jones"));
    assert!(!company.contains("John Smith"));
}

#[test]
fn query_fuzzy_and_exact_names() {
    let env = query_env();

    let fuzzy = stdout_of(env.cmd().args(["query", "--scope", "name", "Jon Smith"]));
    assert!(fuzzy.contains("John Smith"));

    let exact = stdout_of(env.cmd().args(["query", "--scope", "name", "--exact", "Jon Smith"]));
    assert!(exact.is_empty());
}

#[test]
fn query_empty_text_lists_everyone() {
    let env = query_env();
    let all = stdout_of(env.cmd().arg("query"));
    assert_eq!(all.lines().count(), 2);
}

#[test]
fn query_json_mask() {
    let env = query_env();
    let json = stdout_of(env.cmd().args(["query", "--json", "--scope", "groups", "family"]));
    let mask: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(
        mask,
        serde_json::json!([
            { "index": 0, "visible": true },
            { "index": 1, "visible": false }
        ])
    );
}

// =============================================================================
// Conversion Tests
// =============================================================================

#[test]
fn convert_xml_to_vcard_and_back() {
    let env = query_env();
    let vcf = env.path("out.vcf");
    let back = env.path("back.xml");

    env.cmd()
        .arg("convert")
        .arg(&env.book_path)
        .arg(&vcf)
        .assert()
        .success()
        .stdout(predicate::str::contains("Converted 2 contacts from xml to vcard."));

    let text = read(&vcf);
    assert!(text.contains("VERSION:3.0"));
    assert!(text.contains("N:Smith;John;;;"));
    assert!(text.contains("TEL;TYPE=Mobile:412345678"));
    assert!(text.contains("ORG:555 Holdings"));
    assert!(text.contains("CATEGORIES:Family"));

    env.cmd().arg("convert").arg(&vcf).arg(&back).assert().success();

    let before = stdout_of(env.cmd().arg("list"));
    let round_trip = stdout_of(env.cmd().arg("list").arg("--book").arg(&back));
    assert_eq!(before, round_trip);
}

#[test]
fn convert_warns_about_unknown_categories() {
    let env = TestEnv::new();
    let vcf = env.path("in.vcf");
    fs::write(
        &vcf,
        "BEGIN:VCARD\nVERSION:3.0\nN:Lee;Ann;;;\nTEL;TYPE=Home:0299998888\nCATEGORIES:Friends,Chess\nEND:VCARD\n",
    )
    .unwrap();
    let xml = env.path("out.xml");

    env.cmd()
        .arg("convert")
        .arg(&vcf)
        .arg(&xml)
        .assert()
        .success()
        .stderr(predicate::str::contains("dropped unknown category `Chess`"));

    let listing = stdout_of(env.cmd().arg("list").arg("--book").arg(&xml));
    assert_eq!(listing, "0\tAnn Lee\tHome\t0299998888\tFriends\t\n");
}

#[test]
fn convert_requires_known_extension_or_flag() {
    let env = query_env();
    let out = env.path("out.txt");

    env.cmd()
        .arg("convert")
        .arg(&env.book_path)
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot infer the format"));

    env.cmd()
        .args(["convert", "--to", "vcard"])
        .arg(&env.book_path)
        .arg(&out)
        .assert()
        .success();
    assert!(read(&out).starts_with("BEGIN:VCARD"));
}

#[test]
fn malformed_book_is_an_error() {
    let env = TestEnv::new();
    fs::write(&env.book_path, "<AddressBook><Contact>").unwrap();
    env.cmd()
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to open phone book"));
}
