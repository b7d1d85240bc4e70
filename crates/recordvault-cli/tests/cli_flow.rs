use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use serde_json::Value;
use tempfile::TempDir;

const PASSPHRASE: &str = "test-passphrase-secure-123";
const SESSION_SECRET: &str = "test-session-secret-that-is-long-enough";
const ADMIN_EMAIL: &str = "admin@example.com";
const ADMIN_PASSWORD: &str = "admin-password-1";

fn bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_recordvault"))
}

struct Env {
    home: TempDir,
}

impl Env {
    fn new() -> Self {
        Self {
            home: TempDir::new().expect("create temp home"),
        }
    }

    fn config_home(&self) -> PathBuf {
        self.home.path().join("config")
    }

    fn data_home(&self) -> PathBuf {
        self.home.path().join("data")
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(bin());
        cmd.env("HOME", self.home.path())
            .env("XDG_CONFIG_HOME", self.config_home())
            .env("XDG_DATA_HOME", self.data_home())
            .env("KEY_ENCRYPTION_PASSPHRASE", PASSPHRASE)
            .env("SESSION_TOKEN_SECRET", SESSION_SECRET)
            .env("RECORDVAULT_PASSWORD", ADMIN_PASSWORD)
            .env_remove("RECORDVAULT_TOKEN")
            .env_remove("RECORDVAULT_CONFIG")
            .env_remove("RECORDVAULT_NEW_PASSPHRASE")
            .env_remove("RUST_LOG")
            .stdin(Stdio::null());
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.command().args(args).output().expect("run recordvault")
    }

    fn run_with_token(&self, token: &str, args: &[&str]) -> Output {
        self.command()
            .env("RECORDVAULT_TOKEN", token)
            .args(args)
            .output()
            .expect("run recordvault")
    }

    fn init(&self) {
        let out = self.run(&["init", "--key-bits", "2048", "--no-input"]);
        assert_success(&out, "init");
    }

    fn add_admin(&self) {
        let out = self.run(&["admin", "add", ADMIN_EMAIL, "--no-input"]);
        assert_success(&out, "admin add");
    }

    fn login(&self) -> String {
        let out = self.run(&["login", ADMIN_EMAIL, "--json", "--no-input"]);
        assert_success(&out, "login");
        let body = json_stdout(&out);
        body["token"].as_str().expect("token in login output").to_string()
    }
}

fn assert_success(out: &Output, label: &str) {
    assert!(
        out.status.success(),
        "{} failed: stdout={}, stderr={}",
        label,
        String::from_utf8_lossy(&out.stdout),
        String::from_utf8_lossy(&out.stderr)
    );
}

fn json_stdout(out: &Output) -> Value {
    serde_json::from_slice(&out.stdout).expect("stdout should be JSON")
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).to_string()
}

fn config_file(env: &Env) -> PathBuf {
    env.config_home().join("recordvault").join("config.toml")
}

fn keys_dir(env: &Env) -> PathBuf {
    env.data_home().join("recordvault").join("keys")
}

fn assert_file(path: &Path) {
    assert!(path.exists(), "expected {} to exist", path.display());
}

#[test]
fn test_init_writes_config_database_and_keys() {
    let env = Env::new();
    let out = env.run(&["init", "--key-bits", "2048", "--json", "--no-input"]);
    assert_success(&out, "init");

    let body = json_stdout(&out);
    assert_eq!(body["generated"], true);
    assert_eq!(body["fingerprint"].as_str().expect("fingerprint").len(), 64);

    assert_file(&config_file(&env));
    assert_file(&keys_dir(&env).join("public_key.pem"));
    assert_file(&keys_dir(&env).join("private_key.pem"));
    assert_file(&env.data_home().join("recordvault").join("recordvault.db"));

    let again = env.run(&["init", "--key-bits", "2048", "--no-input"]);
    assert_eq!(again.status.code(), Some(4));
    assert!(stderr(&again).contains("already exists"));
}

#[test]
fn test_full_record_lifecycle() {
    let env = Env::new();
    env.init();
    env.add_admin();
    let token = env.login();

    let add = env.run_with_token(
        &token,
        &[
            "record", "add", "--name", "Jane Doe", "--email", "jane@example.com", "--data",
            "{\"note\":\"hello\"}", "--json",
        ],
    );
    assert_success(&add, "record add");
    let id = json_stdout(&add)["id"].as_i64().expect("record id");

    let list = env.run_with_token(&token, &["record", "list", "--json"]);
    assert_success(&list, "record list");
    let listed = json_stdout(&list);
    let rows = listed.as_array().expect("list output array");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], id);
    assert_eq!(rows[0]["name"], "Jane Doe");
    assert_eq!(rows[0]["payload"]["status"], "decrypted");
    assert_eq!(rows[0]["payload"]["value"]["note"], "hello");
    assert!(rows[0].get("sensitive_data").is_none());

    let id_arg = id.to_string();
    let update = env.run_with_token(
        &token,
        &[
            "record", "update", &id_arg, "--name", "Jane Doe", "--email", "jane@example.com",
            "--text", "updated note",
        ],
    );
    assert_success(&update, "record update");

    let show = env.run_with_token(&token, &["record", "show", &id_arg, "--json"]);
    assert_success(&show, "record show");
    assert_eq!(json_stdout(&show)["sensitive_data"], "updated note");

    let delete = env.run_with_token(&token, &["record", "delete", &id_arg, "--yes"]);
    assert_success(&delete, "record delete");

    let gone = env.run_with_token(&token, &["record", "show", &id_arg]);
    assert_eq!(gone.status.code(), Some(3));
}

#[test]
fn test_plaintext_never_reaches_database_file() {
    let env = Env::new();
    env.init();
    env.add_admin();
    let token = env.login();

    let add = env.run_with_token(
        &token,
        &[
            "record", "add", "--name", "Jane", "--email", "jane@example.com", "--text",
            "very-secret-marker",
        ],
    );
    assert_success(&add, "record add");

    let db = env.data_home().join("recordvault").join("recordvault.db");
    let mut bytes = std::fs::read(&db).expect("read database");
    let wal = db.with_extension("db-wal");
    if wal.exists() {
        bytes.extend(std::fs::read(&wal).expect("read wal"));
    }
    let haystack = String::from_utf8_lossy(&bytes);
    assert!(!haystack.contains("very-secret-marker"));
}

#[test]
fn test_bad_credentials_and_missing_token() {
    let env = Env::new();
    env.init();
    env.add_admin();

    let wrong = env
        .command()
        .env("RECORDVAULT_PASSWORD", "not-the-password")
        .args(["login", ADMIN_EMAIL, "--no-input"])
        .output()
        .expect("run login");
    assert_eq!(wrong.status.code(), Some(5));

    let unknown = env.run(&["login", "nobody@example.com", "--no-input"]);
    assert_eq!(unknown.status.code(), Some(5));
    assert_eq!(stderr(&wrong), stderr(&unknown));

    let no_token = env.run(&["record", "list"]);
    assert_eq!(no_token.status.code(), Some(5));

    let bogus = env.run_with_token("not-a-token", &["record", "list"]);
    assert_eq!(bogus.status.code(), Some(5));
}

#[test]
fn test_deactivated_admin_cannot_log_in_or_use_token() {
    let env = Env::new();
    env.init();
    env.add_admin();
    let token = env.login();

    let deactivate = env.run(&["admin", "deactivate", ADMIN_EMAIL]);
    assert_success(&deactivate, "admin deactivate");

    let login = env.run(&["login", ADMIN_EMAIL, "--no-input"]);
    assert_eq!(login.status.code(), Some(5));
    let list = env.run_with_token(&token, &["record", "list"]);
    assert_eq!(list.status.code(), Some(5));

    let activate = env.run(&["admin", "activate", ADMIN_EMAIL]);
    assert_success(&activate, "admin activate");
    env.login();
}

#[test]
fn test_verify_does_not_print_token() {
    let env = Env::new();
    env.init();
    env.add_admin();

    let out = env.run(&["verify", ADMIN_EMAIL, "--json", "--no-input"]);
    assert_success(&out, "verify");
    let body = json_stdout(&out);
    assert_eq!(body["verified"], true);
    assert!(body.get("token").is_none());
}

#[test]
fn test_commands_before_init_point_to_init() {
    let env = Env::new();
    let out = env.run(&["keys", "status"]);
    assert_eq!(out.status.code(), Some(3));
    assert!(stderr(&out).contains("recordvault init"));
}

#[test]
fn test_keys_status_and_rewrap() {
    let env = Env::new();
    env.init();

    let status = env.run(&["keys", "status", "--json", "--check"]);
    assert_success(&status, "keys status");
    let body = json_stdout(&status);
    assert_eq!(body["status"], "complete");
    assert_eq!(body["unlocked"], true);
    let fingerprint = body["fingerprint"].as_str().expect("fingerprint").to_string();

    let new_phrase = "a-different-passphrase-456";
    let rewrap = env
        .command()
        .env("RECORDVAULT_NEW_PASSPHRASE", new_phrase)
        .args(["keys", "rewrap", "--json", "--no-input"])
        .output()
        .expect("run rewrap");
    assert_success(&rewrap, "keys rewrap");
    assert_eq!(json_stdout(&rewrap)["fingerprint"], fingerprint.as_str());

    let old = env.run(&["keys", "status", "--check"]);
    assert_eq!(old.status.code(), Some(6));

    let fresh = env
        .command()
        .env("KEY_ENCRYPTION_PASSPHRASE", new_phrase)
        .args(["keys", "status", "--check", "--json"])
        .output()
        .expect("run status");
    assert_success(&fresh, "keys status with new passphrase");
    assert_eq!(json_stdout(&fresh)["fingerprint"], fingerprint.as_str());
}

#[test]
fn test_missing_keys_fail_without_regenerating() {
    let env = Env::new();
    env.init();
    env.add_admin();
    let token = env.login();

    std::fs::remove_file(keys_dir(&env).join("public_key.pem")).expect("remove public key");

    let add = env.run_with_token(
        &token,
        &["record", "add", "--name", "A", "--email", "a@example.com", "--text", "x"],
    );
    assert_eq!(add.status.code(), Some(6));
    assert!(!keys_dir(&env).join("public_key.pem").exists());
}

#[test]
fn test_completions() {
    let out = Command::new(bin())
        .args(["completions", "bash"])
        .output()
        .expect("run completions");
    assert_success(&out, "completions");
    assert!(String::from_utf8_lossy(&out.stdout).contains("recordvault"));
}
