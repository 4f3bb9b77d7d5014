use std::io::Write;

use clap::Parser;
use tempfile::NamedTempFile;

use authplug_hash::Digest;

use super::cmd::AccessArg;
use super::cmd::Command;
use super::execute;
use super::Cli;
use super::EXIT_ALLOWED;
use super::EXIT_DENIED;

/// Write a configuration file using the static backend.
fn conf_file() -> NamedTempFile {
    let hash = authplug_hash::hash_password("secret", Digest::Sha256, 10).unwrap();
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
backends: "psk,static"
psk_database: static
superusers: "admin-*"
global_acl_pattern: "read public/#"
logging:
  async: false
  level: critical
static:
  users:
    alice: "{hash}"
  acls:
    - username: alice
      topic: "users/%u/#"
      access: [read, write]
  psk_keys:
    device-1: "0123456789"
"#
    )
    .unwrap();
    file
}

fn run(file: &NamedTempFile, args: &[&str]) -> i32 {
    let path = file.path().to_string_lossy().to_string();
    let mut argv = vec!["authplug", "-c", path.as_str()];
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv).unwrap();
    let conf = authplug_conf::load(&cli.config).unwrap();
    execute(cli, conf).unwrap()
}

#[test]
fn parse_acl_command() {
    let cli = Cli::try_parse_from([
        "authplug",
        "acl",
        "--client-id",
        "c1",
        "-u",
        "alice",
        "--topic",
        "a/b",
        "--access",
        "readwrite",
    ])
    .unwrap();
    assert_eq!(cli.config, "authplug.yaml");
    match cli.command {
        Command::Acl(args) => {
            assert_eq!(args.access, AccessArg::Readwrite);
            assert_eq!(args.client_id, "c1");
        }
        other => panic!("unexpected command {:?}", other),
    }
}

#[test]
fn parse_rejects_unknown_access() {
    let result = Cli::try_parse_from([
        "authplug",
        "acl",
        "--client-id",
        "c1",
        "-u",
        "alice",
        "--topic",
        "a/b",
        "--access",
        "subscribe",
    ]);
    assert!(result.is_err());
}

#[test]
fn check_valid_configuration() {
    let file = conf_file();
    assert_eq!(run(&file, &["check"]), EXIT_ALLOWED);
}

#[test]
fn auth_exit_codes() {
    let file = conf_file();
    let code = run(&file, &["auth", "-u", "alice", "-p", "secret"]);
    assert_eq!(code, EXIT_ALLOWED);
    let code = run(&file, &["auth", "-u", "alice", "-p", "wrong"]);
    assert_eq!(code, EXIT_DENIED);
}

#[test]
fn acl_exit_codes() {
    let file = conf_file();
    let args = [
        "acl",
        "--client-id",
        "c1",
        "-u",
        "alice",
        "--topic",
        "users/alice/inbox",
        "--access",
        "write",
    ];
    assert_eq!(run(&file, &args), EXIT_ALLOWED);

    let args = ["acl", "--client-id", "c1", "-u", "bob", "--topic", "public/news"];
    assert_eq!(run(&file, &args), EXIT_ALLOWED);

    let args = [
        "acl",
        "--client-id",
        "c1",
        "-u",
        "bob",
        "--topic",
        "public/news",
        "--access",
        "write",
    ];
    assert_eq!(run(&file, &args), EXIT_DENIED);
}

#[test]
fn psk_exit_codes() {
    let file = conf_file();
    assert_eq!(run(&file, &["psk", "-i", "device-1"]), EXIT_ALLOWED);
    assert_eq!(run(&file, &["psk", "-i", "device-2"]), EXIT_DENIED);
}

#[test]
fn invalid_configuration_is_fatal() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "backends: \"static,ldap\"\nstatic: {{}}\n").unwrap();
    let path = file.path().to_string_lossy().to_string();
    let cli = Cli::try_parse_from(["authplug", "-c", &path, "check"]).unwrap();
    let conf = authplug_conf::load(&cli.config).unwrap();
    let error = execute(cli, conf).unwrap_err();
    assert!(error.is::<authplug_engine::errors::BackendNotFound>());
}
