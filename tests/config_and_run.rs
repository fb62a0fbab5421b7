// tests/config_and_run.rs

use std::error::Error;
use std::fs;
use std::io::Write;
use std::path::Path;

use clap::Parser;
use netdiag::cli::CliArgs;
use netdiag::config::{load_and_validate, load_from_path};
use netdiag::errors::NetdiagError;
use netdiag::logging::resolve_level;
use netdiag::types::{LocalDnsKind, RunMode};
use netdiag_test_utils::builders::ConfigFileBuilder;
use netdiag_test_utils::{init_tracing, with_timeout};
use tempfile::NamedTempFile;
use tracing::Level;

type TestResult = Result<(), Box<dyn Error>>;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

fn fake_sysfs(root: &Path) {
    let eth = root.join("eth0");
    fs::create_dir_all(&eth).unwrap();
    fs::write(eth.join("operstate"), "up\n").unwrap();
}

fn args(extra: &[&str]) -> CliArgs {
    let mut argv = vec!["netdiag"];
    argv.extend_from_slice(extra);
    CliArgs::try_parse_from(argv).unwrap()
}

#[test]
fn full_config_is_parsed() -> TestResult {
    let file = config_file(
        r#"
[config]
debug = true
mode = "chain"
abort_on_error = true

[ping]
targets = ["example.com", "1.1.1.1"]
count = 2
program = "/system/bin/ping"

[ip]
servers = ["https://api.ipify.org/?format=text"]
timeout_secs = 5

[dns]
local_source = "getprop"

[network_info]
enabled = false
"#,
    );

    let cfg = load_and_validate(file.path())?;
    assert!(cfg.config.debug);
    assert_eq!(cfg.config.mode, RunMode::Chain);
    assert!(cfg.config.abort_on_error);
    assert_eq!(cfg.ping.targets, vec!["example.com", "1.1.1.1"]);
    assert_eq!(cfg.ping.count, 2);
    assert_eq!(cfg.ping.program, "/system/bin/ping");
    assert_eq!(cfg.ip.servers.len(), 1);
    assert_eq!(cfg.ip.timeout_secs, 5);
    assert_eq!(cfg.dns.local_source, LocalDnsKind::Getprop);
    assert!(cfg.dns.enabled);
    assert!(!cfg.network_info.enabled);
    Ok(())
}

#[test]
fn empty_file_uses_defaults() -> TestResult {
    let file = config_file("");
    let cfg = load_and_validate(file.path())?;

    assert_eq!(cfg.config.mode, RunMode::Parallel);
    assert!(!cfg.config.debug);
    assert!(cfg.ip.enabled && cfg.dns.enabled && cfg.network_info.enabled);
    assert!(cfg.ping.targets.is_empty());
    assert_eq!(cfg.ping.count, 4);
    Ok(())
}

#[test]
fn invalid_toml_is_a_toml_error() {
    let file = config_file("[config\nmode = ");
    assert!(matches!(load_from_path(file.path()), Err(NetdiagError::TomlError(_))));
}

#[test]
fn unknown_mode_is_rejected_by_serde() {
    let file = config_file("[config]\nmode = \"serial\"\n");
    assert!(matches!(load_from_path(file.path()), Err(NetdiagError::TomlError(_))));
}

#[test]
fn missing_file_is_an_io_error() {
    assert!(matches!(
        load_from_path("/definitely/not/here/netdiag.toml"),
        Err(NetdiagError::IoError(_))
    ));
}

#[test]
fn semantic_errors_are_config_errors() {
    let cases = [
        (
            "[ip]\nenabled = false\n[dns]\nenabled = false\n[network_info]\nenabled = false\n",
            "at least one check",
        ),
        ("[ping]\ntargets = [\"a b\"]\n", "invalid host"),
        ("[ping]\ntargets = [\"a\"]\ncount = 0\n", "[ping].count"),
        ("[ip]\nservers = []\n", "[ip].servers"),
        ("[ip]\nservers = [\"ftp://x\"]\n", "http(s) URL"),
        ("[dns]\ntimeout_secs = 0\n", "[dns].timeout_secs"),
    ];

    for (toml, needle) in cases {
        let file = config_file(toml);
        match load_and_validate(file.path()) {
            Err(NetdiagError::ConfigError(msg)) => {
                assert!(msg.contains(needle), "{msg:?} should mention {needle:?}")
            }
            other => panic!("expected ConfigError for {toml:?}, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn dry_run_does_not_execute_checks() -> TestResult {
    init_tracing();
    let file = config_file("[ping]\ntargets = [\"example.com\"]\nprogram = \"/definitely/not/ping\"\n");
    let path = file.path().to_string_lossy().into_owned();

    netdiag::run(args(&["--config", &path, "--dry-run"])).await?;
    Ok(())
}

#[tokio::test]
async fn cli_overrides_are_validated() {
    init_tracing();
    let file = config_file("");
    let path = file.path().to_string_lossy().into_owned();

    let result = netdiag::run(args(&["--config", &path, "--ping", "bad host", "--dry-run"])).await;
    assert!(result.is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn chain_run_succeeds_with_local_checks() -> TestResult {
    init_tracing();
    let sysfs = tempfile::tempdir()?;
    fake_sysfs(sysfs.path());
    let file = config_file(&format!(
        "[config]\nmode = \"chain\"\n[ip]\nenabled = false\n[dns]\nenabled = false\n\
         [network_info]\nsysfs_root = {:?}\n",
        sysfs.path()
    ));
    let path = file.path().to_string_lossy().into_owned();

    with_timeout(netdiag::run(args(&["--config", &path, "--debug"]))).await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failing_check_makes_the_run_fail() -> TestResult {
    init_tracing();
    let sysfs = tempfile::tempdir()?;
    fake_sysfs(sysfs.path());
    let file = config_file(&format!(
        "[ip]\nenabled = false\n[dns]\nenabled = false\n\
         [ping]\ntargets = [\"localhost\"]\nprogram = \"/definitely/not/ping\"\n\
         [network_info]\nsysfs_root = {:?}\n",
        sysfs.path()
    ));
    let path = file.path().to_string_lossy().into_owned();

    for mode in ["parallel", "chain"] {
        let err = with_timeout(netdiag::run(args(&["--config", &path, "--mode", mode])))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("1 check(s) failed"), "{mode}: {err}");
    }
    Ok(())
}

#[test]
fn builder_produces_valid_configs() {
    let sysfs = tempfile::tempdir().unwrap();
    let cfg = ConfigFileBuilder::new()
        .with_mode(RunMode::Chain)
        .with_abort_on_error(true)
        .with_ping_target("example.com")
        .with_ping_count(1)
        .with_network_info(sysfs.path())
        .build();

    assert_eq!(cfg.config.mode, RunMode::Chain);
    assert!(!cfg.ip.enabled);
    assert_eq!(cfg.ping.count, 1);
}

#[test]
fn config_file_debug_raises_the_log_level() -> TestResult {
    let file = config_file("[config]\ndebug = true\n");
    let path = file.path().to_string_lossy().into_owned();

    let cfg = netdiag::resolve_config(&args(&["--config", &path]))?;
    assert!(cfg.config.debug);
    assert_eq!(resolve_level(None, None, cfg.config.debug), Level::DEBUG);

    let quiet = netdiag::resolve_config(&args(&["--config", &path, "--log-level", "warn"]))?;
    let cli = args(&["--config", &path, "--log-level", "warn"]);
    assert_eq!(resolve_level(cli.log_level, None, quiet.config.debug), Level::WARN);
    Ok(())
}

#[test]
fn debug_flag_is_folded_into_the_config() -> TestResult {
    let file = config_file("");
    let path = file.path().to_string_lossy().into_owned();

    let cfg = netdiag::resolve_config(&args(&["--config", &path, "--debug"]))?;
    assert!(cfg.config.debug);
    assert_eq!(resolve_level(None, Some("info"), cfg.config.debug), Level::DEBUG);
    Ok(())
}
