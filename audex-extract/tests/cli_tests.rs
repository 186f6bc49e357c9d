//! Command-line behaviour of the `audex` binary: arguments and exit codes

mod helpers;

use helpers::{write_wav, WavFixture};
use std::path::Path;
use std::process::{Command, Output};

fn run_audex(args: &[&Path], config_dir: &Path) -> Output {
    let settings = config_dir.join("settings.toml");
    std::fs::write(&settings, "log_filter = \"warn\"\n").unwrap();

    Command::new(env!("CARGO_BIN_EXE_audex"))
        .args(args)
        .env("AUDEX_CONFIG", &settings)
        .env_remove("AUDEX_OUTPUT_MODE")
        .env_remove("AUDEX_ON_DECODE_ERROR")
        .env_remove("AUDEX_MAX_DECODE_ERRORS")
        .env_remove("AUDEX_LOG")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run audex")
}

#[test]
fn test_missing_arguments_exit_with_usage_code() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.wav");

    let none = run_audex(&[], dir.path());
    assert_eq!(none.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&none.stderr).contains("Missing input media file or output file"));

    let one = run_audex(&[input.as_path()], dir.path());
    assert_eq!(one.status.code(), Some(1));
}

#[test]
fn test_successful_run_exits_zero_and_reports_format() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.wav");
    let output = dir.path().join("output.pcm");
    write_wav(&input, &WavFixture::unsigned_8bit(2, 8000, &[10, 30, 20, 40])).unwrap();

    let result = run_audex(&[input.as_path(), output.as_path()], dir.path());

    assert_eq!(result.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&result.stderr));
    assert_eq!(std::fs::read(&output).unwrap(), vec![10, 30, 20, 40]);
    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.contains("-f u8 -ac 2 -ar 8000"), "stdout: {}", stdout);
}

#[test]
fn test_setup_failure_exits_with_setup_code() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("garbage.bin");
    let output = dir.path().join("output.pcm");
    std::fs::write(&input, vec![0x5au8; 4096]).unwrap();

    let result = run_audex(&[input.as_path(), output.as_path()], dir.path());

    assert_eq!(result.status.code(), Some(3));
    assert!(!output.exists());
}

#[test]
fn test_invalid_settings_exit_with_config_code() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.wav");
    let output = dir.path().join("output.pcm");
    write_wav(&input, &WavFixture::unsigned_8bit(1, 8000, &[1])).unwrap();

    let result = Command::new(env!("CARGO_BIN_EXE_audex"))
        .args([&input, &output])
        .env("AUDEX_CONFIG", dir.path().join("missing.toml"))
        .output()
        .expect("failed to run audex");

    assert_eq!(result.status.code(), Some(2));
    assert!(!output.exists());
}
