//! Configuration files, data directory selection and environment variables.

use std::fs;

use serde_json::json;

use crate::common::cli::CliRunner;
use crate::common::fixtures::ManifestFixture;

#[test]
fn init_writes_config_and_creates_schema() {
    let cli = CliRunner::new();
    let result = cli.run_robot(&["init"]);
    result.assert_success().assert_json_field("/ok", &json!(true));

    let config = cli.home().join("config/stickers/config.toml");
    assert!(config.is_file());
    let text = fs::read_to_string(&config).unwrap();
    assert!(text.contains("authority"));
    assert!(text.contains("[limits]"));
    assert!(cli.data_dir().join("stickers.db").is_file());
}

#[test]
fn init_refuses_to_overwrite_without_force() {
    let cli = CliRunner::new().with_env("RUST_LOG", "off");
    cli.run_robot(&["init"]).assert_success();

    let again = cli.run_robot(&["init"]);
    again.assert_exit_code(1);
    assert!(again.json_stderr()["message"].as_str().unwrap().contains("--force"));

    cli.run_robot(&["init", "--force"]).assert_success();
}

#[test]
fn init_writes_yaml_for_yaml_paths() {
    let cli = CliRunner::new();
    let path = cli.home().join("custom/stickers.yaml");
    cli.run_robot(&["--config", path.to_str().unwrap(), "init"])
        .assert_success();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("authority:"));
    assert!(text.contains("min_pack_size: 3"));
}

#[test]
fn limits_from_config_apply_to_imports() {
    let cli = CliRunner::new();
    let config = cli.home().join("relaxed.toml");
    fs::write(&config, "[limits]\nmin_pack_size = 1\n").unwrap();
    let manifest = ManifestFixture::toml("solo", 1);

    cli.run_robot(&["-c", config.to_str().unwrap(), "import", manifest.path_str()])
        .assert_success()
        .assert_json_field("/stickers", &json!(1));
}

#[test]
fn inconsistent_limits_are_rejected() {
    let cli = CliRunner::new().with_env("RUST_LOG", "off");
    let config = cli.home().join("broken.toml");
    fs::write(&config, "[limits]\nmin_pack_size = 10\nmax_pack_size = 5\n").unwrap();

    let result = cli.run_robot(&["-c", config.to_str().unwrap(), "list"]);
    result.assert_exit_code(1);
    assert!(result.json_stderr()["message"].as_str().unwrap().contains("min_pack_size"));
}

#[test]
fn missing_explicit_config_is_an_error() {
    let cli = CliRunner::new().with_env("RUST_LOG", "off");
    let result = cli.run_robot(&["-c", "/nonexistent/stickers.toml", "list"]);
    result.assert_exit_code(1);
    assert_eq!(result.json_stderr()["error"], true);
}

#[test]
fn data_dir_flag_overrides_environment() {
    let cli = CliRunner::new();
    let other = cli.home().join("elsewhere");
    let manifest = ManifestFixture::toml("cats", 3);

    cli.run_robot(&["--data-dir", other.to_str().unwrap(), "import", manifest.path_str()])
        .assert_success();
    assert!(other.join("stickers.db").is_file());
    assert!(other.join("stickers_asset/cats/01.webp").is_file());

    // The default data dir of this runner is untouched.
    cli.run_robot(&["list"]).assert_json_array_len("", 0);
}

#[test]
fn format_can_come_from_environment() {
    let cli = CliRunner::new().with_env("STICKERS_FORMAT", "json");
    let result = cli.run(&["list"]);
    result.assert_success();
    assert!(result.json().is_array());
}

#[test]
fn robot_logs_are_json_lines_on_stderr() {
    let cli = CliRunner::new().with_env("RUST_LOG", "stickers=info");
    let manifest = ManifestFixture::toml("cats", 3);
    let result = cli.run_robot(&["import", manifest.path_str()]);
    result.assert_success();

    let saved = result
        .stderr
        .lines()
        .filter_map(|line| serde_json::from_str::<serde_json::Value>(line).ok())
        .find(|entry| entry["fields"]["message"] == "Sticker pack saved")
        .expect("no JSON log line for the save");
    assert_eq!(saved["level"], "INFO");
}
