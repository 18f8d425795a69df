//! `stickers query` and `stickers serve` end to end.

use std::fs;

use serde_json::json;

use crate::common::cli::CliRunner;
use crate::common::fixtures::ManifestFixture;

const AUTHORITY: &str = "com.example.stickers.provider";

fn with_pack() -> (CliRunner, ManifestFixture) {
    let cli = CliRunner::new().with_env("RUST_LOG", "off");
    let manifest = ManifestFixture::toml("cats", 3);
    cli.run_robot(&["import", manifest.path_str()]).assert_success();
    (cli, manifest)
}

#[test]
fn metadata_query_returns_a_table() {
    let (cli, _manifest) = with_pack();
    let uri = format!("content://{AUTHORITY}/metadata");

    let result = cli.run_robot(&["query", &uri]);
    result
        .assert_success()
        .assert_json_array_len("/rows", 1)
        .assert_json_field("/columns/0", &json!("sticker_pack_identifier"))
        .assert_json_field("/rows/0/0", &json!("cats"));

    let table = result.json();
    let columns = table["columns"].as_array().unwrap();
    let animated = columns
        .iter()
        .position(|c| c == "animated_sticker_pack")
        .unwrap();
    assert_eq!(table["rows"][0][animated], json!(0));
}

#[test]
fn sticker_query_accepts_bare_paths() {
    let (cli, _manifest) = with_pack();
    cli.run_robot(&["query", "/stickers/cats"])
        .assert_success()
        .assert_json_array_len("/rows", 3)
        .assert_json_field("/rows/0/0", &json!("01.webp"))
        .assert_json_field("/rows/0/2", &json!(""));
}

#[test]
fn privileged_caller_gets_asset_path_and_mime() {
    let (cli, _manifest) = with_pack();
    let result = cli.run_robot(&["query", "/stickers_asset/cats/01.webp", "--caller", "com.whatsapp"]);
    result
        .assert_success()
        .assert_json_field("/mime_type", &json!("image/webp"))
        .assert_json_field("/file_name", &json!("01.webp"));

    let json = result.json();
    let path = json["path"].as_str().unwrap();
    assert_eq!(fs::metadata(path).unwrap().len(), json["len"].as_u64().unwrap());

    cli.run_robot(&["query", "/stickers_asset/cats/tray.png", "--caller", "com.whatsapp"])
        .assert_success()
        .assert_json_field("/mime_type", &json!("image/png"));
}

#[test]
fn external_caller_is_rejected() {
    let (cli, _manifest) = with_pack();
    let result = cli.run_robot(&["query", "/stickers_asset/cats/01.webp", "--caller", "com.other"]);
    result.assert_exit_code(1);
    let err = result.json_stderr();
    assert!(err["message"].as_str().unwrap().contains("com.other"));
    assert!(err["suggestion"].as_str().unwrap().contains("stickers_asset"));
}

#[test]
fn whitelisted_pack_is_open_to_everyone() {
    let (cli, _manifest) = with_pack();
    let config_dir = cli.home().join("config/stickers");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("config.toml"), "whitelisted_packs = [\"cats\"]\n").unwrap();

    cli.run_robot(&["query", "/stickers_asset/cats/02.webp", "--caller", "com.other"])
        .assert_success()
        .assert_json_field("/identifier", &json!("cats"));
}

#[test]
fn missing_asset_and_malformed_uri_fail() {
    let (cli, _manifest) = with_pack();

    let missing = cli.run_robot(&["query", "/stickers_asset/cats/none.webp", "--caller", "com.whatsapp"]);
    missing.assert_exit_code(1);
    assert!(missing.json_stderr()["message"].as_str().unwrap().contains("none.webp"));

    let malformed = cli.run_robot(&["query", "/stickers_asset/cats", "--caller", "com.whatsapp"]);
    malformed.assert_exit_code(1);
    assert!(malformed.json_stderr()["message"].as_str().unwrap().contains("Malformed"));

    let unknown = cli.run_robot(&["query", "content://someone.else/metadata"]);
    unknown.assert_exit_code(1);
}

#[test]
fn human_table_lists_columns() {
    let (cli, _manifest) = with_pack();
    cli.run(&["query", "/metadata/cats"])
        .assert_success()
        .assert_stdout_contains("sticker_pack_name: Cats")
        .assert_stdout_contains("(1 rows)");
}

#[test]
fn serve_rejects_an_invalid_bind_address() {
    let cli = CliRunner::new().with_env("RUST_LOG", "off");
    let result = cli.run_robot(&["serve", "--host", "not an address"]);
    result.assert_exit_code(1);
    assert!(result.json_stderr()["message"].as_str().unwrap().contains("not an address"));
}
