//! Robot-mode end-to-end tests: every command's JSON on stdout, errors as
//! JSON on stderr.

use serde_json::{Value, json};

use crate::common::cli::CliRunner;
use crate::common::fixtures::{ManifestFixture, write_png, write_webp};
use crate::common::init_test_logging;

fn import(cli: &CliRunner, manifest: &ManifestFixture) -> Value {
    let result = cli.run_robot(&["import", manifest.path_str()]);
    result.assert_success();
    result.json()
}

#[test]
fn robot_quick_start_outputs_json() {
    init_test_logging();
    let cli = CliRunner::new();
    let result = cli.run(&["--robot"]);
    result.assert_success();

    let json = result.json();
    assert_eq!(json["tool"], "stickers");
    assert!(json.get("content").is_some());
    assert!(json.get("output_modes").is_some());
}

#[test]
fn version_outputs_build_info() {
    let cli = CliRunner::new();
    let result = cli.run(&["version", "--format=json"]);
    result.assert_success();

    let json = result.json();
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert!(json["git_dirty"].is_boolean());
}

#[test]
fn compact_json_is_one_line() {
    let cli = CliRunner::new();
    let result = cli.run(&["--format=json-compact", "version"]);
    result.assert_success();
    assert_eq!(result.stdout.trim().lines().count(), 1);
}

#[test]
fn list_on_fresh_store_is_empty_array() {
    init_test_logging();
    let cli = CliRunner::new();
    cli.run_robot(&["list"])
        .assert_success()
        .assert_json_array_len("", 0);
}

#[test]
fn import_then_list_and_show() {
    init_test_logging();
    let cli = CliRunner::new();
    let manifest = ManifestFixture::toml("cats", 3);

    let summary = import(&cli, &manifest);
    assert_eq!(summary["identifier"], "cats");
    assert_eq!(summary["stickers"], 3);
    assert_eq!(summary["converted"], false);
    assert_eq!(summary["invalid_stickers"], json!([]));
    assert!(summary["total_size"].as_u64().unwrap() > 0);

    assert!(cli.data_dir().join("stickers.db").is_file());
    assert!(cli.data_dir().join("stickers_asset/cats/tray.png").is_file());
    assert!(cli.data_dir().join("stickers_asset/cats/01.webp").is_file());

    let list = cli.run_robot(&["list"]);
    list.assert_success()
        .assert_json_array_len("", 1)
        .assert_json_field("/0/identifier", &json!("cats"))
        .assert_json_field("/0/health", &json!("valid"));

    let show = cli.run_robot(&["show", "cats"]);
    show.assert_success()
        .assert_json_field("/name", &json!("Cats"))
        .assert_json_field("/publisher_website", &json!("https://example.com"))
        .assert_json_field("/image_data_version", &json!("1"))
        .assert_json_array_len("/stickers", 3);
    let json = show.json();
    assert_eq!(json["stickers"][0]["file_name"], "01.webp");
    assert_eq!(json["stickers"][0]["emojis"], json!(["😺"]));
    assert_eq!(json["total_size"], summary["total_size"]);
}

#[test]
fn importing_same_identifier_twice_fails_and_keeps_files() {
    let cli = CliRunner::new().with_env("RUST_LOG", "off");
    let manifest = ManifestFixture::toml("cats", 3);
    import(&cli, &manifest);

    let again = cli.run_robot(&["import", manifest.path_str()]);
    again.assert_exit_code(1);
    let err = again.json_stderr();
    assert_eq!(err["error"], true);
    assert!(err["message"].as_str().unwrap().contains("cats"));

    assert!(cli.data_dir().join("stickers_asset/cats/01.webp").is_file());
    cli.run_robot(&["list"]).assert_json_array_len("", 1);
}

#[test]
fn rejected_import_reports_validation_code_and_removes_copies() {
    let cli = CliRunner::new().with_env("RUST_LOG", "off");
    let manifest = ManifestFixture::toml("few", 2);

    let result = cli.run_robot(&["import", manifest.path_str()]);
    result.assert_exit_code(1);
    let err = result.json_stderr();
    assert_eq!(err["code"], "INVALID_STICKERPACK_SIZE");
    assert_eq!(err["recoverable"], true);

    assert!(!cli.data_dir().join("stickers_asset/few").exists());
    cli.run_robot(&["list"]).assert_json_array_len("", 0);
}

#[test]
fn import_without_conversion_flags_wrong_sized_stickers() {
    let cli = CliRunner::new();
    let manifest = ManifestFixture::yaml_needing_conversion("dogs", 3);

    let result = cli.run_robot(&["import", manifest.path_str()]);
    result.assert_success();
    let summary = result.json();
    let invalid = summary["invalid_stickers"].as_array().unwrap();
    assert_eq!(invalid.len(), 3);
    assert!(invalid.iter().all(|s| s["marker"] == "ERROR_FILE_TYPE" || s["marker"] == "ERROR_SIZE_STICKER"));

    // Every sticker is flagged, so nothing in the pack is usable.
    cli.run_robot(&["list"])
        .assert_json_field("/0/health", &json!("invalid"));
}

#[test]
fn import_with_conversion_produces_valid_pack() {
    init_test_logging();
    let cli = CliRunner::new();
    let manifest = ManifestFixture::yaml_needing_conversion("dogs", 3);

    let result = cli.run_robot(&["import", manifest.path_str(), "--convert", "--strategy", "fill"]);
    result.assert_success();
    let summary = result.json();
    assert_eq!(summary["converted"], true);
    assert_eq!(summary["invalid_stickers"], json!([]));

    let assets = cli.data_dir().join("stickers_asset/dogs");
    assert!(assets.join("tray-source.png").is_file());
    assert!(assets.join("dog1.webp").is_file());

    cli.run_robot(&["show", "dogs"])
        .assert_success()
        .assert_json_field("/tray_image", &json!("tray-source.png"))
        .assert_json_field("/stickers/2/file_name", &json!("dog3.webp"))
        .assert_json_field("/health", &json!("valid"));
}

#[test]
fn rename_reports_status() {
    let cli = CliRunner::new();
    import(&cli, &ManifestFixture::toml("cats", 3));

    cli.run_robot(&["rename", "cats", "Kittens"])
        .assert_success()
        .assert_json_field("/status", &json!("updated"));
    cli.run_robot(&["rename", "cats", "Kittens"])
        .assert_success()
        .assert_json_field("/status", &json!("unchanged"));
    cli.run_robot(&["show", "cats"])
        .assert_json_field("/name", &json!("Kittens"));
}

#[test]
fn rename_of_missing_pack_is_a_warning() {
    let cli = CliRunner::new();
    let result = cli.run_robot(&["rename", "ghost", "Ghost"]);
    result
        .assert_success()
        .assert_json_field("/warning", &json!(true));
    assert!(result.json()["message"].as_str().unwrap().contains("ghost"));
}

#[test]
fn set_links_merges_and_clears() {
    let cli = CliRunner::new();
    import(&cli, &ManifestFixture::toml("cats", 3));

    cli.run_robot(&["set-links", "cats", "--email", "jane@example.com"])
        .assert_success()
        .assert_json_field("/status", &json!("updated"));
    let show = cli.run_robot(&["show", "cats"]).json();
    assert_eq!(show["publisher_email"], "jane@example.com");
    assert_eq!(show["publisher_website"], "https://example.com");

    let bad = cli.run_robot(&["set-links", "cats", "--android", "https://example.com/app"]);
    bad.assert_success().assert_json_field("/warning", &json!(true));
    assert!(bad.json()["message"].as_str().unwrap().contains("INVALID_ANDROID_URL_SITE"));

    cli.run_robot(&["set-links", "cats", "--clear"]).assert_success();
    let show = cli.run_robot(&["show", "cats"]).json();
    assert!(show.get("publisher_email").is_none());
    assert!(show.get("publisher_website").is_none());
}

#[test]
fn add_sticker_appends_and_bumps_version() {
    let cli = CliRunner::new();
    let manifest = ManifestFixture::toml("cats", 3);
    import(&cli, &manifest);
    let extra = manifest.source("extra.webp");
    write_webp(&extra, 512, 512);

    let result = cli.run_robot(&[
        "add-sticker",
        "cats",
        extra.to_str().unwrap(),
        "-e",
        "🐈",
        "-e",
        "🐾",
        "--text",
        "one more cat",
    ]);
    result
        .assert_success()
        .assert_json_array_len("/stickers", 4)
        .assert_json_field("/image_data_version", &json!("2"))
        .assert_json_field("/stickers/3/emojis", &json!(["🐈", "🐾"]));
    assert!(cli.data_dir().join("stickers_asset/cats/extra.webp").is_file());

    let dup = cli
        .with_env("RUST_LOG", "off")
        .run_robot(&["add-sticker", "cats", extra.to_str().unwrap(), "-e", "🐈", "-t", "dup"]);
    dup.assert_exit_code(1);
    assert!(dup.json_stderr()["message"].as_str().unwrap().contains("already exists"));
}

#[test]
fn add_sticker_with_conversion_renames_to_webp() {
    let cli = CliRunner::new();
    let manifest = ManifestFixture::toml("cats", 3);
    import(&cli, &manifest);
    let source = manifest.source("photo.png");
    write_png(&source, 800);

    cli.run_robot(&[
        "add-sticker",
        "cats",
        source.to_str().unwrap(),
        "-e",
        "📷",
        "-t",
        "a photo",
        "--convert",
    ])
    .assert_success()
    .assert_json_field("/stickers/3/file_name", &json!("photo.webp"))
    .assert_json_field("/stickers/3/validity_marker", &json!(""));
}

#[test]
fn add_sticker_to_missing_pack_fails() {
    let cli = CliRunner::new().with_env("RUST_LOG", "off");
    let source = cli.home().join("x.webp");
    write_webp(&source, 512, 512);

    let result = cli.run_robot(&["add-sticker", "ghost", source.to_str().unwrap(), "-e", "👻", "-t", "boo"]);
    result.assert_exit_code(1);
    assert!(result.json_stderr()["message"].as_str().unwrap().contains("ghost"));
}

#[test]
fn rename_sticker_moves_the_file() {
    let cli = CliRunner::new();
    import(&cli, &ManifestFixture::toml("cats", 3));

    cli.run_robot(&["rename-sticker", "cats", "01.webp", "first.webp"])
        .assert_success()
        .assert_json_field("/status", &json!("updated"));

    let assets = cli.data_dir().join("stickers_asset/cats");
    assert!(assets.join("first.webp").is_file());
    assert!(!assets.join("01.webp").exists());
    cli.run_robot(&["show", "cats"])
        .assert_json_field("/stickers/0/file_name", &json!("first.webp"))
        .assert_json_field("/stickers/0/validity_marker", &json!(""));
}

#[test]
fn delete_sticker_then_pack() {
    let cli = CliRunner::new();
    import(&cli, &ManifestFixture::toml("cats", 3));
    let assets = cli.data_dir().join("stickers_asset/cats");

    cli.run_robot(&["delete-sticker", "cats", "02.webp"])
        .assert_success()
        .assert_json_field("/rows", &json!(1))
        .assert_json_field("/files_removed", &json!(1));
    assert!(!assets.join("02.webp").exists());

    cli.run_robot(&["delete-sticker", "cats", "02.webp"])
        .assert_success()
        .assert_json_field("/warning", &json!(true));

    cli.run_robot(&["delete", "cats"])
        .assert_success()
        .assert_json_field("/rows", &json!(3))
        .assert_json_field("/files_removed", &json!(3));
    assert!(!assets.exists());
    cli.run_robot(&["list"]).assert_json_array_len("", 0);
}

#[test]
fn delete_can_keep_files() {
    let cli = CliRunner::new();
    import(&cli, &ManifestFixture::toml("cats", 3));

    let result = cli.run_robot(&["delete", "cats", "--keep-files"]);
    result.assert_success();
    assert!(result.json().get("files_removed").is_none());
    assert!(cli.data_dir().join("stickers_asset/cats/01.webp").is_file());
}

#[test]
fn import_refuses_to_overwrite_kept_files() {
    let cli = CliRunner::new().with_env("RUST_LOG", "off");
    let manifest = ManifestFixture::toml("cats", 3);
    import(&cli, &manifest);
    cli.run_robot(&["delete", "cats", "--keep-files"]).assert_success();

    let again = cli.run_robot(&["import", manifest.path_str()]);
    again.assert_exit_code(1);
    let err = again.json_stderr();
    assert!(err["message"].as_str().unwrap().contains("already exists"));
    assert_eq!(err["recoverable"], true);
    assert!(cli.data_dir().join("stickers_asset/cats/01.webp").is_file());
    cli.run_robot(&["list"]).assert_json_array_len("", 0);

    cli.run_robot(&["import", manifest.path_str(), "--overwrite"])
        .assert_success()
        .assert_json_field("/stickers", &json!(3));
}

#[test]
fn failed_import_over_kept_files_removes_only_its_own_copies() {
    let cli = CliRunner::new().with_env("RUST_LOG", "off");
    import(&cli, &ManifestFixture::toml("cats", 3));
    cli.run_robot(&["delete", "cats", "--keep-files"]).assert_success();

    let manifest = ManifestFixture::toml("cats", 4);
    let text = std::fs::read_to_string(&manifest.path).unwrap();
    std::fs::write(
        &manifest.path,
        text.replace("\"cat number 4\"", "\"\""),
    )
    .unwrap();

    let result = cli.run_robot(&["import", manifest.path_str(), "--overwrite"]);
    result.assert_exit_code(1);
    assert_eq!(result.json_stderr()["code"], "INVALID_STICKER_ACCESSIBILITY");

    let assets = cli.data_dir().join("stickers_asset/cats");
    for kept in ["tray.png", "01.webp", "02.webp", "03.webp"] {
        assert!(assets.join(kept).is_file(), "{kept} was removed");
    }
    assert!(!assets.join("04.webp").exists());
    cli.run_robot(&["list"]).assert_json_array_len("", 0);
}

#[test]
fn validate_refreshes_markers() {
    let cli = CliRunner::new();
    import(&cli, &ManifestFixture::toml("cats", 3));
    std::fs::remove_file(cli.data_dir().join("stickers_asset/cats/03.webp")).unwrap();

    let result = cli.run_robot(&["validate", "cats"]);
    result
        .assert_success()
        .assert_json_field("/health", &json!("valid_with_invalid_stickers"))
        .assert_json_field("/changed/0", &json!(["03.webp", "INVALID_STICKER_PATH"]));

    cli.run_robot(&["show", "cats"])
        .assert_json_field("/stickers/2/validity_marker", &json!("INVALID_STICKER_PATH"));
}

#[test]
fn show_and_validate_of_missing_pack_fail() {
    let cli = CliRunner::new().with_env("RUST_LOG", "off");
    for cmd in ["show", "validate"] {
        let result = cli.run_robot(&[cmd, "ghost"]);
        result.assert_exit_code(1);
        let err = result.json_stderr();
        assert_eq!(err["error"], true);
        assert!(err["suggestion"].is_string(), "{cmd} should suggest a fix");
    }
}

#[test]
fn convert_writes_a_sticker() {
    let cli = CliRunner::new();
    let input = cli.home().join("in.png");
    let output = cli.home().join("out.webp");
    write_png(&input, 300);

    cli.run_robot(&["convert", input.to_str().unwrap(), output.to_str().unwrap()])
        .assert_success()
        .assert_json_field("/ok", &json!(true));

    let img = image::open(&output).unwrap();
    assert_eq!((img.width(), img.height()), (512, 512));
}
