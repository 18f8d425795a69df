//! Human-mode end-to-end tests.

use assert_cmd::Command;
use predicates::prelude::*;

use crate::common::cli::CliRunner;
use crate::common::fixtures::ManifestFixture;
use crate::common::logging::LogVerifier;

/// `stickers` with an isolated home, as an `assert_cmd` command.
fn stickers(cli: &CliRunner) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_stickers"));
    cmd.env_clear()
        .env("HOME", cli.home())
        .env("XDG_CONFIG_HOME", cli.home().join("config"))
        .env("STICKERS_DATA_DIR", cli.data_dir())
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn quick_start_lists_content_uris() {
    let cli = CliRunner::new();
    stickers(&cli)
        .assert()
        .success()
        .stdout(predicate::str::contains("QUICK START"))
        .stdout(predicate::str::contains("/stickers_asset/<ID>/<FILE>"));
}

#[test]
fn help_names_every_command() {
    let cli = CliRunner::new();
    let output = stickers(&cli).arg("--help").output().unwrap();
    assert!(output.status.success());
    let help = String::from_utf8_lossy(&output.stdout);
    for cmd in [
        "init",
        "import",
        "list",
        "show",
        "rename",
        "set-links",
        "add-sticker",
        "rename-sticker",
        "delete",
        "delete-sticker",
        "validate",
        "query",
        "serve",
        "convert",
        "completions",
    ] {
        assert!(help.contains(cmd), "help is missing {cmd}");
    }
}

#[test]
fn empty_store_says_so() {
    let cli = CliRunner::new();
    stickers(&cli)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No sticker packs stored."));
}

#[test]
fn import_and_show_render_text() {
    let cli = CliRunner::new();
    let manifest = ManifestFixture::toml("cats", 3);

    stickers(&cli)
        .args(["import", manifest.path_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("[OK] Saved pack cats (3 stickers"));

    stickers(&cli)
        .args(["ls"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sticker packs (1)"))
        .stdout(predicate::str::contains("valid"));

    stickers(&cli)
        .args(["show", "cats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cats [valid]"))
        .stdout(predicate::str::contains("https://example.com"))
        .stdout(predicate::str::contains("Stickers (3)"))
        .stdout(predicate::str::contains("02.webp"));
}

#[test]
fn errors_go_to_stderr_with_hint() {
    let cli = CliRunner::new();
    stickers(&cli)
        .args(["show", "ghost"])
        .env("RUST_LOG", "off")
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("[ERR] Sticker pack not found: ghost"))
        .stderr(predicate::str::contains("hint: Run: stickers list"));
}

#[test]
fn validation_error_shows_code() {
    let cli = CliRunner::new();
    let manifest = ManifestFixture::toml("few", 1);
    stickers(&cli)
        .args(["import", manifest.path_str()])
        .env("RUST_LOG", "off")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("code: INVALID_STICKERPACK_SIZE"));
}

#[test]
fn warnings_are_prefixed() {
    let cli = CliRunner::new();
    stickers(&cli)
        .args(["delete", "ghost"])
        .env("RUST_LOG", "off")
        .assert()
        .success()
        .stderr(predicate::str::contains("[WARN] no rows deleted"));
}

#[test]
fn verbose_flag_emits_debug_logs() {
    let cli = CliRunner::new();
    let result = cli.run(&["-v", "list"]);
    result.assert_success();

    let logs = LogVerifier::from_stderr(&result.stderr);
    logs.assert_debug("Opening store");
    logs.assert_no_errors();
}

#[test]
fn quiet_flag_hides_info_logs() {
    let cli = CliRunner::new();
    let manifest = ManifestFixture::toml("cats", 3);
    let result = cli.run(&["-q", "import", manifest.path_str()]);
    result.assert_success();
    assert!(
        !result.stderr.contains("Sticker pack saved"),
        "quiet mode leaked info logs:\n{}",
        result.stderr
    );
}

#[test]
fn completions_are_generated() {
    let cli = CliRunner::new();
    stickers(&cli)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("_stickers"));
}

#[test]
fn unknown_subcommand_is_a_usage_error() {
    let cli = CliRunner::new();
    stickers(&cli)
        .arg("frobnicate")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unrecognized subcommand"));
}
