//! Sticker store CLI - persist, validate and serve sticker packs.
//!
//! Provides both human-friendly and agent-friendly (robot mode) interfaces.
#![forbid(unsafe_code)]

use std::collections::HashSet;
use std::fs;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use stickers::cli::{self, Cli, Commands};
use stickers::config::{ConfigFormat, PackManifest, Settings, default_config_path, default_data_dir};
use stickers::content::{ContentProvider, ContentResponse};
use stickers::convert::{ImageConverter, MediaConverter, ResizeStrategy, convert_async};
use stickers::error::{Result, ResultExt, StickerError};
use stickers::logging::init_logging;
use stickers::outcome::Outcome;
use stickers::output::{DeleteSummary, ImportSummary, Output, OutputMode, VersionInfo};
use stickers::pack::{PackLinks, Sticker};
use stickers::server;
use stickers::service::{StickerService, UpdateStatus, WritePool, classify};
use stickers::store::{AssetStore, StickerDb, repo};

/// Build information embedded at compile time.
mod build_info {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    pub fn git_sha() -> &'static str {
        option_env!("VERGEN_GIT_SHA").unwrap_or("unknown")
    }

    pub fn git_dirty() -> &'static str {
        option_env!("VERGEN_GIT_DIRTY").unwrap_or("false")
    }

    pub fn build_timestamp() -> &'static str {
        option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or("unknown")
    }

    pub fn rustc_semver() -> &'static str {
        option_env!("VERGEN_RUSTC_SEMVER").unwrap_or("unknown")
    }

    pub fn target() -> &'static str {
        option_env!("VERGEN_CARGO_TARGET_TRIPLE").unwrap_or("unknown")
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.use_json(), cli.verbose, cli.quiet);

    let out = OutputMode::from_cli(&cli).into_output();

    if let Err(e) = run(&cli, out.as_ref()) {
        out.error(&e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli, out: &dyn Output) -> Result<()> {
    match &cli.command {
        None => print_quick_start(cli),
        Some(Commands::Init(args)) => cmd_init(cli, out, args),
        Some(Commands::Import(args)) => cmd_import(cli, out, args),
        Some(Commands::List) => cmd_list(cli, out),
        Some(Commands::Show(args)) => cmd_show(cli, out, args),
        Some(Commands::Rename(args)) => cmd_rename(cli, out, args),
        Some(Commands::SetLinks(args)) => cmd_set_links(cli, out, args),
        Some(Commands::AddSticker(args)) => cmd_add_sticker(cli, out, args),
        Some(Commands::RenameSticker(args)) => cmd_rename_sticker(cli, out, args),
        Some(Commands::Delete(args)) => cmd_delete(cli, out, args),
        Some(Commands::DeleteSticker(args)) => cmd_delete_sticker(cli, out, args),
        Some(Commands::Validate(args)) => cmd_validate(cli, out, args),
        Some(Commands::Query(args)) => cmd_query(cli, out, args),
        Some(Commands::Serve(args)) => cmd_serve(cli, out, args),
        Some(Commands::Convert(args)) => cmd_convert(out, args),
        Some(Commands::Version) => cmd_version(out),
        Some(Commands::Completions(args)) => cmd_completions(args),
    }
}

// === Quick Start (Robot Mode Optimized) ===

/// Prints quick-start help optimized for both humans and AI agents.
#[allow(clippy::unnecessary_wraps)] // Consistent return type with other commands
fn print_quick_start(cli: &Cli) -> Result<()> {
    if cli.use_json() {
        print_robot_quick_start();
    } else {
        print_human_quick_start();
    }
    Ok(())
}

fn print_robot_quick_start() {
    let help = RobotQuickStart {
        tool: "stickers",
        version: build_info::VERSION,
        description: "Sticker pack store with validation, content URIs and robot mode for AI agents",
        setup: RobotSetup {
            init: "stickers init",
            import: "stickers import <MANIFEST> [--convert]",
        },
        packs: RobotPacks {
            list: "stickers list --robot",
            show: "stickers show <ID> --robot",
            validate: "stickers validate <ID> --robot",
            rename: "stickers rename <ID> <NAME>",
            delete: "stickers delete <ID>",
        },
        content: RobotContent {
            query: "stickers query content://<AUTHORITY>/metadata --robot",
            asset: "stickers query /stickers_asset/<ID>/<FILE> --caller com.whatsapp",
            serve: "stickers serve --port 8420",
        },
        output_modes: OutputModes {
            human: "--format=text (default)",
            robot: "--robot or --format=json",
            compact: "--format=json-compact",
        },
        environment: "STICKERS_CONFIG, STICKERS_DATA_DIR, STICKERS_FORMAT, RUST_LOG",
    };

    match serde_json::to_string_pretty(&help) {
        Ok(json) => println!("{json}"),
        Err(e) => warn!(error = %e, "Quick start serialization failed"),
    }
}

fn print_human_quick_start() {
    println!(
        "{} {} - sticker pack store\n",
        style("stickers").bold().cyan(),
        build_info::VERSION
    );

    println!("{}", style("QUICK START").bold().underlined());
    println!();
    println!("  {}  Create config and data directory", style("stickers init").green());
    println!("  {}  Import a pack", style("stickers import pack.toml").green());
    println!("  {}  List packs", style("stickers list").green());
    println!("  {}  Show one pack", style("stickers show <ID>").green());
    println!("  {}  Re-check a pack", style("stickers validate <ID>").green());
    println!("  {}  Delete a pack", style("stickers delete <ID>").green());
    println!();

    println!("{}", style("CONTENT URIS").bold().underlined());
    println!();
    println!("  {}", style("/metadata").cyan());
    println!("  {}", style("/metadata/<ID>").cyan());
    println!("  {}", style("/stickers/<ID>").cyan());
    println!("  {}", style("/stickers_asset/<ID>/<FILE>").cyan());
    println!();

    println!("{}", style("ROBOT MODE (for AI agents)").bold().underlined());
    println!();
    println!("  {}  JSON output", style("stickers --robot <command>").cyan());
    println!("  {}  Quick-start JSON", style("stickers --robot").cyan());
    println!();

    println!("Run {} for full help", style("stickers --help").yellow());
}

// === Robot Mode JSON Structures ===

#[derive(Serialize)]
struct RobotQuickStart {
    tool: &'static str,
    version: &'static str,
    description: &'static str,
    setup: RobotSetup,
    packs: RobotPacks,
    content: RobotContent,
    output_modes: OutputModes,
    environment: &'static str,
}

#[derive(Serialize)]
struct RobotSetup {
    init: &'static str,
    import: &'static str,
}

#[derive(Serialize)]
struct RobotPacks {
    list: &'static str,
    show: &'static str,
    validate: &'static str,
    rename: &'static str,
    delete: &'static str,
}

#[derive(Serialize)]
struct RobotContent {
    query: &'static str,
    asset: &'static str,
    serve: &'static str,
}

#[derive(Serialize)]
struct OutputModes {
    human: &'static str,
    robot: &'static str,
    compact: &'static str,
}

// === Store Context ===

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::load_or_default(cli.config.as_deref())?;
    if let Some(dir) = &cli.data_dir {
        settings = settings.with_data_dir(dir);
    }
    settings.validate()?;
    Ok(settings)
}

/// Settings, database and write pool for one command.
struct Store {
    db: Arc<StickerDb>,
    pool: WritePool,
}

impl Store {
    fn open(cli: &Cli) -> Result<Self> {
        let settings = load_settings(cli)?;
        let data_dir = settings.resolved_data_dir()?;
        fs::create_dir_all(&data_dir)?;
        debug!(data_dir = %data_dir.display(), "Opening store");

        let db = Arc::new(StickerDb::in_dir(&data_dir));
        let service = Arc::new(StickerService::new(
            Arc::clone(&db),
            settings.asset_store()?,
            settings.limits.clone(),
        ));
        let pool = WritePool::new(service, settings.write_threads)?;
        Ok(Self { db, pool })
    }

    fn service(&self) -> &StickerService {
        self.pool.service()
    }

    fn pack_exists(&self, identifier: &str) -> Result<bool> {
        self.db
            .open_for_read()?
            .with_conn(|c| repo::pack_exists(c, identifier))
    }
}

/// Success yields the value; Warning and Debug are reported and yield
/// `None`; Failure becomes the command's error.
fn settle<T>(cli: &Cli, out: &dyn Output, outcome: Outcome<T>) -> Result<Option<T>> {
    match outcome {
        Outcome::Success(value) => Ok(Some(value)),
        Outcome::Warning(message) => {
            out.warning(&message);
            Ok(None)
        }
        Outcome::Debug(message) => {
            debug!(message, "Operation reported debug outcome");
            if !cli.quiet {
                out.info(&message);
            }
            Ok(None)
        }
        Outcome::Failure(e) => Err(e),
    }
}

fn progress_bar(cli: &Cli, len: usize, message: &'static str) -> ProgressBar {
    if cli.use_json() || cli.quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::with_template("{msg} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg:.dim}")
    {
        bar.set_style(style.progress_chars("=> "));
    }
    bar.set_message(message);
    bar
}

/// Converted files are renamed: stickers to `.webp`, the tray to `.png`.
fn converted_name(file_name: &str, tray: bool) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    format!("{stem}.{}", if tray { "png" } else { "webp" })
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(StickerError::Io)
}

// === Command Implementations ===

fn cmd_init(cli: &Cli, out: &dyn Output, args: &cli::InitArgs) -> Result<()> {
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };
    if config_path.exists() && !args.force {
        return Err(StickerError::Other(format!(
            "{} already exists; use --force to overwrite",
            config_path.display()
        )));
    }

    let data_dir = match &cli.data_dir {
        Some(dir) => dir.clone(),
        None => default_data_dir()?,
    };
    let settings = Settings::default().with_data_dir(&data_dir);
    let rendered = match ConfigFormat::from_extension(&config_path) {
        Some(ConfigFormat::Yaml) => {
            serde_yaml::to_string(&settings).map_err(|e| StickerError::ConfigParse(e.to_string()))?
        }
        _ => settings.to_toml()?,
    };

    if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&config_path, rendered)?;

    let data_dir = settings.resolved_data_dir()?;
    fs::create_dir_all(&data_dir)?;
    // Opening for write creates the schema.
    StickerDb::in_dir(&data_dir).open_for_write()?;
    info!(config = %config_path.display(), data_dir = %data_dir.display(), "Initialized");

    out.config_written(&config_path, &data_dir);
    Ok(())
}

fn cmd_import(cli: &Cli, out: &dyn Output, args: &cli::ImportArgs) -> Result<()> {
    let store = Store::open(cli)?;
    let (manifest, base) = PackManifest::load(&args.manifest)?;
    let mut plan = manifest.into_plan(&base)?;
    let identifier = plan.pack.identifier.clone();

    if store.pack_exists(&identifier)? {
        return Err(StickerError::DuplicateIdentifier { identifier });
    }

    let assets = store.service().assets().clone();
    if args.convert {
        for (index, file) in plan.files.iter_mut().enumerate() {
            let tray = index == 0;
            let name = converted_name(&file.file_name, tray);
            if tray {
                plan.pack.tray_image.clone_from(&name);
            } else {
                plan.pack.stickers[index - 1].file_name.clone_from(&name);
            }
            file.file_name = name;
        }
    }

    // Files already in the pack directory are never removed by this command.
    let mut preexisting = HashSet::new();
    for file in &plan.files {
        if assets.exists(&identifier, &file.file_name) {
            if !args.overwrite {
                return Err(StickerError::AssetExists {
                    path: assets.asset_path(&identifier, &file.file_name)?.display().to_string(),
                });
            }
            preexisting.insert(file.file_name.clone());
        }
    }

    let bar = progress_bar(cli, plan.files.len(), "Copying");
    let mut created: Vec<String> = Vec::new();
    let copied = if args.convert {
        bar.set_message("Converting");
        let converted = convert_all(&assets, &identifier, &plan.files, args.strategy, &bar);
        for file in &plan.files {
            let name = &file.file_name;
            if !preexisting.contains(name) && !created.contains(name) && assets.exists(&identifier, name) {
                created.push(name.clone());
            }
        }
        converted
    } else {
        copy_sources(&assets, &identifier, &plan.files, args.overwrite, &preexisting, &mut created, &bar)
    };
    bar.finish_and_clear();

    let saved = copied.and_then(|()| match store.pool.save_pack(plan.pack).wait() {
        Outcome::Success(pack) => Ok(pack),
        Outcome::Warning(m) | Outcome::Debug(m) => Err(StickerError::Other(m)),
        Outcome::Failure(e) => Err(e),
    });

    match saved {
        Ok(pack) => {
            out.imported(&ImportSummary::from_pack(&pack, args.convert));
            Ok(())
        }
        // Another import stored this identifier first; the files belong to it.
        Err(e @ StickerError::DuplicateIdentifier { .. }) => Err(e),
        Err(e) => {
            discard_created(&assets, &identifier, &created);
            Err(e)
        }
    }
}

/// Copy manifest sources into the pack directory, recording every file
/// this run created. A name listed twice is copied once.
fn copy_sources(
    assets: &AssetStore,
    identifier: &str,
    files: &[stickers::config::AssetSource],
    overwrite: bool,
    preexisting: &HashSet<String>,
    created: &mut Vec<String>,
    bar: &ProgressBar,
) -> Result<()> {
    for file in files {
        bar.inc(1);
        if created.contains(&file.file_name) {
            continue;
        }
        if overwrite {
            assets.import_file(identifier, &file.source, &file.file_name)?;
        } else {
            assets.import_new_file(identifier, &file.source, &file.file_name)?;
        }
        if !preexisting.contains(&file.file_name) {
            created.push(file.file_name.clone());
        }
    }
    Ok(())
}

/// Remove the files a rejected command created, then the pack directory if
/// that left it empty.
fn discard_created(assets: &AssetStore, identifier: &str, created: &[String]) {
    for file_name in created {
        if let Outcome::Failure(e) = assets.delete_asset(identifier, file_name) {
            warn!(error = %e, file_name = %file_name, "Failed to remove copied asset");
        }
    }
    if let Err(e) = assets.prune_pack_dir(identifier) {
        warn!(error = %e, identifier, "Failed to remove empty pack directory");
    }
}

fn convert_all(
    assets: &AssetStore,
    identifier: &str,
    files: &[stickers::config::AssetSource],
    strategy: ResizeStrategy,
    bar: &ProgressBar,
) -> Result<()> {
    let mut jobs = Vec::with_capacity(files.len());
    for (index, file) in files.iter().enumerate() {
        let converter: Arc<dyn MediaConverter> = Arc::new(if index == 0 {
            ImageConverter::tray(strategy)
        } else {
            ImageConverter::sticker(strategy)
        });
        let output = assets.asset_path(identifier, &file.file_name)?;
        jobs.push((converter, file.source.clone(), output));
    }
    assets.ensure_pack_dir(identifier)?;

    runtime()?.block_on(async {
        let mut set = JoinSet::new();
        for (converter, input, output) in jobs {
            set.spawn(convert_async(converter, input, output));
        }
        while let Some(joined) = set.join_next().await {
            let converted = joined.with_context(|| "Conversion task failed")?;
            let path = converted?;
            bar.inc(1);
            bar.println(format!("  converted {}", path.display()));
        }
        Ok::<(), StickerError>(())
    })
}

fn cmd_list(cli: &Cli, out: &dyn Output) -> Result<()> {
    let store = Store::open(cli)?;
    if let Some(packs) = settle(cli, out, store.service().fetch_packs())? {
        out.pack_list(&packs);
    }
    Ok(())
}

fn cmd_show(cli: &Cli, out: &dyn Output, args: &cli::PackArg) -> Result<()> {
    let store = Store::open(cli)?;
    match store.service().fetch_pack(&args.identifier) {
        Outcome::Success(pack) => {
            out.pack_detail(&pack, classify(&pack));
            Ok(())
        }
        Outcome::Failure(e) => Err(e),
        Outcome::Warning(_) | Outcome::Debug(_) => Err(StickerError::PackNotFound {
            identifier: args.identifier.clone(),
        }),
    }
}

fn cmd_rename(cli: &Cli, out: &dyn Output, args: &cli::RenameArgs) -> Result<()> {
    let store = Store::open(cli)?;
    let outcome = store
        .pool
        .update_pack_name(args.identifier.as_str(), args.name.as_str())
        .wait();
    if let Some(status) = settle(cli, out, outcome)? {
        out.update_status("rename", &args.identifier, status);
    }
    Ok(())
}

fn cmd_set_links(cli: &Cli, out: &dyn Output, args: &cli::SetLinksArgs) -> Result<()> {
    let store = Store::open(cli)?;
    let links = if args.clear {
        PackLinks::default()
    } else {
        // Flags not given keep their stored value.
        let mut links = store
            .service()
            .fetch_pack(&args.identifier)
            .success()
            .map(|p| p.links())
            .unwrap_or_default();
        let merge = |slot: &mut Option<String>, value: &Option<String>| {
            if value.is_some() {
                slot.clone_from(value);
            }
        };
        merge(&mut links.publisher_email, &args.email);
        merge(&mut links.publisher_website, &args.website);
        merge(&mut links.privacy_policy_website, &args.privacy);
        merge(&mut links.license_agreement_website, &args.license);
        merge(&mut links.android_store_link, &args.android);
        merge(&mut links.ios_store_link, &args.ios);
        links
    };

    let outcome = store
        .pool
        .update_pack_links(args.identifier.as_str(), links)
        .wait();
    if let Some(status) = settle(cli, out, outcome)? {
        out.update_status("set-links", &args.identifier, status);
    }
    Ok(())
}

fn cmd_add_sticker(cli: &Cli, out: &dyn Output, args: &cli::AddStickerArgs) -> Result<()> {
    let store = Store::open(cli)?;
    let identifier = args.identifier.as_str();
    let Some(existing) = store.service().fetch_pack(identifier).success() else {
        return Err(StickerError::PackNotFound {
            identifier: identifier.to_string(),
        });
    };

    let source_name = args
        .file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| StickerError::InvalidAssetName {
            name: args.file.display().to_string(),
        })?;
    let mut file_name = args.name.clone().unwrap_or_else(|| source_name.to_string());
    if args.convert {
        file_name = converted_name(&file_name, false);
    }
    if existing.sticker(&file_name).is_some() {
        return Err(StickerError::Other(format!(
            "Sticker '{file_name}' already exists in pack '{identifier}'"
        )));
    }

    let assets = store.service().assets();
    let preexisting = assets.exists(identifier, &file_name);
    if preexisting && !args.overwrite {
        return Err(StickerError::AssetExists {
            path: assets.asset_path(identifier, &file_name)?.display().to_string(),
        });
    }
    if args.convert {
        let output = assets.asset_path(identifier, &file_name)?;
        ImageConverter::sticker(args.strategy).convert(&args.file, &output)?;
    } else if args.overwrite {
        assets.import_file(identifier, &args.file, &file_name)?;
    } else {
        assets.import_new_file(identifier, &args.file, &file_name)?;
    }

    let sticker = Sticker::new(file_name.clone(), args.emojis.clone(), args.text.clone());
    let outcome = store.pool.add_stickers(identifier, vec![sticker]).wait();
    let added = match outcome {
        Outcome::Success(pack) => Ok(Some(pack)),
        other => settle(cli, out, other),
    };
    match added {
        Ok(Some(pack)) => {
            out.pack_detail(&pack, classify(&pack));
            Ok(())
        }
        rejected => {
            if !preexisting {
                discard_created(assets, identifier, std::slice::from_ref(&file_name));
            }
            rejected.map(|_| ())
        }
    }
}

fn cmd_rename_sticker(cli: &Cli, out: &dyn Output, args: &cli::RenameStickerArgs) -> Result<()> {
    let store = Store::open(cli)?;
    let outcome = store
        .pool
        .rename_sticker(
            args.identifier.as_str(),
            args.old_name.as_str(),
            args.new_name.as_str(),
        )
        .wait();
    let Some(status) = settle(cli, out, outcome)? else {
        return Ok(());
    };
    if status == UpdateStatus::Updated {
        if let Err(e) = store
            .service()
            .assets()
            .rename(&args.identifier, &args.old_name, &args.new_name)
        {
            out.warning(&format!("Sticker renamed, but its file was not: {e}"));
        }
    }
    out.update_status("rename-sticker", &args.identifier, status);
    Ok(())
}

fn cmd_delete(cli: &Cli, out: &dyn Output, args: &cli::DeleteArgs) -> Result<()> {
    let store = Store::open(cli)?;
    let outcome = store.pool.delete_pack(args.identifier.as_str()).wait();
    let Some(rows) = settle(cli, out, outcome)? else {
        return Ok(());
    };

    let files_removed = if args.keep_files {
        None
    } else {
        match store.service().delete_pack_assets(&args.identifier) {
            Outcome::Success(count) => Some(count),
            Outcome::Warning(m) | Outcome::Debug(m) => {
                debug!(message = %m, "No asset directory to remove");
                Some(0)
            }
            Outcome::Failure(e) => return Err(e),
        }
    };

    out.deleted(&DeleteSummary {
        identifier: args.identifier.clone(),
        file_name: None,
        rows,
        files_removed,
    });
    Ok(())
}

fn cmd_delete_sticker(cli: &Cli, out: &dyn Output, args: &cli::DeleteStickerArgs) -> Result<()> {
    let store = Store::open(cli)?;
    let outcome = store
        .pool
        .delete_sticker(args.identifier.as_str(), args.file_name.as_str())
        .wait();
    let Some(rows) = settle(cli, out, outcome)? else {
        return Ok(());
    };

    let files_removed = if args.keep_file {
        None
    } else {
        match store
            .service()
            .delete_sticker_asset(&args.identifier, &args.file_name)
        {
            Outcome::Success(_) => Some(1),
            Outcome::Warning(m) | Outcome::Debug(m) => {
                debug!(message = %m, "No asset file to remove");
                Some(0)
            }
            Outcome::Failure(e) => return Err(e),
        }
    };

    out.deleted(&DeleteSummary {
        identifier: args.identifier.clone(),
        file_name: Some(args.file_name.clone()),
        rows,
        files_removed,
    });
    Ok(())
}

fn cmd_validate(cli: &Cli, out: &dyn Output, args: &cli::PackArg) -> Result<()> {
    let store = Store::open(cli)?;
    let identifier = args.identifier.clone();
    let outcome = store
        .pool
        .submit(move |service| service.revalidate_pack(&identifier))
        .wait();
    match outcome {
        Outcome::Success(result) => {
            out.revalidation(&result);
            Ok(())
        }
        Outcome::Failure(e) => Err(e),
        Outcome::Warning(_) | Outcome::Debug(_) => Err(StickerError::PackNotFound {
            identifier: args.identifier.clone(),
        }),
    }
}

fn cmd_query(cli: &Cli, out: &dyn Output, args: &cli::QueryArgs) -> Result<()> {
    let settings = load_settings(cli)?;
    let data_dir = settings.resolved_data_dir()?;
    fs::create_dir_all(&data_dir)?;
    let db = Arc::new(StickerDb::in_dir(&data_dir));
    let provider = ContentProvider::from_settings(db, &settings)?;

    match provider.dispatch(&args.uri, args.caller.as_deref())? {
        ContentResponse::Table(table) => out.table(&table),
        ContentResponse::Asset(asset) => out.asset(&asset),
        ContentResponse::NotFound => {
            return Err(StickerError::AssetNotFound {
                path: args.uri.clone(),
            });
        }
    }
    Ok(())
}

fn cmd_serve(cli: &Cli, out: &dyn Output, args: &cli::ServeArgs) -> Result<()> {
    let settings = load_settings(cli)?;
    let data_dir = settings.resolved_data_dir()?;
    fs::create_dir_all(&data_dir)?;
    let db = Arc::new(StickerDb::in_dir(&data_dir));
    let provider = Arc::new(ContentProvider::from_settings(db, &settings)?);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .map_err(|e: std::net::AddrParseError| StickerError::WebServerFailed {
            addr: format!("{}:{}", args.host, args.port),
            reason: e.to_string(),
        })?;
    let timeout = Duration::from_secs(settings.request_timeout_secs.max(1));

    if !cli.quiet {
        out.info(&format!(
            "Serving content://{} on http://{addr} (Ctrl+C to stop)",
            provider.authority()
        ));
    }
    runtime()?.block_on(server::serve(provider, addr, timeout))
}

fn cmd_convert(out: &dyn Output, args: &cli::ConvertArgs) -> Result<()> {
    let converter = if args.tray {
        ImageConverter::tray(args.strategy)
    } else {
        ImageConverter::sticker(args.strategy)
    };
    let output: PathBuf = converter.convert(&args.input, &args.output)?;
    out.converted(&args.input, &output);
    Ok(())
}

#[allow(clippy::unnecessary_wraps)] // Consistent return type with other commands
fn cmd_version(out: &dyn Output) -> Result<()> {
    out.version_info(&VersionInfo {
        version: build_info::VERSION,
        git_sha: build_info::git_sha(),
        git_dirty: build_info::git_dirty() == "true",
        build_timestamp: build_info::build_timestamp(),
        rustc_version: build_info::rustc_semver(),
        target: build_info::target(),
    });
    Ok(())
}

#[allow(clippy::unnecessary_wraps)] // Consistent return type with other commands
fn cmd_completions(args: &cli::CompletionsArgs) -> Result<()> {
    use clap::CommandFactory;
    clap_complete::generate(args.shell, &mut Cli::command(), "stickers", &mut io::stdout());
    Ok(())
}
