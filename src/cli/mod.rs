//! CLI argument definitions.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::convert::ResizeStrategy;

/// Sticker store CLI - persist, validate and serve sticker packs.
///
/// Robot Mode: Use --robot or --format=json for machine-parseable output optimized for AI agents.
#[derive(Parser, Debug)]
#[command(name = "stickers", version, about, long_about = None)]
#[command(propagate_version = true)]
#[allow(clippy::struct_excessive_bools)] // CLI flags naturally use multiple bools
pub struct Cli {
    /// Output format (text for humans, json for agents/scripts)
    #[arg(
        long,
        short = 'f',
        default_value = "text",
        global = true,
        env = "STICKERS_FORMAT"
    )]
    pub format: OutputFormat,

    /// Robot mode: equivalent to --format=json (optimized for AI agents)
    #[arg(long, global = true)]
    pub robot: bool,

    /// Verbose output (-v debug, -vv trace)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Configuration file (TOML or YAML)
    #[arg(long, short = 'c', global = true, env = "STICKERS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Data directory holding the database and asset files
    #[arg(long, global = true, env = "STICKERS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Output format selection.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text with optional color
    #[default]
    Text,
    /// JSON output for scripts and agents
    Json,
    /// Compact JSON (single line)
    JsonCompact,
}

impl Cli {
    /// Returns true if output should be JSON (robot mode or explicit --format=json).
    pub const fn use_json(&self) -> bool {
        self.robot || matches!(self.format, OutputFormat::Json | OutputFormat::JsonCompact)
    }

    /// Returns true if output should be compact JSON.
    pub const fn use_compact_json(&self) -> bool {
        matches!(self.format, OutputFormat::JsonCompact)
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    // === Setup ===
    /// Write a default configuration file and create the data directory
    Init(InitArgs),

    // === Packs ===
    /// Import a sticker pack from a manifest (TOML or YAML)
    Import(ImportArgs),

    /// List stored packs grouped by validity
    #[command(visible_alias = "ls")]
    List,

    /// Show one pack with its stickers
    Show(PackArg),

    /// Rename a pack
    Rename(RenameArgs),

    /// Update or clear the links of a pack
    SetLinks(SetLinksArgs),

    /// Append a sticker to an existing pack
    AddSticker(AddStickerArgs),

    /// Rename a sticker file within a pack
    RenameSticker(RenameStickerArgs),

    /// Delete a pack, its stickers and its asset files
    Delete(DeleteArgs),

    /// Delete one sticker from a pack
    DeleteSticker(DeleteStickerArgs),

    /// Re-validate a stored pack and refresh its sticker markers
    Validate(PackArg),

    // === Content access ===
    /// Resolve a content URI the way an external consumer would
    Query(QueryArgs),

    /// Serve the content URIs over HTTP
    Serve(ServeArgs),

    // === Utilities ===
    /// Convert an image into a sticker-sized WebP (or PNG)
    Convert(ConvertArgs),

    /// Show version and build information
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// === Argument Structs ===

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Force overwrite existing configuration
    #[arg(long, short = 'f')]
    pub force: bool,
}

/// Arguments for importing a pack.
///
/// # Examples
///
/// ```bash
/// # Import files that are already 512x512 WebP
/// stickers import ./cats/pack.toml
///
/// # Resize and re-encode every source file first
/// stickers import ./cats/pack.yaml --convert --strategy fill
/// ```
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Pack manifest (.toml, .yaml or .yml)
    #[arg(value_name = "MANIFEST")]
    pub manifest: PathBuf,

    /// Convert source images before storing them
    #[arg(long)]
    pub convert: bool,

    /// Resize strategy used with --convert
    #[arg(long, default_value = "fit")]
    pub strategy: ResizeStrategy,

    /// Replace asset files already in the pack directory
    #[arg(long)]
    pub overwrite: bool,
}

#[derive(Args, Debug)]
pub struct PackArg {
    /// Pack identifier
    pub identifier: String,
}

#[derive(Args, Debug)]
pub struct RenameArgs {
    /// Pack identifier
    pub identifier: String,

    /// New display name
    pub name: String,
}

#[derive(Args, Debug)]
pub struct SetLinksArgs {
    /// Pack identifier
    pub identifier: String,

    /// Publisher email
    #[arg(long)]
    pub email: Option<String>,

    /// Publisher website
    #[arg(long)]
    pub website: Option<String>,

    /// Privacy policy website
    #[arg(long)]
    pub privacy: Option<String>,

    /// License agreement website
    #[arg(long)]
    pub license: Option<String>,

    /// Google Play store link
    #[arg(long)]
    pub android: Option<String>,

    /// App Store link
    #[arg(long)]
    pub ios: Option<String>,

    /// Clear every link
    #[arg(
        long,
        conflicts_with_all = ["email", "website", "privacy", "license", "android", "ios"]
    )]
    pub clear: bool,
}

#[derive(Args, Debug)]
pub struct AddStickerArgs {
    /// Pack identifier
    pub identifier: String,

    /// Sticker image file
    pub file: PathBuf,

    /// Emoji describing the sticker (repeatable)
    #[arg(long = "emoji", short = 'e', required = true)]
    pub emojis: Vec<String>,

    /// Accessibility text
    #[arg(long, short = 't')]
    pub text: String,

    /// File name to store the sticker under (defaults to the source name)
    #[arg(long)]
    pub name: Option<String>,

    /// Convert the image before storing it
    #[arg(long)]
    pub convert: bool,

    /// Resize strategy used with --convert
    #[arg(long, default_value = "fit")]
    pub strategy: ResizeStrategy,

    /// Replace a file of the same name already in the pack directory
    #[arg(long)]
    pub overwrite: bool,
}

#[derive(Args, Debug)]
pub struct RenameStickerArgs {
    /// Pack identifier
    pub identifier: String,

    /// Current file name
    pub old_name: String,

    /// New file name
    pub new_name: String,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Pack identifier
    pub identifier: String,

    /// Keep the pack's asset directory on disk
    #[arg(long)]
    pub keep_files: bool,
}

#[derive(Args, Debug)]
pub struct DeleteStickerArgs {
    /// Pack identifier
    pub identifier: String,

    /// Sticker file name
    pub file_name: String,

    /// Keep the asset file on disk
    #[arg(long)]
    pub keep_file: bool,
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Content URI, e.g. content://AUTHORITY/metadata or a bare path like /stickers/ID
    pub uri: String,

    /// Calling package name
    #[arg(long)]
    pub caller: Option<String>,
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Source image
    pub input: PathBuf,

    /// Output file (.webp or .png)
    pub output: PathBuf,

    /// Resize strategy
    #[arg(long, default_value = "fit")]
    pub strategy: ResizeStrategy,

    /// Produce a tray icon instead of a sticker
    #[arg(long)]
    pub tray: bool,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(long, short = 'p', default_value = "8420")]
    pub port: u16,

    /// Bind address
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
