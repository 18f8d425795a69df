//! Structured logging initialization for the sticker store CLI.
//!
//! Supports both human-friendly and machine-readable (JSON) output formats,
//! with TTY detection and verbosity control.

use std::io::{self, IsTerminal};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Default filter directive for the given flags.
pub fn default_directive(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "stickers=error";
    }
    match verbose {
        0 => "stickers=info",
        1 => "stickers=debug",
        _ => "stickers=trace,tower_http=debug",
    }
}

/// Initialize the tracing subscriber based on CLI flags and environment.
///
/// * `robot_mode` - JSON lines for machine consumption
/// * `verbose` - 0 = info, 1 = debug, 2+ = trace
/// * `quiet` - errors only
///
/// `RUST_LOG` overrides the computed filter (e.g. `stickers=debug,axum=info`).
///
/// | Mode | TTY | Output |
/// |------|-----|--------|
/// | Robot | any | JSON lines to stderr |
/// | Human | yes | Pretty colored output to stderr |
/// | Human | no | Compact plain output to stderr |
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(robot_mode: bool, verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));

    let result = if robot_mode {
        let fmt_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
            .with_thread_names(true)
            .with_span_events(FmtSpan::NONE)
            .with_writer(io::stderr);
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
    } else if io::stderr().is_terminal() {
        let fmt_layer = fmt::layer()
            .with_target(false)
            .with_file(false)
            .with_line_number(false)
            .with_span_events(FmtSpan::NONE)
            .with_writer(io::stderr);
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
    } else {
        let fmt_layer = fmt::layer()
            .with_ansi(false)
            .with_target(false)
            .with_file(false)
            .with_line_number(false)
            .with_span_events(FmtSpan::NONE)
            .compact()
            .with_writer(io::stderr);
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
    };

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
