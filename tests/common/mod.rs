//! Common test utilities for the sticker store.
//!
//! - `cli`: CLI runner with an isolated data directory and fluent assertions
//! - `fixtures`: Generated tray icons, stickers, stores and manifests
//! - `logging`: Log output verification helpers
#![allow(dead_code)]


use tracing_subscriber::EnvFilter;

pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
