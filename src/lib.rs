//! Sticker store library - persistence, validation and content access for
//! sticker packs.
//!
//! This library exposes the core functionality of the `stickers` CLI for use
//! in tests and by other front ends.
//!
//! # Modules
//!
//! - `pack`: Pack and sticker records
//! - `store`: SQLite schema, row mapping and on-disk asset files
//! - `validation`: Structural rules every pack and sticker must satisfy
//! - `service`: Save / update / delete / fetch orchestration and the write pool
//! - `content`: URI-routed read interface for external consumers
//! - `server`: HTTP boundary over the content layer
//! - `convert`: Media conversion collaborator
//! - `config`: Settings files and pack manifests
//! - `output`: Output mode abstraction (robot/human)
#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod content;
pub mod convert;
pub mod error;
pub mod logging;
pub mod outcome;
pub mod output;
pub mod pack;
pub mod server;
pub mod service;
pub mod store;
pub mod theme;
pub mod validation;
