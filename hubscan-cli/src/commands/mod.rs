//! Subcommand implementations.

pub mod common;
pub mod config;
pub mod download_url;
pub mod install;
pub mod status;
pub mod verify;
