//! Subcommands of the `deployer` CLI.

pub mod config;
pub mod create;
pub mod list;
