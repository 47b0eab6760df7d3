//! # deployer-common
//!
//! Common utilities shared by the deployer crates.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

#[macro_use]
pub mod shell;

pub mod provider;
pub mod wallet;
