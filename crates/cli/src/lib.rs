//! # deployer-cli
//!
//! Common command line plumbing: logging, error reporting, runtime and the option groups shared
//! by the deployer binaries.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

pub mod handler;
pub mod opts;
pub mod utils;
