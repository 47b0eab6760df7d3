//! # deployer
//!
//! Deploys compiled contracts to an EVM network and reports their addresses.
//!
//! The [`DeploymentRunner`] resolves an [`ArtifactReference`] through an [`ArtifactSource`],
//! submits the creation transaction through a [`NetworkConnection`] and waits for it to be
//! confirmed within the connection's [`WaitPolicy`].

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[macro_use]
extern crate deployer_common;

#[macro_use]
extern crate tracing;

pub mod args;
pub mod artifacts;
pub mod cmd;
pub mod connection;
pub mod opts;
pub mod runner;
pub mod script;

mod error;
pub use error::DeployError;

pub use artifacts::{ArtifactReference, ArtifactSource, ArtifactStore, CompiledTemplate};
pub use connection::{
    AlloyConnection, DeploymentReceipt, NetworkConnection, NetworkDescriptor, WaitPolicy, connect,
};
pub use runner::{Deployment, DeploymentHandle, DeploymentRunner, DeploymentState};
