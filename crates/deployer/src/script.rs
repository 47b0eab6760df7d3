//! Entry point of the single-contract deployment scripts.
//!
//! A script takes no arguments: the network and the build output are configured through
//! `deployer.toml`, `DEPLOYER_*` environment variables or a `.env` file in the working directory.

use crate::{ArtifactReference, ArtifactStore, DeploymentRunner, NetworkDescriptor, connect};
use alloy_primitives::Address;
use deployer_cli::utils;
use deployer_config::Config;
use eyre::Result;

/// Deploys `contract` and exits the process, with status 1 on failure.
pub fn main(contract: &str) -> ! {
    crate::args::setup();
    match utils::block_on(deploy(contract)).and_then(|result| result) {
        Ok(_) => std::process::exit(0),
        Err(err) => {
            let _ = sh_err!("{err:?}");
            std::process::exit(1);
        }
    }
}

/// Deploys `contract` with the configuration of the current working directory.
pub async fn deploy(contract: &str) -> Result<Address> {
    let reference: ArtifactReference = contract.parse()?;
    let config = Config::load()?;
    trace!(profile = %config.profile, root = %config.root.display(), "loaded config");

    let runner = DeploymentRunner::new(ArtifactStore::new(config.artifacts_path()));
    let connection = connect(&NetworkDescriptor::from_config(&config)).await?;
    Ok(runner.deploy(&reference, &connection).await?)
}
