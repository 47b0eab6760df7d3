use alloy_primitives::Address;
use clap::{Parser, ValueHint};
use deployer_config::{
    Config,
    figment::{
        self, Figment, Metadata, Profile, Provider,
        value::{Dict, Map, Value},
    },
};
use eyre::Result;
use serde::Serialize;
use std::path::PathBuf;

/// Config values that can be set on the command line.
///
/// CLI arguments take the highest precedence: they are merged into the global profile after
/// `deployer.toml` and the `DEPLOYER_*` environment variables. Only arguments that were actually
/// passed are serialized, everything else falls through to the lower layers.
#[derive(Clone, Debug, Default, Serialize, Parser)]
#[command(next_help_heading = "Network options")]
pub struct ConfigArgs {
    /// The project's root path. Defaults to the current working directory.
    #[arg(long, value_hint = ValueHint::DirPath, value_name = "PATH")]
    #[serde(skip)]
    pub root: Option<PathBuf>,

    /// The directory containing the compiled artifacts.
    #[arg(long, value_hint = ValueHint::DirPath, value_name = "PATH")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<PathBuf>,

    /// The RPC endpoint.
    #[arg(long, visible_alias = "rpc", value_name = "URL")]
    #[serde(rename = "eth_rpc_url", skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<String>,

    /// The expected chain ID of the network.
    #[arg(long, value_name = "CHAIN_ID")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,

    /// The sender account, signed by the node when no private key is given.
    #[arg(long, value_name = "ADDRESS")]
    #[serde(rename = "sender", skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,

    /// The private key used to sign the deployment transaction.
    #[arg(long, value_name = "RAW_PRIVATE_KEY")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,

    /// The number of confirmations to wait for.
    #[arg(long, value_name = "COUNT")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmations: Option<u64>,

    /// Seconds to wait for the transaction to be confirmed.
    #[arg(long, value_name = "SECONDS")]
    #[serde(rename = "transaction_timeout", skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl ConfigArgs {
    /// Returns the project root: `--root` or the current working directory.
    pub fn root(&self) -> Result<PathBuf> {
        match &self.root {
            Some(root) => Ok(root.clone()),
            None => Ok(std::env::current_dir()?),
        }
    }

    /// Returns the layered figment with these arguments merged on top.
    pub fn figment(&self) -> Result<Figment> {
        Ok(Config::figment_with_root(self.root()?).merge(self))
    }
}

impl Provider for ConfigArgs {
    fn metadata(&self) -> Metadata {
        Metadata::named("command line arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, figment::Error> {
        let value = Value::serialize(self)?;
        let dict = value.into_dict().ok_or_else(|| figment::Error::from("expected a dict"))?;
        Ok(Map::from([(Profile::Global, dict)]))
    }
}

/// Loads a [`Config`] from the layered sources of a command.
pub trait LoadConfig {
    /// Loads the config, with the command's arguments applied on top.
    fn load_config(&self) -> Result<Config>;
}

impl LoadConfig for ConfigArgs {
    fn load_config(&self) -> Result<Config> {
        let config = Config::from_provider(self.figment()?)?;
        trace!(profile = %config.profile, root = %config.root.display(), "loaded config");
        Ok(config)
    }
}
