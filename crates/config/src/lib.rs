//! # deployer-config
//!
//! Layered deployment configuration.
//!
//! Values are resolved in the following order, later sources overriding earlier ones:
//!
//! 1. [`Config::default()`]
//! 2. the selected profile in `deployer.toml` (`[profile.default]`, `[profile.<name>]`)
//! 3. `DEPLOYER_*` environment variables
//!
//! The profile is selected with `DEPLOYER_PROFILE` and falls back to `default`. Anything merged
//! on top of [`Config::figment`] (e.g. command line arguments) takes precedence over all of the
//! above.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

use alloy_primitives::Address;
use figment::{
    Figment, Metadata, Profile, Provider,
    providers::{Env, Serialized},
    value::{Dict, Map},
};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

mod error;
pub use error::ConfigError;

mod providers;
use providers::ProfileTomlProvider;

pub use figment;

/// Deployment configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The selected profile. **(default: _default_ `default`)**
    #[serde(skip)]
    pub profile: Profile,
    /// The project root, every relative path is resolved against it.
    #[serde(skip)]
    pub root: PathBuf,
    /// Directory containing the compiled contract artifacts.
    pub artifacts: PathBuf,
    /// RPC endpoint of the target network.
    pub eth_rpc_url: String,
    /// Expected chain id of the target network. The node's chain id is checked against it when
    /// set.
    pub chain_id: Option<u64>,
    /// Sender to use when the node signs transactions itself (unlocked accounts).
    pub sender: Option<Address>,
    /// Hex encoded private key used to sign the deployment transaction.
    #[serde(skip_serializing)]
    pub private_key: Option<String>,
    /// Number of confirmations to wait for.
    pub confirmations: u64,
    /// Seconds to wait for the deployment transaction to be confirmed.
    pub transaction_timeout: u64,
    /// Receipt polling interval in milliseconds, the provider default is used if unset.
    pub poll_interval: Option<u64>,
}

impl Config {
    /// The default profile: "default"
    pub const DEFAULT_PROFILE: Profile = Profile::const_new("default");

    /// The name of the config file.
    pub const FILE_NAME: &'static str = "deployer.toml";

    /// The section under which profiles are declared in [`Self::FILE_NAME`].
    pub const PROFILE_SECTION: &'static str = "profile";

    /// Environment variable prefix.
    pub const ENV_PREFIX: &'static str = "DEPLOYER_";

    /// Environment variable selecting the profile.
    pub const PROFILE_ENV: &'static str = "DEPLOYER_PROFILE";

    /// Default RPC endpoint, a local development node.
    pub const DEFAULT_RPC_URL: &'static str = "http://127.0.0.1:8545";

    /// Loads the config for the current working directory.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_root(std::env::current_dir()?)
    }

    /// Loads the config rooted at `root`.
    pub fn load_with_root(root: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_provider(Self::figment_with_root(root))
    }

    /// Extracts a config from the given provider and validates it.
    ///
    /// The root is taken from the provider's `root` key if present, otherwise the current
    /// directory is used.
    pub fn from_provider(provider: impl Provider) -> Result<Self, ConfigError> {
        let figment = Figment::from(provider);
        let mut config: Self = figment.extract()?;
        config.profile = figment.profile().clone();
        config.root = match figment.extract_inner::<PathBuf>("root") {
            Ok(root) => root,
            Err(_) => std::env::current_dir()?,
        };
        config.sanitized()
    }

    /// Returns the figment for the current working directory.
    pub fn figment() -> Figment {
        Self::figment_with_root(std::env::current_dir().unwrap_or_default())
    }

    /// Returns the layered figment rooted at `root`.
    pub fn figment_with_root(root: impl AsRef<Path>) -> Figment {
        let root = dunce::canonicalize(root.as_ref()).unwrap_or_else(|_| root.as_ref().into());
        let profile = Self::selected_profile();
        trace!(root = %root.display(), %profile, "loading config");

        Figment::from(Self { root: root.clone(), ..Default::default() })
            .merge(ProfileTomlProvider::new(root.join(Self::FILE_NAME)))
            .merge(Env::prefixed(Self::ENV_PREFIX).ignore(&["PROFILE"]).global())
            .merge(Serialized::global("root", root))
            .select(profile)
    }

    /// Returns the profile selected via [`Self::PROFILE_ENV`].
    pub fn selected_profile() -> Profile {
        Profile::from_env_or(Self::PROFILE_ENV, Self::DEFAULT_PROFILE)
    }

    /// Returns the absolute path of the artifacts directory.
    pub fn artifacts_path(&self) -> PathBuf {
        self.root.join(&self.artifacts)
    }

    /// Returns the confirmation timeout.
    pub fn transaction_timeout(&self) -> Duration {
        Duration::from_secs(self.transaction_timeout)
    }

    /// Returns the receipt polling interval, if configured.
    pub fn poll_interval(&self) -> Option<Duration> {
        self.poll_interval.map(Duration::from_millis)
    }

    /// Serializes the config as TOML under its profile section, the way it would appear in
    /// [`Self::FILE_NAME`].
    pub fn to_string_pretty(&self) -> Result<String, toml::ser::Error> {
        let mut profiles = toml::Table::new();
        profiles.insert(self.profile.to_string(), toml::Value::try_from(self)?);
        let mut doc = toml::Table::new();
        doc.insert(Self::PROFILE_SECTION.to_string(), toml::Value::Table(profiles));
        toml::to_string_pretty(&doc)
    }

    /// Validates values that can't be expressed through the type system.
    fn sanitized(self) -> Result<Self, ConfigError> {
        if self.confirmations == 0 {
            return Err(ConfigError::invalid(
                "confirmations",
                "at least one confirmation is required",
            ));
        }
        if self.transaction_timeout == 0 {
            return Err(ConfigError::invalid("transaction_timeout", "must be greater than zero"));
        }
        if self.eth_rpc_url.trim().is_empty() {
            return Err(ConfigError::invalid("eth_rpc_url", "must not be empty"));
        }
        if self.poll_interval == Some(0) {
            return Err(ConfigError::invalid("poll_interval", "must be greater than zero"));
        }
        Ok(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profile: Self::DEFAULT_PROFILE,
            root: PathBuf::new(),
            artifacts: "artifacts".into(),
            eth_rpc_url: Self::DEFAULT_RPC_URL.to_string(),
            chain_id: None,
            sender: None,
            private_key: None,
            confirmations: 1,
            transaction_timeout: 120,
            poll_interval: None,
        }
    }
}

impl Provider for Config {
    fn metadata(&self) -> Metadata {
        Metadata::named("Deployer Config")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, figment::Error> {
        Serialized::defaults(self).data()
    }

    fn profile(&self) -> Option<Profile> {
        Some(self.profile.clone())
    }
}
