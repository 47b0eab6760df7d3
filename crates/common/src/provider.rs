//! Commonly used provider helpers.

use alloy_network::EthereumWallet;
use alloy_provider::{DynProvider, Provider};
use eyre::{Result, WrapErr};
use std::time::Duration;
use url::Url;

/// Builds an alloy HTTP provider with the recommended fillers (nonce, gas, chain id) installed.
///
/// The URL is parsed lazily so that [`ProviderBuilder::build`] reports invalid endpoints together
/// with every other configuration error.
pub struct ProviderBuilder {
    url: Result<Url>,
    wallet: Option<EthereumWallet>,
    poll_interval: Option<Duration>,
}

impl ProviderBuilder {
    /// Creates a new builder for the given RPC endpoint.
    ///
    /// Endpoints without a scheme, e.g. `localhost:8545`, are treated as `http`.
    pub fn new(url: &str) -> Self {
        Self { url: parse_rpc_url(url), wallet: None, poll_interval: None }
    }

    /// Signs transactions locally with the given wallet.
    pub fn wallet(mut self, wallet: impl Into<Option<EthereumWallet>>) -> Self {
        self.wallet = wallet.into();
        self
    }

    /// Sets the interval at which pending transactions are polled.
    pub fn poll_interval(mut self, interval: impl Into<Option<Duration>>) -> Self {
        self.poll_interval = interval.into();
        self
    }

    /// Builds the provider.
    pub fn build(self) -> Result<DynProvider> {
        let Self { url, wallet, poll_interval } = self;
        let url = url?;
        debug!(%url, signing = wallet.is_some(), "building provider");

        let provider = match wallet {
            Some(wallet) => {
                alloy_provider::ProviderBuilder::new().wallet(wallet).connect_http(url).erased()
            }
            None => alloy_provider::ProviderBuilder::new().connect_http(url).erased(),
        };
        if let Some(interval) = poll_interval {
            provider.client().set_poll_interval(interval);
        }
        Ok(provider)
    }
}

/// Parses an RPC endpoint, defaulting to `http` when no scheme is given.
pub fn parse_rpc_url(url: &str) -> Result<Url> {
    let url = url.trim();
    let parsed = if url.contains("://") {
        Url::parse(url)
    } else {
        Url::parse(&format!("http://{url}"))
    }
    .wrap_err_with(|| format!("invalid RPC url `{url}`"))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => eyre::bail!(
            "unsupported RPC url scheme `{scheme}`; only http(s) endpoints are supported"
        ),
    }
}
