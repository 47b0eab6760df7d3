//! Sessions with a node.

use crate::DeployError;
use alloy_network::{EthereumWallet, ReceiptResponse, TransactionBuilder};
use alloy_primitives::{Address, Bytes, TxHash};
use alloy_provider::{
    DynProvider, PendingTransactionBuilder, PendingTransactionError, Provider, WatchTxError,
};
use alloy_rpc_types::TransactionRequest;
use alloy_transport::{RpcError, TransportErrorKind};
use async_trait::async_trait;
use deployer_common::{provider::ProviderBuilder, wallet::signer_from_private_key};
use deployer_config::Config;
use std::{fmt, time::Duration};

/// How long to wait for a deployment to be confirmed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Number of confirmations to wait for, at least one.
    pub confirmations: u64,
    /// Maximum time to wait for the confirmations.
    pub timeout: Duration,
    /// Receipt polling interval, the provider default if unset.
    pub poll_interval: Option<Duration>,
}

impl WaitPolicy {
    /// Returns the wait policy configured in `config`.
    ///
    /// The config is expected to be sanitized, which rejects zero confirmations.
    pub fn from_config(config: &Config) -> Self {
        Self {
            confirmations: config.confirmations,
            timeout: config.transaction_timeout(),
            poll_interval: config.poll_interval(),
        }
    }

    /// Sets the number of confirmations.
    ///
    /// A receipt is always awaited, so `0` is raised to one confirmation.
    pub fn with_confirmations(mut self, confirmations: u64) -> Self {
        self.confirmations = confirmations.max(1);
        self
    }

    /// Sets the confirmation timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self { confirmations: 1, timeout: Duration::from_secs(120), poll_interval: None }
    }
}

/// The receipt of a confirmed creation transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeploymentReceipt {
    pub tx_hash: TxHash,
    /// `false` if the creation reverted.
    pub success: bool,
    pub contract_address: Option<Address>,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

/// An active session with a node through which deployments are submitted.
///
/// The session is owned by the caller and borrowed for each deployment.
#[async_trait]
pub trait NetworkConnection: Send + Sync {
    /// Returns how long deployments through this connection are awaited.
    fn wait_policy(&self) -> WaitPolicy;

    /// Returns the account deployments are sent from, if known.
    fn sender(&self) -> Option<Address>;

    /// Submits a contract creation transaction with the given creation code.
    async fn send_deployment(&self, code: Bytes) -> Result<TxHash, DeployError>;

    /// Waits until the transaction has the given number of confirmations.
    async fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
        confirmations: u64,
    ) -> Result<DeploymentReceipt, DeployError>;

    /// Returns the code stored at `address`.
    async fn code_at(&self, address: Address) -> Result<Bytes, DeployError>;
}

/// Describes the network to connect to.
#[derive(Clone, Default)]
pub struct NetworkDescriptor {
    pub rpc_url: String,
    /// The expected chain id, checked against the node's when set.
    pub chain_id: Option<u64>,
    /// Sender used when no private key is configured.
    pub sender: Option<Address>,
    /// Hex encoded private key used to sign transactions locally.
    pub private_key: Option<String>,
    pub wait: WaitPolicy,
}

impl NetworkDescriptor {
    /// Creates a descriptor for the given RPC endpoint with default settings.
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self { rpc_url: rpc_url.into(), ..Default::default() }
    }

    /// Returns the network configured in `config`.
    pub fn from_config(config: &Config) -> Self {
        Self {
            rpc_url: config.eth_rpc_url.clone(),
            chain_id: config.chain_id,
            sender: config.sender,
            private_key: config.private_key.clone(),
            wait: WaitPolicy::from_config(config),
        }
    }
}

impl fmt::Debug for NetworkDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkDescriptor")
            .field("rpc_url", &self.rpc_url)
            .field("chain_id", &self.chain_id)
            .field("sender", &self.sender)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("wait", &self.wait)
            .finish()
    }
}

/// A [`NetworkConnection`] backed by an alloy provider.
pub struct AlloyConnection {
    provider: DynProvider,
    sender: Address,
    chain_id: u64,
    wait: WaitPolicy,
}

impl AlloyConnection {
    /// Returns the chain id reported by the node.
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Returns the underlying provider.
    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }
}

impl fmt::Debug for AlloyConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlloyConnection")
            .field("sender", &self.sender)
            .field("chain_id", &self.chain_id)
            .field("wait", &self.wait)
            .finish_non_exhaustive()
    }
}

/// Connects to the described network.
///
/// The node is probed with `eth_chainId` so an unreachable endpoint fails here, before anything is
/// submitted. The sender is the private key's address, else the configured sender, else the
/// node's first unlocked account.
pub async fn connect(target: &NetworkDescriptor) -> Result<AlloyConnection, DeployError> {
    let signer = target
        .private_key
        .as_deref()
        .map(signer_from_private_key)
        .transpose()
        .map_err(|err| DeployError::Connection(format!("{err:#}")))?;
    let signer_address = signer.as_ref().map(|signer| signer.address());

    let provider = ProviderBuilder::new(&target.rpc_url)
        .wallet(signer.map(EthereumWallet::from))
        .poll_interval(target.wait.poll_interval)
        .build()
        .map_err(|err| DeployError::Connection(format!("{err:#}")))?;

    let chain_id = provider.get_chain_id().await.map_err(|err| {
        DeployError::Connection(format!("{} is unreachable: {err}", target.rpc_url))
    })?;
    if let Some(expected) = target.chain_id
        && expected != chain_id
    {
        return Err(DeployError::Connection(format!(
            "chain id mismatch: expected {expected}, but the node reports {chain_id}"
        )));
    }

    let sender = match (signer_address, target.sender) {
        (Some(signer), Some(sender)) if signer != sender => {
            return Err(DeployError::Connection(format!(
                "sender {sender} does not match the address of the private key {signer}"
            )));
        }
        (Some(signer), _) => signer,
        (None, Some(sender)) => sender,
        (None, None) => {
            let accounts = provider.get_accounts().await.map_err(DeployError::connection)?;
            accounts.first().copied().ok_or_else(|| {
                DeployError::Connection(
                    "no sender configured and the node has no unlocked accounts, set \
                     `private_key` or `sender`"
                        .to_string(),
                )
            })?
        }
    };
    debug!(rpc_url = %target.rpc_url, chain_id, %sender, "connected");

    Ok(AlloyConnection { provider, sender, chain_id, wait: target.wait })
}

#[async_trait]
impl NetworkConnection for AlloyConnection {
    fn wait_policy(&self) -> WaitPolicy {
        self.wait
    }

    fn sender(&self) -> Option<Address> {
        Some(self.sender)
    }

    async fn send_deployment(&self, code: Bytes) -> Result<TxHash, DeployError> {
        let tx = TransactionRequest::default().with_from(self.sender).with_deploy_code(code);
        let pending = self.provider.send_transaction(tx).await.map_err(submission_error)?;
        Ok(*pending.tx_hash())
    }

    async fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
        confirmations: u64,
    ) -> Result<DeploymentReceipt, DeployError> {
        let receipt = PendingTransactionBuilder::new(self.provider.root().clone(), tx_hash)
            .with_required_confirmations(confirmations)
            .with_timeout(Some(self.wait.timeout))
            .get_receipt()
            .await
            .map_err(|err| match err {
                PendingTransactionError::TxWatcher(WatchTxError::Timeout) => {
                    DeployError::ConfirmationTimeout { tx_hash, timeout: self.wait.timeout }
                }
                err => DeployError::connection(err),
            })?;

        Ok(DeploymentReceipt {
            tx_hash: receipt.transaction_hash(),
            success: receipt.status(),
            contract_address: receipt.contract_address(),
            block_number: receipt.block_number(),
            gas_used: receipt.gas_used(),
        })
    }

    async fn code_at(&self, address: Address) -> Result<Bytes, DeployError> {
        self.provider.get_code_at(address).await.map_err(DeployError::connection)
    }
}

/// Maps errors of `eth_sendTransaction` and the fillers preceding it.
///
/// Error responses from the node (insufficient funds, nonce too low, failed gas estimation) and
/// local signing failures are rejections, everything else is a connection failure.
fn submission_error(err: RpcError<TransportErrorKind>) -> DeployError {
    match err {
        RpcError::ErrorResp(payload) => DeployError::rejected(payload.message),
        RpcError::LocalUsageError(err) => DeployError::rejected(err),
        err => DeployError::connection(err),
    }
}
