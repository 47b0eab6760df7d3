//! The deployment workflow: resolve an artifact, submit its creation transaction, wait for the
//! confirmation and report the resulting address.

use crate::{
    ArtifactReference, ArtifactSource, CompiledTemplate, DeployError,
    connection::{DeploymentReceipt, NetworkConnection},
};
use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, TxHash};
use deployer_common::shell;
use serde::Serialize;
use std::io;

/// A deployment transaction that has been submitted, and possibly confirmed.
#[derive(Clone, Debug, PartialEq, Eq)]
#[must_use]
pub struct DeploymentHandle {
    contract: String,
    tx_hash: TxHash,
    state: DeploymentState,
}

/// Where a [`DeploymentHandle`] is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeploymentState {
    /// The transaction was accepted by the node.
    Submitted,
    /// The transaction was included and created a contract.
    Confirmed { address: Address, block_number: Option<u64> },
}

impl DeploymentHandle {
    /// Creates a handle for a freshly submitted transaction.
    pub fn submitted(contract: impl Into<String>, tx_hash: TxHash) -> Self {
        Self { contract: contract.into(), tx_hash, state: DeploymentState::Submitted }
    }

    pub fn contract(&self) -> &str {
        &self.contract
    }

    pub fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    pub fn state(&self) -> DeploymentState {
        self.state
    }

    /// Returns the contract address, present only once confirmed.
    pub fn address(&self) -> Option<Address> {
        match self.state {
            DeploymentState::Confirmed { address, .. } => Some(address),
            DeploymentState::Submitted => None,
        }
    }

    /// Confirms the deployment with its receipt.
    ///
    /// Fails if the creation reverted or the receipt carries no contract address.
    pub fn confirm(&mut self, receipt: &DeploymentReceipt) -> Result<Address, DeployError> {
        if !receipt.success {
            return Err(DeployError::rejected(format!(
                "creation of {} reverted in transaction {}",
                self.contract, self.tx_hash
            )));
        }
        let address = receipt.contract_address.ok_or_else(|| {
            DeployError::rejected(format!("transaction {} did not create a contract", self.tx_hash))
        })?;
        self.state = DeploymentState::Confirmed { address, block_number: receipt.block_number };
        Ok(address)
    }
}

/// A confirmed deployment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub contract: String,
    #[serde(rename = "deployedTo")]
    pub address: Address,
    pub transaction_hash: TxHash,
    pub block_number: Option<u64>,
    pub deployer: Option<Address>,
}

impl Deployment {
    /// The human readable status line, `<Name> deployed at: <address>`.
    pub fn summary(&self) -> String {
        format!("{} deployed at: {}", self.contract, self.address)
    }
}

/// Performs contract deployments through a [`NetworkConnection`].
///
/// Each call performs exactly one deployment; nothing is retried.
#[derive(Clone, Debug)]
pub struct DeploymentRunner<S> {
    artifacts: S,
    report: bool,
}

impl<S: ArtifactSource> DeploymentRunner<S> {
    /// Creates a runner resolving artifacts from `artifacts`.
    pub fn new(artifacts: S) -> Self {
        Self { artifacts, report: true }
    }

    /// Do not report deployments on the shell if `quiet` is `true`.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.report = !quiet;
        self
    }

    pub fn artifacts(&self) -> &S {
        &self.artifacts
    }

    /// Deploys the referenced contract, which must not take constructor arguments, and returns
    /// its address.
    pub async fn deploy<C: NetworkConnection + ?Sized>(
        &self,
        reference: &ArtifactReference,
        connection: &C,
    ) -> Result<Address, DeployError> {
        Ok(self.deploy_with_args(reference, Vec::new(), connection).await?.address)
    }

    /// Deploys the referenced contract with the given constructor arguments.
    pub async fn deploy_with_args<C: NetworkConnection + ?Sized>(
        &self,
        reference: &ArtifactReference,
        args: Vec<DynSolValue>,
        connection: &C,
    ) -> Result<Deployment, DeployError> {
        let template = self.artifacts.resolve(reference)?;
        self.deploy_template(&template, &args, connection).await
    }

    /// Deploys an already resolved template.
    pub async fn deploy_template<C: NetworkConnection + ?Sized>(
        &self,
        template: &CompiledTemplate,
        args: &[DynSolValue],
        connection: &C,
    ) -> Result<Deployment, DeployError> {
        let code = template.creation_code(args)?;
        let policy = connection.wait_policy();

        debug!(contract = %template.name, size = code.len(), "submitting creation transaction");
        let tx_hash = connection.send_deployment(code).await?;
        let mut handle = DeploymentHandle::submitted(&template.name, tx_hash);
        debug!(
            %tx_hash,
            confirmations = policy.confirmations,
            timeout = ?policy.timeout,
            "waiting for confirmation"
        );

        let receipt = tokio::time::timeout(
            policy.timeout,
            connection.wait_for_receipt(tx_hash, policy.confirmations),
        )
        .await
        .map_err(|_| DeployError::ConfirmationTimeout { tx_hash, timeout: policy.timeout })??;
        let address = handle.confirm(&receipt)?;
        trace!(?handle, gas_used = receipt.gas_used, "deployment confirmed");

        let deployment = Deployment {
            contract: template.name.clone(),
            address,
            transaction_hash: tx_hash,
            block_number: receipt.block_number,
            deployer: connection.sender(),
        };
        if self.report
            && let Err(err) = report(&deployment)
        {
            warn!(%err, "failed to report deployment");
        }
        Ok(deployment)
    }

    /// Returns `true` if the code at `address` is the template's runtime bytecode, ignoring the
    /// slots of immutable variables.
    ///
    /// Templates without runtime bytecode can't be compared and always match.
    pub async fn check_deployed_code<C: NetworkConnection + ?Sized>(
        &self,
        template: &CompiledTemplate,
        address: Address,
        connection: &C,
    ) -> Result<bool, DeployError> {
        if template.deployed_bytecode.is_none() {
            debug!(contract = %template.name, "no runtime bytecode to compare against");
            return Ok(true);
        }
        let code = connection.code_at(address).await?;
        Ok(template.matches_runtime_code(&code))
    }
}

fn report(deployment: &Deployment) -> io::Result<()> {
    if shell::is_json() {
        sh_println!("{}", serde_json::to_string(deployment)?)
    } else {
        sh_println!("{}", deployment.summary())
    }
}
