use crate::helpers::{
    Behavior, FakeNetwork, LOGSTORE_CODE, REDPACKET_CODE, SENDER, hardhat_artifacts,
    vault_runtime_code,
};
use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, Bytes, TxHash, U256};
use async_trait::async_trait;
use deployer::{
    ArtifactReference, ArtifactStore, DeployError, DeploymentReceipt, DeploymentRunner,
    NetworkConnection, WaitPolicy,
};
use mockall::mock;
use similar_asserts::assert_eq;
use std::time::Duration;

mock! {
    pub Connection {}

    #[async_trait]
    impl NetworkConnection for Connection {
        fn wait_policy(&self) -> WaitPolicy;
        fn sender(&self) -> Option<Address>;
        async fn send_deployment(&self, code: Bytes) -> Result<TxHash, DeployError>;
        async fn wait_for_receipt(
            &self,
            tx_hash: TxHash,
            confirmations: u64,
        ) -> Result<DeploymentReceipt, DeployError>;
        async fn code_at(&self, address: Address) -> Result<Bytes, DeployError>;
    }
}

fn runner(store: ArtifactStore) -> DeploymentRunner<ArtifactStore> {
    DeploymentRunner::new(store).quiet(true)
}

fn logstore() -> ArtifactReference {
    ArtifactReference::new("LogStore")
}

#[tokio::test]
async fn deploys_creation_bytecode() {
    let artifacts = hardhat_artifacts();
    let network = FakeNetwork::healthy();

    let address = runner(ArtifactStore::new(artifacts.path()))
        .deploy(&logstore(), &network)
        .await
        .unwrap();

    assert_eq!(address, SENDER.create(0));
    assert_eq!(network.submitted(), vec![LOGSTORE_CODE.parse::<Bytes>().unwrap()]);
}

#[tokio::test]
async fn reports_logstore_deployment() {
    let artifacts = hardhat_artifacts();
    let network = FakeNetwork::healthy();

    let deployment = runner(ArtifactStore::new(artifacts.path()))
        .deploy_with_args(&logstore(), Vec::new(), &network)
        .await
        .unwrap();

    assert_eq!(deployment.contract, "LogStore");
    assert_eq!(deployment.deployer, Some(SENDER));
    assert_eq!(deployment.block_number, Some(1));
    assert_eq!(deployment.summary(), format!("LogStore deployed at: {}", deployment.address));
    assert!(deployment.summary().starts_with("LogStore deployed at: 0x"));
}

#[tokio::test]
async fn missing_artifact_is_never_submitted() {
    let artifacts = hardhat_artifacts();
    let mut connection = MockConnection::new();
    connection.expect_wait_policy().return_const(WaitPolicy::default());
    connection.expect_send_deployment().never();
    connection.expect_wait_for_receipt().never();

    let err = runner(ArtifactStore::new(artifacts.path()))
        .deploy(&ArtifactReference::new("Missing"), &connection)
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::ArtifactNotFound { .. }), "{err}");
}

#[tokio::test]
async fn rejected_redpacket_yields_no_address() {
    let artifacts = hardhat_artifacts();
    let network = FakeNetwork::new(Behavior::Reject("insufficient funds".to_string()));

    let err = runner(ArtifactStore::new(artifacts.path()))
        .deploy(&ArtifactReference::new("RedPacket"), &network)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "SubmissionRejected");
    assert!(err.to_string().contains("insufficient funds"), "{err}");
    assert!(network.submitted().is_empty());
}

#[tokio::test]
async fn dropped_connection_fails_before_submission() {
    let artifacts = hardhat_artifacts();
    let network = FakeNetwork::new(Behavior::Offline);

    let err = runner(ArtifactStore::new(artifacts.path()))
        .deploy(&logstore(), &network)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "Connection");
}

#[tokio::test]
async fn reverted_creation_is_rejected() {
    let artifacts = hardhat_artifacts();
    let network = FakeNetwork::new(Behavior::Revert);

    let err = runner(ArtifactStore::new(artifacts.path()))
        .deploy(&ArtifactReference::new("RedPacket"), &network)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "SubmissionRejected");
    assert_eq!(network.submitted(), vec![REDPACKET_CODE.parse::<Bytes>().unwrap()]);
}

#[tokio::test(start_paused = true)]
async fn unconfirmed_deployment_times_out() {
    let artifacts = hardhat_artifacts();
    let network = FakeNetwork::new(Behavior::NeverConfirm).with_timeout(Duration::from_secs(5));
    let start = tokio::time::Instant::now();

    let err = runner(ArtifactStore::new(artifacts.path()))
        .deploy(&logstore(), &network)
        .await
        .unwrap_err();

    let DeployError::ConfirmationTimeout { timeout, .. } = err else { panic!("{err}") };
    assert_eq!(timeout, Duration::from_secs(5));
    assert!(start.elapsed() >= Duration::from_secs(5));
    assert_eq!(network.submitted().len(), 1);
}

#[tokio::test]
async fn deploying_twice_creates_two_contracts() {
    let artifacts = hardhat_artifacts();
    let network = FakeNetwork::healthy();
    let runner = runner(ArtifactStore::new(artifacts.path()));

    let first = runner.deploy(&logstore(), &network).await.unwrap();
    let second = runner.deploy(&logstore(), &network).await.unwrap();

    assert_ne!(first, second);
    assert_eq!(network.submitted().len(), 2);
}

#[tokio::test]
async fn appends_encoded_constructor_args() {
    let artifacts = hardhat_artifacts();
    let network = FakeNetwork::healthy();
    let runner = runner(ArtifactStore::new(artifacts.path()));

    let token = ArtifactReference::new("Token");
    runner
        .deploy_with_args(&token, vec![DynSolValue::Uint(U256::from(42), 256)], &network)
        .await
        .unwrap();

    let code = &network.submitted()[0];
    assert_eq!(code.len(), 4 + 32);
    assert_eq!(&code[..4], &[0x60, 0x80, 0x60, 0x40]);
    assert_eq!(U256::from_be_slice(&code[4..]), U256::from(42));

    let err = runner.deploy(&token, &network).await.unwrap_err();
    assert_eq!(err.kind(), "ConstructorArgs");
    assert_eq!(network.submitted().len(), 1);
}

#[tokio::test]
async fn waits_for_configured_confirmations() {
    let artifacts = hardhat_artifacts();
    let mut connection = MockConnection::new();
    let tx_hash = TxHash::with_last_byte(1);
    let address = Address::with_last_byte(2);
    connection.expect_wait_policy().return_const(WaitPolicy::default().with_confirmations(3));
    connection.expect_sender().return_const(None::<Address>);
    connection.expect_send_deployment().times(1).returning(move |_| Ok(tx_hash));
    connection
        .expect_wait_for_receipt()
        .withf(move |hash, confirmations| *hash == tx_hash && *confirmations == 3)
        .times(1)
        .returning(move |tx_hash, _| {
            Ok(DeploymentReceipt {
                tx_hash,
                success: true,
                contract_address: Some(address),
                block_number: Some(10),
                gas_used: 50_000,
            })
        });

    let deployment = runner(ArtifactStore::new(artifacts.path()))
        .deploy_with_args(&logstore(), Vec::new(), &connection)
        .await
        .unwrap();

    assert_eq!(deployment.address, address);
    assert_eq!(deployment.transaction_hash, tx_hash);
    assert_eq!(deployment.deployer, None);
}

#[tokio::test]
async fn checks_deployed_code() {
    let artifacts = hardhat_artifacts();
    let store = ArtifactStore::new(artifacts.path());
    let runner = runner(store.clone());
    let template = deployer::ArtifactSource::resolve(&store, &logstore()).unwrap();

    let network = FakeNetwork::healthy();
    let deployment = runner.deploy_template(&template, &[], &network).await.unwrap();
    assert!(runner.check_deployed_code(&template, deployment.address, &network).await.unwrap());

    let network = FakeNetwork::healthy().with_runtime_code(Bytes::from_static(&[0xfe]));
    let deployment = runner.deploy_template(&template, &[], &network).await.unwrap();
    assert!(!runner.check_deployed_code(&template, deployment.address, &network).await.unwrap());
}

#[tokio::test]
async fn deployed_code_check_ignores_immutables() {
    let artifacts = hardhat_artifacts();
    let store = ArtifactStore::new(artifacts.path());
    let runner = runner(store.clone());
    let template =
        deployer::ArtifactSource::resolve(&store, &ArtifactReference::new("Vault")).unwrap();
    assert_eq!(template.immutable_references, [2..34]);

    let network = FakeNetwork::healthy().with_runtime_code(vault_runtime_code());
    let deployment = runner.deploy_template(&template, &[], &network).await.unwrap();
    assert!(runner.check_deployed_code(&template, deployment.address, &network).await.unwrap());

    let mut tampered = vault_runtime_code().to_vec();
    tampered[0] = 0x61;
    let network = FakeNetwork::healthy().with_runtime_code(tampered.into());
    let deployment = runner.deploy_template(&template, &[], &network).await.unwrap();
    assert!(!runner.check_deployed_code(&template, deployment.address, &network).await.unwrap());
}
