//! Runs the built binaries against a temporary project.

#[path = "../it/node.rs"]
mod node;

use node::{ACCOUNT, MockNode, NodeBehavior};
use serde_json::json;
use snapbox::{cmd::Command, str};
use std::path::Path;
use tempfile::TempDir;

/// Nothing listens on this port, connecting fails immediately.
const UNREACHABLE_RPC: &str = "http://127.0.0.1:1";

fn project() -> TempDir {
    project_with_rpc(UNREACHABLE_RPC)
}

fn project_with_rpc(rpc_url: &str) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("deployer.toml"),
        format!("[profile.default]\neth_rpc_url = \"{rpc_url}\"\ntransaction_timeout = 5\n"),
    )
    .unwrap();
    for (name, bytecode) in [("LogStore", "0x6080"), ("RedPacket", "0x6081")] {
        let artifact_dir = dir.path().join(format!("artifacts/contracts/{name}.sol"));
        std::fs::create_dir_all(&artifact_dir).unwrap();
        let artifact = json!({
            "_format": "hh-sol-artifact-1",
            "contractName": name,
            "sourceName": format!("contracts/{name}.sol"),
            "abi": [],
            "bytecode": bytecode,
            "deployedBytecode": "0x60",
            "linkReferences": {},
            "deployedLinkReferences": {}
        });
        std::fs::write(artifact_dir.join(format!("{name}.json")), artifact.to_string()).unwrap();
    }
    dir
}

fn cmd(bin: &str, root: &Path) -> Command {
    Command::new(bin)
        .current_dir(root)
        .env_remove("DEPLOYER_PROFILE")
        .env_remove("DEPLOYER_ETH_RPC_URL")
        .env_remove("DEPLOYER_PRIVATE_KEY")
        .env("NO_COLOR", "1")
}

fn stderr(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn deploy_logstore_prints_address() {
    let node = MockNode::spawn(NodeBehavior::Healthy);
    let prj = project_with_rpc(node.url());

    cmd(env!("CARGO_BIN_EXE_deploy-logstore"), prj.path())
        .assert()
        .success()
        .stdout_eq(format!("LogStore deployed at: {}\n", ACCOUNT.create(0)));
    assert!(node.was_called("eth_sendTransaction"));
}

#[test]
fn deploy_redpacket_reports_rejection() {
    let node =
        MockNode::spawn(NodeBehavior::Reject("insufficient funds for gas * price + value".into()));
    let prj = project_with_rpc(node.url());

    let assert = cmd(env!("CARGO_BIN_EXE_deploy-redpacket"), prj.path()).assert().failure();
    let output = assert.get_output();

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = stderr(output);
    assert!(stderr.contains("Error:"), "{stderr}");
    assert!(
        stderr.contains("deployment transaction rejected: insufficient funds"),
        "{stderr}"
    );
    assert!(!stderr.contains("deployed at"), "{stderr}");
    assert!(!node.was_called("eth_getTransactionReceipt"));
}

#[test]
fn create_prints_json_deployment() {
    let node = MockNode::spawn(NodeBehavior::Healthy);
    let prj = project_with_rpc(node.url());

    let assert = cmd(env!("CARGO_BIN_EXE_deployer"), prj.path())
        .args(["create", "RedPacket", "--json"])
        .assert()
        .success();

    let deployment: serde_json::Value =
        serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(deployment["contract"], "RedPacket");
    assert_eq!(deployment["deployedTo"], ACCOUNT.create(0).to_string());
    assert_eq!(deployment["deployer"], ACCOUNT.to_string());
}

#[test]
fn deploy_redpacket_fails_without_node() {
    let prj = project();
    let assert = cmd(env!("CARGO_BIN_EXE_deploy-redpacket"), prj.path()).assert().failure();
    let output = assert.get_output();

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = stderr(output);
    assert!(stderr.contains("Error:"), "{stderr}");
    assert!(stderr.contains("failed to connect to the network"), "{stderr}");
}

#[test]
fn deploy_logstore_fails_on_invalid_config() {
    let prj = project();
    let assert = cmd(env!("CARGO_BIN_EXE_deploy-logstore"), prj.path())
        .env("DEPLOYER_CONFIRMATIONS", "0")
        .assert()
        .failure();

    let stderr = stderr(assert.get_output());
    assert!(stderr.contains("confirmations"), "{stderr}");
}

#[test]
fn lists_artifacts() {
    let prj = project();
    cmd(env!("CARGO_BIN_EXE_deployer"), prj.path()).arg("list").assert().success().stdout_eq(
        str![[r#"
contracts/LogStore.sol:LogStore
contracts/RedPacket.sol:RedPacket

"#]],
    );
}

#[test]
fn create_rejects_unknown_contract_before_connecting() {
    let prj = project();
    let assert = cmd(env!("CARGO_BIN_EXE_deployer"), prj.path())
        .args(["create", "Missing"])
        .assert()
        .failure();

    let stderr = stderr(assert.get_output());
    assert!(stderr.contains("no artifact found for `Missing`"), "{stderr}");
    assert!(!stderr.contains("failed to connect"), "{stderr}");
}

#[test]
fn create_rejects_unexpected_constructor_args() {
    let prj = project();
    let assert = cmd(env!("CARGO_BIN_EXE_deployer"), prj.path())
        .args(["create", "LogStore", "--constructor-args", "1"])
        .assert()
        .failure();

    let stderr = stderr(assert.get_output());
    assert!(stderr.contains("has no constructor"), "{stderr}");
}

#[test]
fn prints_resolved_config() {
    let prj = project();
    let assert = cmd(env!("CARGO_BIN_EXE_deployer"), prj.path())
        .args(["config", "--json", "--confirmations", "3"])
        .assert()
        .success();

    let config: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(config["eth_rpc_url"], UNREACHABLE_RPC);
    assert_eq!(config["confirmations"], 3);
    assert_eq!(config["transaction_timeout"], 5);
    assert!(config.get("private_key").is_none());
}

#[test]
fn quiet_conflicts_with_json() {
    let prj = project();
    cmd(env!("CARGO_BIN_EXE_deployer"), prj.path())
        .args(["list", "--json", "--quiet"])
        .assert()
        .failure();
}
