use crate::cmd::{config::ConfigCmd, create::CreateArgs, list::ListArgs};
use clap::{Parser, Subcommand};
use deployer_cli::opts::GlobalArgs;

/// Deploy compiled contracts and report their addresses.
#[derive(Parser)]
#[command(
    name = "deployer",
    version,
    next_display_order = None,
)]
pub struct Deployer {
    /// Include the global arguments.
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub cmd: DeployerSubcommand,
}

#[derive(Subcommand)]
pub enum DeployerSubcommand {
    /// Deploy a compiled contract.
    #[command(visible_alias = "c")]
    Create(CreateArgs),

    /// List the deployable artifacts of the build output.
    #[command(visible_alias = "ls")]
    List(ListArgs),

    /// Display the resolved configuration.
    #[command(visible_alias = "cf")]
    Config(ConfigCmd),
}
