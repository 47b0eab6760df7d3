use crate::opts::{Deployer, DeployerSubcommand};
use clap::Parser;
use deployer_cli::utils;
use eyre::Result;

/// Runs the `deployer` command line interface.
pub fn run() -> Result<()> {
    setup();

    let args = Deployer::parse();
    args.global.init();

    run_command(args)
}

/// Setup the global logger and other utilities.
pub fn setup() {
    utils::common_setup();
    utils::subscriber();
}

/// Run the subcommand.
pub fn run_command(args: Deployer) -> Result<()> {
    match args.cmd {
        DeployerSubcommand::Create(cmd) => utils::block_on(cmd.run())?,
        DeployerSubcommand::List(cmd) => cmd.run(),
        DeployerSubcommand::Config(cmd) => cmd.run(),
    }
}
