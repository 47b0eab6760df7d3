use crate::{
    ArtifactReference, ArtifactSource, ArtifactStore, DeploymentRunner, NetworkDescriptor, connect,
};
use clap::{Parser, ValueHint};
use deployer_cli::opts::{ConfigArgs, LoadConfig};
use deployer_common::shell;
use eyre::{Result, WrapErr};
use std::path::{Path, PathBuf};

/// CLI arguments for `deployer create`.
#[derive(Clone, Debug, Parser)]
pub struct CreateArgs {
    /// The contract identifier in the form `<path>:<contractname>` or `<contractname>`.
    pub contract: ArtifactReference,

    /// The constructor arguments.
    #[arg(
        long,
        num_args(1..),
        conflicts_with = "constructor_args_path",
        value_name = "ARGS",
        allow_hyphen_values = true,
    )]
    pub constructor_args: Vec<String>,

    /// The path to a file containing the constructor arguments.
    #[arg(
        long,
        value_hint = ValueHint::FilePath,
        value_name = "PATH",
        conflicts_with = "constructor_args",
    )]
    pub constructor_args_path: Option<PathBuf>,

    /// Check that the code deployed at the new address is the artifact's runtime bytecode.
    #[arg(long)]
    pub check_code: bool,

    #[command(flatten)]
    pub config: ConfigArgs,
}

impl CreateArgs {
    /// Executes the command to create a contract.
    pub async fn run(self) -> Result<()> {
        let config = self.config.load_config()?;
        let runner = DeploymentRunner::new(ArtifactStore::new(config.artifacts_path()))
            .quiet(shell::is_quiet());

        // invalid input must fail before connecting
        let template = runner.artifacts().resolve(&self.contract)?;
        let raw_args = match &self.constructor_args_path {
            Some(path) => read_constructor_args_file(path)?,
            None => self.constructor_args.clone(),
        };
        let args = template.parse_constructor_args(&raw_args)?;
        template.creation_code(&args)?;

        let connection = connect(&NetworkDescriptor::from_config(&config)).await?;
        let deployment = runner.deploy_template(&template, &args, &connection).await?;

        if self.check_code {
            if !runner.check_deployed_code(&template, deployment.address, &connection).await? {
                eyre::bail!(
                    "the code at {} does not match the runtime bytecode of {}",
                    deployment.address,
                    template.identifier()
                );
            }
            if !shell::is_json() {
                sh_println!("Deployed code matches {}", template.identifier())?;
            }
        }
        Ok(())
    }
}

/// Reads whitespace separated constructor arguments from a file.
pub fn read_constructor_args_file(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read constructor args file {}", path.display()))?;
    let args = content.split_whitespace().map(str::to_string).collect::<Vec<_>>();
    if args.is_empty() {
        eyre::bail!("constructor args file {} is empty", path.display());
    }
    Ok(args)
}
