use clap::Parser;
use deployer_cli::opts::{ConfigArgs, LoadConfig};
use deployer_common::shell;
use eyre::Result;

/// CLI arguments for `deployer config`.
#[derive(Clone, Debug, Parser)]
pub struct ConfigCmd {
    #[command(flatten)]
    pub config: ConfigArgs,
}

impl ConfigCmd {
    pub fn run(self) -> Result<()> {
        let config = self.config.load_config()?;
        let s = if shell::is_json() {
            serde_json::to_string_pretty(&config)?
        } else {
            config.to_string_pretty()?
        };
        sh_println!("{s}")?;
        Ok(())
    }
}
