use crate::ArtifactStore;
use clap::Parser;
use deployer_cli::opts::{ConfigArgs, LoadConfig};
use deployer_common::shell;
use eyre::Result;
use serde_json::json;

/// CLI arguments for `deployer list`.
#[derive(Clone, Debug, Parser)]
pub struct ListArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

impl ListArgs {
    pub fn run(self) -> Result<()> {
        let config = self.config.load_config()?;
        let store = ArtifactStore::new(config.artifacts_path());
        let templates = store.list()?;

        if shell::is_json() {
            let entries = templates
                .iter()
                .map(|template| {
                    json!({
                        "name": template.name,
                        "source": template.source,
                        "path": template.path,
                        "hasConstructor": template.abi.constructor().is_some(),
                    })
                })
                .collect::<Vec<_>>();
            sh_println!("{}", serde_json::to_string_pretty(&entries)?)?;
            return Ok(());
        }

        if templates.is_empty() {
            sh_warn!("no deployable artifacts found in {}", store.root().display())?;
        }
        for template in &templates {
            sh_println!("{}", template.identifier())?;
        }
        Ok(())
    }
}
