use clap::Parser;
use deployer_common::shell::{self, OutputMode};

/// Global arguments for the CLI.
#[derive(Clone, Debug, Default, Parser)]
pub struct GlobalArgs {
    /// Do not print anything to stdout.
    #[arg(help_heading = "Display options", global = true, short, long, conflicts_with = "json")]
    pub quiet: bool,

    /// Format results as JSON.
    #[arg(help_heading = "Display options", global = true, long)]
    pub json: bool,
}

impl GlobalArgs {
    /// Applies the display options to the shell.
    pub fn init(&self) {
        shell::set_output_mode(self.output_mode());
    }

    /// Returns the output mode selected by the flags.
    pub fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else if self.quiet {
            OutputMode::Quiet
        } else {
            OutputMode::Normal
        }
    }
}
