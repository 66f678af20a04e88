use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;

use super::demo::DemoCommand;
use super::kinds::demo_registry;
use modal_lifecycle::config::Config;

/// modalctl - drive a modal dialog through its lifecycle on a headless surface
#[derive(Parser)]
#[command(
    name = "modalctl",
    version,
    about = "Drive a modal dialog through its lifecycle on a headless surface",
    long_about = r#"modalctl opens a dialog kind on an in-memory modal surface, runs its
lifecycle hooks and animations, closes it and prints every lifecycle event.

Examples:
  modalctl demo                         # open and close the "confirm" dialog
  modalctl demo --kind alert --dismiss  # close by clicking outside the content
  modalctl demo --fail closing          # make the closing hook fail
  modalctl kinds                        # list the demo dialog kinds"#
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one open/close lifecycle
    Demo(DemoCommand),
    /// List the registered demo dialog kinds
    Kinds,
}

impl Cli {
    pub async fn execute(self, config: Config) -> Result<()> {
        if self.debug {
            debug!("Debug logging enabled");
        }

        match self.command {
            Some(Commands::Demo(demo_cmd)) => demo_cmd.execute(&config).await,
            Some(Commands::Kinds) => {
                for kind in demo_registry(None).kinds() {
                    println!("{}", kind);
                }
                Ok(())
            }
            None => DemoCommand::default().execute(&config).await,
        }
    }
}
