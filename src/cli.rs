use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use crate::commands::{CompletionsCommand, ConfigureCommand, CredentialsCommand, ShowCommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "asa", version, about = "SAML login configuration and credential cache for AWS", long_about = None, arg_required_else_help = false)]
pub struct Cli {
    #[arg(
        short = 'p',
        long,
        global = true,
        default_value = "default",
        help = "AWS profile name"
    )]
    pub profile: String,

    #[arg(short = 'v', long, global = true, action = ArgAction::Count, help = "Increase verbosity (-v info, -vv debug, -vvv trace)")]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    #[command(about = "Save login settings for a profile")]
    Configure(ConfigureCommand),
    #[command(about = "Show the merged settings and cache state for a profile")]
    Show(ShowCommand),
    #[command(about = "Print cached temporary credentials for a profile")]
    Credentials(CredentialsCommand),
    #[command(about = "Generate shell completion scripts for asa")]
    Completions(CompletionsCommand),
}

impl Cli {
    pub fn execute(self) -> Result<()> {
        let profile = self.profile;
        let command = self.command.unwrap_or(Commands::Show(ShowCommand {}));

        match command {
            Commands::Configure(cmd) => cmd.execute(&profile),
            Commands::Show(cmd) => cmd.execute(&profile),
            Commands::Credentials(cmd) => cmd.execute(&profile),
            Commands::Completions(cmd) => {
                cmd.execute();
                Ok(())
            }
        }
    }
}
