use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use super::load_configuration;
use crate::config::Configuration;

#[derive(Debug, Clone, Args)]
pub struct ConfigureCommand {
    #[arg(short = 'u', long, help = "IdP login URL that starts the SAML flow")]
    pub login_url: Option<String>,

    #[arg(short = 'R', long, help = "AWS region for the profile")]
    pub region: Option<String>,

    #[arg(short = 'r', long, help = "IAM role ARN to assume instead of prompting")]
    pub role_arn: Option<String>,

    #[arg(short = 'd', long, help = "Session duration in seconds (900-43200)")]
    pub duration: Option<i64>,

    #[arg(long, help = "Prompt for a role even when only one is available")]
    pub ask_role: Option<bool>,
}

impl ConfigureCommand {
    pub fn execute(self, profile: &str) -> Result<()> {
        let mut config = load_configuration(profile)?;
        self.apply(&mut config);

        config
            .raise_if_invalid()
            .with_context(|| format!("Refusing to save profile '{profile}'"))?;

        config
            .write(None)
            .context("Failed to save configuration")?;

        info!("Configured profile: {}", profile);
        println!("Configuration saved for profile: {profile}");
        Ok(())
    }

    fn apply(self, config: &mut Configuration) {
        if let Some(login_url) = self.login_url {
            config.login_url = Some(login_url);
        }
        if let Some(region) = self.region {
            config.region = Some(region);
        }
        if let Some(role_arn) = self.role_arn {
            config.role_arn = Some(role_arn);
        }
        if let Some(duration) = self.duration {
            config.duration = duration;
        }
        if let Some(ask_role) = self.ask_role {
            config.ask_role = ask_role;
        }
    }
}
