use anyhow::{Result, anyhow};
use clap::Args;

use super::load_configuration;
use crate::aws::{
    Credentials, TokenCache,
    credentials::{credential_process_json, format_expiration, shell_exports},
};

#[derive(Debug, Clone, Args)]
pub struct CredentialsCommand {
    #[arg(long, help = "Print shell export statements for the credentials")]
    pub print_creds: bool,

    #[arg(
        long,
        conflicts_with = "print_creds",
        help = "Print the credentials as JSON for the AWS credential_process setting"
    )]
    pub credential_process: bool,
}

impl CredentialsCommand {
    pub fn execute(self, profile: &str) -> Result<()> {
        let mut config = load_configuration(profile)?;
        config.print_creds = self.print_creds;
        config.credential_process = self.credential_process;
        config.read_token_cache()?;

        let creds = config
            .token_cache()
            .and_then(TokenCache::credentials)
            .ok_or_else(|| {
                anyhow!("No valid cached credentials for profile '{profile}'. Log in again to refresh them.")
            })?;

        let output = if config.credential_process {
            credential_process_json(&creds)? + "\n"
        } else if config.print_creds {
            shell_exports(&creds)
        } else {
            summary(profile, &creds)
        };

        print!("{output}");
        Ok(())
    }
}

fn summary(profile: &str, creds: &Credentials) -> String {
    format!(
        "Cached credentials for profile {profile} ({}) expire at {}\n",
        creds.access_key_id,
        format_expiration(&creds.expiration)
    )
}
