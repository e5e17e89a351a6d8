use anyhow::Result;
use clap::Args;

use super::load_configuration;
use crate::{aws::credentials::format_expiration, config::Configuration};

#[derive(Debug, Clone, Args)]
pub struct ShowCommand {}

impl ShowCommand {
    pub fn execute(self, profile: &str) -> Result<()> {
        let mut config = load_configuration(profile)?;
        config.read_token_cache()?;
        if config.use_saml_cache {
            config.read_saml_cache();
        }

        print!("{}", render(&mut config));
        Ok(())
    }
}

fn render(config: &mut Configuration) -> String {
    let unset = || "(not set)".to_string();
    let status = match config.raise_if_invalid() {
        Ok(()) => "ok".to_string(),
        Err(e) => e.to_string(),
    };

    let mut lines = vec![
        ("profile", config.profile.clone()),
        ("login_url", config.login_url.clone().unwrap_or_else(unset)),
        ("region", config.region.clone().unwrap_or_else(unset)),
        (
            "role_arn",
            config
                .role_arn
                .clone()
                .unwrap_or_else(|| "(prompt)".to_string()),
        ),
        ("duration", config.duration.to_string()),
        ("ask_role", config.ask_role.to_string()),
        ("account", config.account.clone()),
        ("status", status),
    ];

    let token = config
        .token_cache()
        .and_then(|token| token.expiration)
        .map_or_else(
            || "none".to_string(),
            |expiration| format!("valid until {}", format_expiration(&expiration)),
        );
    lines.push(("token cache", token));

    if config.use_saml_cache {
        let saml = match config.saml_cache() {
            Some(_) => "valid",
            None => "none",
        };
        lines.push(("saml cache", saml.to_string()));
    }

    lines
        .into_iter()
        .map(|(name, value)| format!("{name:<12} {value}\n"))
        .collect()
}
