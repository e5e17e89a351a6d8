pub mod completions;
pub mod configure;
pub mod credentials;
pub mod show;

pub use completions::CompletionsCommand;
pub use configure::ConfigureCommand;
pub use credentials::CredentialsCommand;
pub use show::ShowCommand;

use anyhow::{Context, Result};

use crate::config::{AwsPaths, Configuration};

/// Defaults for `profile`, overlaid with whatever the config file holds for it
fn load_configuration(profile: &str) -> Result<Configuration> {
    let paths = AwsPaths::from_env().context("Failed to determine AWS config paths")?;
    let mut config = Configuration::new(paths);
    config.profile = profile.to_string();

    config
        .read(profile)
        .with_context(|| format!("Failed to read configuration for profile '{profile}'"))?;

    Ok(config)
}
