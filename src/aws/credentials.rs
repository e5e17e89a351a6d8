use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::Serialize;

use super::Credentials;

/// Temporary credentials as persisted by this tool. Any field may be missing on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenCache {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    pub expiration: Option<DateTime<Utc>>,
}

impl TokenCache {
    /// Credentials view of a complete record
    pub fn credentials(&self) -> Option<Credentials> {
        Some(Credentials {
            access_key_id: self.access_key_id.clone()?,
            secret_access_key: self.secret_access_key.clone()?,
            session_token: self.session_token.clone().unwrap_or_default(),
            expiration: self.expiration?,
        })
    }
}

impl From<&Credentials> for TokenCache {
    fn from(creds: &Credentials) -> Self {
        Self {
            access_key_id: Some(creds.access_key_id.clone()),
            secret_access_key: Some(creds.secret_access_key.clone()),
            session_token: Some(creds.session_token.clone()),
            expiration: Some(creds.expiration),
        }
    }
}

/// A cached token is usable only if it has both keys and expires strictly after `now`.
pub fn is_valid_token_cache(token: Option<&TokenCache>, now: DateTime<Utc>) -> bool {
    let Some(token) = token else {
        return false;
    };

    token.access_key_id.is_some()
        && token.secret_access_key.is_some()
        && token.expiration.is_some_and(|expiration| expiration > now)
}

/// ISO-8601 form written to the credentials file
pub fn format_expiration(expiration: &DateTime<Utc>) -> String {
    expiration.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

/// Parse a stored expiration. Offsets are honored; a bare timestamp is taken as UTC.
pub fn parse_expiration(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

/// Document printed for the AWS SDK `credential_process` setting
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct CredentialProcessOutput<'a> {
    version: u8,
    access_key_id: &'a str,
    secret_access_key: &'a str,
    session_token: &'a str,
    expiration: String,
}

pub fn credential_process_json(creds: &Credentials) -> Result<String> {
    let output = CredentialProcessOutput {
        version: 1,
        access_key_id: &creds.access_key_id,
        secret_access_key: &creds.secret_access_key,
        session_token: &creds.session_token,
        expiration: format_expiration(&creds.expiration),
    };

    serde_json::to_string(&output).context("Failed to serialize credential_process output")
}

/// `export` lines for eval-ing the credentials into a shell
pub fn shell_exports(creds: &Credentials) -> String {
    [
        ("AWS_ACCESS_KEY_ID", creds.access_key_id.as_str()),
        ("AWS_SECRET_ACCESS_KEY", creds.secret_access_key.as_str()),
        ("AWS_SESSION_TOKEN", creds.session_token.as_str()),
        ("AWS_SECURITY_TOKEN", creds.session_token.as_str()),
    ]
    .iter()
    .map(|(name, value)| format!("export {name}={value}\n"))
    .collect()
}
