use chrono::{DateTime, Utc};

pub mod credentials;

/// AWS temporary credentials structure, as handed back by STS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: DateTime<Utc>,
}

pub use credentials::{TokenCache, is_valid_token_cache};
