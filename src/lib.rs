//! Configuration and credential cache management for SAML logins to AWS.
//!
//! [`Configuration`] merges the options saved for a profile in the shared AWS config file
//! over built-in defaults, and keeps the last SAML assertion and STS credentials cached
//! next to the credentials file so a still-valid login can be reused. Every write to the
//! shared files happens under a per-file lock.

pub mod aws;
pub mod cli;
pub mod clock;
pub mod commands;
pub mod config;
pub mod constants;
pub mod error;
pub mod lock;
pub mod saml;
pub mod store;

pub use config::{AwsPaths, Configuration};
pub use error::{ConfigError, InvalidConfig};
