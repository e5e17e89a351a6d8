use std::{io, path::PathBuf, time::Duration};

use thiserror::Error;

use crate::constants::{MAX_DURATION_SECONDS, MIN_DURATION_SECONDS};

/// A violated option invariant, reported by `Configuration::raise_if_invalid`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidConfig {
    #[error("Expected duration to be greater than or equal to {min}. Got {0}.", min = MIN_DURATION_SECONDS)]
    DurationTooShort(i64),

    #[error(
        "Expected duration to be less than or equal to max_duration ({max}). Got {0}.",
        max = MAX_DURATION_SECONDS
    )]
    DurationTooLong(i64),

    #[error("Expected region to be set to a string value.")]
    MissingRegion,

    #[error("Expected login_url to be set to a non-empty value.")]
    MissingLoginUrl,

    #[error("Expected role_arn to contain 'arn:aws:iam::' or 'arn:aws-us-gov:iam::'. Got '{0}'.")]
    MalformedRoleArn(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(#[from] InvalidConfig),

    #[error("cannot locate the SAML cache file without a login URL")]
    MissingLoginUrl,

    #[error("cannot store config or credentials without a profile")]
    MissingProfile,

    #[error("failed to lock {}", .path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("timed out after {waited:?} waiting for lock {}", .path.display())]
    LockTimeout { path: PathBuf, waited: Duration },

    #[error("failed to access {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ini::ParseError,
    },
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = ConfigError> = std::result::Result<T, E>;
