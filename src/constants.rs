use std::{env, path::PathBuf};

/// AWS configuration directory name
pub const AWS_CONFIG_DIR_NAME: &str = ".aws";

/// AWS configuration file name
pub const AWS_CONFIG_FILE_NAME: &str = "config";

/// AWS shared credentials file name
pub const AWS_CREDENTIALS_FILE_NAME: &str = "credentials";

/// Profile used when none is given
pub const DEFAULT_PROFILE: &str = "default";

/// Shortest session STS will issue, in seconds
pub const MIN_DURATION_SECONDS: i64 = 900;

/// Longest session STS will issue, in seconds
pub const MAX_DURATION_SECONDS: i64 = 43200;

/// Default local port for the IdP callback listener
pub const DEFAULT_PORT: u16 = 8000;

/// Suffix appended to a file path to name its lock file
pub const LOCK_FILE_SUFFIX: &str = ".lock";

// Config file keys
pub const KEY_REGION: &str = "region";
pub const KEY_ASK_ROLE: &str = "asa.ask_role";
pub const KEY_DURATION: &str = "asa.duration";
pub const KEY_LOGIN_URL: &str = "asa.login_url";
pub const KEY_ROLE_ARN: &str = "asa.role_arn";
pub const KEY_ACCOUNT: &str = "account";

// Credentials file keys read by the AWS CLI and SDKs
pub const KEY_AWS_ACCESS_KEY_ID: &str = "aws_access_key_id";
pub const KEY_AWS_SECRET_ACCESS_KEY: &str = "aws_secret_access_key";
pub const KEY_AWS_SECURITY_TOKEN: &str = "aws_security_token";
pub const KEY_AWS_SESSION_TOKEN: &str = "aws_session_token";
pub const KEY_AWS_SESSION_EXPIRATION: &str = "aws_session_expiration";

// Credentials file keys holding the token cache
pub const KEY_CACHE_ACCESS_KEY_ID: &str = "asa.aws_access_key_id";
pub const KEY_CACHE_SECRET_ACCESS_KEY: &str = "asa.aws_secret_access_key";
pub const KEY_CACHE_SESSION_TOKEN: &str = "asa.aws_session_token";
pub const KEY_CACHE_SESSION_EXPIRATION: &str = "asa.aws_session_expiration";

/// Role ARN fragments accepted for commercial and GovCloud partitions
pub const ROLE_ARN_MARKERS: [&str; 2] = ["arn:aws:iam::", "arn:aws-us-gov:iam::"];

/// Name of the SAML cache file for a given login URL digest
pub fn saml_cache_file_name(digest_hex: &str) -> String {
    format!("saml_cache_{digest_hex}.xml")
}

/// Get the AWS config file path
/// Respects AWS_CONFIG_FILE environment variable if set
pub fn get_aws_config_path() -> Option<PathBuf> {
    if let Ok(path) = env::var("AWS_CONFIG_FILE") {
        return Some(expand_home(&path));
    }

    dirs::home_dir().map(|home| home.join(AWS_CONFIG_DIR_NAME).join(AWS_CONFIG_FILE_NAME))
}

/// Get the AWS credentials file path
/// Respects AWS_SHARED_CREDENTIALS_FILE environment variable if set
pub fn get_aws_credentials_path() -> Option<PathBuf> {
    if let Ok(path) = env::var("AWS_SHARED_CREDENTIALS_FILE") {
        return Some(expand_home(&path));
    }

    dirs::home_dir().map(|home| {
        home.join(AWS_CONFIG_DIR_NAME)
            .join(AWS_CREDENTIALS_FILE_NAME)
    })
}

/// Expand a leading `~` the way the AWS CLI does for its file settings
fn expand_home(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => return PathBuf::from(path),
    };

    match dirs::home_dir() {
        Some(home) if rest.is_empty() => home,
        Some(home) => home.join(rest),
        None => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_saml_cache_file_name() {
        assert_eq!(saml_cache_file_name("abc123"), "saml_cache_abc123.xml");
    }

    #[test]
    fn test_expand_home_leaves_plain_paths() {
        assert_eq!(expand_home("/etc/aws/config"), PathBuf::from("/etc/aws/config"));
        assert_eq!(expand_home("~user/config"), PathBuf::from("~user/config"));
    }

    #[test]
    fn test_expand_home_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/.aws/config"), home.join(".aws/config"));
            assert_eq!(expand_home("~"), home);
        }
    }

    #[test]
    #[serial]
    fn test_get_aws_config_path_with_env() {
        let original = env::var("AWS_CONFIG_FILE").ok();

        unsafe {
            env::set_var("AWS_CONFIG_FILE", "/custom/aws/config");
        }
        let path = get_aws_config_path();
        assert_eq!(path, Some(PathBuf::from("/custom/aws/config")));

        unsafe {
            match original {
                Some(val) => env::set_var("AWS_CONFIG_FILE", val),
                None => env::remove_var("AWS_CONFIG_FILE"),
            }
        }
    }

    #[test]
    #[serial]
    fn test_get_aws_config_path_default() {
        let original = env::var("AWS_CONFIG_FILE").ok();

        unsafe {
            env::remove_var("AWS_CONFIG_FILE");
        }
        let path = get_aws_config_path();

        if let Some(p) = path {
            let path_str = p.to_string_lossy();
            assert!(path_str.contains(AWS_CONFIG_DIR_NAME));
            assert!(path_str.contains(AWS_CONFIG_FILE_NAME));
        }

        unsafe {
            if let Some(val) = original {
                env::set_var("AWS_CONFIG_FILE", val);
            }
        }
    }

    #[test]
    #[serial]
    fn test_get_aws_credentials_path_with_env() {
        let original = env::var("AWS_SHARED_CREDENTIALS_FILE").ok();

        unsafe {
            env::set_var("AWS_SHARED_CREDENTIALS_FILE", "/custom/path/credentials");
        }
        let path = get_aws_credentials_path();
        assert_eq!(path, Some(PathBuf::from("/custom/path/credentials")));

        unsafe {
            match original {
                Some(val) => env::set_var("AWS_SHARED_CREDENTIALS_FILE", val),
                None => env::remove_var("AWS_SHARED_CREDENTIALS_FILE"),
            }
        }
    }

    #[test]
    #[serial]
    fn test_get_aws_credentials_path_default() {
        let original = env::var("AWS_SHARED_CREDENTIALS_FILE").ok();

        unsafe {
            env::remove_var("AWS_SHARED_CREDENTIALS_FILE");
        }
        let path = get_aws_credentials_path();

        if let Some(p) = path {
            let path_str = p.to_string_lossy();
            assert!(path_str.contains(AWS_CONFIG_DIR_NAME));
            assert!(path_str.contains(AWS_CREDENTIALS_FILE_NAME));
        }

        unsafe {
            if let Some(val) = original {
                env::set_var("AWS_SHARED_CREDENTIALS_FILE", val);
            }
        }
    }
}
