use std::{
    fs::{self, DirBuilder, OpenOptions},
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use sha1::{Digest, Sha1};
use tracing::{debug, info, warn};

use crate::{
    aws::{
        Credentials, TokenCache,
        credentials::{format_expiration, parse_expiration},
        is_valid_token_cache,
    },
    clock::{Clock, SystemClock},
    constants::{self, *},
    error::{ConfigError, InvalidConfig, Result},
    lock::FileLock,
    saml::is_valid_saml_assertion,
    store::{ProfileStore, write_private_file},
};

#[cfg(unix)]
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};

/// Locations of the shared AWS config and credentials files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsPaths {
    pub config_file: PathBuf,
    pub credentials_file: PathBuf,
}

impl AwsPaths {
    pub fn new(config_file: impl Into<PathBuf>, credentials_file: impl Into<PathBuf>) -> Self {
        Self {
            config_file: config_file.into(),
            credentials_file: credentials_file.into(),
        }
    }

    /// Resolve both files the way the AWS CLI does
    pub fn from_env() -> Option<Self> {
        Some(Self::new(
            constants::get_aws_config_path()?,
            constants::get_aws_credentials_path()?,
        ))
    }
}

/// Login options for one profile plus the SAML assertion and token caches.
///
/// Options are plain fields. The two caches are private and only come back out through
/// accessors that drop them as soon as they stop being valid.
#[derive(Debug, Clone)]
pub struct Configuration {
    pub ask_role: bool,
    pub duration: i64,
    pub auto_duration: bool,
    pub login_url: Option<String>,
    pub profile: String,
    pub region: Option<String>,
    pub role_arn: Option<String>,
    pub use_saml_cache: bool,
    pub resolve_aliases: bool,
    pub print_creds: bool,
    pub credential_process: bool,
    pub quiet: bool,
    pub account: String,
    pub port: u16,
    paths: AwsPaths,
    clock: Arc<dyn Clock>,
    saml_cache: Option<Vec<u8>>,
    token_cache: Option<TokenCache>,
}

impl Configuration {
    pub fn new(paths: AwsPaths) -> Self {
        Self {
            ask_role: true,
            duration: Self::max_duration(),
            auto_duration: false,
            login_url: None,
            profile: DEFAULT_PROFILE.to_string(),
            region: None,
            role_arn: None,
            use_saml_cache: true,
            resolve_aliases: true,
            print_creds: false,
            credential_process: false,
            quiet: false,
            account: String::new(),
            port: DEFAULT_PORT,
            paths,
            clock: Arc::new(SystemClock),
            saml_cache: None,
            token_cache: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub const fn max_duration() -> i64 {
        MAX_DURATION_SECONDS
    }

    /// Section name for `profile` in the config file.
    ///
    /// The config file prefixes every profile except the default one with `profile `;
    /// the credentials file never does.
    pub fn config_profile(profile: &str) -> String {
        if profile.eq_ignore_ascii_case(DEFAULT_PROFILE) {
            profile.to_string()
        } else {
            format!("profile {profile}")
        }
    }

    pub fn config_file(&self) -> &Path {
        &self.paths.config_file
    }

    pub fn credentials_file(&self) -> &Path {
        &self.paths.credentials_file
    }

    /// `saml_cache_<sha1(login_url)>.xml`, next to the credentials file
    pub fn saml_cache_file(&self) -> Result<PathBuf> {
        let login_url = self
            .login_url
            .as_deref()
            .ok_or(ConfigError::MissingLoginUrl)?;

        let digest = format!("{:x}", Sha1::digest(login_url.as_bytes()));
        let cache_name = constants::saml_cache_file_name(&digest);

        let credentials = self.credentials_file();
        let file_name = credentials
            .file_name()
            .map(|name| name.to_string_lossy())
            .filter(|name| name.contains(AWS_CREDENTIALS_FILE_NAME))
            .map_or(cache_name.clone(), |name| {
                name.replace(AWS_CREDENTIALS_FILE_NAME, &cache_name)
            });

        Ok(credentials.with_file_name(file_name))
    }

    /// Create both files, and their directories, when they don't exist yet.
    pub fn ensure_config_files_exist(&self) -> Result<()> {
        for file in [self.config_file(), self.credentials_file()] {
            if let Some(dir) = file.parent().filter(|d| !d.as_os_str().is_empty()) {
                if !dir.exists() {
                    create_private_dir(dir).map_err(|e| ConfigError::io(dir, e))?;
                    debug!("Created directory {}", dir.display());
                }
            }

            if !file.exists() {
                touch(file).map_err(|e| ConfigError::io(file, e))?;
                debug!("Created empty {}", file.display());
            }
        }

        Ok(())
    }

    /// The cached SAML assertion, if it is still valid. An invalid one is dropped.
    pub fn saml_cache(&mut self) -> Option<&[u8]> {
        if !is_valid_saml_assertion(self.saml_cache.as_deref(), self.clock.now()) {
            if self.saml_cache.take().is_some() {
                debug!("Invalid SAML cache, discarding");
            }
            return None;
        }

        self.saml_cache.as_deref()
    }

    pub fn set_saml_cache(&mut self, assertion: Option<Vec<u8>>) {
        self.saml_cache = assertion;
    }

    /// The cached credentials, if complete and unexpired. Anything else is dropped.
    pub fn token_cache(&mut self) -> Option<&TokenCache> {
        if !is_valid_token_cache(self.token_cache.as_ref(), self.clock.now()) {
            if self.token_cache.take().is_some() {
                debug!("Invalid token cache, discarding");
            }
            return None;
        }

        self.token_cache.as_ref()
    }

    /// Check the option invariants, reporting the first one broken.
    ///
    /// The SAML and token caches are not checked: a stale cache only means we log in again.
    pub fn raise_if_invalid(&self) -> Result<(), InvalidConfig> {
        if self.duration < MIN_DURATION_SECONDS {
            return Err(InvalidConfig::DurationTooShort(self.duration));
        }
        if self.duration > Self::max_duration() {
            return Err(InvalidConfig::DurationTooLong(self.duration));
        }

        if self.region.is_none() {
            return Err(InvalidConfig::MissingRegion);
        }

        if self.login_url.is_none() {
            return Err(InvalidConfig::MissingLoginUrl);
        }

        if let Some(role_arn) = &self.role_arn {
            if !ROLE_ARN_MARKERS
                .iter()
                .any(|marker| role_arn.contains(marker))
            {
                return Err(InvalidConfig::MalformedRoleArn(role_arn.clone()));
            }
        }

        Ok(())
    }

    /// Persist the options to the config file and, when given, `credentials` to the
    /// credentials file where the AWS CLI and SDKs pick them up.
    ///
    /// The two files are locked and written one after the other. A failure on the config
    /// file does not stop the credentials from being written; the first error is returned.
    pub fn write(&self, credentials: Option<&Credentials>) -> Result<()> {
        self.ensure_config_files_exist()?;
        self.require_profile()?;

        let config_result = self.write_config_section();
        if let Err(e) = &config_result {
            warn!("Failed to update {}: {}", self.config_file().display(), e);
        }

        let credentials_result = match credentials {
            Some(creds) => self.write_credentials_section(creds),
            None => Ok(()),
        };

        config_result.and(credentials_result)
    }

    fn write_config_section(&self) -> Result<()> {
        let path = self.config_file();
        let _lock = FileLock::acquire(path)?;

        let section = Self::config_profile(&self.profile);
        let mut store = ProfileStore::load(path)?;

        store.set_or_remove(&section, KEY_REGION, self.region.as_deref());
        store.set(&section, KEY_ASK_ROLE, self.ask_role.to_string());
        store.set(&section, KEY_DURATION, self.duration.to_string());
        store.set_or_remove(&section, KEY_LOGIN_URL, self.login_url.as_deref());
        store.set_or_remove(&section, KEY_ROLE_ARN, self.role_arn.as_deref());

        store.save(path)?;
        info!("Configuration saved to [{}] in {}", section, path.display());
        Ok(())
    }

    fn write_credentials_section(&self, creds: &Credentials) -> Result<()> {
        let path = self.credentials_file();
        let _lock = FileLock::acquire(path)?;

        let section = self.profile.as_str();
        let mut store = ProfileStore::load(path)?;

        store.set(section, KEY_AWS_ACCESS_KEY_ID, &creds.access_key_id);
        store.set(section, KEY_AWS_SECRET_ACCESS_KEY, &creds.secret_access_key);
        store.set(section, KEY_AWS_SECURITY_TOKEN, &creds.session_token);
        store.set(
            section,
            KEY_AWS_SESSION_EXPIRATION,
            format_expiration(&creds.expiration),
        );
        store.set(section, KEY_AWS_SESSION_TOKEN, &creds.session_token);

        store.save(path)?;
        info!("Credentials saved to profile: {}", section);
        Ok(())
    }

    /// Write the in-memory SAML assertion, if any, over the SAML cache file.
    pub fn write_saml_cache(&self) -> Result<()> {
        self.ensure_config_files_exist()?;

        let Some(assertion) = &self.saml_cache else {
            debug!("No SAML assertion in memory, cache file left alone");
            return Ok(());
        };

        let path = self.saml_cache_file()?;
        let _lock = FileLock::acquire(&path)?;
        write_private_file(&path, assertion)?;

        info!("SAML assertion cached in {}", path.display());
        Ok(())
    }

    /// Store `creds` as this tool's own token cache for the profile.
    ///
    /// Uses `asa.`-prefixed keys so the standard credential keys other tools read are
    /// never touched.
    pub fn write_token_cache(&mut self, creds: &Credentials) -> Result<()> {
        self.require_profile()?;
        self.ensure_config_files_exist()?;

        {
            let path = self.credentials_file();
            let _lock = FileLock::acquire(path)?;

            let section = self.profile.as_str();
            let mut store = ProfileStore::load(path)?;

            store.set(section, KEY_CACHE_ACCESS_KEY_ID, &creds.access_key_id);
            store.set(section, KEY_CACHE_SECRET_ACCESS_KEY, &creds.secret_access_key);
            store.set(
                section,
                KEY_CACHE_SESSION_EXPIRATION,
                format_expiration(&creds.expiration),
            );
            store.set(section, KEY_CACHE_SESSION_TOKEN, &creds.session_token);

            store.save(path)?;
            debug!("Token cache saved for profile: {}", section);
        }

        self.token_cache = Some(TokenCache::from(creds));
        Ok(())
    }

    /// Merge the saved options for `profile` over the current values.
    ///
    /// Only keys present on disk replace what is in memory; missing or undecodable values
    /// leave the current value alone. Credentials are never read here.
    pub fn read(&mut self, profile: &str) -> Result<()> {
        self.ensure_config_files_exist()?;

        let section = Self::config_profile(profile);
        let store = ProfileStore::load(self.config_file())?;

        if !store.has_section(&section) {
            debug!(
                "No [{}] in {}, keeping defaults",
                section,
                self.config_file().display()
            );
            return Ok(());
        }

        self.profile = profile.to_string();

        if let Some(ask_role) = read_bool(&store, &section, KEY_ASK_ROLE) {
            self.ask_role = ask_role;
        }
        if let Some(duration) = read_int(&store, &section, KEY_DURATION) {
            self.duration = duration;
        }
        if let Some(login_url) = read_string(&store, &section, KEY_LOGIN_URL) {
            self.login_url = Some(login_url);
        }
        if let Some(region) = read_string(&store, &section, KEY_REGION) {
            self.region = Some(region);
        }
        if let Some(role_arn) = read_string(&store, &section, KEY_ROLE_ARN) {
            self.role_arn = Some(role_arn);
        }
        if let Some(account) = read_string(&store, &section, KEY_ACCOUNT) {
            self.account = account;
        }

        debug!("Loaded [{}] from {}", section, self.config_file().display());
        Ok(())
    }

    /// Load the SAML cache file for `login_url` into memory.
    ///
    /// Without a login URL there is nothing to look up. A missing or unreadable file just
    /// means there is no cache.
    pub fn read_saml_cache(&mut self) {
        if self.login_url.is_none() {
            return;
        }

        let path = match self.saml_cache_file() {
            Ok(path) => path,
            Err(e) => {
                info!("SAML cache unavailable: {}", e);
                return;
            }
        };

        match fs::read(&path) {
            Ok(contents) => {
                debug!("Read SAML cache from {}", path.display());
                self.saml_cache = Some(contents);
            }
            Err(e) => info!("SAML cache failed to read {}: {}", path.display(), e),
        }
    }

    /// Load this tool's token cache for the profile from the credentials file.
    pub fn read_token_cache(&mut self) -> Result<()> {
        self.require_profile()?;

        let store = ProfileStore::load(self.credentials_file())?;
        let section = self.profile.as_str();

        if !store.has_section(section) {
            debug!("No token cache for profile: {}", section);
            return Ok(());
        }

        let expiration = read_string(&store, section, KEY_CACHE_SESSION_EXPIRATION).and_then(
            |raw| {
                let parsed = parse_expiration(&raw);
                if parsed.is_none() {
                    warn!("Ignoring malformed {} '{}'", KEY_CACHE_SESSION_EXPIRATION, raw);
                }
                parsed
            },
        );

        self.token_cache = Some(TokenCache {
            access_key_id: read_string(&store, section, KEY_CACHE_ACCESS_KEY_ID),
            secret_access_key: read_string(&store, section, KEY_CACHE_SECRET_ACCESS_KEY),
            session_token: read_string(&store, section, KEY_CACHE_SESSION_TOKEN),
            expiration,
        });
        Ok(())
    }

    fn require_profile(&self) -> Result<()> {
        if self.profile.trim().is_empty() {
            return Err(ConfigError::MissingProfile);
        }
        Ok(())
    }
}

fn read_string(store: &ProfileStore, section: &str, key: &str) -> Option<String> {
    store
        .get(section, key)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn read_bool(store: &ProfileStore, section: &str, key: &str) -> Option<bool> {
    let raw = read_string(store, section, key)?;
    let parsed = parse_bool(&raw);
    if parsed.is_none() {
        warn!("Ignoring [{}] {} = '{}': not a boolean", section, key, raw);
    }
    parsed
}

fn read_int(store: &ProfileStore, section: &str, key: &str) -> Option<i64> {
    let raw = read_string(store, section, key)?;
    let parsed = raw.parse().ok();
    if parsed.is_none() {
        warn!("Ignoring [{}] {} = '{}': not an integer", section, key, raw);
    }
    parsed
}

/// Boolean spellings accepted in INI files
fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "yes" | "true" | "on" => Some(true),
        "0" | "no" | "false" | "off" => Some(false),
        _ => None,
    }
}

fn create_private_dir(dir: &Path) -> io::Result<()> {
    let mut builder = DirBuilder::new();
    builder.recursive(true);

    #[cfg(unix)]
    {
        builder.mode(0o700);
    }

    builder.create(dir)
}

fn touch(file: &Path) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.create(true).append(true);

    #[cfg(unix)]
    {
        options.mode(0o600);
    }

    options.open(file).map(drop)
}
