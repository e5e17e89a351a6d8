use std::{
    fmt,
    fs::{self, OpenOptions},
    io::{self, Write},
    path::Path,
};

use ini::{Ini, ParseOption, Properties};
use tracing::debug;

use crate::error::{ConfigError, Result};

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

const CONTINUATION_INDENT: &str = "    ";

/// Ordered section -> key -> value view of an AWS-style INI file.
///
/// Values are kept raw: no quote stripping or escape processing on either side, so
/// whatever the AWS CLI wrote is what we read back and write out again.
///
/// Indented continuation lines belong to the key above them. Nested AWS CLI settings
/// such as an `s3 =` block are held as one multi-line value and written back indented.
#[derive(Debug, Clone, Default)]
pub struct ProfileStore {
    ini: Ini,
}

impl ProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `path`. A missing file is an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("{} does not exist, starting empty", path.display());
                return Ok(Self::new());
            }
            Err(e) => return Err(ConfigError::io(path, e)),
        };

        Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(text: &str) -> Result<Self, ini::ParseError> {
        let ini = Ini::load_from_str_opt(text, parse_option())?;
        Ok(Self { ini })
    }

    /// Write the store to `path`, replacing its contents.
    /// A file that does not exist yet is created readable by the owner only.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_private_file(path, self.to_string().as_bytes())
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.ini.section(Some(section)).is_some()
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.ini.get_from(Some(section), key)
    }

    /// Set `key` in `section`, creating the section when needed.
    pub fn set(&mut self, section: &str, key: &str, value: impl Into<String>) {
        self.ini.with_section(Some(section)).set(key, value);
    }

    pub fn remove(&mut self, section: &str, key: &str) -> Option<String> {
        self.ini.delete_from(Some(section), key)
    }

    /// Set `key` when `value` is present, otherwise drop it from the section.
    pub fn set_or_remove(&mut self, section: &str, key: &str, value: Option<&str>) {
        match value {
            Some(v) => self.set(section, key, v),
            None => {
                self.ensure_section(section);
                self.remove(section, key);
            }
        }
    }

    pub fn ensure_section(&mut self, section: &str) {
        self.ini
            .entry(Some(section.to_string()))
            .or_insert_with(Properties::new);
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.ini.sections().flatten()
    }
}

impl fmt::Display for ProfileStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (section, props) in self.ini.iter() {
            if !props.is_empty() {
                if first {
                    first = false;
                } else {
                    writeln!(f)?;
                }
            }

            if let Some(name) = section {
                writeln!(f, "[{name}]")?;
            }
            for (key, value) in props.iter() {
                write_entry(f, key, value)?;
            }
        }
        Ok(())
    }
}

/// A multi-line value starts on the line after its key, one indented line per entry.
fn write_entry(f: &mut fmt::Formatter<'_>, key: &str, value: &str) -> fmt::Result {
    if !value.contains('\n') {
        return writeln!(f, "{key}={value}");
    }

    writeln!(f, "{key}=")?;
    for line in value.lines() {
        if line.is_empty() {
            writeln!(f)?;
        } else {
            writeln!(f, "{CONTINUATION_INDENT}{line}")?;
        }
    }
    Ok(())
}

/// Replace the contents of `path` in place, creating it with mode `0600` if absent.
pub(crate) fn write_private_file(path: &Path, contents: &[u8]) -> Result<()> {
    let mut options = OpenOptions::new();
    options.create(true).write(true).truncate(true);

    #[cfg(unix)]
    {
        options.mode(0o600);
    }

    let mut file = options.open(path).map_err(|e| ConfigError::io(path, e))?;
    file.write_all(contents)
        .and_then(|()| file.flush())
        .map_err(|e| ConfigError::io(path, e))
}

fn parse_option() -> ParseOption {
    ParseOption {
        enabled_quote: false,
        enabled_escape: false,
        enabled_indented_mutiline_value: true,
        ..ParseOption::default()
    }
}
