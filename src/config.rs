//! Connection properties read from `waconn.ini`.
//!
//! ```ini
//! [WASERVER]
//! hosts = https://wa1:9443, https://wa2:9443
//! user = wauser
//! pwd = yourpassword
//! verify = false
//! ```
//!
//! The first load of a file that carries a plaintext `pwd` rewrites it: the
//! password moves to `key` in obfuscated form (see [`crate::obfuscate`]) and
//! `pwd` is removed. Later loads only read `key`.
//!
//! Key names are matched case-insensitively (`PWD` and `Hosts` work); the
//! section name is not.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use ini::{EscapePolicy, Ini, ParseOption, Properties, WriteOption};

use crate::{obfuscate, Result, WaError};

/// Section holding the connection properties.
pub const SECTION: &str = "WASERVER";

const PWD_HINT: &str = "; pwd = yourpassword";

#[derive(Clone, PartialEq, Eq)]
/// Connection properties for the Workload Automation server.
pub struct ConnectionConfig {
    pub user: String,
    pub password: String,
    /// Candidate base URLs, in failover order.
    pub hosts: Vec<String>,
    /// Whether TLS certificates are verified.
    pub verify: bool,
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("hosts", &self.hosts)
            .field("verify", &self.verify)
            .finish()
    }
}

impl ConnectionConfig {
    /// Builds a configuration in memory, bypassing the INI file.
    pub fn new<I, H>(hosts: I, user: impl Into<String>, password: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = H>,
        H: Into<String>,
    {
        Self {
            user: user.into(),
            password: password.into(),
            hosts: hosts.into_iter().map(Into::into).collect(),
            verify: true,
        }
    }

    /// Sets whether TLS certificates are verified.
    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Loads the `[WASERVER]` section of `path`.
    ///
    /// Migrates a plaintext `pwd` to an obfuscated `key` and rewrites the
    /// file when needed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut conf = load_ini(path)?;

        let section = conf.section(Some(SECTION)).ok_or_else(|| WaError::Config {
            path: path.to_path_buf(),
            message: format!("must have connection properties in {SECTION} section"),
        })?;

        let user = lookup(section, "user").unwrap_or_default().to_owned();
        let hosts = lookup(section, "hosts").map(parse_hosts).unwrap_or_default();
        let verify = lookup(section, "verify").map(parse_verify).unwrap_or(true);
        let plaintext = lookup(section, "pwd").map(str::to_owned);
        let stored_key = lookup(section, "key").map(str::to_owned);

        let password = match (plaintext, stored_key) {
            (Some(plain), _) => {
                migrate_plaintext_password(&mut conf, path, &plain)?;
                plain
            }
            (None, Some(encoded)) => obfuscate::decode(&encoded)?,
            (None, None) => String::new(),
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            path = %path.display(),
            hosts = hosts.len(),
            verify,
            "loaded connection properties"
        );

        Ok(Self {
            user,
            password,
            hosts,
            verify,
        })
    }
}

/// Reads an INI file without quote or escape processing, so credentials
/// are taken verbatim.
pub(crate) fn load_ini(path: &Path) -> Result<Ini> {
    let opt = ParseOption {
        enabled_quote: false,
        enabled_escape: false,
        ..ParseOption::default()
    };
    Ini::load_from_file_opt(path, opt).map_err(|err| match err {
        ini::Error::Io(source) => WaError::Io {
            path: path.to_path_buf(),
            source,
        },
        ini::Error::Parse(parse) => WaError::Config {
            path: path.to_path_buf(),
            message: parse.to_string(),
        },
    })
}

pub(crate) fn lookup<'a>(section: &'a Properties, name: &str) -> Option<&'a str> {
    section
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value)
}

/// Removes every spelling of `name` from `section`.
fn remove_key(section: &mut Properties, name: &str) {
    let spellings: Vec<String> = section
        .iter()
        .filter(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(key, _)| key.to_owned())
        .collect();
    for key in spellings {
        section.remove_all(&key).for_each(drop);
    }
}

fn migrate_plaintext_password(conf: &mut Ini, path: &Path, plain: &str) -> Result<()> {
    let section = conf
        .section_mut(Some(SECTION))
        .ok_or_else(|| WaError::Config {
            path: path.to_path_buf(),
            message: format!("must have connection properties in {SECTION} section"),
        })?;
    remove_key(section, "pwd");
    remove_key(section, "key");
    section.insert("key", obfuscate::encode(plain));

    let mut rendered = Vec::new();
    let opt = WriteOption {
        escape_policy: EscapePolicy::Nothing,
        ..WriteOption::default()
    };
    conf.write_to_opt(&mut rendered, opt)
        .map_err(|source| io_error(path, source))?;

    let header = format!("[{SECTION}]");
    let mut out = String::with_capacity(rendered.len() + PWD_HINT.len() + 1);
    for line in String::from_utf8_lossy(&rendered).lines() {
        out.push_str(line);
        out.push('\n');
        if line.trim() == header {
            out.push_str(PWD_HINT);
            out.push('\n');
        }
    }
    fs::write(path, out).map_err(|source| io_error(path, source))?;

    #[cfg(feature = "tracing")]
    tracing::info!(path = %path.display(), "stored password in obfuscated form");

    Ok(())
}

fn io_error(path: &Path, source: std::io::Error) -> WaError {
    WaError::Io {
        path: PathBuf::from(path),
        source,
    }
}

fn parse_hosts(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|host| host.trim().trim_end_matches('/'))
        .filter(|host| !host.is_empty())
        .map(str::to_owned)
        .collect()
}

fn parse_verify(raw: &str) -> bool {
    !matches!(raw.trim().to_lowercase().as_str(), "false" | "no" | "0")
}
