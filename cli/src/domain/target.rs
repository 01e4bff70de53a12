//! The machine being provisioned and what it needs.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::domain::error::TargetError;

/// POSIX login names; interpolated into `/home/<user>` and the sudoers rule.
pub static USERNAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Safety: this is a compile-time constant pattern, cannot fail.
    #[allow(clippy::expect_used)]
    Regex::new(r"^[a-z_][a-z0-9_-]{0,31}$").expect("valid regex")
});

/// Guest additions releases; interpolated into a download URL and file name.
pub static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[0-9]+(\.[0-9]+)*$").expect("valid regex")
});

/// Connection and build parameters for one provisioning run.
#[derive(Clone)]
pub struct Target {
    host: String,
    port: u16,
    username: String,
    password: String,
    public_key_path: PathBuf,
    guest_additions_version: String,
}

impl Target {
    /// Validate and assemble a target.
    ///
    /// # Errors
    ///
    /// Returns a `TargetError` if the host is empty, or if the username or
    /// guest additions version would be unsafe to interpolate into a remote
    /// shell command.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
        public_key_path: impl Into<PathBuf>,
        guest_additions_version: impl Into<String>,
    ) -> Result<Self, TargetError> {
        let host = host.into();
        let username = username.into();
        let guest_additions_version = guest_additions_version.into();

        if host.trim().is_empty() {
            return Err(TargetError::EmptyHost);
        }
        if !USERNAME_RE.is_match(&username) {
            return Err(TargetError::InvalidUsername(username));
        }
        if !VERSION_RE.is_match(&guest_additions_version) {
            return Err(TargetError::InvalidVersion(guest_additions_version));
        }

        Ok(Self {
            host,
            port,
            username,
            password: password.into(),
            public_key_path: public_key_path.into(),
            guest_additions_version,
        })
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    #[must_use]
    pub fn public_key_path(&self) -> &Path {
        &self.public_key_path
    }

    #[must_use]
    pub fn guest_additions_version(&self) -> &str {
        &self.guest_additions_version
    }

    /// `/home/<user>/.ssh`
    #[must_use]
    pub fn ssh_dir(&self) -> String {
        format!("/home/{}/.ssh", self.username)
    }

    /// `/home/<user>/.ssh/authorized_keys`
    #[must_use]
    pub fn authorized_keys_path(&self) -> String {
        format!("{}/authorized_keys", self.ssh_dir())
    }

    /// Sudoers line granting the user passwordless root.
    #[must_use]
    pub fn sudoers_rule(&self) -> String {
        format!("{} ALL=(ALL) NOPASSWD: ALL", self.username)
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("public_key_path", &self.public_key_path)
            .field("guest_additions_version", &self.guest_additions_version)
            .finish()
    }
}

/// Resolve `--local-pkey` against `~/.ssh`. Absolute paths are kept as given
/// and `home_dir` is only consulted for relative names.
///
/// # Errors
///
/// `TargetError::NoHomeDirectory` if a relative name needs a home directory
/// and none is known.
pub fn resolve_public_key(
    name: &Path,
    home_dir: impl FnOnce() -> Option<PathBuf>,
) -> Result<PathBuf, TargetError> {
    if name.is_absolute() {
        return Ok(name.to_path_buf());
    }
    let home = home_dir().ok_or(TargetError::NoHomeDirectory)?;
    Ok(home.join(".ssh").join(name))
}
