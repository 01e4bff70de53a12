//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::application`,
//! `tokio`, or `russh`. Transport errors cross the boundary boxed.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::step::Step;

/// Opaque transport error raised by the remote execution channel.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// ── Remote command errors ─────────────────────────────────────────────────────

/// Failure of a single remote operation that the caller did not tolerate.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("`{command}` exited with status {status}{}", describe_output(.stdout, .stderr))]
    CommandFailed {
        command: String,
        status: u32,
        stdout: String,
        stderr: String,
    },

    #[error("`{command}` was killed by signal {signal}{}", describe_output("", .stderr))]
    Killed {
        command: String,
        signal: String,
        stderr: String,
    },

    #[error("lost the remote channel while running `{command}`")]
    Transport {
        command: String,
        #[source]
        source: BoxError,
    },

    #[error("cannot read local file {}", .path.display())]
    LocalFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RemoteError {
    /// Exit status of the failed command, if it ran to completion.
    #[must_use]
    pub fn status(&self) -> Option<u32> {
        match self {
            Self::CommandFailed { status, .. } => Some(*status),
            Self::Killed { .. } | Self::Transport { .. } | Self::LocalFile { .. } => None,
        }
    }
}

fn describe_output(stdout: &str, stderr: &str) -> String {
    let detail = if stderr.trim().is_empty() { stdout } else { stderr };
    let detail = detail.trim();
    if detail.is_empty() {
        String::new()
    } else {
        format!(": {detail}")
    }
}

// ── Provisioning errors ───────────────────────────────────────────────────────

/// Terminal failure of a provisioning run.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("cannot connect to {host}:{port}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: BoxError,
    },

    #[error("password authentication failed for user '{username}'")]
    Authentication { username: String },

    #[error("step '{step}' failed")]
    Step {
        step: Step,
        #[source]
        source: RemoteError,
    },
}

impl ProvisionError {
    /// The step that was running when the failure happened.
    #[must_use]
    pub fn step(&self) -> Option<Step> {
        match self {
            Self::Step { step, .. } => Some(*step),
            Self::Connect { .. } | Self::Authentication { .. } => None,
        }
    }
}

// ── Target errors ─────────────────────────────────────────────────────────────

/// Rejected provisioning target parameters.
#[derive(Debug, Error)]
pub enum TargetError {
    #[error("invalid username '{0}': must match ^[a-z_][a-z0-9_-]{{0,31}}$")]
    InvalidUsername(String),

    #[error("invalid guest additions version '{0}': expected a dotted number such as 6.1.32")]
    InvalidVersion(String),

    #[error("host must not be empty")]
    EmptyHost,

    #[error("cannot determine home directory to resolve the public key")]
    NoHomeDirectory,
}
