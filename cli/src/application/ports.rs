//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`,
//! `crate::cli`, or `crate::output`.

use std::path::Path;

use crate::domain::{CommandOutcome, RemoteError, Tolerance};

// ── Remote Session Port ───────────────────────────────────────────────────────

/// An authenticated connection to the machine being provisioned.
///
/// Every command call declares a `Tolerance`; a non-zero exit or a lost
/// channel outside that tolerance comes back as `Err`.
#[allow(async_fn_in_trait)]
pub trait RemoteSession {
    /// Run a command as the login user.
    async fn run(
        &self,
        command: &str,
        tolerance: Tolerance,
    ) -> Result<CommandOutcome, RemoteError>;

    /// Run a command as root, answering the sudo prompt with the stored password.
    async fn run_privileged(
        &self,
        command: &str,
        tolerance: Tolerance,
    ) -> Result<CommandOutcome, RemoteError>;

    /// Copy a local file to `remote_path`, replacing whatever is there.
    async fn upload(&self, local_path: &Path, remote_path: &str) -> Result<(), RemoteError>;

    /// Disconnect. Failures are logged, never returned.
    async fn close(&self);
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait, no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}
