//! The fixed provisioning sequence.
//!
//! Steps carry no dependency model: `Step::ALL` is the only order they are
//! ever executed in, and later steps rely on the side effects of earlier ones.

use std::fmt;

use crate::domain::remote::ToleratedFailure;

/// One named stage of the base box build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Install the operator's public key as the user's `authorized_keys`.
    InstallPublicKey,
    /// Grant the user passwordless sudo.
    ///
    /// Not idempotent: every run appends another rule to `/etc/sudoers`.
    EnablePasswordlessElevation,
    /// `apt update` followed by `apt -y upgrade`.
    UpgradePackages,
    /// Disable reverse DNS lookups in sshd and reload it.
    HardenSshDaemon,
    /// Build and install the VirtualBox guest additions.
    InstallGuestDrivers,
    /// Drop package caches and power the VM off.
    CleanUpAndPowerOff,
}

impl Step {
    /// Execution order.
    pub const ALL: [Step; 6] = [
        Step::InstallPublicKey,
        Step::EnablePasswordlessElevation,
        Step::UpgradePackages,
        Step::HardenSshDaemon,
        Step::InstallGuestDrivers,
        Step::CleanUpAndPowerOff,
    ];

    /// Stable identifier used in logs and error messages.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::InstallPublicKey => "install-public-key",
            Self::EnablePasswordlessElevation => "enable-passwordless-sudo",
            Self::UpgradePackages => "upgrade-packages",
            Self::HardenSshDaemon => "harden-sshd",
            Self::InstallGuestDrivers => "install-guest-additions",
            Self::CleanUpAndPowerOff => "clean-up-and-power-off",
        }
    }

    /// Progress message shown while the step runs.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::InstallPublicKey => "setting up SSH connectivity...",
            Self::EnablePasswordlessElevation => "setting up passwordless sudo...",
            Self::UpgradePackages => "upgrading software...",
            Self::HardenSshDaemon => "configuring sshd service...",
            Self::InstallGuestDrivers => "installing guest additions...",
            Self::CleanUpAndPowerOff => "cleaning up...",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Non-fatal result of a step. Fatal failures travel as `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Completed,
    CompletedWithWarnings(Vec<ToleratedFailure>),
}

impl StepOutcome {
    #[must_use]
    pub fn from_warnings(warnings: Vec<ToleratedFailure>) -> Self {
        if warnings.is_empty() {
            Self::Completed
        } else {
            Self::CompletedWithWarnings(warnings)
        }
    }

    #[must_use]
    pub fn warnings(&self) -> &[ToleratedFailure] {
        match self {
            Self::Completed => &[],
            Self::CompletedWithWarnings(warnings) => warnings,
        }
    }
}
