//! Application service: the six provisioning step actions.
//!
//! Each action talks to the VM only through the injected `RemoteSession`
//! and returns a `StepOutcome`; tolerated command failures are collected,
//! anything else aborts the step with a `RemoteError`.

use crate::application::ports::RemoteSession;
use crate::domain::guest_additions::{BUILD_DEPS_INSTALL, GuestAdditions, MOUNT_POINT};
use crate::domain::remote::shell_quote;
use crate::domain::{
    CommandOutcome, RemoteError, Step, StepOutcome, Target, Tolerance, ToleratedFailure,
};

pub const SUDOERS: &str = "/etc/sudoers";
pub const SSHD_CONFIG: &str = "/etc/ssh/sshd_config";

/// Run one step's action against the session.
///
/// # Errors
///
/// Returns the first `RemoteError` the step did not tolerate.
pub async fn execute(
    step: Step,
    session: &impl RemoteSession,
    target: &Target,
) -> Result<StepOutcome, RemoteError> {
    match step {
        Step::InstallPublicKey => install_public_key(session, target).await,
        Step::EnablePasswordlessElevation => enable_passwordless_sudo(session, target).await,
        Step::UpgradePackages => upgrade_packages(session).await,
        Step::HardenSshDaemon => harden_sshd(session).await,
        Step::InstallGuestDrivers => install_guest_additions(session, target).await,
        Step::CleanUpAndPowerOff => clean_up_and_power_off(session).await,
    }
}

/// Tolerated failures seen while a step runs.
#[derive(Default)]
struct Warnings(Vec<ToleratedFailure>);

impl Warnings {
    fn note(&mut self, outcome: CommandOutcome) {
        if let Some(failure) = outcome.into_tolerated() {
            self.0.push(failure);
        }
    }

    fn finish(self) -> StepOutcome {
        StepOutcome::from_warnings(self.0)
    }
}

async fn user(session: &impl RemoteSession, command: &str) -> Result<(), RemoteError> {
    session.run(command, Tolerance::Strict).await.map(drop)
}

async fn root(session: &impl RemoteSession, command: &str) -> Result<(), RemoteError> {
    session
        .run_privileged(command, Tolerance::Strict)
        .await
        .map(drop)
}

// ── Steps ─────────────────────────────────────────────────────────────────────

async fn install_public_key(
    session: &impl RemoteSession,
    target: &Target,
) -> Result<StepOutcome, RemoteError> {
    let ssh_dir = target.ssh_dir();
    let authorized_keys = target.authorized_keys_path();

    user(session, &format!("mkdir -p {ssh_dir}")).await?;
    user(session, &format!("chmod -R 750 {ssh_dir}")).await?;
    session
        .upload(target.public_key_path(), &authorized_keys)
        .await?;
    user(session, &format!("chmod 400 {authorized_keys}")).await?;
    Ok(StepOutcome::Completed)
}

/// Appends unconditionally; a second run leaves a duplicate rule behind.
async fn enable_passwordless_sudo(
    session: &impl RemoteSession,
    target: &Target,
) -> Result<StepOutcome, RemoteError> {
    root(session, &format!("chmod 660 {SUDOERS}")).await?;
    let appended = root(
        session,
        &format!("echo {} >> {SUDOERS}", shell_quote(&target.sudoers_rule())),
    )
    .await;
    // sudoers must not stay group-writable, even if the append failed.
    let restored = root(session, &format!("chmod 440 {SUDOERS}")).await;
    match (appended, restored) {
        (Ok(_), Ok(_)) => Ok(StepOutcome::Completed),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), restored) => {
            if let Err(restore) = restored {
                tracing::warn!(error = %restore, "restoring {SUDOERS} permissions failed");
            }
            Err(e)
        }
    }
}

async fn upgrade_packages(session: &impl RemoteSession) -> Result<StepOutcome, RemoteError> {
    root(session, "apt update").await?;
    root(session, "apt -y upgrade").await?;
    Ok(StepOutcome::Completed)
}

async fn harden_sshd(session: &impl RemoteSession) -> Result<StepOutcome, RemoteError> {
    root(session, &format!("sed -i '/^UseDNS/d' {SSHD_CONFIG}")).await?;
    root(session, &format!("echo 'UseDNS no' >> {SSHD_CONFIG}")).await?;
    root(session, "systemctl reload sshd.service").await?;
    Ok(StepOutcome::Completed)
}

/// Once the ISO is mounted, teardown runs no matter how the installer ends.
async fn install_guest_additions(
    session: &impl RemoteSession,
    target: &Target,
) -> Result<StepOutcome, RemoteError> {
    let additions = GuestAdditions::new(target.guest_additions_version());
    let iso = additions.iso_name();

    root(session, BUILD_DEPS_INSTALL).await?;
    user(session, &format!("wget {}", additions.download_url())).await?;
    root(session, &format!("mkdir -p {MOUNT_POINT}")).await?;
    root(session, &format!("mount -o loop,ro {iso} {MOUNT_POINT}")).await?;

    // The installer exits non-zero on harmless warnings.
    let installed = session
        .run_privileged(
            &format!("sh {}", additions.installer_path()),
            Tolerance::NonZeroExit,
        )
        .await;
    let torn_down = tear_down_mount(session, &iso).await;

    match (installed, torn_down) {
        (Ok(outcome), Ok(())) => {
            let mut warnings = Warnings::default();
            warnings.note(outcome);
            Ok(warnings.finish())
        }
        (Ok(_), Err(e)) => Err(e),
        (Err(e), torn_down) => {
            if let Err(teardown) = torn_down {
                tracing::warn!(error = %teardown, "guest additions teardown failed");
            }
            Err(e)
        }
    }
}

/// Remove the ISO, unmount, drop the mount point. Every command is
/// attempted; the first failure is returned.
async fn tear_down_mount(session: &impl RemoteSession, iso: &str) -> Result<(), RemoteError> {
    let results = [
        user(session, &format!("rm -f {iso}")).await,
        root(session, &format!("umount {MOUNT_POINT}")).await,
        root(session, &format!("rmdir {MOUNT_POINT}")).await,
    ];
    results.into_iter().collect()
}

async fn clean_up_and_power_off(session: &impl RemoteSession) -> Result<StepOutcome, RemoteError> {
    root(session, "apt-get -y autoremove").await?;
    root(session, "apt-get clean all").await?;

    // A successful poweroff usually kills the session before it can answer.
    let mut warnings = Warnings::default();
    warnings.note(
        session
            .run_privileged("poweroff", Tolerance::NonZeroExitOrDisconnect)
            .await?,
    );
    Ok(warnings.finish())
}
