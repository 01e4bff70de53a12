//! Tests for the scoped mount handling of the guest additions step.

#![allow(clippy::expect_used)]

use basebox_provisioner::application::services::provision::provision;
use basebox_provisioner::domain::{ProvisionError, RemoteError, Step, Tolerance, ToleratedKind};

use crate::mocks::{MockSession, RecordingReporter, Reply, vagrant_target};

const INSTALL: &str = "sh /media/VBoxGuestAdditions/VBoxLinuxAdditions.run";
const MOUNT: &str = "mount -o loop,ro VBoxGuestAdditions_6.1.32.iso /media/VBoxGuestAdditions";
const REMOVE_ISO: &str = "rm -f VBoxGuestAdditions_6.1.32.iso";
const UMOUNT: &str = "umount /media/VBoxGuestAdditions";
const RMDIR: &str = "rmdir /media/VBoxGuestAdditions";

fn assert_teardown_after_install(session: &MockSession) {
    let install = session.position(INSTALL).expect("installer ran");
    let rm = session.position(REMOVE_ISO).expect("iso removed");
    let umount = session.position(UMOUNT).expect("unmounted");
    let rmdir = session.position(RMDIR).expect("mount point removed");
    assert!(install < rm && rm < umount && umount < rmdir);
}

#[tokio::test]
async fn installer_runs_with_non_zero_exit_tolerance() {
    let session = MockSession::new();
    let reporter = RecordingReporter::default();
    provision(&session, &vagrant_target(), &reporter)
        .await
        .expect("provisioning succeeds");

    assert_eq!(session.tolerance_of(INSTALL), Some(Tolerance::NonZeroExit));
    assert_eq!(session.tolerance_of(MOUNT), Some(Tolerance::Strict));
}

#[tokio::test]
async fn non_zero_installer_exit_is_a_warning_and_teardown_still_runs() {
    let session = MockSession::new().reply(INSTALL, Reply::Exit(2));
    let reporter = RecordingReporter::default();

    let report = provision(&session, &vagrant_target(), &reporter)
        .await
        .expect("installer warnings are tolerated");

    assert_teardown_after_install(&session);
    assert_eq!(report.completed, Step::ALL.to_vec());
    assert_eq!(report.tolerated.len(), 1);
    assert_eq!(report.tolerated[0].command, INSTALL);
    assert!(matches!(
        report.tolerated[0].kind,
        ToleratedKind::NonZeroExit { status: 2, .. }
    ));
    assert_eq!(
        reporter.warnings(),
        vec![format!("{INSTALL} exited with non-zero code 2")]
    );
}

#[tokio::test]
async fn lost_channel_during_install_still_tears_down_then_fails() {
    let session = MockSession::new().reply(INSTALL, Reply::Lost);
    let reporter = RecordingReporter::default();

    let err = provision(&session, &vagrant_target(), &reporter)
        .await
        .expect_err("transport loss is fatal");

    assert_teardown_after_install(&session);
    match err {
        ProvisionError::Step {
            step: Step::InstallGuestDrivers,
            source: RemoteError::Transport { command, .. },
        } => assert_eq!(command, INSTALL),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!session.was_called("apt-get -y autoremove"));
}

#[tokio::test]
async fn installer_error_wins_over_teardown_error() {
    let session = MockSession::new()
        .reply(INSTALL, Reply::Lost)
        .reply(UMOUNT, Reply::Exit(32));
    let reporter = RecordingReporter::default();

    let err = provision(&session, &vagrant_target(), &reporter)
        .await
        .expect_err("fatal");

    assert!(matches!(
        err,
        ProvisionError::Step {
            source: RemoteError::Transport { .. },
            ..
        }
    ));
    assert!(session.was_called(RMDIR));
}

#[tokio::test]
async fn failed_unmount_is_reported_after_every_teardown_command_ran() {
    let session = MockSession::new().reply(UMOUNT, Reply::Exit(32));
    let reporter = RecordingReporter::default();

    let err = provision(&session, &vagrant_target(), &reporter)
        .await
        .expect_err("unmount failure is fatal");

    match err {
        ProvisionError::Step {
            step: Step::InstallGuestDrivers,
            source: RemoteError::CommandFailed { command, status, .. },
        } => {
            assert_eq!(command, UMOUNT);
            assert_eq!(status, 32);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(session.was_called(RMDIR));
    assert!(!session.was_called("apt-get -y autoremove"));
}

#[tokio::test]
async fn failed_mount_skips_installer_and_teardown() {
    let session = MockSession::new().reply(MOUNT, Reply::Exit(32));
    let reporter = RecordingReporter::default();

    let err = provision(&session, &vagrant_target(), &reporter)
        .await
        .expect_err("mount failure is fatal");

    assert_eq!(err.step(), Some(Step::InstallGuestDrivers));
    assert!(!session.was_called(INSTALL));
    assert!(!session.was_called(UMOUNT));
}
