//! Remote command results and how they are judged.
//!
//! Pure functions only: the transport reports a raw `Completion`, and
//! `classify` turns it into success, a tolerated failure, or an error
//! according to the `Tolerance` the call site declared.

use std::fmt;

use crate::domain::error::{BoxError, RemoteError};

/// Which non-success outcomes a call site accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tolerance {
    /// Only exit status 0 is success.
    #[default]
    Strict,
    /// Any exit status or terminating signal is acceptable; a lost channel is
    /// still fatal.
    NonZeroExit,
    /// Anything goes, including the connection dropping mid-command.
    NonZeroExitOrDisconnect,
}

impl Tolerance {
    fn accepts_exit(self) -> bool {
        matches!(self, Self::NonZeroExit | Self::NonZeroExitOrDisconnect)
    }

    fn accepts_disconnect(self) -> bool {
        matches!(self, Self::NonZeroExitOrDisconnect)
    }
}

/// Captured result of a command that ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_status: u32,
    pub stdout: String,
    pub stderr: String,
}

/// What the transport observed.
#[derive(Debug)]
pub enum Completion {
    /// The remote side reported an exit status.
    Exited(CommandOutput),
    /// The remote process was terminated by a signal.
    Signaled { signal: String, output: CommandOutput },
    /// The channel went away before an exit status arrived.
    ChannelLost { reason: BoxError },
}

/// A non-success outcome the call site declared acceptable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToleratedFailure {
    pub command: String,
    pub kind: ToleratedKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToleratedKind {
    NonZeroExit { status: u32, stderr: String },
    Signaled { signal: String },
    Disconnected { reason: String },
}

impl fmt::Display for ToleratedFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ToleratedKind::NonZeroExit { status, .. } => {
                write!(f, "{} exited with non-zero code {status}", self.command)
            }
            ToleratedKind::Signaled { signal } => {
                write!(f, "{} was killed by signal {signal}", self.command)
            }
            ToleratedKind::Disconnected { reason } => {
                write!(f, "{} dropped the connection ({reason})", self.command)
            }
        }
    }
}

/// Non-fatal result of one remote command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Succeeded(CommandOutput),
    Tolerated(ToleratedFailure),
}

impl CommandOutcome {
    /// The tolerated failure, if this outcome is one.
    #[must_use]
    pub fn into_tolerated(self) -> Option<ToleratedFailure> {
        match self {
            Self::Succeeded(_) => None,
            Self::Tolerated(failure) => Some(failure),
        }
    }
}

/// Judge a completed remote command against the declared tolerance.
///
/// # Errors
///
/// `RemoteError::CommandFailed` for a non-zero exit under `Strict`,
/// `RemoteError::Killed` for a signal-terminated command under `Strict`, and
/// `RemoteError::Transport` for a lost channel unless disconnects are tolerated.
pub fn classify(
    command: &str,
    completion: Completion,
    tolerance: Tolerance,
) -> Result<CommandOutcome, RemoteError> {
    match completion {
        Completion::Exited(output) if output.exit_status == 0 => {
            Ok(CommandOutcome::Succeeded(output))
        }
        Completion::Exited(output) if tolerance.accepts_exit() => {
            Ok(CommandOutcome::Tolerated(ToleratedFailure {
                command: command.to_owned(),
                kind: ToleratedKind::NonZeroExit {
                    status: output.exit_status,
                    stderr: output.stderr,
                },
            }))
        }
        Completion::Exited(output) => Err(RemoteError::CommandFailed {
            command: command.to_owned(),
            status: output.exit_status,
            stdout: output.stdout,
            stderr: output.stderr,
        }),
        Completion::Signaled { signal, .. } if tolerance.accepts_exit() => {
            Ok(CommandOutcome::Tolerated(ToleratedFailure {
                command: command.to_owned(),
                kind: ToleratedKind::Signaled { signal },
            }))
        }
        Completion::Signaled { signal, output } => Err(RemoteError::Killed {
            command: command.to_owned(),
            signal,
            stderr: output.stderr,
        }),
        Completion::ChannelLost { reason } if tolerance.accepts_disconnect() => {
            Ok(CommandOutcome::Tolerated(ToleratedFailure {
                command: command.to_owned(),
                kind: ToleratedKind::Disconnected {
                    reason: reason.to_string(),
                },
            }))
        }
        Completion::ChannelLost { reason } => Err(RemoteError::Transport {
            command: command.to_owned(),
            source: reason,
        }),
    }
}

// ── Shell wrapping ────────────────────────────────────────────────────────────

/// Quote `s` as a single POSIX shell word.
#[must_use]
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Wire form of a command run through `sudo`.
///
/// `sudo -S` reads the password from stdin with an empty prompt. The inner
/// shell then detaches stdin so leftover password bytes never reach `command`.
#[must_use]
pub fn privileged_command(command: &str) -> String {
    let script = format!("exec </dev/null; {command}");
    format!("sudo -S -p '' sh -c {}", shell_quote(&script))
}

/// Wire form of an upload: stdin lands in a sibling temp file that is then
/// renamed over `remote_path`, replacing any existing file even if read-only.
#[must_use]
pub fn upload_command(remote_path: &str) -> String {
    let staging = shell_quote(&format!("{remote_path}.upload"));
    format!(
        "cat > {staging} && mv -f {staging} {}",
        shell_quote(remote_path)
    )
}
