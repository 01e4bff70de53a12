//! Infrastructure implementation of the `RemoteSession` port.
//!
//! `SshSession` is the production implementation over `russh`: one
//! authenticated connection, one channel per command, password login and
//! `sudo -S` password elevation.

use std::path::Path;
use std::sync::Arc;

use russh::client::{self, Handle};
use russh::keys::ssh_key::{HashAlg, PublicKey};
use russh::{ChannelMsg, Disconnect};

use crate::application::ports::RemoteSession;
use crate::domain::remote::{privileged_command, upload_command};
use crate::domain::{
    CommandOutcome, CommandOutput, Completion, ProvisionError, RemoteError, Target, Tolerance,
    classify,
};

/// Stderr stream id in SSH extended data messages.
const SSH_EXTENDED_DATA_STDERR: u32 = 1;

/// Accepts whatever host key a freshly installed VM presents.
///
/// The box is brand new, so there is nothing to pin against; the
/// fingerprint is logged for the operator.
struct FreshHostKeys;

impl client::Handler for FreshHostKeys {
    type Error = russh::Error;

    async fn check_server_key(&mut self, server_public_key: &PublicKey) -> Result<bool, Self::Error> {
        tracing::debug!(
            fingerprint = %server_public_key.fingerprint(HashAlg::Sha256),
            "accepting host key"
        );
        Ok(true)
    }
}

/// Production `RemoteSession` over SSH.
pub struct SshSession {
    handle: Handle<FreshHostKeys>,
    password: String,
}

impl SshSession {
    /// Connect to the target and log in with its password.
    ///
    /// # Errors
    ///
    /// `ProvisionError::Connect` if the TCP/SSH handshake fails and
    /// `ProvisionError::Authentication` if the password is rejected.
    pub async fn connect(target: &Target) -> Result<Self, ProvisionError> {
        let connect_error = |e: russh::Error| ProvisionError::Connect {
            host: target.host().to_owned(),
            port: target.port(),
            source: Box::new(e),
        };

        let config = Arc::new(client::Config::default());
        tracing::debug!(host = target.host(), port = target.port(), "connecting");
        let mut handle = client::connect(config, (target.host(), target.port()), FreshHostKeys)
            .await
            .map_err(connect_error)?;

        let auth = handle
            .authenticate_password(target.username(), target.password())
            .await
            .map_err(connect_error)?;
        if !auth.success() {
            return Err(ProvisionError::Authentication {
                username: target.username().to_owned(),
            });
        }
        tracing::debug!(username = target.username(), "authenticated");

        Ok(Self {
            handle,
            password: target.password().to_owned(),
        })
    }

    /// Run `wire_command` on a fresh channel, feeding `stdin` if given.
    async fn exec(&self, wire_command: &str, stdin: Option<&[u8]>) -> Completion {
        match self.try_exec(wire_command, stdin).await {
            Ok(completion) => completion,
            Err(e) => Completion::ChannelLost {
                reason: Box::new(e),
            },
        }
    }

    async fn try_exec(
        &self,
        wire_command: &str,
        stdin: Option<&[u8]>,
    ) -> Result<Completion, russh::Error> {
        let mut channel = self.handle.channel_open_session().await?;
        channel.exec(true, wire_command).await?;
        if let Some(input) = stdin {
            channel.data(input).await?;
        }
        channel.eof().await?;

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut exit_status = None;
        let mut exit_signal = None;
        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { ref data } => stdout.extend_from_slice(data),
                ChannelMsg::ExtendedData { ref data, ext } if ext == SSH_EXTENDED_DATA_STDERR => {
                    stderr.extend_from_slice(data);
                }
                ChannelMsg::ExitStatus { exit_status: status } => exit_status = Some(status),
                ChannelMsg::ExitSignal { signal_name, .. } => {
                    exit_signal = Some(format!("{signal_name:?}"));
                }
                _ => {}
            }
        }

        let output = CommandOutput {
            exit_status: exit_status.unwrap_or_default(),
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        };
        tracing::trace!(
            ?exit_status,
            ?exit_signal,
            stdout = %output.stdout,
            stderr = %output.stderr,
            "command finished"
        );
        Ok(match (exit_status, exit_signal) {
            (Some(_), _) => Completion::Exited(output),
            (None, Some(signal)) => Completion::Signaled { signal, output },
            (None, None) => Completion::ChannelLost {
                reason: "channel closed without an exit status".into(),
            },
        })
    }
}

impl RemoteSession for SshSession {
    async fn run(&self, command: &str, tolerance: Tolerance) -> Result<CommandOutcome, RemoteError> {
        tracing::debug!(command, "run");
        let completion = self.exec(command, None).await;
        classify(command, completion, tolerance)
    }

    async fn run_privileged(
        &self,
        command: &str,
        tolerance: Tolerance,
    ) -> Result<CommandOutcome, RemoteError> {
        tracing::debug!(command, "sudo");
        let password = format!("{}\n", self.password);
        let completion = self
            .exec(&privileged_command(command), Some(password.as_bytes()))
            .await;
        classify(command, completion, tolerance)
    }

    async fn upload(&self, local_path: &Path, remote_path: &str) -> Result<(), RemoteError> {
        let contents = tokio::fs::read(local_path)
            .await
            .map_err(|source| RemoteError::LocalFile {
                path: local_path.to_path_buf(),
                source,
            })?;
        tracing::debug!(
            local = %local_path.display(),
            remote = remote_path,
            bytes = contents.len(),
            "upload"
        );

        let label = format!("upload {} -> {remote_path}", local_path.display());
        let completion = self
            .exec(&upload_command(remote_path), Some(contents.as_slice()))
            .await;
        classify(&label, completion, Tolerance::Strict).map(drop)
    }

    async fn close(&self) {
        if let Err(e) = self
            .handle
            .disconnect(Disconnect::ByApplication, "", "English")
            .await
        {
            tracing::debug!(error = %e, "disconnect failed");
        }
    }
}
