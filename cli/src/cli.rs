//! CLI argument parsing with clap derive

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;

use crate::application::services::provision::{provision, run_until_interrupted};
use crate::application::{ProgressReporter, RemoteSession};
use crate::domain::target::resolve_public_key;
use crate::domain::{RunOutcome, Target};
use crate::infra::{SshSession, signal};
use crate::output::{OutputContext, TerminalReporter};

const FAILURE_MESSAGE: &str = "something went wrong, see trace below";

/// Provision a freshly installed Ubuntu VM into a Vagrant base box over SSH
#[derive(Parser, Debug)]
#[command(name = "provision-basebox", version)]
pub struct Cli {
    /// Hostname or IP address of the VM to provision
    #[arg(long, env = "BASEBOX_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port where sshd listens
    #[arg(long, env = "BASEBOX_PORT", default_value_t = 2222)]
    pub port: u16,

    /// Username for SSH login
    #[arg(long, env = "BASEBOX_USERNAME", default_value = "vagrant")]
    pub username: String,

    /// Password for SSH login and sudo
    #[arg(
        long,
        env = "BASEBOX_PASSWORD",
        default_value = "vagrant",
        hide_env_values = true
    )]
    pub password: String,

    /// Name of the public key to take from ~/.ssh (absolute paths are used as-is)
    #[arg(long = "local-pkey", env = "BASEBOX_LOCAL_PKEY", default_value = "id_rsa.pub")]
    pub local_pkey: PathBuf,

    /// Numeric version of the VirtualBox guest additions package
    #[arg(
        long = "guest-addition-version",
        env = "BASEBOX_GUEST_ADDITION_VERSION",
        default_value = "6.1.32"
    )]
    pub guest_addition_version: String,

    /// Log every remote command
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(
        long,
        env = "NO_COLOR",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub no_color: bool,
}

impl Cli {
    /// Provision the target until done, failed, or interrupted.
    pub async fn run(self) -> RunOutcome<Result<()>> {
        crate::logging::init(self.verbose);
        let output = OutputContext::new(self.no_color, self.quiet);

        let target = match self.target() {
            Ok(target) => target,
            Err(e) => {
                output.error(FAILURE_MESSAGE);
                return RunOutcome::Finished(Err(e));
            }
        };
        tracing::debug!(?target, "resolved target");

        let outcome = run_until_interrupted(
            provision_target(&target, &TerminalReporter::new(&output)),
            signal::interrupted(),
        )
        .await;
        if let RunOutcome::Finished(Err(_)) = outcome {
            output.error(FAILURE_MESSAGE);
        }
        outcome
    }

    /// Validate flags into a `Target`, resolving the key under `~/.ssh`.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory is unknown, the public key is
    /// missing, or a parameter fails validation.
    pub fn target(&self) -> Result<Target> {
        let public_key = resolve_public_key(&self.local_pkey, dirs::home_dir)?;
        ensure_public_key(&public_key)?;

        Ok(Target::new(
            self.host.clone(),
            self.port,
            self.username.clone(),
            self.password.clone(),
            public_key,
            self.guest_addition_version.clone(),
        )?)
    }
}

fn ensure_public_key(path: &Path) -> Result<()> {
    anyhow::ensure!(
        path.is_file(),
        "public key not found at {}",
        path.display()
    );
    Ok(())
}

/// Open the one session of this run, provision, and close it again.
async fn provision_target(target: &Target, reporter: &impl ProgressReporter) -> Result<()> {
    reporter.step(&format!(
        "connecting to {}@{}:{}...",
        target.username(),
        target.host(),
        target.port()
    ));
    let session = SshSession::connect(target).await?;

    let result = provision(&session, target, reporter).await;
    session.close().await;
    let report = result?;

    tracing::debug!(
        steps = report.completed.len(),
        tolerated = report.tolerated.len(),
        "provisioning finished"
    );
    reporter.success("provisioning has been completed");
    Ok(())
}
