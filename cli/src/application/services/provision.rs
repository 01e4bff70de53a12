//! Application service: base box provisioning use-case.
//!
//! Imports only from `crate::domain` and `crate::application`.
//! All I/O is routed through injected port traits.

use crate::application::ports::{ProgressReporter, RemoteSession};
use crate::application::services::steps;
use crate::domain::{
    Interrupt, ProvisionError, RunOutcome, Step, StepOutcome, Target, ToleratedFailure,
};

/// What a successful run did.
#[derive(Debug, Default)]
pub struct ProvisionReport {
    /// Steps in the order they completed.
    pub completed: Vec<Step>,
    /// Command failures that were declared acceptable along the way.
    pub tolerated: Vec<ToleratedFailure>,
}

/// Run every step of `Step::ALL`, in order, over one session.
///
/// Stops at the first failure. Nothing is retried or rolled back; the VM is
/// left as the last completed step left it.
///
/// # Errors
///
/// Returns `ProvisionError::Step` naming the failed step and its cause.
pub async fn provision(
    session: &impl RemoteSession,
    target: &Target,
    reporter: &impl ProgressReporter,
) -> Result<ProvisionReport, ProvisionError> {
    let mut report = ProvisionReport::default();

    for step in Step::ALL {
        reporter.step(step.description());
        tracing::debug!(step = step.name(), "step started");

        let outcome = steps::execute(step, session, target)
            .await
            .map_err(|source| ProvisionError::Step { step, source })?;

        if let StepOutcome::CompletedWithWarnings(warnings) = outcome {
            for warning in warnings {
                tracing::debug!(step = step.name(), %warning, "tolerated failure");
                reporter.warn(&warning.to_string());
                report.tolerated.push(warning);
            }
        }
        reporter.success(&format!("{step} complete"));
        report.completed.push(step);
    }

    Ok(report)
}

/// Drive `pipeline` to completion unless `interrupt` resolves first.
///
/// On interrupt the pipeline future is dropped mid-await, so no further
/// remote command is issued.
pub async fn run_until_interrupted<T>(
    pipeline: impl Future<Output = T>,
    interrupt: impl Future<Output = Interrupt>,
) -> RunOutcome<T> {
    tokio::select! {
        biased;
        signal = interrupt => RunOutcome::Interrupted(signal),
        result = pipeline => RunOutcome::Finished(result),
    }
}
