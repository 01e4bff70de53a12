//! Domain layer: pure provisioning types, validation, and classification.
//!
//! This module has zero imports from `crate::infra`, `crate::application`,
//! `tokio`, `russh`, `std::fs`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod error;
pub mod guest_additions;
pub mod remote;
pub mod run;
pub mod step;
pub mod target;

pub use error::{BoxError, ProvisionError, RemoteError, TargetError};
pub use remote::{
    CommandOutcome, CommandOutput, Completion, Tolerance, ToleratedFailure, ToleratedKind,
    classify,
};
pub use run::{Interrupt, RunOutcome};
pub use step::{Step, StepOutcome};
pub use target::Target;
