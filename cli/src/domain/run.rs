//! Process-level outcome of a provisioning run.

use std::fmt;

/// Operator-sent termination signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    Sigint,
    Sigterm,
}

impl fmt::Display for Interrupt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sigint => f.write_str("SIGINT"),
            Self::Sigterm => f.write_str("SIGTERM"),
        }
    }
}

/// Either the pipeline ran to its end (successfully or not) or the operator
/// stopped it.
#[derive(Debug)]
pub enum RunOutcome<T> {
    Finished(T),
    Interrupted(Interrupt),
}

impl<T, E> RunOutcome<Result<T, E>> {
    /// 0 on success or operator interrupt, 1 on failure.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Finished(Ok(_)) | Self::Interrupted(_) => 0,
            Self::Finished(Err(_)) => 1,
        }
    }
}
