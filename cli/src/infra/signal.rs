//! Operator interrupt listener.

use crate::domain::Interrupt;

/// Resolves when the operator sends SIGINT (or SIGTERM on unix).
///
/// A listener that cannot be installed never fires.
pub async fn interrupted() -> Interrupt {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    interrupt = sigint() => interrupt,
                    _ = terminate.recv() => Interrupt::Sigterm,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "cannot listen for SIGTERM");
                sigint().await
            }
        }
    }
    #[cfg(not(unix))]
    {
        sigint().await
    }
}

async fn sigint() -> Interrupt {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for SIGINT");
        std::future::pending::<()>().await;
    }
    Interrupt::Sigint
}
