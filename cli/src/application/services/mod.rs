//! Application services: use-case orchestration.
//!
//! Services import only from `crate::domain` and `crate::application::ports`.
//! All remote I/O is routed through the injected `RemoteSession`.

pub mod provision;
pub mod steps;
