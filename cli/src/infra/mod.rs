//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: the SSH transport and
//! process signal handling.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::cli` or `crate::output` are forbidden.

pub mod signal;
pub mod ssh_session;

pub use ssh_session::SshSession;
