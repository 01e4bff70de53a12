//! Unit tests for the base box provisioner
//!
//! These tests drive the provisioning pipeline against a recording mock
//! session and run fast without any network I/O.

mod architecture;
mod guest_additions;
