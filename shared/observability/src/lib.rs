//! connkit observability
//!
//! Logging setup for connector binaries. Everything goes to stderr so that
//! stdout stays reserved for command output.

pub mod init;
pub mod macros;

pub use init::*;
