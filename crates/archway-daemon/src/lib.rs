//! archway-daemon
//!
//! Everything needed to drive `archwayd`: how to invoke it (local binary or
//! Docker image), how to run a subcommand and capture its output, and the
//! key-provisioning call whose JSON output the rest of the tool relies on.
//!
//! All meaningful work (key derivation, signing, genesis validation) happens
//! inside the daemon; this crate only builds argument lists and interprets
//! exit codes and output.

pub mod client;
pub mod keys;
pub mod legacy;
pub mod runner;

pub use client::{ClientHandle, ClientKind, Invocation};
pub use keys::create_key;
pub use runner::{DaemonRunner, ProcessOutput, ProcessRunner};
