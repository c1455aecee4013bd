//! Wires the core pipeline (registry, version manager, executor) into a
//! daemon-shaped crate: layered configuration (spec §10.3), and an
//! in-process [`Handler`] trait exposing the spec §6 RPC method set (spec
//! §10.4). The actual network transport — socket listener, framing,
//! CLI parsing — is out of scope, per spec.md's explicit scope carve-out;
//! wiring one onto [`Handler`] is the host's responsibility.

pub mod config;
pub mod handler;

pub use config::{ConfigError, RegistryConfig};
pub use handler::{DaemonHandler, Handler};
