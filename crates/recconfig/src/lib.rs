//! Port manifest and declarative service configuration.
//!
//! `PortRegistry` is the single source of truth every component uses to
//! resolve `(host, port)`; `ServiceManifest` is the declarative service
//! list consumed by the Supervisor for dependency-ordered startup.

pub mod error;
pub mod host;
pub mod port_registry;
pub mod service_manifest;

pub use error::{ConfigError, Result};
pub use host::resolve_host;
pub use port_registry::{PortManifest, PortRegistry};
pub use service_manifest::{ServiceManifest, ServiceRecord};
