//! The port manifest: single source of truth mapping service name to TCP
//! port, and the registry that serves it.

use std::collections::HashMap;
use std::path::Path;

use reccore::PortAssignment;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::host::resolve_host;

/// Raw JSON shape of the port manifest: `{ "service_name": port, ... }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortManifest {
    ports: HashMap<String, u16>,
}

impl PortManifest {
    /// Parse a manifest from its JSON document.
    pub fn parse(json: &str) -> Result<Self> {
        let ports: HashMap<String, u16> = serde_json::from_str(json)?;
        Ok(Self { ports })
    }

    /// Load a manifest from a file path.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.ports.keys().map(String::as_str)
    }
}

/// Served view of the port manifest, with a resolved host.
///
/// `get_port`/`get_host` are the only contract every other component is
/// permitted to use; there must be no hardcoded literal ports anywhere
/// else in the codebase.
#[derive(Debug, Clone)]
pub struct PortRegistry {
    manifest: PortManifest,
    host: String,
}

impl PortRegistry {
    /// Build a registry from an already-parsed manifest, resolving the host
    /// via the standard env-override / LAN-detect / localhost chain.
    #[must_use]
    pub fn new(manifest: PortManifest) -> Self {
        Self {
            manifest,
            host: resolve_host(),
        }
    }

    /// Build a registry with an explicit host, bypassing detection (tests,
    /// or an operator override captured elsewhere).
    #[must_use]
    pub fn with_host(manifest: PortManifest, host: impl Into<String>) -> Self {
        Self {
            manifest,
            host: host.into(),
        }
    }

    /// Load the manifest from `path` and build a registry.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(PortManifest::load(path)?))
    }

    /// The resolved bind/address host, shared by every service.
    #[must_use]
    pub fn get_host(&self) -> &str {
        &self.host
    }

    /// Look up a service's port. Fails hard (no fallback) if the service
    /// name is absent from the manifest — configuration drift must be
    /// caught at boot, not papered over with a guessed port.
    pub fn get_port(&self, name: &str) -> Result<u16> {
        self.manifest
            .ports
            .get(name)
            .copied()
            .ok_or_else(|| ConfigError::MissingPort(name.to_string()))
    }

    /// Resolve a full `PortAssignment` for a service name.
    pub fn get_assignment(&self, name: &str) -> Result<PortAssignment> {
        let port = self.get_port(name)?;
        Ok(PortAssignment::new(name, self.host.clone(), port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "main_app": 3000,
        "trade_manager": 4001,
        "trade_executor": 4002,
        "active_trade_supervisor": 4003
    }"#;

    #[test]
    fn test_get_port_known_service() {
        let registry = PortRegistry::with_host(PortManifest::parse(SAMPLE).unwrap(), "localhost");
        assert_eq!(registry.get_port("trade_manager").unwrap(), 4001);
    }

    #[test]
    fn test_get_port_missing_service_is_config_error() {
        let registry = PortRegistry::with_host(PortManifest::parse(SAMPLE).unwrap(), "localhost");
        let err = registry.get_port("does_not_exist").unwrap_err();
        assert!(matches!(err, ConfigError::MissingPort(name) if name == "does_not_exist"));
    }

    #[test]
    fn test_get_assignment_binds_host_and_port() {
        let registry = PortRegistry::with_host(PortManifest::parse(SAMPLE).unwrap(), "10.0.0.5");
        let assignment = registry.get_assignment("main_app").unwrap();
        assert_eq!(assignment.host, "10.0.0.5");
        assert_eq!(assignment.port, 3000);
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        assert!(PortManifest::parse("{not json").is_err());
    }
}
