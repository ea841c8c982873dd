//! The declarative service list consumed by the Supervisor.
//!
//! Paths inside service records must be dynamic (derived from project-root
//! detection by the caller) — this type never hardcodes a path itself.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

fn default_true() -> bool {
    true
}

fn default_startretries() -> u32 {
    3
}

/// One supervised service's declarative startup contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    pub cwd: String,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default = "default_true")]
    pub autostart: bool,
    #[serde(default = "default_true")]
    pub autorestart: bool,
    #[serde(default = "default_startretries")]
    pub startretries: u32,
    #[serde(default = "default_true")]
    pub stopasgroup: bool,
    #[serde(default = "default_true")]
    pub killasgroup: bool,
    pub logfile: String,
    /// Service names that must reach RUNNING before this one starts.
    #[serde(default)]
    pub depends_on: Vec<String>,
}

/// The full declarative service list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceManifest {
    services: Vec<ServiceRecord>,
}

impl ServiceManifest {
    pub fn parse(json: &str) -> Result<Self> {
        let services: Vec<ServiceRecord> = serde_json::from_str(json)?;
        let manifest = Self { services };
        manifest.topological_order()?;
        Ok(manifest)
    }

    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn get(&self, name: &str) -> Result<&ServiceRecord> {
        self.services
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| ConfigError::MissingService(name.to_string()))
    }

    pub fn all(&self) -> &[ServiceRecord] {
        &self.services
    }

    /// Leaves-first start order respecting `depends_on`. Errors on an
    /// unresolvable (cyclic or dangling) dependency graph.
    pub fn topological_order(&self) -> Result<Vec<String>> {
        let names: HashSet<&str> = self.services.iter().map(|s| s.name.as_str()).collect();
        for s in &self.services {
            for dep in &s.depends_on {
                if !names.contains(dep.as_str()) {
                    return Err(ConfigError::InvalidDependencyGraph(format!(
                        "service '{}' depends on unknown service '{}'",
                        s.name, dep
                    )));
                }
            }
        }

        let mut in_degree: HashMap<&str, usize> =
            self.services.iter().map(|s| (s.name.as_str(), 0)).collect();
        let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
        for s in &self.services {
            for dep in &s.depends_on {
                *in_degree.get_mut(s.name.as_str()).unwrap() += 1;
                dependents
                    .entry(dep.as_str())
                    .or_default()
                    .push(s.name.as_str());
            }
        }

        let mut queue: VecDeque<&str> = in_degree
            .iter()
            .filter(|(_, &deg)| deg == 0)
            .map(|(&name, _)| name)
            .collect();
        let mut order = Vec::with_capacity(self.services.len());

        while let Some(name) = queue.pop_front() {
            order.push(name.to_string());
            if let Some(children) = dependents.get(name) {
                for &child in children {
                    let deg = in_degree.get_mut(child).unwrap();
                    *deg -= 1;
                    if *deg == 0 {
                        queue.push_back(child);
                    }
                }
            }
        }

        if order.len() != self.services.len() {
            return Err(ConfigError::InvalidDependencyGraph(
                "dependency graph contains a cycle".to_string(),
            ));
        }

        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {"name": "kalshi_account_sync", "command": "recbot", "cwd": ".", "logfile": "a.log"},
        {"name": "trade_executor", "command": "recbot", "cwd": ".", "logfile": "b.log",
         "depends_on": ["kalshi_account_sync"]},
        {"name": "trade_manager", "command": "recbot", "cwd": ".", "logfile": "c.log",
         "depends_on": ["trade_executor"]}
    ]"#;

    #[test]
    fn test_topological_order_respects_dependencies() {
        let manifest = ServiceManifest::parse(SAMPLE).unwrap();
        let order = manifest.topological_order().unwrap();
        let pos = |n: &str| order.iter().position(|s| s == n).unwrap();
        assert!(pos("kalshi_account_sync") < pos("trade_executor"));
        assert!(pos("trade_executor") < pos("trade_manager"));
    }

    #[test]
    fn test_missing_service_name_is_an_error() {
        let manifest = ServiceManifest::parse(SAMPLE).unwrap();
        assert!(manifest.get("does_not_exist").is_err());
    }

    #[test]
    fn test_unknown_dependency_is_rejected() {
        let bad = r#"[{"name": "a", "command": "x", "cwd": ".", "logfile": "a.log",
                        "depends_on": ["ghost"]}]"#;
        assert!(ServiceManifest::parse(bad).is_err());
    }

    #[test]
    fn test_cycle_is_rejected() {
        let cyclic = r#"[
            {"name": "a", "command": "x", "cwd": ".", "logfile": "a.log", "depends_on": ["b"]},
            {"name": "b", "command": "x", "cwd": ".", "logfile": "b.log", "depends_on": ["a"]}
        ]"#;
        assert!(ServiceManifest::parse(cyclic).is_err());
    }

    #[test]
    fn test_defaults_applied() {
        let manifest = ServiceManifest::parse(SAMPLE).unwrap();
        let s = manifest.get("kalshi_account_sync").unwrap();
        assert!(s.autostart);
        assert!(s.autorestart);
        assert_eq!(s.startretries, 3);
        assert!(s.stopasgroup);
        assert!(s.killasgroup);
    }
}
