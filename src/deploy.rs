//! Deployment descriptor.
//!
//! The stack file is handed to the orchestrator, which owns scheduling,
//! replica counts and restarts. The services never read it at runtime; this
//! module exists so the file can be checked before it is deployed.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::error::StackError;

#[derive(Debug, Clone, Deserialize)]
pub struct StackFile {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub services: BTreeMap<String, ServiceSpec>,
    #[serde(default)]
    pub networks: BTreeMap<String, NetworkSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceSpec {
    pub image: String,
    #[serde(default)]
    pub command: Vec<String>,
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
    #[serde(default)]
    pub ports: Vec<PortEntry>,
    #[serde(default)]
    pub networks: Vec<String>,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub deploy: DeploySpec,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeploySpec {
    pub replicas: u32,
    pub restart_policy: RestartPolicy,
}

impl Default for DeploySpec {
    fn default() -> Self {
        Self {
            replicas: 1,
            restart_policy: RestartPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RestartPolicy {
    pub condition: RestartCondition,
    pub max_attempts: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestartCondition {
    #[default]
    Any,
    OnFailure,
    None,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetworkSpec {
    #[serde(default)]
    pub driver: Option<String>,
    #[serde(default)]
    pub attachable: bool,
}

/// A raw `ports` entry. Compose files write a bare target port either quoted
/// or as a YAML integer, so both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PortEntry {
    Number(u64),
    Text(String),
}

impl PortEntry {
    pub fn mapping(&self) -> Option<PortMapping> {
        match self {
            PortEntry::Number(n) => {
                let target = u16::try_from(*n).ok().filter(|p| *p != 0)?;
                Some(PortMapping {
                    published: None,
                    target,
                })
            }
            PortEntry::Text(spec) => PortMapping::parse(spec),
        }
    }
}

impl fmt::Display for PortEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortEntry::Number(n) => write!(f, "{}", n),
            PortEntry::Text(spec) => f.write_str(spec),
        }
    }
}

/// One `ports` entry: `"published:target"`, optionally with `/proto`, or a
/// bare target port that is not published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortMapping {
    pub published: Option<u16>,
    pub target: u16,
}

impl PortMapping {
    pub fn parse(spec: &str) -> Option<Self> {
        let ports = match spec.split_once('/') {
            Some((ports, proto)) if proto == "tcp" || proto == "udp" => ports,
            Some(_) => return None,
            None => spec,
        };

        let port = |s: &str| s.trim().parse::<u16>().ok().filter(|p| *p != 0);

        match ports.split_once(':') {
            Some((published, target)) => Some(Self {
                published: Some(port(published)?),
                target: port(target)?,
            }),
            None => Some(Self {
                published: None,
                target: port(ports)?,
            }),
        }
    }
}

impl StackFile {
    pub fn load(path: &Path) -> Result<Self, StackError> {
        let raw = std::fs::read_to_string(path).map_err(|source| StackError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, StackError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Checks references inside the file. Stops at the first problem.
    pub fn validate(&self) -> Result<(), StackError> {
        if self.services.is_empty() {
            return Err(StackError::NoServices);
        }

        let mut published: HashMap<u16, &str> = HashMap::new();

        for (name, service) in &self.services {
            if service.image.trim().is_empty() {
                return Err(StackError::EmptyImage {
                    service: name.clone(),
                });
            }

            for network in &service.networks {
                if !self.networks.contains_key(network) {
                    return Err(StackError::UnknownNetwork {
                        service: name.clone(),
                        network: network.clone(),
                    });
                }
            }

            for entry in &service.ports {
                let mapping = entry.mapping().ok_or_else(|| StackError::InvalidPort {
                    service: name.clone(),
                    spec: entry.to_string(),
                })?;
                let Some(port) = mapping.published else {
                    continue;
                };
                if let Some(first) = published.insert(port, name.as_str()) {
                    return Err(StackError::DuplicatePort {
                        port,
                        first: first.to_string(),
                        second: name.clone(),
                    });
                }
            }

            for dependency in &service.depends_on {
                if !self.services.contains_key(dependency) {
                    return Err(StackError::UnknownDependency {
                        service: name.clone(),
                        dependency: dependency.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Total replicas across services.
    pub fn total_replicas(&self) -> u32 {
        self.services.values().map(|s| s.deploy.replicas).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_mapping_forms() {
        assert_eq!(
            PortMapping::parse("8080:80"),
            Some(PortMapping {
                published: Some(8080),
                target: 80
            })
        );
        assert_eq!(
            PortMapping::parse("5000/tcp"),
            Some(PortMapping {
                published: None,
                target: 5000
            })
        );
        assert_eq!(PortMapping::parse("8080:80/sctp"), None);
        assert_eq!(PortMapping::parse("0:80"), None);
        assert_eq!(PortMapping::parse("http"), None);
    }

    #[test]
    fn integer_entries_are_target_only() {
        assert_eq!(
            PortEntry::Number(5000).mapping(),
            Some(PortMapping {
                published: None,
                target: 5000
            })
        );
        assert_eq!(PortEntry::Number(0).mapping(), None);
        assert_eq!(PortEntry::Number(70000).mapping(), None);
        assert_eq!(PortEntry::Number(70000).to_string(), "70000");
    }
}
