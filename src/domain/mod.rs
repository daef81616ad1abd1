use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::rules::RuleDialect;

// ============================================================================
// Protocols and Resource Types
// ============================================================================

/// Transport protocol a resource belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Tcp,
    Udp,
}

impl Protocol {
    pub const ALL: [Protocol; 3] = [Protocol::Http, Protocol::Tcp, Protocol::Udp];

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
        }
    }

    /// Resource types the proxy accepts for this protocol
    pub fn resource_types(&self) -> &'static [ResourceType] {
        match self {
            Protocol::Http | Protocol::Tcp => &[
                ResourceType::Routers,
                ResourceType::Services,
                ResourceType::Middlewares,
                ResourceType::ServersTransport,
                ResourceType::Tls,
            ],
            Protocol::Udp => &[
                ResourceType::Routers,
                ResourceType::Services,
                ResourceType::Middlewares,
            ],
        }
    }

    pub fn supports(&self, resource_type: ResourceType) -> bool {
        self.resource_types().contains(&resource_type)
    }

    /// Matcher catalogue used by the rule builder. UDP routers have no rules.
    pub fn rule_dialect(&self) -> Option<RuleDialect> {
        match self {
            Protocol::Http => Some(RuleDialect::Http),
            Protocol::Tcp => Some(RuleDialect::Tcp),
            Protocol::Udp => None,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Protocol::Http),
            "tcp" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            other => Err(format!("unknown protocol '{}'", other)),
        }
    }
}

/// Kind of dynamic configuration resource
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceType {
    Routers,
    Services,
    Middlewares,
    ServersTransport,
    Tls,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Routers => "routers",
            ResourceType::Services => "services",
            ResourceType::Middlewares => "middlewares",
            ResourceType::ServersTransport => "serversTransport",
            ResourceType::Tls => "tls",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "routers" => Ok(ResourceType::Routers),
            "services" => Ok(ResourceType::Services),
            "middlewares" => Ok(ResourceType::Middlewares),
            "serversTransport" | "serversTransports" => Ok(ResourceType::ServersTransport),
            "tls" => Ok(ResourceType::Tls),
            other => Err(format!("unknown resource type '{}'", other)),
        }
    }
}

/// Service flavours; each one is a `oneOf` branch of the services schema
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ServiceSubtype {
    LoadBalancer,
    Weighted,
    Mirroring,
    Failover,
}

impl ServiceSubtype {
    /// Detection order used when inspecting a stored service configuration
    pub const DETECTION_ORDER: [ServiceSubtype; 4] = [
        ServiceSubtype::Weighted,
        ServiceSubtype::Mirroring,
        ServiceSubtype::Failover,
        ServiceSubtype::LoadBalancer,
    ];

    /// Discriminator key of the branch
    pub fn key(&self) -> &'static str {
        match self {
            ServiceSubtype::LoadBalancer => "loadBalancer",
            ServiceSubtype::Weighted => "weighted",
            ServiceSubtype::Mirroring => "mirroring",
            ServiceSubtype::Failover => "failover",
        }
    }
}

impl fmt::Display for ServiceSubtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ServiceSubtype {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::DETECTION_ORDER
            .into_iter()
            .find(|subtype| subtype.key() == s)
            .ok_or_else(|| format!("unknown service subtype '{}'", s))
    }
}

// ============================================================================
// Collaborator Data
// ============================================================================

/// A named resource as listed by the configuration API
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ResourceSummary {
    pub name: String,
    pub provider: String,
    pub enabled: bool,
    /// Where the resource comes from ("database" for console-managed ones)
    pub source: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    pub name: String,
}

// ============================================================================
// Collaborator Ports
// ============================================================================

/// Supplies the raw JSON Schema for a protocol/resource type pair
#[async_trait]
pub trait SchemaProvider: Send + Sync {
    async fn fetch_schema(&self, protocol: Protocol, resource_type: ResourceType) -> anyhow::Result<Value>;
}

/// Lists existing resources that a reference field may point at
#[async_trait]
pub trait ResourceReferenceResolver: Send + Sync {
    async fn list_resources(
        &self,
        protocol: Protocol,
        resource_type: ResourceType,
        include_external: bool,
    ) -> anyhow::Result<Vec<ResourceSummary>>;
}

#[async_trait]
pub trait EntryPointLister: Send + Sync {
    async fn list_entry_points(&self) -> anyhow::Result<Vec<EntryPoint>>;
}
