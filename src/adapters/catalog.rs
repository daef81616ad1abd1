use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::config::CatalogSettings;
use crate::domain::{
    EntryPoint, EntryPointLister, Protocol, ResourceReferenceResolver, ResourceSummary, ResourceType,
};

const DATABASE_SOURCE: &str = "database";

/// In-memory resource catalogue serving both listing ports
#[derive(Debug, Default, Clone)]
pub struct StaticCatalog {
    resources: HashMap<(Protocol, ResourceType), Vec<ResourceSummary>>,
    entry_points: Vec<EntryPoint>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from validated settings; entries that fail to parse are skipped
    pub fn from_settings(settings: &CatalogSettings) -> Self {
        let mut catalog = Self::new();
        for name in &settings.entrypoints {
            catalog.add_entry_point(name.clone());
        }

        for entry in &settings.resources {
            let (Ok(protocol), Ok(resource_type)) =
                (entry.protocol.parse::<Protocol>(), entry.resource_type.parse::<ResourceType>())
            else {
                warn!("Skipping catalog entry {} with unknown protocol or type", entry.name);
                continue;
            };
            catalog.add_resource(
                protocol,
                resource_type,
                ResourceSummary {
                    name: entry.name.clone(),
                    provider: entry.provider.clone(),
                    enabled: entry.enabled,
                    source: entry.source.clone(),
                },
            );
        }
        catalog
    }

    pub fn add_resource(&mut self, protocol: Protocol, resource_type: ResourceType, summary: ResourceSummary) {
        self.resources.entry((protocol, resource_type)).or_default().push(summary);
    }

    pub fn add_entry_point(&mut self, name: impl Into<String>) {
        self.entry_points.push(EntryPoint { name: name.into() });
    }
}

#[async_trait]
impl ResourceReferenceResolver for StaticCatalog {
    async fn list_resources(
        &self,
        protocol: Protocol,
        resource_type: ResourceType,
        include_external: bool,
    ) -> anyhow::Result<Vec<ResourceSummary>> {
        let all = self.resources.get(&(protocol, resource_type)).cloned().unwrap_or_default();
        let listed: Vec<ResourceSummary> = if include_external {
            all
        } else {
            all.into_iter().filter(|r| r.source == DATABASE_SOURCE).collect()
        };
        debug!("Listing {} {} {} resources", listed.len(), protocol, resource_type);
        Ok(listed)
    }
}

#[async_trait]
impl EntryPointLister for StaticCatalog {
    async fn list_entry_points(&self) -> anyhow::Result<Vec<EntryPoint>> {
        Ok(self.entry_points.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CatalogResource;

    fn settings() -> CatalogSettings {
        let entry = |name: &str, source: &str| CatalogResource {
            protocol: "http".to_string(),
            resource_type: "services".to_string(),
            name: name.to_string(),
            provider: "file".to_string(),
            enabled: true,
            source: source.to_string(),
        };
        CatalogSettings {
            entrypoints: vec!["web".to_string()],
            resources: vec![entry("api", "database"), entry("whoami", "docker")],
        }
    }

    #[tokio::test]
    async fn test_external_filter() {
        let catalog = StaticCatalog::from_settings(&settings());

        let all = catalog.list_resources(Protocol::Http, ResourceType::Services, true).await.unwrap();
        assert_eq!(all.len(), 2);

        let managed = catalog.list_resources(Protocol::Http, ResourceType::Services, false).await.unwrap();
        assert_eq!(managed.len(), 1);
        assert_eq!(managed[0].name, "api");
    }

    #[tokio::test]
    async fn test_unknown_key_is_empty() {
        let catalog = StaticCatalog::from_settings(&settings());
        let tcp = catalog.list_resources(Protocol::Tcp, ResourceType::Services, true).await.unwrap();
        assert!(tcp.is_empty());
    }

    #[tokio::test]
    async fn test_entry_points() {
        let catalog = StaticCatalog::from_settings(&settings());
        let entry_points = catalog.list_entry_points().await.unwrap();
        assert_eq!(entry_points, vec![EntryPoint { name: "web".to_string() }]);
    }
}
