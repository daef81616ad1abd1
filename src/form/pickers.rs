//! Lazy option loading for reference pickers
//!
//! Nothing is fetched until a picker for a given protocol and resource type
//! asks for its options. Lists are then cached for the lifetime of the
//! picker source; read-only forms never create picker requests at all.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::error::FormError;
use super::renderer::{FormLayout, Widget};
use crate::domain::{EntryPoint, EntryPointLister, Protocol, ResourceReferenceResolver, ResourceSummary, ResourceType};

const DATABASE_SOURCE: &str = "database";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PickerOption {
    pub value: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub enabled: bool,
    pub badges: Vec<String>,
}

impl From<&ResourceSummary> for PickerOption {
    fn from(resource: &ResourceSummary) -> Self {
        let mut badges = Vec::new();
        if resource.source == DATABASE_SOURCE {
            badges.push("DB".to_string());
        }
        if !resource.enabled {
            badges.push("Disabled".to_string());
        }
        Self {
            value: resource.name.clone(),
            label: resource.name.clone(),
            provider: Some(resource.provider.clone()),
            source: Some(resource.source.clone()),
            enabled: resource.enabled,
            badges,
        }
    }
}

impl From<&EntryPoint> for PickerOption {
    fn from(entry_point: &EntryPoint) -> Self {
        Self {
            value: entry_point.name.clone(),
            label: entry_point.name.clone(),
            provider: None,
            source: None,
            enabled: true,
            badges: Vec::new(),
        }
    }
}

/// A list a rendered form needs before its pickers become usable
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "list", rename_all = "camelCase")]
pub enum PickerRequest {
    #[serde(rename_all = "camelCase")]
    Resources {
        protocol: Protocol,
        resource_type: ResourceType,
    },
    EntryPoints,
}

/// Distinct lists required by the pickers of a layout
pub fn collect_picker_requests(layout: &FormLayout) -> Vec<PickerRequest> {
    let mut requests = BTreeSet::new();
    layout.visit(&mut |field| match &field.widget {
        Widget::ResourcePicker { protocol, resource_type, .. } => {
            requests.insert(PickerRequest::Resources {
                protocol: *protocol,
                resource_type: *resource_type,
            });
        }
        Widget::MiddlewareList { protocol, .. } => {
            requests.insert(PickerRequest::Resources {
                protocol: *protocol,
                resource_type: ResourceType::Middlewares,
            });
        }
        Widget::ParentRefList { protocol, .. } => {
            requests.insert(PickerRequest::Resources {
                protocol: *protocol,
                resource_type: ResourceType::Routers,
            });
        }
        Widget::EntryPointSelect { .. } => {
            requests.insert(PickerRequest::EntryPoints);
        }
        _ => {}
    });
    requests.into_iter().collect()
}

// ============================================================================
// Option Source
// ============================================================================

#[derive(Clone)]
pub struct PickerSource {
    resolver: Arc<dyn ResourceReferenceResolver>,
    entry_points: Arc<dyn EntryPointLister>,
    resources: Arc<RwLock<HashMap<(Protocol, ResourceType), Vec<ResourceSummary>>>>,
    entry_point_list: Arc<RwLock<Option<Vec<EntryPoint>>>>,
}

impl PickerSource {
    pub fn new(resolver: Arc<dyn ResourceReferenceResolver>, entry_points: Arc<dyn EntryPointLister>) -> Self {
        Self {
            resolver,
            entry_points,
            resources: Arc::new(RwLock::new(HashMap::new())),
            entry_point_list: Arc::new(RwLock::new(None)),
        }
    }

    /// Options for a resource picker, fetching the list on first use
    pub async fn options(&self, protocol: Protocol, resource_type: ResourceType) -> Result<Vec<PickerOption>, FormError> {
        let key = (protocol, resource_type);
        if let Some(cached) = self.resources.read().await.get(&key) {
            return Ok(cached.iter().map(PickerOption::from).collect());
        }

        debug!("Fetching {} {} for picker", protocol, resource_type);
        let fetched = self
            .resolver
            .list_resources(protocol, resource_type, true)
            .await
            .map_err(|e| {
                warn!("Failed to list {} {}: {}", protocol, resource_type, e);
                FormError::ReferenceFetch {
                    resource_type: resource_type.to_string(),
                    message: e.to_string(),
                }
            })?;

        let mut cache = self.resources.write().await;
        let stored = cache.entry(key).or_insert(fetched);
        Ok(stored.iter().map(PickerOption::from).collect())
    }

    /// Options without fetching; pending until the list has been loaded once
    pub fn peek(&self, protocol: Protocol, resource_type: ResourceType) -> Result<Vec<PickerOption>, FormError> {
        let pending = FormError::ReferenceResolutionPending { protocol, resource_type };
        let cache = self.resources.try_read().map_err(|_| pending.clone())?;
        cache
            .get(&(protocol, resource_type))
            .map(|list| list.iter().map(PickerOption::from).collect())
            .ok_or(pending)
    }

    /// Middleware options that are not in the chain yet
    pub async fn middleware_options(&self, protocol: Protocol, selected: &[String]) -> Result<Vec<PickerOption>, FormError> {
        let options = self.options(protocol, ResourceType::Middlewares).await?;
        Ok(options
            .into_iter()
            .filter(|option| !selected.contains(&option.value))
            .collect())
    }

    pub async fn entry_point_options(&self) -> Result<Vec<PickerOption>, FormError> {
        if let Some(cached) = self.entry_point_list.read().await.as_ref() {
            return Ok(cached.iter().map(PickerOption::from).collect());
        }

        let fetched = self.entry_points.list_entry_points().await.map_err(|e| FormError::ReferenceFetch {
            resource_type: "entryPoints".to_string(),
            message: e.to_string(),
        })?;

        let mut cache = self.entry_point_list.write().await;
        let stored = cache.get_or_insert(fetched);
        Ok(stored.iter().map(PickerOption::from).collect())
    }

    /// Load every list a layout needs
    pub async fn load_for(&self, layout: &FormLayout) -> Result<Vec<(PickerRequest, Vec<PickerOption>)>, FormError> {
        let mut loaded = Vec::new();
        for request in collect_picker_requests(layout) {
            let options = match request {
                PickerRequest::Resources { protocol, resource_type } => self.options(protocol, resource_type).await?,
                PickerRequest::EntryPoints => self.entry_point_options().await?,
            };
            loaded.push((request, options));
        }
        Ok(loaded)
    }
}
