//! Schema lifecycle for one form
//!
//! A session owns the fetched schema document, the selected `oneOf` branch
//! and which tab is showing. It never owns the value tree: `view` receives
//! the shell's current value on every call and re-derives the whole layout.
//!
//! Fetch results are tagged with a request number. When the user switches
//! resource type or subtype while a fetch is in flight, the older result is
//! dropped on arrival.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::error::FormError;
use super::renderer::{FormLayout, FormRenderer};
use super::resolver::{self, DEFAULT_MAX_DEPTH};
use super::types::{FormMode, SchemaNode};
use crate::domain::{Protocol, ResourceType, SchemaProvider};

#[derive(Clone, Debug, PartialEq)]
pub enum SchemaState {
    Loading,
    FetchFailed(String),
    Invalid(String),
    Ready(SchemaNode),
}

/// What the shell should draw right now
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum FormView {
    Loading,
    FetchFailed { message: String },
    Invalid { message: String },
    #[serde(rename_all = "camelCase")]
    Ready {
        layout: FormLayout,
        active_tab: Option<String>,
    },
}

pub struct FormSession {
    protocol: Protocol,
    resource_type: ResourceType,
    mode: FormMode,
    branch: Option<String>,
    max_depth: usize,
    raw_schema: Option<Value>,
    state: SchemaState,
    request_seq: u64,
    active_tab: Option<String>,
}

impl FormSession {
    pub fn new(protocol: Protocol, resource_type: ResourceType, mode: FormMode) -> Self {
        Self {
            protocol,
            resource_type,
            mode,
            branch: None,
            max_depth: DEFAULT_MAX_DEPTH,
            raw_schema: None,
            state: SchemaState::Loading,
            request_seq: 0,
            active_tab: None,
        }
    }

    /// Render only the `oneOf` branch keyed by `branch` (service subtype, middleware type)
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn state(&self) -> &SchemaState {
        &self.state
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    /// Start a new fetch; results of earlier requests will be ignored
    pub fn begin_request(&mut self) -> u64 {
        self.request_seq += 1;
        self.state = SchemaState::Loading;
        self.request_seq
    }

    /// Store a fetch result. Returns false when `request` has been superseded.
    pub fn accept_schema(&mut self, request: u64, result: anyhow::Result<Value>) -> bool {
        if request != self.request_seq {
            debug!("Dropping stale schema response {} (current {})", request, self.request_seq);
            return false;
        }

        self.active_tab = None;
        match result {
            Ok(raw) => {
                self.raw_schema = Some(raw);
                self.derive_state();
            }
            Err(e) => {
                warn!("Schema fetch for {} {} failed: {}", self.protocol, self.resource_type, e);
                self.raw_schema = None;
                self.state = SchemaState::FetchFailed(e.to_string());
            }
        }
        true
    }

    /// Fetch and resolve the schema through `provider`
    pub async fn load(&mut self, provider: &dyn SchemaProvider) -> Result<(), FormError> {
        let request = self.begin_request();
        let result = provider.fetch_schema(self.protocol, self.resource_type).await;
        self.accept_schema(request, result);

        match &self.state {
            SchemaState::Ready(_) => Ok(()),
            SchemaState::FetchFailed(message) => Err(FormError::SchemaFetch(message.clone())),
            SchemaState::Invalid(message) => Err(FormError::SchemaInvalid(message.clone())),
            SchemaState::Loading => Ok(()),
        }
    }

    /// Pick another branch of the already fetched document
    pub fn switch_branch(&mut self, branch: Option<String>) {
        if self.branch == branch {
            return;
        }
        info!("Switching schema branch to {:?}", branch);
        self.branch = branch;
        self.active_tab = None;
        if self.raw_schema.is_some() {
            self.derive_state();
        }
    }

    /// Ephemeral view state; has no effect on the value tree
    pub fn select_tab(&mut self, tab_id: impl Into<String>) {
        self.active_tab = Some(tab_id.into());
    }

    pub fn view(&self, value: &Value) -> FormView {
        match &self.state {
            SchemaState::Loading => FormView::Loading,
            SchemaState::FetchFailed(message) => FormView::FetchFailed { message: message.clone() },
            SchemaState::Invalid(message) => FormView::Invalid { message: message.clone() },
            SchemaState::Ready(schema) => {
                let renderer = FormRenderer::new(self.protocol, self.mode);
                match renderer.render(schema, value) {
                    Ok(layout) => {
                        let tab_ids = layout.tab_ids();
                        let active_tab = match &self.active_tab {
                            Some(tab) if tab_ids.contains(&tab.as_str()) => Some(tab.clone()),
                            _ => tab_ids.first().map(|id| id.to_string()),
                        };
                        FormView::Ready { layout, active_tab }
                    }
                    Err(e) => FormView::Invalid { message: e.to_string() },
                }
            }
        }
    }

    fn derive_state(&mut self) {
        let Some(raw) = &self.raw_schema else {
            return;
        };

        let resolved = match &self.branch {
            Some(key) => resolver::extract_branch_with_depth(raw, key, self.max_depth),
            None => resolver::resolve_root(raw, self.max_depth),
        };

        self.state = match resolved {
            Ok(schema) => SchemaState::Ready(schema),
            Err(e) => {
                warn!("Schema for {} {} is invalid: {}", self.protocol, self.resource_type, e);
                SchemaState::Invalid(e.to_string())
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    fn services_schema() -> Value {
        json!({
            "$defs": {
                "lb": {
                    "type": "object",
                    "properties": {
                        "servers": { "type": "array", "items": { "type": "object", "properties": { "url": { "type": "string" } } } },
                        "sticky": { "type": "object" },
                        "healthCheck": { "type": "object", "properties": { "path": { "type": "string" } } }
                    }
                },
                "mirroring": {
                    "type": "object",
                    "properties": { "service": { "type": "string" } }
                }
            },
            "oneOf": [
                { "properties": { "loadBalancer": { "$ref": "#/$defs/lb" } } },
                { "properties": { "mirroring": { "$ref": "#/$defs/mirroring" } } }
            ]
        })
    }

    struct FixedProvider(Option<Value>);

    #[async_trait]
    impl SchemaProvider for FixedProvider {
        async fn fetch_schema(&self, _protocol: Protocol, _resource_type: ResourceType) -> anyhow::Result<Value> {
            self.0.clone().ok_or_else(|| anyhow::anyhow!("connection refused"))
        }
    }

    #[test]
    fn test_starts_loading() {
        let session = FormSession::new(Protocol::Http, ResourceType::Services, FormMode::Edit);
        assert_eq!(session.view(&json!({})), FormView::Loading);
    }

    #[tokio::test]
    async fn test_load_branch() {
        let mut session =
            FormSession::new(Protocol::Http, ResourceType::Services, FormMode::Edit).with_branch("loadBalancer");
        session.load(&FixedProvider(Some(services_schema()))).await.unwrap();

        let FormView::Ready { layout, active_tab } = session.view(&json!({})) else {
            panic!("expected ready view")
        };
        assert_eq!(layout.tab_ids(), vec!["general", "healthCheck"]);
        assert_eq!(active_tab.as_deref(), Some("general"));
    }

    #[tokio::test]
    async fn test_fetch_failure() {
        let mut session = FormSession::new(Protocol::Http, ResourceType::Services, FormMode::Edit);
        let err = session.load(&FixedProvider(None)).await.unwrap_err();
        assert_eq!(err, FormError::SchemaFetch("connection refused".to_string()));
        assert!(matches!(session.view(&json!({})), FormView::FetchFailed { .. }));
    }

    #[tokio::test]
    async fn test_missing_branch_is_invalid() {
        let mut session =
            FormSession::new(Protocol::Http, ResourceType::Services, FormMode::Edit).with_branch("failover");
        let err = session.load(&FixedProvider(Some(services_schema()))).await.unwrap_err();
        assert!(matches!(err, FormError::SchemaInvalid(_)));
        assert!(matches!(session.view(&json!({})), FormView::Invalid { .. }));
    }

    #[test]
    fn test_stale_response_is_dropped() {
        let mut session = FormSession::new(Protocol::Http, ResourceType::Services, FormMode::Edit);
        let first = session.begin_request();
        let second = session.begin_request();

        assert!(!session.accept_schema(first, Ok(json!({ "properties": { "a": { "type": "string" } } }))));
        assert_eq!(session.state(), &SchemaState::Loading);

        assert!(session.accept_schema(second, Ok(json!({ "properties": { "b": { "type": "string" } } }))));
        let SchemaState::Ready(schema) = session.state() else { panic!("expected ready") };
        assert!(schema.property("b").is_some());
    }

    #[test]
    fn test_switch_branch_resets_tab() {
        let mut session =
            FormSession::new(Protocol::Http, ResourceType::Services, FormMode::Edit).with_branch("loadBalancer");
        let request = session.begin_request();
        session.accept_schema(request, Ok(services_schema()));

        session.select_tab("healthCheck");
        let FormView::Ready { active_tab, .. } = session.view(&json!({})) else { panic!("expected ready") };
        assert_eq!(active_tab.as_deref(), Some("healthCheck"));

        session.switch_branch(Some("mirroring".to_string()));
        let FormView::Ready { layout, active_tab } = session.view(&json!({})) else { panic!("expected ready") };
        assert!(active_tab.is_none());
        assert!(matches!(layout, FormLayout::Flat { .. }));
    }

    #[test]
    fn test_unknown_tab_falls_back_to_first() {
        let mut session =
            FormSession::new(Protocol::Http, ResourceType::Services, FormMode::Edit).with_branch("loadBalancer");
        let request = session.begin_request();
        session.accept_schema(request, Ok(services_schema()));
        session.select_tab("nope");

        let FormView::Ready { active_tab, .. } = session.view(&json!({})) else { panic!("expected ready") };
        assert_eq!(active_tab.as_deref(), Some("general"));
    }
}
