//! Field classification: which rendering strategy applies to a schema property
//!
//! The order of checks in [`classify_in`] is load-bearing. Several predicates
//! can hold for one property (a reference field may also carry an `enum`, an
//! object may have both `properties` and `additionalProperties`); the first
//! match wins.

use serde::{Deserialize, Serialize};

use super::types::SchemaNode;
use crate::domain::ResourceType;

/// Domain concepts whose values name other resources
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReferenceKind {
    /// Ordered middleware chain
    Middlewares,
    Service,
    /// Backup service of a failover
    Fallback,
    ParentRefs,
    EntryPoints,
    /// Routing rule expression
    Rule,
    TlsOptions,
    CertResolver,
}

impl ReferenceKind {
    /// Resource type the picker for this field lists, if it uses one
    pub fn target(&self) -> Option<ResourceType> {
        match self {
            ReferenceKind::Middlewares => Some(ResourceType::Middlewares),
            ReferenceKind::Service | ReferenceKind::Fallback => Some(ResourceType::Services),
            ReferenceKind::ParentRefs => Some(ResourceType::Routers),
            ReferenceKind::TlsOptions => Some(ResourceType::Tls),
            ReferenceKind::EntryPoints | ReferenceKind::Rule | ReferenceKind::CertResolver => None,
        }
    }

    /// Description shown when the schema has none
    pub fn default_description(&self) -> Option<&'static str> {
        match self {
            ReferenceKind::Fallback => {
                Some("Backup service activated when the main service becomes unreachable")
            }
            ReferenceKind::CertResolver => Some("Name of the certificate resolver (e.g., letsencrypt)"),
            _ => None,
        }
    }
}

/// How a boolean flag is stored
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FlagStyle {
    /// `true` / `false`
    Boolean,
    /// `{}` when on, key absent when off
    ObjectPresence,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum RenderStrategy {
    DomainReference(ReferenceKind),
    EnumSelect,
    MultilineText,
    PlainText,
    Number,
    BooleanFlag(FlagStyle),
    KeyValueMap,
    NestedStruct,
    ArrayOfStruct,
    ArrayOfScalar,
    Fallback,
}

impl RenderStrategy {
    /// Composite fields get their own tab when the form also has simple fields
    pub fn is_composite(&self) -> bool {
        matches!(self, RenderStrategy::NestedStruct)
    }
}

/// Where a property sits; array items apply an extra reference rule
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldContext {
    Property,
    ArrayItem,
}

/// Classify a top-level or nested struct property
pub fn classify(name: &str, node: &SchemaNode) -> RenderStrategy {
    classify_in(FieldContext::Property, name, node)
}

pub fn classify_in(context: FieldContext, name: &str, node: &SchemaNode) -> RenderStrategy {
    let types = &node.types;

    if let Some(kind) = domain_reference(context, name, node) {
        return RenderStrategy::DomainReference(kind);
    }

    if types.includes("string") {
        if node.has_enum() {
            return RenderStrategy::EnumSelect;
        }
        let multiline = node.format.as_deref() == Some("textarea")
            || node
                .description
                .as_deref()
                .is_some_and(|d| d.contains("multiline"));
        if multiline {
            return RenderStrategy::MultilineText;
        }
        return RenderStrategy::PlainText;
    }

    if types.is_numeric() {
        return RenderStrategy::Number;
    }

    if types.includes("boolean") {
        return RenderStrategy::BooleanFlag(FlagStyle::Boolean);
    }

    if types.includes("array") {
        let struct_items = node
            .items
            .as_ref()
            .is_some_and(|items| items.types.includes("object") || items.is_struct());
        return if struct_items {
            RenderStrategy::ArrayOfStruct
        } else {
            RenderStrategy::ArrayOfScalar
        };
    }

    if types.includes("object") {
        if node.is_map() {
            return RenderStrategy::KeyValueMap;
        }
        if node.properties.is_empty() {
            return RenderStrategy::BooleanFlag(FlagStyle::ObjectPresence);
        }
        return RenderStrategy::NestedStruct;
    }

    RenderStrategy::Fallback
}

fn domain_reference(context: FieldContext, name: &str, node: &SchemaNode) -> Option<ReferenceKind> {
    let types = &node.types;

    if context == FieldContext::ArrayItem
        && types.includes("string")
        && !node.has_enum()
        && matches!(name, "name" | "service" | "fallback")
    {
        return Some(ReferenceKind::Service);
    }

    let kind = match name {
        "middlewares" if types.includes("array") => ReferenceKind::Middlewares,
        "service" if types.includes("string") => ReferenceKind::Service,
        "fallback" if types.includes("string") => ReferenceKind::Fallback,
        "parentRefs" if types.includes("array") => ReferenceKind::ParentRefs,
        "entryPoints" if types.includes("array") => ReferenceKind::EntryPoints,
        "rule" if types.includes("string") => ReferenceKind::Rule,
        "options" if types.includes("string") => ReferenceKind::TlsOptions,
        "certResolver" if types.includes("string") => ReferenceKind::CertResolver,
        _ => return None,
    };
    Some(kind)
}
