//! Recursive field renderer
//!
//! Walks a schema's `properties`, classifies each one and produces a
//! serialisable description of the widgets a shell should draw. Composite
//! fields recurse with an extended [`FieldPath`]. Domain reference fields are
//! described as pickers and never rendered as raw inputs in edit mode.
//!
//! Rendering is a pure function of `(schema, value, mode)`. Nothing here keeps
//! a reference to the value tree or writes to it; edits flow back through
//! [`FieldEdit`](super::edits::FieldEdit) and the controller.

use serde::Serialize;
use serde_json::{Number, Value};

use super::classifier::{classify_in, FieldContext, FlagStyle, ReferenceKind, RenderStrategy};
use super::error::FormError;
use super::types::{FieldPath, FormMode, SchemaNode};
use crate::domain::{Protocol, ResourceType};
use crate::rules::RuleDialect;

pub const GENERAL_TAB_ID: &str = "general";
const GENERAL_TAB_TITLE: &str = "General";
const EMPTY_TEXT: &str = "-";
const EMPTY_LIST_TEXT: &str = "None";
const CERT_RESOLVER_PLACEHOLDER: &str = "e.g., letsencrypt";
const SEARCHABLE_OPTION_THRESHOLD: usize = 10;

// ============================================================================
// Rendered Description
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "layout", rename_all = "camelCase")]
pub enum FormLayout {
    Flat { fields: Vec<FieldView> },
    Tabbed { tabs: Vec<FormTab> },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FormTab {
    pub id: String,
    pub title: String,
    pub fields: Vec<FieldView>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldView {
    pub key: String,
    pub path: FieldPath,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
    pub strategy: RenderStrategy,
    pub widget: Widget,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SelectOption {
    pub value: Value,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MapEntry {
    pub key: String,
    pub value: String,
}

/// Widget description. The last group of variants only appears in read-only forms.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "widget", rename_all = "camelCase")]
pub enum Widget {
    /// Searchable picker over existing resources
    #[serde(rename_all = "camelCase")]
    ResourcePicker {
        reference: ReferenceKind,
        protocol: Protocol,
        resource_type: ResourceType,
        selected: Option<String>,
    },
    /// Ordered middleware chain with add/remove/reorder
    MiddlewareList {
        protocol: Protocol,
        selected: Vec<String>,
    },
    EntryPointSelect { selected: Vec<String> },
    /// One router picker per parent reference
    ParentRefList {
        protocol: Protocol,
        items: Vec<String>,
    },
    /// Rule text plus an optional visual builder
    RuleInput {
        expression: String,
        builder: Option<RuleDialect>,
    },
    Select {
        options: Vec<SelectOption>,
        selected: Option<Value>,
        clearable: bool,
        searchable: bool,
    },
    TextArea { value: String },
    TextInput {
        value: String,
        placeholder: Option<String>,
    },
    NumberInput {
        value: Option<Value>,
        minimum: Option<Number>,
        maximum: Option<Number>,
    },
    Switch { style: FlagStyle, on: bool },
    KeyValueEditor { entries: Vec<MapEntry> },
    StructGroup { fields: Vec<FieldView> },
    /// One field set per element; `new_item` is what "add" appends
    #[serde(rename_all = "camelCase")]
    StructList {
        items: Vec<Vec<FieldView>>,
        new_item: Value,
    },
    #[serde(rename_all = "camelCase")]
    ScalarList {
        items: Vec<String>,
        new_item: Value,
    },

    Display { text: String, multiline: bool },
    StatusBadge { enabled: bool },
    BadgeList { items: Vec<String> },
    EntryList { entries: Vec<MapEntry> },
}

impl FormLayout {
    /// Visit every field, including those nested in groups and lists
    pub fn visit(&self, f: &mut impl FnMut(&FieldView)) {
        match self {
            FormLayout::Flat { fields } => visit_fields(fields, f),
            FormLayout::Tabbed { tabs } => tabs.iter().for_each(|tab| visit_fields(&tab.fields, f)),
        }
    }

    pub fn tab_ids(&self) -> Vec<&str> {
        match self {
            FormLayout::Flat { .. } => Vec::new(),
            FormLayout::Tabbed { tabs } => tabs.iter().map(|t| t.id.as_str()).collect(),
        }
    }

    pub fn find(&self, path: &FieldPath) -> Option<FieldView> {
        let mut found = None;
        self.visit(&mut |field| {
            if found.is_none() && field.path == *path {
                found = Some(field.clone());
            }
        });
        found
    }
}

fn visit_fields(fields: &[FieldView], f: &mut impl FnMut(&FieldView)) {
    for field in fields {
        f(field);
        match &field.widget {
            Widget::StructGroup { fields } => visit_fields(fields, f),
            Widget::StructList { items, .. } => items.iter().for_each(|item| visit_fields(item, f)),
            _ => {}
        }
    }
}

// ============================================================================
// Renderer
// ============================================================================

pub struct FormRenderer {
    protocol: Protocol,
    mode: FormMode,
}

impl FormRenderer {
    pub fn new(protocol: Protocol, mode: FormMode) -> Self {
        Self { protocol, mode }
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    /// Render a whole resource form, choosing between flat and tabbed layout
    pub fn render(&self, schema: &SchemaNode, value: &Value) -> Result<FormLayout, FormError> {
        if schema.properties.is_empty() {
            return Err(FormError::SchemaInvalid("schema has no properties".to_string()));
        }

        let root = FieldPath::root();
        let (composite, simple): (Vec<_>, Vec<_>) = schema
            .properties
            .iter()
            .partition(|(key, node)| classify_in(FieldContext::Property, key, node).is_composite());

        if simple.is_empty() && composite.len() == 1 {
            let (key, node) = composite[0];
            let path = root.push_key(key);
            let scope = child_value(value, key);
            return Ok(FormLayout::Flat {
                fields: self.render_fields(&node.properties, &scope, &path, &node.required),
            });
        }

        if simple.is_empty() || composite.is_empty() {
            return Ok(FormLayout::Flat {
                fields: self.render_fields(&schema.properties, value, &root, &schema.required),
            });
        }

        let simple_props: Vec<(String, SchemaNode)> =
            simple.into_iter().map(|(k, n)| (k.clone(), n.clone())).collect();
        let mut tabs = vec![FormTab {
            id: GENERAL_TAB_ID.to_string(),
            title: GENERAL_TAB_TITLE.to_string(),
            fields: self.render_fields(&simple_props, value, &root, &schema.required),
        }];

        for (key, node) in composite {
            let scope = child_value(value, key);
            tabs.push(FormTab {
                id: key.clone(),
                title: field_label(key, node),
                fields: self.render_fields(&node.properties, &scope, &root.push_key(key), &node.required),
            });
        }

        Ok(FormLayout::Tabbed { tabs })
    }

    /// Render struct properties. `scope` is the value stored at `base_path`.
    pub fn render_fields(
        &self,
        properties: &[(String, SchemaNode)],
        scope: &Value,
        base_path: &FieldPath,
        required: &[String],
    ) -> Vec<FieldView> {
        self.render_fields_in(FieldContext::Property, properties, scope, base_path, required)
    }

    fn render_fields_in(
        &self,
        context: FieldContext,
        properties: &[(String, SchemaNode)],
        scope: &Value,
        base_path: &FieldPath,
        required: &[String],
    ) -> Vec<FieldView> {
        properties
            .iter()
            .map(|(key, node)| {
                let strategy = classify_in(context, key, node);
                let path = base_path.push_key(key);
                let is_required = required.iter().any(|r| r == key);
                let current = effective_value(scope, key, node);

                let description = node.description.clone().or_else(|| {
                    reference_kind(&strategy)
                        .and_then(|kind| kind.default_description())
                        .map(String::from)
                        .or_else(|| {
                            (context == FieldContext::ArrayItem
                                && matches!(strategy, RenderStrategy::DomainReference(_)))
                            .then(|| "Reference to an existing service".to_string())
                        })
                });

                let widget = match self.mode {
                    FormMode::Edit => self.edit_widget(&strategy, node, current.as_ref(), &path, is_required),
                    FormMode::ReadOnly => self.read_only_widget(&strategy, node, current.as_ref(), &path),
                };

                FieldView {
                    key: key.clone(),
                    path,
                    label: field_label(key, node),
                    description,
                    required: is_required,
                    strategy,
                    widget,
                }
            })
            .collect()
    }

    fn edit_widget(
        &self,
        strategy: &RenderStrategy,
        node: &SchemaNode,
        current: Option<&Value>,
        path: &FieldPath,
        required: bool,
    ) -> Widget {
        match strategy {
            RenderStrategy::DomainReference(kind) => self.reference_widget(*kind, current),

            RenderStrategy::EnumSelect => {
                let options: Vec<SelectOption> = node
                    .enum_values
                    .iter()
                    .flatten()
                    .map(|v| SelectOption {
                        value: v.clone(),
                        label: display_text(v),
                    })
                    .collect();
                let searchable = options.len() > SEARCHABLE_OPTION_THRESHOLD;
                Widget::Select {
                    options,
                    selected: current.cloned(),
                    clearable: !required,
                    searchable,
                }
            }

            RenderStrategy::MultilineText => Widget::TextArea {
                value: current.map(display_text).unwrap_or_default(),
            },

            RenderStrategy::PlainText | RenderStrategy::Fallback => Widget::TextInput {
                value: current.map(display_text).unwrap_or_default(),
                placeholder: None,
            },

            RenderStrategy::Number => Widget::NumberInput {
                value: current.cloned(),
                minimum: node.minimum.clone(),
                maximum: node.maximum.clone(),
            },

            RenderStrategy::BooleanFlag(style) => Widget::Switch {
                style: *style,
                on: flag_is_on(*style, current),
            },

            RenderStrategy::KeyValueMap => Widget::KeyValueEditor {
                entries: map_entries(current),
            },

            RenderStrategy::NestedStruct => {
                let scope = current.cloned().unwrap_or(Value::Null);
                Widget::StructGroup {
                    fields: self.render_fields(&node.properties, &scope, path, &node.required),
                }
            }

            RenderStrategy::ArrayOfStruct => Widget::StructList {
                items: self.render_items(node, current, path),
                new_item: Value::Object(Default::default()),
            },

            RenderStrategy::ArrayOfScalar => Widget::ScalarList {
                items: list_texts(current),
                new_item: Value::String(String::new()),
            },
        }
    }

    fn reference_widget(&self, kind: ReferenceKind, current: Option<&Value>) -> Widget {
        match kind {
            ReferenceKind::Middlewares => Widget::MiddlewareList {
                protocol: self.protocol,
                selected: list_texts(current),
            },
            ReferenceKind::EntryPoints => Widget::EntryPointSelect {
                selected: list_texts(current),
            },
            ReferenceKind::ParentRefs => Widget::ParentRefList {
                protocol: self.protocol,
                items: list_texts(current),
            },
            ReferenceKind::Rule => Widget::RuleInput {
                expression: current.map(display_text).unwrap_or_default(),
                builder: self.protocol.rule_dialect(),
            },
            ReferenceKind::CertResolver => Widget::TextInput {
                value: current.map(display_text).unwrap_or_default(),
                placeholder: Some(CERT_RESOLVER_PLACEHOLDER.to_string()),
            },
            ReferenceKind::Service | ReferenceKind::Fallback | ReferenceKind::TlsOptions => {
                Widget::ResourcePicker {
                    reference: kind,
                    protocol: self.protocol,
                    resource_type: kind.target().unwrap_or(ResourceType::Services),
                    selected: current
                        .map(display_text)
                        .filter(|s| !s.is_empty()),
                }
            }
        }
    }

    fn read_only_widget(
        &self,
        strategy: &RenderStrategy,
        node: &SchemaNode,
        current: Option<&Value>,
        path: &FieldPath,
    ) -> Widget {
        match strategy {
            RenderStrategy::DomainReference(_) => {
                if node.types.includes("array") || matches!(current, Some(Value::Array(_))) {
                    badge_list(current)
                } else {
                    text_display(current, false)
                }
            }
            RenderStrategy::MultilineText => text_display(current, true),
            RenderStrategy::BooleanFlag(style) => Widget::StatusBadge {
                enabled: flag_is_on(*style, current),
            },
            RenderStrategy::KeyValueMap => {
                let entries = map_entries(current);
                if entries.is_empty() {
                    empty_list_display()
                } else {
                    Widget::EntryList { entries }
                }
            }
            RenderStrategy::NestedStruct => {
                let scope = current.cloned().unwrap_or(Value::Null);
                Widget::StructGroup {
                    fields: self.render_fields(&node.properties, &scope, path, &node.required),
                }
            }
            RenderStrategy::ArrayOfStruct => {
                let items = self.render_items(node, current, path);
                if items.is_empty() {
                    empty_list_display()
                } else {
                    Widget::StructList {
                        items,
                        new_item: Value::Null,
                    }
                }
            }
            RenderStrategy::ArrayOfScalar => badge_list(current),
            RenderStrategy::EnumSelect
            | RenderStrategy::PlainText
            | RenderStrategy::Number
            | RenderStrategy::Fallback => text_display(current, false),
        }
    }

    fn render_items(&self, node: &SchemaNode, current: Option<&Value>, path: &FieldPath) -> Vec<Vec<FieldView>> {
        let Some(items_schema) = node.items.as_deref() else {
            return Vec::new();
        };
        current
            .and_then(|v| v.as_array())
            .map(|elements| {
                elements
                    .iter()
                    .enumerate()
                    .map(|(idx, element)| {
                        self.render_fields_in(
                            FieldContext::ArrayItem,
                            &items_schema.properties,
                            element,
                            &path.push_index(idx),
                            &items_schema.required,
                        )
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Title from the schema, else the humanised key
pub fn field_label(key: &str, node: &SchemaNode) -> String {
    node.title.clone().unwrap_or_else(|| humanize(key))
}

/// "passHostHeader" -> "Pass Host Header", "max_body" -> "Max body"
pub fn humanize(key: &str) -> String {
    let mut spaced = String::with_capacity(key.len() + 4);
    for (i, ch) in key.chars().enumerate() {
        if ch.is_uppercase() && i > 0 {
            spaced.push(' ');
        }
        spaced.push(if ch == '_' { ' ' } else { ch });
    }

    let trimmed = spaced.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn child_value(value: &Value, key: &str) -> Value {
    value.get(key).cloned().unwrap_or(Value::Null)
}

/// Stored value unless absent or null, else the schema default
fn effective_value(scope: &Value, key: &str, node: &SchemaNode) -> Option<Value> {
    match scope.get(key) {
        Some(Value::Null) | None => node.default.clone(),
        Some(v) => Some(v.clone()),
    }
}

fn reference_kind(strategy: &RenderStrategy) -> Option<ReferenceKind> {
    match strategy {
        RenderStrategy::DomainReference(kind) => Some(*kind),
        _ => None,
    }
}

fn display_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn flag_is_on(style: FlagStyle, current: Option<&Value>) -> bool {
    match style {
        FlagStyle::Boolean => current.and_then(|v| v.as_bool()).unwrap_or(false),
        FlagStyle::ObjectPresence => matches!(current, Some(Value::Object(_))),
    }
}

fn list_texts(current: Option<&Value>) -> Vec<String> {
    current
        .and_then(|v| v.as_array())
        .map(|items| items.iter().map(display_text).collect())
        .unwrap_or_default()
}

fn map_entries(current: Option<&Value>) -> Vec<MapEntry> {
    current
        .and_then(|v| v.as_object())
        .map(|entries| {
            entries
                .iter()
                .map(|(key, value)| MapEntry {
                    key: key.clone(),
                    value: display_text(value),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn text_display(current: Option<&Value>, multiline: bool) -> Widget {
    let text = current.map(display_text).unwrap_or_default();
    Widget::Display {
        text: if text.is_empty() { EMPTY_TEXT.to_string() } else { text },
        multiline,
    }
}

fn badge_list(current: Option<&Value>) -> Widget {
    let items: Vec<String> = list_texts(current)
        .into_iter()
        .map(|s| if s.is_empty() { EMPTY_TEXT.to_string() } else { s })
        .collect();
    if items.is_empty() {
        empty_list_display()
    } else {
        Widget::BadgeList { items }
    }
}

fn empty_list_display() -> Widget {
    Widget::Display {
        text: EMPTY_LIST_TEXT.to_string(),
        multiline: false,
    }
}

// ============================================================================
// Tests
// ============================================================================
