//! Core types for schema-driven form generation

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;

// ============================================================================
// Form Mode
// ============================================================================

/// Mode for schema form generation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormMode {
    /// Users edit values; every widget reports changes through the controller
    #[default]
    Edit,
    /// Static projection of the same value; nothing is writable
    ReadOnly,
}

// ============================================================================
// Field Path
// ============================================================================

/// Segment of a field path
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Object property access: .fieldName
    Key(String),
    /// Array index access: [0], [1], etc.
    Index(usize),
}

/// Location inside a value tree (e.g., "loadBalancer.servers[0].url")
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    pub fn root() -> Self {
        Self { segments: vec![] }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Extend with an object key
    pub fn push_key(&self, key: &str) -> Self {
        let mut new = self.clone();
        new.segments.push(PathSegment::Key(key.to_string()));
        new
    }

    /// Extend with an array index
    pub fn push_index(&self, idx: usize) -> Self {
        let mut new = self.clone();
        new.segments.push(PathSegment::Index(idx));
        new
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// Get the parent path (without the last segment)
    pub fn parent(&self) -> Self {
        let mut new = self.clone();
        new.segments.pop();
        new
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Parse dotted notation back into a path. Malformed index brackets are skipped.
    pub fn parse(s: &str) -> Self {
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut chars = s.chars().peekable();

        while let Some(ch) = chars.next() {
            match ch {
                '.' => {
                    if !current.is_empty() {
                        segments.push(PathSegment::Key(std::mem::take(&mut current)));
                    }
                }
                '[' => {
                    if !current.is_empty() {
                        segments.push(PathSegment::Key(std::mem::take(&mut current)));
                    }
                    let mut index_str = String::new();
                    for c in chars.by_ref() {
                        if c == ']' {
                            break;
                        }
                        index_str.push(c);
                    }
                    if let Ok(idx) = index_str.trim().parse::<usize>() {
                        segments.push(PathSegment::Index(idx));
                    }
                }
                _ => current.push(ch),
            }
        }

        if !current.is_empty() {
            segments.push(PathSegment::Key(current));
        }

        Self { segments }
    }
}

impl From<Vec<PathSegment>> for FieldPath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            match seg {
                PathSegment::Key(name) if i == 0 => write!(f, "{}", name)?,
                PathSegment::Key(name) => write!(f, ".{}", name)?,
                PathSegment::Index(idx) => write!(f, "[{}]", idx)?,
            }
        }
        Ok(())
    }
}

// ============================================================================
// Schema Node
// ============================================================================

/// The `type` keyword: a single type name or a list of them
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeSet(Vec<String>);

impl TypeSet {
    fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::String(s)) => Self(vec![s.clone()]),
            Some(Value::Array(items)) => Self(
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect(),
            ),
            _ => Self::default(),
        }
    }

    fn to_value(&self) -> Option<Value> {
        match self.0.as_slice() {
            [] => None,
            [single] => Some(Value::String(single.clone())),
            many => Some(Value::Array(many.iter().cloned().map(Value::String).collect())),
        }
    }

    pub fn includes(&self, type_name: &str) -> bool {
        self.0.iter().any(|t| t == type_name)
    }

    pub fn is_numeric(&self) -> bool {
        self.includes("number") || self.includes("integer")
    }
}

/// `additionalProperties`: either a plain switch or the schema of map values
#[derive(Clone, Debug, PartialEq)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Box<SchemaNode>),
}

/// A dereferenced JSON Schema node, reduced to the keywords the form engine interprets
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SchemaNode {
    pub types: TypeSet,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Literal choices, kept in declaration order with their JSON types
    pub enum_values: Option<Vec<Value>>,
    pub items: Option<Box<SchemaNode>>,
    /// Properties in declaration order
    pub properties: Vec<(String, SchemaNode)>,
    pub required: Vec<String>,
    pub additional_properties: Option<AdditionalProperties>,
    pub default: Option<Value>,
    pub minimum: Option<Number>,
    pub maximum: Option<Number>,
    pub pattern: Option<String>,
    pub format: Option<String>,
}

impl SchemaNode {
    /// Read a schema node from JSON. Unknown or malformed keywords are ignored.
    pub fn from_value(schema: &Value) -> Self {
        let Some(obj) = schema.as_object() else {
            return Self::default();
        };

        let text = |key: &str| obj.get(key).and_then(|v| v.as_str()).map(String::from);

        let properties = obj
            .get("properties")
            .and_then(|v| v.as_object())
            .map(|props| {
                props
                    .iter()
                    .map(|(name, prop)| (name.clone(), SchemaNode::from_value(prop)))
                    .collect()
            })
            .unwrap_or_default();

        let required = obj
            .get("required")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();

        let additional_properties = match obj.get("additionalProperties") {
            Some(Value::Bool(allowed)) => Some(AdditionalProperties::Allowed(*allowed)),
            Some(schema @ Value::Object(_)) => Some(AdditionalProperties::Schema(Box::new(
                SchemaNode::from_value(schema),
            ))),
            _ => None,
        };

        Self {
            types: TypeSet::from_value(obj.get("type")),
            title: text("title"),
            description: text("description"),
            enum_values: obj.get("enum").and_then(|v| v.as_array()).cloned(),
            items: obj
                .get("items")
                .filter(|v| v.is_object())
                .map(|v| Box::new(SchemaNode::from_value(v))),
            properties,
            required,
            additional_properties,
            default: obj.get("default").cloned(),
            minimum: number(obj.get("minimum")),
            maximum: number(obj.get("maximum")),
            pattern: text("pattern"),
            format: text("format"),
        }
    }

    /// Convert back to a JSON Schema value
    pub fn to_value(&self) -> Value {
        let mut obj = Map::new();

        if let Some(types) = self.types.to_value() {
            obj.insert("type".to_string(), types);
        }
        if let Some(title) = &self.title {
            obj.insert("title".to_string(), Value::String(title.clone()));
        }
        if let Some(desc) = &self.description {
            obj.insert("description".to_string(), Value::String(desc.clone()));
        }
        if let Some(values) = &self.enum_values {
            obj.insert("enum".to_string(), Value::Array(values.clone()));
        }
        if let Some(items) = &self.items {
            obj.insert("items".to_string(), items.to_value());
        }
        if !self.properties.is_empty() {
            let props: Map<String, Value> = self
                .properties
                .iter()
                .map(|(name, prop)| (name.clone(), prop.to_value()))
                .collect();
            obj.insert("properties".to_string(), Value::Object(props));
        }
        if !self.required.is_empty() {
            obj.insert(
                "required".to_string(),
                Value::Array(self.required.iter().cloned().map(Value::String).collect()),
            );
        }
        match &self.additional_properties {
            Some(AdditionalProperties::Allowed(allowed)) => {
                obj.insert("additionalProperties".to_string(), Value::Bool(*allowed));
            }
            Some(AdditionalProperties::Schema(schema)) => {
                obj.insert("additionalProperties".to_string(), schema.to_value());
            }
            None => {}
        }
        if let Some(default) = &self.default {
            obj.insert("default".to_string(), default.clone());
        }
        if let Some(min) = &self.minimum {
            obj.insert("minimum".to_string(), Value::Number(min.clone()));
        }
        if let Some(max) = &self.maximum {
            obj.insert("maximum".to_string(), Value::Number(max.clone()));
        }
        if let Some(pattern) = &self.pattern {
            obj.insert("pattern".to_string(), Value::String(pattern.clone()));
        }
        if let Some(format) = &self.format {
            obj.insert("format".to_string(), Value::String(format.clone()));
        }

        Value::Object(obj)
    }

    pub fn property(&self, name: &str) -> Option<&SchemaNode> {
        self.properties
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, node)| node)
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }

    /// Non-empty `properties`
    pub fn is_struct(&self) -> bool {
        !self.properties.is_empty()
    }

    /// Open key-value map: a value schema under `additionalProperties` and no own properties
    pub fn is_map(&self) -> bool {
        self.properties.is_empty()
            && matches!(self.additional_properties, Some(AdditionalProperties::Schema(_)))
    }

    pub fn has_enum(&self) -> bool {
        self.enum_values.is_some()
    }
}

fn number(value: Option<&Value>) -> Option<Number> {
    match value {
        Some(Value::Number(n)) => Some(n.clone()),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_path_building() {
        let path = FieldPath::root()
            .push_key("loadBalancer")
            .push_key("healthCheck")
            .push_key("interval");

        assert_eq!(path.to_string(), "loadBalancer.healthCheck.interval");
        assert_eq!(path.segments().len(), 3);
    }

    #[test]
    fn test_field_path_with_array() {
        let path = FieldPath::root()
            .push_key("servers")
            .push_index(0)
            .push_key("url");

        assert_eq!(path.to_string(), "servers[0].url");
        assert_eq!(path.parent().to_string(), "servers[0]");
        assert_eq!(path.last(), Some(&PathSegment::Key("url".to_string())));
    }

    #[test]
    fn test_field_path_parse() {
        let path = FieldPath::parse("loadBalancer.servers[2].url");
        assert_eq!(path.segments().len(), 4);
        assert_eq!(path.segments()[2], PathSegment::Index(2));
        assert_eq!(path.to_string(), "loadBalancer.servers[2].url");

        assert!(FieldPath::parse("").is_root());
    }

    #[test]
    fn test_field_path_serde_is_segment_list() {
        let path = FieldPath::root().push_key("servers").push_index(1);
        let json = serde_json::to_value(&path).unwrap();
        assert_eq!(json, json!(["servers", 1]));

        let back: FieldPath = serde_json::from_value(json).unwrap();
        assert_eq!(back, path);
    }

    #[test]
    fn test_schema_node_from_value() {
        let node = SchemaNode::from_value(&json!({
            "type": "object",
            "title": "Weighted",
            "properties": {
                "sticky": { "type": "object", "properties": {} },
                "services": { "type": "array", "items": { "type": "object" } }
            },
            "required": ["services"]
        }));

        assert!(node.types.includes("object"));
        assert_eq!(node.title.as_deref(), Some("Weighted"));
        assert_eq!(node.properties.len(), 2);
        assert_eq!(node.properties[0].0, "sticky");
        assert!(node.is_required("services"));
        assert!(!node.is_required("sticky"));
        assert!(node.property("services").unwrap().items.is_some());
    }

    #[test]
    fn test_type_set_accepts_lists() {
        let node = SchemaNode::from_value(&json!({ "type": ["string", "null"] }));
        assert!(node.types.includes("string"));
        assert!(node.types.includes("null"));
        assert!(!node.types.is_numeric());
    }

    #[test]
    fn test_map_and_struct_are_distinguished() {
        let map = SchemaNode::from_value(&json!({
            "type": "object",
            "additionalProperties": { "type": "string" }
        }));
        assert!(map.is_map());
        assert!(!map.is_struct());

        let closed = SchemaNode::from_value(&json!({
            "type": "object",
            "additionalProperties": false
        }));
        assert!(!closed.is_map());
    }

    #[test]
    fn test_schema_node_to_value_keeps_keywords() {
        let schema = json!({
            "type": "object",
            "description": "Headers",
            "properties": {
                "port": { "type": "integer", "minimum": 1.0, "maximum": 65535.0 },
                "scheme": { "type": "string", "enum": ["http", "https"], "default": "http" }
            },
            "required": ["port"]
        });

        let node = SchemaNode::from_value(&schema);
        assert_eq!(node.to_value(), schema);
    }

    #[test]
    fn test_integer_bounds_stay_integers() {
        let node = SchemaNode::from_value(&json!({ "type": "integer", "minimum": 0, "maximum": 65535 }));
        let back = node.to_value();
        assert_eq!(back["minimum"], json!(0));
        assert_eq!(back["maximum"], json!(65535));
        assert!(back["minimum"].is_u64());

        let ignored = SchemaNode::from_value(&json!({ "type": "integer", "minimum": "0" }));
        assert!(ignored.minimum.is_none());
    }
}
