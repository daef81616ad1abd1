//! JSON Schema resolution with $ref support
//!
//! Replaces every `$ref` pointer with the subtree it points at, drops the
//! `$defs`/`definitions` tables, and extracts single `oneOf` branches
//! (service subtypes, middleware types) from a resolved document.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::error::SchemaError;
use super::types::SchemaNode;
use crate::domain::ServiceSubtype;

/// Default cap on schema nesting, counted in JSON objects and arrays
pub const DEFAULT_MAX_DEPTH: usize = 64;

// ============================================================================
// Resolution Context
// ============================================================================

/// Context for one resolution pass over a root document
pub struct SchemaResolutionContext<'a> {
    /// Document that `$ref` pointers are evaluated against
    root: &'a Value,
    /// Refs currently being expanded, innermost last
    active_refs: Vec<String>,
    pub max_depth: usize,
}

impl<'a> SchemaResolutionContext<'a> {
    pub fn new(root: &'a Value) -> Self {
        Self {
            root,
            active_refs: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Returns false when the ref is already being expanded (cycle)
    fn enter_ref(&mut self, ref_path: &str) -> bool {
        if self.active_refs.iter().any(|r| r == ref_path) {
            return false;
        }
        self.active_refs.push(ref_path.to_string());
        true
    }

    fn exit_ref(&mut self) {
        self.active_refs.pop();
    }

    fn lookup(&self, ref_path: &str) -> Option<&'a Value> {
        let pointer = ref_path.strip_prefix('#')?;
        if pointer.is_empty() {
            return Some(self.root);
        }
        self.root.pointer(pointer)
    }
}

// ============================================================================
// Schema Resolution
// ============================================================================

/// Resolve all `$ref` pointers inside `schema` against `root`
pub fn resolve(schema: &Value, root: &Value) -> Result<Value, SchemaError> {
    let mut ctx = SchemaResolutionContext::new(root);
    resolve_value(schema, &mut ctx, 0)
}

/// Resolve a whole document against itself
pub fn resolve_document(root: &Value, max_depth: usize) -> Result<Value, SchemaError> {
    let mut ctx = SchemaResolutionContext::new(root).with_max_depth(max_depth);
    resolve_value(root, &mut ctx, 0)
}

/// Resolve a JSON value, recursing through objects and arrays
pub fn resolve_value(
    schema: &Value,
    ctx: &mut SchemaResolutionContext<'_>,
    depth: usize,
) -> Result<Value, SchemaError> {
    match schema {
        Value::Object(obj) => {
            if depth > ctx.max_depth {
                warn!("Schema nesting exceeded max depth {}", ctx.max_depth);
                return Err(SchemaError::DepthExceeded(ctx.max_depth));
            }

            if let Some(ref_value) = obj.get("$ref").and_then(|v| v.as_str()) {
                return resolve_ref(ref_value, ctx, depth);
            }

            let mut result = Map::new();
            for (key, value) in obj {
                if key == "$defs" || key == "definitions" {
                    continue;
                }
                result.insert(key.clone(), resolve_value(value, ctx, depth + 1)?);
            }
            Ok(Value::Object(result))
        }
        Value::Array(items) => {
            if depth > ctx.max_depth {
                return Err(SchemaError::DepthExceeded(ctx.max_depth));
            }
            items
                .iter()
                .map(|item| resolve_value(item, ctx, depth + 1))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        scalar => Ok(scalar.clone()),
    }
}

/// Resolve a $ref reference
fn resolve_ref(
    ref_value: &str,
    ctx: &mut SchemaResolutionContext<'_>,
    depth: usize,
) -> Result<Value, SchemaError> {
    if !ctx.enter_ref(ref_value) {
        warn!("Circular schema reference: {}", ref_value);
        return Err(SchemaError::CircularRef(ref_value.to_string()));
    }

    let result = match ctx.lookup(ref_value) {
        Some(target) => resolve_value(target, ctx, depth + 1),
        None => {
            debug!("Reference target not found: {}", ref_value);
            Err(SchemaError::UnresolvableRef(ref_value.to_string()))
        }
    };

    ctx.exit_ref();
    result
}

// ============================================================================
// Branch Extraction
// ============================================================================

/// Locate the `oneOf` member declaring `key` and return that property's schema
///
/// Falls back to a root-level `properties[key]`, which is how middleware
/// documents list their types.
pub fn extract_branch(root: &Value, key: &str) -> Result<SchemaNode, SchemaError> {
    extract_branch_with_depth(root, key, DEFAULT_MAX_DEPTH)
}

pub fn extract_branch_with_depth(
    root: &Value,
    key: &str,
    max_depth: usize,
) -> Result<SchemaNode, SchemaError> {
    let resolved = resolve_document(root, max_depth)?;

    let from_one_of = resolved
        .get("oneOf")
        .and_then(|v| v.as_array())
        .and_then(|options| {
            options
                .iter()
                .find_map(|option| option.get("properties").and_then(|p| p.get(key)))
        });

    let branch = from_one_of
        .or_else(|| resolved.get("properties").and_then(|p| p.get(key)))
        .ok_or_else(|| SchemaError::BranchNotFound(key.to_string()))?;

    let node = SchemaNode::from_value(branch);
    if node.properties.is_empty() {
        return Err(SchemaError::MissingProperties);
    }
    Ok(node)
}

/// Resolve a whole document and require top-level `properties`
pub fn resolve_root(root: &Value, max_depth: usize) -> Result<SchemaNode, SchemaError> {
    let node = SchemaNode::from_value(&resolve_document(root, max_depth)?);
    if node.properties.is_empty() {
        return Err(SchemaError::MissingProperties);
    }
    Ok(node)
}

/// Work out which service flavour a stored configuration uses
///
/// Returns the subtype and the configuration stored under its key. A
/// configuration with none of the subtype keys is treated as a bare load
/// balancer body.
pub fn detect_service_subtype(config: &Value) -> (ServiceSubtype, Value) {
    for subtype in ServiceSubtype::DETECTION_ORDER {
        if let Some(inner) = config.get(subtype.key()) {
            return (subtype, inner.clone());
        }
    }
    (ServiceSubtype::LoadBalancer, config.clone())
}

// ============================================================================
// Tests
// ============================================================================
