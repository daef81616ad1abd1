//! Path-addressed reads and copy-on-write writes over a value tree
//!
//! `set` never mutates its input. Writing `None`, `null` or `""` deletes the
//! addressed key instead of storing an empty value, so serialised
//! configuration stays minimal. `0` and `false` are stored like any other value.

use serde_json::{Map, Value};

use tracing::debug;

use super::error::FormError;
use super::types::{FieldPath, PathSegment};

/// Values that are written as a deletion
pub fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// Read the value at `path`; `None` when any segment is missing
pub fn get<'a>(tree: &'a Value, path: &FieldPath) -> Option<&'a Value> {
    path.segments()
        .iter()
        .try_fold(tree, |current, segment| match (current, segment) {
            (Value::Object(map), PathSegment::Key(key)) => map.get(key),
            (Value::Array(items), PathSegment::Index(idx)) => items.get(*idx),
            _ => None,
        })
}

/// Return a copy of `tree` with `value` written at `path`
///
/// Missing intermediate containers are created as objects or arrays
/// depending on the next segment. An index may address an existing element
/// or the slot just past the end, which appends. An empty value removes the
/// terminal key (or array element) and never creates intermediates. At the
/// root, writing replaces the tree and deleting yields `{}`.
///
/// A write past the end of an array leaves the tree unchanged; use
/// [`try_set`] to observe that failure.
pub fn set(tree: &Value, path: &FieldPath, value: Option<Value>) -> Value {
    try_set(tree, path, value).unwrap_or_else(|err| {
        debug!("Ignoring write: {}", err);
        tree.clone()
    })
}

/// Checked form of [`set`]
pub fn try_set(tree: &Value, path: &FieldPath, value: Option<Value>) -> Result<Value, FormError> {
    let mut new_tree = tree.clone();

    if is_empty_value(value.as_ref()) {
        if path.is_root() {
            return Ok(Value::Object(Map::new()));
        }
        remove_at(&mut new_tree, path.segments());
        return Ok(new_tree);
    }

    if let Some(value) = value {
        write_at(&mut new_tree, path.segments(), value).map_err(|reason| FormError::InvalidEdit {
            path: path.to_string(),
            reason,
        })?;
    }
    Ok(new_tree)
}

fn write_at(slot: &mut Value, segments: &[PathSegment], value: Value) -> Result<(), String> {
    let Some((head, rest)) = segments.split_first() else {
        *slot = value;
        return Ok(());
    };

    match head {
        PathSegment::Key(key) => {
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            match slot {
                Value::Object(map) => {
                    let child = map.entry(key.clone()).or_insert(Value::Null);
                    write_at(child, rest, value)
                }
                _ => Ok(()),
            }
        }
        PathSegment::Index(idx) => {
            if !slot.is_array() {
                *slot = Value::Array(Vec::new());
            }
            let Value::Array(items) = slot else {
                return Ok(());
            };
            if *idx > items.len() {
                return Err(format!("index {} is past the end of a list of {}", idx, items.len()));
            }
            if *idx == items.len() {
                items.push(Value::Null);
            }
            write_at(&mut items[*idx], rest, value)
        }
    }
}

fn remove_at(slot: &mut Value, segments: &[PathSegment]) {
    match segments {
        [] => {}
        [last] => match (slot, last) {
            (Value::Object(map), PathSegment::Key(key)) => {
                map.shift_remove(key);
            }
            (Value::Array(items), PathSegment::Index(idx)) if *idx < items.len() => {
                items.remove(*idx);
            }
            _ => {}
        },
        [head, rest @ ..] => {
            let child = match (slot, head) {
                (Value::Object(map), PathSegment::Key(key)) => map.get_mut(key),
                (Value::Array(items), PathSegment::Index(idx)) => items.get_mut(*idx),
                _ => None,
            };
            if let Some(child) = child {
                remove_at(child, rest);
            }
        }
    }
}

/// Elements of the array at `path`, or an empty list
pub fn items_at(tree: &Value, path: &FieldPath) -> Vec<Value> {
    get(tree, path)
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default()
}

/// Entries of the object at `path`, or an empty map
pub fn entries_at(tree: &Value, path: &FieldPath) -> Map<String, Value> {
    get(tree, path)
        .and_then(|v| v.as_object())
        .cloned()
        .unwrap_or_default()
}
