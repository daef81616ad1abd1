//! User edits and the pure function applying them to a value tree

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::classifier::FlagStyle;
use super::error::FormError;
use super::types::FieldPath;
use super::value_store::{self, entries_at, items_at};

/// One user interaction with a rendered field
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum FieldEdit {
    /// Write a scalar (or whole subtree); `None` deletes
    Set {
        path: FieldPath,
        #[serde(default)]
        value: Option<Value>,
    },
    ToggleFlag {
        path: FieldPath,
        style: FlagStyle,
        on: bool,
    },
    /// Add a blank entry to a key-value map
    MapAddEntry { path: FieldPath },
    /// Rename a key, keeping its value; a blank new key drops the entry
    MapRenameKey {
        path: FieldPath,
        from: String,
        to: String,
    },
    MapSetValue {
        path: FieldPath,
        key: String,
        value: String,
    },
    MapRemoveEntry { path: FieldPath, key: String },
    /// Append `{}` for struct arrays, `""` for scalar arrays
    ArrayAppend { path: FieldPath, item: Value },
    ArrayRemove { path: FieldPath, index: usize },
    /// Replace one element of a scalar array; empty strings are kept
    ArraySetItem {
        path: FieldPath,
        index: usize,
        value: Value,
    },
    /// Reorder a list (middleware chains)
    ListMove {
        path: FieldPath,
        from: usize,
        to: usize,
    },
    /// Append a name unless already present
    ListAddUnique { path: FieldPath, value: String },
    /// Write the rule builder's output; nothing happens for an empty expression
    CommitRule {
        path: FieldPath,
        #[serde(default)]
        expression: Option<String>,
    },
}

impl FieldEdit {
    pub fn path(&self) -> &FieldPath {
        match self {
            FieldEdit::Set { path, .. }
            | FieldEdit::ToggleFlag { path, .. }
            | FieldEdit::MapAddEntry { path }
            | FieldEdit::MapRenameKey { path, .. }
            | FieldEdit::MapSetValue { path, .. }
            | FieldEdit::MapRemoveEntry { path, .. }
            | FieldEdit::ArrayAppend { path, .. }
            | FieldEdit::ArrayRemove { path, .. }
            | FieldEdit::ArraySetItem { path, .. }
            | FieldEdit::ListMove { path, .. }
            | FieldEdit::ListAddUnique { path, .. }
            | FieldEdit::CommitRule { path, .. } => path,
        }
    }
}

/// Apply an edit, returning the replacement tree. `tree` is never modified.
pub fn apply_edit(tree: &Value, edit: &FieldEdit) -> Result<Value, FormError> {
    match edit {
        FieldEdit::Set { path, value } => value_store::try_set(tree, path, value.clone()),

        FieldEdit::ToggleFlag { path, style, on } => {
            let value = match (style, on) {
                (FlagStyle::Boolean, on) => Some(Value::Bool(*on)),
                (FlagStyle::ObjectPresence, true) => Some(Value::Object(Map::new())),
                (FlagStyle::ObjectPresence, false) => None,
            };
            value_store::try_set(tree, path, value)
        }

        FieldEdit::MapAddEntry { path } => {
            let mut entries = entries_at(tree, path);
            entries
                .entry(String::new())
                .or_insert_with(|| Value::String(String::new()));
            write_map(tree, path, entries)
        }

        FieldEdit::MapRenameKey { path, from, to } => {
            if from == to {
                return Ok(tree.clone());
            }
            let entries = entries_at(tree, path);
            if !entries.contains_key(from) {
                return Ok(tree.clone());
            }

            let blank = to.trim().is_empty();
            let mut renamed = Map::new();
            for (key, value) in entries {
                if key == *from {
                    if !blank {
                        renamed.insert(to.clone(), value);
                    }
                } else if key != *to {
                    renamed.insert(key, value);
                }
            }
            write_map(tree, path, renamed)
        }

        FieldEdit::MapSetValue { path, key, value } => {
            let mut entries = entries_at(tree, path);
            entries.insert(key.clone(), Value::String(value.clone()));
            write_map(tree, path, entries)
        }

        FieldEdit::MapRemoveEntry { path, key } => {
            let mut entries = entries_at(tree, path);
            entries.shift_remove(key);
            write_map(tree, path, entries)
        }

        FieldEdit::ArrayAppend { path, item } => {
            let mut items = items_at(tree, path);
            items.push(item.clone());
            write_list(tree, path, items)
        }

        FieldEdit::ArrayRemove { path, index } => {
            let mut items = items_at(tree, path);
            check_index(path, *index, items.len())?;
            items.remove(*index);
            write_list(tree, path, items)
        }

        FieldEdit::ArraySetItem { path, index, value } => {
            let mut items = items_at(tree, path);
            check_index(path, *index, items.len())?;
            items[*index] = value.clone();
            write_list(tree, path, items)
        }

        FieldEdit::ListMove { path, from, to } => {
            let mut items = items_at(tree, path);
            check_index(path, *from, items.len())?;
            check_index(path, *to, items.len())?;
            let moved = items.remove(*from);
            items.insert(*to, moved);
            write_list(tree, path, items)
        }

        FieldEdit::ListAddUnique { path, value } => {
            if value.is_empty() {
                return Ok(tree.clone());
            }
            let mut items = items_at(tree, path);
            if items.iter().any(|item| item.as_str() == Some(value.as_str())) {
                return Ok(tree.clone());
            }
            items.push(Value::String(value.clone()));
            write_list(tree, path, items)
        }

        FieldEdit::CommitRule { path, expression } => match expression.as_deref() {
            Some(expr) if !expr.trim().is_empty() => {
                value_store::try_set(tree, path, Some(Value::String(expr.to_string())))
            }
            _ => Ok(tree.clone()),
        },
    }
}

// Maps and lists are always written as a whole; an emptied container stays in place.
fn write_map(tree: &Value, path: &FieldPath, entries: Map<String, Value>) -> Result<Value, FormError> {
    value_store::try_set(tree, path, Some(Value::Object(entries)))
}

fn write_list(tree: &Value, path: &FieldPath, items: Vec<Value>) -> Result<Value, FormError> {
    value_store::try_set(tree, path, Some(Value::Array(items)))
}

fn check_index(path: &FieldPath, index: usize, len: usize) -> Result<(), FormError> {
    if index < len {
        Ok(())
    } else {
        Err(FormError::InvalidEdit {
            path: path.to_string(),
            reason: format!("index {} out of range for {} items", index, len),
        })
    }
}
