use serde_json::Value;
use tracing::{debug, warn};

use super::edits::{apply_edit, FieldEdit};
use super::error::FormError;
use super::types::FormMode;

/// Routes user edits to the shell's `on_change` callback
///
/// The controller never holds the value tree. Each dispatch receives the
/// shell's current tree, computes a replacement and hands the complete new
/// tree to `on_change`. In read-only mode every edit is refused and the
/// callback is never invoked.
pub struct FormController<F>
where
    F: FnMut(Value),
{
    mode: FormMode,
    on_change: F,
}

impl<F> FormController<F>
where
    F: FnMut(Value),
{
    pub fn new(mode: FormMode, on_change: F) -> Self {
        Self { mode, on_change }
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn dispatch(&mut self, current: &Value, edit: &FieldEdit) -> Result<(), FormError> {
        if self.mode == FormMode::ReadOnly {
            warn!("Refusing edit at '{}' on read-only form", edit.path());
            return Err(FormError::ReadOnly);
        }

        let updated = apply_edit(current, edit)?;
        debug!("Applied edit at '{}'", edit.path());
        (self.on_change)(updated);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::types::FieldPath;
    use serde_json::json;

    #[test]
    fn test_dispatch_reports_whole_tree() {
        let mut changes = Vec::new();
        let current = json!({ "loadBalancer": { "passHostHeader": true } });
        {
            let mut controller = FormController::new(FormMode::Edit, |tree| changes.push(tree));
            controller
                .dispatch(
                    &current,
                    &FieldEdit::Set { path: FieldPath::parse("loadBalancer.servers[0].url"), value: Some(json!("http://a")) },
                )
                .unwrap();
        }

        assert_eq!(changes.len(), 1);
        assert_eq!(
            changes[0],
            json!({ "loadBalancer": { "passHostHeader": true, "servers": [{ "url": "http://a" }] } })
        );
        assert_eq!(current, json!({ "loadBalancer": { "passHostHeader": true } }));
    }

    #[test]
    fn test_read_only_never_calls_on_change() {
        let mut calls = 0;
        {
            let mut controller = FormController::new(FormMode::ReadOnly, |_| calls += 1);
            let err = controller
                .dispatch(&json!({}), &FieldEdit::Set { path: FieldPath::parse("rule"), value: Some(json!("x")) })
                .unwrap_err();
            assert_eq!(err, FormError::ReadOnly);
        }
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_failed_edit_does_not_call_on_change() {
        let mut calls = 0;
        {
            let mut controller = FormController::new(FormMode::Edit, |_| calls += 1);
            let result = controller.dispatch(
                &json!({ "servers": [] }),
                &FieldEdit::ArrayRemove { path: FieldPath::parse("servers"), index: 3 },
            );
            assert!(result.is_err());
        }
        assert_eq!(calls, 0);
    }
}
