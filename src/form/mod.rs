//! Schema-driven form engine
//!
//! Flow: a [`session::FormSession`] fetches a schema through a
//! [`SchemaProvider`](crate::domain::SchemaProvider), the [`resolver`]
//! dereferences it, the [`renderer`] classifies every property and describes
//! the widgets, and user interactions come back as [`edits::FieldEdit`]s that
//! the [`controller::FormController`] turns into whole-tree replacements.

pub mod classifier;
pub mod controller;
pub mod edits;
pub mod error;
pub mod pickers;
pub mod renderer;
pub mod resolver;
pub mod session;
pub mod types;
pub mod value_store;

pub use classifier::{classify, FlagStyle, ReferenceKind, RenderStrategy};
pub use controller::FormController;
pub use edits::{apply_edit, FieldEdit};
pub use error::{FormError, SchemaError};
pub use pickers::{collect_picker_requests, PickerOption, PickerRequest, PickerSource};
pub use renderer::{FieldView, FormLayout, FormRenderer, FormTab, Widget};
pub use session::{FormSession, FormView, SchemaState};
pub use types::{FieldPath, FormMode, PathSegment, SchemaNode};
