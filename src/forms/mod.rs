//! Headless list/form shell: the per-entity configuration a UI renders from, and its list mechanics.

pub mod list;
pub mod schema;

pub use list::{apply, DeleteConfirmation, ListQuery, Page, RequestState, SortDirection};
pub use schema::{FieldErrors, FieldKind, FieldSpec, FormSchema, RuleSet};
