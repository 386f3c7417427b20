// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Schema-driven editing of free-form JSON app configuration.
//!
//! Apps installed on a DNS server publish a JSON configuration and, optionally,
//! a form schema describing how to edit it. This crate resolves schema field
//! paths against the live document, evaluates the show/hide conditions that
//! decide which sections and fields are visible, expands repeating fields into
//! per-element controls, and writes edits back into the document.
//!
//! The document is a plain `serde_json::Value` owned by a [`FormSession`].
//! Unknown keys and keys the schema never mentions are preserved on save.

pub mod condition;
pub mod document;
pub mod error;
pub mod extract;
pub mod form;
pub mod merge;
pub mod path;
pub mod schema;
pub mod session;
pub mod store;
pub mod validate;

pub use condition::{is_visible, Operator, VisibilityCondition};
pub use error::{FormError, Result};
pub use form::{resolve_value, visible_form, VisibleField, VisibleItem, VisibleSection};
pub use path::{FieldPath, PathComponent};
pub use schema::{expand_composite, expand_group_child, FieldType, FormSchema, SchemaField, SchemaSection, SelectOption};
pub use session::FormSession;
pub use store::{AppConfigStore, FileConfigStore, FileSchemaSource, SchemaSource};
