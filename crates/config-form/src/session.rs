// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Form edit session
//!
//! A [`FormSession`] exclusively owns one configuration document for the
//! lifetime of an editing screen. Every edit is written through immediately;
//! nothing reaches the server until [`FormSession::save`]. Dropping the
//! session discards the edits.

use serde_json::{Map, Value as J};

use crate::document;
use crate::error::Result;
use crate::form::{self, VisibleSection};
use crate::path::{self, FieldPath};
use crate::schema::{FieldType, FormSchema, SchemaField};
use crate::store::{AppConfigStore, SchemaSource};

#[derive(Debug, Clone)]
pub struct FormSession {
    document: J,
    schema: FormSchema,
    dirty: bool,
    structured: bool,
}

impl FormSession {
    pub fn new(document: J, schema: FormSchema) -> Self {
        let structured = !schema.is_empty();
        Self {
            document,
            schema,
            dirty: false,
            structured,
        }
    }

    /// Build a session from raw texts, degrading instead of failing
    ///
    /// Malformed config text yields an empty document and malformed schema
    /// text an empty schema. Config JSON whose top level is not an object is
    /// kept but cannot be edited through fields. In each case
    /// [`structured_editing_available`](Self::structured_editing_available)
    /// reports `false` so the host can fall back to a raw-text editor.
    pub fn from_json(config_text: &str, schema_text: Option<&str>) -> Self {
        let config_ok =
            config_text.trim().is_empty() || document::parse_object(config_text).is_ok();
        let document = document::parse_or_empty(config_text);
        let schema = schema_text
            .map(FormSchema::from_json_str_or_default)
            .unwrap_or_default();
        let mut session = Self::new(document, schema);
        session.structured &= config_ok;
        session
    }

    /// Load config text and schema text from their collaborators
    ///
    /// I/O failures are returned; unparsable content degrades as in
    /// [`from_json`](Self::from_json).
    pub async fn open<S, F>(store: &S, schema_source: &F) -> Result<Self>
    where
        S: AppConfigStore + ?Sized,
        F: SchemaSource + ?Sized,
    {
        let config_text = store.load_config().await?;
        let schema_text = schema_source.load_schema().await?;
        let session = Self::from_json(&config_text, schema_text.as_deref());
        tracing::debug!(
            structured = session.structured,
            sections = session.schema.sections.len(),
            "opened form session"
        );
        Ok(session)
    }

    pub fn document(&self) -> &J {
        &self.document
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether a schema-driven form can be offered for this document
    pub fn structured_editing_available(&self) -> bool {
        self.structured
    }

    pub fn value(&self, path: &FieldPath) -> Option<&J> {
        path::get(&self.document, path)
    }

    /// Sections and fields to render for the current document
    pub fn visible(&self) -> Vec<VisibleSection> {
        form::visible_form(&self.schema, &self.document)
    }

    /// Write `value` at `path` immediately
    ///
    /// Returns `false` and leaves the document alone when the write is
    /// refused: the path would pad an array too far, or the document root is
    /// not an object and `path` is not the root.
    pub fn set_value(&mut self, path: &FieldPath, value: J) -> bool {
        if !path.is_empty() && !self.document.is_object() {
            tracing::warn!(
                path = %path,
                found = document::kind_name(&self.document),
                "refusing field write into a config that is not a JSON object"
            );
            return false;
        }
        let written = path::set(&mut self.document, path, value);
        if written {
            self.dirty = true;
            tracing::debug!(path = %path, "field updated");
        }
        written
    }

    /// Write an edit made through `field`'s control
    ///
    /// Numbers are clamped to the field's declared bounds.
    pub fn edit_field(&mut self, field: &SchemaField, value: J) -> bool {
        let value = match (&field.field_type, value.as_f64()) {
            (FieldType::Number, Some(n)) if field.min.is_some() || field.max.is_some() => {
                let clamped = field.clamp_number(n);
                if clamped == n {
                    value
                } else {
                    number_value(clamped)
                }
            }
            _ => value,
        };
        self.set_value(&field.path, value)
    }

    /// Append an element to a repeating or list field, returning its index
    ///
    /// Composite elements start as objects holding each child's default;
    /// list elements start as empty strings. Returns `None` for other types.
    pub fn add_item(&mut self, field: &SchemaField) -> Option<usize> {
        let element = match field.field_type {
            FieldType::ObjectArray | FieldType::Tabs | FieldType::Table => new_element(field),
            FieldType::List | FieldType::UrlList => J::String(String::new()),
            _ => return None,
        };
        let index = match self.value(&field.path) {
            Some(J::Array(items)) => items.len(),
            _ => 0,
        };
        if !self.set_value(&field.path.index(index), element) {
            return None;
        }
        Some(index)
    }

    /// Remove element `index` of a list-valued field
    pub fn remove_item(&mut self, field: &SchemaField, index: usize) -> Option<J> {
        let removed = path::remove(&mut self.document, &field.path.index(index));
        if removed.is_some() {
            self.dirty = true;
            tracing::debug!(path = %field.path, index, "item removed");
        }
        removed
    }

    /// Replace the document from the raw-text editor
    ///
    /// The document is unchanged when `text` does not parse or its top level
    /// is not an object.
    pub fn replace_raw(&mut self, text: &str) -> Result<()> {
        self.document = document::parse_object(text)?;
        self.dirty = true;
        self.structured = !self.schema.is_empty();
        Ok(())
    }

    /// Pretty JSON with sorted keys, as sent to the server
    pub fn to_json(&self) -> Result<String> {
        document::to_pretty_json(&self.document)
    }

    /// Hand the serialized document to `store`
    ///
    /// Store errors are returned unchanged and leave the session dirty.
    pub async fn save<S>(&mut self, store: &S) -> Result<()>
    where
        S: AppConfigStore + ?Sized,
    {
        let text = self.to_json()?;
        self.save_text(store, &text).await
    }

    /// [`save`](Self::save) with explicit output formatting
    pub async fn save_with<S>(&mut self, store: &S, indent: usize, sort_keys: bool) -> Result<()>
    where
        S: AppConfigStore + ?Sized,
    {
        let text = document::to_json_with(&self.document, indent, sort_keys)?;
        self.save_text(store, &text).await
    }

    async fn save_text<S>(&mut self, store: &S, text: &str) -> Result<()>
    where
        S: AppConfigStore + ?Sized,
    {
        store.save_config(text).await?;
        self.dirty = false;
        Ok(())
    }
}

fn new_element(field: &SchemaField) -> J {
    let mut element = J::Object(Map::new());
    for child in &field.item_schema {
        if child.path.is_empty() {
            continue;
        }
        path::set(&mut element, &child.path, child.fallback_value());
    }
    element
}

fn number_value(n: f64) -> J {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        J::from(n as i64)
    } else {
        serde_json::Number::from_f64(n).map_or(J::Null, J::Number)
    }
}
