// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Configuration document parsing and serialization
//!
//! A configuration document is a plain `serde_json::Value` tree. This module
//! owns the text boundary: parsing raw JSON handed over by the DNS server's
//! app-config API, and producing the pretty-printed text sent back on save.

use serde_json::{Map, Value as J};

use crate::error::{FormError, Result};

/// Parse raw JSON text into a document
pub fn parse(text: &str) -> Result<J> {
    Ok(serde_json::from_str(text)?)
}

/// Parse raw JSON text whose top level must be an object
pub fn parse_object(text: &str) -> Result<J> {
    let doc = parse(text)?;
    if doc.is_object() {
        Ok(doc)
    } else {
        Err(FormError::NotAnObject {
            found: kind_name(&doc),
        })
    }
}

/// JSON type name of `v`, as used in diagnostics
pub fn kind_name(v: &J) -> &'static str {
    match v {
        J::Null => "null",
        J::Bool(_) => "a boolean",
        J::Number(_) => "a number",
        J::String(_) => "a string",
        J::Array(_) => "an array",
        J::Object(_) => "an object",
    }
}

/// Parse raw JSON text, degrading to an empty object when it is malformed
///
/// Blank text is treated as an empty configuration without a warning.
/// Well-formed JSON with a non-object top level is returned as is so a raw
/// editor can still show it.
pub fn parse_or_empty(text: &str) -> J {
    if text.trim().is_empty() {
        return J::Object(Map::new());
    }
    match parse(text) {
        Ok(doc) if doc.is_object() => doc,
        Ok(doc) => {
            tracing::warn!(found = kind_name(&doc), "config document is not a JSON object");
            doc
        }
        Err(e) => {
            tracing::warn!(error = %e, "config document is not valid JSON, starting from an empty one");
            J::Object(Map::new())
        }
    }
}

/// Serialize a document as pretty JSON with keys sorted at every level
pub fn to_pretty_json(doc: &J) -> Result<String> {
    to_json_with(doc, 2, true)
}

/// Serialize with explicit indentation width and key ordering
pub fn to_json_with(doc: &J, indent: usize, sort_keys: bool) -> Result<String> {
    let sorted;
    let doc = if sort_keys {
        sorted = sort_keys_recursive(doc);
        &sorted
    } else {
        doc
    };

    if indent == 0 {
        return Ok(serde_json::to_string(doc)?);
    }

    let indent = " ".repeat(indent);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
    let mut out = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    serde::Serialize::serialize(doc, &mut ser)?;
    // serde_json only ever emits UTF-8
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Rebuild objects with their keys inserted in sorted order
pub fn sort_keys_recursive(doc: &J) -> J {
    match doc {
        J::Object(map) => {
            let mut entries: Vec<(&String, &J)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            J::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), sort_keys_recursive(v)))
                    .collect(),
            )
        }
        J::Array(items) => J::Array(items.iter().map(sort_keys_recursive).collect()),
        other => other.clone(),
    }
}

/// Missing-equivalent values: `null`, `""`, `[]` and `{}`
pub fn is_empty_value(value: &J) -> bool {
    match value {
        J::Null => true,
        J::String(s) => s.is_empty(),
        J::Array(items) => items.is_empty(),
        J::Object(map) => map.is_empty(),
        J::Bool(_) | J::Number(_) => false,
    }
}
