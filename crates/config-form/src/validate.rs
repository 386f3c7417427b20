// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Strict checks for schema documents
//!
//! The editing path never runs these; it degrades instead. They back tooling
//! that wants to reject a bad schema document before it ships with an app.

use serde_json::Value as J;

use crate::error::{FormError, Result};
use crate::path::FieldPath;
use crate::schema::FormSchema;

/// Validate a raw schema document against the schema-document format
pub fn validate_schema_document(v: &J) -> Result<()> {
    use jsonschema::{Draft, JSONSchema};
    use std::sync::OnceLock;

    static META: OnceLock<J> = OnceLock::new();
    let meta = META.get_or_init(|| FormSchema::json_schema().unwrap_or(J::Bool(true)));

    static VALIDATOR: OnceLock<std::result::Result<JSONSchema, String>> = OnceLock::new();
    let validator = VALIDATOR
        .get_or_init(|| {
            JSONSchema::options()
                .with_draft(Draft::Draft202012)
                .compile(meta)
                .map_err(|e| e.to_string())
        })
        .as_ref()
        .map_err(|e| FormError::SchemaInvalid(format!("schema format failed to compile: {e}")))?;

    if let Err(errors) = validator.validate(v) {
        let error_msg = errors
            .map(|e| format!("{} (at {})", e, e.instance_path))
            .collect::<Vec<_>>()
            .join("\n  - ");
        return Err(FormError::SchemaInvalid(error_msg));
    }

    Ok(())
}

/// A path string in a schema document that strict parsing rejects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathIssue {
    /// Location of the offending string, e.g. `sections[0].fields[2].path`
    pub location: String,
    pub message: String,
}

/// Every field and condition path in a raw schema document that does not
/// parse strictly
pub fn check_field_paths(v: &J) -> Vec<PathIssue> {
    let mut issues = Vec::new();
    let Some(sections) = v.get("sections").and_then(J::as_array) else {
        return issues;
    };
    for (i, section) in sections.iter().enumerate() {
        let location = format!("sections[{i}]");
        check_condition(section.get("showIf"), &format!("{location}.showIf"), &mut issues);
        check_fields(section.get("fields"), &format!("{location}.fields"), &mut issues);
    }
    issues
}

fn check_fields(fields: Option<&J>, location: &str, issues: &mut Vec<PathIssue>) {
    let Some(fields) = fields.and_then(J::as_array) else {
        return;
    };
    for (i, field) in fields.iter().enumerate() {
        let location = format!("{location}[{i}]");
        check_path(field.get("path"), &format!("{location}.path"), issues);
        check_condition(field.get("showIf"), &format!("{location}.showIf"), issues);
        check_condition(field.get("hideIf"), &format!("{location}.hideIf"), issues);
        check_fields(field.get("itemSchema"), &format!("{location}.itemSchema"), issues);
        check_fields(field.get("fields"), &format!("{location}.fields"), issues);
    }
}

fn check_condition(condition: Option<&J>, location: &str, issues: &mut Vec<PathIssue>) {
    if let Some(condition) = condition {
        check_path(condition.get("field"), &format!("{location}.field"), issues);
    }
}

fn check_path(raw: Option<&J>, location: &str, issues: &mut Vec<PathIssue>) {
    if let Some(J::String(raw)) = raw {
        if let Err(e) = FieldPath::parse_strict(raw) {
            issues.push(PathIssue {
                location: location.to_string(),
                message: e.to_string(),
            });
        }
    }
}
