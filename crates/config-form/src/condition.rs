// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Visibility conditions for schema sections and fields
//!
//! Conditions are evaluated against the live document on every render pass.
//! Evaluation only reads the document.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as J;

use crate::document::is_empty_value;
use crate::path::{self, FieldPath};

/// Comparison operator of a [`VisibilityCondition`]
///
/// Operators this engine does not know are kept as [`Operator::Unknown`] so
/// newer schema documents still load.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    Eq,
    Neq,
    Contains,
    Empty,
    NotEmpty,
    Unknown(String),
}

impl Operator {
    pub fn as_str(&self) -> &str {
        match self {
            Operator::Eq => "eq",
            Operator::Neq => "neq",
            Operator::Contains => "contains",
            Operator::Empty => "empty",
            Operator::NotEmpty => "notEmpty",
            Operator::Unknown(name) => name,
        }
    }
}

impl From<String> for Operator {
    fn from(s: String) -> Self {
        match s.as_str() {
            "eq" => Operator::Eq,
            "neq" => Operator::Neq,
            "contains" => Operator::Contains,
            "empty" => Operator::Empty,
            "notEmpty" => Operator::NotEmpty,
            _ => Operator::Unknown(s),
        }
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        op.as_str().to_string()
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl schemars::JsonSchema for Operator {
    fn schema_name() -> String {
        "Operator".to_owned()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        <String as schemars::JsonSchema>::json_schema(gen)
    }
}

/// Predicate over the document that gates whether a section or field renders
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct VisibilityCondition {
    /// Path of the value under test
    pub field: FieldPath,
    pub operator: Operator,
    /// Comparison literal for `eq`, `neq` and `contains`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<J>,
}

impl VisibilityCondition {
    pub fn new(field: impl Into<FieldPath>, operator: Operator, value: Option<J>) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    /// Copy of this condition with its field path placed under `prefix`
    pub fn rebased(&self, prefix: &FieldPath) -> Self {
        Self {
            field: prefix.join(&self.field),
            ..self.clone()
        }
    }

    pub fn evaluate(&self, doc: &J) -> bool {
        evaluate(self, doc)
    }
}

/// Evaluate `condition` against `doc`
pub fn evaluate(condition: &VisibilityCondition, doc: &J) -> bool {
    let resolved = path::get(doc, &condition.field);
    let literal = condition.value.as_ref();
    match &condition.operator {
        Operator::Eq => values_equal(resolved, literal),
        Operator::Neq => !values_equal(resolved, literal),
        Operator::Contains => match (resolved, literal) {
            (Some(J::Array(items)), Some(literal)) => {
                items.iter().any(|item| native_eq(item, literal).unwrap_or(false))
            }
            _ => false,
        },
        Operator::Empty => resolved.map_or(true, is_empty_value),
        Operator::NotEmpty => !resolved.map_or(true, is_empty_value),
        Operator::Unknown(name) => {
            tracing::debug!(operator = %name, field = %condition.field, "unknown condition operator, treating as satisfied");
            true
        }
    }
}

/// Combined visibility of a section or field
///
/// A satisfied `hide_if` wins over `show_if`. A `hide_if` with an unknown
/// operator never hides.
pub fn is_visible(
    show_if: Option<&VisibilityCondition>,
    hide_if: Option<&VisibilityCondition>,
    doc: &J,
) -> bool {
    let shown = show_if.map_or(true, |c| evaluate(c, doc));
    let hidden = hide_if.map_or(false, |c| {
        !matches!(c.operator, Operator::Unknown(_)) && evaluate(c, doc)
    });
    shown && !hidden
}

fn values_equal(resolved: Option<&J>, literal: Option<&J>) -> bool {
    let resolved = resolved.filter(|v| !v.is_null());
    let literal = literal.filter(|v| !v.is_null());
    match (resolved, literal) {
        (None, None) => true,
        (None, _) | (_, None) => false,
        (Some(a), Some(b)) => native_eq(a, b).unwrap_or_else(|| string_form(a) == string_form(b)),
    }
}

/// Equality for two scalars of the same kind, `None` when the kinds differ
/// or either side is a container
fn native_eq(a: &J, b: &J) -> Option<bool> {
    match (a, b) {
        (J::String(a), J::String(b)) => Some(a == b),
        (J::Bool(a), J::Bool(b)) => Some(a == b),
        (J::Number(a), J::Number(b)) => Some(match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => a == b,
        }),
        (J::Null, J::Null) => Some(true),
        _ => None,
    }
}

fn string_form(v: &J) -> String {
    match v {
        J::String(s) => s.clone(),
        J::Number(n) => n.to_string(),
        J::Bool(b) => b.to_string(),
        J::Null => "null".to_string(),
        J::Array(_) | J::Object(_) => v.to_string(),
    }
}
