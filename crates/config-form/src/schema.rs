// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Form schema model.
//!
//! A schema document describes how a DNS server app's JSON configuration is
//! presented as a form: ordered sections, each with ordered fields. Every field
//! is bound to the configuration document purely by its [`FieldPath`]; there is
//! no reference from a field to a document node.
//!
//! Composite fields (`objectArray`, `tabs`, `table`, `group`) carry an
//! `itemSchema` whose paths and conditions are relative to one element (or to
//! the group). [`expand_composite`] and [`expand_group_child`] turn those
//! templates into concrete fields for a render pass.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as J};

use crate::condition::{self, VisibilityCondition};
use crate::error::{FormError, Result};
use crate::path::FieldPath;

/// Control type of a [`SchemaField`]
///
/// Type names outside the known set decode as [`FieldType::Unsupported`] and
/// are skipped when rendering.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    Switch,
    Number,
    Text,
    Textarea,
    Select,
    List,
    UrlList,
    KeyValue,
    ObjectArray,
    Tabs,
    ClientSelector,
    Group,
    Table,
    Unsupported(String),
}

impl FieldType {
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Switch => "switch",
            FieldType::Number => "number",
            FieldType::Text => "text",
            FieldType::Textarea => "textarea",
            FieldType::Select => "select",
            FieldType::List => "list",
            FieldType::UrlList => "urlList",
            FieldType::KeyValue => "keyValue",
            FieldType::ObjectArray => "objectArray",
            FieldType::Tabs => "tabs",
            FieldType::ClientSelector => "clientSelector",
            FieldType::Group => "group",
            FieldType::Table => "table",
            FieldType::Unsupported(name) => name,
        }
    }

    /// Types whose elements are rendered through an item schema
    pub fn is_repeating(&self) -> bool {
        matches!(
            self,
            FieldType::ObjectArray | FieldType::Tabs | FieldType::Table
        )
    }

    pub fn is_composite(&self) -> bool {
        self.is_repeating() || *self == FieldType::Group
    }

    /// Value used when the document holds nothing usable for this type
    pub fn type_default(&self) -> J {
        match self {
            FieldType::Switch => J::Bool(false),
            FieldType::Number => J::from(0),
            FieldType::Text
            | FieldType::Textarea
            | FieldType::Select
            | FieldType::ClientSelector => J::String(String::new()),
            FieldType::List
            | FieldType::UrlList
            | FieldType::ObjectArray
            | FieldType::Tabs
            | FieldType::Table => J::Array(Vec::new()),
            FieldType::KeyValue | FieldType::Group => J::Object(Map::new()),
            FieldType::Unsupported(_) => J::Null,
        }
    }

    /// Whether `value` has the shape this type edits
    pub fn accepts(&self, value: &J) -> bool {
        match self {
            FieldType::Switch => value.is_boolean(),
            FieldType::Number => value.is_number(),
            FieldType::Text | FieldType::Textarea | FieldType::ClientSelector => value.is_string(),
            FieldType::Select => value.is_string() || value.is_number() || value.is_boolean(),
            FieldType::List
            | FieldType::UrlList
            | FieldType::ObjectArray
            | FieldType::Tabs
            | FieldType::Table => value.is_array(),
            FieldType::KeyValue | FieldType::Group => value.is_object(),
            FieldType::Unsupported(_) => true,
        }
    }
}

impl From<String> for FieldType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "switch" => FieldType::Switch,
            "number" => FieldType::Number,
            "text" => FieldType::Text,
            "textarea" => FieldType::Textarea,
            "select" => FieldType::Select,
            "list" => FieldType::List,
            "urlList" => FieldType::UrlList,
            "keyValue" => FieldType::KeyValue,
            "objectArray" => FieldType::ObjectArray,
            "tabs" => FieldType::Tabs,
            "clientSelector" => FieldType::ClientSelector,
            "group" => FieldType::Group,
            "table" => FieldType::Table,
            _ => FieldType::Unsupported(s),
        }
    }
}

impl From<FieldType> for String {
    fn from(t: FieldType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl JsonSchema for FieldType {
    fn schema_name() -> String {
        "FieldType".to_owned()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        <String as JsonSchema>::json_schema(gen)
    }
}

/// One choice of a `select` field
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawOption")]
pub struct SelectOption {
    pub value: J,
    pub label: String,
}

/// Options are written either as bare literals or as `{ value, label }`
#[derive(Deserialize, JsonSchema)]
#[serde(untagged)]
enum RawOption {
    Labeled {
        value: J,
        #[serde(default)]
        label: Option<String>,
    },
    Bare(J),
}

impl From<RawOption> for SelectOption {
    fn from(raw: RawOption) -> Self {
        let (value, label) = match raw {
            RawOption::Labeled { value, label } => (value, label),
            RawOption::Bare(value) => (value, None),
        };
        let label = label.unwrap_or_else(|| match &value {
            J::String(s) => s.clone(),
            other => other.to_string(),
        });
        SelectOption { value, label }
    }
}

impl JsonSchema for SelectOption {
    fn schema_name() -> String {
        "SelectOption".to_owned()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        RawOption::json_schema(gen)
    }
}

/// Describes one form control
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchemaField {
    /// Unique within its sibling list; filled from `path` when absent
    #[serde(default)]
    pub id: String,
    /// Location of the edited value; relative to the element inside an item schema
    #[serde(default)]
    pub path: FieldPath,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<J>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_if: Option<VisibilityCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide_if: Option<VisibilityCondition>,
    /// Child fields of composite types
    #[serde(default, alias = "fields", skip_serializing_if = "Vec::is_empty")]
    pub item_schema: Vec<SchemaField>,
    /// Element key whose value titles a tab or row
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_label: Option<String>,
    /// Attributes this engine does not interpret, kept for the host UI
    #[serde(flatten)]
    pub extra: Map<String, J>,
}

impl SchemaField {
    pub fn new(id: impl Into<String>, path: impl Into<FieldPath>, field_type: FieldType) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            field_type,
            label: String::new(),
            description: None,
            default: None,
            min: None,
            max: None,
            step: None,
            suffix: None,
            placeholder: None,
            options: Vec::new(),
            show_if: None,
            hide_if: None,
            item_schema: Vec::new(),
            item_label: None,
            add_label: None,
            extra: Map::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_default(mut self, default: J) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_show_if(mut self, condition: VisibilityCondition) -> Self {
        self.show_if = Some(condition);
        self
    }

    pub fn with_hide_if(mut self, condition: VisibilityCondition) -> Self {
        self.hide_if = Some(condition);
        self
    }

    pub fn with_items(mut self, items: Vec<SchemaField>) -> Self {
        self.item_schema = items;
        self
    }

    pub fn with_bounds(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn is_visible(&self, doc: &J) -> bool {
        condition::is_visible(self.show_if.as_ref(), self.hide_if.as_ref(), doc)
    }

    pub fn type_default(&self) -> J {
        self.field_type.type_default()
    }

    /// Declared default, or the type default when none is declared
    pub fn fallback_value(&self) -> J {
        self.default.clone().unwrap_or_else(|| self.type_default())
    }

    /// Clamp `value` into `[min, max]` where those are declared
    pub fn clamp_number(&self, value: f64) -> f64 {
        let value = self.min.map_or(value, |min| value.max(min));
        self.max.map_or(value, |max| value.min(max))
    }

    fn fill_ids(&mut self) {
        if self.id.is_empty() {
            self.id = self.path.to_string();
        }
        for child in &mut self.item_schema {
            child.fill_ids();
        }
    }

    fn find(&self, id: &str) -> Option<&SchemaField> {
        if self.id == id {
            return Some(self);
        }
        self.item_schema.iter().find_map(|child| child.find(id))
    }
}

/// A named, optionally collapsible and conditionally visible group of fields
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSection {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub collapsible: bool,
    #[serde(default)]
    pub collapsed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_if: Option<VisibilityCondition>,
    #[serde(default)]
    pub fields: Vec<SchemaField>,
}

impl SchemaSection {
    pub fn is_visible(&self, doc: &J) -> bool {
        condition::is_visible(self.show_if.as_ref(), None, doc)
    }
}

/// Declarative description of a configuration form
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub sections: Vec<SchemaSection>,
}

impl FormSchema {
    /// Decode a parsed schema document
    pub fn from_value(value: J) -> Result<Self> {
        let mut schema: FormSchema =
            serde_path_to_error::deserialize(value).map_err(|e| FormError::SchemaDecode {
                path: e.path().to_string(),
                message: e.inner().to_string(),
            })?;
        for section in &mut schema.sections {
            for field in &mut section.fields {
                field.fill_ids();
            }
        }
        Ok(schema)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(text)?)
    }

    /// Decode, degrading to an empty schema when the text is unusable
    pub fn from_json_str_or_default(text: &str) -> Self {
        match Self::from_json_str(text) {
            Ok(schema) => schema,
            Err(e) => {
                tracing::warn!(error = %e, "form schema could not be decoded, using an empty schema");
                Self::default()
            }
        }
    }

    /// JSON Schema describing the schema-document format itself
    pub fn json_schema() -> Result<J> {
        Ok(serde_json::to_value(schemars::schema_for!(FormSchema))?)
    }

    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(|s| s.fields.is_empty())
    }

    /// Find a declared field by id, including fields of item schemas
    pub fn field(&self, id: &str) -> Option<&SchemaField> {
        self.sections
            .iter()
            .flat_map(|s| s.fields.iter())
            .find_map(|f| f.find(id))
    }
}

/// Concrete field for element `index` of the repeating field at `parent_path`
///
/// The template's path and condition paths are placed under
/// `parent_path[index]`, and its id gets the same prefix. The template's own
/// item schema stays relative.
pub fn expand_composite(template: &SchemaField, parent_path: &FieldPath, index: usize) -> SchemaField {
    rebase(template, &parent_path.index(index))
}

/// Concrete field for a child of the group at `group_path`
pub fn expand_group_child(template: &SchemaField, group_path: &FieldPath) -> SchemaField {
    rebase(template, group_path)
}

fn rebase(template: &SchemaField, prefix: &FieldPath) -> SchemaField {
    if prefix.is_empty() {
        return template.clone();
    }
    SchemaField {
        id: format!("{}.{}", prefix, template.id),
        path: prefix.join(&template.path),
        show_if: template.show_if.as_ref().map(|c| c.rebased(prefix)),
        hide_if: template.hide_if.as_ref().map(|c| c.rebased(prefix)),
        ..template.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Operator;
    use serde_json::json;

    fn blocking_schema() -> J {
        json!({
            "description": "Advanced blocking",
            "sections": [{
                "title": "General",
                "icon": "shield",
                "fields": [
                    {"id": "enableBlocking", "path": "enableBlocking", "type": "switch", "label": "Enable Blocking", "default": true},
                    {"path": "blockingAnswerTtl", "type": "number", "label": "Answer TTL", "min": 0, "max": 604800, "suffix": "sec"},
                    {"id": "mode", "path": "blockingType", "type": "select", "label": "Mode",
                     "options": ["AnyAddress", {"value": "NxDomain", "label": "NX Domain"}, 3]},
                    {"id": "groups", "path": "groups", "type": "tabs", "label": "Groups", "itemLabel": "name",
                     "itemSchema": [
                        {"id": "name", "path": "name", "type": "text", "label": "Name"},
                        {"id": "urls", "path": "blockListUrls", "type": "urlList", "label": "Block Lists",
                         "showIf": {"field": "enableBlocking", "operator": "eq", "value": true}}
                     ]},
                    {"id": "future", "path": "x", "type": "colorPicker", "label": "Future", "palette": "warm"}
                ]
            }]
        })
    }

    #[test]
    fn decodes_sections_and_fields() {
        let schema = FormSchema::from_value(blocking_schema()).unwrap();
        assert_eq!(schema.description.as_deref(), Some("Advanced blocking"));
        let section = &schema.sections[0];
        assert_eq!(section.title, "General");
        assert_eq!(section.icon.as_deref(), Some("shield"));
        assert!(!section.collapsible);
        assert_eq!(section.fields.len(), 5);

        let ttl = &section.fields[1];
        assert_eq!(ttl.id, "blockingAnswerTtl");
        assert_eq!(ttl.field_type, FieldType::Number);
        assert_eq!(ttl.max, Some(604800.0));
        assert_eq!(ttl.suffix.as_deref(), Some("sec"));

        let groups = schema.field("groups").unwrap();
        assert_eq!(groups.field_type, FieldType::Tabs);
        assert_eq!(groups.item_label.as_deref(), Some("name"));
        assert_eq!(groups.item_schema.len(), 2);
        assert_eq!(
            groups.item_schema[1].show_if.as_ref().map(|c| c.operator.clone()),
            Some(Operator::Eq)
        );
    }

    #[test]
    fn select_options_accept_bare_and_labeled_forms() {
        let schema = FormSchema::from_value(blocking_schema()).unwrap();
        let mode = schema.field("mode").unwrap();
        assert_eq!(mode.options[0].value, json!("AnyAddress"));
        assert_eq!(mode.options[0].label, "AnyAddress");
        assert_eq!(mode.options[1].label, "NX Domain");
        assert_eq!(mode.options[2].value, json!(3));
        assert_eq!(mode.options[2].label, "3");
    }

    #[test]
    fn unknown_type_and_attributes_are_kept() {
        let schema = FormSchema::from_value(blocking_schema()).unwrap();
        let future = schema.field("future").unwrap();
        assert_eq!(future.field_type, FieldType::Unsupported("colorPicker".into()));
        assert_eq!(future.extra.get("palette"), Some(&json!("warm")));
    }

    #[test]
    fn nested_ids_are_filled_from_paths() {
        let schema = FormSchema::from_value(json!({
            "sections": [{"title": "S", "fields": [
                {"path": "servers", "type": "objectArray", "fields": [{"path": "address", "type": "text"}]}
            ]}]
        }))
        .unwrap();
        let servers = schema.field("servers").unwrap();
        assert_eq!(servers.item_schema[0].id, "address");
        assert!(schema.field("address").is_some());
    }

    #[test]
    fn decode_errors_name_the_location() {
        let err = FormSchema::from_value(json!({
            "sections": [{"title": "S", "fields": [{"path": "a", "type": "text", "min": "low"}]}]
        }))
        .unwrap_err();
        match err {
            FormError::SchemaDecode { path, .. } => assert_eq!(path, "sections[0].fields[0].min"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn malformed_schema_text_degrades_to_empty() {
        let schema = FormSchema::from_json_str_or_default("{\"sections\": 5}");
        assert!(schema.sections.is_empty());
        assert!(schema.is_empty());
        assert!(FormSchema::from_json_str_or_default("nope").is_empty());
    }

    #[test]
    fn type_defaults_and_shapes() {
        assert_eq!(FieldType::Switch.type_default(), json!(false));
        assert_eq!(FieldType::Number.type_default(), json!(0));
        assert_eq!(FieldType::Textarea.type_default(), json!(""));
        assert_eq!(FieldType::UrlList.type_default(), json!([]));
        assert_eq!(FieldType::KeyValue.type_default(), json!({}));
        assert!(FieldType::Select.accepts(&json!(4)));
        assert!(!FieldType::Switch.accepts(&json!("true")));
        assert!(!FieldType::ObjectArray.accepts(&json!({})));
        assert!(FieldType::Group.is_composite());
        assert!(!FieldType::Group.is_repeating());
    }

    #[test]
    fn clamp_honors_declared_bounds() {
        let field = SchemaField::new("ttl", "ttl", FieldType::Number).with_bounds(Some(0.0), Some(60.0));
        assert_eq!(field.clamp_number(-5.0), 0.0);
        assert_eq!(field.clamp_number(90.0), 60.0);
        assert_eq!(field.clamp_number(12.5), 12.5);
        let open = SchemaField::new("n", "n", FieldType::Number);
        assert_eq!(open.clamp_number(-1e9), -1e9);
    }

    #[test]
    fn expand_composite_rebases_path_id_and_conditions() {
        let template = SchemaField::new("urls", "blockListUrls", FieldType::UrlList)
            .with_show_if(VisibilityCondition::new("enableBlocking", Operator::Eq, Some(json!(true))))
            .with_items(vec![SchemaField::new("inner", "x", FieldType::Text)]);
        let parent = FieldPath::parse("groups");

        let expanded = expand_composite(&template, &parent, 2);
        assert_eq!(expanded.id, "groups[2].urls");
        assert_eq!(expanded.path.to_string(), "groups[2].blockListUrls");
        assert_eq!(
            expanded.show_if.as_ref().map(|c| c.field.to_string()),
            Some("groups[2].enableBlocking".to_string())
        );
        assert_eq!(expanded.item_schema[0].path.to_string(), "x");
        // pure: same inputs, same output, template untouched
        assert_eq!(expand_composite(&template, &parent, 2), expanded);
        assert_eq!(template.path.to_string(), "blockListUrls");
    }

    #[test]
    fn expand_group_child_without_index() {
        let template = SchemaField::new("port", "port", FieldType::Number);
        let expanded = expand_group_child(&template, &FieldPath::parse("dnsOverHttps"));
        assert_eq!(expanded.path.to_string(), "dnsOverHttps.port");
        assert_eq!(expanded.id, "dnsOverHttps.port");
        assert_eq!(expand_group_child(&template, &FieldPath::root()), template);
    }

    #[test]
    fn json_schema_describes_sections() {
        let schema = FormSchema::json_schema().unwrap();
        assert!(schema["properties"]["sections"].is_object());
        assert!(schema["definitions"]["SchemaField"].is_object());
    }
}
