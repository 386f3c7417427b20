// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Renderer contract: the visible form for a schema and a live document
//!
//! [`visible_form`] is what a host UI consumes on each render pass. It is a
//! pure function of its inputs, so calling it again after an edit yields the
//! fields that appear or disappear because of that edit.

use serde::Serialize;
use serde_json::Value as J;

use crate::path;
use crate::schema::{expand_composite, expand_group_child, FieldType, FormSchema, SchemaField};

/// A section whose condition currently holds
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibleSection {
    /// Position in the schema's section list
    pub index: usize,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub collapsible: bool,
    pub collapsed: bool,
    pub fields: Vec<VisibleField>,
}

/// A field to render, with the value its control should show
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibleField {
    pub field: SchemaField,
    pub value: J,
    /// One entry per element of `objectArray`, `tabs` and `table` fields
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<VisibleItem>,
    /// Visible children of a `group` field
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<VisibleField>,
}

/// One element of a repeating field
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibleItem {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub fields: Vec<VisibleField>,
}

/// Sections and fields whose conditions hold for `doc`, in declared order
pub fn visible_form(schema: &FormSchema, doc: &J) -> Vec<VisibleSection> {
    schema
        .sections
        .iter()
        .enumerate()
        .filter(|(_, section)| section.is_visible(doc))
        .map(|(index, section)| VisibleSection {
            index,
            title: section.title.clone(),
            icon: section.icon.clone(),
            description: section.description.clone(),
            collapsible: section.collapsible,
            collapsed: section.collapsed,
            fields: visible_fields(&section.fields, doc),
        })
        .collect()
}

/// Visible subset of already-concrete `fields`
pub fn visible_fields(fields: &[SchemaField], doc: &J) -> Vec<VisibleField> {
    fields
        .iter()
        .filter(|field| {
            if let FieldType::Unsupported(name) = &field.field_type {
                tracing::warn!(field = %field.id, field_type = %name, "skipping field of unsupported type");
                return false;
            }
            field.is_visible(doc)
        })
        .map(|field| render_field(field, doc))
        .collect()
}

fn render_field(field: &SchemaField, doc: &J) -> VisibleField {
    let value = resolve_value(field, doc);

    let items = if field.field_type.is_repeating() {
        let len = value.as_array().map_or(0, Vec::len);
        (0..len)
            .map(|index| VisibleItem {
                index,
                title: item_title(field, &value, index),
                fields: visible_fields(&expand_items(field, index), doc),
            })
            .collect()
    } else {
        Vec::new()
    };

    let children = if field.field_type == FieldType::Group {
        let concrete: Vec<SchemaField> = field
            .item_schema
            .iter()
            .map(|child| expand_group_child(child, &field.path))
            .collect();
        visible_fields(&concrete, doc)
    } else {
        Vec::new()
    };

    VisibleField {
        field: field.clone(),
        value,
        items,
        children,
    }
}

/// Concrete child fields for element `index` of a repeating field
pub fn expand_items(field: &SchemaField, index: usize) -> Vec<SchemaField> {
    field
        .item_schema
        .iter()
        .map(|child| expand_composite(child, &field.path, index))
        .collect()
}

fn item_title(field: &SchemaField, value: &J, index: usize) -> Option<String> {
    let key = field.item_label.as_deref()?;
    match value.get(index)?.get(key)? {
        J::String(s) if !s.is_empty() => Some(s.clone()),
        J::String(_) | J::Null => None,
        other => Some(other.to_string()),
    }
}

/// Value a field's control shows
///
/// The stored value when it has the field's shape, otherwise the declared
/// default, otherwise the type default.
pub fn resolve_value(field: &SchemaField, doc: &J) -> J {
    match path::get(doc, &field.path) {
        Some(value) if field.field_type.accepts(value) => value.clone(),
        Some(value) => {
            tracing::debug!(field = %field.id, found = %value, "stored value has the wrong shape, using default");
            field.fallback_value()
        }
        None => field.fallback_value(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{Operator, VisibilityCondition};
    use crate::schema::SchemaSection;
    use serde_json::json;

    fn eq(field: &str, value: J) -> VisibilityCondition {
        VisibilityCondition::new(field, Operator::Eq, Some(value))
    }

    fn schema() -> FormSchema {
        FormSchema {
            description: None,
            sections: vec![
                SchemaSection {
                    title: "General".into(),
                    fields: vec![
                        SchemaField::new("enable", "enableBlocking", FieldType::Switch),
                        SchemaField::new("ttl", "blockingAnswerTtl", FieldType::Number)
                            .with_default(json!(30))
                            .with_show_if(eq("enableBlocking", json!(true))),
                        SchemaField::new("legacy", "legacy", FieldType::Text)
                            .with_hide_if(eq("enableBlocking", json!(true))),
                    ],
                    ..Default::default()
                },
                SchemaSection {
                    title: "Groups".into(),
                    show_if: Some(eq("enableBlocking", json!(true))),
                    fields: vec![SchemaField::new("groups", "groups", FieldType::Tabs)
                        .with_items(vec![
                            SchemaField::new("name", "name", FieldType::Text),
                            SchemaField::new("urls", "blockListUrls", FieldType::UrlList)
                                .with_show_if(eq("enabled", json!(true))),
                        ])],
                    ..Default::default()
                },
            ],
        }
    }

    fn ids(fields: &[VisibleField]) -> Vec<&str> {
        fields.iter().map(|f| f.field.id.as_str()).collect()
    }

    #[test]
    fn hidden_sections_and_fields_are_omitted() {
        let sections = visible_form(&schema(), &json!({"enableBlocking": false}));
        assert_eq!(sections.len(), 1);
        assert_eq!(ids(&sections[0].fields), ["enable", "legacy"]);

        let sections = visible_form(&schema(), &json!({"enableBlocking": true}));
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[1].index, 1);
        assert_eq!(ids(&sections[0].fields), ["enable", "ttl"]);
    }

    #[test]
    fn values_fall_back_to_defaults() {
        let sections = visible_form(&schema(), &json!({"enableBlocking": true, "blockingAnswerTtl": "thirty"}));
        let fields = &sections[0].fields;
        assert_eq!(fields[0].value, json!(true));
        assert_eq!(fields[1].value, json!(30));

        let doc = json!({});
        let enable = SchemaField::new("enable", "enableBlocking", FieldType::Switch);
        assert_eq!(resolve_value(&enable, &doc), json!(false));
        let map = SchemaField::new("m", "networkGroupMap", FieldType::KeyValue);
        assert_eq!(resolve_value(&map, &json!({"networkGroupMap": [1]})), json!({}));
    }

    #[test]
    fn repeating_fields_expand_per_element() {
        let doc = json!({
            "enableBlocking": true,
            "groups": [
                {"name": "default", "enabled": true, "blockListUrls": ["https://a"]},
                {"name": "", "enabled": false}
            ]
        });
        let sections = visible_form(&schema(), &doc);
        let groups = &sections[1].fields[0];
        assert_eq!(groups.items.len(), 2);

        let first = &groups.items[0];
        assert_eq!(ids(&first.fields), ["groups[0].name", "groups[0].urls"]);
        assert_eq!(first.fields[0].value, json!("default"));
        assert_eq!(first.fields[1].value, json!(["https://a"]));

        let second = &groups.items[1];
        assert_eq!(ids(&second.fields), ["groups[1].name"]);
        assert_eq!(second.fields[0].field.path.to_string(), "groups[1].name");
    }

    #[test]
    fn item_titles_come_from_item_label() {
        let mut s = schema();
        s.sections[1].fields[0].item_label = Some("name".into());
        let doc = json!({"enableBlocking": true, "groups": [{"name": "kids"}, {"name": ""}, {"name": 7}]});
        let sections = visible_form(&s, &doc);
        let titles: Vec<Option<String>> = sections[1].fields[0].items.iter().map(|i| i.title.clone()).collect();
        assert_eq!(titles, [Some("kids".to_string()), None, Some("7".to_string())]);
    }

    #[test]
    fn group_children_resolve_under_group_path() {
        let s = FormSchema {
            description: None,
            sections: vec![SchemaSection {
                title: "Forwarder".into(),
                fields: vec![SchemaField::new("doh", "dnsOverHttps", FieldType::Group).with_items(vec![
                    SchemaField::new("enabled", "enabled", FieldType::Switch),
                    SchemaField::new("port", "port", FieldType::Number)
                        .with_default(json!(443))
                        .with_show_if(eq("enabled", json!(true))),
                ])],
                ..Default::default()
            }],
        };
        let sections = visible_form(&s, &json!({"dnsOverHttps": {"enabled": true}}));
        let group = &sections[0].fields[0];
        assert_eq!(ids(&group.children), ["dnsOverHttps.enabled", "dnsOverHttps.port"]);
        assert_eq!(group.children[1].value, json!(443));

        let sections = visible_form(&s, &json!({}));
        assert_eq!(ids(&sections[0].fields[0].children), ["dnsOverHttps.enabled"]);
    }

    #[test]
    fn unsupported_fields_are_skipped() {
        let s = FormSchema {
            description: None,
            sections: vec![SchemaSection {
                title: "S".into(),
                fields: vec![
                    SchemaField::new("x", "x", FieldType::Unsupported("colorPicker".into())),
                    SchemaField::new("y", "y", FieldType::Text),
                ],
                ..Default::default()
            }],
        };
        assert_eq!(ids(&visible_form(&s, &json!({}))[0].fields), ["y"]);
    }

    #[test]
    fn rendering_is_idempotent() {
        let doc = json!({"enableBlocking": true, "groups": [{"name": "a", "enabled": true}]});
        let s = schema();
        assert_eq!(visible_form(&s, &doc), visible_form(&s, &doc));
    }
}
