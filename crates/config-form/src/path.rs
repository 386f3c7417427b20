// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Field paths into configuration documents
//!
//! A [`FieldPath`] is parsed from strings such as `groups[2].blockListUrls[0]`:
//! `.` separates object keys and `[n]` indexes into arrays. Parsing through
//! [`FieldPath::parse`] never fails; malformed pieces are dropped (see the
//! rules on that function). [`FieldPath::parse_strict`] rejects them instead.
//!
//! [`get`], [`set`] and [`remove`] resolve a path against a `serde_json::Value`
//! tree. Reads never mutate and return `None` on any shape mismatch. Writes
//! create missing intermediate objects and arrays on the way down.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as J};

use crate::error::{FormError, Result};

/// Largest number of `null` slots a single write may append to an array.
pub const MAX_INDEX_PADDING: usize = 1024;

/// One step of a [`FieldPath`]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathComponent {
    Key(String),
    Index(usize),
}

/// Parsed addressing expression into a configuration document
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct FieldPath(Vec<PathComponent>);

impl FieldPath {
    /// The empty path, which addresses the document root
    pub fn root() -> Self {
        Self::default()
    }

    /// Best-effort parse. Never fails.
    ///
    /// Malformed input is handled as follows:
    /// - empty segments (`a..b`, a leading or trailing `.`) are dropped
    /// - a bracket group that is not a non-negative integer (`a[x]`, `a[]`) is dropped
    /// - an unterminated `[` ends parsing; the rest of the input is dropped
    /// - a stray `]` is dropped
    /// - text directly after `]` starts a new key (`a[0]b` is `a`, `0`, `b`)
    pub fn parse(input: &str) -> Self {
        match scan(input, false) {
            Ok(path) => path,
            // The lenient scanner has no error exits.
            Err(_) => Self::root(),
        }
    }

    /// Strict parse that rejects every case [`FieldPath::parse`] repairs
    pub fn parse_strict(input: &str) -> Result<Self> {
        if input.is_empty() {
            return Err(path_error(input, 0, "empty path"));
        }
        scan(input, true)
    }

    pub fn components(&self) -> &[PathComponent] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn last(&self) -> Option<&PathComponent> {
        self.0.last()
    }

    /// Path of the containing node, `None` for the root
    pub fn parent(&self) -> Option<FieldPath> {
        self.split_last().map(|(_, parent)| parent)
    }

    pub fn split_last(&self) -> Option<(&PathComponent, FieldPath)> {
        let (last, rest) = self.0.split_last()?;
        Some((last, FieldPath(rest.to_vec())))
    }

    pub fn child(&self, key: impl Into<String>) -> FieldPath {
        let mut components = self.0.clone();
        components.push(PathComponent::Key(key.into()));
        FieldPath(components)
    }

    pub fn index(&self, index: usize) -> FieldPath {
        let mut components = self.0.clone();
        components.push(PathComponent::Index(index));
        FieldPath(components)
    }

    pub fn join(&self, other: &FieldPath) -> FieldPath {
        let mut components = self.0.clone();
        components.extend(other.0.iter().cloned());
        FieldPath(components)
    }
}

fn path_error(input: &str, position: usize, reason: &'static str) -> FormError {
    FormError::Path {
        input: input.to_string(),
        position,
        reason,
    }
}

fn scan(input: &str, strict: bool) -> Result<FieldPath> {
    let mut components = Vec::new();
    let mut key = String::new();
    // True right after a '.' and at the start of input
    let mut at_separator = true;
    let mut after_bracket = false;
    let mut chars = input.char_indices();

    while let Some((pos, ch)) = chars.next() {
        match ch {
            '.' => {
                if key.is_empty() && at_separator && strict {
                    return Err(path_error(input, pos, "empty segment"));
                }
                if !key.is_empty() {
                    components.push(PathComponent::Key(std::mem::take(&mut key)));
                }
                at_separator = true;
                after_bracket = false;
            }
            '[' => {
                if !key.is_empty() {
                    components.push(PathComponent::Key(std::mem::take(&mut key)));
                }
                let mut inner = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    if c == ']' {
                        closed = true;
                        break;
                    }
                    inner.push(c);
                }
                if !closed {
                    if strict {
                        return Err(path_error(input, pos, "unterminated '['"));
                    }
                    return Ok(FieldPath(components));
                }
                match parse_index(&inner) {
                    Some(index) => components.push(PathComponent::Index(index)),
                    None if strict => {
                        return Err(path_error(
                            input,
                            pos,
                            "index is not a non-negative integer",
                        ));
                    }
                    None => {}
                }
                at_separator = false;
                after_bracket = true;
            }
            ']' => {
                if strict {
                    return Err(path_error(input, pos, "unmatched ']'"));
                }
            }
            _ => {
                if after_bracket && strict {
                    return Err(path_error(input, pos, "expected '.' or '[' after ']'"));
                }
                key.push(ch);
                at_separator = false;
                after_bracket = false;
            }
        }
    }

    if strict && at_separator {
        return Err(path_error(input, input.len(), "trailing '.'"));
    }
    if !key.is_empty() {
        components.push(PathComponent::Key(key));
    }
    Ok(FieldPath(components))
}

fn parse_index(inner: &str) -> Option<usize> {
    if inner.is_empty() || !inner.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    inner.parse().ok()
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, component) in self.0.iter().enumerate() {
            match component {
                PathComponent::Key(key) if i == 0 => write!(f, "{}", key)?,
                PathComponent::Key(key) => write!(f, ".{}", key)?,
                PathComponent::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

impl From<&str> for FieldPath {
    fn from(s: &str) -> Self {
        FieldPath::parse(s)
    }
}

impl From<String> for FieldPath {
    fn from(s: String) -> Self {
        FieldPath::parse(&s)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.to_string()
    }
}

impl FromStr for FieldPath {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self> {
        FieldPath::parse_strict(s)
    }
}

impl schemars::JsonSchema for FieldPath {
    fn schema_name() -> String {
        "FieldPath".to_owned()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        <String as schemars::JsonSchema>::json_schema(gen)
    }
}

/// Resolve `path` inside `doc`
///
/// The empty path resolves to `doc` itself.
pub fn get<'a>(doc: &'a J, path: &FieldPath) -> Option<&'a J> {
    path.components().iter().try_fold(doc, |cur, component| match (component, cur) {
        (PathComponent::Key(key), J::Object(map)) => map.get(key),
        (PathComponent::Index(index), J::Array(items)) => items.get(*index),
        _ => None,
    })
}

pub fn get_mut<'a>(doc: &'a mut J, path: &FieldPath) -> Option<&'a mut J> {
    let mut cur = doc;
    for component in path.components() {
        cur = match (component, cur) {
            (PathComponent::Key(key), J::Object(map)) => map.get_mut(key)?,
            (PathComponent::Index(index), J::Array(items)) => items.get_mut(*index)?,
            _ => return None,
        };
    }
    Some(cur)
}

/// Write `value` at `path`, creating intermediate nodes as needed
///
/// A node on the way that has the wrong shape for the next component is
/// replaced: with an empty object for a key, with an empty array for an
/// index. Arrays shorter than an index are padded with `null`. Returns
/// `false` without touching the document when a write would append more than
/// [`MAX_INDEX_PADDING`] slots to an array.
pub fn set(doc: &mut J, path: &FieldPath, value: J) -> bool {
    if let Some(index) = excessive_padding(doc, path) {
        tracing::warn!(path = %path, index, "refusing write that pads an array past the limit");
        return false;
    }

    let mut cur = doc;
    for component in path.components() {
        cur = match component {
            PathComponent::Key(key) => match vivify_object(cur) {
                Some(map) => map.entry(key.clone()).or_insert(J::Null),
                None => return false,
            },
            PathComponent::Index(index) => match vivify_slot(cur, *index) {
                Some(slot) => slot,
                None => return false,
            },
        };
    }
    *cur = value;
    true
}

/// Remove the value at `path`, returning it
///
/// Array elements after the removed one shift down.
pub fn remove(doc: &mut J, path: &FieldPath) -> Option<J> {
    let (last, parent) = path.split_last()?;
    match (last, get_mut(doc, &parent)?) {
        (PathComponent::Key(key), J::Object(map)) => map.remove(key),
        (PathComponent::Index(index), J::Array(items)) if *index < items.len() => {
            Some(items.remove(*index))
        }
        _ => None,
    }
}

fn vivify_object(node: &mut J) -> Option<&mut Map<String, J>> {
    if !node.is_object() {
        *node = J::Object(Map::new());
    }
    node.as_object_mut()
}

fn vivify_slot(node: &mut J, index: usize) -> Option<&mut J> {
    if !node.is_array() {
        *node = J::Array(Vec::new());
    }
    let items = node.as_array_mut()?;
    if items.len() <= index {
        items.resize(index + 1, J::Null);
    }
    items.get_mut(index)
}

/// First index on `path` that would pad an array past [`MAX_INDEX_PADDING`]
fn excessive_padding(doc: &J, path: &FieldPath) -> Option<usize> {
    let mut cur = Some(doc);
    for component in path.components() {
        if let PathComponent::Index(index) = component {
            let len = match cur {
                Some(J::Array(items)) => items.len(),
                _ => 0,
            };
            if index.saturating_sub(len) > MAX_INDEX_PADDING {
                return Some(*index);
            }
        }
        cur = cur.and_then(|node| match (component, node) {
            (PathComponent::Key(key), J::Object(map)) => map.get(key),
            (PathComponent::Index(index), J::Array(items)) => items.get(*index),
            _ => None,
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys(names: &[&str]) -> Vec<PathComponent> {
        names.iter().map(|n| PathComponent::Key(n.to_string())).collect()
    }

    #[test]
    fn parses_dotted_keys() {
        assert_eq!(FieldPath::parse("a.b.c").components(), keys(&["a", "b", "c"]));
    }

    #[test]
    fn parses_indexes() {
        assert_eq!(
            FieldPath::parse("items[3]").components(),
            [PathComponent::Key("items".into()), PathComponent::Index(3)]
        );
        assert_eq!(
            FieldPath::parse("groups[2].blockListUrls[0]").components(),
            [
                PathComponent::Key("groups".into()),
                PathComponent::Index(2),
                PathComponent::Key("blockListUrls".into()),
                PathComponent::Index(0),
            ]
        );
        assert_eq!(
            FieldPath::parse("[0].name").components(),
            [PathComponent::Index(0), PathComponent::Key("name".into())]
        );
        assert_eq!(
            FieldPath::parse("m[1][2]").components(),
            [
                PathComponent::Key("m".into()),
                PathComponent::Index(1),
                PathComponent::Index(2),
            ]
        );
    }

    #[test]
    fn lenient_parse_repairs_malformed_input() {
        assert_eq!(FieldPath::parse("a..b").components(), keys(&["a", "b"]));
        assert_eq!(FieldPath::parse(".a.").components(), keys(&["a"]));
        assert_eq!(FieldPath::parse("a[x].b").components(), keys(&["a", "b"]));
        assert_eq!(FieldPath::parse("a[].b").components(), keys(&["a", "b"]));
        assert_eq!(FieldPath::parse("a[-1]").components(), keys(&["a"]));
        assert_eq!(FieldPath::parse("a.b[2").components(), keys(&["a", "b"]));
        assert_eq!(FieldPath::parse("a]b").components(), keys(&["ab"]));
        assert_eq!(
            FieldPath::parse("a[0]b").components(),
            [
                PathComponent::Key("a".into()),
                PathComponent::Index(0),
                PathComponent::Key("b".into()),
            ]
        );
        assert!(FieldPath::parse("").is_empty());
        assert!(FieldPath::parse("...").is_empty());
        assert!(FieldPath::parse("[").is_empty());
        assert_eq!(
            FieldPath::parse("a[99999999999999999999999]").components(),
            keys(&["a"])
        );
    }

    #[test]
    fn strict_parse_rejects_malformed_input() {
        for bad in ["", "a..b", ".a", "a.", "a[x]", "a[]", "a[-1]", "a[2", "a]", "a[0]b"] {
            assert!(FieldPath::parse_strict(bad).is_err(), "{bad:?} should be rejected");
        }
        for good in ["a", "a.b", "a[0]", "a[0].b", "[1].c", "a[1][2]"] {
            assert!(FieldPath::parse_strict(good).is_ok(), "{good:?} should parse");
        }
    }

    #[test]
    fn strict_error_reports_position() {
        match FieldPath::parse_strict("ab[3") {
            Err(FormError::Path {
                position, reason, ..
            }) => {
                assert_eq!(position, 2);
                assert_eq!(reason, "unterminated '['");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn display_is_canonical() {
        assert_eq!(FieldPath::parse("a..b[1].c").to_string(), "a.b[1].c");
        assert_eq!(FieldPath::parse("[0].x").to_string(), "[0].x");
        let path = FieldPath::parse("groups").index(4).child("name");
        assert_eq!(path.to_string(), "groups[4].name");
    }

    #[test]
    fn serde_uses_string_form() {
        let path: FieldPath = serde_json::from_value(json!("a.b[0]")).unwrap();
        assert_eq!(path, FieldPath::parse("a.b[0]"));
        assert_eq!(serde_json::to_value(&path).unwrap(), json!("a.b[0]"));
    }

    #[test]
    fn get_walks_objects_and_arrays() {
        let doc = json!({"a": {"b": [10, {"c": "deep"}]}});
        assert_eq!(get(&doc, &"a.b[0]".into()), Some(&json!(10)));
        assert_eq!(get(&doc, &"a.b[1].c".into()), Some(&json!("deep")));
        assert_eq!(get(&doc, &FieldPath::root()), Some(&doc));
    }

    #[test]
    fn get_is_absent_on_shape_mismatch() {
        let doc = json!({"a": {"b": [10]}, "s": "text"});
        assert_eq!(get(&doc, &"a.b[5]".into()), None);
        assert_eq!(get(&doc, &"a[0]".into()), None);
        assert_eq!(get(&doc, &"a.b.c".into()), None);
        assert_eq!(get(&doc, &"s.length".into()), None);
        assert_eq!(get(&doc, &"missing.key".into()), None);
    }

    #[test]
    fn set_single_key_on_root() {
        let mut doc = json!({"keep": 1});
        assert!(set(&mut doc, &"enableBlocking".into(), json!(true)));
        assert_eq!(doc, json!({"keep": 1, "enableBlocking": true}));
    }

    #[test]
    fn set_creates_intermediate_objects() {
        let mut doc = json!({"a": "not an object"});
        assert!(set(&mut doc, &"a.b.c".into(), json!(5)));
        assert_eq!(doc, json!({"a": {"b": {"c": 5}}}));
        assert_eq!(get(&doc, &"a.b.c".into()), Some(&json!(5)));
    }

    #[test]
    fn set_writes_into_array_elements() {
        let mut doc = json!({});
        assert!(set(&mut doc, &"groups[0].name".into(), json!("default")));
        assert_eq!(doc, json!({"groups": [{"name": "default"}]}));
        assert_eq!(get(&doc, &"groups[0].name".into()), Some(&json!("default")));

        assert!(set(&mut doc, &"groups[2].name".into(), json!("third")));
        assert_eq!(
            doc,
            json!({"groups": [{"name": "default"}, null, {"name": "third"}]})
        );

        assert!(set(&mut doc, &"groups[0].name".into(), json!("renamed")));
        assert_eq!(get(&doc, &"groups[0].name".into()), Some(&json!("renamed")));
        assert_eq!(get(&doc, &"groups[2].name".into()), Some(&json!("third")));
    }

    #[test]
    fn set_replaces_mismatched_containers() {
        let mut doc = json!({"groups": {"name": "x"}, "tags": ["a"]});
        assert!(set(&mut doc, &"groups[1]".into(), json!("g")));
        assert!(set(&mut doc, &"tags.first".into(), json!("b")));
        assert_eq!(doc, json!({"groups": [null, "g"], "tags": {"first": "b"}}));
    }

    #[test]
    fn set_empty_path_replaces_document() {
        let mut doc = json!({"a": 1});
        assert!(set(&mut doc, &FieldPath::root(), json!([1, 2])));
        assert_eq!(doc, json!([1, 2]));
    }

    #[test]
    fn set_refuses_runaway_padding() {
        let mut doc = json!({"list": [1]});
        let far = FieldPath::parse("list").index(MAX_INDEX_PADDING + 2);
        assert!(!set(&mut doc, &far, json!(0)));
        assert_eq!(doc, json!({"list": [1]}));

        let near = FieldPath::parse("list").index(MAX_INDEX_PADDING);
        assert!(set(&mut doc, &near, json!(0)));
        assert_eq!(doc["list"].as_array().map(Vec::len), Some(MAX_INDEX_PADDING + 1));
    }

    #[test]
    fn get_after_set_returns_value() {
        let cases = [
            ("a", json!(1)),
            ("a.b", json!("x")),
            ("x[1].y", json!([1, 2])),
            ("deep.er[0][1].z", json!({"k": null})),
            ("n", json!(null)),
        ];
        for (raw, value) in cases {
            let mut doc = json!({"a": {"b": "old"}, "x": "scalar"});
            let path = FieldPath::parse(raw);
            assert!(set(&mut doc, &path, value.clone()));
            assert_eq!(get(&doc, &path), Some(&value), "path {raw}");
        }
    }

    #[test]
    fn remove_object_key_and_array_element() {
        let mut doc = json!({"a": {"b": 1, "c": 2}, "l": ["x", "y", "z"]});
        assert_eq!(remove(&mut doc, &"a.b".into()), Some(json!(1)));
        assert_eq!(remove(&mut doc, &"l[1]".into()), Some(json!("y")));
        assert_eq!(doc, json!({"a": {"c": 2}, "l": ["x", "z"]}));
        assert_eq!(remove(&mut doc, &"l[7]".into()), None);
        assert_eq!(remove(&mut doc, &"nope.x".into()), None);
        assert_eq!(remove(&mut doc, &FieldPath::root()), None);
    }
}
