// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Deep merge of JSON documents

use serde_json::Value as J;

/// Merge `layer` into `base` with deep object merging and array replacement
///
/// Objects are merged recursively, scalars and arrays replace the left value.
/// A `null` on the right keeps the left value.
pub fn merge_two_json(base: &mut J, layer: J) {
    match (base, layer) {
        (J::Object(a), J::Object(b)) => {
            for (k, v) in b {
                merge_two_json(a.entry(k).or_insert(J::Null), v);
            }
        }
        // Arrays are replaced wholesale
        (a @ J::Array(_), J::Array(b)) => *a = J::Array(b),
        (_, J::Null) => {}
        (a, b) => *a = b,
    }
}

/// Merge each layer into an empty object in order; later layers win
pub fn merge_layers<I>(layers: I) -> J
where
    I: IntoIterator<Item = J>,
{
    let mut out = J::Object(Default::default());
    for layer in layers {
        merge_two_json(&mut out, layer);
    }
    out
}
