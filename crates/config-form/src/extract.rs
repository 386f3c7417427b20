// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Typed extraction from configuration documents

use serde::de::DeserializeOwned;
use serde_json::Value as J;

use crate::error::{FormError, Result};
use crate::path::{self, FieldPath};

/// Extract the whole document as a typed value
pub fn get<T: DeserializeOwned>(root: &J) -> Result<T> {
    get_at(root, &FieldPath::root())
}

/// Extract the value at `at` as a typed value
///
/// A missing value is deserialized from `null`, so `Option<T>` targets read
/// absent paths as `None`.
pub fn get_at<T: DeserializeOwned>(root: &J, at: &FieldPath) -> Result<T> {
    let value = path::get(root, at).cloned().unwrap_or(J::Null);
    serde_path_to_error::deserialize(value).map_err(|e| {
        let inner = e.path().to_string();
        let path = match (at.is_empty(), inner.as_str()) {
            (true, _) => inner,
            (false, ".") => at.to_string(),
            (false, _) if inner.starts_with('[') => format!("{at}{inner}"),
            (false, _) => format!("{at}.{inner}"),
        };
        FormError::Extract {
            path,
            message: e.inner().to_string(),
        }
    })
}
