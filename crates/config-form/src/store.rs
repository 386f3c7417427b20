// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Seams to the collaborators that load and persist configuration text
//!
//! In the mobile client these are calls to the DNS server's app-config API
//! and a fetch of the app's schema URL. The engine only sees raw text and
//! never retries; timeouts and retries belong to the implementation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::{FormError, Result};

/// Source and sink of an app's raw JSON configuration
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AppConfigStore: Send + Sync {
    async fn load_config(&self) -> Result<String>;

    async fn save_config(&self, json: &str) -> Result<()>;
}

/// Source of a form schema document; `None` when the app publishes none
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SchemaSource: Send + Sync {
    async fn load_schema(&self) -> Result<Option<String>>;
}

/// Configuration kept in a local JSON file
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AppConfigStore for FileConfigStore {
    async fn load_config(&self) -> Result<String> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| FormError::io(&self.path, e))
    }

    async fn save_config(&self, json: &str) -> Result<()> {
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| FormError::io(&self.path, e))?;
        tracing::info!(path = %self.path.display(), bytes = json.len(), "saved config");
        Ok(())
    }
}

/// Schema document kept in a local file, or no schema at all
#[derive(Debug, Clone, Default)]
pub struct FileSchemaSource {
    path: Option<PathBuf>,
}

impl FileSchemaSource {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

#[async_trait]
impl SchemaSource for FileSchemaSource {
    async fn load_schema(&self) -> Result<Option<String>> {
        let Some(path) = &self.path else {
            return Ok(None);
        };
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| FormError::io(path, e))?;
        Ok(Some(text))
    }
}
