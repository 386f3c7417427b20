// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Config and schema fixtures shared by the engine and CLI tests

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Configuration of the Advanced Blocking app as a DNS server returns it
pub const ADVANCED_BLOCKING_CONFIG: &str = r#"{
  "enableBlocking": true,
  "blockListUrlUpdateIntervalHours": 24,
  "networkGroupMap": {
    "0.0.0.0/0": "everyone",
    "192.168.10.0/24": "kids"
  },
  "groups": [
    {
      "name": "everyone",
      "enableBlocking": true,
      "blockAsNxDomain": true,
      "allowed": [],
      "blocked": ["ads.example.com"],
      "blockListUrls": ["https://example.com/hosts.txt"]
    },
    {
      "name": "kids",
      "enableBlocking": false,
      "blockAsNxDomain": false,
      "allowed": [],
      "blocked": [],
      "blockListUrls": []
    }
  ],
  "serverVersion": "13.2"
}"#;

/// Form schema published alongside [`ADVANCED_BLOCKING_CONFIG`]
pub const ADVANCED_BLOCKING_SCHEMA: &str = r#"{
  "description": "Block domain names per client network",
  "sections": [
    {
      "title": "General",
      "icon": "shield",
      "fields": [
        { "id": "enableBlocking", "path": "enableBlocking", "type": "switch", "label": "Enable Blocking" },
        {
          "id": "updateInterval",
          "path": "blockListUrlUpdateIntervalHours",
          "type": "number",
          "label": "Update Interval",
          "min": 1,
          "max": 168,
          "suffix": "hours",
          "default": 24,
          "showIf": { "field": "enableBlocking", "operator": "eq", "value": true }
        },
        {
          "id": "disabledNotice",
          "path": "disabledNotice",
          "type": "text",
          "label": "Notice",
          "hideIf": { "field": "enableBlocking", "operator": "eq", "value": true }
        }
      ]
    },
    {
      "title": "Networks",
      "collapsible": true,
      "showIf": { "field": "enableBlocking", "operator": "eq", "value": true },
      "fields": [
        { "id": "networkGroupMap", "path": "networkGroupMap", "type": "keyValue", "label": "Network to Group" }
      ]
    },
    {
      "title": "Groups",
      "showIf": { "field": "enableBlocking", "operator": "eq", "value": true },
      "fields": [
        {
          "id": "groups",
          "path": "groups",
          "type": "tabs",
          "label": "Groups",
          "itemLabel": "name",
          "addLabel": "Add Group",
          "itemSchema": [
            { "id": "name", "path": "name", "type": "text", "label": "Name", "placeholder": "group name" },
            { "id": "enableBlocking", "path": "enableBlocking", "type": "switch", "label": "Enable Blocking", "default": true },
            {
              "id": "blockAsNxDomain",
              "path": "blockAsNxDomain",
              "type": "switch",
              "label": "Block as NXDOMAIN",
              "showIf": { "field": "enableBlocking", "operator": "eq", "value": true }
            },
            { "id": "allowed", "path": "allowed", "type": "list", "label": "Allowed" },
            { "id": "blocked", "path": "blocked", "type": "list", "label": "Blocked" },
            {
              "id": "blockListUrls",
              "path": "blockListUrls",
              "type": "urlList",
              "label": "Block List URLs",
              "showIf": { "field": "enableBlocking", "operator": "eq", "value": true }
            }
          ]
        }
      ]
    }
  ]
}"#;

/// Temporary directory holding fixture files for one test
pub struct FixtureDir {
    dir: TempDir,
}

impl FixtureDir {
    pub fn new() -> io::Result<Self> {
        Ok(Self { dir: TempDir::new()? })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to `name` inside the directory
    pub fn write(&self, name: &str, contents: &str) -> io::Result<PathBuf> {
        write_fixture(self.dir.path(), name, contents)
    }

    pub fn read(&self, name: &str) -> io::Result<String> {
        fs::read_to_string(self.dir.path().join(name))
    }
}

/// Write `contents` to `dir/name`, creating parent directories
pub fn write_fixture(dir: &Path, name: &str, contents: &str) -> io::Result<PathBuf> {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, contents)?;
    Ok(path)
}
