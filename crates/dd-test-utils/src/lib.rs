// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! DnsDeck Test Utilities
//!
//! Every test that exercises more than a single function writes its own log
//! file under `target/test-logs`. Successful tests print one line; failing
//! tests print the log path so the full output can be opened directly.

pub mod fixtures;
pub mod logging;

pub use fixtures::{write_fixture, FixtureDir, ADVANCED_BLOCKING_CONFIG, ADVANCED_BLOCKING_SCHEMA};
pub use logging::{create_unique_test_log, TestLogError, TestLogger};
