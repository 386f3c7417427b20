// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use clap::{Args, Subcommand};
use dd_logging::CliLoggingArgs;
use std::path::PathBuf;

pub mod commands;
pub mod settings;

#[derive(clap::Parser)]
#[command(
    name = "ddform",
    about = "Edit DnsDeck app configuration through its form schema",
    version,
    propagate_version = true
)]
pub struct Cli {
    /// Settings file layered over the user settings
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,
    /// Override a setting, e.g. `--setting indent=4`
    #[arg(long = "setting", value_name = "KEY=VALUE", global = true)]
    pub setting_overrides: Vec<String>,
    #[command(flatten)]
    pub logging: CliLoggingArgs,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the sections and fields visible for the current config
    Render {
        #[command(flatten)]
        doc: DocumentArgs,
        /// Print the visible form as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the value at a field path
    Get {
        #[command(flatten)]
        doc: DocumentArgs,
        path: String,
    },
    /// Write a value at a field path; VALUE is JSON or plain text
    Set {
        #[command(flatten)]
        doc: DocumentArgs,
        path: String,
        value: String,
    },
    /// Append an element to a list or repeating field
    AddItem {
        #[command(flatten)]
        doc: DocumentArgs,
        /// Field id from the schema
        #[arg(long)]
        field: String,
    },
    /// Remove an element of a list or repeating field
    RemoveItem {
        #[command(flatten)]
        doc: DocumentArgs,
        #[arg(long)]
        field: String,
        #[arg(long)]
        index: usize,
    },
    /// Validate a schema document
    CheckSchema { schema: PathBuf },
    /// Print the JSON Schema of the schema-document format
    PrintSchema,
}

#[derive(Args, Clone, Debug)]
pub struct DocumentArgs {
    /// App configuration JSON file
    #[arg(long)]
    pub config: PathBuf,
    /// Form schema JSON file
    #[arg(long)]
    pub schema: Option<PathBuf>,
}

pub use clap::Parser;
