// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::{bail, Context, Result};
use config_form::{
    document, validate, FieldPath, FieldType, FileConfigStore, FileSchemaSource, FormSchema,
    FormSession, SchemaField, VisibleField,
};
use serde_json::Value as J;
use std::fmt::Write as _;
use std::path::Path;

use crate::settings::{parse_value, Settings};
use crate::{Commands, DocumentArgs};

pub async fn run(command: Commands, settings: &Settings) -> Result<()> {
    match command {
        Commands::Render { doc, json } => render(&doc, json, settings).await,
        Commands::Get { doc, path } => get(&doc, &path, settings).await,
        Commands::Set { doc, path, value } => set(&doc, &path, &value, settings).await,
        Commands::AddItem { doc, field } => add_item(&doc, &field, settings).await,
        Commands::RemoveItem { doc, field, index } => {
            remove_item(&doc, &field, index, settings).await
        }
        Commands::CheckSchema { schema } => check_schema(&schema).await,
        Commands::PrintSchema => {
            let schema = FormSchema::json_schema()?;
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(())
        }
    }
}

async fn open(args: &DocumentArgs, settings: &Settings) -> Result<(FormSession, FileConfigStore)> {
    if settings.strict_schema {
        if let Some(schema) = &args.schema {
            let problems = schema_problems(schema).await?;
            if !problems.is_empty() {
                bail!(
                    "schema {} is invalid:\n  - {}",
                    schema.display(),
                    problems.join("\n  - ")
                );
            }
        }
    }

    let store = FileConfigStore::new(&args.config);
    let session = FormSession::open(&store, &FileSchemaSource::new(args.schema.clone()))
        .await
        .with_context(|| format!("failed to open {}", args.config.display()))?;
    Ok((session, store))
}

async fn save(session: &mut FormSession, store: &FileConfigStore, settings: &Settings) -> Result<()> {
    session
        .save_with(store, settings.indent, settings.sort_keys)
        .await
        .with_context(|| format!("failed to write {}", store.path().display()))
}

fn ensure_object(session: &FormSession, args: &DocumentArgs) -> Result<()> {
    let doc = session.document();
    if !doc.is_object() {
        bail!(
            "{} holds {}, not a JSON object; refusing to edit it field by field",
            args.config.display(),
            document::kind_name(doc)
        );
    }
    Ok(())
}

fn schema_field(session: &FormSession, id: &str) -> Result<SchemaField> {
    match session.schema().field(id) {
        Some(field) => Ok(field.clone()),
        None if !session.structured_editing_available() => {
            bail!("no usable form schema; cannot look up field '{id}'")
        }
        None => bail!("schema has no field '{id}'"),
    }
}

async fn render(args: &DocumentArgs, json: bool, settings: &Settings) -> Result<()> {
    let (session, _) = open(args, settings).await?;

    if !session.structured_editing_available() {
        eprintln!("structured editing is not available for this config; showing raw JSON");
        println!(
            "{}",
            document::to_json_with(session.document(), settings.indent, settings.sort_keys)?
        );
        return Ok(());
    }

    let sections = session.visible();
    if json {
        let value = serde_json::to_value(&sections)?;
        println!("{}", document::to_json_with(&value, settings.indent, false)?);
        return Ok(());
    }

    let mut out = String::new();
    for section in &sections {
        writeln!(out, "{}", section.title)?;
        for field in &section.fields {
            write_field(&mut out, field, 1)?;
        }
    }
    print!("{out}");
    Ok(())
}

fn write_field(out: &mut String, visible: &VisibleField, depth: usize) -> std::fmt::Result {
    let indent = "  ".repeat(depth);
    let field = &visible.field;
    if field.field_type.is_composite() {
        writeln!(out, "{indent}{} [{}]", field.id, field.field_type)?;
    } else {
        writeln!(out, "{indent}{} [{}] = {}", field.id, field.field_type, visible.value)?;
    }

    for item in &visible.items {
        match &item.title {
            Some(title) => writeln!(out, "{indent}  #{} {title}", item.index)?,
            None => writeln!(out, "{indent}  #{}", item.index)?,
        }
        for child in &item.fields {
            write_field(out, child, depth + 2)?;
        }
    }
    for child in &visible.children {
        write_field(out, child, depth + 1)?;
    }
    Ok(())
}

async fn get(args: &DocumentArgs, raw_path: &str, settings: &Settings) -> Result<()> {
    let (session, _) = open(args, settings).await?;
    let path = FieldPath::parse_strict(raw_path)?;
    let Some(value) = session.value(&path) else {
        bail!("no value at '{raw_path}'");
    };
    println!("{}", document::to_json_with(value, settings.indent, settings.sort_keys)?);
    Ok(())
}

async fn set(args: &DocumentArgs, raw_path: &str, raw_value: &str, settings: &Settings) -> Result<()> {
    let (mut session, store) = open(args, settings).await?;
    ensure_object(&session, args)?;
    let path = FieldPath::parse_strict(raw_path)?;
    if !session.set_value(&path, parse_value(raw_value)) {
        bail!("refusing to write '{raw_path}': index is too far past the end of the list");
    }
    save(&mut session, &store, settings).await
}

async fn add_item(args: &DocumentArgs, id: &str, settings: &Settings) -> Result<()> {
    let (mut session, store) = open(args, settings).await?;
    ensure_object(&session, args)?;
    let field = schema_field(&session, id)?;
    let Some(index) = session.add_item(&field) else {
        bail!("field '{id}' of type {} does not hold items", field.field_type);
    };
    save(&mut session, &store, settings).await?;
    println!("{index}");
    Ok(())
}

async fn remove_item(args: &DocumentArgs, id: &str, index: usize, settings: &Settings) -> Result<()> {
    let (mut session, store) = open(args, settings).await?;
    ensure_object(&session, args)?;
    let field = schema_field(&session, id)?;
    let Some(removed) = session.remove_item(&field, index) else {
        bail!("'{}' has no element {index}", field.path);
    };
    save(&mut session, &store, settings).await?;
    println!("{removed}");
    Ok(())
}

async fn check_schema(path: &Path) -> Result<()> {
    let problems = schema_problems(path).await?;
    if !problems.is_empty() {
        for problem in &problems {
            eprintln!("- {problem}");
        }
        bail!("{} has {} problem(s)", path.display(), problems.len());
    }

    let text = tokio::fs::read_to_string(path).await?;
    let schema = FormSchema::from_json_str(&text)?;
    let mut unsupported = Vec::new();
    for section in &schema.sections {
        collect_unsupported(&section.fields, &mut unsupported);
    }
    for (id, name) in &unsupported {
        eprintln!("warning: field '{id}' has unsupported type '{name}' and will not be shown");
    }

    let fields: usize = schema.sections.iter().map(|s| s.fields.len()).sum();
    println!("ok: {} sections, {} fields", schema.sections.len(), fields);
    Ok(())
}

/// Everything wrong with the schema document at `path`
async fn schema_problems(path: &Path) -> Result<Vec<String>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let raw: J = document::parse(&text).with_context(|| format!("{} is not JSON", path.display()))?;

    let mut problems = Vec::new();
    if let Err(e) = validate::validate_schema_document(&raw) {
        problems.push(e.to_string());
    }
    for issue in validate::check_field_paths(&raw) {
        problems.push(format!("{}: {}", issue.location, issue.message));
    }
    if problems.is_empty() {
        if let Err(e) = FormSchema::from_value(raw) {
            problems.push(e.to_string());
        }
    }
    Ok(problems)
}

fn collect_unsupported(fields: &[SchemaField], out: &mut Vec<(String, String)>) {
    for field in fields {
        if let FieldType::Unsupported(name) = &field.field_type {
            out.push((field.id.clone(), name.clone()));
        }
        collect_unsupported(&field.item_schema, out);
    }
}
