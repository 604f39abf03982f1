use std::fs;
use std::io::{self, Read};

use anyhow::{Context, Result};
use colored::Colorize;
use serde_json::Value;
use tozny_provider::Provider;

use crate::cli::OutputFormat;
use crate::output::{print_document, print_schema, print_success, print_value};

fn read_json_file(path: &str) -> Result<Value> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {path}"))
}

fn read_body(file: &Option<String>) -> Result<Value> {
    match file {
        Some(path) => read_json_file(path),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            serde_json::from_str(&buf).context("Invalid JSON")
        }
    }
}

fn state_id(state: &Value) -> &str {
    state
        .get(tozny_core::ID_ATTRIBUTE)
        .and_then(Value::as_str)
        .unwrap_or("?")
}

pub fn schema(provider: &Provider, type_name: Option<&str>, format: OutputFormat) -> Result<()> {
    let Some(type_name) = type_name else {
        let value = serde_json::to_value(provider.schema())?;
        print_value(&value, format);
        return Ok(());
    };
    let schema = provider
        .resource_schema(type_name)
        .or_else(|_| provider.data_source_schema(type_name))
        .with_context(|| format!("No resource or data source named {type_name}"))?;
    print_schema(type_name, schema, format);
    Ok(())
}

pub async fn create(
    provider: &Provider,
    type_name: &str,
    file: &Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let config = read_body(file)?;
    let state = provider.create(type_name, &config).await?;
    print_success(&format!("Created {}/{}", type_name.cyan(), state_id(&state).cyan()));
    print_document(&state, provider.resource_schema(type_name)?, format);
    Ok(())
}

pub async fn read(
    provider: &Provider,
    type_name: &str,
    file: &Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let state = read_body(file)?;
    match provider.read(type_name, &state).await? {
        Some(refreshed) => {
            print_document(&refreshed, provider.resource_schema(type_name)?, format);
        }
        None => {
            print_success(&format!(
                "{}/{} no longer exists",
                type_name.cyan(),
                state_id(&state).cyan()
            ));
            print_value(&Value::Null, format);
        }
    }
    Ok(())
}

pub async fn update(
    provider: &Provider,
    type_name: &str,
    prior: &str,
    file: &Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let prior = read_json_file(prior)?;
    let planned = read_body(file)?;
    let state = provider.update(type_name, &prior, &planned).await?;
    print_success(&format!("Updated {}/{}", type_name.cyan(), state_id(&state).cyan()));
    print_document(&state, provider.resource_schema(type_name)?, format);
    Ok(())
}

pub async fn delete(provider: &Provider, type_name: &str, file: &Option<String>) -> Result<()> {
    let state = read_body(file)?;
    provider.delete(type_name, &state).await?;
    print_success(&format!("Deleted {}/{}", type_name.cyan(), state_id(&state).cyan()));
    Ok(())
}

pub async fn data(
    provider: &Provider,
    type_name: &str,
    file: &Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let config = read_body(file)?;
    let state = provider.read_data_source(type_name, &config).await?;
    print_document(&state, provider.data_source_schema(type_name)?, format);
    Ok(())
}
