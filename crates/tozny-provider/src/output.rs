use colored::Colorize;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::settings::Style;
use tozny_core::Schema;

use crate::cli::OutputFormat;

const REDACTED: &str = "(sensitive)";

/// Print a state document. Table output hides sensitive attributes; JSON and
/// YAML print the full document so it can be fed back as `--prior`.
pub fn print_document(value: &Value, schema: &Schema, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", to_json(value)),
        OutputFormat::Yaml => println!("{}", to_yaml(value)),
        OutputFormat::Table => print_document_table(&redact(value, schema)),
    }
}

pub fn print_schema(name: &str, schema: &Schema, format: OutputFormat) {
    match format {
        OutputFormat::Table => print_schema_table(name, schema),
        _ => {
            let value = serde_json::to_value(schema).unwrap_or_default();
            print_value(&value, format);
        }
    }
}

pub fn print_value(value: &Value, format: OutputFormat) {
    match format {
        OutputFormat::Json | OutputFormat::Table => println!("{}", to_json(value)),
        OutputFormat::Yaml => println!("{}", to_yaml(value)),
    }
}

pub fn print_success(msg: &str) {
    eprintln!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

fn to_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Replace non-empty sensitive attribute values with a placeholder.
pub fn redact(value: &Value, schema: &Schema) -> Value {
    let mut value = value.clone();
    if let Some(object) = value.as_object_mut() {
        for name in schema.sensitive_attributes() {
            if let Some(field) = object.get_mut(name) {
                let empty = matches!(field, Value::Null)
                    || field.as_str().is_some_and(str::is_empty);
                if !empty {
                    *field = Value::String(REDACTED.to_string());
                }
            }
        }
    }
    value
}

fn print_document_table(value: &Value) {
    let Some(object) = value.as_object() else {
        println!("{}", to_json(value));
        return;
    };
    let mut builder = Builder::default();
    builder.push_record(["Attribute", "Value"]);
    for (key, field) in object {
        let rendered = match field {
            Value::String(s) => s.clone(),
            Value::Null => "-".to_string(),
            other => other.to_string(),
        };
        builder.push_record([key.as_str(), rendered.as_str()]);
    }
    println!("{}", builder.build().with(Style::rounded()));
}

fn print_schema_table(name: &str, schema: &Schema) {
    println!("{} {}", name.cyan(), schema.description);
    let mut builder = Builder::default();
    builder.push_record(["Attribute", "Type", "Mode", "Flags", "Default"]);
    for (attribute_name, attribute) in &schema.attributes {
        let mode = if attribute.required {
            "required"
        } else if attribute.optional && attribute.computed {
            "optional+computed"
        } else if attribute.optional {
            "optional"
        } else {
            "computed"
        };
        let mut flags = Vec::new();
        if attribute.force_new {
            flags.push("force_new");
        }
        if attribute.sensitive {
            flags.push("sensitive");
        }
        let kind = serde_json::to_value(attribute.kind)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        let default = attribute
            .default
            .as_ref()
            .map(Value::to_string)
            .unwrap_or_default();
        builder.push_record([
            attribute_name.as_str(),
            kind.as_str(),
            mode,
            flags.join(",").as_str(),
            default.as_str(),
        ]);
    }
    println!("{}", builder.build().with(Style::rounded()));
}

fn to_yaml(value: &Value) -> String {
    serde_yaml::to_string(value)
        .map(|yaml| yaml.trim_end().to_string())
        .unwrap_or_else(|_| to_json(value))
}
