//! Output rendering: table, JSON, or single-field projection of a dispatched batch.
//!
//! Rendering is a pure function of the batch and the options. It never mutates resources,
//! and a failed resource degrades to an error entry rather than failing the whole render.

use crate::error::RackError;
use crate::resource::{Resource, ResourceState, ResultMap};
use comfy_table::{presets, Table};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub format: OutputFormat,
    /// User-requested output keys; empty means the command's default keys.
    pub fields: Vec<String>,
    pub header: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Table,
            fields: Vec::new(),
            header: true,
        }
    }
}

/// Rendered output, split by destination stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendered {
    pub stdout: String,
    /// One line per failed item (table and projection modes).
    pub stderr: Vec<String>,
}

/// Render a dispatched batch in input order.
pub fn render<P>(
    resources: &[Resource<P>],
    keys: &[&str],
    options: &RenderOptions,
) -> Result<Rendered, RackError> {
    match options.format {
        OutputFormat::Json => render_json(resources, &options.fields),
        OutputFormat::Table if options.fields.len() == 1 => {
            Ok(render_projection(resources, &options.fields[0]))
        }
        OutputFormat::Table => {
            let columns: Vec<String> = if options.fields.is_empty() {
                keys.iter().map(|k| k.to_string()).collect()
            } else {
                options.fields.clone()
            };
            Ok(render_table(resources, &columns, options.header))
        }
    }
}

/// Stderr line for a failed item: its identifying input and the underlying error.
pub fn error_line<P>(resource: &Resource<P>) -> Option<String> {
    resource
        .err()
        .map(|err| format!("error: {}: {}", resource.display_name(), err))
}

fn render_table<P>(resources: &[Resource<P>], columns: &[String], header: bool) -> Rendered {
    let mut rendered = Rendered::default();
    let mut table = Table::new();
    table.load_preset(presets::NOTHING);
    if header {
        table.set_header(columns.to_vec());
    }
    let mut rows = 0usize;
    for resource in resources {
        match resource.state() {
            ResourceState::Succeeded(payload) => {
                for record in payload.records() {
                    table.add_row(
                        columns
                            .iter()
                            .map(|c| cell(lookup(record, c)))
                            .collect::<Vec<String>>(),
                    );
                    rows += 1;
                }
            }
            ResourceState::Failed(_) => rendered.stderr.extend(error_line(resource)),
            ResourceState::Pending => {}
        }
    }
    if rows > 0 {
        for column in table.column_iter_mut() {
            column.set_padding((0, 2));
        }
        for line in table.lines() {
            rendered.stdout.push_str(line.trim_end());
            rendered.stdout.push('\n');
        }
    }
    rendered
}

fn render_projection<P>(resources: &[Resource<P>], field: &str) -> Rendered {
    let mut rendered = Rendered::default();
    for resource in resources {
        match resource.state() {
            ResourceState::Succeeded(payload) => {
                for record in payload.records() {
                    rendered.stdout.push_str(&cell(lookup(record, field)));
                    rendered.stdout.push('\n');
                }
            }
            ResourceState::Failed(_) => rendered.stderr.extend(error_line(resource)),
            ResourceState::Pending => {}
        }
    }
    rendered
}

fn render_json<P>(resources: &[Resource<P>], fields: &[String]) -> Result<Rendered, RackError> {
    let entries: Vec<Value> = resources
        .iter()
        .map(|resource| match resource.state() {
            ResourceState::Succeeded(payload) if fields.is_empty() => payload.to_json(),
            ResourceState::Succeeded(payload) => match payload.to_json() {
                Value::Object(map) => Value::Object(project(&map, fields)),
                Value::Array(items) => Value::Array(
                    items
                        .iter()
                        .filter_map(Value::as_object)
                        .map(|map| Value::Object(project(map, fields)))
                        .collect(),
                ),
                other => other,
            },
            ResourceState::Failed(err) => json!({
                "error": err.to_string(),
                "input": resource.display_name(),
            }),
            ResourceState::Pending => json!({
                "error": "not executed",
                "input": resource.display_name(),
            }),
        })
        .collect();
    let document = if entries.len() == 1 {
        entries.into_iter().next().unwrap_or(Value::Null)
    } else {
        Value::Array(entries)
    };
    let mut stdout = serde_json::to_string_pretty(&document)?;
    stdout.push('\n');
    Ok(Rendered {
        stdout,
        stderr: Vec::new(),
    })
}

/// Field lookup: exact key first, then case-insensitive.
fn lookup<'a>(record: &'a ResultMap, key: &str) -> Option<&'a Value> {
    record.get(key).or_else(|| {
        record
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })
}

fn project(record: &Map<String, Value>, fields: &[String]) -> Map<String, Value> {
    fields
        .iter()
        .map(|f| (f.clone(), lookup(record, f).cloned().unwrap_or(Value::Null)))
        .collect()
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
