//! Reading input items from files or stdin.

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};
use std::io::{self, Read};
use std::path::Path;

/// Read input from a file, or stdin when the path is absent or `-`.
pub fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) if path.to_string_lossy() != "-" => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        _ => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("failed to read stdin")?;
            Ok(input)
        }
    }
}

/// Parse items from a JSON array, a single JSON object or JSONL.
pub fn parse_items(input: &str) -> Result<Vec<Map<String, Value>>> {
    let input = input.trim();

    if input.is_empty() {
        return Ok(Vec::new());
    }

    if input.starts_with('[') {
        let values: Vec<Value> = serde_json::from_str(input).context("failed to parse JSON array")?;
        return values
            .into_iter()
            .enumerate()
            .map(|(i, value)| into_object(value).with_context(|| format!("item {} is not a JSON object", i)))
            .collect();
    }

    // A lone pretty-printed object spans several lines
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(input) {
        return Ok(vec![map]);
    }

    let mut items = Vec::new();
    for (i, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line)
            .with_context(|| format!("failed to parse JSON at line {}", i + 1))?;
        let item = into_object(value).with_context(|| format!("line {} is not a JSON object", i + 1))?;
        items.push(item);
    }

    Ok(items)
}

fn into_object(value: Value) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => bail!("expected an object, got {}", kind(&other)),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Split a comma-separated list, dropping blanks.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
