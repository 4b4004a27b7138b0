use anyhow::{Context, Result};
use serde_json::Value;
use tracing::debug;

use crate::cleanup::DeedCleaner;

/// Extract the JSON block from a generative-model reply.
///
/// Handles a bare object, a ```json fence, an anonymous fence, or prose
/// around a `{ ... }` block.
pub fn extract_json_block(response: &str) -> Result<&str> {
    let trimmed = response.trim();

    if let Some(start) = trimmed.find("```json") {
        let after_fence = &trimmed[start + 7..];
        if let Some(end) = after_fence.find("```") {
            return Ok(after_fence[..end].trim());
        }
    }

    if let Some(start) = trimmed.find("```") {
        let after_fence = &trimmed[start + 3..];
        if let Some(end) = after_fence.find("```") {
            let block = after_fence[..end].trim();
            if block.starts_with('{') || block.starts_with('[') {
                return Ok(block);
            }
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            return Ok(&trimmed[start..=end]);
        }
    }

    anyhow::bail!("No JSON block found in model response")
}

/// Clean string values in a model JSON reply.
///
/// With an empty `fields` list every string is cleaned; otherwise only
/// values (strings, or arrays of strings) under a matching key, at any depth.
/// Returns how many strings were rewritten.
pub fn clean_response_fields(value: &mut Value, fields: &[String], cleaner: &DeedCleaner) -> usize {
    clean_value(value, fields.is_empty(), fields, cleaner)
}

/// Parse a raw reply and clean it in one go.
pub fn clean_model_response(raw: &str, fields: &[String], cleaner: &DeedCleaner) -> Result<Value> {
    let block = extract_json_block(raw)?;
    let mut value: Value =
        serde_json::from_str(block).with_context(|| "Failed to parse model JSON block")?;

    let cleaned = clean_response_fields(&mut value, fields, cleaner);
    debug!("Cleaned {} text fields in model response", cleaned);

    Ok(value)
}

fn clean_value(value: &mut Value, selected: bool, fields: &[String], cleaner: &DeedCleaner) -> usize {
    match value {
        Value::String(text) if selected => {
            *text = cleaner.clean(text);
            1
        }
        Value::Array(items) => items
            .iter_mut()
            .map(|item| clean_value(item, selected, fields, cleaner))
            .sum(),
        Value::Object(map) => map
            .iter_mut()
            .map(|(key, item)| {
                let selected = selected || fields.iter().any(|f| f == key);
                clean_value(item, selected, fields, cleaner)
            })
            .sum(),
        _ => 0,
    }
}
