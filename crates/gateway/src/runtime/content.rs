//! Rendering of the inbound `msg` field into prompt text.

use serde_json::Value;

/// Appended after structured answers so the model keeps its reply short.
pub const CLOSING_INSTRUCTION: &str = "Please respond concisely and helpfully.";

/// Render an inbound message as prompt text.
///
/// - string: unchanged
/// - object: one `- key: value` line per entry in arrival order, then a
///   blank line and [`CLOSING_INSTRUCTION`]
/// - null: empty string
/// - anything else: its JSON text
pub fn build_user_content(message: &Value) -> String {
    match message {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Object(map) if map.is_empty() => CLOSING_INSTRUCTION.to_owned(),
        Value::Object(map) => {
            let lines: Vec<String> = map
                .iter()
                .map(|(key, value)| format!("- {key}: {}", scalar_text(value)))
                .collect();
            format!("{}\n\n{CLOSING_INSTRUCTION}", lines.join("\n"))
        }
        other => other.to_string(),
    }
}

/// Strings unquoted, everything else as JSON.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
