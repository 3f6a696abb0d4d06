use serde::Serialize;

use crate::session::ParsedCommand;

/// Serialize a parsed command to a pretty-printed JSON string.
///
/// # Errors
///
/// Returns the serializer's error, which only a failing writer can cause.
pub fn to_pretty_json(command: &ParsedCommand<'_>) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(command)
}

/// Serialize any parse output to a `serde_json::Value`.
///
/// # Errors
///
/// Returns the serializer's error.
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<serde_json::Value, serde_json::Error> {
    serde_json::to_value(value)
}
