use serde_json::Value;

/// Read a field of a provider's user-info document as a plain string.
/// Numeric ids (GitHub) are stringified; missing or null fields give `None`.
pub fn field_string(document: &Value, pointer: &str) -> Option<String> {
    let raw = match document.pointer(pointer)? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => return None,
        other => other.to_string(),
    };
    let sanitized: String = raw.chars().filter(|c| !c.is_control()).collect();
    if sanitized.is_empty() {
        None
    } else {
        Some(sanitized)
    }
}
