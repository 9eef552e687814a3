use crate::core::error::{PatternError, Result};

/// Separator between attribute type and value inside a typed attribute value.
pub const TAV_SEPARATOR: &str = "==";

/// Separator between typed attribute values inside a pattern label.
pub const PATTERN_SEPARATOR: &str = " & ";

/// Separator for period-scoped node identifiers.
///
/// Deliberately different from [`TAV_SEPARATOR`]: these identifiers are
/// display keys and are never split back into a TAV.
pub const NODE_ID_SEPARATOR: &str = "@";

/// Encode `(attribute type, value)` as a typed attribute value string.
///
/// Rejects any type or value that would make the encoded string ambiguous:
/// one containing the separator, a type ending in `=`, or a value starting
/// with `=`.
pub fn encode_tav(attribute: &str, value: &str) -> Result<String> {
    if attribute.is_empty() {
        return Err(PatternError::input_schema("attribute type must not be empty"));
    }
    if attribute.contains(TAV_SEPARATOR) || attribute.ends_with('=') {
        return Err(PatternError::input_schema(format!(
            "attribute type '{attribute}' collides with the separator '{TAV_SEPARATOR}'"
        )));
    }
    if value.contains(TAV_SEPARATOR) || value.starts_with('=') {
        return Err(PatternError::input_schema(format!(
            "value '{value}' of attribute '{attribute}' collides with the separator '{TAV_SEPARATOR}'"
        )));
    }
    Ok(format!("{attribute}{TAV_SEPARATOR}{value}"))
}

/// Split a typed attribute value into `(type, value)`.
///
/// Returns `None` when the string carries no separator.
pub fn split_tav(tav: &str) -> Option<(&str, &str)> {
    tav.split_once(TAV_SEPARATOR)
}

/// Attribute type of a typed attribute value, or the whole string if it has no separator.
pub fn tav_type(tav: &str) -> &str {
    split_tav(tav).map_or(tav, |(attribute, _)| attribute)
}

/// Join typed attribute values into a pattern label, sorting them first.
pub fn join_pattern<S: AsRef<str>>(tavs: &[S]) -> String {
    let mut parts: Vec<&str> = tavs.iter().map(|t| t.as_ref()).collect();
    parts.sort_unstable();
    parts.join(PATTERN_SEPARATOR)
}

/// Split a pattern label back into its typed attribute values.
pub fn split_pattern(pattern: &str) -> Vec<&str> {
    pattern
        .split(PATTERN_SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Period-scoped identifier for a node, e.g. `Region==North@2020`.
pub fn dynamic_node_id(tav: &str, period: &str) -> String {
    format!("{tav}{NODE_ID_SEPARATOR}{period}")
}
