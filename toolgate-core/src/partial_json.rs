//! Best-effort JSON parsing for inputs that may be truncated mid-object: SSE
//! chunks cut at an arbitrary byte boundary, and tool-call lists embedded in
//! prose that an upstream may clip.

use serde_json::Value;

/// Parses `input` as JSON, repairing truncation (unterminated strings,
/// missing closing brackets) before falling back to strict parsing.
/// Returns `None` if even the repaired text doesn't parse.
pub fn parse_partial(input: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str(input) {
        return Some(value);
    }
    let fixed = partial_json_fixer::fix_json_parsing(input);
    serde_json::from_str(&fixed).ok()
}
