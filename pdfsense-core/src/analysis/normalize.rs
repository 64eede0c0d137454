/// Collapse every whitespace run (newlines included) into a single space and
/// trim both ends.
///
/// Total and idempotent; empty input yields an empty string.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
