/// Trims, collapses internal whitespace runs to a single space and lowercases.
///
/// Patterns are matched against this form only.
pub fn normalize_message(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}
