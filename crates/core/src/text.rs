//! Term matching shared by the chatbot and the academic classifier.

/// True when `term` occurs in `text` with no letter or digit directly on
/// either side. Multi-word terms match as phrases.
pub fn contains_term(text: &str, term: &str) -> bool {
    if term.is_empty() {
        return false;
    }
    text.match_indices(term).any(|(start, _)| {
        let before = text[..start].chars().next_back();
        let after = text[start + term.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// True when any of `terms` occurs in `text` as a whole word or phrase.
pub fn contains_any_term(text: &str, terms: &[&str]) -> bool {
    terms.iter().any(|term| contains_term(text, term))
}
