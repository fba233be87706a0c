use crate::dom::normalize_whitespace;
use crate::model::{ElementDescriptor, MatchStrategy};

/// Deterministic cascade over the candidates, first stage with a hit wins:
/// exact (case-insensitive) text or aria-label, then substring containment,
/// then every query token appearing somewhere in `text + aria-label`.
pub fn deterministic_match(
    candidates: &[ElementDescriptor],
    description: &str,
) -> Option<(usize, MatchStrategy)> {
    let query = normalize_whitespace(description).to_lowercase();
    if query.is_empty() {
        return None;
    }
    let fields: Vec<(String, String)> = candidates
        .iter()
        .map(|candidate| {
            (
                normalize_whitespace(&candidate.text).to_lowercase(),
                candidate
                    .state
                    .aria_label
                    .as_deref()
                    .map(normalize_whitespace)
                    .unwrap_or_default()
                    .to_lowercase(),
            )
        })
        .collect();

    if let Some(index) = fields
        .iter()
        .position(|(text, aria)| *text == query || *aria == query)
    {
        return Some((index, MatchStrategy::Exact));
    }
    if let Some(index) = fields
        .iter()
        .position(|(text, aria)| text.contains(&query) || aria.contains(&query))
    {
        return Some((index, MatchStrategy::Substring));
    }
    let tokens: Vec<&str> = query.split_whitespace().collect();
    fields
        .iter()
        .position(|(text, aria)| {
            let haystack = format!("{text} {aria}");
            tokens.iter().all(|token| haystack.contains(token))
        })
        .map(|index| (index, MatchStrategy::TokenSet))
}
