use serde::Serialize;

use crate::errors::PerceiverError;
use crate::model::ElementDescriptor;

/// Reply the model gives when nothing in the list matches.
pub const NO_MATCH: &str = "NO_MATCH";

#[derive(Serialize)]
struct PromptCandidate<'a> {
    selector: &'a str,
    text: &'a str,
    tag: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
}

pub fn build_prompt(
    description: &str,
    candidates: &[ElementDescriptor],
) -> Result<String, PerceiverError> {
    let listing: Vec<PromptCandidate<'_>> = candidates
        .iter()
        .map(|candidate| PromptCandidate {
            selector: &candidate.selector,
            text: &candidate.text,
            tag: &candidate.tag_name,
            role: candidate.state.role.as_deref(),
        })
        .collect();
    let listing = serde_json::to_string(&listing)
        .map_err(|err| PerceiverError::internal(format!("prompt encoding failed: {err}")))?;
    Ok(format!(
        "Find the page element that best matches the description \"{description}\".\n\
         Candidates (JSON):\n{listing}\n\
         Reply with the exact selector of the matching candidate and nothing else. \
         If no candidate matches, reply {NO_MATCH}."
    ))
}

/// Index of the candidate named by the reply, if the reply names one.
pub fn parse_reply(reply: &str, candidates: &[ElementDescriptor]) -> Option<usize> {
    let line = reply.lines().map(str::trim).find(|line| !line.is_empty())?;
    let selector = line
        .trim_matches(|c: char| c == '`' || c == '"' || c == '\'')
        .trim();
    if selector.is_empty() || selector.eq_ignore_ascii_case(NO_MATCH) {
        return None;
    }
    candidates
        .iter()
        .position(|candidate| candidate.selector == selector)
}
