use crate::selector::escape_ident;
use crate::document::LiveDocument;
use crate::dom::NodeId;

/// Shortest-path selector: `#id` when the element has one, otherwise the chain
/// of `tag.class1.class2` steps for up to `depth` levels joined with ` > `.
pub fn selector_for(doc: &LiveDocument, id: NodeId, depth: usize) -> String {
    let arena = doc.arena();
    if let Some(element_id) = arena.element(id).and_then(|element| element.id()) {
        return format!("#{}", escape_ident(element_id));
    }
    let mut steps = Vec::new();
    let mut current = Some(id);
    while let Some(node) = current {
        if steps.len() == depth.max(1) {
            break;
        }
        let Some(element) = arena.element(node) else {
            break;
        };
        let mut step = element.tag.clone();
        for class in element.classes().take(2) {
            step.push('.');
            step.push_str(&escape_ident(class));
        }
        steps.push(step);
        current = arena.parent_element(node);
    }
    steps.reverse();
    steps.join(" > ")
}

/// Placeholder or value for form controls, else `aria-label`, else the
/// element's trimmed text capped at `limit` characters.
pub fn descriptor_text(doc: &LiveDocument, id: NodeId, limit: usize) -> String {
    let non_empty = |value: Option<&str>| {
        value
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };
    if matches!(doc.tag(id), Some("input" | "textarea" | "select")) {
        if let Some(text) =
            non_empty(doc.attr(id, "placeholder")).or_else(|| non_empty(doc.value(id)))
        {
            return truncate_chars(&text, limit);
        }
    }
    if let Some(label) = non_empty(doc.attr(id, "aria-label")) {
        return truncate_chars(&label, limit);
    }
    truncate_chars(&doc.text(id), limit)
}

pub fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}
