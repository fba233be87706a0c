use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::document::LiveDocument;
use crate::dom::{ElementData, NodeId};
use crate::model::{ElementState, InteractionKind};
use crate::style::Visibility;

const CLICKABLE_TAGS: &[&str] = &[
    "a", "button", "input", "select", "textarea", "summary", "label", "option",
];

const CLICKABLE_ROLES: &[&str] = &[
    "button",
    "link",
    "menuitem",
    "menuitemcheckbox",
    "menuitemradio",
    "tab",
    "checkbox",
    "radio",
    "switch",
    "option",
    "treeitem",
    "combobox",
];

const FORM_CONTROL_TAGS: &[&str] = &["input", "select", "textarea", "button"];

const DISABLEABLE_TAGS: &[&str] = &[
    "button", "input", "select", "textarea", "option", "optgroup", "fieldset",
];

/// Input types that do not accept typed text.
const NON_TEXT_INPUTS: &[&str] = &[
    "checkbox", "radio", "submit", "button", "reset", "image", "file", "range", "color",
    "hidden",
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeReport {
    pub ok: bool,
    pub reason: String,
    pub issues: Vec<String>,
}

/// Compute the full [`ElementState`] for `id` from one read of the document.
pub fn element_state(doc: &LiveDocument, id: NodeId) -> ElementState {
    let Some(element) = doc.arena().element(id) else {
        return detached_state();
    };
    let style = doc.render().style(id);
    let rect = doc.viewport_rect(id);
    let viewport = doc.viewport();

    let is_displayed = style.map(|style| style.displayed).unwrap_or(false);
    let is_visible = is_displayed
        && style
            .map(|style| style.visibility == Visibility::Visible && style.opacity > 0.0)
            .unwrap_or(false)
        && rect.has_area();
    let is_in_viewport = is_visible
        && rect.x >= 0.0
        && rect.y >= 0.0
        && rect.right() <= viewport.width
        && rect.bottom() <= viewport.height;
    let (cx, cy) = rect.center();
    let is_obscured = match doc.hit_test(cx, cy) {
        Some(hit) => !doc.arena().is_inclusive_ancestor(id, hit),
        None => true,
    };

    let is_disabled = disabled(element);
    let is_read_only = read_only(element);
    let role = role(element);
    let aria_label = element
        .attr("aria-label")
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(str::to_string);

    let hidden_input = element.tag == "input" && element.input_type().as_deref() == Some("hidden");
    let interaction_type = if hidden_input {
        BTreeSet::new()
    } else {
        interaction_kinds(doc, id, element, role.as_deref())
    };

    let click_signal = interaction_type.contains(&InteractionKind::Clickable);
    let focus_signal = interaction_type.contains(&InteractionKind::Focusable);

    ElementState {
        is_visible,
        is_displayed,
        is_in_viewport,
        is_obscured,
        is_clickable: click_signal && is_visible && !is_disabled,
        is_draggable: interaction_type.contains(&InteractionKind::Draggable),
        is_focusable: focus_signal && is_visible && !is_disabled,
        is_disabled,
        is_read_only,
        role,
        aria_label,
        interaction_type,
        bounding_box: rect,
    }
}

fn detached_state() -> ElementState {
    ElementState {
        is_visible: false,
        is_displayed: false,
        is_in_viewport: false,
        is_obscured: true,
        is_clickable: false,
        is_draggable: false,
        is_focusable: false,
        is_disabled: false,
        is_read_only: false,
        role: None,
        aria_label: None,
        interaction_type: BTreeSet::new(),
        bounding_box: Default::default(),
    }
}

fn interaction_kinds(
    doc: &LiveDocument,
    id: NodeId,
    element: &ElementData,
    role: Option<&str>,
) -> BTreeSet<InteractionKind> {
    let mut kinds = BTreeSet::new();
    let tag = element.tag.as_str();
    let cursor_pointer = doc
        .render()
        .style(id)
        .map(|style| style.cursor == "pointer")
        .unwrap_or(false);
    let explicit_role = element.attr("role").is_some();

    if CLICKABLE_TAGS.contains(&tag)
        || (explicit_role && role.map_or(false, |role| CLICKABLE_ROLES.contains(&role)))
        || cursor_pointer
        || element.has_attr("onclick")
    {
        kinds.insert(InteractionKind::Clickable);
    }

    let draggable = match element.attr("draggable").map(str::to_ascii_lowercase) {
        Some(flag) if flag == "true" => true,
        Some(flag) if flag == "false" => false,
        _ => tag == "img" || (tag == "a" && element.has_attr("href")),
    };
    if draggable {
        kinds.insert(InteractionKind::Draggable);
    }

    let content_editable = is_content_editable(element);
    let tabindex = element
        .attr("tabindex")
        .and_then(|value| value.trim().parse::<i32>().ok());
    let focusable_tag = match tag {
        "a" => element.has_attr("href"),
        "button" | "input" | "select" | "textarea" | "summary" | "iframe" => true,
        _ => false,
    };
    if tabindex.map_or(false, |index| index >= 0) || focusable_tag || content_editable {
        kinds.insert(InteractionKind::Focusable);
    }

    match tag {
        "input" => {
            let ty = element.input_type().unwrap_or_default();
            if !NON_TEXT_INPUTS.contains(&ty.as_str()) {
                kinds.insert(InteractionKind::Input(ty));
            }
        }
        "textarea" => {
            kinds.insert(InteractionKind::Input("textarea".to_string()));
        }
        _ if content_editable => {
            kinds.insert(InteractionKind::Input("contenteditable".to_string()));
        }
        _ => {}
    }
    if role == Some("textbox") && explicit_role {
        kinds.insert(InteractionKind::Input("textbox".to_string()));
    }

    if FORM_CONTROL_TAGS.contains(&tag) {
        kinds.insert(InteractionKind::FormControl);
    }
    if (tag == "a" && element.has_attr("href")) || role == Some("link") {
        kinds.insert(InteractionKind::Link);
    }
    kinds
}

fn is_content_editable(element: &ElementData) -> bool {
    element
        .attr("contenteditable")
        .map(|value| !value.trim().eq_ignore_ascii_case("false"))
        .unwrap_or(false)
}

fn attr_true(element: &ElementData, name: &str) -> bool {
    element
        .attr(name)
        .map(|value| value.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn disabled(element: &ElementData) -> bool {
    (DISABLEABLE_TAGS.contains(&element.tag.as_str()) && element.has_attr("disabled"))
        || attr_true(element, "aria-disabled")
}

fn read_only(element: &ElementData) -> bool {
    (matches!(element.tag.as_str(), "input" | "textarea") && element.has_attr("readonly"))
        || attr_true(element, "aria-readonly")
}

/// Explicit ARIA role (first token) or the implicit role for the tag.
pub fn role(element: &ElementData) -> Option<String> {
    if let Some(explicit) = element
        .attr("role")
        .and_then(|value| value.split_whitespace().next())
    {
        return Some(explicit.to_ascii_lowercase());
    }
    let implicit = match element.tag.as_str() {
        "a" if element.has_attr("href") => "link",
        "button" | "summary" => "button",
        "select" => {
            if element.has_attr("multiple") {
                "listbox"
            } else {
                "combobox"
            }
        }
        "textarea" => "textbox",
        "option" => "option",
        "img" => "img",
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => "heading",
        "ul" | "ol" => "list",
        "li" => "listitem",
        "nav" => "navigation",
        "main" => "main",
        "form" => "form",
        "table" => "table",
        "dialog" => "dialog",
        "input" => match element.input_type().unwrap_or_default().as_str() {
            "checkbox" => "checkbox",
            "radio" => "radio",
            "submit" | "button" | "reset" | "image" => "button",
            "range" => "slider",
            "number" => "spinbutton",
            "search" => "searchbox",
            "email" | "tel" | "url" | "text" | "password" => "textbox",
            _ => return None,
        },
        _ => return None,
    };
    Some(implicit.to_string())
}

pub fn visible(state: &ElementState) -> JudgeReport {
    let mut issues = Vec::new();
    if !state.is_displayed {
        issues.push("not_displayed".to_string());
    }
    if state.is_displayed && !state.bounding_box.has_area() {
        issues.push("zero_area".to_string());
    }
    if state.is_displayed && state.bounding_box.has_area() && !state.is_visible {
        issues.push("style_hidden".to_string());
    }
    report(state.is_visible, "visible", "not_visible", issues)
}

pub fn clickable(state: &ElementState) -> JudgeReport {
    let mut issues = visible(state).issues;
    if state.is_disabled {
        issues.push("disabled".to_string());
    }
    if !state.interaction_type.contains(&InteractionKind::Clickable) {
        issues.push("no_click_signal".to_string());
    }
    report(state.is_clickable, "clickable", "not_clickable", issues)
}

pub fn editable(state: &ElementState) -> JudgeReport {
    let mut issues = visible(state).issues;
    if state.is_disabled {
        issues.push("disabled".to_string());
    }
    if state.is_read_only {
        issues.push("readonly".to_string());
    }
    if !state.is_editable() {
        issues.push("not_text_input".to_string());
    }
    let ok = issues.is_empty();
    report(ok, "editable", "not_editable", issues)
}

fn report(ok: bool, good: &str, bad: &str, issues: Vec<String>) -> JudgeReport {
    let base = if ok { good } else { bad };
    let reason = if issues.is_empty() {
        base.to_string()
    } else {
        format!("{}({})", base, issues.join(","))
    };
    JudgeReport { ok, reason, issues }
}
