use std::collections::BTreeSet;

use pagepilot_core_types::ElementHandle;
use serde::{Deserialize, Serialize};

use crate::dom::NodeId;
use crate::style::Rect;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "kebab-case")]
pub enum InteractionKind {
    Clickable,
    Draggable,
    Focusable,
    /// Text-like input; carries the input type (`text`, `email`, `textarea`, ...).
    Input(String),
    FormControl,
    Link,
}

/// Capability and visibility flags for one element, computed from a single
/// read of the document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementState {
    pub is_visible: bool,
    pub is_displayed: bool,
    pub is_in_viewport: bool,
    pub is_obscured: bool,
    pub is_clickable: bool,
    pub is_draggable: bool,
    pub is_focusable: bool,
    pub is_disabled: bool,
    pub is_read_only: bool,
    pub role: Option<String>,
    pub aria_label: Option<String>,
    pub interaction_type: BTreeSet<InteractionKind>,
    pub bounding_box: Rect,
}

impl ElementState {
    pub fn is_interactive(&self) -> bool {
        !self.interaction_type.is_empty()
    }

    pub fn is_editable(&self) -> bool {
        self.interaction_type
            .iter()
            .any(|kind| matches!(kind, InteractionKind::Input(_)))
    }
}

/// Transient view of a live node. `node` is only valid while the document is
/// still at `generation`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementDescriptor {
    pub handle: ElementHandle,
    pub node: NodeId,
    pub generation: u64,
    pub selector: String,
    pub tag_name: String,
    pub text: String,
    pub state: ElementState,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchStrategy {
    Model,
    Exact,
    Substring,
    TokenSet,
}

impl MatchStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStrategy::Model => "model",
            MatchStrategy::Exact => "exact",
            MatchStrategy::Substring => "substring",
            MatchStrategy::TokenSet => "token-set",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub descriptor: ElementDescriptor,
    pub strategy: MatchStrategy,
    pub candidate_count: usize,
}
