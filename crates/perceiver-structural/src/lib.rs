//! DOM state engine for the acting context.
//!
//! The crate owns the live document model (parsed node arena, computed render
//! tree, form state, hit testing) and the engine that describes interactive
//! elements and resolves natural-language descriptions to them.

pub mod cache;
pub mod document;
pub mod dom;
pub mod errors;
pub mod events;
pub mod identity;
pub mod judges;
pub mod metrics;
pub mod model;
pub mod policy;
pub mod ports;
pub mod resolver;
pub mod selector;
pub mod structural;
pub mod style;

pub use document::{DomEvent, EventKind, LiveDocument, SharedDocument, Viewport};
pub use dom::{normalize_whitespace, NodeId};
pub use errors::PerceiverError;
pub use judges::JudgeReport;
pub use metrics::MetricSnapshot;
pub use model::{ElementDescriptor, ElementState, InteractionKind, MatchStrategy, Resolution};
pub use policy::EngineOptions;
pub use ports::TextModelPort;
pub use selector::{SelectorError, SelectorList};
pub use structural::DomStateEngine;
pub use style::Rect;
