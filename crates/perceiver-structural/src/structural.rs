use std::sync::Arc;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use crate::cache::ElementCache;
use crate::document::{LiveDocument, SharedDocument};
use crate::dom::NodeId;
use crate::errors::PerceiverError;
use crate::events;
use crate::identity::IdentityArena;
use crate::judges;
use crate::metrics::{EngineMetrics, MetricSnapshot};
use crate::model::{ElementDescriptor, ElementState, MatchStrategy, Resolution};
use crate::policy::EngineOptions;
use crate::ports::TextModelPort;
use crate::resolver::{generate, model, rank};

/// DOM state engine bound to one live document.
///
/// Owns the listing cache and the identity arena for that document. Locks on
/// the document are only ever held for synchronous reads, never across an
/// await point.
pub struct DomStateEngine {
    document: SharedDocument,
    options: EngineOptions,
    cache: ElementCache,
    identity: Mutex<IdentityArena>,
    model: Option<Arc<dyn TextModelPort>>,
    metrics: EngineMetrics,
}

impl DomStateEngine {
    pub fn new(document: SharedDocument) -> Self {
        Self::with_options(document, EngineOptions::default())
    }

    pub fn with_options(document: SharedDocument, options: EngineOptions) -> Self {
        Self {
            document,
            cache: ElementCache::new(options.cache_ttl),
            options,
            identity: Mutex::new(IdentityArena::default()),
            model: None,
            metrics: EngineMetrics::default(),
        }
    }

    pub fn with_model(mut self, model: Arc<dyn TextModelPort>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn document(&self) -> &SharedDocument {
        &self.document
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn metrics(&self) -> MetricSnapshot {
        self.metrics.snapshot()
    }

    pub fn invalidate(&self) {
        self.cache.clear();
    }

    /// Every element under `root` (the whole document when `None`) that has at
    /// least one interaction kind, in document order. Whole-document listings
    /// are cached per URL.
    pub fn list_interactive_elements(&self, root: Option<NodeId>) -> Vec<ElementDescriptor> {
        let started = Instant::now();
        let doc = self.document.read();
        let whole_document = root.map_or(true, |root| root == doc.arena().root());
        if whole_document {
            if let Some(hit) = self.cache.get(doc.url(), doc.generation()) {
                events::emit_listing(&self.metrics, doc.url(), true, hit.len(), started.elapsed());
                return hit;
            }
        }

        let scope = root.unwrap_or_else(|| doc.arena().root());
        let nodes: Vec<NodeId> = std::iter::once(scope)
            .filter(|node| doc.arena().element(*node).is_some())
            .chain(doc.arena().descendant_elements(scope))
            .collect();
        let elements: Vec<ElementDescriptor> = nodes
            .into_iter()
            .filter_map(|node| {
                let descriptor = self.describe_locked(&doc, node);
                descriptor.state.is_interactive().then_some(descriptor)
            })
            .collect();

        if whole_document {
            self.cache.put(doc.url(), doc.generation(), elements.clone());
        }
        events::emit_listing(
            &self.metrics,
            doc.url(),
            false,
            elements.len(),
            started.elapsed(),
        );
        elements
    }

    /// Visible and clickable interactive elements, the resolution candidates.
    pub fn candidates(&self) -> Vec<ElementDescriptor> {
        self.list_interactive_elements(None)
            .into_iter()
            .filter(|element| element.state.is_visible && element.state.is_clickable)
            .collect()
    }

    pub fn describe(&self, node: NodeId) -> Result<ElementDescriptor, PerceiverError> {
        let doc = self.document.read();
        if !doc.contains(node) {
            return Err(PerceiverError::ElementNotFound(node.to_string()));
        }
        Ok(self.describe_locked(&doc, node))
    }

    fn describe_locked(&self, doc: &LiveDocument, node: NodeId) -> ElementDescriptor {
        let handle = self.identity.lock().handle_for(doc.generation(), node);
        ElementDescriptor {
            handle,
            node,
            generation: doc.generation(),
            selector: generate::selector_for(doc, node, self.options.selector_depth),
            tag_name: doc.tag(node).unwrap_or_default().to_string(),
            text: generate::descriptor_text(doc, node, self.options.text_limit),
            state: judges::element_state(doc, node),
        }
    }

    /// Fresh descriptor for the same node. Fails once the document has moved
    /// to a new generation.
    pub fn refresh(
        &self,
        descriptor: &ElementDescriptor,
    ) -> Result<ElementDescriptor, PerceiverError> {
        let doc = self.document.read();
        if doc.generation() != descriptor.generation {
            return Err(PerceiverError::StaleElement {
                recorded: descriptor.generation,
                current: doc.generation(),
            });
        }
        if !doc.contains(descriptor.node) {
            return Err(PerceiverError::ElementNotFound(descriptor.selector.clone()));
        }
        Ok(self.describe_locked(&doc, descriptor.node))
    }

    pub fn state_of(&self, descriptor: &ElementDescriptor) -> Result<ElementState, PerceiverError> {
        self.refresh(descriptor).map(|fresh| fresh.state)
    }

    /// Absolute XPath for the descriptor's node, computed from the current
    /// document.
    pub fn xpath(&self, descriptor: &ElementDescriptor) -> Result<String, PerceiverError> {
        let doc = self.document.read();
        if doc.generation() != descriptor.generation {
            return Err(PerceiverError::StaleElement {
                recorded: descriptor.generation,
                current: doc.generation(),
            });
        }
        doc.xpath_of(descriptor.node)
            .ok_or_else(|| PerceiverError::ElementNotFound(descriptor.selector.clone()))
    }

    /// Descriptors for every element matching a CSS selector.
    pub fn query(&self, selector: &str) -> Result<Vec<ElementDescriptor>, PerceiverError> {
        let doc = self.document.read();
        let nodes = doc.query_selector_all(selector)?;
        Ok(nodes
            .into_iter()
            .map(|node| self.describe_locked(&doc, node))
            .collect())
    }

    pub async fn resolve(&self, description: &str) -> Option<ElementDescriptor> {
        self.resolve_detailed(description)
            .await
            .map(|resolution| resolution.descriptor)
    }

    /// Resolve a natural-language description to one element, reporting which
    /// stage produced the match.
    #[instrument(skip_all, fields(description = %description))]
    pub async fn resolve_detailed(&self, description: &str) -> Option<Resolution> {
        let started = Instant::now();
        let candidates = self.candidates();
        let candidate_count = candidates.len();

        if let Some(index) = self.ask_model(description, &candidates).await {
            if let Ok(fresh) = self.refresh(&candidates[index]) {
                events::emit_resolve(
                    &self.metrics,
                    description,
                    Some(MatchStrategy::Model),
                    candidate_count,
                    started.elapsed(),
                );
                return Some(Resolution {
                    descriptor: fresh,
                    strategy: MatchStrategy::Model,
                    candidate_count,
                });
            }
            debug!("model match went stale before use; falling back to cascade");
        }

        let outcome = rank::deterministic_match(&candidates, description);
        events::emit_resolve(
            &self.metrics,
            description,
            outcome.map(|(_, strategy)| strategy),
            candidate_count,
            started.elapsed(),
        );
        let (index, strategy) = outcome?;
        let descriptor = candidates.into_iter().nth(index)?;
        Some(Resolution {
            descriptor,
            strategy,
            candidate_count,
        })
    }

    async fn ask_model(
        &self,
        description: &str,
        candidates: &[ElementDescriptor],
    ) -> Option<usize> {
        let model_port = self.model.as_ref()?;
        if candidates.is_empty() || !model_port.is_available() {
            return None;
        }
        let prompt = match model::build_prompt(description, candidates) {
            Ok(prompt) => prompt,
            Err(err) => {
                warn!(error = %err, "could not build model prompt");
                return None;
            }
        };
        match tokio::time::timeout(self.options.model_timeout, model_port.complete(&prompt)).await
        {
            Ok(Ok(reply)) => {
                let matched = model::parse_reply(&reply, candidates);
                debug!(reply = %reply.trim(), matched = matched.is_some(), "model reply");
                matched
            }
            Ok(Err(err)) => {
                self.metrics.record_model_failure();
                warn!(error = %err, "text model failed; using deterministic matching");
                None
            }
            Err(_) => {
                self.metrics.record_model_failure();
                warn!(
                    timeout_ms = self.options.model_timeout.as_millis() as u64,
                    "text model timed out; using deterministic matching"
                );
                None
            }
        }
    }
}
