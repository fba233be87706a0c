use std::collections::HashMap;

use pagepilot_core_types::ElementHandle;

use crate::dom::NodeId;

/// Per-document identity map: each node receives an opaque handle the first
/// time it is described. The map is dropped wholesale when the document
/// generation changes; the handle counter keeps increasing across documents so
/// handles are never reused.
#[derive(Debug, Default)]
pub struct IdentityArena {
    generation: u64,
    handles: HashMap<NodeId, ElementHandle>,
    next: u64,
}

impl IdentityArena {
    pub fn handle_for(&mut self, generation: u64, node: NodeId) -> ElementHandle {
        if generation != self.generation {
            self.handles.clear();
            self.generation = generation;
        }
        let next = &mut self.next;
        *self.handles.entry(node).or_insert_with(|| {
            *next += 1;
            ElementHandle(*next)
        })
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_stable_within_a_generation() {
        let mut arena = IdentityArena::default();
        let first = arena.handle_for(1, NodeId(4));
        assert_eq!(arena.handle_for(1, NodeId(4)), first);
        assert_ne!(arena.handle_for(1, NodeId(5)), first);
    }

    #[test]
    fn new_generation_starts_a_fresh_identity_space() {
        let mut arena = IdentityArena::default();
        let before = arena.handle_for(1, NodeId(4));
        let after = arena.handle_for(2, NodeId(4));
        assert!(after.0 > before.0);
        assert_eq!(arena.len(), 1);
    }
}
