use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use crate::symbol::{Symbol, TracingId};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForestError {
    #[error("index out of bounds: {index} (forest has {len} roots)")]
    IndexOutOfBounds { index: isize, len: usize },
}

// ---------------------------------------------------------------------------
// ArrivalNode: one recorded visit to a symbol
// ---------------------------------------------------------------------------

/// Handle to a node owned by an [`ArrivalCollection`]. Handles are never
/// reused within a collection, not even across `clear()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ArrivalId(u64);

#[derive(Debug, Clone)]
pub struct ArrivalNode {
    symbol: Symbol,
    word: String,
    self_encore_count: u32,
    is_pinned: bool,
    parent: Option<ArrivalId>,
    children: Vec<ArrivalId>,
}

impl ArrivalNode {
    fn new(symbol: Symbol, word: String) -> Self {
        Self {
            symbol,
            word,
            self_encore_count: 0,
            is_pinned: false,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Token under the cursor when this arrival was recorded.
    pub fn word(&self) -> &str {
        &self.word
    }

    pub fn self_encore_count(&self) -> u32 {
        self.self_encore_count
    }

    pub fn is_pinned(&self) -> bool {
        self.is_pinned
    }

    pub fn parent(&self) -> Option<ArrivalId> {
        self.parent
    }

    pub fn children(&self) -> &[ArrivalId] {
        &self.children
    }

    pub fn encore(&mut self) -> u32 {
        self.self_encore_count += 1;
        self.self_encore_count
    }

    pub fn set_pinned(&mut self, pinned: bool) {
        self.is_pinned = pinned;
    }

    pub fn set_word(&mut self, word: impl Into<String>) {
        self.word = word.into();
    }

    /// Swap in an edited version of the same declaration, returning the old one.
    pub fn replace_symbol(&mut self, symbol: Symbol) -> Symbol {
        std::mem::replace(&mut self.symbol, symbol)
    }

    pub fn is_on_same_symbol_of(&self, symbol: &Symbol) -> bool {
        self.symbol == *symbol
    }
}

/// Default search predicate: full symbol identity.
pub fn same_symbol(target: &Symbol, node: &ArrivalNode) -> bool {
    node.is_on_same_symbol_of(target)
}

/// Edit-in-place predicate: same declaration start, possibly different extent.
pub fn same_start(target: &Symbol, node: &ArrivalNode) -> bool {
    node.symbol.has_same_start(target)
}

// ---------------------------------------------------------------------------
// Snapshot: serializable view of a tree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ArrivalSnapshot {
    pub name: String,
    pub kind: &'static str,
    pub uri: String,
    pub line: u32,
    pub character: u32,
    pub word: String,
    pub self_encore_count: u32,
    pub tree_encore_count: u32,
    pub pinned: bool,
    pub tracing_id: TracingId,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ArrivalSnapshot>,
}

// ---------------------------------------------------------------------------
// ArrivalCollection: the forest of navigation sessions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListMode {
    #[default]
    Default,
    PinnedFirst,
}

/// Arena owning every arrival node. Ownership runs root → children through
/// `children`; `parent` is a plain handle back up.
#[derive(Debug, Default)]
pub struct ArrivalCollection {
    nodes: HashMap<ArrivalId, ArrivalNode>,
    roots: Vec<ArrivalId>,
    next_id: u64,
}

impl ArrivalCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a detached leaf node.
    pub fn create_from(&mut self, symbol: Symbol, word: impl Into<String>) -> ArrivalId {
        let id = ArrivalId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, ArrivalNode::new(symbol, word.into()));
        id
    }

    pub fn get(&self, id: ArrivalId) -> Option<&ArrivalNode> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: ArrivalId) -> Option<&mut ArrivalNode> {
        self.nodes.get_mut(&id)
    }

    pub fn contains(&self, id: ArrivalId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Attach `child` under `parent`, moving it out of wherever it was.
    /// Rejected (returns false) when `parent` already has a child on the same
    /// symbol, when either handle is unknown, or when the move would create a
    /// cycle.
    pub fn add_child(&mut self, parent: ArrivalId, child: ArrivalId) -> bool {
        let (Some(parent_node), Some(child_node)) = (self.nodes.get(&parent), self.nodes.get(&child))
        else {
            return false;
        };
        let duplicate = parent_node
            .children
            .iter()
            .filter_map(|c| self.nodes.get(c))
            .any(|sibling| sibling.symbol == child_node.symbol);
        if duplicate || self.is_ancestor_or_self(child, parent) {
            return false;
        }

        self.detach(child);
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(child);
        }
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        true
    }

    /// Unlink `child` from `parent`. The child stays allocated, detached.
    pub fn remove_child(&mut self, parent: ArrivalId, child: ArrivalId) -> bool {
        let Some(node) = self.nodes.get_mut(&parent) else {
            return false;
        };
        let Some(pos) = node.children.iter().position(|c| *c == child) else {
            return false;
        };
        node.children.remove(pos);
        if let Some(child_node) = self.nodes.get_mut(&child) {
            child_node.parent = None;
        }
        true
    }

    pub fn encore(&mut self, id: ArrivalId) -> Option<u32> {
        self.nodes.get_mut(&id).map(ArrivalNode::encore)
    }

    pub fn is_on_same_symbol_of(&self, a: ArrivalId, b: ArrivalId) -> bool {
        match (self.nodes.get(&a), self.nodes.get(&b)) {
            (Some(a), Some(b)) => a.symbol == b.symbol,
            _ => false,
        }
    }

    /// Own encore count plus every descendant's.
    pub fn tree_encore_count(&self, id: ArrivalId) -> u32 {
        let Some(node) = self.nodes.get(&id) else {
            return 0;
        };
        node.self_encore_count
            + node
                .children
                .iter()
                .map(|c| self.tree_encore_count(*c))
                .sum::<u32>()
    }

    pub fn root_of(&self, id: ArrivalId) -> Option<ArrivalId> {
        let mut current = id;
        loop {
            match self.nodes.get(&current)?.parent {
                Some(parent) => current = parent,
                None => return Some(current),
            }
        }
    }

    // -- root list ---------------------------------------------------------

    pub fn push(&mut self, root: ArrivalId) {
        if !self.nodes.contains_key(&root) || self.roots.contains(&root) {
            return;
        }
        self.detach(root);
        self.roots.push(root);
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.roots.clear();
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn roots(&self) -> &[ArrivalId] {
        &self.roots
    }

    /// Root at `index`; negative indices count from the end.
    pub fn at(&self, index: isize) -> Result<ArrivalId, ForestError> {
        let len = self.roots.len();
        let resolved = if index < 0 {
            len.checked_sub(index.unsigned_abs())
        } else {
            Some(index as usize)
        };
        resolved
            .and_then(|i| self.roots.get(i).copied())
            .ok_or(ForestError::IndexOutOfBounds { index, len })
    }

    pub fn as_list(&self, mode: ListMode) -> Vec<ArrivalId> {
        match mode {
            ListMode::Default => self.roots.clone(),
            ListMode::PinnedFirst => {
                let mut list = self.pinned_arrivals();
                list.extend(self.unpinned_arrivals());
                list
            }
        }
    }

    pub fn pinned_arrivals(&self) -> Vec<ArrivalId> {
        self.roots_where(|node| node.is_pinned)
    }

    pub fn unpinned_arrivals(&self) -> Vec<ArrivalId> {
        self.roots_where(|node| !node.is_pinned)
    }

    fn roots_where(&self, keep: impl Fn(&ArrivalNode) -> bool) -> Vec<ArrivalId> {
        self.roots
            .iter()
            .copied()
            .filter(|id| self.nodes.get(id).is_some_and(&keep))
            .collect()
    }

    // -- lookup ------------------------------------------------------------

    /// Most recent root first, latest child first.
    pub fn get_by_tracing_id(&self, tracing_id: &TracingId) -> Option<ArrivalId> {
        self.roots.iter().rev().find_map(|root| {
            self.find_in(*root, &|node: &ArrivalNode| {
                node.symbol.tracing_id() == *tracing_id
            })
        })
    }

    /// Pre-order flatten of every tree, roots in insertion order.
    pub fn all_arrivals(&self) -> Vec<ArrivalId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        for root in &self.roots {
            self.collect_preorder(*root, &mut out);
        }
        out
    }

    fn collect_preorder(&self, id: ArrivalId, out: &mut Vec<ArrivalId>) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        out.push(id);
        for child in &node.children {
            self.collect_preorder(*child, out);
        }
    }

    /// Depth-first, pre-order search of the tree under `root`, visiting the
    /// most recently added child first.
    pub fn find_in_arrival_tree<P>(
        &self,
        target: &Symbol,
        root: ArrivalId,
        predicate: P,
    ) -> Option<ArrivalId>
    where
        P: Fn(&Symbol, &ArrivalNode) -> bool,
    {
        self.find_in(root, &|node: &ArrivalNode| predicate(target, node))
    }

    /// Search for `symbol`, then its parent, then its grandparent, returning
    /// the first (innermost) level that matches.
    pub fn find_symbol_ancestor_in_arrival_tree<P>(
        &self,
        symbol: &Symbol,
        root: ArrivalId,
        predicate: P,
    ) -> Option<ArrivalId>
    where
        P: Fn(&Symbol, &ArrivalNode) -> bool,
    {
        symbol
            .ancestors()
            .find_map(|level| self.find_in(root, &|node: &ArrivalNode| predicate(level, node)))
    }

    fn find_in(&self, id: ArrivalId, matches: &dyn Fn(&ArrivalNode) -> bool) -> Option<ArrivalId> {
        let node = self.nodes.get(&id)?;
        if matches(node) {
            return Some(id);
        }
        node.children
            .iter()
            .rev()
            .find_map(|child| self.find_in(*child, matches))
    }

    // -- UI commands -------------------------------------------------------

    /// Remove `id` and its whole subtree. Returns false when unknown.
    pub fn delete(&mut self, id: ArrivalId) -> bool {
        if !self.nodes.contains_key(&id) {
            return false;
        }
        self.detach(id);
        self.free_subtree(id);
        tracing::debug!(arrival = ?id, roots = self.roots.len(), "deleted arrival subtree");
        true
    }

    /// Keep only the tree containing `id`.
    pub fn delete_other_trees(&mut self, id: ArrivalId) -> bool {
        let Some(root) = self.root_of(id) else {
            return false;
        };
        if !self.roots.contains(&root) {
            return false;
        }
        let others: Vec<ArrivalId> = self.roots.iter().copied().filter(|r| *r != root).collect();
        for other in others {
            self.free_subtree(other);
        }
        self.roots = vec![root];
        tracing::debug!(arrival = ?id, "deleted other arrival trees");
        true
    }

    pub fn set_arrival_pin_state(&mut self, tracing_id: &TracingId, pinned: bool) -> bool {
        let Some(id) = self.get_by_tracing_id(tracing_id) else {
            return false;
        };
        if let Some(node) = self.nodes.get_mut(&id) {
            node.is_pinned = pinned;
        }
        tracing::debug!(%tracing_id, pinned, "arrival pin state changed");
        true
    }

    pub fn unpin_all(&mut self) {
        for node in self.nodes.values_mut() {
            node.is_pinned = false;
        }
        tracing::debug!("all arrivals unpinned");
    }

    /// Arrival with the highest self encore count; ties go to the later one
    /// in pre-order.
    pub fn hottest(&self) -> Option<ArrivalId> {
        self.all_arrivals().into_iter().reduce(|hottest, current| {
            let current_count = self.nodes.get(&current).map_or(0, |n| n.self_encore_count);
            let hottest_count = self.nodes.get(&hottest).map_or(0, |n| n.self_encore_count);
            if current_count >= hottest_count {
                current
            } else {
                hottest
            }
        })
    }

    pub fn snapshot(&self) -> Vec<ArrivalSnapshot> {
        self.roots.iter().filter_map(|root| self.snapshot_of(*root)).collect()
    }

    fn snapshot_of(&self, id: ArrivalId) -> Option<ArrivalSnapshot> {
        let node = self.nodes.get(&id)?;
        let start = node.symbol.range().start;
        Some(ArrivalSnapshot {
            name: node.symbol.name().to_string(),
            kind: node.symbol.kind().as_str(),
            uri: node.symbol.uri().to_string(),
            line: start.line,
            character: start.character,
            word: node.word.clone(),
            self_encore_count: node.self_encore_count,
            tree_encore_count: self.tree_encore_count(id),
            pinned: node.is_pinned,
            tracing_id: node.symbol.tracing_id(),
            children: node
                .children
                .iter()
                .filter_map(|c| self.snapshot_of(*c))
                .collect(),
        })
    }

    // -- internals ---------------------------------------------------------

    /// Unlink `id` from its parent or from the root list.
    fn detach(&mut self, id: ArrivalId) {
        let parent = self.nodes.get(&id).and_then(|n| n.parent);
        match parent {
            Some(parent) => {
                self.remove_child(parent, id);
            }
            None => self.roots.retain(|r| *r != id),
        }
    }

    fn is_ancestor_or_self(&self, candidate: ArrivalId, id: ArrivalId) -> bool {
        let mut current = Some(id);
        while let Some(c) = current {
            if c == candidate {
                return true;
            }
            current = self.nodes.get(&c).and_then(|n| n.parent);
        }
        false
    }

    fn free_subtree(&mut self, id: ArrivalId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                stack.extend(node.children);
            }
        }
    }
}
