use crate::arrival::{same_start, same_symbol, ArrivalCollection, ArrivalId};
use crate::symbol::{Symbol, SymbolKind};

// ---------------------------------------------------------------------------
// Decision: what one cursor-move event does to the forest
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Wrap the symbol in its enclosing chain and push it as a new root.
    NewRoot,
    /// The declaration was edited; overwrite the stored symbol.
    ReplaceInPlace(ArrivalId),
    /// Exact revisit of an already recorded symbol.
    Encore(ArrivalId),
    /// Landed on an unvisited sub-symbol of a recorded ancestor.
    GraftSubSymbol { ancestor: ArrivalId },
    /// Jumped from a reference into a top-level function, variable,
    /// constant, or into a class declaration.
    DrillIn { from: ArrivalId },
    /// Jumped from a reference into a member of a class or object that is
    /// not recorded yet. The container gets its own node between `from` and
    /// the member.
    DrillIntoMember { from: ArrivalId },
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::NewRoot => "new_root",
            Decision::ReplaceInPlace(_) => "replace_in_place",
            Decision::Encore(_) => "encore",
            Decision::GraftSubSymbol { .. } => "graft_sub_symbol",
            Decision::DrillIn { .. } => "drill_in",
            Decision::DrillIntoMember { .. } => "drill_into_member",
        }
    }
}

#[derive(Debug, Clone)]
struct LatestArrival {
    symbol: Symbol,
    word: String,
}

// ---------------------------------------------------------------------------
// ArrivalRecorder
// ---------------------------------------------------------------------------

/// Turns a stream of (symbol, word) cursor events into the arrival forest.
#[derive(Debug, Default)]
pub struct ArrivalRecorder {
    arrivals: ArrivalCollection,
    latest: Option<LatestArrival>,
}

impl ArrivalRecorder {
    pub fn new(arrivals: ArrivalCollection) -> Self {
        Self {
            arrivals,
            latest: None,
        }
    }

    pub fn arrivals(&self) -> &ArrivalCollection {
        &self.arrivals
    }

    pub fn arrivals_mut(&mut self) -> &mut ArrivalCollection {
        &mut self.arrivals
    }

    pub fn clear(&mut self) {
        self.arrivals.clear();
        self.latest = None;
    }

    /// Record a visit and return the node that now represents it. That is
    /// the pre-existing node for revisits and in-place edits.
    pub fn record(&mut self, symbol: Symbol, word: impl Into<String>) -> ArrivalId {
        let word = word.into();
        let decision = self.classify(&symbol);
        tracing::debug!(
            symbol = symbol.name(),
            word = %word,
            decision = decision.as_str(),
            "recording arrival"
        );
        let recorded = self.apply(decision, symbol.clone(), word.clone());
        self.latest = Some(LatestArrival { symbol, word });
        recorded
    }

    /// Decide what recording `symbol` would do, without touching the forest.
    ///
    /// Edit-in-place is checked across every root first. Then each root is
    /// examined from the most recent one: the ancestor walk (revisit or
    /// sub-symbol landing) and, failing that, the drill-in rules against the
    /// previous arrival. Nothing matching anywhere means a new root.
    pub fn classify(&self, symbol: &Symbol) -> Decision {
        if self.arrivals.is_empty() {
            return Decision::NewRoot;
        }

        if let Some(edited) = self.find_edited_in_place(symbol) {
            return Decision::ReplaceInPlace(edited);
        }

        for &root in self.arrivals.roots().iter().rev() {
            if let Some(found) =
                self.arrivals
                    .find_symbol_ancestor_in_arrival_tree(symbol, root, same_symbol)
            {
                let exact = self
                    .arrivals
                    .get(found)
                    .is_some_and(|node| node.is_on_same_symbol_of(symbol));
                return if exact {
                    Decision::Encore(found)
                } else {
                    Decision::GraftSubSymbol { ancestor: found }
                };
            }

            if let Some(decision) = self.classify_drill_in(symbol, root) {
                return decision;
            }
        }

        Decision::NewRoot
    }

    /// Apply a decision made by [`classify`](Self::classify) for the same
    /// symbol.
    pub fn apply(&mut self, decision: Decision, symbol: Symbol, word: String) -> ArrivalId {
        match decision {
            Decision::NewRoot => {
                let leaf = self.arrivals.create_from(symbol, word);
                let root = self.create_new_arrival_tree_from_leaf(leaf, None);
                self.arrivals.push(root);
                leaf
            }
            Decision::ReplaceInPlace(id) => {
                if let Some(node) = self.arrivals.get_mut(id) {
                    node.replace_symbol(symbol);
                }
                id
            }
            Decision::Encore(id) => {
                self.arrivals.encore(id);
                id
            }
            Decision::GraftSubSymbol { ancestor } => {
                let stop_at = self.arrivals.get(ancestor).map(|n| n.symbol().clone());
                let leaf = self.arrivals.create_from(symbol, word);
                let top = self.create_new_arrival_tree_from_leaf(leaf, stop_at.as_ref());
                self.attach(ancestor, top);
                leaf
            }
            Decision::DrillIn { from } => {
                self.resync_word(from);
                let leaf = self.arrivals.create_from(symbol, word);
                self.attach(from, leaf);
                leaf
            }
            Decision::DrillIntoMember { from } => {
                let Some(container) = symbol.parent().cloned() else {
                    // Nothing to synthesize for a symbol without a container.
                    return self.apply(Decision::DrillIn { from }, symbol, word);
                };
                self.resync_word(from);
                let leaf = self.arrivals.create_from(symbol, word);
                let container_word = container.name().to_string();
                let class = self.arrivals.create_from(container, container_word);
                self.attach(class, leaf);
                self.attach(from, class);
                leaf
            }
        }
    }

    /// Wrap `leaf` in one node per enclosing symbol until the outermost
    /// symbol or `stop_at` (exclusive) is reached. Returns the chain's top.
    pub fn create_new_arrival_tree_from_leaf(
        &mut self,
        leaf: ArrivalId,
        stop_at: Option<&Symbol>,
    ) -> ArrivalId {
        let mut top = leaf;
        loop {
            let parent_symbol = match self.arrivals.get(top).and_then(|n| n.symbol().parent()) {
                Some(parent) if stop_at != Some(parent) => parent.clone(),
                _ => return top,
            };
            let word = parent_symbol.name().to_string();
            let wrapper = self.arrivals.create_from(parent_symbol, word);
            self.attach(wrapper, top);
            top = wrapper;
        }
    }

    // -- classification helpers -------------------------------------------

    fn find_edited_in_place(&self, symbol: &Symbol) -> Option<ArrivalId> {
        let candidate = self
            .arrivals
            .roots()
            .iter()
            .rev()
            .find_map(|&root| self.arrivals.find_in_arrival_tree(symbol, root, same_start))?;
        // An identical symbol is a revisit, not an edit.
        match self.arrivals.get(candidate) {
            Some(node) if !node.is_on_same_symbol_of(symbol) => Some(candidate),
            _ => None,
        }
    }

    fn classify_drill_in(&self, symbol: &Symbol, root: ArrivalId) -> Option<Decision> {
        let latest = self.latest.as_ref()?;
        if latest.symbol == *symbol || latest.word != symbol.name() {
            return None;
        }
        let from = self
            .arrivals
            .find_in_arrival_tree(&latest.symbol, root, same_symbol)?;

        if is_independent(symbol) || symbol.kind() == SymbolKind::Class {
            return Some(Decision::DrillIn { from });
        }

        // A container already under `from` is found by the ancestor walk
        // first, so a member drill-in always creates the container node.
        let container = symbol.parent()?;
        if !matches!(container.kind(), SymbolKind::Class | SymbolKind::Object) {
            return None;
        }
        Some(Decision::DrillIntoMember { from })
    }

    // -- mutation helpers --------------------------------------------------

    fn resync_word(&mut self, from: ArrivalId) {
        let Some(latest) = &self.latest else {
            return;
        };
        if let Some(node) = self.arrivals.get_mut(from) {
            node.set_word(latest.word.clone());
        }
    }

    fn attach(&mut self, parent: ArrivalId, child: ArrivalId) {
        if !self.arrivals.add_child(parent, child) {
            tracing::warn!(?parent, ?child, "arrival already has a child on the same symbol");
        }
    }
}

/// Top-level function, variable or constant.
fn is_independent(symbol: &Symbol) -> bool {
    symbol.parent().is_none()
        && matches!(
            symbol.kind(),
            SymbolKind::Function | SymbolKind::Variable | SymbolKind::Constant
        )
}
