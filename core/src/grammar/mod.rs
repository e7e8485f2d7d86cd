pub mod python;
pub mod rust_lang;

use std::path::Path;

use tree_sitter::{Node, Point};

use crate::symbol::{DocumentSymbol, Position, Range, SymbolKind};

// ---------------------------------------------------------------------------
// Grammar trait
// ---------------------------------------------------------------------------

/// A tree-sitter grammar that can turn a parsed file into a symbol outline.
pub trait Grammar: Send + Sync {
    fn language(&self) -> tree_sitter::Language;
    fn file_extensions(&self) -> &[&str];
    fn extract_outline(&self, source: &[u8], tree: &tree_sitter::Tree) -> Vec<DocumentSymbol>;
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

pub struct GrammarRegistry {
    grammars: Vec<Box<dyn Grammar>>,
}

impl GrammarRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            grammars: Vec::new(),
        };
        registry.register(Box::new(rust_lang::RustGrammar));
        registry.register(Box::new(python::PythonGrammar));
        registry
    }

    pub fn register(&mut self, grammar: Box<dyn Grammar>) {
        self.grammars.push(grammar);
    }

    /// Look up the grammar that handles a given file extension (without the dot).
    pub fn for_extension(&self, ext: &str) -> Option<&dyn Grammar> {
        self.grammars
            .iter()
            .find(|g| g.file_extensions().contains(&ext))
            .map(|g| g.as_ref())
    }

    pub fn for_path(&self, path: &Path) -> Option<&dyn Grammar> {
        let ext = path.extension()?.to_str()?;
        self.for_extension(ext)
    }
}

impl Default for GrammarRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Helpers shared by the grammars
// ---------------------------------------------------------------------------

/// Tree-sitter columns count bytes; outline positions count characters so
/// they line up with `symbol::word_at`.
pub(crate) fn node_range(node: &Node, source: &[u8]) -> Range {
    Range::new(
        char_position(source, node.start_byte(), node.start_position()),
        char_position(source, node.end_byte(), node.end_position()),
    )
}

fn char_position(source: &[u8], byte: usize, point: Point) -> Position {
    let line_start = byte.saturating_sub(point.column);
    let character = source
        .get(line_start..byte)
        .map(|prefix| String::from_utf8_lossy(prefix).chars().count())
        .unwrap_or(point.column);
    Position::new(point.row as u32, character as u32)
}

pub(crate) fn node_text(node: &Node, source: &[u8]) -> String {
    node.utf8_text(source).unwrap_or("").to_string()
}

pub(crate) fn find_child_by_kind<'a>(node: &'a Node, kind: &str) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    let result = node.children(&mut cursor).find(|child| child.kind() == kind);
    result
}

/// Outline entry for `node`, named by `name_node`. The first line of the
/// declaration goes into `detail`.
pub(crate) fn outline_entry(
    node: &Node,
    name_node: &Node,
    source: &[u8],
    kind: SymbolKind,
    children: Vec<DocumentSymbol>,
) -> Option<DocumentSymbol> {
    let name = node_text(name_node, source);
    if name.is_empty() {
        return None;
    }
    let detail = node_text(node, source)
        .lines()
        .next()
        .unwrap_or("")
        .trim()
        .to_string();
    Some(DocumentSymbol {
        name,
        detail,
        kind,
        range: node_range(node, source),
        selection_range: node_range(name_node, source),
        children,
    })
}
