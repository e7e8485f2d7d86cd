use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymbolError {
    #[error("symbol name must not be empty")]
    EmptyName,
}

// ---------------------------------------------------------------------------
// Positions and ranges
// ---------------------------------------------------------------------------

/// Zero-based line/character position inside a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Inclusive on both ends, so a cursor parked right after the last
    /// character still counts as inside.
    pub fn contains(&self, position: Position) -> bool {
        self.start <= position && position <= self.end
    }
}

// ---------------------------------------------------------------------------
// Symbol kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    File,
    Module,
    Namespace,
    Package,
    Class,
    Method,
    Property,
    Field,
    Constructor,
    Enum,
    Interface,
    Function,
    Variable,
    Constant,
    String,
    Number,
    Boolean,
    Array,
    Object,
    Key,
    Null,
    EnumMember,
    Struct,
    Event,
    Operator,
    TypeParameter,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::File => "file",
            SymbolKind::Module => "module",
            SymbolKind::Namespace => "namespace",
            SymbolKind::Package => "package",
            SymbolKind::Class => "class",
            SymbolKind::Method => "method",
            SymbolKind::Property => "property",
            SymbolKind::Field => "field",
            SymbolKind::Constructor => "constructor",
            SymbolKind::Enum => "enum",
            SymbolKind::Interface => "interface",
            SymbolKind::Function => "function",
            SymbolKind::Variable => "variable",
            SymbolKind::Constant => "constant",
            SymbolKind::String => "string",
            SymbolKind::Number => "number",
            SymbolKind::Boolean => "boolean",
            SymbolKind::Array => "array",
            SymbolKind::Object => "object",
            SymbolKind::Key => "key",
            SymbolKind::Null => "null",
            SymbolKind::EnumMember => "enum_member",
            SymbolKind::Struct => "struct",
            SymbolKind::Event => "event",
            SymbolKind::Operator => "operator",
            SymbolKind::TypeParameter => "type_parameter",
        }
    }
}

// ---------------------------------------------------------------------------
// Document outline
// ---------------------------------------------------------------------------

/// One entry of the hierarchical outline a symbol provider returns for a
/// document. Children are owned; there are no back-references at this level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSymbol {
    pub name: String,
    pub detail: String,
    pub kind: SymbolKind,
    pub range: Range,
    pub selection_range: Range,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DocumentSymbol>,
}

// ---------------------------------------------------------------------------
// Tracing identifier
// ---------------------------------------------------------------------------

/// Stable key for one declaration occurrence. Changes whenever the symbol's
/// range moves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TracingId(String);

impl TracingId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TracingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

const TRACING_SCHEME: &str = "tracable-symbol";

// ---------------------------------------------------------------------------
// Symbol
// ---------------------------------------------------------------------------

/// A located code element together with the chain of symbols enclosing it.
///
/// The parent chain is shared (`Arc`) so cloning a deeply nested symbol stays
/// cheap; children are not carried, the outline owns them.
#[derive(Debug, Clone)]
pub struct Symbol {
    name: String,
    detail: String,
    kind: SymbolKind,
    uri: String,
    range: Range,
    selection_range: Range,
    parent: Option<Arc<Symbol>>,
    sentinel: bool,
}

static SENTINEL: Lazy<Symbol> = Lazy::new(|| Symbol {
    name: "<none>".to_string(),
    detail: String::new(),
    kind: SymbolKind::Null,
    uri: String::new(),
    range: Range::default(),
    selection_range: Range::default(),
    parent: None,
    sentinel: true,
});

impl Symbol {
    /// Build a top-level symbol. The selection range defaults to `range`.
    pub fn new(
        name: impl Into<String>,
        kind: SymbolKind,
        uri: impl Into<String>,
        range: Range,
    ) -> Result<Self, SymbolError> {
        let name = name.into();
        if name.is_empty() {
            return Err(SymbolError::EmptyName);
        }
        Ok(Self {
            name,
            detail: String::new(),
            kind,
            uri: uri.into(),
            range,
            selection_range: range,
            parent: None,
            sentinel: false,
        })
    }

    pub fn from_document(
        doc: &DocumentSymbol,
        uri: &str,
        parent: Option<Arc<Symbol>>,
    ) -> Result<Self, SymbolError> {
        let mut symbol = Self::new(doc.name.clone(), doc.kind, uri, doc.range)?
            .with_selection_range(doc.selection_range)
            .with_detail(doc.detail.clone());
        symbol.parent = parent;
        Ok(symbol)
    }

    /// Placeholder used by non-navigational entries (delimiters, fold
    /// markers). Never equal to a real symbol.
    pub fn sentinel() -> &'static Symbol {
        &SENTINEL
    }

    pub fn with_selection_range(mut self, selection_range: Range) -> Self {
        self.selection_range = selection_range;
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    pub fn with_parent(mut self, parent: Arc<Symbol>) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    pub fn kind(&self) -> SymbolKind {
        self.kind
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn range(&self) -> Range {
        self.range
    }

    pub fn selection_range(&self) -> Range {
        self.selection_range
    }

    pub fn parent(&self) -> Option<&Symbol> {
        self.parent.as_deref()
    }

    pub fn is_sentinel(&self) -> bool {
        self.sentinel
    }

    /// Self first, then each enclosing symbol up to the outermost one.
    pub fn ancestors(&self) -> impl Iterator<Item = &Symbol> {
        std::iter::successors(Some(self), |s| s.parent())
    }

    /// Weak equality: same declaration even if its extent shifted while
    /// editing.
    pub fn has_same_start(&self, other: &Symbol) -> bool {
        self.sentinel == other.sentinel
            && self.kind == other.kind
            && self.uri == other.uri
            && self.range.start == other.range.start
    }

    pub fn tracing_id(&self) -> TracingId {
        if self.sentinel {
            return TracingId(format!("{TRACING_SCHEME}:sentinel"));
        }
        let Range { start, end } = self.range;
        TracingId(format!(
            "{TRACING_SCHEME}:{}/{}/{}:{}-{}:{}",
            self.uri, self.name, start.line, start.character, end.line, end.character
        ))
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.sentinel == other.sentinel
            && self.name == other.name
            && self.kind == other.kind
            && self.uri == other.uri
            && self.range == other.range
            && self.selection_range == other.selection_range
    }
}

impl Eq for Symbol {}

// ---------------------------------------------------------------------------
// Cursor helpers
// ---------------------------------------------------------------------------

/// Innermost outline entry containing `position`, with its enclosing chain
/// attached. When several siblings contain the position the first one wins,
/// and a parent is returned when none of its children contain the position.
pub fn symbol_at(
    outline: &[DocumentSymbol],
    uri: &str,
    position: Position,
) -> Result<Option<Symbol>, SymbolError> {
    let mut level = outline;
    let mut innermost: Option<Symbol> = None;
    while let Some(doc) = level.iter().find(|s| s.range.contains(position)) {
        let parent = innermost.take().map(Arc::new);
        innermost = Some(Symbol::from_document(doc, uri, parent)?);
        level = &doc.children;
    }
    Ok(innermost)
}

static WORD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{L}_][\p{L}\p{N}_]*").expect("word pattern compiles"));

/// Identifier touching `column` on `line`, or `None` on whitespace and
/// punctuation. `column` counts characters, not bytes.
pub fn word_at(line: &str, column: u32) -> Option<String> {
    let column = column as usize;
    let offset = match line.char_indices().nth(column) {
        Some((offset, _)) => offset,
        None if column == line.chars().count() => line.len(),
        None => return None,
    };
    WORD_PATTERN
        .find_iter(line)
        .find(|m| m.start() <= offset && offset <= m.end())
        .map(|m| m.as_str().to_string())
}
