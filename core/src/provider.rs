use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::grammar::GrammarRegistry;
use crate::symbol::{self, DocumentSymbol, Position, Symbol};

// ---------------------------------------------------------------------------
// SymbolProvider trait
// ---------------------------------------------------------------------------

/// Source of document outlines and cursor words. `document` is whatever the
/// provider uses to address a file; it also becomes the symbols' `uri`.
#[async_trait]
pub trait SymbolProvider: Send + Sync {
    async fn document_symbols(&self, document: &str) -> Result<Vec<DocumentSymbol>>;

    async fn word_at(&self, document: &str, position: Position) -> Option<String>;

    /// Innermost symbol containing `position`, with its enclosing chain.
    async fn symbol_at(&self, document: &str, position: Position) -> Result<Option<Symbol>> {
        let outline = self.document_symbols(document).await?;
        Ok(symbol::symbol_at(&outline, document, position)?)
    }

    /// Word and symbol under `position`, or `None` when either is missing.
    /// Providers backed by mutable storage should take both from one read.
    async fn resolve(&self, document: &str, position: Position) -> Result<Option<(String, Symbol)>> {
        let Some(word) = self.word_at(document, position).await else {
            return Ok(None);
        };
        Ok(self
            .symbol_at(document, position)
            .await?
            .map(|symbol| (word, symbol)))
    }
}

// ---------------------------------------------------------------------------
// SourceFileProvider: tree-sitter outlines of files on disk
// ---------------------------------------------------------------------------

pub struct SourceFileProvider {
    registry: GrammarRegistry,
}

impl SourceFileProvider {
    pub fn new(registry: GrammarRegistry) -> Self {
        Self { registry }
    }

    /// Parse `source` with the grammar picked by `path`'s extension.
    pub fn outline(&self, path: &Path, source: &[u8]) -> Result<Vec<DocumentSymbol>> {
        let grammar = self
            .registry
            .for_path(path)
            .with_context(|| format!("no grammar for {}", path.display()))?;

        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&grammar.language())
            .with_context(|| format!("failed to load grammar for {}", path.display()))?;
        let tree = parser
            .parse(source, None)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        Ok(grammar.extract_outline(source, &tree))
    }
}

impl Default for SourceFileProvider {
    fn default() -> Self {
        Self::new(GrammarRegistry::new())
    }
}

async fn read_source(document: &str) -> Result<Vec<u8>> {
    tokio::fs::read(document)
        .await
        .with_context(|| format!("failed to read {document}"))
}

fn source_word_at(source: &[u8], position: Position) -> Option<String> {
    let text = String::from_utf8_lossy(source);
    let line = text.lines().nth(position.line as usize)?;
    symbol::word_at(line, position.character)
}

#[async_trait]
impl SymbolProvider for SourceFileProvider {
    async fn document_symbols(&self, document: &str) -> Result<Vec<DocumentSymbol>> {
        let source = read_source(document).await?;
        let outline = self.outline(Path::new(document), &source)?;
        tracing::trace!(document, symbols = outline.len(), "outline extracted");
        Ok(outline)
    }

    async fn word_at(&self, document: &str, position: Position) -> Option<String> {
        let source = read_source(document).await.ok()?;
        source_word_at(&source, position)
    }

    /// One read feeds both the word and the outline, so they always describe
    /// the same version of the file. An unreadable file has nothing under the
    /// cursor.
    async fn resolve(&self, document: &str, position: Position) -> Result<Option<(String, Symbol)>> {
        let source = match read_source(document).await {
            Ok(source) => source,
            Err(e) => {
                tracing::debug!(document, error = %format!("{e:#}"), "skipping unreadable document");
                return Ok(None);
            }
        };
        let Some(word) = source_word_at(&source, position) else {
            return Ok(None);
        };
        let outline = self.outline(Path::new(document), &source)?;
        Ok(symbol::symbol_at(&outline, document, position)?.map(|symbol| (word, symbol)))
    }
}
