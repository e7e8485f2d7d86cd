use tree_sitter::{Language, Node, Tree};

use super::{node_text, outline_entry, Grammar};
use crate::symbol::{DocumentSymbol, SymbolKind};

pub struct PythonGrammar;

impl Grammar for PythonGrammar {
    fn language(&self) -> Language {
        tree_sitter_python::LANGUAGE.into()
    }

    fn file_extensions(&self) -> &[&str] {
        &["py", "pyi"]
    }

    fn extract_outline(&self, source: &[u8], tree: &Tree) -> Vec<DocumentSymbol> {
        let root = tree.root_node();
        let mut symbols = Vec::new();
        extract_top_level(&root, source, &mut symbols);
        symbols
    }
}

// ---------------------------------------------------------------------------
// Outline extraction
// ---------------------------------------------------------------------------

fn extract_top_level(node: &Node, source: &[u8], out: &mut Vec<DocumentSymbol>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        let sym = match child.kind() {
            "function_definition" => extract_definition(&child, source, SymbolKind::Function),
            "class_definition" => extract_class(&child, source),
            "decorated_definition" => extract_decorated(&child, source, SymbolKind::Function),
            "expression_statement" => extract_assignment(&child, source),
            _ => None,
        };
        if let Some(sym) = sym {
            out.push(sym);
        }
    }
}

fn extract_definition(node: &Node, source: &[u8], kind: SymbolKind) -> Option<DocumentSymbol> {
    let name_node = node.child_by_field_name("name")?;
    outline_entry(node, &name_node, source, kind, Vec::new())
}

/// `@decorator` wrapped def or class. The outline entry spans the decorators.
fn extract_decorated(node: &Node, source: &[u8], function_kind: SymbolKind) -> Option<DocumentSymbol> {
    let definition = node.child_by_field_name("definition")?;
    let mut sym = match definition.kind() {
        "class_definition" => extract_class(&definition, source)?,
        _ => extract_definition(&definition, source, function_kind)?,
    };
    sym.range = super::node_range(node, source);
    Some(sym)
}

fn extract_class(node: &Node, source: &[u8]) -> Option<DocumentSymbol> {
    let name_node = node.child_by_field_name("name")?;
    let mut members = Vec::new();
    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for child in body.children(&mut cursor) {
            let member = match child.kind() {
                "function_definition" => extract_definition(&child, source, SymbolKind::Method),
                "decorated_definition" => extract_decorated(&child, source, SymbolKind::Method),
                "class_definition" => extract_class(&child, source),
                _ => None,
            };
            if let Some(member) = member {
                members.push(member);
            }
        }
    }
    outline_entry(node, &name_node, source, SymbolKind::Class, members)
}

/// Module-level `NAME = value`. All-caps names are reported as constants.
fn extract_assignment(node: &Node, source: &[u8]) -> Option<DocumentSymbol> {
    let assignment = node.named_child(0).filter(|n| n.kind() == "assignment")?;
    let left = assignment.child_by_field_name("left")?;
    if left.kind() != "identifier" {
        return None;
    }
    let name = node_text(&left, source);
    let kind = if name.chars().any(|c| c.is_ascii_alphabetic())
        && name.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
    {
        SymbolKind::Constant
    } else {
        SymbolKind::Variable
    };
    outline_entry(node, &left, source, kind, Vec::new())
}
