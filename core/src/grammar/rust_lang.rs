use tree_sitter::{Language, Node, Tree};

use super::{find_child_by_kind, outline_entry, Grammar};
use crate::symbol::{DocumentSymbol, SymbolKind};

pub struct RustGrammar;

impl Grammar for RustGrammar {
    fn language(&self) -> Language {
        tree_sitter_rust::LANGUAGE.into()
    }

    fn file_extensions(&self) -> &[&str] {
        &["rs"]
    }

    fn extract_outline(&self, source: &[u8], tree: &Tree) -> Vec<DocumentSymbol> {
        let root = tree.root_node();
        let mut symbols = Vec::new();
        extract_items(&root, source, &mut symbols);
        symbols
    }
}

// ---------------------------------------------------------------------------
// Outline extraction
// ---------------------------------------------------------------------------

/// Walk the direct children of a source file or module body.
fn extract_items(node: &Node, source: &[u8], out: &mut Vec<DocumentSymbol>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        let sym = match child.kind() {
            "function_item" => extract_named(&child, source, SymbolKind::Function, Vec::new()),
            "struct_item" => extract_named(&child, source, SymbolKind::Struct, Vec::new()),
            "enum_item" => extract_named(&child, source, SymbolKind::Enum, Vec::new()),
            "const_item" | "static_item" => {
                extract_named(&child, source, SymbolKind::Constant, Vec::new())
            }
            "type_item" => extract_named(&child, source, SymbolKind::TypeParameter, Vec::new()),
            "trait_item" => {
                let methods = extract_methods(&child, source);
                extract_named(&child, source, SymbolKind::Interface, methods)
            }
            "mod_item" => {
                let mut items = Vec::new();
                if let Some(body) = find_child_by_kind(&child, "declaration_list") {
                    extract_items(&body, source, &mut items);
                }
                extract_named(&child, source, SymbolKind::Module, items)
            }
            "impl_item" => extract_impl(&child, source),
            _ => None,
        };
        if let Some(sym) = sym {
            out.push(sym);
        }
    }
}

fn extract_named(
    node: &Node,
    source: &[u8],
    kind: SymbolKind,
    children: Vec<DocumentSymbol>,
) -> Option<DocumentSymbol> {
    let name_node = node.child_by_field_name("name")?;
    outline_entry(node, &name_node, source, kind, children)
}

/// An `impl` block becomes an Object named after the implementing type, with
/// its functions nested as methods.
fn extract_impl(node: &Node, source: &[u8]) -> Option<DocumentSymbol> {
    let type_node = node.child_by_field_name("type")?;
    let methods = extract_methods(node, source);
    outline_entry(node, &type_node, source, SymbolKind::Object, methods)
}

fn extract_methods(node: &Node, source: &[u8]) -> Vec<DocumentSymbol> {
    let Some(decl_list) = find_child_by_kind(node, "declaration_list") else {
        return Vec::new();
    };
    let mut methods = Vec::new();
    let mut cursor = decl_list.walk();
    for child in decl_list.children(&mut cursor) {
        if !matches!(child.kind(), "function_item" | "function_signature_item") {
            continue;
        }
        let Some(name_node) = child.child_by_field_name("name") else {
            continue;
        };
        if let Some(method) = outline_entry(&child, &name_node, source, SymbolKind::Method, Vec::new()) {
            methods.push(method);
        }
    }
    methods
}
