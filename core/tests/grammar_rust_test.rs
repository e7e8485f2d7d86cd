use arrival_core::grammar::rust_lang::RustGrammar;
use arrival_core::grammar::Grammar;
use arrival_core::symbol::{DocumentSymbol, Position, SymbolKind};

const RUST_SOURCE: &str = r#"use std::io;

struct Config {
    port: u16,
    host: String,
}

impl Config {
    fn new(port: u16) -> Self {
        Config { port, host: String::from("localhost") }
    }

    fn validate(&self) -> bool {
        self.port > 0
    }
}

fn start_server(config: &Config) {
    println!("Starting on port {}", config.port);
}

trait Handler {
    fn handle(&self, request: &str) -> String;
}

enum Status {
    Active,
    Inactive,
}

const MAX_CONNECTIONS: u32 = 100;

type Result<T> = std::result::Result<T, io::Error>;

mod net {
    pub fn connect() {}
}
"#;

fn parse_rust(source: &str) -> tree_sitter::Tree {
    let mut parser = tree_sitter::Parser::new();
    let lang: tree_sitter::Language = tree_sitter_rust::LANGUAGE.into();
    parser
        .set_language(&lang)
        .expect("failed to set Rust language");
    parser
        .parse(source.as_bytes(), None)
        .expect("failed to parse Rust source")
}

fn outline() -> Vec<DocumentSymbol> {
    let tree = parse_rust(RUST_SOURCE);
    RustGrammar.extract_outline(RUST_SOURCE.as_bytes(), &tree)
}

fn find<'a>(symbols: &'a [DocumentSymbol], name: &str) -> &'a DocumentSymbol {
    symbols
        .iter()
        .find(|s| s.name == name)
        .unwrap_or_else(|| panic!("missing symbol {name}"))
}

// ---------------------------------------------------------------------------
// 1. Top-level items
// ---------------------------------------------------------------------------
#[test]
fn test_rust_top_level_kinds() {
    let symbols = outline();
    let names: Vec<(&str, SymbolKind)> = symbols.iter().map(|s| (s.name.as_str(), s.kind)).collect();

    assert_eq!(
        names,
        vec![
            ("Config", SymbolKind::Struct),
            ("Config", SymbolKind::Object),
            ("start_server", SymbolKind::Function),
            ("Handler", SymbolKind::Interface),
            ("Status", SymbolKind::Enum),
            ("MAX_CONNECTIONS", SymbolKind::Constant),
            ("Result", SymbolKind::TypeParameter),
            ("net", SymbolKind::Module),
        ]
    );
}

// ---------------------------------------------------------------------------
// 2. Nesting
// ---------------------------------------------------------------------------
#[test]
fn test_rust_impl_methods_nested() {
    let symbols = outline();
    let imp = symbols
        .iter()
        .find(|s| s.kind == SymbolKind::Object)
        .expect("impl block");
    let methods: Vec<(&str, SymbolKind)> =
        imp.children.iter().map(|s| (s.name.as_str(), s.kind)).collect();
    assert_eq!(
        methods,
        vec![("new", SymbolKind::Method), ("validate", SymbolKind::Method)]
    );
}

#[test]
fn test_rust_trait_and_module_children() {
    let symbols = outline();
    let handler = find(&symbols, "Handler");
    assert_eq!(handler.children.len(), 1);
    assert_eq!(handler.children[0].name, "handle");
    assert_eq!(handler.children[0].kind, SymbolKind::Method);

    let net = find(&symbols, "net");
    assert_eq!(net.children.len(), 1);
    assert_eq!(net.children[0].name, "connect");
    assert_eq!(net.children[0].kind, SymbolKind::Function);
}

// ---------------------------------------------------------------------------
// 3. Ranges
// ---------------------------------------------------------------------------
#[test]
fn test_rust_ranges_are_zero_based() {
    let symbols = outline();
    let server = find(&symbols, "start_server");
    assert_eq!(server.range.start, Position::new(17, 0));
    assert_eq!(server.range.end, Position::new(19, 1));
    assert_eq!(server.selection_range.start, Position::new(17, 3));
    assert_eq!(server.selection_range.end, Position::new(17, 15));
    assert_eq!(server.detail, "fn start_server(config: &Config) {");
}

#[test]
fn test_rust_methods_inside_impl_range() {
    let symbols = outline();
    let imp = symbols.iter().find(|s| s.kind == SymbolKind::Object).unwrap();
    for method in &imp.children {
        assert!(
            imp.range.contains(method.range.start) && imp.range.contains(method.range.end),
            "{} should lie inside the impl block",
            method.name
        );
    }
}
