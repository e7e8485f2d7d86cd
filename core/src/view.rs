use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::arrival::{ArrivalCollection, ArrivalId, ArrivalNode};
use crate::symbol::{Symbol, SymbolKind};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    /// Order of first visit.
    #[default]
    Time,
    /// Total encore count of the tree.
    Encore,
}

impl SortField {
    pub fn toggled(self) -> Self {
        match self {
            SortField::Time => SortField::Encore,
            SortField::Encore => SortField::Time,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReprOptions {
    pub delimiter_string: String,
    pub enable_delimiter: bool,
    pub sort_field: SortField,
    pub sort_order: SortOrder,
    pub unpin_fold_threshold: usize,
    pub is_folded: bool,
    pub show_filename: bool,
    pub show_position: bool,
}

impl Default for ReprOptions {
    fn default() -> Self {
        Self {
            delimiter_string: "──────".to_string(),
            enable_delimiter: false,
            sort_field: SortField::Time,
            sort_order: SortOrder::Ascending,
            unpin_fold_threshold: 10,
            is_folded: true,
            show_filename: true,
            show_position: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorOptions {
    pub colorize: bool,
    pub warm_color_threshold: u32,
    pub hot_color_threshold: u32,
}

impl Default for ColorOptions {
    fn default() -> Self {
        Self {
            colorize: true,
            warm_color_threshold: 5,
            hot_color_threshold: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// Tree items
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeItem {
    Arrival(ArrivalId),
    Delimiter(String),
    /// Separates pinned roots from unpinned ones.
    SectionDelimiter { pinned: usize, unpinned: usize },
    /// Stands in for unpinned roots hidden by folding.
    FoldPlaceholder,
}

impl TreeItem {
    pub fn arrival(&self) -> Option<ArrivalId> {
        match self {
            TreeItem::Arrival(id) => Some(*id),
            _ => None,
        }
    }

    /// Symbol behind the item; the sentinel for anything that is not an arrival.
    pub fn symbol<'a>(&self, arrivals: &'a ArrivalCollection) -> &'a Symbol {
        match self.arrival().and_then(|id| arrivals.get(id)) {
            Some(node) => node.symbol(),
            None => Symbol::sentinel(),
        }
    }
}

/// Flatten the forest's roots into display order: pinned roots, a section
/// delimiter, then unpinned roots (folded past the threshold when enabled).
pub fn to_tree_items(arrivals: &ArrivalCollection, options: &ReprOptions) -> Vec<TreeItem> {
    let pinned = sort_arrivals(arrivals, arrivals.pinned_arrivals(), options);
    let unpinned = sort_arrivals(arrivals, arrivals.unpinned_arrivals(), options);

    let mut unpinned_items: Vec<TreeItem> = unpinned.iter().copied().map(TreeItem::Arrival).collect();
    if options.is_folded && unpinned.len() > options.unpin_fold_threshold {
        unpinned_items.truncate(options.unpin_fold_threshold);
        match options.sort_order {
            SortOrder::Ascending => unpinned_items.insert(0, TreeItem::FoldPlaceholder),
            SortOrder::Descending => unpinned_items.push(TreeItem::FoldPlaceholder),
        }
    }

    let pinned_items: Vec<TreeItem> = pinned.iter().copied().map(TreeItem::Arrival).collect();
    let section = TreeItem::SectionDelimiter {
        pinned: pinned.len(),
        unpinned: unpinned.len(),
    };

    let mut items = with_delimiters(pinned_items, options);
    items.push(section);
    items.extend(with_delimiters(unpinned_items, options));
    items
}

fn with_delimiters(items: Vec<TreeItem>, options: &ReprOptions) -> Vec<TreeItem> {
    if !options.enable_delimiter {
        return items;
    }
    let mut out = Vec::with_capacity(items.len() * 2);
    for item in items {
        if !out.is_empty() {
            out.push(TreeItem::Delimiter(options.delimiter_string.clone()));
        }
        out.push(item);
    }
    out
}

/// Stable sort by insertion index or tree encore count.
fn sort_arrivals(
    arrivals: &ArrivalCollection,
    roots: Vec<ArrivalId>,
    options: &ReprOptions,
) -> Vec<ArrivalId> {
    let mut keyed: Vec<(u32, ArrivalId)> = roots
        .into_iter()
        .enumerate()
        .map(|(index, id)| {
            let key = match options.sort_field {
                SortField::Time => index as u32,
                SortField::Encore => arrivals.tree_encore_count(id),
            };
            (key, id)
        })
        .collect();
    match options.sort_order {
        SortOrder::Ascending => keyed.sort_by_key(|(key, _)| *key),
        SortOrder::Descending => keyed.sort_by(|(a, _), (b, _)| b.cmp(a)),
    }
    keyed.into_iter().map(|(_, id)| id).collect()
}

// ---------------------------------------------------------------------------
// Item text
// ---------------------------------------------------------------------------

pub fn label(node: &ArrivalNode) -> String {
    let symbol = node.symbol();
    match symbol.kind() {
        SymbolKind::Method => format!(".{}", symbol.name()),
        _ => symbol.name().to_string(),
    }
}

/// `"<filename> <line>:<column>"`, 1-based, each half optional.
pub fn description(node: &ArrivalNode, options: &ReprOptions) -> String {
    let symbol = node.symbol();
    let mut parts = Vec::with_capacity(2);
    if options.show_filename {
        let filename = symbol.uri().rsplit('/').next().unwrap_or(symbol.uri());
        parts.push(filename.to_string());
    }
    if options.show_position {
        let start = symbol.range().start;
        parts.push(format!("{}:{}", start.line + 1, start.character + 1));
    }
    parts.join(" ")
}

// ---------------------------------------------------------------------------
// Decoration and status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Heat {
    Warm,
    Hot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decoration {
    pub badge: String,
    pub tooltip: String,
    pub heat: Option<Heat>,
}

const MAX_BADGE_COUNT: u32 = 99;

pub fn decoration(node: &ArrivalNode, colors: &ColorOptions) -> Decoration {
    let encore = node.self_encore_count();
    let visits = encore.min(MAX_BADGE_COUNT - 1) + 1;
    let heat = if !colors.colorize {
        None
    } else if encore >= colors.hot_color_threshold {
        Some(Heat::Hot)
    } else if encore >= colors.warm_color_threshold {
        Some(Heat::Warm)
    } else {
        None
    };
    Decoration {
        badge: visits.to_string(),
        tooltip: format!("{} has been checked for {} times", node.symbol().name(), visits),
        heat,
    }
}

/// Status line naming the most revisited arrival.
pub fn status_text(arrivals: &ArrivalCollection) -> Option<String> {
    let node = arrivals.get(arrivals.hottest()?)?;
    Some(format!(
        "{} has been checked for {} times",
        node.symbol().name(),
        node.self_encore_count() + 1
    ))
}

// ---------------------------------------------------------------------------
// Text rendering
// ---------------------------------------------------------------------------

/// Indented plain-text rendering of the items, children nested two spaces
/// per level.
pub fn render_text(
    arrivals: &ArrivalCollection,
    items: &[TreeItem],
    options: &ReprOptions,
    colors: &ColorOptions,
) -> String {
    let mut out = String::new();
    for item in items {
        match item {
            TreeItem::Arrival(id) => render_node(arrivals, *id, 0, options, colors, &mut out),
            TreeItem::Delimiter(text) => {
                let _ = writeln!(out, "{text}");
            }
            TreeItem::SectionDelimiter { pinned, unpinned } => {
                let _ = writeln!(out, "── pinned {pinned} · unpinned {unpinned} ──");
            }
            TreeItem::FoldPlaceholder => {
                let _ = writeln!(out, "…");
            }
        }
    }
    out
}

fn render_node(
    arrivals: &ArrivalCollection,
    id: ArrivalId,
    depth: usize,
    options: &ReprOptions,
    colors: &ColorOptions,
    out: &mut String,
) {
    let Some(node) = arrivals.get(id) else {
        return;
    };
    let decoration = decoration(node, colors);
    let pin = if node.is_pinned() { " [pinned]" } else { "" };
    let heat = match decoration.heat {
        Some(Heat::Hot) => " (hot)",
        Some(Heat::Warm) => " (warm)",
        None => "",
    };
    let _ = writeln!(
        out,
        "{:indent$}{} {} ×{}{}{}",
        "",
        label(node),
        description(node, options),
        decoration.badge,
        heat,
        pin,
        indent = depth * 2
    );
    for child in node.children() {
        render_node(arrivals, *child, depth + 1, options, colors, out);
    }
}
