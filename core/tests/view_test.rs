use std::sync::Arc;

use arrival_core::arrival::{ArrivalCollection, ArrivalId};
use arrival_core::symbol::{Position, Range, Symbol, SymbolKind};
use arrival_core::view::{
    decoration, description, label, render_text, status_text, to_tree_items, ColorOptions, Heat,
    ReprOptions, SortField, SortOrder, TreeItem,
};

fn func(name: &str, line: u32) -> Symbol {
    Symbol::new(
        name,
        SymbolKind::Function,
        "/work/src/app.py",
        Range::new(Position::new(line, 4), Position::new(line + 2, 0)),
    )
    .unwrap()
}

fn forest_of(count: usize) -> (ArrivalCollection, Vec<ArrivalId>) {
    let mut arrivals = ArrivalCollection::new();
    let ids = (0..count)
        .map(|i| {
            let name = format!("f{i}");
            let id = arrivals.create_from(func(&name, i as u32 * 10), name);
            arrivals.push(id);
            id
        })
        .collect();
    (arrivals, ids)
}

fn arrival_ids(items: &[TreeItem]) -> Vec<ArrivalId> {
    items.iter().filter_map(TreeItem::arrival).collect()
}

fn unfolded() -> ReprOptions {
    ReprOptions {
        is_folded: false,
        ..ReprOptions::default()
    }
}

// ---------------------------------------------------------------------------
// 1. Layout
// ---------------------------------------------------------------------------
#[test]
fn test_pinned_section_comes_first() {
    let (mut arrivals, ids) = forest_of(3);
    let pin = arrivals.get(ids[2]).unwrap().symbol().tracing_id();
    arrivals.set_arrival_pin_state(&pin, true);

    let items = to_tree_items(&arrivals, &unfolded());
    assert_eq!(
        items,
        vec![
            TreeItem::Arrival(ids[2]),
            TreeItem::SectionDelimiter {
                pinned: 1,
                unpinned: 2
            },
            TreeItem::Arrival(ids[0]),
            TreeItem::Arrival(ids[1]),
        ]
    );
}

#[test]
fn test_descending_time_reverses_order() {
    let (arrivals, ids) = forest_of(3);
    let options = ReprOptions {
        sort_order: SortOrder::Descending,
        ..unfolded()
    };
    let items = to_tree_items(&arrivals, &options);
    assert_eq!(arrival_ids(&items), vec![ids[2], ids[1], ids[0]]);
}

#[test]
fn test_encore_sort_is_stable() {
    let (mut arrivals, ids) = forest_of(3);
    arrivals.encore(ids[1]);
    arrivals.encore(ids[1]);

    let options = ReprOptions {
        sort_field: SortField::Encore,
        ..unfolded()
    };
    let items = to_tree_items(&arrivals, &options);
    assert_eq!(
        arrival_ids(&items),
        vec![ids[0], ids[2], ids[1]],
        "ties keep insertion order"
    );

    let options = ReprOptions {
        sort_order: SortOrder::Descending,
        ..options
    };
    let items = to_tree_items(&arrivals, &options);
    assert_eq!(arrival_ids(&items), vec![ids[1], ids[0], ids[2]]);
}

#[test]
fn test_encore_sort_uses_whole_tree() {
    let (mut arrivals, ids) = forest_of(2);
    let child = arrivals.create_from(func("deep", 100), "deep");
    arrivals.add_child(ids[0], child);
    for _ in 0..3 {
        arrivals.encore(child);
    }
    arrivals.encore(ids[1]);

    let options = ReprOptions {
        sort_field: SortField::Encore,
        sort_order: SortOrder::Descending,
        ..unfolded()
    };
    assert_eq!(arrival_ids(&to_tree_items(&arrivals, &options)), vec![ids[0], ids[1]]);
}

// ---------------------------------------------------------------------------
// 2. Folding and delimiters
// ---------------------------------------------------------------------------
#[test]
fn test_folding_ascending_puts_placeholder_first() {
    let (arrivals, ids) = forest_of(5);
    let options = ReprOptions {
        unpin_fold_threshold: 3,
        ..ReprOptions::default()
    };
    let items = to_tree_items(&arrivals, &options);
    assert_eq!(
        items[1..],
        [
            TreeItem::FoldPlaceholder,
            TreeItem::Arrival(ids[0]),
            TreeItem::Arrival(ids[1]),
            TreeItem::Arrival(ids[2]),
        ]
    );
    assert_eq!(
        items[0],
        TreeItem::SectionDelimiter {
            pinned: 0,
            unpinned: 5
        },
        "the section header counts folded roots too"
    );
}

#[test]
fn test_folding_descending_puts_placeholder_last() {
    let (arrivals, ids) = forest_of(5);
    let options = ReprOptions {
        unpin_fold_threshold: 2,
        sort_order: SortOrder::Descending,
        ..ReprOptions::default()
    };
    let items = to_tree_items(&arrivals, &options);
    assert_eq!(
        items[1..],
        [
            TreeItem::Arrival(ids[4]),
            TreeItem::Arrival(ids[3]),
            TreeItem::FoldPlaceholder,
        ]
    );
}

#[test]
fn test_no_placeholder_at_threshold() {
    let (arrivals, _) = forest_of(3);
    let options = ReprOptions {
        unpin_fold_threshold: 3,
        ..ReprOptions::default()
    };
    let items = to_tree_items(&arrivals, &options);
    assert!(!items.contains(&TreeItem::FoldPlaceholder));
    assert_eq!(arrival_ids(&items).len(), 3);
}

#[test]
fn test_delimiters_between_items_only() {
    let (arrivals, ids) = forest_of(3);
    let options = ReprOptions {
        enable_delimiter: true,
        delimiter_string: "--".to_string(),
        ..unfolded()
    };
    let items = to_tree_items(&arrivals, &options);
    let delimiter = TreeItem::Delimiter("--".to_string());
    assert_eq!(
        items,
        vec![
            TreeItem::SectionDelimiter {
                pinned: 0,
                unpinned: 3
            },
            TreeItem::Arrival(ids[0]),
            delimiter.clone(),
            TreeItem::Arrival(ids[1]),
            delimiter,
            TreeItem::Arrival(ids[2]),
        ]
    );
}

#[test]
fn test_non_arrival_items_map_to_sentinel() {
    let (arrivals, ids) = forest_of(1);
    assert!(TreeItem::FoldPlaceholder.symbol(&arrivals).is_sentinel());
    assert!(TreeItem::Delimiter("-".into()).symbol(&arrivals).is_sentinel());
    assert_eq!(TreeItem::Arrival(ids[0]).symbol(&arrivals).name(), "f0");
}

// ---------------------------------------------------------------------------
// 3. Item text
// ---------------------------------------------------------------------------
#[test]
fn test_label_prefixes_methods() {
    let mut arrivals = ArrivalCollection::new();
    let class = Arc::new(
        Symbol::new(
            "Cart",
            SymbolKind::Class,
            "app.py",
            Range::new(Position::new(0, 0), Position::new(9, 0)),
        )
        .unwrap(),
    );
    let method = Symbol::new(
        "total",
        SymbolKind::Method,
        "app.py",
        Range::new(Position::new(1, 4), Position::new(3, 0)),
    )
    .unwrap()
    .with_parent(class);
    let m = arrivals.create_from(method, "total");
    let f = arrivals.create_from(func("main", 20), "main");

    assert_eq!(label(arrivals.get(m).unwrap()), ".total");
    assert_eq!(label(arrivals.get(f).unwrap()), "main");
}

#[test]
fn test_description_is_one_based() {
    let (arrivals, ids) = forest_of(2);
    let node = arrivals.get(ids[1]).unwrap();
    assert_eq!(description(node, &ReprOptions::default()), "app.py 11:5");

    let only_position = ReprOptions {
        show_filename: false,
        ..ReprOptions::default()
    };
    assert_eq!(description(node, &only_position), "11:5");

    let nothing = ReprOptions {
        show_filename: false,
        show_position: false,
        ..ReprOptions::default()
    };
    assert_eq!(description(node, &nothing), "");
}

// ---------------------------------------------------------------------------
// 4. Decoration and status
// ---------------------------------------------------------------------------
#[test]
fn test_decoration_heat_thresholds() {
    let (mut arrivals, ids) = forest_of(1);
    let colors = ColorOptions::default();

    let cold = decoration(arrivals.get(ids[0]).unwrap(), &colors);
    assert_eq!(cold.badge, "1");
    assert_eq!(cold.heat, None);

    for _ in 0..5 {
        arrivals.encore(ids[0]);
    }
    let warm = decoration(arrivals.get(ids[0]).unwrap(), &colors);
    assert_eq!(warm.badge, "6");
    assert_eq!(warm.heat, Some(Heat::Warm));
    assert_eq!(warm.tooltip, "f0 has been checked for 6 times");

    for _ in 0..5 {
        arrivals.encore(ids[0]);
    }
    let hot = decoration(arrivals.get(ids[0]).unwrap(), &colors);
    assert_eq!(hot.heat, Some(Heat::Hot));

    let plain = ColorOptions {
        colorize: false,
        ..colors
    };
    assert_eq!(decoration(arrivals.get(ids[0]).unwrap(), &plain).heat, None);
}

#[test]
fn test_badge_caps_at_99() {
    let (mut arrivals, ids) = forest_of(1);
    for _ in 0..250 {
        arrivals.encore(ids[0]);
    }
    let deco = decoration(arrivals.get(ids[0]).unwrap(), &ColorOptions::default());
    assert_eq!(deco.badge, "99");
}

#[test]
fn test_status_text_names_hottest() {
    let (mut arrivals, ids) = forest_of(3);
    assert_eq!(status_text(&ArrivalCollection::new()), None);
    arrivals.encore(ids[1]);
    assert_eq!(
        status_text(&arrivals).as_deref(),
        Some("f1 has been checked for 2 times")
    );
}

// ---------------------------------------------------------------------------
// 5. Text rendering
// ---------------------------------------------------------------------------
#[test]
fn test_render_text_indents_children() {
    let (mut arrivals, ids) = forest_of(1);
    let child = arrivals.create_from(func("inner", 50), "inner");
    arrivals.add_child(ids[0], child);
    let options = unfolded();

    let items = to_tree_items(&arrivals, &options);
    let text = render_text(&arrivals, &items, &options, &ColorOptions::default());
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3, "section header plus two arrivals: {text}");
    assert!(lines[1].starts_with("f0 app.py 1:5"), "got: {}", lines[1]);
    assert!(lines[2].starts_with("  inner app.py 51:5"), "got: {}", lines[2]);
}
