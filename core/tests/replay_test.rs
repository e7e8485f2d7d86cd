use std::path::Path;

use arrival_core::navigator::Navigator;
use arrival_core::provider::SourceFileProvider;
use arrival_core::replay::{self, ReplayScript, Step};
use arrival_core::view::{ReprOptions, SortOrder};

const APP: &str = r#"def helper():
    return 1

def main():
    return helper()

class Cart:
    def total(self):
        return helper()
"#;

fn write_app(dir: &Path) {
    std::fs::write(dir.join("app.py"), APP).unwrap();
}

fn root_names<P: arrival_core::provider::SymbolProvider>(navigator: &Navigator<P>) -> Vec<String> {
    navigator
        .with_recorder(|recorder| {
            let arrivals = recorder.arrivals();
            arrivals
                .roots()
                .iter()
                .map(|id| arrivals.get(*id).unwrap().symbol().name().to_string())
                .collect()
        })
        .unwrap()
}

// ---------------------------------------------------------------------------
// 1. Script parsing
// ---------------------------------------------------------------------------
#[test]
fn test_parse_all_step_kinds() {
    let script = ReplayScript::parse(
        r#"
[[steps]]
action = "move"
file = "app.py"
line = 5
column = 12

[[steps]]
action = "pin"
symbol = "main"

[[steps]]
action = "delete-other-trees"
symbol = "main"

[[steps]]
action = "unpin-all"

[[steps]]
action = "switch-sort-order"
"#,
    )
    .unwrap();

    assert_eq!(script.steps.len(), 5);
    assert_eq!(
        script.steps[0],
        Step::Move {
            file: "app.py".into(),
            line: 5,
            column: 12
        }
    );
    assert_eq!(script.steps[2], Step::DeleteOtherTrees { symbol: "main".into() });
    assert_eq!(script.steps[3], Step::UnpinAll);
    assert_eq!(script.steps[4], Step::SwitchSortOrder);
}

#[test]
fn test_unknown_action_is_rejected() {
    let err = ReplayScript::parse("[[steps]]\naction = \"teleport\"\n").unwrap_err();
    assert!(format!("{err:#}").contains("replay script"), "got: {err:#}");
}

#[test]
fn test_empty_script() {
    assert!(ReplayScript::parse("").unwrap().steps.is_empty());
}

// ---------------------------------------------------------------------------
// 2. Running
// ---------------------------------------------------------------------------
#[tokio::test]
async fn test_replay_builds_drill_in_tree() {
    let dir = tempfile::tempdir().unwrap();
    write_app(dir.path());
    let script = ReplayScript::parse(
        r#"
[[steps]]
action = "move"
file = "app.py"
line = 5
column = 14

[[steps]]
action = "move"
file = "app.py"
line = 1
column = 6

[[steps]]
action = "move"
file = "app.py"
line = 3
column = 1
"#,
    )
    .unwrap();

    let navigator = Navigator::new(SourceFileProvider::default());
    let mut options = ReprOptions::default();
    let stats = replay::run(&script, dir.path(), &navigator, &mut options)
        .await
        .unwrap();

    assert_eq!(stats.recorded, 2);
    assert_eq!(stats.skipped, 1, "blank line has no word");
    assert_eq!(root_names(&navigator), vec!["main"]);
}

#[tokio::test]
async fn test_replay_commands() {
    let dir = tempfile::tempdir().unwrap();
    write_app(dir.path());
    let script = ReplayScript::parse(
        r#"
[[steps]]
action = "move"
file = "app.py"
line = 1
column = 6

[[steps]]
action = "move"
file = "app.py"
line = 8
column = 10

[[steps]]
action = "pin"
symbol = "Cart"

[[steps]]
action = "delete"
symbol = "missing"

[[steps]]
action = "switch-sort-order"

[[steps]]
action = "unfold"
"#,
    )
    .unwrap();

    let navigator = Navigator::new(SourceFileProvider::default());
    let mut options = ReprOptions::default();
    let stats = replay::run(&script, dir.path(), &navigator, &mut options)
        .await
        .unwrap();

    assert_eq!(stats.recorded, 2);
    assert_eq!(stats.commands, 3);
    assert_eq!(stats.unresolved, 1);
    assert_eq!(options.sort_order, SortOrder::Descending);
    assert!(!options.is_folded);
    assert_eq!(root_names(&navigator), vec!["helper", "Cart"]);
    let pinned = navigator
        .with_recorder(|recorder| recorder.arrivals().pinned_arrivals().len())
        .unwrap();
    assert_eq!(pinned, 1);
}

#[tokio::test]
async fn test_replay_cleanup_resets_history() {
    let dir = tempfile::tempdir().unwrap();
    write_app(dir.path());
    let script = ReplayScript::parse(
        r#"
[[steps]]
action = "move"
file = "app.py"
line = 1
column = 6

[[steps]]
action = "cleanup"
"#,
    )
    .unwrap();

    let navigator = Navigator::new(SourceFileProvider::default());
    let mut options = ReprOptions::default();
    replay::run(&script, dir.path(), &navigator, &mut options)
        .await
        .unwrap();
    assert!(root_names(&navigator).is_empty());
}

#[tokio::test]
async fn test_replay_missing_file_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let script = ReplayScript {
        steps: vec![Step::Move {
            file: "nope.py".into(),
            line: 1,
            column: 1,
        }],
    };
    let navigator = Navigator::new(SourceFileProvider::default());
    let mut options = ReprOptions::default();
    let stats = replay::run(&script, dir.path(), &navigator, &mut options)
        .await
        .unwrap();
    assert_eq!(stats.skipped, 1, "an unreadable file has no word under the cursor");
}
