use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::arrival::{ArrivalCollection, ArrivalId};
use crate::navigator::{Cursor, NavigationOutcome, Navigator};
use crate::provider::SymbolProvider;
use crate::symbol::Position;
use crate::view::ReprOptions;

// ---------------------------------------------------------------------------
// Script format
// ---------------------------------------------------------------------------

/// A recorded editor session:
///
/// ```toml
/// [[steps]]
/// action = "move"
/// file = "src/lib.rs"
/// line = 12
/// column = 8
///
/// [[steps]]
/// action = "pin"
/// symbol = "parse"
/// ```
///
/// `line` and `column` are 1-based; `file` is relative to the script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReplayScript {
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Step {
    Move { file: PathBuf, line: u32, column: u32 },
    Pin { symbol: String },
    Unpin { symbol: String },
    Delete { symbol: String },
    DeleteOtherTrees { symbol: String },
    UnpinAll,
    Cleanup,
    SwitchSortOrder,
    SwitchSortField,
    Fold,
    Unfold,
}

impl ReplayScript {
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("failed to parse replay script")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read replay script {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid replay script {}", path.display()))
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayStats {
    pub recorded: usize,
    pub skipped: usize,
    pub stale: usize,
    pub commands: usize,
    /// Commands naming a symbol that is not in the history.
    pub unresolved: usize,
}

/// Play `script` against `navigator`. Moves go through the provider; the
/// other steps act on the recorder or on `options` the way the tree view's
/// commands would.
pub async fn run<P: SymbolProvider>(
    script: &ReplayScript,
    base_dir: &Path,
    navigator: &Navigator<P>,
    options: &mut ReprOptions,
) -> Result<ReplayStats> {
    let mut stats = ReplayStats::default();

    for (index, step) in script.steps.iter().enumerate() {
        match step {
            Step::Move { file, line, column } => {
                let path = base_dir.join(file);
                let cursor = Cursor::new(
                    path.to_string_lossy(),
                    Position::new(line.saturating_sub(1), column.saturating_sub(1)),
                );
                let outcome = navigator
                    .on_cursor_moved(&cursor)
                    .await
                    .with_context(|| format!("step {}: move to {}", index + 1, path.display()))?;
                match outcome {
                    NavigationOutcome::Recorded(_) => stats.recorded += 1,
                    NavigationOutcome::Skipped => stats.skipped += 1,
                    NavigationOutcome::Stale => stats.stale += 1,
                }
            }
            Step::SwitchSortOrder => {
                options.sort_order = options.sort_order.toggled();
                stats.commands += 1;
            }
            Step::SwitchSortField => {
                options.sort_field = options.sort_field.toggled();
                stats.commands += 1;
            }
            Step::Fold => {
                options.is_folded = true;
                stats.commands += 1;
            }
            Step::Unfold => {
                options.is_folded = false;
                stats.commands += 1;
            }
            Step::Cleanup => {
                navigator.with_recorder(|recorder| recorder.clear())?;
                stats.commands += 1;
            }
            command => {
                let resolved = navigator
                    .with_recorder(|recorder| apply_command(recorder.arrivals_mut(), command))?;
                if resolved {
                    stats.commands += 1;
                } else {
                    tracing::warn!(step = index + 1, ?command, "command target not found in history");
                    stats.unresolved += 1;
                }
            }
        }
    }

    tracing::info!(
        recorded = stats.recorded,
        skipped = stats.skipped,
        stale = stats.stale,
        commands = stats.commands,
        "replay complete"
    );
    Ok(stats)
}

/// Forest commands. Returns false when the named symbol is not recorded.
fn apply_command(arrivals: &mut ArrivalCollection, step: &Step) -> bool {
    match step {
        Step::Pin { symbol } | Step::Unpin { symbol } => {
            let pinned = matches!(step, Step::Pin { .. });
            let Some(tracing_id) = find_by_name(arrivals, symbol)
                .and_then(|id| arrivals.get(id))
                .map(|node| node.symbol().tracing_id())
            else {
                return false;
            };
            arrivals.set_arrival_pin_state(&tracing_id, pinned)
        }
        Step::Delete { symbol } => find_by_name(arrivals, symbol).is_some_and(|id| arrivals.delete(id)),
        Step::DeleteOtherTrees { symbol } => {
            find_by_name(arrivals, symbol).is_some_and(|id| arrivals.delete_other_trees(id))
        }
        Step::UnpinAll => {
            arrivals.unpin_all();
            true
        }
        Step::Move { .. }
        | Step::Cleanup
        | Step::SwitchSortOrder
        | Step::SwitchSortField
        | Step::Fold
        | Step::Unfold => true,
    }
}

/// Last arrival in pre-order whose symbol is called `name`.
fn find_by_name(arrivals: &ArrivalCollection, name: &str) -> Option<ArrivalId> {
    arrivals
        .all_arrivals()
        .into_iter()
        .rev()
        .find(|id| arrivals.get(*id).is_some_and(|node| node.symbol().name() == name))
}
