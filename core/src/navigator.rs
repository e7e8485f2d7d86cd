use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};

use crate::arrival::ArrivalId;
use crate::provider::SymbolProvider;
use crate::recorder::ArrivalRecorder;
use crate::symbol::Position;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    pub document: String,
    pub position: Position,
}

impl Cursor {
    pub fn new(document: impl Into<String>, position: Position) -> Self {
        Self {
            document: document.into(),
            position,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    Recorded(ArrivalId),
    /// No word or no symbol under the cursor.
    Skipped,
    /// A newer cursor event was dispatched while this one was resolving.
    Stale,
}

/// Feeds cursor-move events through a symbol provider into the recorder.
///
/// Symbol extraction is asynchronous, so events can resolve out of order.
/// Each event takes a sequence number when dispatched and is dropped if a
/// newer one was dispatched before its symbol came back; only the latest
/// cursor position ever reaches the forest.
pub struct Navigator<P> {
    provider: P,
    recorder: Mutex<ArrivalRecorder>,
    dispatched: AtomicU64,
}

impl<P: SymbolProvider> Navigator<P> {
    pub fn new(provider: P) -> Self {
        Self::with_history(provider, ArrivalRecorder::default())
    }

    pub fn with_history(provider: P, recorder: ArrivalRecorder) -> Self {
        Self {
            provider,
            recorder: Mutex::new(recorder),
            dispatched: AtomicU64::new(0),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub async fn on_cursor_moved(&self, cursor: &Cursor) -> Result<NavigationOutcome> {
        let seq = self.dispatched.fetch_add(1, Ordering::SeqCst) + 1;

        let Some((word, symbol)) = self
            .provider
            .resolve(&cursor.document, cursor.position)
            .await?
        else {
            tracing::trace!(document = %cursor.document, "no word or symbol under cursor");
            return Ok(NavigationOutcome::Skipped);
        };

        let latest = self.dispatched.load(Ordering::SeqCst);
        if latest != seq {
            tracing::debug!(seq, latest, symbol = %symbol.name(), "dropping stale cursor event");
            return Ok(NavigationOutcome::Stale);
        }

        let id = self.with_recorder(|recorder| recorder.record(symbol, word))?;
        Ok(NavigationOutcome::Recorded(id))
    }

    /// Exclusive access to the recorder for UI commands.
    pub fn with_recorder<T>(&self, f: impl FnOnce(&mut ArrivalRecorder) -> T) -> Result<T> {
        let mut recorder = self
            .recorder
            .lock()
            .map_err(|e| anyhow!("recorder lock poisoned: {e}"))?;
        Ok(f(&mut recorder))
    }
}
