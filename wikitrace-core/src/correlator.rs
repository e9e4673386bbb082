use crate::model::{Edge, PageTitle, Timestamp};
use crate::pending::{ConsumeOutcome, EdgeTimeoutMap};
use chrono::TimeDelta;
use tracing::debug;

/// Default time allowed between a click and the matching page load.
pub const DEFAULT_WINDOW_MS: u64 = 10_000;

/// Pairs "user started a navigation" signals with "page finished loading"
/// signals and emits an [`Edge`] for each confirmed pair.
///
/// Pages reached without a tracked intent (bookmarks, the back button, typed
/// URLs, external referrals) produce no edge.
#[derive(Debug, Clone)]
pub struct Correlator {
    pending: EdgeTimeoutMap,
    window: TimeDelta,
}

impl Correlator {
    pub fn new(window: TimeDelta) -> Self {
        Self::with_pending(EdgeTimeoutMap::new(), window)
    }

    pub fn with_window_ms(window_ms: u64) -> Self {
        Self::new(window_from_ms(window_ms))
    }

    pub fn with_pending(pending: EdgeTimeoutMap, window: TimeDelta) -> Self {
        Self { pending, window }
    }

    pub fn window(&self) -> TimeDelta {
        self.window
    }

    pub fn pending(&self) -> &EdgeTimeoutMap {
        &self.pending
    }

    /// Swaps in pending state read back from a store.
    pub fn hydrate(&mut self, pending: EdgeTimeoutMap) {
        self.pending = pending;
    }

    pub fn reset(&mut self) {
        self.pending.clear();
    }

    pub fn on_intent_observed(&mut self, origin_title: PageTitle, target: &str, now: Timestamp) {
        debug!("Intent observed: {} -> {}", origin_title, target);
        self.pending.record(target, origin_title, now);
    }

    /// Handles a finished page load. `title` is the loaded page's title as
    /// extracted by the host.
    pub fn on_completion_observed(
        &mut self,
        url: &str,
        title: PageTitle,
        now: Timestamp,
    ) -> Option<Edge> {
        match self.pending.try_consume(url, now, self.window) {
            ConsumeOutcome::Matched(intent) => {
                let edge = Edge::new(intent.origin_title, title, now);
                debug!("Completion of {} confirmed edge {}", url, edge);
                Some(edge)
            }
            ConsumeOutcome::Expired(intent) => {
                debug!(
                    "Completion of {} ignored, intent from {} expired",
                    url, intent.origin_title
                );
                None
            }
            ConsumeOutcome::NotFound => {
                debug!("Completion of {} has no tracked intent", url);
                None
            }
        }
    }
}

impl Default for Correlator {
    fn default() -> Self {
        Self::with_window_ms(DEFAULT_WINDOW_MS)
    }
}

pub(crate) fn window_from_ms(window_ms: u64) -> TimeDelta {
    i64::try_from(window_ms)
        .ok()
        .and_then(TimeDelta::try_milliseconds)
        .unwrap_or(TimeDelta::MAX)
}
