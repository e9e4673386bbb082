use crate::config::TrackerConfig;
use crate::correlator::Correlator;
use crate::error::Result;
use crate::graph::{EdgeHistory, GraphSnapshot, NavigationGraph};
use crate::hierarchy::{HierarchyDeriver, RootedTree};
use crate::model::{Edge, PageTitle, Timestamp};
use crate::pending::EdgeTimeoutMap;
use crate::store::KeyValueStore;
use tracing::{debug, info};

pub const GRAPH_KEY: &str = "navigationGraph";
pub const PENDING_KEY: &str = "pendingIntents";
pub const HISTORY_KEY: &str = "navigationHistory";

/// Wires the correlator to a store.
///
/// Every event runs inside one [`KeyValueStore::atomically`] unit that
/// re-reads what is stored and merges into it, so several trackers sharing
/// one store (one per tab, or one per process) keep each other's edges and
/// pending intents.
pub struct NavigationTracker<S: KeyValueStore> {
    store: S,
    correlator: Correlator,
    config: TrackerConfig,
}

impl<S: KeyValueStore> NavigationTracker<S> {
    pub fn new(store: S, config: TrackerConfig) -> Result<Self> {
        let mut tracker = Self {
            store,
            correlator: Correlator::new(config.window()),
            config,
        };
        hydrate_pending(&tracker.store, &mut tracker.correlator, &tracker.config)?;
        Ok(tracker)
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn pending(&self) -> &EdgeTimeoutMap {
        self.correlator.pending()
    }

    pub fn on_intent(&mut self, origin: PageTitle, target: &str, now: Timestamp) -> Result<()> {
        let Self {
            store,
            correlator,
            config,
        } = self;
        store.atomically(|store| {
            hydrate_pending(store, correlator, config)?;
            correlator.on_intent_observed(origin, target, now);
            persist_pending(store, correlator, config)
        })
    }

    /// Feeds a finished page load through the correlator and stores the
    /// resulting edge, if any.
    pub fn on_completion(
        &mut self,
        url: &str,
        title: PageTitle,
        now: Timestamp,
    ) -> Result<Option<Edge>> {
        let Self {
            store,
            correlator,
            config,
        } = self;
        store.atomically(|store| {
            hydrate_pending(store, correlator, config)?;
            let edge = correlator.on_completion_observed(url, title, now);
            persist_pending(store, correlator, config)?;

            if let Some(ref edge) = edge {
                merge_edge(store, edge, config)?;
            }
            Ok(edge)
        })
    }

    pub fn load_graph(&self) -> Result<NavigationGraph> {
        let blob = self.store.get(GRAPH_KEY)?;
        Ok(NavigationGraph::deserialize(blob.as_deref()))
    }

    pub fn snapshot(&self) -> Result<GraphSnapshot> {
        Ok(self.load_graph()?.snapshot())
    }

    pub fn history(&self) -> Result<EdgeHistory> {
        let blob = self.store.get(HISTORY_KEY)?;
        Ok(EdgeHistory::deserialize(blob.as_deref()))
    }

    /// Re-reads the stored graph and derives a fresh tree from it.
    pub fn refresh(&self) -> Result<Option<RootedTree>> {
        let snapshot = self.snapshot()?;
        debug!("Refreshing tree from {} stored pages", snapshot.len());
        Ok(HierarchyDeriver::new().derive(&snapshot))
    }

    /// Forgets every page, edge and pending intent.
    pub fn clear_history(&mut self) -> Result<()> {
        self.store.atomically(|store| {
            let mut graph = NavigationGraph::deserialize(store.get(GRAPH_KEY)?.as_deref());
            graph.clear();
            store.set(GRAPH_KEY, &graph.serialize()?)?;
            store.remove(HISTORY_KEY)?;
            store.remove(PENDING_KEY)
        })?;
        self.correlator.reset();
        info!("Navigation history cleared");
        Ok(())
    }
}

fn merge_edge<S: KeyValueStore>(store: &mut S, edge: &Edge, config: &TrackerConfig) -> Result<()> {
    let mut graph = NavigationGraph::deserialize(store.get(GRAPH_KEY)?.as_deref());
    graph.record(edge);
    store.set(GRAPH_KEY, &graph.serialize()?)?;

    if config.keep_history {
        let mut history = EdgeHistory::deserialize(store.get(HISTORY_KEY)?.as_deref());
        history.push(edge.clone());
        store.set(HISTORY_KEY, &history.serialize()?)?;
    }
    Ok(())
}

fn hydrate_pending<S: KeyValueStore>(
    store: &S,
    correlator: &mut Correlator,
    config: &TrackerConfig,
) -> Result<()> {
    if !config.persist_pending {
        return Ok(());
    }
    let blob = store.get(PENDING_KEY)?;
    correlator.hydrate(EdgeTimeoutMap::deserialize(blob.as_deref()));
    Ok(())
}

fn persist_pending<S: KeyValueStore>(
    store: &mut S,
    correlator: &Correlator,
    config: &TrackerConfig,
) -> Result<()> {
    if !config.persist_pending {
        return Ok(());
    }
    let pending = correlator.pending();
    if pending.is_empty() {
        store.remove(PENDING_KEY)
    } else {
        store.set(PENDING_KEY, &pending.serialize()?)
    }
}
