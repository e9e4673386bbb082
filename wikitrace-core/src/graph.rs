use crate::error::Result;
use crate::model::{Edge, PageTitle, Timestamp};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    title: PageTitle,
    children: Vec<PageTitle>,
    first_seen_at: Timestamp,
}

impl GraphNode {
    fn new(title: PageTitle, first_seen_at: Timestamp) -> Self {
        Self {
            title,
            children: Vec::new(),
            first_seen_at,
        }
    }

    pub fn title(&self) -> &PageTitle {
        &self.title
    }

    /// Children in the order their edges were first observed.
    pub fn children(&self) -> &[PageTitle] {
        &self.children
    }

    pub fn has_child(&self, title: &str) -> bool {
        self.children.iter().any(|c| c.as_str() == title)
    }

    pub fn first_seen_at(&self) -> Timestamp {
        self.first_seen_at
    }

    fn add_child(&mut self, child: PageTitle) -> bool {
        if self.has_child(child.as_str()) {
            return false;
        }
        self.children.push(child);
        true
    }
}

/// Directed graph of visited pages.
///
/// Every title listed as a child is also a node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationGraph {
    nodes: BTreeMap<PageTitle, GraphNode>,
}

/// Stored shape of a single node.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredNode {
    #[serde(default)]
    children: Vec<String>,
    #[serde(default, alias = "timestamp")]
    first_seen_at: Option<DateTime<Utc>>,
}

impl NavigationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the edge `from -> to`, creating either node if unseen.
    ///
    /// Returns `true` when the edge was not already present. Self-loops are
    /// kept; cycles are dealt with when a hierarchy is derived.
    pub fn add_edge(&mut self, from: &PageTitle, to: &PageTitle, at: Timestamp) -> bool {
        self.ensure_node(to, at);
        let added = self.ensure_node(from, at).add_child(to.clone());
        if added {
            info!("New edge: {} -> {}", from, to);
        } else {
            debug!("Edge {} -> {} already known", from, to);
        }
        added
    }

    pub fn record(&mut self, edge: &Edge) -> bool {
        self.add_edge(&edge.from, &edge.to, edge.observed_at)
    }

    fn ensure_node(&mut self, title: &PageTitle, at: Timestamp) -> &mut GraphNode {
        self.nodes
            .entry(title.clone())
            .or_insert_with(|| GraphNode::new(title.clone(), at))
    }

    pub fn node(&self, title: &str) -> Option<&GraphNode> {
        self.nodes.get(title)
    }

    pub fn contains(&self, title: &str) -> bool {
        self.nodes.contains_key(title)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|n| n.children.len()).sum()
    }

    /// Flat `(from, to)` list, grouped by source title.
    pub fn edges(&self) -> Vec<(&PageTitle, &PageTitle)> {
        self.nodes
            .values()
            .flat_map(|n| n.children.iter().map(move |c| (&n.title, c)))
            .collect()
    }

    pub fn clear(&mut self) {
        info!("Clearing navigation graph ({} nodes)", self.nodes.len());
        self.nodes.clear();
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: Arc::new(self.nodes.clone()),
        }
    }

    pub fn serialize(&self) -> Result<String> {
        let stored: BTreeMap<&str, StoredNode> = self
            .nodes
            .values()
            .map(|n| {
                (
                    n.title.as_str(),
                    StoredNode {
                        children: n.children.iter().map(|c| c.to_string()).collect(),
                        first_seen_at: Some(n.first_seen_at),
                    },
                )
            })
            .collect();
        Ok(serde_json::to_string(&stored)?)
    }

    /// Rebuilds a graph from its stored form.
    ///
    /// Never fails: a missing or unreadable blob yields an empty graph, empty
    /// titles are dropped, and any child without its own entry gets a
    /// placeholder node stamped with its parent's `first_seen_at`.
    pub fn deserialize(blob: Option<&str>) -> Self {
        let Some(blob) = blob else {
            return Self::new();
        };
        let stored: BTreeMap<String, StoredNode> = match serde_json::from_str(blob) {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Discarding unreadable navigation graph: {}", e);
                return Self::new();
            }
        };

        let mut graph = Self::new();
        for (title, node) in &stored {
            let Ok(title) = PageTitle::new(title.as_str()) else {
                warn!("Skipping stored node with an empty title");
                continue;
            };
            let at = node.first_seen_at.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
            graph.ensure_node(&title, at);
        }

        for (title, node) in stored {
            let Ok(title) = PageTitle::new(title) else {
                continue;
            };
            let parent_seen = graph
                .node(title.as_str())
                .map(GraphNode::first_seen_at)
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
            for child in node.children {
                let Ok(child) = PageTitle::new(child) else {
                    warn!("Skipping empty child title under {}", title);
                    continue;
                };
                graph.ensure_node(&child, parent_seen);
                graph.ensure_node(&title, parent_seen).add_child(child);
            }
        }

        debug!(
            "Loaded navigation graph: {} nodes, {} edges",
            graph.len(),
            graph.edge_count()
        );
        graph
    }
}

/// Read-only copy of a [`NavigationGraph`], cheap to clone and hand around
/// while the live graph keeps changing.
#[derive(Debug, Clone, Default)]
pub struct GraphSnapshot {
    nodes: Arc<BTreeMap<PageTitle, GraphNode>>,
}

impl GraphSnapshot {
    pub fn node(&self, title: &str) -> Option<&GraphNode> {
        self.nodes.get(title)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Append-only log of every confirmed edge, repeats included.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeHistory {
    entries: Vec<Edge>,
}

impl EdgeHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, edge: Edge) {
        self.entries.push(edge);
    }

    pub fn entries(&self) -> &[Edge] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn serialize(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn deserialize(blob: Option<&str>) -> Self {
        let Some(blob) = blob else {
            return Self::new();
        };
        match serde_json::from_str(blob) {
            Ok(history) => history,
            Err(e) => {
                warn!("Discarding unreadable navigation history: {}", e);
                Self::new()
            }
        }
    }
}
