use crate::graph::{GraphNode, GraphSnapshot};
use crate::model::PageTitle;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

/// Why a particular page ended up at the top of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RootReason {
    /// The only page nobody navigated into
    Unique,
    /// Several pages without a parent; the earliest visited one wins
    EarliestOfMany,
    /// Every page has a parent; the earliest visited page is used
    CycleFallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RootSelection {
    pub root: PageTitle,
    pub reason: RootReason,
    /// Other parentless pages. They are not rendered under `root`.
    pub other_roots: Vec<PageTitle>,
}

/// One occurrence of a page in the rendered tree. `parent` and `children`
/// are indices into [`RootedTree::entries`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeEntry {
    pub title: PageTitle,
    pub depth: usize,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    /// Links back to a page already on the path from the root. They are not
    /// expanded, which is what keeps cyclic graphs finite.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub back_links: Vec<PageTitle>,
    /// The page's subtree is already shown at an earlier entry; this one is
    /// a leaf that refers back to it.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub repeated: bool,
}

/// A tree projection of the navigation graph, stored in preorder.
///
/// A page reachable along several paths shows up once per path, but only its
/// first occurrence is expanded. Later ones are `repeated` leaves, which keeps
/// the tree no larger than the graph's edge count plus one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootedTree {
    entries: Vec<TreeEntry>,
    selection: RootSelection,
    unreached: Vec<PageTitle>,
}

impl RootedTree {
    pub fn root(&self) -> &PageTitle {
        &self.selection.root
    }

    pub fn selection(&self) -> &RootSelection {
        &self.selection
    }

    /// Pages in the graph that do not appear anywhere in the tree.
    pub fn unreached(&self) -> &[PageTitle] {
        &self.unreached
    }

    /// Entries in preorder; index 0 is the root.
    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Option<&TreeEntry> {
        self.entries.get(index)
    }

    /// Children rendered under the first occurrence of `title`.
    pub fn children_of(&self, title: &str) -> Option<Vec<&PageTitle>> {
        let entry = self.entries.iter().find(|e| e.title.as_str() == title)?;
        Some(
            entry
                .children
                .iter()
                .map(|&idx| &self.entries[idx].title)
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Picks a root for a snapshot and projects the graph onto a tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct HierarchyDeriver;

impl HierarchyDeriver {
    pub fn new() -> Self {
        Self
    }

    /// Returns `None` for an empty snapshot.
    pub fn derive(&self, snapshot: &GraphSnapshot) -> Option<RootedTree> {
        let selection = self.select_root(snapshot)?;
        let entries = expand(snapshot, &selection.root);

        let reached: HashSet<&str> = entries.iter().map(|e| e.title.as_str()).collect();
        let unreached: Vec<PageTitle> = snapshot
            .nodes()
            .filter(|n| !reached.contains(n.title().as_str()))
            .map(|n| n.title().clone())
            .collect();

        debug!(
            "Derived tree rooted at {} ({:?}): {} entries, {} pages unreached",
            selection.root,
            selection.reason,
            entries.len(),
            unreached.len()
        );

        Some(RootedTree {
            entries,
            selection,
            unreached,
        })
    }

    pub fn select_root(&self, snapshot: &GraphSnapshot) -> Option<RootSelection> {
        let has_parent: HashSet<&PageTitle> = snapshot.nodes().flat_map(GraphNode::children).collect();

        let mut candidates: Vec<&GraphNode> = snapshot
            .nodes()
            .filter(|n| !has_parent.contains(n.title()))
            .collect();

        let fallback = candidates.is_empty();
        if fallback {
            candidates = snapshot.nodes().collect();
        }

        candidates.sort_by(|a, b| {
            a.first_seen_at()
                .cmp(&b.first_seen_at())
                .then_with(|| a.title().cmp(b.title()))
        });

        let (root, rest) = candidates.split_first()?;
        let reason = if fallback {
            RootReason::CycleFallback
        } else if rest.is_empty() {
            RootReason::Unique
        } else {
            RootReason::EarliestOfMany
        };
        let other_roots = if fallback {
            Vec::new()
        } else {
            rest.iter().map(|n| n.title().clone()).collect()
        };

        Some(RootSelection {
            root: root.title().clone(),
            reason,
            other_roots,
        })
    }
}

/// Depth-first expansion from `root` with an explicit stack.
fn expand(snapshot: &GraphSnapshot, root: &PageTitle) -> Vec<TreeEntry> {
    let mut entries = vec![TreeEntry {
        title: root.clone(),
        depth: 0,
        parent: None,
        children: Vec::new(),
        back_links: Vec::new(),
        repeated: false,
    }];
    let mut on_path: HashSet<PageTitle> = HashSet::from([root.clone()]);
    let mut expanded: HashSet<PageTitle> = HashSet::from([root.clone()]);
    // (entry index, next child position)
    let mut stack: Vec<(usize, usize)> = vec![(0, 0)];

    while let Some(frame) = stack.last_mut() {
        let (idx, pos) = *frame;
        let children = snapshot
            .node(entries[idx].title.as_str())
            .map(GraphNode::children)
            .unwrap_or(&[]);

        let Some(child) = children.get(pos) else {
            on_path.remove(&entries[idx].title);
            stack.pop();
            continue;
        };
        frame.1 += 1;

        if on_path.contains(child) {
            entries[idx].back_links.push(child.clone());
            continue;
        }

        let repeated = !expanded.insert(child.clone());
        let child_idx = entries.len();
        let depth = entries[idx].depth + 1;
        entries.push(TreeEntry {
            title: child.clone(),
            depth,
            parent: Some(idx),
            children: Vec::new(),
            back_links: Vec::new(),
            repeated,
        });
        entries[idx].children.push(child_idx);
        if !repeated {
            on_path.insert(child.clone());
            stack.push((child_idx, 0));
        }
    }

    entries
}
