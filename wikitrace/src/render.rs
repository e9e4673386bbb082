// Presentation of derived trees and edge lists

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use wikitrace_core::{Edge, PageTitle, RootReason, RootedTree, TreeEntry};

pub const DEFAULT_LABEL_WIDTH: usize = 20;
pub const EMPTY_PLACEHOLDER: &str = "No navigation history yet. Start browsing Wikipedia!";
/// Suffix for a page whose subtree is already shown higher up.
pub const REPEATED_MARKER: &str = "  (see above)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Markdown,
    Csv,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            "markdown" | "md" => Some(OutputFormat::Markdown),
            "csv" => Some(OutputFormat::Csv),
            _ => None,
        }
    }
}

/// Cuts `label` to `max` characters and appends `...` when it is longer.
/// A `max` of zero leaves labels untouched.
pub fn truncate_label(label: &str, max: usize) -> String {
    if max == 0 || label.chars().count() <= max {
        return label.to_string();
    }
    let mut cut: String = label.chars().take(max).collect();
    cut.push_str("...");
    cut
}

pub fn describe_reason(reason: RootReason) -> &'static str {
    match reason {
        RootReason::Unique => "only starting page",
        RootReason::EarliestOfMany => "earliest of several starting pages",
        RootReason::CycleFallback => "earliest page, every page is linked to",
    }
}

fn is_last_child(entries: &[TreeEntry], idx: usize) -> bool {
    match entries[idx].parent {
        None => true,
        Some(parent) => entries[parent].children.last() == Some(&idx),
    }
}

fn join_labels(titles: &[PageTitle], max_label: usize) -> String {
    titles
        .iter()
        .map(|t| truncate_label(t.as_str(), max_label))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Box-drawing rendering of the tree, one line per entry.
pub fn render_tree_text(tree: &RootedTree, max_label: usize) -> String {
    let entries = tree.entries();
    let mut out = String::new();

    for (idx, entry) in entries.iter().enumerate() {
        if let Some(parent) = entry.parent {
            let mut guides = Vec::new();
            let mut ancestor = parent;
            while let Some(grandparent) = entries[ancestor].parent {
                guides.push(if is_last_child(entries, ancestor) {
                    "    "
                } else {
                    "│   "
                });
                ancestor = grandparent;
            }
            for guide in guides.iter().rev() {
                out.push_str(guide);
            }
            out.push_str(if is_last_child(entries, idx) {
                "└── "
            } else {
                "├── "
            });
        }

        out.push_str(&truncate_label(entry.title.as_str(), max_label));
        if entry.repeated {
            out.push_str(REPEATED_MARKER);
        }
        if !entry.back_links.is_empty() {
            out.push_str(&format!("  ↺ {}", join_labels(&entry.back_links, max_label)));
        }
        out.push('\n');
    }

    out.push_str(&render_footnotes(tree, max_label));
    out
}

fn render_footnotes(tree: &RootedTree, max_label: usize) -> String {
    let mut notes = String::new();
    let others = &tree.selection().other_roots;
    if !others.is_empty() {
        notes.push_str(&format!(
            "\n{} other starting page(s) not shown: {}\n",
            others.len(),
            join_labels(others, max_label)
        ));
    }
    // Other roots are unreached by construction; only list the rest
    let stranded: Vec<PageTitle> = tree
        .unreached()
        .iter()
        .filter(|t| !others.contains(t))
        .cloned()
        .collect();
    if !stranded.is_empty() {
        notes.push_str(&format!(
            "\n{} page(s) not reachable from {}: {}\n",
            stranded.len(),
            truncate_label(tree.root().as_str(), max_label),
            join_labels(&stranded, max_label)
        ));
    }
    notes
}

/// Nested bullet list, two spaces of indent per level.
pub fn render_tree_markdown(tree: &RootedTree, max_label: usize) -> String {
    let mut out = String::new();
    out.push_str("# Navigation Tree\n\n");
    for entry in tree.entries() {
        out.push_str(&"  ".repeat(entry.depth));
        out.push_str("- ");
        out.push_str(&truncate_label(entry.title.as_str(), max_label));
        if entry.repeated {
            out.push_str(" _(see above)_");
        }
        if !entry.back_links.is_empty() {
            out.push_str(&format!(
                " _(links back to {})_",
                join_labels(&entry.back_links, max_label)
            ));
        }
        out.push('\n');
    }

    let footnotes = render_footnotes(tree, max_label);
    if !footnotes.is_empty() {
        out.push_str(&footnotes);
    }
    out
}

/// Flat preorder JSON. Labels are never truncated here.
pub fn render_tree_json(tree: &RootedTree) -> Result<String, serde_json::Error> {
    let json_tree = serde_json::json!({
        "metadata": {
            "generator": "wikitrace",
            "version": env!("CARGO_PKG_VERSION"),
            "generated_at": Utc::now().to_rfc3339(),
        },
        "root": tree.root(),
        "selection": tree.selection(),
        "entries": tree.entries(),
        "unreached": tree.unreached(),
    });
    serde_json::to_string_pretty(&json_tree)
}

/// One row of the flat edge listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeRow {
    pub from: String,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_at: Option<DateTime<Utc>>,
}

impl EdgeRow {
    pub fn new(from: &PageTitle, to: &PageTitle) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            observed_at: None,
        }
    }
}

impl From<&Edge> for EdgeRow {
    fn from(edge: &Edge) -> Self {
        Self {
            from: edge.from.to_string(),
            to: edge.to.to_string(),
            observed_at: Some(edge.observed_at),
        }
    }
}

pub fn render_edges_text(rows: &[EdgeRow], max_label: usize) -> String {
    if rows.is_empty() {
        return format!("{}\n", EMPTY_PLACEHOLDER);
    }
    let mut out = String::new();
    for row in rows {
        let when = row
            .observed_at
            .map(|at| format!("{}  ", at.format("%Y-%m-%d %H:%M:%S")))
            .unwrap_or_default();
        out.push_str(&format!(
            "{}{} → {}\n",
            when,
            truncate_label(&row.from, max_label),
            truncate_label(&row.to, max_label)
        ));
    }
    out
}

pub fn render_edges_json(rows: &[EdgeRow]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(rows)
}

pub fn render_edges_csv(rows: &[EdgeRow]) -> String {
    let mut out = String::from("from,to,observed_at\n");
    for row in rows {
        let observed = row.observed_at.map(|at| at.to_rfc3339()).unwrap_or_default();
        out.push_str(&format!(
            "{},{},{}\n",
            csv_field(&row.from),
            csv_field(&row.to),
            observed
        ));
    }
    out
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn save_output(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}
