pub mod handlers;
pub mod render;

pub use handlers::{
    GlobalOptions, ReplaySummary, collect_edge_rows, open_tracker, replay_events,
    resolve_load_title, resolve_target,
};
pub use render::{OutputFormat, truncate_label};
