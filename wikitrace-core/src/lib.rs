pub mod config;
pub mod correlator;
pub mod error;
pub mod graph;
pub mod hierarchy;
pub mod model;
pub mod pending;
pub mod store;
pub mod tracker;

pub use config::TrackerConfig;
pub use correlator::{Correlator, DEFAULT_WINDOW_MS};
pub use error::{Result, TraceError};
pub use graph::{EdgeHistory, GraphNode, GraphSnapshot, NavigationGraph};
pub use hierarchy::{HierarchyDeriver, RootReason, RootSelection, RootedTree, TreeEntry};
pub use model::{Edge, PageTitle, Timestamp};
pub use pending::{ConsumeOutcome, EdgeTimeoutMap, PendingIntent};
pub use store::{KeyValueStore, MemoryStore, SqliteStore};
pub use tracker::NavigationTracker;
