//! Local state management: the live graph, its undo history and persistence.
//!
//! # Module Organization
//!
//! ```text
//! state/
//! ├── manager     - StateManager: every mutation, load and merge
//! ├── history     - bounded undo stack of whole-graph snapshots
//! ├── persistence - background writer with retry
//! └── config      - EngineConfig
//! ```

mod config;
mod history;
mod manager;
mod persistence;

pub use config::{EngineConfig, DEFAULT_HISTORY_LIMIT};
pub use history::HistoryStack;
pub use manager::{LoadOutcome, StateManager};
pub use persistence::{exponential_backoff, PersistenceStatus, Persister};
