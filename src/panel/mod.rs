//! Devtools panel controller.
//!
//! The panel issues commands through its relay port, renders the returned
//! tree and metrics, exports them and keeps a bounded snapshot history.
//!
//! # Example
//!
//! ```no_run
//! use dom_size_analyzer::panel::{Panel, PanelOptions};
//! use dom_size_analyzer::page::Page;
//! use dom_size_analyzer::relay::Relay;
//! use dom_size_analyzer::TabId;
//!
//! # async fn example() -> dom_size_analyzer::Result<()> {
//! let relay = Relay::new();
//! let Some(tab_id) = TabId::new(1) else {
//!     return Ok(());
//! };
//! relay.open_page(tab_id, Page::parse("<body><div></div></body>"));
//!
//! let mut panel = Panel::open(&relay, tab_id, PanelOptions::default())?;
//! panel.click_analyze().await?;
//!
//! if let Some(tree) = panel.state().tree() {
//!     print!("{tree}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `core` | [`Panel`] and its request cycle |
//! | `state` | Transport-free [`PanelState`] |
//! | `tree` | Filterable tree model |
//! | `view` | Metrics pane model |
//! | `history` | Snapshots and comparison |
//! | `export` | JSON and CSV exports |
//! | `options` | [`PanelOptions`] |

// ============================================================================
// Submodules
// ============================================================================

mod core;

/// JSON and CSV exports.
pub mod export;

/// Snapshot history.
pub mod history;

/// Panel configuration.
pub mod options;

/// Panel UI state.
pub mod state;

/// Tree model.
pub mod tree;

/// Metrics view model.
pub mod view;

// ============================================================================
// Re-exports
// ============================================================================

pub use core::{AnalyzeOutcome, Panel};
pub use history::{Snapshot, SnapshotDiff, SnapshotHistory};
pub use options::PanelOptions;
pub use state::{AnalyzeAction, AnalyzeButton, PanelState};
pub use tree::{Heaviness, TreeFilter, TreeItem, build_tree};
pub use view::{MetricsView, TagEntry};
