//! DOM Size Analyzer - page structure inspection for devtools panels.
//!
//! This library measures the size and shape of a page's DOM and reports it
//! to a devtools panel through a background relay.
//!
//! # Architecture
//!
//! Three cooperating components exchange JSON envelopes:
//!
//! - **Collector** (page context): walks the document, returns a node tree
//!   plus aggregate metrics
//! - **Relay** (background): maps each inspected tab to its panel port,
//!   injects the collector and forwards messages both ways
//! - **Panel** (devtools UI): issues commands, renders the tree, exports
//!   JSON/CSV and keeps a snapshot history
//!
//! Key design principles:
//!
//! - Each collection cycle owns its node registry; nothing leaks between runs
//! - Commands and replies are closed enums; unknown commands are rejected
//! - Source tags on every envelope prevent forwarding loops
//! - Panel requests carry an id and time out
//!
//! # Quick Start
//!
//! ```no_run
//! use dom_size_analyzer::{Page, Panel, PanelOptions, Relay, Result, TabId};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let relay = Relay::new();
//!     let Some(tab_id) = TabId::new(1) else {
//!         return Ok(());
//!     };
//!
//!     // Host a page in the tab
//!     relay.open_page(tab_id, Page::parse("<body><ul><li>a</li></ul></body>"));
//!
//!     // Open a panel and analyze
//!     let mut panel = Panel::open(&relay, tab_id, PanelOptions::default())?;
//!     panel.click_analyze().await?;
//!
//!     let view = panel.state().metrics_view();
//!     println!("Total nodes: {}", view.total_nodes);
//!
//!     panel.export_all_to(".").await?;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`collector`] | Page-side DOM walk and metrics |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`page`] | In-memory document model |
//! | [`panel`] | Devtools panel controller |
//! | [`protocol`] | Envelope and command types |
//! | [`relay`] | Background message relay |

// ============================================================================
// Modules
// ============================================================================

/// Page-side DOM collection.
///
/// [`Collector`] answers `GET_DOM_DETAILS` with a [`NodeDescriptor`] tree
/// and a [`MetricsSummary`].
pub mod collector;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// In-memory document model.
pub mod page;

/// Devtools panel controller.
///
/// Use [`Panel::open()`] to attach a panel to a relay.
pub mod panel;

/// Message envelope and command types.
pub mod protocol;

/// Background relay between panels and pages.
pub mod relay;

// ============================================================================
// Re-exports
// ============================================================================

// Collector types
pub use collector::{
    CollectionContext, Collector, DomDetails, HeavyNode, MetricsSummary, NodeDescriptor, NodeKind,
    WarningLevel,
};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{NodeIndex, PortId, RequestId, TabId};

// Page types
pub use page::{Page, PageNode};

// Panel types
pub use panel::{AnalyzeOutcome, Panel, PanelOptions, PanelState};

// Protocol types
pub use protocol::{Command, Envelope, Reply, Source};

// Relay types
pub use relay::{PageContext, PageHost, Relay};
