//! Error types for the DOM size analyzer.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use dom_size_analyzer::{Result, Error};
//!
//! async fn example(panel: &mut Panel) -> Result<()> {
//!     panel.click_analyze().await?;
//!     panel.export_json_to("dom-analyzer.json").await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Relay | [`Error::InvalidPortName`], [`Error::PortClosed`], [`Error::TabNotFound`] |
//! | Page context | [`Error::AlreadyInjected`], [`Error::NotInjected`] |
//! | Protocol | [`Error::Protocol`], [`Error::Rejected`] |
//! | Panel | [`Error::RequestInFlight`], [`Error::RequestTimeout`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::Csv`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;

use crate::identifiers::{RequestId, TabId};

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when panel options are invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Relay Errors
    // ========================================================================
    /// A panel tried to connect with an unexpected port name.
    #[error("Invalid port name: {name}")]
    InvalidPortName {
        /// The rejected port name.
        name: String,
    },

    /// The panel port was closed by the other side.
    #[error("Port closed")]
    PortClosed,

    /// No page context is attached for the tab.
    #[error("Tab not found: {tab_id}")]
    TabNotFound {
        /// The missing tab ID.
        tab_id: TabId,
    },

    // ========================================================================
    // Page Context Errors
    // ========================================================================
    /// The collector is already installed in the page.
    ///
    /// The relay treats this as success.
    #[error("Collector already injected in tab {tab_id}")]
    AlreadyInjected {
        /// Tab holding the collector.
        tab_id: TabId,
    },

    /// A command reached a page whose collector was never installed.
    #[error("Collector not injected in tab {tab_id}")]
    NotInjected {
        /// Tab lacking the collector.
        tab_id: TabId,
    },

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Protocol violation or unexpected message.
    ///
    /// Returned when an envelope cannot be decoded into a known shape.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    /// The page context rejected a command.
    #[error("Command {command} rejected: {reason}")]
    Rejected {
        /// The command type as sent.
        command: String,
        /// Reason given by the page context.
        reason: String,
    },

    // ========================================================================
    // Panel Errors
    // ========================================================================
    /// A request is already awaiting its reply.
    #[error("A request is already in flight")]
    RequestInFlight,

    /// Request timed out waiting for its reply.
    #[error("Request {request_id} timed out after {timeout_ms}ms")]
    RequestTimeout {
        /// The request ID that timed out.
        request_id: RequestId,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV serialization error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv_async::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid port name error.
    #[inline]
    pub fn invalid_port_name(name: impl Into<String>) -> Self {
        Self::InvalidPortName { name: name.into() }
    }

    /// Creates a tab not found error.
    #[inline]
    pub fn tab_not_found(tab_id: TabId) -> Self {
        Self::TabNotFound { tab_id }
    }

    /// Creates an already injected error.
    #[inline]
    pub fn already_injected(tab_id: TabId) -> Self {
        Self::AlreadyInjected { tab_id }
    }

    /// Creates a not injected error.
    #[inline]
    pub fn not_injected(tab_id: TabId) -> Self {
        Self::NotInjected { tab_id }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a rejected command error.
    #[inline]
    pub fn rejected(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            command: command.into(),
            reason: reason.into(),
        }
    }

    /// Creates a request timeout error.
    #[inline]
    pub fn request_timeout(request_id: RequestId, timeout_ms: u64) -> Self {
        Self::RequestTimeout {
            request_id,
            timeout_ms,
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::RequestTimeout { .. })
    }

    /// Returns `true` if the relay side of the port is gone.
    #[inline]
    #[must_use]
    pub fn is_channel_error(&self) -> bool {
        matches!(self, Self::PortClosed)
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors may succeed on retry.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::RequestTimeout { .. } | Self::RequestInFlight | Self::AlreadyInjected { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
