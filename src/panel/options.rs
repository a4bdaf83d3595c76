//! Panel configuration.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use dom_size_analyzer::panel::PanelOptions;
//!
//! let options = PanelOptions::new()
//!     .with_request_timeout(Duration::from_secs(5))
//!     .with_history_capacity(10)
//!     .without_warm_up();
//!
//! assert!(options.validate().is_ok());
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default time to wait for a reply.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of snapshots kept.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

// ============================================================================
// PanelOptions
// ============================================================================

/// Panel configuration options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelOptions {
    /// Time to wait for a reply before giving up on a request.
    pub request_timeout: Duration,

    /// Snapshot history capacity; the oldest entry is evicted on overflow.
    pub history_capacity: usize,

    /// Send `ping` when the panel opens.
    pub warm_up: bool,
}

// ============================================================================
// Constructors
// ============================================================================

impl PanelOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            warm_up: true,
        }
    }
}

impl Default for PanelOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl PanelOptions {
    /// Sets the reply timeout.
    #[inline]
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the snapshot history capacity.
    #[inline]
    #[must_use]
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Skips the warm-up `ping`.
    #[inline]
    #[must_use]
    pub fn without_warm_up(mut self) -> Self {
        self.warm_up = false;
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl PanelOptions {
    /// Checks the options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a zero timeout or zero capacity.
    pub fn validate(&self) -> Result<()> {
        if self.request_timeout.is_zero() {
            return Err(Error::config("request timeout must be non-zero"));
        }
        if self.history_capacity == 0 {
            return Err(Error::config("history capacity must be non-zero"));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
