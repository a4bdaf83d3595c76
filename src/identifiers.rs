//! Type-safe identifiers for analyzer entities.
//!
//! Newtype wrappers prevent mixing incompatible IDs at compile time.
//!
//! | Type | Wraps | Scope |
//! |------|-------|-------|
//! | [`TabId`] | non-zero `u32` | Inspected page |
//! | [`PortId`] | `u64` | One panel connection to the relay |
//! | [`RequestId`] | UUID v4 | One panel request |
//! | [`NodeIndex`] | `usize` | One node within one collection cycle |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// TabId
// ============================================================================

/// Identifier of an inspected page.
///
/// Zero is not a valid tab; envelopes carrying it are treated as untargeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct TabId(NonZeroU32);

impl TabId {
    /// Creates a tab ID, returning `None` for zero.
    #[inline]
    #[must_use]
    pub fn new(id: u32) -> Option<Self> {
        NonZeroU32::new(id).map(Self)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub fn as_u32(&self) -> u32 {
        self.0.get()
    }
}

impl TryFrom<u32> for TabId {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| "tab id must be non-zero".to_string())
    }
}

impl From<TabId> for u32 {
    #[inline]
    fn from(id: TabId) -> Self {
        id.as_u32()
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// PortId
// ============================================================================

static NEXT_PORT_ID: AtomicU64 = AtomicU64::new(1);

/// Identifier of one panel port.
///
/// Allocated from a process-wide counter, so a reconnecting panel never
/// reuses the ID of the port it replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortId(u64);

impl PortId {
    /// Allocates the next port ID.
    #[inline]
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_PORT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "port-{}", self.0)
    }
}

// ============================================================================
// RequestId
// ============================================================================

/// Correlates a panel request with its reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generates a new random request ID.
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// NodeIndex
// ============================================================================

/// Pre-order position of a node within one collection cycle.
///
/// Only meaningful together with the cycle's
/// [`CollectionContext`](crate::collector::CollectionContext).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeIndex(usize);

impl NodeIndex {
    /// Creates a node index.
    #[inline]
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================
