//! Message envelope carried on every hop.
//!
//! # Format
//!
//! ```json
//! {
//!   "type": "GET_DOM_DETAILS",
//!   "data": { ... },
//!   "tabId": 12,
//!   "src": "background",
//!   "id": "550e8400-e29b-41d4-a716-446655440000"
//! }
//! ```
//!
//! `tabID` is accepted as an alias of `tabId` on input. A zero or missing
//! tab id leaves the envelope untargeted.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::identifiers::{RequestId, TabId};

// ============================================================================
// Source
// ============================================================================

/// The context that emitted an envelope.
///
/// Each hop tags what it forwards so that a context never re-forwards a
/// message it just received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Source {
    /// The relay.
    Background,
    /// The page-side bridge.
    ContentScript,
    /// The collector inside the page.
    InjectedScript,
}

// ============================================================================
// Envelope
// ============================================================================

/// Untyped message as it travels between contexts.
///
/// The relay forwards envelopes without looking at `data`; the endpoints
/// decode them into [`Command`](super::Command) or [`Reply`](super::Reply).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Command/response discriminator.
    #[serde(rename = "type")]
    pub kind: String,

    /// Payload.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,

    /// Inspected page.
    #[serde(
        rename = "tabId",
        alias = "tabID",
        default,
        deserialize_with = "lenient_tab_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub tab_id: Option<TabId>,

    /// Sending context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<Source>,

    /// Request correlation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
}

impl Envelope {
    /// Creates an envelope with no payload, source or correlation.
    #[inline]
    #[must_use]
    pub fn new(kind: impl Into<String>, tab_id: Option<TabId>) -> Self {
        Self {
            kind: kind.into(),
            data: Value::Null,
            tab_id,
            src: None,
            id: None,
        }
    }

    /// Sets the payload.
    #[inline]
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// Sets the source tag.
    #[inline]
    #[must_use]
    pub fn with_src(mut self, src: Source) -> Self {
        self.src = Some(src);
        self
    }

    /// Sets the request correlation ID.
    #[inline]
    #[must_use]
    pub fn with_id(mut self, id: Option<RequestId>) -> Self {
        self.id = id;
        self
    }

    /// Returns `true` if the envelope was emitted by `src`.
    #[inline]
    #[must_use]
    pub fn is_from(&self, src: Source) -> bool {
        self.src == Some(src)
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Reads a tab id, mapping `0` and `null` to `None`.
fn lenient_tab_id<'de, D>(deserializer: D) -> Result<Option<TabId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<u32>::deserialize(deserializer)?;
    Ok(raw.and_then(TabId::new))
}

// ============================================================================
// Tests
// ============================================================================
