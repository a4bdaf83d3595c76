//! Message types exchanged between the panel, relay and page contexts.
//!
//! # Protocol Overview
//!
//! | Message | Direction | Purpose |
//! |---------|-----------|---------|
//! | [`Command`] | Panel → Relay → Page | Request |
//! | [`Reply`] | Page → Relay → Panel | Response or rejection |
//!
//! Both travel inside an [`Envelope`]; the relay forwards envelopes without
//! decoding their payload.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Typed command and reply variants |
//! | `envelope` | Wire envelope and source tags |

// ============================================================================
// Submodules
// ============================================================================

/// Typed command and reply variants.
pub mod command;

/// Wire envelope.
pub mod envelope;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{Command, GET_DOM_DETAILS, PING, REJECTED, Rejection, Reply};
pub use envelope::{Envelope, Source};
