//! Typed commands and replies.
//!
//! | Type | Direction | Variants |
//! |------|-----------|----------|
//! | [`Command`] | Panel → Page | `GET_DOM_DETAILS`, `ping` |
//! | [`Reply`] | Page → Panel | `GET_DOM_DETAILS`, `ping`, `REJECTED` |
//!
//! A reply reuses the `type` of the command it answers; a rejection names
//! the offending command in its payload.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::collector::DomDetails;
use crate::error::{Error, Result};
use crate::identifiers::{RequestId, TabId};

use super::Envelope;

// ============================================================================
// Constants
// ============================================================================

/// Collect the DOM tree and metrics.
pub const GET_DOM_DETAILS: &str = "GET_DOM_DETAILS";

/// Liveness check.
pub const PING: &str = "ping";

/// Explicit refusal of a command.
pub const REJECTED: &str = "REJECTED";

// ============================================================================
// Command
// ============================================================================

/// A command sent by the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Walk the page and return the tree plus metrics.
    GetDomDetails,
    /// Return a constant acknowledgement.
    Ping,
}

impl Command {
    /// Returns the wire `type`.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::GetDomDetails => GET_DOM_DETAILS,
            Self::Ping => PING,
        }
    }

    /// Looks up a command by wire `type`.
    #[must_use]
    pub fn from_kind(kind: &str) -> Option<Self> {
        match kind {
            GET_DOM_DETAILS => Some(Self::GetDomDetails),
            PING => Some(Self::Ping),
            _ => None,
        }
    }

    /// Wraps the command for transport.
    #[must_use]
    pub fn into_envelope(self, tab_id: TabId, id: RequestId) -> Envelope {
        Envelope::new(self.kind(), Some(tab_id)).with_id(Some(id))
    }

    /// Decodes a received envelope.
    ///
    /// # Errors
    ///
    /// Returns a [`Rejection`] naming the envelope's `type` when it is not a
    /// known command.
    pub fn from_envelope(envelope: &Envelope) -> std::result::Result<Self, Rejection> {
        Self::from_kind(&envelope.kind).ok_or_else(|| Rejection::unknown_command(&envelope.kind))
    }
}

// ============================================================================
// Rejection
// ============================================================================

/// Payload of a `REJECTED` reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    /// The command `type` that was refused.
    pub command: String,
    /// Human-readable reason.
    pub reason: String,
}

impl Rejection {
    /// Creates a rejection.
    #[inline]
    #[must_use]
    pub fn new(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            reason: reason.into(),
        }
    }

    /// Rejection for a `type` the page does not handle.
    #[inline]
    #[must_use]
    pub fn unknown_command(command: impl Into<String>) -> Self {
        Self::new(command, "unknown command type")
    }
}

impl From<Rejection> for Error {
    fn from(rejection: Rejection) -> Self {
        Error::rejected(rejection.command, rejection.reason)
    }
}

// ============================================================================
// Reply
// ============================================================================

/// A reply produced by the page context.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Collection result.
    DomDetails(Box<DomDetails>),
    /// Acknowledgement of `ping`.
    Pong,
    /// The command was refused.
    Rejected(Rejection),
}

impl Reply {
    /// Returns the wire `type`.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::DomDetails(_) => GET_DOM_DETAILS,
            Self::Pong => PING,
            Self::Rejected(_) => REJECTED,
        }
    }

    /// Wraps the reply for transport.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the payload fails to serialize.
    pub fn into_envelope(self, tab_id: Option<TabId>, id: Option<RequestId>) -> Result<Envelope> {
        let kind = self.kind();
        let data = match self {
            Self::DomDetails(details) => serde_json::to_value(*details)?,
            Self::Pong => Value::Bool(true),
            Self::Rejected(rejection) => serde_json::to_value(rejection)?,
        };

        Ok(Envelope::new(kind, tab_id).with_data(data).with_id(id))
    }

    /// Decodes a received envelope.
    ///
    /// # Errors
    ///
    /// - [`Error::Protocol`] if the `type` is unknown or `ping` is not
    ///   acknowledged with `true`
    /// - [`Error::Json`] if the payload does not match the `type`
    pub fn from_envelope(envelope: Envelope) -> Result<Self> {
        match envelope.kind.as_str() {
            GET_DOM_DETAILS => {
                let details: DomDetails = serde_json::from_value(envelope.data)?;
                Ok(Self::DomDetails(Box::new(details)))
            }
            PING => match envelope.data {
                Value::Bool(true) => Ok(Self::Pong),
                other => Err(Error::protocol(format!("unexpected ping payload: {other}"))),
            },
            REJECTED => Ok(Self::Rejected(serde_json::from_value(envelope.data)?)),
            other => Err(Error::protocol(format!("unknown reply type: {other}"))),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tab() -> TabId {
        TabId::new(1).expect("valid tab id")
    }

    #[test]
    fn test_command_kinds() {
        assert_eq!(Command::GetDomDetails.kind(), "GET_DOM_DETAILS");
        assert_eq!(Command::Ping.kind(), "ping");
        assert_eq!(Command::from_kind("ping"), Some(Command::Ping));
        assert_eq!(Command::from_kind("PING"), None);
    }

    #[test]
    fn test_command_envelope() {
        let id = RequestId::generate();
        let envelope = Command::GetDomDetails.into_envelope(tab(), id);

        assert_eq!(envelope.kind, GET_DOM_DETAILS);
        assert_eq!(envelope.id, Some(id));
        assert!(envelope.data.is_null());
        assert_eq!(Command::from_envelope(&envelope), Ok(Command::GetDomDetails));
    }

    #[test]
    fn test_unknown_command_rejected() {
        let envelope = Envelope::new("HIGHLIGHT", Some(tab()));
        let rejection = Command::from_envelope(&envelope).unwrap_err();

        assert_eq!(rejection.command, "HIGHLIGHT");
        assert_eq!(rejection.reason, "unknown command type");
    }

    #[test]
    fn test_pong_roundtrip() {
        let envelope = Reply::Pong.into_envelope(Some(tab()), None).expect("envelope");
        assert_eq!(envelope.data, json!(true));
        assert_eq!(Reply::from_envelope(envelope).expect("decode"), Reply::Pong);
    }

    #[test]
    fn test_rejected_reply_decodes() {
        let envelope = Envelope::new(REJECTED, Some(tab()))
            .with_data(json!({ "command": "FOO", "reason": "unknown command type" }));

        let reply = Reply::from_envelope(envelope).expect("decode");
        assert_eq!(reply, Reply::Rejected(Rejection::unknown_command("FOO")));
    }

    #[test]
    fn test_malformed_replies() {
        let bad_ping = Envelope::new(PING, None).with_data(json!(false));
        assert!(matches!(
            Reply::from_envelope(bad_ping),
            Err(Error::Protocol { .. })
        ));

        let bad_details = Envelope::new(GET_DOM_DETAILS, None).with_data(json!({ "dom": 1 }));
        assert!(matches!(
            Reply::from_envelope(bad_details),
            Err(Error::Json(_))
        ));

        let unknown = Envelope::new("SOMETHING", None);
        assert!(Reply::from_envelope(unknown).is_err());
    }

    #[test]
    fn test_rejection_into_error() {
        let err: Error = Rejection::unknown_command("X").into();
        assert!(matches!(err, Error::Rejected { .. }));
    }
}
