//! Panel side of a relay port.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::identifiers::PortId;
use crate::protocol::Envelope;

// ============================================================================
// PortHandle
// ============================================================================

/// Bidirectional channel between one panel and the relay.
///
/// Dropping the handle disconnects the port; the relay then removes its
/// mapping unless a newer port has taken over the tab.
pub struct PortHandle {
    /// Port identity as known by the relay.
    id: PortId,
    /// Panel → relay.
    tx: mpsc::UnboundedSender<Envelope>,
    /// Relay → panel.
    rx: mpsc::UnboundedReceiver<Envelope>,
}

impl fmt::Debug for PortHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortHandle")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl PortHandle {
    /// Creates a handle from its channel ends.
    pub(crate) fn new(
        id: PortId,
        tx: mpsc::UnboundedSender<Envelope>,
        rx: mpsc::UnboundedReceiver<Envelope>,
    ) -> Self {
        Self { id, tx, rx }
    }

    /// Returns the port ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> PortId {
        self.id
    }

    /// Posts a message to the relay.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PortClosed`] if the relay side is gone.
    pub fn post(&self, envelope: Envelope) -> Result<()> {
        self.tx.send(envelope).map_err(|_| Error::PortClosed)
    }

    /// Waits for the next message from the relay.
    ///
    /// Returns `None` once the relay side is gone.
    pub async fn recv(&mut self) -> Option<Envelope> {
        self.rx.recv().await
    }
}
