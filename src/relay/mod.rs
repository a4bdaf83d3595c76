//! Message relay between panels and pages.
//!
//! The relay plays the extension background role: it owns the map from
//! inspected tab to the panel port that inspects it, forwards panel commands
//! into the page and page replies back to the panel.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐  PortHandle   ┌──────────────────────────┐  deliver   ┌──────────┐
//! │  Panel   │──────────────►│          Relay           │───────────►│ PageHost │
//! │          │◄──────────────│  TabId=1 → port-3        │◄───────────│ (tab 1)  │
//! └──────────┘               │  TabId=2 → port-4        │ PageSender └──────────┘
//!                            └──────────────────────────┘
//! ```
//!
//! # Routing Rules
//!
//! - Panel messages without a tab id are ignored
//! - A panel message (re)maps its tab to the sending port
//! - Injection is best effort; an already present collector is fine
//! - Page messages for a tab without a port are dropped
//! - A disconnecting port only removes the mapping if it still owns it
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `host` | Page contexts and the in-process [`PageHost`] |
//! | `port` | Panel side of a port |

// ============================================================================
// Submodules
// ============================================================================

/// Page contexts reachable from the relay.
pub mod host;

/// Panel side of a relay port.
pub mod port;

// ============================================================================
// Imports
// ============================================================================

use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::identifiers::{PortId, TabId};
use crate::page::Page;
use crate::protocol::{Envelope, Rejection, Reply, Source};

// ============================================================================
// Re-exports
// ============================================================================

pub use host::{PageContext, PageHost, PageSender};
pub use port::PortHandle;

// ============================================================================
// Constants
// ============================================================================

/// The only port name the relay accepts.
pub const PORT_NAME: &str = "dom-size-analyzer:devtools";

// ============================================================================
// PanelPort
// ============================================================================

/// Relay side of a port.
#[derive(Debug, Clone)]
struct PanelPort {
    /// Port identity, used to guard stale disconnects.
    id: PortId,
    /// Relay → panel.
    tx: mpsc::UnboundedSender<Envelope>,
}

impl PanelPort {
    /// Posts to the panel, returning `false` if it is gone.
    fn post(&self, envelope: Envelope) -> bool {
        self.tx.send(envelope).is_ok()
    }
}

// ============================================================================
// Relay
// ============================================================================

/// Routes envelopes between panel ports and page contexts.
///
/// Thread-safe; locks are only held for map operations.
pub struct Relay {
    /// Inspected tab → panel port.
    ports: RwLock<FxHashMap<TabId, PanelPort>>,

    /// Reachable pages.
    pages: RwLock<FxHashMap<TabId, Arc<dyn PageContext>>>,

    /// Handed to pages for their outbound messages.
    page_tx: PageSender,
}

// ============================================================================
// Relay - Constructor
// ============================================================================

impl Relay {
    /// Creates a relay and starts its page inbound loop.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn new() -> Arc<Self> {
        let (page_tx, page_rx) = mpsc::unbounded_channel();

        let relay = Arc::new(Self {
            ports: RwLock::new(FxHashMap::default()),
            pages: RwLock::new(FxHashMap::default()),
            page_tx,
        });

        tokio::spawn(Self::run_page_inbound(Arc::downgrade(&relay), page_rx));

        info!("Relay started");
        relay
    }
}

// ============================================================================
// Relay - Pages
// ============================================================================

impl Relay {
    /// Returns a sender pages use to reach the relay.
    #[inline]
    #[must_use]
    pub fn page_sender(&self) -> PageSender {
        self.page_tx.clone()
    }

    /// Makes a page reachable, replacing any page of the same tab.
    pub fn attach_page(&self, page: Arc<dyn PageContext>) {
        let tab_id = page.tab_id();
        self.pages.write().insert(tab_id, page);
        debug!(tab_id = %tab_id, "Page attached");
    }

    /// Hosts `page` in-process under `tab_id` and attaches it.
    pub fn open_page(&self, tab_id: TabId, page: Page) -> Arc<PageHost> {
        let host = Arc::new(PageHost::new(tab_id, page, self.page_sender()));
        self.attach_page(Arc::clone(&host) as Arc<dyn PageContext>);
        host
    }

    /// Removes a page.
    pub fn detach_page(&self, tab_id: TabId) -> Option<Arc<dyn PageContext>> {
        let removed = self.pages.write().remove(&tab_id);
        if removed.is_some() {
            debug!(tab_id = %tab_id, "Page detached");
        }
        removed
    }

    /// Returns the page of a tab.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TabNotFound`] if no page is attached for the tab.
    pub fn page(&self, tab_id: TabId) -> Result<Arc<dyn PageContext>> {
        self.pages
            .read()
            .get(&tab_id)
            .cloned()
            .ok_or_else(|| Error::tab_not_found(tab_id))
    }

    /// Returns the number of reachable pages.
    #[inline]
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.read().len()
    }
}

// ============================================================================
// Relay - Ports
// ============================================================================

impl Relay {
    /// Opens a port for a panel.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPortName`] unless `name` is [`PORT_NAME`].
    pub fn connect(self: &Arc<Self>, name: &str) -> Result<PortHandle> {
        if name != PORT_NAME {
            warn!(name, "Rejected port with unexpected name");
            return Err(Error::invalid_port_name(name));
        }

        let id = PortId::next();
        let (to_relay_tx, to_relay_rx) = mpsc::unbounded_channel();
        let (to_panel_tx, to_panel_rx) = mpsc::unbounded_channel();

        let port = PanelPort {
            id,
            tx: to_panel_tx,
        };
        tokio::spawn(Self::run_port(Arc::downgrade(self), port, to_relay_rx));

        debug!(port_id = %id, "Panel port connected");
        Ok(PortHandle::new(id, to_relay_tx, to_panel_rx))
    }

    /// Returns the port currently mapped to a tab.
    #[must_use]
    pub fn port_for(&self, tab_id: TabId) -> Option<PortId> {
        self.ports.read().get(&tab_id).map(|port| port.id)
    }

    /// Returns the number of mapped tabs.
    #[inline]
    #[must_use]
    pub fn port_count(&self) -> usize {
        self.ports.read().len()
    }
}

// ============================================================================
// Relay - Routing
// ============================================================================

impl Relay {
    /// Forwards a page message to the panel inspecting its tab.
    ///
    /// Returns `true` if a panel received it. Messages for tabs without a
    /// port are dropped.
    pub fn route_page_message(&self, envelope: Envelope) -> bool {
        let Some(tab_id) = envelope.tab_id else {
            debug!(kind = %envelope.kind, "Dropping page message without tab");
            return false;
        };

        let port = self.ports.read().get(&tab_id).cloned();
        match port {
            Some(port) => {
                let delivered = port.post(envelope);
                if !delivered {
                    debug!(tab_id = %tab_id, port_id = %port.id, "Panel gone, page message dropped");
                }
                delivered
            }
            None => {
                debug!(tab_id = %tab_id, kind = %envelope.kind, "No panel for tab, page message dropped");
                false
            }
        }
    }

    /// Handles one message from a panel port.
    fn on_port_message(
        &self,
        port: &PanelPort,
        envelope: Envelope,
        attached: &mut FxHashSet<TabId>,
    ) {
        let Some(tab_id) = envelope.tab_id else {
            debug!(port_id = %port.id, "Ignoring panel message without tab");
            return;
        };

        attached.insert(tab_id);
        self.ports.write().insert(tab_id, port.clone());

        let page = match self.page(tab_id) {
            Ok(page) => page,
            Err(e) => {
                warn!(kind = %envelope.kind, error = %e, "No page for tab");
                self.reject(port, &envelope, "no page for tab");
                return;
            }
        };

        if let Err(e) = page.inject() {
            debug!(tab_id = %tab_id, error = %e, "Injection skipped");
        }

        let kind = envelope.kind.clone();
        if let Err(e) = page.deliver(envelope.with_src(Source::Background)) {
            debug!(tab_id = %tab_id, kind = %kind, error = %e, "Delivery failed");
        }
    }

    /// Answers a panel message with a rejection.
    fn reject(&self, port: &PanelPort, envelope: &Envelope, reason: &str) {
        let rejection = Rejection::new(envelope.kind.clone(), reason);
        match Reply::Rejected(rejection).into_envelope(envelope.tab_id, envelope.id) {
            Ok(reply) => {
                port.post(reply.with_src(Source::Background));
            }
            Err(e) => debug!(error = %e, "Failed to encode rejection"),
        }
    }

    /// Removes the tab mapping if `port_id` still owns it.
    fn on_port_disconnect(&self, tab_id: TabId, port_id: PortId) {
        let mut ports = self.ports.write();
        if ports.get(&tab_id).is_some_and(|port| port.id == port_id) {
            ports.remove(&tab_id);
            debug!(tab_id = %tab_id, port_id = %port_id, "Panel port disconnected");
        } else {
            debug!(tab_id = %tab_id, port_id = %port_id, "Stale port disconnected, mapping kept");
        }
    }
}

// ============================================================================
// Relay - Background Tasks
// ============================================================================

impl Relay {
    /// Reads one panel port until the panel drops it.
    async fn run_port(
        relay: Weak<Self>,
        port: PanelPort,
        mut rx: mpsc::UnboundedReceiver<Envelope>,
    ) {
        let mut attached = FxHashSet::default();

        while let Some(envelope) = rx.recv().await {
            let Some(relay) = relay.upgrade() else {
                break;
            };
            relay.on_port_message(&port, envelope, &mut attached);
        }

        if let Some(relay) = relay.upgrade() {
            for tab_id in attached {
                relay.on_port_disconnect(tab_id, port.id);
            }
        }

        debug!(port_id = %port.id, "Port task terminated");
    }

    /// Routes page messages until the relay is dropped.
    async fn run_page_inbound(relay: Weak<Self>, mut rx: mpsc::UnboundedReceiver<Envelope>) {
        while let Some(envelope) = rx.recv().await {
            let Some(relay) = relay.upgrade() else {
                break;
            };
            relay.route_page_message(envelope);
        }

        debug!("Page inbound loop terminated");
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use serde_json::json;
    use tokio::time::timeout;

    use crate::identifiers::RequestId;
    use crate::page::PageNode;
    use crate::protocol::{Command, GET_DOM_DETAILS, REJECTED};

    fn tab(id: u32) -> TabId {
        TabId::new(id).expect("valid tab id")
    }

    async fn next(port: &mut PortHandle) -> Envelope {
        timeout(Duration::from_secs(5), port.recv())
            .await
            .expect("reply within timeout")
            .expect("port open")
    }

    #[tokio::test]
    async fn test_connect_checks_name() {
        let relay = Relay::new();
        assert!(matches!(
            relay.connect("something-else"),
            Err(Error::InvalidPortName { .. })
        ));
        assert!(relay.connect(PORT_NAME).is_ok());
    }

    #[tokio::test]
    async fn test_round_trip_through_page() {
        let relay = Relay::new();
        let host = relay.open_page(
            tab(1),
            Page::from_body(PageNode::element("body").with_child(PageNode::element("div"))),
        );
        let mut port = relay.connect(PORT_NAME).expect("connect");

        let id = RequestId::generate();
        port.post(Command::GetDomDetails.into_envelope(tab(1), id))
            .expect("post");

        let reply = next(&mut port).await;
        assert_eq!(reply.kind, GET_DOM_DETAILS);
        assert_eq!(reply.id, Some(id));
        assert!(host.is_injected());
        assert_eq!(relay.port_for(tab(1)), Some(port.id()));
    }

    #[tokio::test]
    async fn test_missing_page_is_rejected() {
        let relay = Relay::new();
        let mut port = relay.connect(PORT_NAME).expect("connect");

        port.post(Command::Ping.into_envelope(tab(9), RequestId::generate()))
            .expect("post");

        let reply = next(&mut port).await;
        assert_eq!(reply.kind, REJECTED);
        assert_eq!(reply.data["command"], json!("ping"));
    }

    #[tokio::test]
    async fn test_page_lookup() {
        let relay = Relay::new();
        relay.open_page(tab(1), Page::default());

        assert_eq!(relay.page(tab(1)).map(|p| p.tab_id()).ok(), Some(tab(1)));
        assert!(matches!(relay.page(tab(2)), Err(Error::TabNotFound { .. })));

        assert!(relay.detach_page(tab(1)).is_some());
        assert_eq!(relay.page_count(), 0);
    }

    #[tokio::test]
    async fn test_untargeted_panel_message_ignored() {
        let relay = Relay::new();
        relay.open_page(tab(1), Page::default());
        let mut port = relay.connect(PORT_NAME).expect("connect");

        port.post(Envelope::new("ping", None)).expect("post");

        let waited = timeout(Duration::from_millis(100), port.recv()).await;
        assert!(waited.is_err(), "nothing should come back");
        assert_eq!(relay.port_count(), 0);
    }

    #[tokio::test]
    async fn test_page_message_without_port_dropped() {
        let relay = Relay::new();
        let orphan = Envelope::new(GET_DOM_DETAILS, Some(tab(77)))
            .with_data(json!({}))
            .with_src(Source::InjectedScript);

        relay.open_page(tab(1), Page::default());
        let mut port = relay.connect(PORT_NAME).expect("connect");
        port.post(Command::Ping.into_envelope(tab(1), RequestId::generate()))
            .expect("post");
        next(&mut port).await;

        assert!(!relay.route_page_message(orphan));
        assert!(!relay.route_page_message(Envelope::new("ping", None)));

        let waited = timeout(Duration::from_millis(100), port.recv()).await;
        assert!(waited.is_err(), "no port should receive the orphan");
    }

    #[tokio::test]
    async fn test_stale_disconnect_keeps_newer_port() {
        let relay = Relay::new();
        relay.open_page(tab(1), Page::default());

        let mut old = relay.connect(PORT_NAME).expect("connect");
        old.post(Command::Ping.into_envelope(tab(1), RequestId::generate()))
            .expect("post");
        next(&mut old).await;

        let mut new = relay.connect(PORT_NAME).expect("connect");
        new.post(Command::Ping.into_envelope(tab(1), RequestId::generate()))
            .expect("post");
        next(&mut new).await;
        assert_eq!(relay.port_for(tab(1)), Some(new.id()));

        drop(old);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(relay.port_for(tab(1)), Some(new.id()));

        let new_id = new.id();
        drop(new);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_ne!(relay.port_for(tab(1)), Some(new_id));
        assert_eq!(relay.port_count(), 0);
    }

    #[tokio::test]
    async fn test_disconnect_releases_every_tab_of_port() {
        let relay = Relay::new();
        relay.open_page(tab(1), Page::default());
        relay.open_page(tab(2), Page::default());
        relay.open_page(tab(3), Page::default());

        let mut roaming = relay.connect(PORT_NAME).expect("connect");
        for id in [1, 2, 3] {
            roaming
                .post(Command::Ping.into_envelope(tab(id), RequestId::generate()))
                .expect("post");
            next(&mut roaming).await;
        }

        let mut other = relay.connect(PORT_NAME).expect("connect");
        other
            .post(Command::Ping.into_envelope(tab(3), RequestId::generate()))
            .expect("post");
        next(&mut other).await;
        assert_eq!(relay.port_count(), 3);

        drop(roaming);
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(relay.port_for(tab(1)), None);
        assert_eq!(relay.port_for(tab(2)), None);
        assert_eq!(relay.port_for(tab(3)), Some(other.id()));
        assert_eq!(relay.port_count(), 1);
    }
}
