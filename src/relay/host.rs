//! Page contexts reachable from the relay.
//!
//! [`PageHost`] plays both page-side roles: the bridge that relays between
//! the relay and the page's event bus, and the slot into which the
//! [`Collector`] is injected.
//!
//! ```text
//! Relay ──deliver──► bridge ──event(src=content-script)──► collector
//!   ▲                  │                                      │
//!   └────forward───────┴◄──────event(src=injected-script)─────┘
//! ```
//!
//! Every listener on the page bus skips events carrying its own source tag,
//! so nothing is forwarded back to where it came from.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::collector::Collector;
use crate::error::{Error, Result};
use crate::identifiers::TabId;
use crate::page::Page;
use crate::protocol::{Envelope, Source};

// ============================================================================
// Types
// ============================================================================

/// Channel carrying page messages to the relay.
pub type PageSender = mpsc::UnboundedSender<Envelope>;

// ============================================================================
// PageContext
// ============================================================================

/// A page the relay can reach.
pub trait PageContext: Send + Sync {
    /// The tab hosting the page.
    fn tab_id(&self) -> TabId;

    /// Installs the collector if absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyInjected`] when the collector is present.
    fn inject(&self) -> Result<()>;

    /// Delivers a relay message into the page.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInjected`] when nothing in the page listens.
    fn deliver(&self, envelope: Envelope) -> Result<()>;
}

// ============================================================================
// PageHost
// ============================================================================

/// In-process page context for one tab.
pub struct PageHost {
    /// Tab hosting the page.
    tab_id: TabId,
    /// The live document.
    page: RwLock<Page>,
    /// Injected collector, if any.
    collector: Mutex<Option<Collector>>,
    /// Messages to the relay.
    outbound: PageSender,
}

impl fmt::Debug for PageHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageHost")
            .field("tab_id", &self.tab_id)
            .field("injected", &self.is_injected())
            .finish_non_exhaustive()
    }
}

impl PageHost {
    /// Creates a host for `page` that reports to `outbound`.
    #[must_use]
    pub fn new(tab_id: TabId, page: Page, outbound: PageSender) -> Self {
        Self {
            tab_id,
            page: RwLock::new(page),
            collector: Mutex::new(None),
            outbound,
        }
    }

    /// Returns `true` if the collector is installed.
    #[inline]
    #[must_use]
    pub fn is_injected(&self) -> bool {
        self.collector.lock().is_some()
    }

    /// Runs `f` against the current document.
    pub fn with_page<R>(&self, f: impl FnOnce(&Page) -> R) -> R {
        f(&self.page.read())
    }

    /// Mutates the current document in place.
    pub fn update_page(&self, f: impl FnOnce(&mut Page)) {
        f(&mut self.page.write());
    }

    /// Loads a new document.
    ///
    /// Like a navigation, this discards the injected collector.
    pub fn navigate(&self, page: Page) {
        *self.page.write() = page;
        *self.collector.lock() = None;
        debug!(tab_id = %self.tab_id, "Page replaced, collector discarded");
    }

    /// Posts an event on the page bus and runs every listener.
    fn dispatch(&self, event: Envelope) {
        trace!(tab_id = %self.tab_id, kind = %event.kind, src = ?event.src, "Page event");

        // Collector listener.
        let collector = *self.collector.lock();
        if let Some(collector) = collector {
            let reply = {
                let page = self.page.read();
                collector.handle(&page, &event)
            };
            if let Some(reply) = reply {
                self.dispatch(reply);
            }
        }

        // Bridge listener.
        if !event.is_from(Source::ContentScript) {
            self.forward(event);
        }
    }

    /// Sends a page event to the relay, stamping the tab when missing.
    fn forward(&self, mut envelope: Envelope) {
        envelope.tab_id.get_or_insert(self.tab_id);

        if self.outbound.send(envelope).is_err() {
            debug!(tab_id = %self.tab_id, "Relay gone, page message dropped");
        }
    }
}

impl PageContext for PageHost {
    fn tab_id(&self) -> TabId {
        self.tab_id
    }

    fn inject(&self) -> Result<()> {
        let mut slot = self.collector.lock();
        if slot.is_some() {
            return Err(Error::already_injected(self.tab_id));
        }

        *slot = Some(Collector::new());
        debug!(tab_id = %self.tab_id, "Collector injected");
        Ok(())
    }

    fn deliver(&self, envelope: Envelope) -> Result<()> {
        if !self.is_injected() {
            return Err(Error::not_injected(self.tab_id));
        }

        self.dispatch(envelope.with_src(Source::ContentScript));
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
