//! Core Panel struct and request cycle.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::{RequestId, TabId};
use crate::protocol::{Command, Reply};
use crate::relay::{PORT_NAME, PortHandle, Relay};

use super::export;
use super::options::PanelOptions;
use super::state::{AnalyzeAction, PanelState};

// ============================================================================
// AnalyzeOutcome
// ============================================================================

/// Result of a click on the analyze button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzeOutcome {
    /// A request was already in flight.
    Ignored,
    /// The loaded tree was cleared.
    Cleared,
    /// A new tree was loaded.
    Loaded,
}

// ============================================================================
// Panel
// ============================================================================

/// Devtools panel inspecting one tab.
///
/// Owns one relay port. Requests are correlated by [`RequestId`]; replies to
/// other requests, including late replies to timed-out ones, are discarded.
pub struct Panel {
    /// Connection to the relay.
    port: PortHandle,
    /// Inspected tab.
    tab_id: TabId,
    /// Configuration.
    options: PanelOptions,
    /// Displayed state.
    state: PanelState,
}

impl fmt::Debug for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Panel")
            .field("tab_id", &self.tab_id)
            .field("port_id", &self.port.id())
            .field("button", &self.state.button())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Panel - Lifecycle
// ============================================================================

impl Panel {
    /// Opens a panel for `tab_id`.
    ///
    /// Sends a warm-up `ping` unless disabled; its reply is not awaited.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the options are invalid
    /// - [`Error::PortClosed`] if the relay is gone
    pub fn open(relay: &Arc<Relay>, tab_id: TabId, options: PanelOptions) -> Result<Self> {
        options.validate()?;

        let port = relay.connect(PORT_NAME)?;
        if options.warm_up {
            port.post(Command::Ping.into_envelope(tab_id, RequestId::generate()))?;
        }

        info!(tab_id = %tab_id, port_id = %port.id(), "Panel opened");

        Ok(Self {
            port,
            tab_id,
            state: PanelState::new(options.history_capacity),
            options,
        })
    }

    /// Inspected tab.
    #[inline]
    #[must_use]
    pub fn tab_id(&self) -> TabId {
        self.tab_id
    }

    /// Options the panel was opened with.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &PanelOptions {
        &self.options
    }

    /// Displayed state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> &PanelState {
        &self.state
    }

    /// Displayed state, for filter, selection and history actions.
    #[inline]
    pub fn state_mut(&mut self) -> &mut PanelState {
        &mut self.state
    }
}

// ============================================================================
// Panel - Requests
// ============================================================================

impl Panel {
    /// Clicks the analyze button and, when that starts an analysis, waits
    /// for the tree.
    ///
    /// # Errors
    ///
    /// - [`Error::Rejected`] if the page refused the command
    /// - [`Error::RequestTimeout`] if no reply arrived in time
    /// - [`Error::PortClosed`] if the relay is gone
    ///
    /// On error the button leaves the loading state.
    pub async fn click_analyze(&mut self) -> Result<AnalyzeOutcome> {
        let command = match self.state.click_analyze() {
            AnalyzeAction::Ignored => return Ok(AnalyzeOutcome::Ignored),
            AnalyzeAction::Cleared => return Ok(AnalyzeOutcome::Cleared),
            AnalyzeAction::Send(command) => command,
        };

        match self.request(command).await {
            Ok(Reply::DomDetails(details)) => {
                self.state.receive_details(*details);
                Ok(AnalyzeOutcome::Loaded)
            }
            Ok(other) => {
                self.state.fail_inflight();
                Err(Error::protocol(format!(
                    "unexpected {} reply to {}",
                    other.kind(),
                    command.kind()
                )))
            }
            Err(e) => {
                self.state.fail_inflight();
                Err(e)
            }
        }
    }

    /// Pings the page and waits for the acknowledgement.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RequestInFlight`] while an analysis is loading,
    /// otherwise the errors of [`click_analyze`](Self::click_analyze).
    pub async fn ping(&mut self) -> Result<()> {
        if self.state.is_inflight() {
            return Err(Error::RequestInFlight);
        }

        match self.request(Command::Ping).await? {
            Reply::Pong => Ok(()),
            other => Err(Error::protocol(format!(
                "unexpected {} reply to ping",
                other.kind()
            ))),
        }
    }

    /// Sends a command and waits for the reply carrying its id.
    async fn request(&mut self, command: Command) -> Result<Reply> {
        let request_id = RequestId::generate();
        let request_timeout = self.options.request_timeout;

        self.port
            .post(command.into_envelope(self.tab_id, request_id))?;
        debug!(tab_id = %self.tab_id, %request_id, command = command.kind(), "Request sent");

        let port = &mut self.port;
        let wait = async {
            loop {
                let envelope = port.recv().await.ok_or(Error::PortClosed)?;
                if envelope.id == Some(request_id) {
                    return Reply::from_envelope(envelope);
                }
                trace!(kind = %envelope.kind, id = ?envelope.id, "Discarding uncorrelated message");
            }
        };

        let reply = match timeout(request_timeout, wait).await {
            Ok(reply) => reply?,
            Err(_) => {
                warn!(
                    tab_id = %self.tab_id,
                    %request_id,
                    command = command.kind(),
                    "Request timed out"
                );
                return Err(Error::request_timeout(request_id, millis(request_timeout)));
            }
        };

        match reply {
            Reply::Rejected(rejection) => {
                warn!(
                    command = %rejection.command,
                    reason = %rejection.reason,
                    "Command rejected"
                );
                Err(rejection.into())
            }
            reply => Ok(reply),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// Panel - Export
// ============================================================================

impl Panel {
    /// Writes the JSON export to `path`.
    ///
    /// Returns `false` without writing when nothing is loaded.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub async fn export_json_to(&self, path: impl AsRef<Path>) -> Result<bool> {
        match self.state.dom() {
            Some(dom) => export::write_json(dom, path).await.map(|()| true),
            None => Ok(false),
        }
    }

    /// Writes the CSV export to `path`.
    ///
    /// Returns `false` without writing when nothing is loaded.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub async fn export_csv_to(&self, path: impl AsRef<Path>) -> Result<bool> {
        match self.state.dom() {
            Some(dom) => export::write_csv(dom, path).await.map(|()| true),
            None => Ok(false),
        }
    }

    /// Writes both exports into `dir` under their default file names.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or a write fails.
    pub async fn export_all_to(&self, dir: impl AsRef<Path>) -> Result<bool> {
        let dir = dir.as_ref();
        let json = self.export_json_to(dir.join(export::JSON_FILE_NAME)).await?;
        let csv = self.export_csv_to(dir.join(export::CSV_FILE_NAME)).await?;
        Ok(json && csv)
    }
}

// ============================================================================
// Tests
// ============================================================================
