//! End-to-end panel ↔ relay ↔ page flows.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use dom_size_analyzer::panel::AnalyzeButton;
use dom_size_analyzer::protocol::GET_DOM_DETAILS;
use dom_size_analyzer::relay::PORT_NAME;
use dom_size_analyzer::{
    AnalyzeOutcome, Envelope, Error, PageContext, PageNode, Panel, PanelOptions, Relay, Result,
    Source, TabId,
};
use tokio::time::timeout;

use common::{init_tracing, sample_page, tab};

// ============================================================================
// Helpers
// ============================================================================

/// Page context that accepts everything and never answers.
struct SilentPage {
    tab_id: TabId,
    delivered: AtomicUsize,
}

impl PageContext for SilentPage {
    fn tab_id(&self) -> TabId {
        self.tab_id
    }

    fn inject(&self) -> Result<()> {
        Ok(())
    }

    fn deliver(&self, _envelope: Envelope) -> Result<()> {
        self.delivered.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn fast_options() -> PanelOptions {
    PanelOptions::new()
        .with_request_timeout(Duration::from_millis(200))
        .without_warm_up()
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_analyze_parsed_page() -> anyhow::Result<()> {
    init_tracing();
    let relay = Relay::new();
    relay.open_page(tab(1), sample_page());

    let mut panel = Panel::open(&relay, tab(1), PanelOptions::default())?;
    assert_eq!(panel.click_analyze().await?, AnalyzeOutcome::Loaded);

    let state = panel.state();
    let metrics = state.metrics().expect("metrics loaded");
    assert_eq!(metrics.tag_counts.get("li"), Some(&3));
    assert_eq!(metrics.inline_style_count, 1);
    assert_eq!(state.dom().map(|d| d.description()).as_deref(), Some("BODY"));

    let view = state.metrics_view();
    assert_eq!(view.total_nodes, 10);
    assert!(view.heavy_nodes.iter().any(|h| h.description == "NAV#top.menu.main"));

    let tree = state.tree().expect("tree");
    assert_eq!(tree.label, "BODY");
    Ok(())
}

#[tokio::test]
async fn test_reset_then_reanalyze() -> anyhow::Result<()> {
    init_tracing();
    let relay = Relay::new();
    relay.open_page(tab(2), sample_page());
    let mut panel = Panel::open(&relay, tab(2), PanelOptions::default())?;

    assert_eq!(panel.click_analyze().await?, AnalyzeOutcome::Loaded);
    assert_eq!(panel.click_analyze().await?, AnalyzeOutcome::Cleared);
    assert_eq!(panel.state().button(), AnalyzeButton::Analyze);
    assert_eq!(panel.click_analyze().await?, AnalyzeOutcome::Loaded);
    assert_eq!(panel.state().button(), AnalyzeButton::Reset);
    Ok(())
}

#[tokio::test]
async fn test_snapshot_compare_after_page_change() -> anyhow::Result<()> {
    init_tracing();
    let relay = Relay::new();
    let host = relay.open_page(tab(3), sample_page());
    let mut panel = Panel::open(&relay, tab(3), PanelOptions::default())?;

    panel.click_analyze().await?;
    panel.state_mut().snapshot().expect("snapshot");

    host.update_page(|page| {
        if let Some(body) = page.body_mut() {
            body.push_child(
                PageNode::element("footer").with_child(
                    PageNode::element("div").with_child(PageNode::element("div").with_child(
                        PageNode::element("div").with_child(PageNode::element("div")),
                    )),
                ),
            );
        }
    });

    panel.click_analyze().await?;
    panel.click_analyze().await?;
    panel.state_mut().snapshot().expect("snapshot");

    let diff = panel.state().compare().expect("two snapshots");
    assert_eq!(diff.nodes_diff, 5);
    assert_eq!(diff.depth_diff, 1);
    assert_eq!(panel.state().history_lines().len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_silent_page_times_out() -> anyhow::Result<()> {
    init_tracing();
    let relay = Relay::new();
    let silent = Arc::new(SilentPage {
        tab_id: tab(4),
        delivered: AtomicUsize::new(0),
    });
    relay.attach_page(Arc::clone(&silent) as Arc<dyn PageContext>);

    let mut panel = Panel::open(&relay, tab(4), fast_options())?;
    let err = panel.click_analyze().await.expect_err("no answer");

    assert!(err.is_timeout());
    assert!(err.is_recoverable());
    assert!(!panel.state().is_inflight());
    assert_eq!(panel.state().button(), AnalyzeButton::Analyze);
    assert_eq!(silent.delivered.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn test_unknown_command_rejected_end_to_end() -> anyhow::Result<()> {
    init_tracing();
    let relay = Relay::new();
    relay.open_page(tab(5), sample_page());
    let mut port = relay.connect(PORT_NAME)?;

    port.post(Envelope::new("HIGHLIGHT", Some(tab(5))))?;
    let reply = timeout(Duration::from_secs(5), port.recv())
        .await?
        .expect("port open");

    match dom_size_analyzer::Reply::from_envelope(reply)? {
        dom_size_analyzer::Reply::Rejected(rejection) => {
            assert_eq!(rejection.command, "HIGHLIGHT");
            let err: Error = rejection.into();
            assert!(matches!(err, Error::Rejected { .. }));
        }
        other => panic!("unexpected reply: {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_legacy_tab_id_field_accepted() -> anyhow::Result<()> {
    init_tracing();
    let relay = Relay::new();
    relay.open_page(tab(6), sample_page());
    let mut port = relay.connect(PORT_NAME)?;

    let raw = serde_json::json!({ "type": GET_DOM_DETAILS, "tabID": 6 });
    port.post(serde_json::from_value(raw)?)?;

    let reply = timeout(Duration::from_secs(5), port.recv())
        .await?
        .expect("port open");
    assert_eq!(reply.kind, GET_DOM_DETAILS);
    assert_eq!(reply.tab_id, Some(tab(6)));
    assert!(reply.is_from(Source::InjectedScript));
    Ok(())
}

#[tokio::test]
async fn test_two_panels_two_tabs() -> anyhow::Result<()> {
    init_tracing();
    let relay = Relay::new();
    relay.open_page(tab(7), sample_page());
    relay.open_page(tab(8), common::wide_page(20));

    let mut first = Panel::open(&relay, tab(7), PanelOptions::default())?;
    let mut second = Panel::open(&relay, tab(8), PanelOptions::default())?;

    let (a, b) = tokio::join!(first.click_analyze(), second.click_analyze());
    assert_eq!(a?, AnalyzeOutcome::Loaded);
    assert_eq!(b?, AnalyzeOutcome::Loaded);

    assert_eq!(second.state().metrics().map(|m| m.total_nodes), Some(21));
    assert_eq!(
        first.state().metrics().and_then(|m| m.tag_counts.get("li").copied()),
        Some(3)
    );
    assert_eq!(relay.port_count(), 2);
    Ok(())
}
