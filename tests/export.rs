//! Export formats read back the way a consumer would.

mod common;

use dom_size_analyzer::panel::export::{self, CSV_FILE_NAME, CSV_HEADER, JSON_FILE_NAME};
use dom_size_analyzer::{Collector, Panel, PanelOptions, Relay};
use futures_util::StreamExt;
use rustc_hash::FxHashSet;
use tokio_test::assert_ok;

use common::{init_tracing, sample_page, tab};

#[tokio::test]
async fn test_csv_round_trip() -> anyhow::Result<()> {
    init_tracing();
    let details = Collector::new().collect_page(&sample_page());
    let text = assert_ok!(export::to_csv(&details.dom).await);

    let mut reader = csv_async::AsyncReaderBuilder::new()
        .has_headers(false)
        .create_reader(text.as_bytes());
    let mut records = reader.records();

    let header = records.next().await.expect("header row")?;
    assert_eq!(header.iter().collect::<Vec<_>>(), CSV_HEADER);

    let mut rows = 0;
    let mut indices = FxHashSet::default();
    while let Some(record) = records.next().await {
        let record = record?;
        assert_eq!(record.len(), CSV_HEADER.len());
        indices.insert(record[0].to_owned());
        rows += 1;
    }

    assert_eq!(rows, details.metrics.total_nodes);
    assert_eq!(indices.len(), rows);
    Ok(())
}

#[tokio::test]
async fn test_json_export_reads_back() -> anyhow::Result<()> {
    let details = Collector::new().collect_page(&sample_page());
    let text = export::to_json(&details.dom)?;

    let value: serde_json::Value = serde_json::from_str(&text)?;
    let dom: dom_size_analyzer::NodeDescriptor = serde_json::from_value(value["dom"].clone())?;
    assert_eq!(dom, details.dom);
    Ok(())
}

#[tokio::test]
async fn test_panel_exports_to_directory() -> anyhow::Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let relay = Relay::new();
    relay.open_page(tab(11), sample_page());
    let mut panel = Panel::open(&relay, tab(11), PanelOptions::default())?;

    assert!(!panel.export_all_to(dir.path()).await?);
    assert!(!dir.path().join(JSON_FILE_NAME).exists());

    panel.click_analyze().await?;
    assert!(panel.export_all_to(dir.path()).await?);

    let json = tokio::fs::read_to_string(dir.path().join(JSON_FILE_NAME)).await?;
    assert!(json.starts_with("{\n  \"dom\": {"));

    let csv = tokio::fs::read_to_string(dir.path().join(CSV_FILE_NAME)).await?;
    let total = panel.state().metrics().map(|m| m.total_nodes).unwrap_or_default();
    assert_eq!(csv.lines().count(), total + 1);
    Ok(())
}
