//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::Once;

use dom_size_analyzer::{Page, PageNode, TabId};
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Installs a test subscriber honoring `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Builds a tab id, panicking on zero.
pub fn tab(id: u32) -> TabId {
    TabId::new(id).expect("non-zero tab id")
}

/// A small page with a navigation list and an article.
pub fn sample_page() -> Page {
    Page::parse(
        r#"<!DOCTYPE html>
<html>
  <head><title>sample</title></head>
  <body>
    <nav id="top" class="menu main">
      <ul><li>One</li><li>Two</li><li style="color:red">Three</li></ul>
    </nav>
    <article class="post">
      <h1>Title</h1>
      <p>Text <b>bold</b> and <i>italic</i>.</p>
      <!-- end -->
    </article>
  </body>
</html>"#,
    )
}

/// A body holding `children` empty spans.
pub fn wide_page(children: usize) -> Page {
    Page::from_body(
        PageNode::element("body").with_children((0..children).map(|_| PageNode::element("span"))),
    )
}
