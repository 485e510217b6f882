//! Deferred renderer adapters
//!
//! Each adapter owns one kind of embedded content (math, flow diagrams,
//! sequence diagrams). The completion gate asks every adapter whether it
//! has pending work and, if so, awaits its `render_all`.

use crate::dom::{Dom, NodeId};
use crate::error::EngineError;
use crate::presentation::DiagramTheme;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

/// Marker attribute set on every item an adapter has handled
pub const PROCESSED_ATTR: &str = "data-processed";
pub const PROCESSED_OK: &str = "true";
pub const PROCESSED_ERROR: &str = "error";

/// Class of the inline marker shown in place of a failed item
pub const RENDER_ERROR_CLASS: &str = "render-error";

/// Inputs shared by all adapters during one render pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderContext {
    pub diagram_theme: DiagramTheme,
    pub engine_timeout: Duration,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self {
            diagram_theme: DiagramTheme::Default,
            engine_timeout: Duration::from_millis(crate::config::DEFAULT_ENGINE_TIMEOUT_MS),
        }
    }
}

/// Outcome of one `render_all` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdapterReport {
    pub rendered: usize,
    pub failed: usize,
}

impl AdapterReport {
    pub fn total(&self) -> usize {
        self.rendered + self.failed
    }
}

#[async_trait]
pub trait RendererAdapter: Send + Sync {
    /// Short name used in logs and reports
    fn name(&self) -> &'static str;

    /// True iff an unprocessed item of this kind exists under `container`
    /// and the engine is available
    fn has_pending_work(&self, dom: &Dom, container: NodeId, ctx: &RenderContext) -> bool;

    /// Render every pending item; per-item failures become inline error
    /// markers and never abort the batch
    async fn render_all(&self, dom: &mut Dom, container: NodeId, ctx: &RenderContext) -> AdapterReport;
}

/// Run one engine call under the per-item timeout
pub(crate) async fn with_timeout<F>(timeout: Duration, call: F) -> Result<String, EngineError>
where
    F: Future<Output = Result<String, EngineError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(EngineError::Timeout(timeout)),
    }
}

/// Replace the children of `target` with engine output and mark it done
pub(crate) fn commit_markup(dom: &mut Dom, target: NodeId, markup: String) {
    dom.clear_children(target);
    let raw = dom.create_raw(markup);
    dom.append_child(target, raw);
    dom.set_attr(target, PROCESSED_ATTR, PROCESSED_OK);
}

/// Replace the children of `target` with an inline error marker
pub(crate) fn commit_error(dom: &mut Dom, target: NodeId, message: &str, title: Option<&str>) {
    dom.clear_children(target);
    let marker = dom.create_element_with("span", &[("class", RENDER_ERROR_CLASS)]);
    if let Some(title) = title {
        dom.set_attr(marker, "title", title);
    }
    let text = dom.create_text(message);
    dom.append_child(marker, text);
    dom.append_child(target, marker);
    dom.set_attr(target, PROCESSED_ATTR, PROCESSED_ERROR);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_timeout_maps_to_engine_error() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, EngineError>("late".to_string())
        };
        let err = with_timeout(Duration::from_secs(1), slow).await.unwrap_err();
        assert_eq!(err, EngineError::Timeout(Duration::from_secs(1)));
    }

    #[test]
    fn test_commit_error_marks_item() {
        let mut dom = Dom::new();
        let target = dom.create_element("span");
        let old = dom.create_text("$x$");
        dom.append_child(target, old);
        commit_error(&mut dom, target, "$x$", Some("Undefined control sequence"));
        assert_eq!(dom.attr(target, PROCESSED_ATTR), Some(PROCESSED_ERROR));
        assert_eq!(
            dom.inner_html(target),
            r#"<span class="render-error" title="Undefined control sequence">$x$</span>"#
        );
    }
}
