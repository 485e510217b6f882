//! Math adapter: typesets `[data-math-id]` spans produced by the transform

use super::adapter::{
    commit_error, commit_markup, with_timeout, AdapterReport, RenderContext, RendererAdapter,
    PROCESSED_ATTR,
};
use super::engine::MathEngine;
use crate::dom::{Dom, NodeId};
use async_trait::async_trait;
use std::sync::Arc;

pub const MATH_ID_ATTR: &str = "data-math-id";
pub const MATH_DISPLAY_CLASS: &str = "math-display";

#[derive(Clone, Default)]
pub struct MathAdapter {
    engine: Option<Arc<dyn MathEngine>>,
}

impl MathAdapter {
    pub fn new(engine: Option<Arc<dyn MathEngine>>) -> Self {
        Self { engine }
    }

    fn pending(dom: &Dom, container: NodeId) -> Vec<NodeId> {
        dom.select(container, |e| {
            e.attr(MATH_ID_ATTR).is_some() && e.attr(PROCESSED_ATTR).is_none()
        })
    }
}

/// TeX body of a restored span: `$..$` or `$$..$$` stripped
fn span_tex(text: &str, display: bool) -> &str {
    let delimiter = if display { "$$" } else { "$" };
    text.strip_prefix(delimiter)
        .and_then(|rest| rest.strip_suffix(delimiter))
        .unwrap_or(text)
        .trim()
}

#[async_trait]
impl RendererAdapter for MathAdapter {
    fn name(&self) -> &'static str {
        "math"
    }

    fn has_pending_work(&self, dom: &Dom, container: NodeId, _ctx: &RenderContext) -> bool {
        self.engine.is_some() && !Self::pending(dom, container).is_empty()
    }

    async fn render_all(&self, dom: &mut Dom, container: NodeId, ctx: &RenderContext) -> AdapterReport {
        let mut report = AdapterReport::default();
        let Some(engine) = self.engine.as_ref() else {
            return report;
        };

        for node in Self::pending(dom, container) {
            let source = dom.text_content(node);
            let display = dom.has_class(node, MATH_DISPLAY_CLASS);
            let tex = span_tex(&source, display).to_string();

            match with_timeout(ctx.engine_timeout, engine.typeset(&tex, display)).await {
                Ok(markup) => {
                    commit_markup(dom, node, markup);
                    report.rendered += 1;
                }
                Err(e) => {
                    log::warn!("Math typesetting failed for {:?}: {}", tex, e);
                    commit_error(dom, node, &source, Some(&e.to_string()));
                    report.failed += 1;
                }
            }
        }

        log::debug!(
            "Math adapter: {} rendered, {} failed",
            report.rendered,
            report.failed
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::render::adapter::{PROCESSED_ERROR, PROCESSED_OK};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Wraps the TeX in an svg; rejects anything containing `\bad`
    #[derive(Default)]
    struct FakeMath {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MathEngine for FakeMath {
        async fn typeset(&self, tex: &str, display: bool) -> Result<String, EngineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if tex.contains("\\bad") {
                return Err(EngineError::Syntax("Undefined control sequence \\bad".into()));
            }
            Ok(format!("<svg data-display=\"{}\">{}</svg>", display, tex))
        }
    }

    struct HangingMath;

    #[async_trait]
    impl MathEngine for HangingMath {
        async fn typeset(&self, _tex: &str, _display: bool) -> Result<String, EngineError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(String::new())
        }
    }

    fn fixture() -> (Dom, NodeId) {
        let mut dom = Dom::new();
        let root = dom.root();
        dom.append_html(
            root,
            concat!(
                r#"<p>a <span class="math-inline" data-math-id="0">$x^2$</span></p>"#,
                r#"<p><span class="math-display" data-math-id="1">$$\bad{y}$$</span></p>"#,
                r#"<p><span class="math-inline" data-math-id="2">$z$</span></p>"#,
            ),
        );
        (dom, root)
    }

    #[test]
    fn test_span_tex() {
        assert_eq!(span_tex("$x$", false), "x");
        assert_eq!(span_tex("$$\n\\int\n$$", true), "\\int");
        assert_eq!(span_tex("plain", false), "plain");
    }

    #[tokio::test]
    async fn test_no_engine_means_no_work() {
        let (mut dom, root) = fixture();
        let adapter = MathAdapter::new(None);
        let ctx = RenderContext::default();
        assert!(!adapter.has_pending_work(&dom, root, &ctx));
        assert_eq!(adapter.render_all(&mut dom, root, &ctx).await, AdapterReport::default());
    }

    #[tokio::test]
    async fn test_failures_are_isolated() {
        let (mut dom, root) = fixture();
        let engine = Arc::new(FakeMath::default());
        let adapter = MathAdapter::new(Some(engine.clone()));
        let ctx = RenderContext::default();

        assert!(adapter.has_pending_work(&dom, root, &ctx));
        let report = adapter.render_all(&mut dom, root, &ctx).await;
        assert_eq!(report, AdapterReport { rendered: 2, failed: 1 });

        let spans = dom.select(root, |e| e.attr(MATH_ID_ATTR).is_some());
        assert_eq!(dom.attr(spans[0], PROCESSED_ATTR), Some(PROCESSED_OK));
        assert_eq!(dom.inner_html(spans[0]), r#"<svg data-display="false">x^2</svg>"#);
        assert_eq!(dom.attr(spans[1], PROCESSED_ATTR), Some(PROCESSED_ERROR));
        assert!(dom.inner_html(spans[1]).contains("render-error"));
        assert_eq!(dom.attr(spans[2], PROCESSED_ATTR), Some(PROCESSED_OK));
    }

    #[tokio::test]
    async fn test_render_all_is_idempotent() {
        let (mut dom, root) = fixture();
        let engine = Arc::new(FakeMath::default());
        let adapter = MathAdapter::new(Some(engine.clone()));
        let ctx = RenderContext::default();

        adapter.render_all(&mut dom, root, &ctx).await;
        let first = dom.inner_html(root);
        assert!(!adapter.has_pending_work(&dom, root, &ctx));

        let second = adapter.render_all(&mut dom, root, &ctx).await;
        assert_eq!(second.total(), 0);
        assert_eq!(dom.inner_html(root), first);
        assert_eq!(engine.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_engine_times_out_per_item() {
        let (mut dom, root) = fixture();
        let adapter = MathAdapter::new(Some(Arc::new(HangingMath)));
        let ctx = RenderContext {
            engine_timeout: Duration::from_secs(5),
            ..RenderContext::default()
        };
        let report = adapter.render_all(&mut dom, root, &ctx).await;
        assert_eq!(report, AdapterReport { rendered: 0, failed: 3 });
        assert!(!adapter.has_pending_work(&dom, root, &ctx));
    }
}
