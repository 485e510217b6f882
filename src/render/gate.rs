//! Rendering completion gate
//!
//! Awaits every adapter with pending work, in a fixed order, followed by
//! one layout tick. Pagination and PDF export only start after the gate
//! has resolved, so they never observe placeholders or half-drawn SVG.

use super::adapter::{AdapterReport, RenderContext, RendererAdapter};
use super::diagram_adapter::DiagramAdapter;
use super::engine::Engines;
use super::math_adapter::MathAdapter;
use crate::dom::{Dom, NodeId};
use std::sync::Arc;
use std::time::Duration;

/// Per-adapter outcome of one gate pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GateReport {
    pub adapters: Vec<(&'static str, AdapterReport)>,
}

impl GateReport {
    pub fn rendered(&self) -> usize {
        self.adapters.iter().map(|(_, r)| r.rendered).sum()
    }

    pub fn failed(&self) -> usize {
        self.adapters.iter().map(|(_, r)| r.failed).sum()
    }
}

#[derive(Clone)]
pub struct RenderingGate {
    adapters: Vec<Arc<dyn RendererAdapter>>,
    layout_tick: Duration,
}

impl RenderingGate {
    /// Math, then flow diagrams, then sequence diagrams
    pub fn new(engines: &Engines, layout_tick: Duration) -> Self {
        Self::with_adapters(
            vec![
                Arc::new(MathAdapter::new(engines.math.clone())),
                Arc::new(DiagramAdapter::flow(engines.flow.clone())),
                Arc::new(DiagramAdapter::sequence(engines.sequence.clone())),
            ],
            layout_tick,
        )
    }

    pub fn with_adapters(adapters: Vec<Arc<dyn RendererAdapter>>, layout_tick: Duration) -> Self {
        Self {
            adapters,
            layout_tick,
        }
    }

    /// Same adapters with a different settle delay
    pub fn with_layout_tick(&self, layout_tick: Duration) -> Self {
        Self {
            adapters: self.adapters.clone(),
            layout_tick,
        }
    }

    pub fn has_pending_work(&self, dom: &Dom, container: NodeId, ctx: &RenderContext) -> bool {
        self.adapters
            .iter()
            .any(|adapter| adapter.has_pending_work(dom, container, ctx))
    }

    /// Resolve once every adapter has finished its pending items
    ///
    /// Never fails: item failures are already inline markers. Adapters with
    /// no pending work (or no engine) are skipped.
    pub async fn await_rendering_settled(
        &self,
        dom: &mut Dom,
        container: NodeId,
        ctx: &RenderContext,
    ) -> GateReport {
        let mut report = GateReport::default();

        for adapter in &self.adapters {
            if !adapter.has_pending_work(dom, container, ctx) {
                continue;
            }
            log::debug!("Awaiting {} adapter", adapter.name());
            let result = adapter.render_all(dom, container, ctx).await;
            report.adapters.push((adapter.name(), result));
        }

        // Layout tick
        tokio::time::sleep(self.layout_tick).await;
        tokio::task::yield_now().await;

        if report.failed() > 0 {
            log::info!(
                "Rendering settled with {} item(s) failed, {} rendered",
                report.failed(),
                report.rendered()
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records call order; flips its own element to processed
    struct Recording {
        name: &'static str,
        class: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl RendererAdapter for Recording {
        fn name(&self) -> &'static str {
            self.name
        }

        fn has_pending_work(&self, dom: &Dom, container: NodeId, _ctx: &RenderContext) -> bool {
            dom.select_first(container, |e| {
                e.has_class(self.class) && e.attr("data-processed").is_none()
            })
            .is_some()
        }

        async fn render_all(&self, dom: &mut Dom, container: NodeId, _ctx: &RenderContext) -> AdapterReport {
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.log.lock().unwrap().push(self.name);
            let nodes = dom.select(container, |e| e.has_class(self.class));
            for node in &nodes {
                dom.set_attr(*node, "data-processed", "true");
            }
            AdapterReport {
                rendered: nodes.len(),
                failed: 0,
            }
        }
    }

    fn gate(log: &Arc<Mutex<Vec<&'static str>>>) -> RenderingGate {
        let adapter = |name, class| -> Arc<dyn RendererAdapter> {
            Arc::new(Recording {
                name,
                class,
                log: log.clone(),
            })
        };
        RenderingGate::with_adapters(
            vec![adapter("math", "m"), adapter("flow", "f"), adapter("sequence", "s")],
            Duration::from_millis(16),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_adapters_run_in_order_and_settle() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let gate = gate(&log);
        let mut dom = Dom::new();
        let root = dom.root();
        dom.append_html(root, r#"<span class="s"></span><span class="m"></span><div class="f"></div>"#);
        let ctx = RenderContext::default();

        let report = gate.await_rendering_settled(&mut dom, root, &ctx).await;
        assert_eq!(*log.lock().unwrap(), vec!["math", "flow", "sequence"]);
        assert_eq!(report.rendered(), 3);
        assert!(!gate.has_pending_work(&dom, root, &ctx));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_adapters_are_skipped() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let gate = gate(&log);
        let mut dom = Dom::new();
        let root = dom.root();
        dom.append_html(root, r#"<div class="f"></div>"#);

        let report = gate
            .await_rendering_settled(&mut dom, root, &RenderContext::default())
            .await;
        assert_eq!(*log.lock().unwrap(), vec!["flow"]);
        assert_eq!(report.adapters.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_engines_resolves_immediately() {
        let gate = RenderingGate::new(&Engines::default(), Duration::from_millis(16));
        let mut dom = Dom::new();
        let root = dom.root();
        dom.append_html(root, r#"<span class="math-inline" data-math-id="0">$x$</span>"#);
        let report = gate
            .await_rendering_settled(&mut dom, root, &RenderContext::default())
            .await;
        assert_eq!(report, GateReport::default());
    }
}
