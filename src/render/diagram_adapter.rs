//! Diagram adapters
//!
//! The transform leaves diagram fences as tagged `pre` blocks. Before
//! rendering, each block is swapped for a target `div` that keeps the
//! source in `data-diagram-source`, so the diagram can be rendered again
//! later (flow diagrams follow the theme) without re-running the transform.

use super::adapter::{
    commit_error, commit_markup, with_timeout, AdapterReport, RenderContext, RendererAdapter,
    PROCESSED_ATTR,
};
use super::engine::DiagramEngine;
use crate::dom::{Dom, NodeId};
use crate::markdown::DiagramKind;
use async_trait::async_trait;
use std::sync::Arc;

pub const DIAGRAM_KIND_ATTR: &str = "data-diagram-kind";
pub const DIAGRAM_ID_ATTR: &str = "data-diagram-id";
pub const DIAGRAM_SOURCE_ATTR: &str = "data-diagram-source";
pub const DIAGRAM_THEME_ATTR: &str = "data-theme";

#[derive(Clone)]
pub struct DiagramAdapter {
    kind: DiagramKind,
    engine: Option<Arc<dyn DiagramEngine>>,
    theme_aware: bool,
}

impl DiagramAdapter {
    /// Flow diagrams re-render when the diagram theme changes
    pub fn flow(engine: Option<Arc<dyn DiagramEngine>>) -> Self {
        Self {
            kind: DiagramKind::Flow,
            engine,
            theme_aware: true,
        }
    }

    pub fn sequence(engine: Option<Arc<dyn DiagramEngine>>) -> Self {
        Self {
            kind: DiagramKind::Sequence,
            engine,
            theme_aware: false,
        }
    }

    pub fn kind(&self) -> DiagramKind {
        self.kind
    }

    fn unconverted(&self, dom: &Dom, container: NodeId) -> Vec<NodeId> {
        let kind = self.kind.as_str();
        dom.select(container, |e| {
            e.is("pre") && e.attr(DIAGRAM_KIND_ATTR) == Some(kind)
        })
    }

    fn pending_targets(&self, dom: &Dom, container: NodeId, ctx: &RenderContext) -> Vec<NodeId> {
        let class = self.kind.target_class();
        let theme = ctx.diagram_theme.as_str();
        dom.select(container, |e| {
            if !e.is("div") || !e.has_class(class) || e.attr(DIAGRAM_SOURCE_ATTR).is_none() {
                return false;
            }
            match e.attr(PROCESSED_ATTR) {
                None => true,
                Some(_) => self.theme_aware && e.attr(DIAGRAM_THEME_ATTR) != Some(theme),
            }
        })
    }

    /// Swap every tagged `pre` for a rendering target
    fn convert_blocks(&self, dom: &mut Dom, container: NodeId) {
        for pre in self.unconverted(dom, container) {
            let source = dom.text_content(pre);
            let id = dom.attr(pre, DIAGRAM_ID_ATTR).unwrap_or("0").to_string();
            let target = dom.create_element_with(
                "div",
                &[
                    ("class", self.kind.target_class()),
                    (DIAGRAM_ID_ATTR, id.as_str()),
                    (DIAGRAM_SOURCE_ATTR, source.as_str()),
                ],
            );
            if self.kind == DiagramKind::Flow {
                dom.set_attr(target, "id", format!("mermaid-diagram-{}", id));
            }
            dom.replace_with(pre, target);
            dom.remove(pre);
        }
    }
}

#[async_trait]
impl RendererAdapter for DiagramAdapter {
    fn name(&self) -> &'static str {
        match self.kind {
            DiagramKind::Flow => "flow-diagram",
            DiagramKind::Sequence => "sequence-diagram",
        }
    }

    fn has_pending_work(&self, dom: &Dom, container: NodeId, ctx: &RenderContext) -> bool {
        self.engine.is_some()
            && (!self.unconverted(dom, container).is_empty()
                || !self.pending_targets(dom, container, ctx).is_empty())
    }

    async fn render_all(&self, dom: &mut Dom, container: NodeId, ctx: &RenderContext) -> AdapterReport {
        let mut report = AdapterReport::default();
        let Some(engine) = self.engine.as_ref() else {
            return report;
        };

        self.convert_blocks(dom, container);

        for target in self.pending_targets(dom, container, ctx) {
            let source = dom.attr(target, DIAGRAM_SOURCE_ATTR).unwrap_or_default().to_string();
            let result = with_timeout(
                ctx.engine_timeout,
                engine.render(&source, ctx.diagram_theme),
            )
            .await;

            match result {
                Ok(svg) => {
                    commit_markup(dom, target, svg);
                    report.rendered += 1;
                }
                Err(e) => {
                    log::warn!("{} rendering failed: {}", self.name(), e);
                    let message = format!("Error rendering diagram: {}", e);
                    commit_error(dom, target, &message, None);
                    report.failed += 1;
                }
            }
            dom.set_attr(target, DIAGRAM_THEME_ATTR, ctx.diagram_theme.as_str());
        }

        log::debug!(
            "{}: {} rendered, {} failed",
            self.name(),
            report.rendered,
            report.failed
        );
        report
    }
}
