//! Render pipeline: Markdown source to a settled, styled view

use super::adapter::RenderContext;
use super::embeds::{wrap_images, ImageWidths};
use super::engine::Engines;
use super::gate::{GateReport, RenderingGate};
use super::view::ViewDom;
use crate::config::RenderConfig;
use crate::error::ExportResult;
use crate::markdown::{collect_headings, render_toc, MarkdownTransform, TocEntry};
use crate::pagination::Paginator;
use crate::presentation::{PresentationController, PresentationState};
use std::path::PathBuf;
use std::time::Duration;

/// One document to render
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub source: String,
    /// Directory relative image sources resolve against; `None` when untitled
    pub base_dir: Option<PathBuf>,
    pub title: String,
}

/// View-level settings that apply to every document
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub presentation: PresentationState,
    pub paginate: bool,
    pub toc_visible: bool,
    pub image_widths: ImageWidths,
}

/// A fully rendered document
#[derive(Debug, Clone)]
pub struct RenderedView {
    pub view: ViewDom,
    pub toc: Vec<TocEntry>,
    pub report: GateReport,
    pub presentation: PresentationState,
    pub page_count: Option<usize>,
}

#[derive(Clone)]
pub struct RenderPipeline {
    transform: MarkdownTransform,
    gate: RenderingGate,
    paginator: Paginator,
    controller: PresentationController,
    engine_timeout: Duration,
}

impl RenderPipeline {
    pub fn new(engines: &Engines, config: &RenderConfig) -> Self {
        Self {
            transform: MarkdownTransform::new(),
            gate: RenderingGate::new(engines, config.layout_tick()),
            paginator: Paginator::default(),
            controller: PresentationController::new(),
            engine_timeout: config.engine_timeout(),
        }
    }

    pub fn with_paginator(mut self, paginator: Paginator) -> Self {
        self.paginator = paginator;
        self
    }

    pub fn gate(&self) -> &RenderingGate {
        &self.gate
    }

    pub fn context(&self, presentation: &PresentationState) -> RenderContext {
        RenderContext {
            diagram_theme: presentation.diagram_theme(),
            engine_timeout: self.engine_timeout,
        }
    }

    /// Transform, settle every adapter, style, build the TOC, then paginate
    ///
    /// Pagination falls back to continuous mode when the page geometry is
    /// unusable.
    pub async fn render(&self, request: RenderRequest, options: &RenderOptions) -> RenderedView {
        let output = self
            .transform
            .transform(&request.source, request.base_dir.as_deref());

        let mut view = ViewDom::new();
        view.set_title(&request.title);
        let article = view.article();
        view.set_inner_html(article, &output.html);
        wrap_images(&mut view, article, &options.image_widths);

        let ctx = self.context(&options.presentation);
        let report = self
            .gate
            .await_rendering_settled(&mut view, article, &ctx)
            .await;

        self.controller.apply(&mut view, &options.presentation);

        let toc = collect_headings(&mut view, article);
        let toc_content = view.toc_content();
        render_toc(&mut view, toc_content, Some(&toc));
        view.set_toc_visible(options.toc_visible);

        let mut rendered = RenderedView {
            view,
            toc,
            report,
            presentation: options.presentation.clone(),
            page_count: None,
        };
        if options.paginate {
            if let Err(e) = self.repaginate(&mut rendered).await {
                log::warn!("Pagination skipped: {}", e);
            }
        }
        rendered
    }

    /// Re-apply a changed presentation to a live view
    ///
    /// Theme-aware diagrams are re-rendered and pages rebuilt so the
    /// preview matches what export will print.
    pub async fn apply_presentation(
        &self,
        rendered: &mut RenderedView,
        presentation: &PresentationState,
        paginate: bool,
    ) -> ExportResult<()> {
        rendered.presentation = presentation.clone();
        self.controller.apply(&mut rendered.view, presentation);

        let ctx = self.context(presentation);
        let article = rendered.view.article();
        let report = self
            .gate
            .await_rendering_settled(&mut rendered.view, article, &ctx)
            .await;
        if !report.adapters.is_empty() {
            self.controller.style_elements(&mut rendered.view, article, presentation);
        }

        if paginate {
            self.repaginate(rendered).await
        } else {
            self.paginator.unpaginate(&mut rendered.view);
            rendered.page_count = None;
            Ok(())
        }
    }

    pub async fn repaginate(&self, rendered: &mut RenderedView) -> ExportResult<()> {
        let ctx = self.context(&rendered.presentation);
        let count = self
            .paginator
            .paginate(&mut rendered.view, &self.gate, &ctx, &rendered.presentation)
            .await?;
        rendered.page_count = Some(count);
        Ok(())
    }

    pub fn unpaginate(&self, rendered: &mut RenderedView) {
        self.paginator.unpaginate(&mut rendered.view);
        rendered.page_count = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::pagination::is_paginated;
    use crate::presentation::{DiagramTheme, Theme};
    use crate::render::engine::{DiagramEngine, MathEngine};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct SvgMath;

    #[async_trait]
    impl MathEngine for SvgMath {
        async fn typeset(&self, tex: &str, _display: bool) -> Result<String, EngineError> {
            Ok(format!("<svg class=\"tex\">{}</svg>", tex.len()))
        }
    }

    struct SvgDiagrams;

    #[async_trait]
    impl DiagramEngine for SvgDiagrams {
        async fn render(&self, _source: &str, theme: DiagramTheme) -> Result<String, EngineError> {
            Ok(format!("<svg data-theme=\"{}\"></svg>", theme.as_str()))
        }
    }

    fn pipeline() -> RenderPipeline {
        let engines = Engines {
            math: Some(Arc::new(SvgMath)),
            flow: Some(Arc::new(SvgDiagrams)),
            sequence: Some(Arc::new(SvgDiagrams)),
        };
        let config = RenderConfig {
            layout_tick_ms: 1,
            ..RenderConfig::default()
        };
        RenderPipeline::new(&engines, &config)
    }

    fn request(source: &str) -> RenderRequest {
        RenderRequest {
            source: source.to_string(),
            base_dir: None,
            title: "doc.md".to_string(),
        }
    }

    const SOURCE: &str = "# Intro\n\nInline $x$.\n\n```mermaid\ngraph TD; A-->B\n```\n\n## Next\n";

    #[tokio::test]
    async fn test_render_settles_everything() {
        let pipeline = pipeline();
        let rendered = pipeline.render(request(SOURCE), &RenderOptions::default()).await;
        let view = &rendered.view;
        let article = view.article();

        assert!(!pipeline
            .gate()
            .has_pending_work(view, article, &pipeline.context(&rendered.presentation)));
        assert_eq!(rendered.report.rendered(), 2);
        assert_eq!(rendered.toc.len(), 2);
        assert!(view.get_element_by_id("toc-heading-1").is_some());
        let html = view.article_html();
        assert!(html.contains("<svg class=\"tex\">1</svg>"));
        assert!(html.contains("data-theme=\"dark\""));
        assert!(rendered.page_count.is_none());
    }

    #[tokio::test]
    async fn test_render_paginates_after_settling() {
        let options = RenderOptions {
            paginate: true,
            ..RenderOptions::default()
        };
        let rendered = pipeline().render(request(SOURCE), &options).await;
        assert_eq!(rendered.page_count, Some(1));
        assert!(is_paginated(&rendered.view));
        let pages = rendered
            .view
            .select_first(rendered.view.content(), |e| e.has_class("pagedjs_pages"))
            .unwrap();
        let copied = rendered.view.inner_html(pages);
        assert!(copied.contains("<svg class=\"tex\">1</svg>"));
        assert!(!copied.contains("data-math-id=\"0\">$x$"));
    }

    #[tokio::test]
    async fn test_theme_change_rerenders_flow_diagrams() {
        let pipeline = pipeline();
        let mut rendered = pipeline.render(request(SOURCE), &RenderOptions::default()).await;
        let presentation = PresentationState {
            theme: Theme::Light,
            ..PresentationState::default()
        };
        pipeline
            .apply_presentation(&mut rendered, &presentation, false)
            .await
            .unwrap();

        let diagram = rendered.view.get_element_by_id("mermaid-diagram-0").unwrap();
        assert_eq!(
            rendered.view.inner_html(diagram),
            "<svg data-theme=\"default\"></svg>"
        );
        assert_eq!(rendered.view.attr(rendered.view.html(), "data-theme"), Some("light"));
    }

    #[tokio::test]
    async fn test_repeated_presentation_changes_do_not_grow_view() {
        let pipeline = pipeline();
        let mut source: String = (0..60)
            .map(|i| format!("Paragraph {} with $x_{}$ inline.\n\n", i, i))
            .collect();
        source.push_str("```mermaid\ngraph TD; A-->B\n```\n");
        let options = RenderOptions {
            paginate: true,
            ..RenderOptions::default()
        };
        let mut rendered = pipeline.render(request(&source), &options).await;

        let toggle = |i: usize| PresentationState {
            theme: if i % 2 == 0 { Theme::Light } else { Theme::Dark },
            ..PresentationState::default()
        };
        for i in 0..2 {
            pipeline
                .apply_presentation(&mut rendered, &toggle(i), true)
                .await
                .unwrap();
        }
        let settled = rendered.view.capacity();
        let live = rendered.view.live_count();

        for i in 0..30 {
            pipeline
                .apply_presentation(&mut rendered, &toggle(i), true)
                .await
                .unwrap();
        }
        assert_eq!(rendered.view.capacity(), settled);
        assert_eq!(rendered.view.live_count(), live);
        assert!(is_paginated(&rendered.view));
    }

    #[tokio::test]
    async fn test_toc_hidden_when_requested() {
        let options = RenderOptions {
            toc_visible: false,
            ..RenderOptions::default()
        };
        let rendered = pipeline().render(request("text\n"), &options).await;
        assert!(!rendered.view.is_toc_visible());
        assert!(rendered.toc.is_empty());
    }
}
