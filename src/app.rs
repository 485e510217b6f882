//! Application controller
//!
//! `Printdown` owns the [`ApplicationState`] and is the single writer of
//! the live view. Every trigger (menu action, edit, file watcher, timer,
//! finished render) arrives as a [`Message`] and is routed by category to
//! one handler. Render cycles run as spawned tasks and report back with
//! their token; a result whose token was superseded is dropped.

use crate::config::Config;
use crate::dialogs::Dialogs;
use crate::error::{AppError, AppResult, ExportError};
use crate::export::{write_html, ExportDocument, PdfExportOrchestrator, PrintToPdf};
use crate::file_handler::{
    read_file, reconcile, stat_file, write_file_atomic, ConflictResolution, FileWatcher,
    Reconciliation, WatchEvent,
};
use crate::message::{
    EditorMessage, FileMessage, InternalMessage, Message, SystemMessage, TabMessage, ViewMessage,
};
use crate::render::embeds::{reset_image_width, resize_image};
use crate::render::{
    Engines, RenderCycles, RenderOptions, RenderPipeline, RenderToken, RenderedView,
};
use crate::state::{ApplicationState, Document, DocumentId, SessionRecord, SessionStore, StatusLevel};
use crate::utils::{path::absolutize, Debouncer};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Host-provided collaborators
pub struct Collaborators {
    pub engines: Engines,
    pub printer: Arc<dyn PrintToPdf>,
    pub dialogs: Arc<dyn Dialogs>,
    /// `None` disables session persistence
    pub session: Option<SessionStore>,
}

/// The materialized view of the active document
#[derive(Debug)]
pub struct LiveView {
    pub document: DocumentId,
    pub rendered: RenderedView,
}

/// Files rewritten after every committed render (watch mode)
#[derive(Debug, Clone, Default)]
pub struct OutputTargets {
    pub html: Option<PathBuf>,
    pub pdf: bool,
}

/// Printdown application
pub struct Printdown {
    /// Application state
    pub state: ApplicationState,

    /// User configuration
    pub config: Config,

    pipeline: RenderPipeline,
    exporter: PdfExportOrchestrator,
    dialogs: Arc<dyn Dialogs>,
    session: Option<SessionStore>,

    cycles: RenderCycles,
    edits: Debouncer<DocumentId>,
    repaginate_generation: u64,
    live: Option<LiveView>,
    outputs: OutputTargets,

    watcher: Option<FileWatcher>,
    watch_rx: Option<UnboundedReceiver<WatchEvent>>,

    tx: UnboundedSender<Message>,
    rx: Option<UnboundedReceiver<Message>>,
}

impl Printdown {
    pub fn new(config: Config, collaborators: Collaborators) -> Self {
        let pipeline = RenderPipeline::new(&collaborators.engines, &config.render);
        let exporter = PdfExportOrchestrator::new(
            pipeline.gate().clone(),
            collaborators.printer,
            Arc::clone(&collaborators.dialogs),
            config.render.engine_timeout(),
        );

        let (watcher, watch_rx) = if config.files.watch_files {
            let (watch_tx, watch_rx) = unbounded_channel();
            match FileWatcher::new(watch_tx) {
                Ok(watcher) => (Some(watcher), Some(watch_rx)),
                Err(e) => {
                    log::warn!("{}; external changes will not be detected", e);
                    (None, None)
                }
            }
        } else {
            (None, None)
        };

        let (tx, rx) = unbounded_channel();

        Self {
            state: ApplicationState::new(&config.ui),
            edits: Debouncer::new(config.render.debounce()),
            config,
            pipeline,
            exporter,
            dialogs: collaborators.dialogs,
            session: collaborators.session,
            cycles: RenderCycles::new(),
            repaginate_generation: 0,
            live: None,
            outputs: OutputTargets::default(),
            watcher,
            watch_rx,
            tx,
            rx: Some(rx),
        }
    }

    /// Sender for feeding messages into the run loop
    pub fn sender(&self) -> UnboundedSender<Message> {
        self.tx.clone()
    }

    pub fn live_view(&self) -> Option<&LiveView> {
        self.live.as_ref()
    }

    pub fn set_outputs(&mut self, outputs: OutputTargets) {
        self.outputs = outputs;
    }

    /// Handle incoming messages
    pub async fn update(&mut self, message: Message) {
        match message {
            Message::File(msg) => self.handle_file_message(msg).await,
            Message::Tab(msg) => self.handle_tab_message(msg),
            Message::Editor(msg) => self.handle_editor_message(msg),
            Message::View(msg) => self.handle_view_message(msg).await,
            Message::System(msg) => self.handle_system_message(msg),
            Message::Internal(msg) => self.handle_internal_message(msg).await,
            Message::None => {}
        }
    }

    /// Process messages until a quit is requested
    pub async fn run(&mut self) -> AppResult<()> {
        let mut messages = self
            .rx
            .take()
            .ok_or_else(|| AppError::Unexpected("run loop already started".to_string()))?;
        let mut watch_events = self.watch_rx.take();

        while !self.state.quit_requested {
            tokio::select! {
                message = messages.recv() => match message {
                    Some(message) => self.update(message).await,
                    None => break,
                },
                Some(event) = next_watch_event(&mut watch_events) => {
                    self.update(Message::File(FileMessage::ExternalChange(event))).await;
                }
            }
        }

        self.rx = Some(messages);
        self.watch_rx = watch_events;
        Ok(())
    }

    /// Receive and handle one queued message; false when none can arrive
    pub async fn step(&mut self) -> bool {
        let Some(rx) = self.rx.as_mut() else {
            return false;
        };
        match rx.recv().await {
            Some(message) => {
                self.update(message).await;
                true
            }
            None => false,
        }
    }

    /// Open the documents of the previous session
    pub async fn restore_session(&mut self) {
        let Some(store) = self.session.as_ref() else {
            return;
        };
        let record = store.load_or_default();
        record.apply_presentation(&mut self.state);

        let opened = self.open_documents(&record.open_paths).await;
        let active = record
            .active_index
            .and_then(|i| record.open_paths.get(i))
            .and_then(|path| self.state.find_document_by_path(&absolutize(path)));
        if let Some(id) = active {
            self.state.tabs.set_active(id);
        }
        log::info!("Restored {} document(s) from session", opened.len());
        self.show_active();
    }

    /// Render the active document now and commit it, superseding any cycle
    /// in flight
    pub async fn render_active(&mut self) -> Option<&RenderedView> {
        let id = self.state.active_document_id()?;
        let request = self.state.get_document(id)?.render_request();
        self.edits.reset(id);
        let token = self.cycles.begin(id);
        let options = self.render_options();
        let rendered = self.pipeline.render(request, &options).await;
        self.commit_render(token, rendered).await;
        self.live.as_ref().map(|live| &live.rendered)
    }

    /// Write the configured outputs for the live view
    pub async fn write_outputs(&mut self) -> AppResult<()> {
        let Some(live) = self.live.as_ref() else {
            return Ok(());
        };
        if let Some(path) = self.outputs.html.as_deref() {
            write_html(&live.rendered.view, path).await?;
        }
        if self.outputs.pdf {
            self.export_active().await?;
        }
        Ok(())
    }

    // Handlers

    async fn handle_file_message(&mut self, msg: FileMessage) {
        match msg {
            FileMessage::Open => {
                let paths = self.dialogs.pick_open_files().await;
                if !paths.is_empty() {
                    self.open_documents(&paths).await;
                    self.show_active();
                }
            }

            FileMessage::OpenPaths(paths) => {
                self.open_documents(&paths).await;
                self.show_active();
            }

            FileMessage::Save => self.save_active().await,

            FileMessage::ExportPdf => {
                // Failures were already reported by the orchestrator
                let _ = self.export_active().await;
            }

            FileMessage::ExternalChange(event) => self.handle_external_change(event).await,
        }
    }

    fn handle_tab_message(&mut self, msg: TabMessage) {
        match msg {
            TabMessage::Select(id) => {
                self.state.tabs.set_active(id);
            }
            TabMessage::Next => self.state.tabs.next_tab(),
            TabMessage::Previous => self.state.tabs.prev_tab(),
            TabMessage::Close(id) => {
                if let Some(doc) = self.state.close_document(id) {
                    self.forget_document(&doc);
                }
            }
            TabMessage::CloseCurrent => {
                if let Some(id) = self.state.active_document_id() {
                    if let Some(doc) = self.state.close_document(id) {
                        self.forget_document(&doc);
                    }
                }
            }
            TabMessage::CloseAll => {
                for doc in self.state.close_all() {
                    self.forget_document(&doc);
                }
            }
            TabMessage::CloseOthers => {
                for doc in self.state.close_others() {
                    self.forget_document(&doc);
                }
            }
        }
        self.show_active();
        self.save_session();
    }

    fn handle_editor_message(&mut self, msg: EditorMessage) {
        match msg {
            EditorMessage::TextChanged { document_id, text } => {
                let changed = self
                    .state
                    .get_document_mut(document_id)
                    .map(|doc| doc.set_content(&text))
                    .unwrap_or(false);
                if !changed {
                    return;
                }
                self.state.refresh_title(document_id);

                let generation = self.edits.trigger(document_id);
                let delay = self.edits.delay();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(Message::Internal(InternalMessage::EditSettled {
                        document_id,
                        generation,
                    }));
                });
            }

            EditorMessage::ResizeImage { src, percent } => {
                let Some(live) = self.live.as_mut() else {
                    return;
                };
                let view = &mut live.rendered.view;
                let article = view.article();
                let applied = resize_image(view, article, &src, percent, &mut self.state.image_widths);
                log::debug!("Resized {} to {}%", src, applied);
                self.schedule_repaginate();
                self.save_session();
            }

            EditorMessage::ResetImage { src } => {
                let Some(live) = self.live.as_mut() else {
                    return;
                };
                let view = &mut live.rendered.view;
                let article = view.article();
                reset_image_width(view, article, &src, &mut self.state.image_widths);
                self.schedule_repaginate();
                self.save_session();
            }
        }
    }

    async fn handle_view_message(&mut self, msg: ViewMessage) {
        match msg {
            ViewMessage::FontIncrease => self.state.presentation.font_scale.increase(),
            ViewMessage::FontDecrease => self.state.presentation.font_scale.decrease(),
            ViewMessage::FontReset => self.state.presentation.font_scale.reset(),
            ViewMessage::ImageIncrease => self.state.presentation.image_scale.increase(),
            ViewMessage::ImageDecrease => self.state.presentation.image_scale.decrease(),
            ViewMessage::ImageReset => self.state.presentation.image_scale.reset(),
            ViewMessage::SetTheme(theme) => self.state.presentation.theme = theme,
            ViewMessage::SetPageSettings(settings) => {
                if let Err(e) = settings.validate() {
                    self.state
                        .set_status(format!("Page setup rejected: {}", e), StatusLevel::Error);
                    return;
                }
                self.state.presentation.page = settings;
            }
            ViewMessage::TogglePagePreview => {
                self.state.pagination_enabled = !self.state.pagination_enabled;
            }
            ViewMessage::ToggleToc => {
                self.state.toc_visible = !self.state.toc_visible;
                if let Some(live) = self.live.as_mut() {
                    live.rendered.view.set_toc_visible(self.state.toc_visible);
                }
                return;
            }
        }
        self.presentation_changed().await;
        self.save_session();
    }

    fn handle_system_message(&mut self, msg: SystemMessage) {
        match msg {
            SystemMessage::Quit => {
                if self.state.has_unsaved_changes() {
                    log::warn!("Quitting with unsaved changes");
                }
                self.save_session();
                self.state.quit_requested = true;
            }
            SystemMessage::Error(error) => self.state.set_status(error, StatusLevel::Error),
            SystemMessage::ClearStatus => self.state.clear_status(),
        }
    }

    async fn handle_internal_message(&mut self, msg: InternalMessage) {
        match msg {
            InternalMessage::EditSettled {
                document_id,
                generation,
            } => {
                if self.edits.fire(document_id, generation)
                    && self.state.active_document_id() == Some(document_id)
                {
                    self.start_render(document_id);
                }
            }

            InternalMessage::RenderFinished { token, rendered } => {
                if self.commit_render(token, *rendered).await {
                    if let Err(e) = self.write_outputs().await {
                        log::error!("Failed to write outputs: {}", e);
                    }
                }
            }

            InternalMessage::RepaginateDue { generation } => {
                if generation != self.repaginate_generation || !self.state.pagination_enabled {
                    return;
                }
                if let Some(live) = self.live.as_mut() {
                    if let Err(e) = self.pipeline.repaginate(&mut live.rendered).await {
                        self.state
                            .set_status(format!("Pagination skipped: {}", e), StatusLevel::Warning);
                    }
                }
            }
        }
    }

    // Documents

    /// Read and add documents; returns the IDs that opened
    async fn open_documents(&mut self, paths: &[PathBuf]) -> Vec<DocumentId> {
        let mut opened = Vec::new();
        for path in paths {
            let path = absolutize(path);
            if !self.config.files.accepts(&path) {
                log::warn!("Opening {} although it has no Markdown extension", path.display());
            }
            if let Some(existing) = self.state.find_document_by_path(&path) {
                self.state.tabs.set_active(existing);
                opened.push(existing);
                continue;
            }

            match read_file(&path, self.config.files.max_file_size).await {
                Ok(read) => {
                    let doc = Document::from_file(path.clone(), &read.content, Some(read.stat));
                    let id = self.state.add_document(doc);
                    self.watch(&path);
                    log::info!("Opened {}", path.display());
                    if read.lossy {
                        self.state.set_status(
                            format!("{} contains invalid UTF-8; some characters were replaced", path.display()),
                            StatusLevel::Warning,
                        );
                    }
                    opened.push(id);
                }
                Err(e) => {
                    self.state.set_status(
                        format!("Failed to open {}: {}", path.display(), e.user_message()),
                        StatusLevel::Error,
                    );
                }
            }
        }
        opened
    }

    fn watch(&mut self, path: &Path) {
        if let Some(watcher) = self.watcher.as_mut() {
            if let Err(e) = watcher.watch(path) {
                log::warn!("{}", e);
            }
        }
    }

    fn forget_document(&mut self, doc: &Document) {
        if doc.modified {
            log::warn!("Closed {} with unsaved changes", doc.display_name);
        }
        if let (Some(watcher), Some(path)) = (self.watcher.as_mut(), doc.path.as_ref()) {
            watcher.unwatch(path);
        }
        self.cycles.cancel(doc.id);
        self.edits.reset(doc.id);
        if self.live.as_ref().map(|l| l.document) == Some(doc.id) {
            self.live = None;
        }
    }

    async fn save_active(&mut self) {
        let Some(doc) = self.state.active_document() else {
            return;
        };
        let Some(path) = doc.path.clone() else {
            self.state
                .set_status("Untitled documents cannot be saved here", StatusLevel::Warning);
            return;
        };
        let id = doc.id;
        let content = doc.content_str();

        match write_file_atomic(&path, &content).await {
            Ok(stat) => {
                if let Some(doc) = self.state.get_document_mut(id) {
                    doc.mark_saved(stat);
                }
                self.state.refresh_title(id);
                self.state
                    .set_status(format!("Saved {}", path.display()), StatusLevel::Info);
            }
            Err(e) => {
                log::error!("Save failed: {}", e);
                self.dialogs.show_error("Save Failed", &e.user_message()).await;
            }
        }
    }

    async fn reload_document(&mut self, id: DocumentId) {
        let Some(path) = self.state.get_document(id).and_then(|d| d.path.clone()) else {
            return;
        };
        match read_file(&path, self.config.files.max_file_size).await {
            Ok(read) => {
                if let Some(doc) = self.state.get_document_mut(id) {
                    doc.reload(&read.content, read.stat);
                }
                self.edits.reset(id);
                self.state.refresh_title(id);
                log::info!("Reloaded {} from disk", path.display());
                if self.state.active_document_id() == Some(id) {
                    self.start_render(id);
                }
            }
            Err(e) => self.state.set_status(
                format!("Failed to reload {}: {}", path.display(), e.user_message()),
                StatusLevel::Error,
            ),
        }
    }

    async fn handle_external_change(&mut self, event: WatchEvent) {
        let path = match &event {
            WatchEvent::Changed(path) | WatchEvent::Removed(path) => path.clone(),
            WatchEvent::Error(e) => {
                log::warn!("File watcher error: {}", e);
                return;
            }
        };
        let Some(id) = self.state.find_document_by_path(&path) else {
            return;
        };

        let current = stat_file(&path).await.ok();
        let Some(doc) = self.state.get_document(id) else {
            return;
        };
        match reconcile(&path, doc.last_known_stat, current, doc.modified) {
            Reconciliation::Ignore => {
                log::debug!("Ignoring unchanged {}", path.display());
            }
            Reconciliation::Reload => self.reload_document(id).await,
            Reconciliation::Prompt(conflict) => {
                match self.dialogs.resolve_conflict(&conflict).await {
                    ConflictResolution::ReloadFromDisk => self.reload_document(id).await,
                    ConflictResolution::KeepLocal => {
                        // Remember the disk state so the same change is not asked about again
                        if let Some(doc) = self.state.get_document_mut(id) {
                            doc.last_known_stat = current;
                        }
                        self.state.set_status(
                            format!("Kept local changes to {}", path.display()),
                            StatusLevel::Warning,
                        );
                    }
                }
            }
            Reconciliation::Removed => {
                self.state.set_status(
                    format!("{} was deleted from disk", path.display()),
                    StatusLevel::Warning,
                );
            }
        }
    }

    // Rendering

    fn render_options(&self) -> RenderOptions {
        RenderOptions {
            presentation: self.state.presentation.clone(),
            paginate: self.state.pagination_enabled,
            toc_visible: self.state.toc_visible,
            image_widths: self.state.image_widths.clone(),
        }
    }

    /// Rebuild the view for the active document, discarding any other
    fn show_active(&mut self) {
        match self.state.active_document_id() {
            Some(id) => {
                if self.live.as_ref().map(|l| l.document) != Some(id) {
                    self.live = None;
                }
                self.start_render(id);
            }
            None => self.live = None,
        }
    }

    /// Spawn a render cycle for `id`, superseding any cycle in flight
    fn start_render(&mut self, id: DocumentId) {
        let Some(doc) = self.state.get_document(id) else {
            return;
        };
        let request = doc.render_request();
        let token = self.cycles.begin(id);
        let options = self.render_options();
        let pipeline = self.pipeline.clone();
        let tx = self.tx.clone();

        log::debug!("Render cycle {} started for {}", token.generation, doc.display_name);
        tokio::spawn(async move {
            let rendered = pipeline.render(request, &options).await;
            let _ = tx.send(Message::Internal(InternalMessage::RenderFinished {
                token,
                rendered: Box::new(rendered),
            }));
        });
    }

    /// Make a finished render the live view; false when it was superseded
    async fn commit_render(&mut self, token: RenderToken, mut rendered: RenderedView) -> bool {
        if !self.cycles.finish(token) {
            return false;
        }
        if self.state.active_document_id() != Some(token.document) {
            log::debug!("Dropping render of inactive document {}", token.document);
            return false;
        }

        // Presentation may have changed while the cycle was settling
        let pagination_stale = rendered.page_count.is_some() != self.state.pagination_enabled;
        if rendered.presentation != self.state.presentation || pagination_stale {
            if let Err(e) = self
                .pipeline
                .apply_presentation(&mut rendered, &self.state.presentation, self.state.pagination_enabled)
                .await
            {
                log::warn!("Pagination skipped: {}", e);
            }
        }
        rendered.view.set_toc_visible(self.state.toc_visible);

        if let Some(doc) = self.state.get_document_mut(token.document) {
            doc.toc = rendered.toc.clone();
        }
        log::debug!(
            "Committed render {} ({} rendered, {} failed)",
            token.generation,
            rendered.report.rendered(),
            rendered.report.failed()
        );
        self.live = Some(LiveView {
            document: token.document,
            rendered,
        });
        self.save_session();
        true
    }

    async fn presentation_changed(&mut self) {
        let Some(live) = self.live.as_mut() else {
            return;
        };
        if let Err(e) = self
            .pipeline
            .apply_presentation(&mut live.rendered, &self.state.presentation, false)
            .await
        {
            log::warn!("{}", e);
        }
        self.schedule_repaginate();
    }

    /// Re-paginate once presentation changes have settled
    fn schedule_repaginate(&mut self) {
        if !self.state.pagination_enabled {
            return;
        }
        self.repaginate_generation += 1;
        let generation = self.repaginate_generation;
        let delay = self.config.render.pagination_settle();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(Message::Internal(InternalMessage::RepaginateDue { generation }));
        });
    }

    // Export and persistence

    async fn export_active(&mut self) -> Result<Option<PathBuf>, ExportError> {
        let Some(id) = self.state.active_document_id() else {
            let err = ExportError::NoDocument;
            self.dialogs
                .show_error("PDF Export Failed", &err.user_message())
                .await;
            return Err(err);
        };

        // Edits since the last committed render must be in the capture
        let stale = self.edits.is_pending(id)
            || self.cycles.in_flight(id)
            || self.live.as_ref().map(|l| l.document) != Some(id);
        if stale {
            self.render_active().await;
        }

        let Some(doc) = self.state.get_document(id) else {
            return Err(ExportError::NoDocument);
        };
        let document = ExportDocument {
            path: doc.path.clone(),
            display_name: doc.display_name.clone(),
        };
        let Some(live) = self.live.as_mut() else {
            return Err(ExportError::NoDocument);
        };

        let result = self
            .exporter
            .export_to_pdf(&mut live.rendered.view, &document, &self.state.presentation)
            .await;
        match &result {
            Ok(Some(path)) => self
                .state
                .set_status(format!("Exported PDF to {}", path.display()), StatusLevel::Info),
            Ok(None) => {}
            Err(e) => self
                .state
                .set_status(format!("PDF export failed: {}", e), StatusLevel::Error),
        }
        result
    }

    fn save_session(&self) {
        let Some(store) = self.session.as_ref() else {
            return;
        };
        if let Err(e) = store.save(&SessionRecord::capture(&self.state)) {
            log::warn!("{}", e);
        }
    }
}

async fn next_watch_event(rx: &mut Option<UnboundedReceiver<WatchEvent>>) -> Option<WatchEvent> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExportResult;
    use crate::export::PdfPageOptions;
    use crate::file_handler::FileConflict;
    use crate::menu::Action;
    use crate::pagination::is_paginated;
    use crate::presentation::Theme;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct FakeDialogs {
        destination: Option<PathBuf>,
        resolution: Option<ConflictResolution>,
        errors: Mutex<Vec<String>>,
        conflicts: Mutex<Vec<FileConflict>>,
    }

    #[async_trait::async_trait]
    impl Dialogs for FakeDialogs {
        async fn pick_pdf_destination(&self, _suggested: &Path) -> Option<PathBuf> {
            self.destination.clone()
        }

        async fn pick_open_files(&self) -> Vec<PathBuf> {
            Vec::new()
        }

        async fn show_error(&self, title: &str, message: &str) {
            self.errors.lock().unwrap().push(format!("{}: {}", title, message));
        }

        async fn resolve_conflict(&self, conflict: &FileConflict) -> ConflictResolution {
            self.conflicts.lock().unwrap().push(conflict.clone());
            self.resolution.unwrap_or(ConflictResolution::KeepLocal)
        }
    }

    struct FakePrinter;

    #[async_trait::async_trait]
    impl PrintToPdf for FakePrinter {
        async fn print_to_pdf(&self, html: &str, _options: &PdfPageOptions) -> ExportResult<Vec<u8>> {
            Ok(format!("%PDF-1.4\n{}", html).into_bytes())
        }
    }

    fn test_config() -> Config {
        let mut config = Config::default();
        config.files.watch_files = false;
        config.render.debounce_ms = 300;
        config.render.layout_tick_ms = 1;
        config.render.pagination_settle_ms = 120;
        config.ui.pagination_enabled = false;
        config
    }

    fn app_with(dialogs: Arc<FakeDialogs>, session: Option<SessionStore>) -> Printdown {
        Printdown::new(
            test_config(),
            Collaborators {
                engines: Engines::default(),
                printer: Arc::new(FakePrinter),
                dialogs,
                session,
            },
        )
    }

    fn app() -> Printdown {
        app_with(Arc::new(FakeDialogs::default()), None)
    }

    fn untitled(app: &mut Printdown, text: &str) -> DocumentId {
        let mut doc = Document::new();
        doc.set_content(text);
        app.state.add_document(doc)
    }

    fn live_html(app: &Printdown) -> String {
        app.live_view()
            .map(|live| live.rendered.view.article_html())
            .unwrap_or_default()
    }

    fn has_queued_message(app: &mut Printdown) -> bool {
        app.rx.as_mut().map(|rx| rx.try_recv().is_ok()).unwrap_or(false)
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_render_is_not_committed() {
        let mut app = app();
        let id = untitled(&mut app, "# One");
        app.start_render(id);

        app.state.get_document_mut(id).unwrap().set_content("# Two");
        app.start_render(id);

        assert!(app.step().await);
        assert!(app.step().await);
        let html = live_html(&app);
        assert!(html.contains("Two"));
        assert!(!html.contains("One"));
        assert_eq!(app.state.get_document(id).unwrap().toc[0].text, "Two");
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_edits_trigger_one_render() {
        let mut app = app();
        let id = untitled(&mut app, "");
        for text in ["# A", "# AB", "# ABC"] {
            app.update(Message::Editor(EditorMessage::TextChanged {
                document_id: id,
                text: text.to_string(),
            }))
            .await;
        }
        assert_eq!(app.state.tabs.tabs[0].title, "• Untitled");

        // Three settle notifications, then the single render
        for _ in 0..4 {
            assert!(app.step().await);
        }
        assert!(live_html(&app).contains("ABC"));
        assert!(!has_queued_message(&mut app));
        assert!(!app.cycles.in_flight(id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tab_actions_rebuild_the_active_view() {
        let mut app = app();
        let first = untitled(&mut app, "# First");
        let second = untitled(&mut app, "# Second");

        app.update(Action::PreviousTab.to_message()).await;
        assert_eq!(app.state.active_document_id(), Some(first));
        assert!(app.step().await);
        assert_eq!(app.live_view().map(|l| l.document), Some(first));

        app.update(Action::CloseTab.to_message()).await;
        assert_eq!(app.state.active_document_id(), Some(second));
        assert!(app.live_view().is_none());
        assert!(app.step().await);
        assert!(live_html(&app).contains("Second"));

        app.update(Action::CloseAll.to_message()).await;
        assert!(app.live_view().is_none());
        assert_eq!(app.state.document_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_presentation_change_restyles_and_repaginates() {
        let mut app = app();
        untitled(&mut app, "# Title\n\ntext");
        app.render_active().await;
        assert!(!is_paginated(&app.live_view().unwrap().rendered.view));

        app.update(Action::TogglePagePreview.to_message()).await;
        app.update(Message::View(ViewMessage::SetTheme(Theme::Light))).await;
        assert_eq!(app.live_view().unwrap().rendered.presentation.theme, Theme::Light);

        // Two scheduled repaginations; only the latest runs
        assert!(app.step().await);
        assert!(!is_paginated(&app.live_view().unwrap().rendered.view));
        assert!(app.step().await);
        let live = app.live_view().unwrap();
        assert!(is_paginated(&live.rendered.view));
        assert_eq!(live.rendered.page_count, Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_image_scale_actions_update_live_view() {
        let mut app = app();
        untitled(&mut app, "![a](a.png)");
        app.render_active().await;

        app.update(Action::ImageIncrease.to_message()).await;
        app.update(Action::ImageIncrease.to_message()).await;
        let view = &app.live_view().unwrap().rendered.view;
        assert_eq!(view.style_property(view.html(), "--image-scale").as_deref(), Some("1.2"));

        app.update(Action::ImageReset.to_message()).await;
        let view = &app.live_view().unwrap().rendered.view;
        assert_eq!(view.style_property(view.html(), "--image-scale").as_deref(), Some("1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_page_setup_leaves_settings_unchanged() {
        let mut app = app();
        let before = app.state.presentation.page.clone();
        let mut bad = before.clone();
        bad.margins.top = "wide".to_string();

        app.update(Message::View(ViewMessage::SetPageSettings(bad))).await;
        assert_eq!(app.state.presentation.page, before);
        assert_eq!(
            app.state.status_message.as_ref().map(|s| s.level),
            Some(StatusLevel::Error)
        );
    }

    #[tokio::test]
    async fn test_export_flushes_pending_edits() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("out.pdf");
        let dialogs = Arc::new(FakeDialogs {
            destination: Some(destination.clone()),
            ..FakeDialogs::default()
        });
        let mut app = app_with(dialogs, None);
        let id = untitled(&mut app, "# Old");
        app.render_active().await;

        app.update(Message::Editor(EditorMessage::TextChanged {
            document_id: id,
            text: "# New".to_string(),
        }))
        .await;
        app.update(Action::ExportPdf.to_message()).await;

        let pdf = std::fs::read_to_string(&destination).unwrap();
        assert!(pdf.starts_with("%PDF-1.4"));
        assert!(pdf.contains("New"));
        assert!(!pdf.contains("Old"));
    }

    #[tokio::test]
    async fn test_export_without_document_reports_error() {
        let dialogs = Arc::new(FakeDialogs::default());
        let mut app = app_with(Arc::clone(&dialogs), None);
        app.update(Action::ExportPdf.to_message()).await;
        let errors = dialogs.errors.lock().unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("No document to export"));
    }

    #[tokio::test]
    async fn test_external_edit_without_local_changes_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.md");
        std::fs::write(&path, "# Before\n").unwrap();

        let mut app = app();
        app.update(Message::File(FileMessage::OpenPaths(vec![path.clone()]))).await;
        assert!(app.step().await);
        assert!(live_html(&app).contains("Before"));

        std::fs::write(&path, "# After the change\n").unwrap();
        let disk = stat_file(&path).await.unwrap();
        let watched = absolutize(&path);
        app.update(Message::File(FileMessage::ExternalChange(WatchEvent::Changed(watched))))
            .await;

        let doc = app.state.active_document().unwrap();
        assert_eq!(doc.content_str(), "# After the change\n");
        assert!(!doc.modified);
        assert_eq!(doc.last_known_stat, Some(disk));

        assert!(app.step().await);
        assert!(live_html(&app).contains("After the change"));
    }

    #[tokio::test]
    async fn test_external_edit_with_local_changes_prompts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.md");
        std::fs::write(&path, "# Disk\n").unwrap();

        let dialogs = Arc::new(FakeDialogs {
            resolution: Some(ConflictResolution::KeepLocal),
            ..FakeDialogs::default()
        });
        let mut app = app_with(Arc::clone(&dialogs), None);
        app.update(Message::File(FileMessage::OpenPaths(vec![path.clone()]))).await;
        let id = app.state.active_document_id().unwrap();
        app.state.get_document_mut(id).unwrap().set_content("# Local\n");

        std::fs::write(&path, "# Disk, edited elsewhere\n").unwrap();
        let event = WatchEvent::Changed(absolutize(&path));
        app.update(Message::File(FileMessage::ExternalChange(event.clone()))).await;

        assert_eq!(dialogs.conflicts.lock().unwrap().len(), 1);
        let doc = app.state.get_document(id).unwrap();
        assert_eq!(doc.content_str(), "# Local\n");
        assert!(doc.modified);

        // Same disk state again: nothing more to ask
        app.update(Message::File(FileMessage::ExternalChange(event))).await;
        assert_eq!(dialogs.conflicts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save_writes_and_clears_modified() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.md");
        std::fs::write(&path, "one").unwrap();

        let mut app = app();
        app.update(Message::File(FileMessage::OpenPaths(vec![path.clone()]))).await;
        let id = app.state.active_document_id().unwrap();
        app.state.get_document_mut(id).unwrap().set_content("two");

        app.update(Action::Save.to_message()).await;
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "two");
        let doc = app.state.get_document(id).unwrap();
        assert!(!doc.modified);
        assert_eq!(doc.last_known_stat, Some(stat_file(&path).await.unwrap()));
    }

    #[tokio::test]
    async fn test_session_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.md");
        let b = dir.path().join("b.md");
        std::fs::write(&a, "# A").unwrap();
        std::fs::write(&b, "# B").unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));

        let mut app = app_with(Arc::new(FakeDialogs::default()), Some(store.clone()));
        app.update(Message::File(FileMessage::OpenPaths(vec![a.clone(), b.clone()]))).await;
        app.update(Action::PreviousTab.to_message()).await;
        app.update(Action::FontIncrease.to_message()).await;
        app.update(Action::ImageDecrease.to_message()).await;
        app.update(Action::Quit.to_message()).await;
        assert!(app.state.quit_requested);

        let mut restored = app_with(Arc::new(FakeDialogs::default()), Some(store));
        restored.restore_session().await;
        assert_eq!(restored.state.document_count(), 2);
        assert_eq!(
            restored.state.active_document().and_then(|d| d.path.clone()),
            Some(absolutize(&a))
        );
        assert_eq!(restored.state.presentation.font_scale.value(), 1.05);
        assert_eq!(restored.state.presentation.image_scale.value(), 0.9);
    }

    #[tokio::test]
    async fn test_run_loop_stops_on_quit() {
        let mut app = app();
        let tx = app.sender();
        tx.send(Action::FontIncrease.to_message()).unwrap();
        tx.send(Action::Quit.to_message()).unwrap();

        tokio::time::timeout(Duration::from_secs(5), app.run())
            .await
            .unwrap()
            .unwrap();
        assert!(app.state.quit_requested);
        assert_eq!(app.state.presentation.font_scale.value(), 1.05);
    }
}
