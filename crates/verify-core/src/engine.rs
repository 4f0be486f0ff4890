//! Overlay engine
//!
//! One engine is built per page load. It owns the page's report entry, the
//! manual-check store and the renderer, and is driven entirely through
//! [`OverlayEngine::dispatch`] once mounted.
//!
//! Lifecycle:
//! 1. [`OverlayEngine::from_report`] resolves the current page (a miss means
//!    the overlay stays off)
//! 2. [`OverlayEngine::mount`] highlights numbers and renders the summary
//! 3. events flow through [`OverlayEngine::dispatch`]
//! 4. [`OverlayEngine::teardown`] removes every trace from the page

use crate::config::OverlayConfig;
use crate::detail::DetailView;
use crate::error::VerifyError;
use crate::event::OverlayEvent;
use crate::matcher::{RecordIndex, Segment};
use crate::render::{MarkerSpec, Piece, Renderer};
use crate::report::{PageEntry, VerificationReport};
use crate::resolver::require_page;
use crate::status::Status;
use crate::store::{CheckKey, ManualCheckStore, StorageBackend};
use crate::summary::Summary;

/// A marker placed on the page
#[derive(Debug, Clone)]
pub struct PlacedMarker<M> {
    pub id: usize,
    /// Index into `PageEntry::records()` order
    pub record: usize,
    pub handle: M,
}

pub struct OverlayEngine<R: Renderer, S: StorageBackend> {
    page: PageEntry,
    index: RecordIndex,
    store: ManualCheckStore<S>,
    renderer: R,
    markers: Vec<PlacedMarker<R::Marker>>,
    highlighted: bool,
    mounted: bool,
    enabled: bool,
    open_detail: Option<usize>,
}

fn check_key(page: &PageEntry, record: usize) -> Option<CheckKey> {
    page.record_at(record)
        .map(|(r, _)| CheckKey::new(&page.file, r.line, &r.value))
}

fn record_status<S: StorageBackend>(
    page: &PageEntry,
    store: &ManualCheckStore<S>,
    record: usize,
) -> Status {
    match page.record_at(record) {
        Some((r, auto)) => Status::resolve(
            auto,
            store.is_checked(&CheckKey::new(&page.file, r.line, &r.value)),
        ),
        None => Status::Unverified,
    }
}

impl<R: Renderer, S: StorageBackend> OverlayEngine<R, S> {
    pub fn new(page: PageEntry, store: ManualCheckStore<S>, renderer: R) -> Self {
        let index = RecordIndex::new(&page);
        let enabled = store.enabled();
        Self {
            page,
            index,
            store,
            renderer,
            markers: Vec::new(),
            highlighted: false,
            mounted: false,
            enabled,
            open_detail: None,
        }
    }

    /// Build an engine for the page at `path`
    ///
    /// # Errors
    ///
    /// `VerifyError::PageNotFound` when the report has no entry for the page.
    pub fn from_report(
        report: &VerificationReport,
        path: &str,
        config: &OverlayConfig,
        renderer: R,
        backend: S,
    ) -> Result<Self, VerifyError> {
        let page = require_page(report, path)?.clone();
        tracing::debug!(
            "Page {} resolved to report entry {} ({} records)",
            path,
            page.file,
            page.record_count()
        );
        let store = ManualCheckStore::load(backend, &config.manual_checks_key, &config.enabled_key);
        Ok(Self::new(page, store, renderer))
    }

    /// Highlight numbers and render the summary panel
    pub fn mount(&mut self) -> Result<usize, VerifyError> {
        let placed = self.highlight()?;
        self.mounted = true;
        self.renderer.set_enabled(self.enabled)?;
        self.render_summary()?;
        tracing::info!(
            "Verification overlay mounted on {}: {} markers",
            self.page.file,
            self.markers.len()
        );
        Ok(placed)
    }

    /// Wrap matched numbers in markers; returns how many were placed
    ///
    /// Runs once per engine. Later calls place nothing, and the renderer's
    /// traversal skips marker nodes, so existing markers are never re-wrapped.
    pub fn highlight(&mut self) -> Result<usize, VerifyError> {
        if self.highlighted {
            return Ok(0);
        }
        self.highlighted = true;

        if self.index.is_empty() {
            return Ok(0);
        }

        let mut placed = 0;
        for node in self.renderer.text_nodes() {
            let text = self.renderer.text_of(&node);
            let Some(segments) = self.index.segment(&text) else {
                continue;
            };

            let mut pending = Vec::new();
            let mut pieces = Vec::with_capacity(segments.len());
            for segment in &segments {
                match *segment {
                    Segment::Text(t) => pieces.push(Piece::Text(t)),
                    Segment::Match { text, record } => {
                        let Some((r, _)) = self.page.record_at(record) else {
                            pieces.push(Piece::Text(text));
                            continue;
                        };
                        let id = self.markers.len() + pending.len();
                        pieces.push(Piece::Marker(MarkerSpec {
                            id,
                            value: text,
                            record: r,
                            status: record_status(&self.page, &self.store, record),
                        }));
                        pending.push((id, record));
                    }
                }
            }

            let handles = self.renderer.replace_text(&node, &pieces)?;
            if handles.len() != pending.len() {
                return Err(VerifyError::Render(format!(
                    "expected {} markers, renderer placed {}",
                    pending.len(),
                    handles.len()
                )));
            }
            placed += handles.len();
            self.markers.extend(
                pending
                    .into_iter()
                    .zip(handles)
                    .map(|((id, record), handle)| PlacedMarker { id, record, handle }),
            );
        }

        tracing::debug!("Placed {} markers on {}", placed, self.page.file);
        Ok(placed)
    }

    /// Re-apply marker statuses and the summary without touching text
    pub fn refresh(&mut self) -> Result<(), VerifyError> {
        for marker in &self.markers {
            let status = record_status(&self.page, &self.store, marker.record);
            self.renderer.set_marker_status(&marker.handle, status)?;
        }
        self.render_summary()?;
        if let Some(id) = self.open_detail {
            self.show_detail(id)?;
        }
        Ok(())
    }

    /// Single entry point for user interaction
    pub fn dispatch(&mut self, event: OverlayEvent) -> Result<(), VerifyError> {
        tracing::debug!("Overlay event: {:?}", event);
        match event {
            OverlayEvent::MarkerSelected { id } => self.show_detail(id),
            OverlayEvent::ManualCheckChanged { id, checked } => self.set_manual_check(id, checked),
            OverlayEvent::ManualCheckToggled { id } => {
                let key = self
                    .marker(id)
                    .and_then(|m| check_key(&self.page, m.record));
                match key {
                    Some(key) => self.toggle(&key).map(|_| ()),
                    None => Ok(()),
                }
            }
            OverlayEvent::CloseDetail | OverlayEvent::OutsideClick => {
                self.close_detail();
                Ok(())
            }
            OverlayEvent::ToggleEnabled => self.set_enabled(!self.enabled),
        }
    }

    /// Flip the manual check for a key; returns the new state
    ///
    /// Keys that no record on this page carries are ignored, so the store
    /// never gains entries for numbers absent from the report.
    pub fn toggle(&mut self, key: &CheckKey) -> Result<bool, VerifyError> {
        if !self.has_key(key) {
            tracing::debug!("Ignoring toggle for unknown key {}", key.encode());
            return Ok(self.store.is_checked(key));
        }
        let checked = self.store.toggle(key);
        self.refresh()?;
        Ok(checked)
    }

    pub fn set_manual_check(&mut self, marker_id: usize, checked: bool) -> Result<(), VerifyError> {
        let Some(key) = self
            .marker(marker_id)
            .and_then(|m| check_key(&self.page, m.record))
        else {
            return Ok(());
        };
        if self.store.is_checked(&key) != checked {
            self.store.set_checked(&key, checked);
            self.refresh()?;
        }
        Ok(())
    }

    pub fn set_enabled(&mut self, enabled: bool) -> Result<(), VerifyError> {
        self.enabled = enabled;
        self.store.set_enabled(enabled);
        if !enabled {
            self.close_detail();
        }
        self.renderer.set_enabled(enabled)?;
        self.render_summary()
    }

    pub fn close_detail(&mut self) {
        if self.open_detail.take().is_some() {
            self.renderer.hide_detail();
        }
    }

    /// Remove markers and UI, leaving the page as it was before mounting
    pub fn teardown(&mut self) {
        self.close_detail();
        let handles: Vec<R::Marker> = self.markers.drain(..).map(|m| m.handle).collect();
        self.renderer.unmount(&handles);
        self.mounted = false;
        self.highlighted = false;
    }

    pub fn summary(&self) -> Summary {
        Summary::compute(&self.page, &self.store)
    }

    pub fn status_of(&self, marker_id: usize) -> Option<Status> {
        self.marker(marker_id)
            .map(|m| record_status(&self.page, &self.store, m.record))
    }

    pub fn detail_for(&self, marker_id: usize) -> Option<DetailView> {
        let marker = self.marker(marker_id)?;
        let (record, _) = self.page.record_at(marker.record)?;
        let key = check_key(&self.page, marker.record)?;
        let status = record_status(&self.page, &self.store, marker.record);
        Some(DetailView::build(marker_id, record, status, key))
    }

    pub fn is_checked(&self, key: &CheckKey) -> bool {
        self.store.is_checked(key)
    }

    pub fn markers(&self) -> &[PlacedMarker<R::Marker>] {
        &self.markers
    }

    pub fn marker(&self, id: usize) -> Option<&PlacedMarker<R::Marker>> {
        self.markers.get(id).filter(|m| m.id == id)
    }

    pub fn page(&self) -> &PageEntry {
        &self.page
    }

    pub fn store(&self) -> &ManualCheckStore<S> {
        &self.store
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn open_detail(&self) -> Option<usize> {
        self.open_detail
    }

    pub fn into_renderer(self) -> R {
        self.renderer
    }

    fn has_key(&self, key: &CheckKey) -> bool {
        key.file == self.page.file
            && self
                .page
                .records()
                .any(|(r, _)| r.line == key.line && r.value == key.value)
    }

    fn show_detail(&mut self, marker_id: usize) -> Result<(), VerifyError> {
        let Some(view) = self.detail_for(marker_id) else {
            tracing::debug!("No marker with id {}", marker_id);
            return Ok(());
        };
        let anchor = self.markers[marker_id].handle.clone();
        self.renderer.show_detail(&view, &anchor)?;
        self.open_detail = Some(marker_id);
        Ok(())
    }

    fn render_summary(&mut self) -> Result<(), VerifyError> {
        if !self.mounted {
            return Ok(());
        }
        let summary = self.summary();
        self.renderer.render_summary(&summary, self.enabled)
    }
}
