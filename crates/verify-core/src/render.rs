//! Rendering interface between the engine and a page
//!
//! The browser implementation lives in the wasm crate; [`crate::page::MemoryPage`]
//! implements it in memory for headless tests.

use crate::detail::DetailView;
use crate::error::VerifyError;
use crate::report::NumberRecord;
use crate::status::Status;
use crate::summary::Summary;

/// Everything a renderer needs to build one marker
#[derive(Debug, Clone, Copy)]
pub struct MarkerSpec<'a> {
    pub id: usize,
    pub value: &'a str,
    pub record: &'a NumberRecord,
    pub status: Status,
}

/// Replacement content for a text node
#[derive(Debug, Clone, Copy)]
pub enum Piece<'a> {
    Text(&'a str),
    Marker(MarkerSpec<'a>),
}

pub trait Renderer {
    /// Handle to a text node in the page
    type Text;
    /// Handle to a placed marker; must stay valid across status changes
    type Marker: Clone;

    /// Visible text nodes, excluding script/style content and anything the
    /// renderer itself produced
    fn text_nodes(&mut self) -> Vec<Self::Text>;

    fn text_of(&self, node: &Self::Text) -> String;

    /// Swap a text node for `pieces`, returning handles for the markers in
    /// the order they appear
    fn replace_text(
        &mut self,
        node: &Self::Text,
        pieces: &[Piece<'_>],
    ) -> Result<Vec<Self::Marker>, VerifyError>;

    /// Update a marker's status class without touching text structure
    fn set_marker_status(&mut self, marker: &Self::Marker, status: Status)
        -> Result<(), VerifyError>;

    fn render_summary(&mut self, summary: &Summary, enabled: bool) -> Result<(), VerifyError>;

    fn show_detail(&mut self, view: &DetailView, anchor: &Self::Marker) -> Result<(), VerifyError>;

    fn hide_detail(&mut self);

    /// Show or hide highlighting as a whole
    fn set_enabled(&mut self, enabled: bool) -> Result<(), VerifyError>;

    /// Remove all overlay UI and restore marked text
    fn unmount(&mut self, markers: &[Self::Marker]);
}
