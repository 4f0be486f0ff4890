//! Number verification overlay for the report hub
//!
//! Target-independent logic behind the browser overlay: the verification
//! report model, current-page resolution, numeric token matching, the
//! manual-check store, summary counts, the detail view and the engine that
//! ties them together behind a [`Renderer`]. Also holds the `data-source`
//! path resolution and number formatting used by the data-binding helper.
//!
//! The wasm crate supplies a DOM renderer and `localStorage` backend; tests
//! here run the same engine over [`MemoryPage`] and [`MemoryStorage`].

pub mod binding;
pub mod config;
pub mod detail;
pub mod engine;
pub mod error;
pub mod event;
pub mod format;
pub mod matcher;
pub mod page;
pub mod render;
pub mod report;
pub mod resolver;
pub mod status;
pub mod store;
pub mod summary;

pub use binding::{DataCache, DataLoader, PathSegment, SourceExpr};
pub use config::OverlayConfig;
pub use detail::{place_detail, DetailView, Placement, Rect, Viewport};
pub use engine::{OverlayEngine, PlacedMarker};
pub use error::VerifyError;
pub use event::OverlayEvent;
pub use format::{format_currency, format_number, format_percent, format_value, DataFormat};
pub use matcher::{tokenize, NumericToken, RecordIndex, Segment};
pub use page::{MarkerView, MemoryPage};
pub use render::{MarkerSpec, Piece, Renderer};
pub use report::{
    load_report, parse_report, NumberRecord, PageEntry, ReportSummary, SourceRef,
    VerificationReport,
};
pub use resolver::{path_matches, require_page, resolve_page};
pub use status::Status;
pub use store::{CheckKey, ManualCheckStore, MemoryStorage, StorageBackend};
pub use summary::Summary;
