//! Detail view (tooltip) contents and placement

use crate::report::{NumberRecord, SourceRef};
use crate::status::Status;
use crate::store::CheckKey;
use serde::Serialize;

/// Gap between the anchor marker and the view, in CSS pixels
pub const ANCHOR_GAP: f64 = 8.0;
/// Minimum distance kept from the viewport's right edge
pub const EDGE_MARGIN: f64 = 10.0;

/// What the detail view shows for one marker
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailView {
    pub marker_id: usize,
    pub value: String,
    pub record_type: String,
    pub line: u32,
    pub status: Status,
    pub source: Option<SourceRef>,
    pub context: Option<String>,
    /// State of the manual-check checkbox
    pub checked: bool,
    pub key: CheckKey,
}

impl DetailView {
    pub fn build(marker_id: usize, record: &NumberRecord, status: Status, key: CheckKey) -> Self {
        Self {
            marker_id,
            value: record.value.clone(),
            record_type: record.record_type.clone(),
            line: record.line,
            status,
            source: record.primary_source().cloned(),
            context: record.context.clone().filter(|c| !c.trim().is_empty()),
            checked: status == Status::ManuallyVerified,
            key,
        }
    }

    pub fn status_label(&self) -> &'static str {
        self.status.label()
    }

    /// `file → path` line for the first source, if any
    pub fn source_label(&self) -> Option<String> {
        self.source.as_ref().map(|s| {
            if s.path.is_empty() {
                s.file.clone()
            } else {
                format!("{} → {}", s.file, s.path)
            }
        })
    }
}

/// Viewport-relative rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Visible window area plus current scroll offsets
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub scroll_x: f64,
    pub scroll_y: f64,
}

/// Document-relative position for the detail view
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub left: f64,
    pub top: f64,
    pub flipped: bool,
}

/// Position the view below its anchor, flipping above when it would run past
/// the bottom of the viewport and clamping against the right edge
pub fn place_detail(anchor: Rect, view_width: f64, view_height: f64, viewport: Viewport) -> Placement {
    let flipped = anchor.bottom() + ANCHOR_GAP + view_height > viewport.height
        && anchor.top - ANCHOR_GAP - view_height >= 0.0;

    let top = if flipped {
        anchor.top - ANCHOR_GAP - view_height
    } else {
        anchor.bottom() + ANCHOR_GAP
    };

    let mut left = anchor.left;
    if left + view_width > viewport.width - EDGE_MARGIN {
        left = viewport.width - view_width - EDGE_MARGIN;
    }
    let left = left.max(EDGE_MARGIN.min(anchor.left));

    Placement {
        left: left + viewport.scroll_x,
        top: top + viewport.scroll_y,
        flipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn viewport() -> Viewport {
        Viewport {
            width: 1000.0,
            height: 800.0,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }

    #[test]
    fn test_build_from_record() {
        let record = NumberRecord::new(10, "1,234.56", "currency")
            .with_context("Revenue grew")
            .with_source("data/ffr_data.json", "gp1.total")
            .with_source("data/budget_data.json", "total");
        let key = CheckKey::new("ffr1.html", 10, "1,234.56");
        let view = DetailView::build(3, &record, Status::Unverified, key.clone());

        assert_eq!(view.marker_id, 3);
        assert_eq!(view.status_label(), "Unverified");
        assert!(!view.checked);
        assert_eq!(
            view.source_label().as_deref(),
            Some("data/ffr_data.json → gp1.total")
        );
        assert_eq!(view.context.as_deref(), Some("Revenue grew"));
        assert_eq!(view.key, key);
    }

    #[test]
    fn test_manual_status_checks_box() {
        let record = NumberRecord::new(1, "5", "integer").with_context("  ");
        let view = DetailView::build(
            0,
            &record,
            Status::ManuallyVerified,
            CheckKey::new("p", 1, "5"),
        );
        assert!(view.checked);
        assert_eq!(view.context, None);
        assert_eq!(view.source_label(), None);
    }

    #[test]
    fn test_place_below_by_default() {
        let placement = place_detail(Rect::new(100.0, 100.0, 40.0, 20.0), 300.0, 200.0, viewport());
        assert_eq!(
            placement,
            Placement {
                left: 100.0,
                top: 128.0,
                flipped: false
            }
        );
    }

    #[test]
    fn test_flip_above_near_bottom() {
        let placement = place_detail(Rect::new(100.0, 700.0, 40.0, 20.0), 300.0, 200.0, viewport());
        assert!(placement.flipped);
        assert_eq!(placement.top, 492.0);
    }

    #[test]
    fn test_clamp_right_edge() {
        let placement = place_detail(Rect::new(900.0, 100.0, 40.0, 20.0), 300.0, 200.0, viewport());
        assert_eq!(placement.left, 690.0);
    }

    #[test]
    fn test_scroll_offsets_applied() {
        let mut vp = viewport();
        vp.scroll_y = 1500.0;
        vp.scroll_x = 20.0;
        let placement = place_detail(Rect::new(100.0, 100.0, 40.0, 20.0), 300.0, 200.0, vp);
        assert_eq!(placement.top, 1628.0);
        assert_eq!(placement.left, 120.0);
    }
}
