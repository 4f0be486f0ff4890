/// Discrete user interactions the overlay reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayEvent {
    /// A marker was clicked
    MarkerSelected { id: usize },
    /// The detail view's checkbox changed
    ManualCheckChanged { id: usize, checked: bool },
    /// Flip the manual check for a marker
    ManualCheckToggled { id: usize },
    /// The detail view's close button
    CloseDetail,
    /// A click outside both the detail view and any marker
    OutsideClick,
    /// The panel's show/hide button
    ToggleEnabled,
}
