//! Overlay lifecycle in the browser
//!
//! A single running overlay per page, held in a thread-local. Clicks and
//! checkbox changes are caught by two listeners on `document` and turned into
//! [`OverlayEvent`]s for the engine.

use crate::dom::{DomRenderer, ACTION_ATTR, ID_ATTR, OWNER_ATTR};
use crate::fetch::fetch_text;
use crate::storage::LocalStorage;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use verify_core::{load_report, OverlayConfig, OverlayEngine, OverlayEvent, Summary, VerifyError};
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, Event, HtmlInputElement};

type Engine = OverlayEngine<DomRenderer, LocalStorage>;
type Listener = Closure<dyn FnMut(Event)>;
type EventMapper = fn(&Event) -> Option<OverlayEvent>;

struct RunningOverlay {
    engine: Rc<RefCell<Engine>>,
    document: Document,
    listeners: Vec<(&'static str, Listener)>,
}

/// The one overlay a page may have; claimed before the report fetch starts
enum Slot {
    /// A `start` call holding this generation is between claim and mount
    Starting(u64),
    Running(RunningOverlay),
}

thread_local! {
    static OVERLAY: RefCell<Option<Slot>> = const { RefCell::new(None) };
    static GENERATION: Cell<u64> = const { Cell::new(0) };
}

/// Reserve the slot for a new start; `None` if an overlay is starting or running
fn claim() -> Option<u64> {
    OVERLAY.with(|slot| {
        let mut slot = slot.borrow_mut();
        if slot.is_some() {
            return None;
        }
        let generation = GENERATION.with(|g| {
            g.set(g.get() + 1);
            g.get()
        });
        *slot = Some(Slot::Starting(generation));
        Some(generation)
    })
}

/// Give up a claim that never mounted; a no-op if `stop` already cleared it
fn release(generation: u64) {
    OVERLAY.with(|slot| {
        let mut slot = slot.borrow_mut();
        if matches!(*slot, Some(Slot::Starting(g)) if g == generation) {
            *slot = None;
        }
    });
}

/// Install a mounted overlay if its claim still holds, otherwise hand it back
fn install(generation: u64, running: RunningOverlay) -> Option<RunningOverlay> {
    OVERLAY.with(|slot| {
        let mut slot = slot.borrow_mut();
        if matches!(*slot, Some(Slot::Starting(g)) if g == generation) {
            *slot = Some(Slot::Running(running));
            None
        } else {
            Some(running)
        }
    })
}

/// Where a click landed, reduced to what the overlay cares about
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ClickTarget {
    /// `data-vo-action` of the nearest control, if any
    pub action: Option<String>,
    /// `data-vo-id` of the enclosing marker, if any
    pub marker_id: Option<String>,
    pub in_tooltip: bool,
}

/// Map a click to an overlay event; `None` means the overlay ignores it
pub fn classify_click(target: &ClickTarget) -> Option<OverlayEvent> {
    match target.action.as_deref() {
        Some("close") => return Some(OverlayEvent::CloseDetail),
        Some("toggle") => return Some(OverlayEvent::ToggleEnabled),
        // Checkbox state arrives through the change listener
        Some("check") => return None,
        _ => {}
    }
    if let Some(id) = target.marker_id.as_deref() {
        return id
            .parse()
            .ok()
            .map(|id| OverlayEvent::MarkerSelected { id });
    }
    if target.in_tooltip {
        return None;
    }
    Some(OverlayEvent::OutsideClick)
}

fn click_target(element: &Element) -> ClickTarget {
    let closest = |selector: &str| element.closest(selector).ok().flatten();
    ClickTarget {
        action: closest(&format!("[{}]", ACTION_ATTR)).and_then(|e| e.get_attribute(ACTION_ATTR)),
        marker_id: closest(&format!("[{}='marker']", OWNER_ATTR))
            .and_then(|e| e.get_attribute(ID_ATTR)),
        in_tooltip: closest(&format!("[{}='tooltip']", OWNER_ATTR)).is_some(),
    }
}

fn change_event(input: &HtmlInputElement) -> Option<OverlayEvent> {
    if input.get_attribute(ACTION_ATTR).as_deref() != Some("check") {
        return None;
    }
    let id = input.get_attribute(ID_ATTR)?.parse().ok()?;
    Some(OverlayEvent::ManualCheckChanged {
        id,
        checked: input.checked(),
    })
}

fn dispatch(engine: &Rc<RefCell<Engine>>, event: OverlayEvent) {
    let Ok(mut engine) = engine.try_borrow_mut() else {
        tracing::debug!("Overlay busy, dropping {:?}", event);
        return;
    };
    if let Err(e) = engine.dispatch(event) {
        tracing::warn!("Overlay event {:?} failed: {}", event, e);
    }
}

fn listen(
    document: &Document,
    engine: &Rc<RefCell<Engine>>,
    kind: &'static str,
    to_event: EventMapper,
) -> Result<(&'static str, Listener), JsValue> {
    let engine = engine.clone();
    let listener = Closure::wrap(Box::new(move |event: Event| {
        if let Some(overlay_event) = to_event(&event) {
            dispatch(&engine, overlay_event);
        }
    }) as Box<dyn FnMut(Event)>);
    document.add_event_listener_with_callback(kind, listener.as_ref().unchecked_ref())?;
    Ok((kind, listener))
}

fn on_click(event: &Event) -> Option<OverlayEvent> {
    let element = event.target()?.dyn_into::<Element>().ok()?;
    classify_click(&click_target(&element))
}

fn on_change(event: &Event) -> Option<OverlayEvent> {
    let input = event.target()?.dyn_into::<HtmlInputElement>().ok()?;
    change_event(&input)
}

/// Load the report and mount the overlay on the current page
///
/// Returns `Ok(false)` when the overlay stays off: report unreachable, page
/// absent from the report, already running or starting, or stopped before
/// mounting finished.
pub async fn start(config: &OverlayConfig) -> Result<bool, VerifyError> {
    let Some(generation) = claim() else {
        tracing::debug!("Verification overlay already running");
        return Ok(false);
    };

    let running = match mount(config).await {
        Ok(Some(running)) => running,
        Ok(None) => {
            release(generation);
            return Ok(false);
        }
        Err(e) => {
            release(generation);
            return Err(e);
        }
    };

    match install(generation, running) {
        None => Ok(true),
        Some(orphan) => {
            tracing::debug!("Verification overlay stopped while starting");
            dismantle(orphan);
            Ok(false)
        }
    }
}

async fn mount(config: &OverlayConfig) -> Result<Option<RunningOverlay>, VerifyError> {
    let report = match load_report(&config.report_candidates, fetch_text).await {
        Ok(report) => report,
        Err(e) => {
            tracing::info!("Verification overlay disabled: {}", e);
            return Ok(None);
        }
    };

    let window = web_sys::window().ok_or_else(|| VerifyError::Render("No window".to_string()))?;
    let path = window
        .location()
        .pathname()
        .map_err(|e| VerifyError::Render(format!("{:?}", e)))?;
    let renderer = DomRenderer::new().map_err(|e| VerifyError::Render(format!("{:?}", e)))?;

    let mut engine = match Engine::from_report(&report, &path, config, renderer, LocalStorage::new()) {
        Ok(engine) => engine,
        Err(VerifyError::PageNotFound(path)) => {
            tracing::info!("No verification data for {}", path);
            return Ok(None);
        }
        Err(e) => return Err(e),
    };
    if let Err(e) = engine.mount() {
        engine.teardown();
        return Err(e);
    }

    let engine = Rc::new(RefCell::new(engine));
    let document = window
        .document()
        .ok_or_else(|| VerifyError::Render("No document".to_string()))?;
    let mut running = RunningOverlay {
        engine,
        document,
        listeners: Vec::new(),
    };
    for (kind, to_event) in [("click", on_click as EventMapper), ("change", on_change)] {
        match listen(&running.document, &running.engine, kind, to_event) {
            Ok(listener) => running.listeners.push(listener),
            Err(e) => {
                dismantle(running);
                return Err(VerifyError::Render(format!("{:?}", e)));
            }
        }
    }
    Ok(Some(running))
}

/// Unregister listeners, then restore the page
fn dismantle(running: RunningOverlay) {
    for (kind, listener) in &running.listeners {
        if let Err(e) = running
            .document
            .remove_event_listener_with_callback(kind, listener.as_ref().unchecked_ref())
        {
            tracing::debug!("Could not remove {} listener: {:?}", kind, e);
        }
    }
    running.engine.borrow_mut().teardown();
}

/// Remove listeners and every overlay trace; returns whether one was running
///
/// Called while a start is pending, it cancels that start instead.
pub fn stop() -> bool {
    match OVERLAY.with(|slot| slot.borrow_mut().take()) {
        Some(Slot::Running(running)) => {
            dismantle(running);
            tracing::info!("Verification overlay stopped");
            true
        }
        Some(Slot::Starting(_)) => {
            tracing::debug!("Verification overlay start cancelled");
            false
        }
        None => false,
    }
}

pub fn is_running() -> bool {
    OVERLAY.with(|slot| matches!(*slot.borrow(), Some(Slot::Running(_))))
}

/// Counts for the running overlay's page
pub fn summary() -> Option<Summary> {
    OVERLAY.with(|slot| match &*slot.borrow() {
        Some(Slot::Running(running)) => running.engine.try_borrow().ok().map(|e| e.summary()),
        _ => None,
    })
}
