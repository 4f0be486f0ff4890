//! DOM renderer for the verification overlay
//!
//! Markers are `<span>`s swapped in for matched text. The summary panel and
//! the detail tooltip are appended to `<body>`. Everything the overlay creates
//! carries a `data-vo` attribute so the text walk can skip it.

use verify_core::detail::{place_detail, Rect, Viewport};
use verify_core::{DetailView, Piece, Renderer, Status, Summary, VerifyError};
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlElement, HtmlInputElement, Node, Text, Window};

/// Attribute marking overlay-owned elements
pub const OWNER_ATTR: &str = "data-vo";
/// Attribute naming the action a control performs
pub const ACTION_ATTR: &str = "data-vo-action";
/// Attribute holding a marker's id
pub const ID_ATTR: &str = "data-vo-id";

const DISABLED_CLASS: &str = "vo-disabled";
const SKIPPED_TAGS: &[&str] = &["SCRIPT", "STYLE", "NOSCRIPT", "TEXTAREA", "TEMPLATE"];
const STYLE_ID: &str = "vo-styles";

/// Injected on first render, removed on unmount
pub const STYLESHEET: &str = r#"
.vo-number { cursor: pointer; border-radius: 2px; padding: 0 1px; }
.vo-number.vo-verified { background: rgba(34, 197, 94, 0.22); border-bottom: 2px solid #16a34a; }
.vo-number.vo-unverified { background: rgba(239, 68, 68, 0.2); border-bottom: 2px solid #dc2626; }
.vo-number.vo-manual { background: rgba(59, 130, 246, 0.2); border-bottom: 2px solid #2563eb; }
body.vo-disabled .vo-number { background: none; border-bottom: none; cursor: inherit; }
.vo-panel { position: fixed; right: 16px; bottom: 16px; z-index: 10000; padding: 10px 14px;
  background: #fff; border: 1px solid #d1d5db; border-radius: 6px; font: 13px/1.5 sans-serif;
  box-shadow: 0 2px 8px rgba(0, 0, 0, 0.15); }
.vo-panel-title { font-weight: 600; margin-bottom: 4px; }
.vo-panel-row.vo-verified strong { color: #16a34a; }
.vo-panel-row.vo-manual strong { color: #2563eb; }
.vo-panel-row.vo-unverified strong { color: #dc2626; }
.vo-toggle { margin-top: 6px; width: 100%; cursor: pointer; }
.vo-tooltip { position: absolute; z-index: 10001; max-width: 320px; padding: 8px 10px;
  background: #fff; border: 1px solid #d1d5db; border-radius: 6px; font: 12px/1.5 sans-serif;
  box-shadow: 0 4px 12px rgba(0, 0, 0, 0.2); }
.vo-tooltip-header { display: flex; justify-content: space-between; gap: 8px; margin-bottom: 4px; }
.vo-tooltip-close { border: none; background: none; cursor: pointer; font-size: 14px; }
.vo-tooltip-label { color: #6b7280; margin-right: 6px; }
.vo-tooltip-check { display: block; margin-top: 6px; }
"#;

fn js_err(e: JsValue) -> VerifyError {
    VerifyError::Render(format!("{:?}", e))
}

fn marker_class(status: Status) -> String {
    format!("vo-number {}", status.css_class())
}

fn marker_title(status: Status, record_type: &str) -> String {
    format!("{} ({})", status.label(), record_type)
}

pub struct DomRenderer {
    window: Window,
    document: Document,
    panel: Option<HtmlElement>,
    tooltip: Option<HtmlElement>,
    styles: Option<Element>,
}

impl DomRenderer {
    /// # Errors
    /// Returns JsValue error if unable to access window or document
    pub fn new() -> Result<Self, JsValue> {
        let window =
            web_sys::window().ok_or_else(|| JsValue::from_str("No window object available"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("No document object available"))?;

        Ok(Self {
            window,
            document,
            panel: None,
            tooltip: None,
            styles: None,
        })
    }

    fn body(&self) -> Result<HtmlElement, VerifyError> {
        self.document
            .body()
            .ok_or_else(|| VerifyError::Render("No document body".to_string()))
    }

    fn create(&self, tag: &str, class: &str) -> Result<HtmlElement, VerifyError> {
        let element = self.document.create_element(tag).map_err(js_err)?;
        element.set_class_name(class);
        element
            .dyn_into::<HtmlElement>()
            .map_err(|_| VerifyError::Render(format!("<{}> is not an HTMLElement", tag)))
    }

    /// Create a body-level container once and reuse it afterwards
    fn ensure_container(
        &self,
        slot: &Option<HtmlElement>,
        id: &str,
        owner: &str,
    ) -> Result<HtmlElement, VerifyError> {
        if let Some(existing) = slot {
            return Ok(existing.clone());
        }
        let element = self.create("div", &format!("vo-{}", owner))?;
        element.set_id(id);
        element.set_attribute(OWNER_ATTR, owner).map_err(js_err)?;
        self.body()?.append_child(&element).map_err(js_err)?;
        Ok(element)
    }

    fn ensure_styles(&mut self) -> Result<(), VerifyError> {
        if self.styles.is_some() {
            return Ok(());
        }
        let style = self.document.create_element("style").map_err(js_err)?;
        style.set_id(STYLE_ID);
        style.set_attribute(OWNER_ATTR, "styles").map_err(js_err)?;
        style.set_text_content(Some(STYLESHEET));
        self.body()?.append_child(&style).map_err(js_err)?;
        self.styles = Some(style);
        Ok(())
    }

    fn is_skipped(element: &Element) -> bool {
        let tag = element.tag_name().to_ascii_uppercase();
        SKIPPED_TAGS.contains(&tag.as_str()) || element.has_attribute(OWNER_ATTR)
    }

    fn collect_text(node: &Node, out: &mut Vec<Text>) {
        let children = node.child_nodes();
        for i in 0..children.length() {
            let Some(child) = children.item(i) else {
                continue;
            };
            match child.node_type() {
                Node::TEXT_NODE => {
                    let blank = child
                        .text_content()
                        .map_or(true, |t| t.trim().is_empty());
                    if !blank {
                        if let Ok(text) = child.dyn_into::<Text>() {
                            out.push(text);
                        }
                    }
                }
                Node::ELEMENT_NODE => {
                    if let Some(element) = child.dyn_ref::<Element>() {
                        if !Self::is_skipped(element) {
                            Self::collect_text(&child, out);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn append_row(
        &self,
        parent: &HtmlElement,
        label: &str,
        value: &str,
    ) -> Result<(), VerifyError> {
        let row = self.create("div", "vo-tooltip-row")?;
        let name = self.create("span", "vo-tooltip-label")?;
        name.set_text_content(Some(label));
        let content = self.create("span", "vo-tooltip-value")?;
        content.set_text_content(Some(value));
        row.append_child(&name).map_err(js_err)?;
        row.append_child(&content).map_err(js_err)?;
        parent.append_child(&row).map_err(js_err)?;
        Ok(())
    }

    fn viewport(&self) -> Viewport {
        let dimension = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        Viewport {
            width: dimension(self.window.inner_width()),
            height: dimension(self.window.inner_height()),
            scroll_x: self.window.scroll_x().unwrap_or(0.0),
            scroll_y: self.window.scroll_y().unwrap_or(0.0),
        }
    }

    fn position_tooltip(&self, tooltip: &HtmlElement, anchor: &HtmlElement) -> Result<(), VerifyError> {
        let bounds = anchor.get_bounding_client_rect();
        let placement = place_detail(
            Rect::new(bounds.left(), bounds.top(), bounds.width(), bounds.height()),
            f64::from(tooltip.offset_width()),
            f64::from(tooltip.offset_height()),
            self.viewport(),
        );

        let style = tooltip.style();
        style
            .set_property("left", &format!("{}px", placement.left))
            .map_err(js_err)?;
        style
            .set_property("top", &format!("{}px", placement.top))
            .map_err(js_err)?;
        tooltip.set_class_name(if placement.flipped {
            "vo-tooltip vo-tooltip-above"
        } else {
            "vo-tooltip"
        });
        Ok(())
    }
}

impl Renderer for DomRenderer {
    type Text = Text;
    type Marker = HtmlElement;

    fn text_nodes(&mut self) -> Vec<Text> {
        let mut out = Vec::new();
        if let Some(body) = self.document.body() {
            Self::collect_text(&body, &mut out);
        }
        out
    }

    fn text_of(&self, node: &Text) -> String {
        node.text_content().unwrap_or_default()
    }

    fn replace_text(
        &mut self,
        node: &Text,
        pieces: &[Piece<'_>],
    ) -> Result<Vec<HtmlElement>, VerifyError> {
        let parent = node
            .parent_node()
            .ok_or_else(|| VerifyError::Render("Text node has no parent".to_string()))?;
        let fragment = self.document.create_document_fragment();
        let mut markers = Vec::new();

        for piece in pieces {
            match piece {
                Piece::Text(text) => {
                    fragment
                        .append_child(&self.document.create_text_node(text))
                        .map_err(js_err)?;
                }
                Piece::Marker(spec) => {
                    let span = self.create("span", &marker_class(spec.status))?;
                    span.set_attribute(OWNER_ATTR, "marker").map_err(js_err)?;
                    span.set_attribute(ID_ATTR, &spec.id.to_string())
                        .map_err(js_err)?;
                    span.set_attribute("data-value", spec.value).map_err(js_err)?;
                    span.set_attribute("data-type", &spec.record.record_type)
                        .map_err(js_err)?;
                    span.set_attribute("role", "button").map_err(js_err)?;
                    span.set_title(&marker_title(spec.status, &spec.record.record_type));
                    span.set_text_content(Some(spec.value));
                    fragment.append_child(&span).map_err(js_err)?;
                    markers.push(span);
                }
            }
        }

        parent.replace_child(&fragment, node).map_err(js_err)?;
        Ok(markers)
    }

    fn set_marker_status(&mut self, marker: &HtmlElement, status: Status) -> Result<(), VerifyError> {
        marker.set_class_name(&marker_class(status));
        let record_type = marker.get_attribute("data-type").unwrap_or_default();
        marker.set_title(&marker_title(status, &record_type));
        Ok(())
    }

    fn render_summary(&mut self, summary: &Summary, enabled: bool) -> Result<(), VerifyError> {
        self.ensure_styles()?;
        let panel = self.ensure_container(&self.panel, "vo-panel", "panel")?;
        // Counts and fixed labels only; nothing from the report reaches innerHTML
        panel.set_inner_html(&format!(
            r#"<div class="vo-panel-title">Number verification</div>
<div class="vo-panel-row vo-verified">Verified <strong>{}</strong></div>
<div class="vo-panel-row vo-manual">Manually checked <strong>{}</strong></div>
<div class="vo-panel-row vo-unverified">Unverified <strong>{}</strong></div>
<button type="button" class="vo-toggle" {}="toggle">{}</button>"#,
            summary.verified,
            summary.manual,
            summary.unverified,
            ACTION_ATTR,
            if enabled { "Hide highlights" } else { "Show highlights" },
        ));
        self.panel = Some(panel);
        Ok(())
    }

    fn show_detail(&mut self, view: &DetailView, anchor: &HtmlElement) -> Result<(), VerifyError> {
        let tooltip = self.ensure_container(&self.tooltip, "vo-tooltip", "tooltip")?;
        tooltip.set_inner_html("");

        let header = self.create("div", "vo-tooltip-header")?;
        let value = self.create("strong", "vo-tooltip-number")?;
        value.set_text_content(Some(&view.value));
        let close = self.create("button", "vo-tooltip-close")?;
        close.set_attribute("type", "button").map_err(js_err)?;
        close.set_attribute(ACTION_ATTR, "close").map_err(js_err)?;
        close.set_attribute("aria-label", "Close").map_err(js_err)?;
        close.set_text_content(Some("×"));
        header.append_child(&value).map_err(js_err)?;
        header.append_child(&close).map_err(js_err)?;
        tooltip.append_child(&header).map_err(js_err)?;

        self.append_row(&tooltip, "Type", &view.record_type)?;
        self.append_row(&tooltip, "Line", &view.line.to_string())?;
        self.append_row(&tooltip, "Status", view.status_label())?;
        if let Some(source) = view.source_label() {
            self.append_row(&tooltip, "Source", &source)?;
        }
        if let Some(context) = &view.context {
            self.append_row(&tooltip, "Context", context)?;
        }

        let label = self.create("label", "vo-tooltip-check")?;
        let checkbox = self
            .document
            .create_element("input")
            .map_err(js_err)?
            .dyn_into::<HtmlInputElement>()
            .map_err(|_| VerifyError::Render("<input> is not an HTMLInputElement".to_string()))?;
        checkbox.set_type("checkbox");
        checkbox.set_checked(view.checked);
        checkbox.set_attribute(ACTION_ATTR, "check").map_err(js_err)?;
        checkbox
            .set_attribute(ID_ATTR, &view.marker_id.to_string())
            .map_err(js_err)?;
        label.append_child(&checkbox).map_err(js_err)?;
        label
            .append_child(&self.document.create_text_node(" Manually verified"))
            .map_err(js_err)?;
        tooltip.append_child(&label).map_err(js_err)?;

        // Out of flow before measuring, so the width is the content's
        let style = tooltip.style();
        style.set_property("position", "absolute").map_err(js_err)?;
        style.set_property("display", "block").map_err(js_err)?;
        self.position_tooltip(&tooltip, anchor)?;
        self.tooltip = Some(tooltip);
        Ok(())
    }

    fn hide_detail(&mut self) {
        if let Some(tooltip) = &self.tooltip {
            let _ = tooltip.style().set_property("display", "none");
        }
    }

    fn set_enabled(&mut self, enabled: bool) -> Result<(), VerifyError> {
        self.ensure_styles()?;
        self.body()?
            .class_list()
            .toggle_with_force(DISABLED_CLASS, !enabled)
            .map_err(js_err)?;
        Ok(())
    }

    fn unmount(&mut self, markers: &[HtmlElement]) {
        for marker in markers {
            let Some(parent) = marker.parent_node() else {
                continue;
            };
            let text = self
                .document
                .create_text_node(&marker.text_content().unwrap_or_default());
            if parent.replace_child(&text, marker).is_ok() {
                parent.normalize();
            }
        }
        if let Some(panel) = self.panel.take() {
            panel.remove();
        }
        if let Some(tooltip) = self.tooltip.take() {
            tooltip.remove();
        }
        if let Some(styles) = self.styles.take() {
            styles.remove();
        }
        if let Ok(body) = self.body() {
            let _ = body.class_list().remove_1(DISABLED_CLASS);
        }
    }
}


#[cfg(test)]
#[cfg(target_arch = "wasm32")]
mod wasm_tests {
    use super::*;
    use verify_core::{
        ManualCheckStore, MemoryStorage, NumberRecord, OverlayEngine, OverlayEvent, PageEntry,
    };
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn fixture() -> (Document, HtmlElement) {
        let document = web_sys::window().unwrap().document().unwrap();
        let host = document
            .create_element("div")
            .unwrap()
            .dyn_into::<HtmlElement>()
            .unwrap();
        host.set_inner_html(
            "<p>Total revenue was 62,985.50 and 1,234.56 in costs.</p><script>var x = 426;</script>",
        );
        document.body().unwrap().append_child(&host).unwrap();
        (document, host)
    }

    fn engine() -> OverlayEngine<DomRenderer, MemoryStorage> {
        let mut page = PageEntry::new("financial-reports/ffr1.html");
        page.verified
            .push(NumberRecord::new(12, "62,985.50", "currency"));
        page.unverified
            .push(NumberRecord::new(40, "1,234.56", "currency"));
        page.unverified.push(NumberRecord::new(41, "426", "integer"));
        let store = ManualCheckStore::load(MemoryStorage::new(), "checks", "enabled");
        OverlayEngine::new(page, store, DomRenderer::new().unwrap())
    }

    #[wasm_bindgen_test]
    fn test_mount_and_teardown() {
        let (document, host) = fixture();
        let original = host.inner_html();
        let mut engine = engine();

        assert_eq!(engine.mount().unwrap(), 2);
        let markers = host.query_selector_all("[data-vo='marker']").unwrap();
        assert_eq!(markers.length(), 2);
        assert!(document.get_element_by_id("vo-panel").is_some());

        engine.dispatch(OverlayEvent::MarkerSelected { id: 1 }).unwrap();
        let tooltip = document
            .get_element_by_id("vo-tooltip")
            .unwrap()
            .dyn_into::<HtmlElement>()
            .unwrap();
        assert!(tooltip.text_content().unwrap().contains("1,234.56"));
        assert_eq!(
            tooltip.style().get_property_value("position").unwrap(),
            "absolute"
        );
        assert!(tooltip.style().get_property_value("top").unwrap().ends_with("px"));
        assert!(document.get_element_by_id(STYLE_ID).is_some());

        engine.teardown();
        assert_eq!(host.inner_html(), original);
        assert!(document.get_element_by_id(STYLE_ID).is_none());
        assert!(document.get_element_by_id("vo-panel").is_none());
        host.remove();
    }
}
