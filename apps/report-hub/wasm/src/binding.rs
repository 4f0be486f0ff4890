//! Fill `data-source` elements from the JSON data files
//!
//! `<span data-source="ffr1.revenue.total" data-format="currency">` shows
//! `revenue.total` from `{data_base_url}ffr1.json`. Each file is fetched at
//! most once per page, including when binds overlap; the cache outlives
//! individual calls.

use crate::fetch::fetch_text;
use verify_core::{DataFormat, DataLoader, OverlayConfig, SourceExpr, VerifyError};
use wasm_bindgen::JsCast;
use web_sys::Element;

thread_local! {
    static LOADER: DataLoader = DataLoader::new();
}

struct Binding {
    element: Element,
    expr: SourceExpr,
    format: DataFormat,
}

fn collect_bindings() -> Result<Vec<Binding>, VerifyError> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| VerifyError::Render("No document".to_string()))?;
    let nodes = document
        .query_selector_all("[data-source]")
        .map_err(|e| VerifyError::Render(format!("{:?}", e)))?;

    let mut bindings = Vec::new();
    for i in 0..nodes.length() {
        let Some(element) = nodes.item(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
            continue;
        };
        let Some(attr) = element.get_attribute("data-source") else {
            continue;
        };
        match SourceExpr::parse(&attr) {
            Ok(expr) => {
                let format = DataFormat::parse(element.get_attribute("data-format").as_deref());
                bindings.push(Binding {
                    element,
                    expr,
                    format,
                });
            }
            Err(e) => tracing::warn!("Skipping data-source {:?}: {}", attr, e),
        }
    }
    Ok(bindings)
}

/// Bind every `data-source` element; returns how many were filled
///
/// Elements whose file or path cannot be resolved keep their existing text.
pub async fn bind_document(config: &OverlayConfig) -> Result<usize, VerifyError> {
    let bindings = collect_bindings()?;
    if bindings.is_empty() {
        return Ok(0);
    }

    let loader = LOADER.with(DataLoader::clone);
    loader
        .load(bindings.iter().map(|b| &b.expr), |file| {
            let url = config.data_url(&file);
            async move {
                let body = fetch_text(url).await?;
                serde_json::from_str(&body).map_err(VerifyError::from)
            }
        })
        .await;

    let mut filled = 0;
    for binding in &bindings {
        if let Some(text) = loader.render(&binding.expr, binding.format) {
            binding.element.set_text_content(Some(&text));
            filled += 1;
        }
    }

    tracing::debug!("Bound {} of {} data-source elements", filled, bindings.len());
    Ok(filled)
}
