use verify_core::VerifyError;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::Response;

fn fetch_err(url: &str, e: impl std::fmt::Debug) -> VerifyError {
    VerifyError::Fetch(format!("{}: {:?}", url, e))
}

/// GET a URL and return the body as text; non-2xx responses are errors
pub async fn fetch_text(url: String) -> Result<String, VerifyError> {
    let window = web_sys::window().ok_or_else(|| VerifyError::Fetch("No window".to_string()))?;

    let response = JsFuture::from(window.fetch_with_str(&url))
        .await
        .map_err(|e| fetch_err(&url, e))?;
    let response: Response = response.dyn_into().map_err(|e| fetch_err(&url, e))?;

    if !response.ok() {
        return Err(VerifyError::Fetch(format!(
            "{}: HTTP {}",
            url,
            response.status()
        )));
    }

    let body = JsFuture::from(response.text().map_err(|e| fetch_err(&url, e))?)
        .await
        .map_err(|e| fetch_err(&url, e))?;

    body.as_string()
        .ok_or_else(|| VerifyError::Fetch(format!("{}: body is not text", url)))
}
