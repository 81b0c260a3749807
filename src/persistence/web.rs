//! `fetch`-backed store for the browser build

use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

use super::{Completion, CreateDotRequest, CreateDotResponse, DotStore, PersistError, Result};
use crate::sim::GalaxyDot;

fn js_error(value: JsValue) -> PersistError {
    PersistError::Network(
        value
            .as_string()
            .unwrap_or_else(|| format!("{:?}", value)),
    )
}

/// Issue a request and return the response body text
async fn send(url: &str, method: &str, body: Option<String>) -> Result<String> {
    let opts = RequestInit::new();
    opts.set_method(method);
    opts.set_mode(RequestMode::SameOrigin);
    if let Some(body) = body.as_deref() {
        opts.set_body(&JsValue::from_str(body));
    }

    let request = Request::new_with_str_and_init(url, &opts).map_err(js_error)?;
    request
        .headers()
        .set("Content-Type", "application/json")
        .map_err(js_error)?;

    let window =
        web_sys::window().ok_or_else(|| PersistError::Network("no window".to_string()))?;
    let value = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(js_error)?;
    let response: Response = value.dyn_into().map_err(js_error)?;
    if !response.ok() {
        return Err(PersistError::Status(response.status()));
    }

    let text = JsFuture::from(response.text().map_err(js_error)?)
        .await
        .map_err(js_error)?;
    text.as_string()
        .ok_or_else(|| PersistError::Decode("response body is not text".to_string()))
}

/// Persists dots by POSTing JSON to an endpoint
#[derive(Debug, Clone)]
pub struct FetchStore {
    endpoint: String,
}

impl FetchStore {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl Default for FetchStore {
    fn default() -> Self {
        Self::new("/api/dots")
    }
}

impl DotStore for FetchStore {
    fn create_dot(&self, request: CreateDotRequest, done: Completion) {
        let endpoint = self.endpoint.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let result = async {
                let body = serde_json::to_string(&request)
                    .map_err(|e| PersistError::Decode(e.to_string()))?;
                let text = send(&endpoint, "POST", Some(body)).await?;
                serde_json::from_str::<CreateDotResponse>(&text)
                    .map_err(|e| PersistError::Decode(e.to_string()))
            }
            .await;
            done(result);
        });
    }
}

/// Load the initial population from the galaxy endpoint
pub async fn fetch_galaxy(url: &str) -> Result<Vec<GalaxyDot>> {
    let text = send(url, "GET", None).await?;
    serde_json::from_str(&text).map_err(|e| PersistError::Decode(e.to_string()))
}
