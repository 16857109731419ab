// remote.rs

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::{StoreError, StoreResult};
use crate::item::{Draft, DraftBody, Item, ItemBody, WireItem};
use crate::store::ItemStore;

const MAX_LOGGED_BODY: usize = 4000;

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

fn log_http_request(method: &str, url: &str, body: Option<&str>) {
    debug!(target: "taskdeck::http", "[HTTP OUT] {} {}", method, url);
    if let Some(b) = body {
        trace!(target: "taskdeck::http", "  Body: {}", truncate(b, MAX_LOGGED_BODY));
    }
}

fn log_http_response(status: u16, body: &str) {
    debug!(target: "taskdeck::http", "[HTTP IN] Status: {}", status);
    if !body.is_empty() {
        trace!(target: "taskdeck::http", "  Body: {}", truncate(body, MAX_LOGGED_BODY));
    }
}

/// Pulls `error` out of an `{"error": "..."}` body, falling back to the raw text.
fn error_message(text: &str) -> String {
    serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| text.trim().to_string())
}

/// Client for the `/api/items` REST service.
pub struct HttpItemStore {
    base_url: String,
    client: Client,
}

impl HttpItemStore {
    pub fn new(base_url: &str, timeout: Duration) -> StoreResult<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(StoreError::Transport("Server URL is empty".into()));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Transport(format!("HTTP client build failed: {}", e)))?;
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn items_url(&self) -> String {
        format!("{}/api/items", self.base_url)
    }

    fn item_url(&self, id: i64) -> String {
        format!("{}/api/items/{}", self.base_url, id)
    }

    /// Sends the request and returns the status with the body text, after
    /// mapping every non-success status to a `StoreError`.
    fn send(&self, req: RequestBuilder, id: Option<i64>) -> StoreResult<(StatusCode, String)> {
        let resp = req.header(ACCEPT, "application/json").send()?;
        let status = resp.status();
        let text = resp.text()?;
        log_http_response(status.as_u16(), &text);

        if status.is_success() {
            return Ok((status, text));
        }
        match (status, id) {
            (StatusCode::NOT_FOUND, Some(id)) => Err(StoreError::NotFound { id }),
            _ => Err(StoreError::Rejected {
                status: status.as_u16(),
                message: error_message(&text),
            }),
        }
    }

    fn decode_item(text: &str) -> StoreResult<Item> {
        let wire: WireItem = serde_json::from_str(text)?;
        Ok(wire.into())
    }
}

impl ItemStore for HttpItemStore {
    fn fetch_all(&self) -> StoreResult<Vec<Item>> {
        let url = self.items_url();
        log_http_request("GET", &url, None);
        let (_, text) = self.send(self.client.get(&url), None)?;
        let wire: Vec<WireItem> = serde_json::from_str(&text)?;
        Ok(wire.into_iter().map(Item::from).collect())
    }

    fn create(&self, draft: &Draft) -> StoreResult<Item> {
        let url = self.items_url();
        let body = serde_json::to_string(&DraftBody::from(draft))?;
        log_http_request("POST", &url, Some(&body));
        let req = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        let (_, text) = self.send(req, None)?;
        Self::decode_item(&text)
    }

    fn update(&self, id: i64, item: &Item) -> StoreResult<Item> {
        let url = self.item_url(id);
        let body = serde_json::to_string(&ItemBody::from(item))?;
        log_http_request("PUT", &url, Some(&body));
        let req = self
            .client
            .put(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        let (_, text) = self.send(req, Some(id))?;
        Self::decode_item(&text)
    }

    fn remove(&self, id: i64) -> StoreResult<()> {
        let url = self.item_url(id);
        log_http_request("DELETE", &url, None);
        self.send(self.client.delete(&url), Some(id))?;
        Ok(())
    }
}
