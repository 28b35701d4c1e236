//! The `Cdp` capability surface and its DevTools-backed implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tokio::{select, spawn};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::commands::{js_string, ElementQuery, ElementState, WaitGate};
use crate::config::CdpConfig;
use crate::error::{AdapterError, AdapterErrorKind};
use crate::ids::{PageId, SessionId};
use crate::keys::{split_combo, KeyDefinition};
use crate::metrics;
use crate::registry::Registry;
use crate::transport::{CdpTransport, ChromiumTransport, CommandTarget, TransportEvent};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const ATTACH_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything the step runner needs from a browser page.
///
/// Element operations take an [`ElementQuery`] and act on its first match,
/// re-evaluating the query until the match appears or the deadline passes.
#[async_trait]
pub trait Cdp: Send + Sync {
    async fn navigate(&self, page: PageId, url: &str, deadline: Duration) -> Result<(), AdapterError>;

    async fn current_url(&self, page: PageId) -> Result<String, AdapterError>;

    /// Serialized markup of the whole document.
    async fn content(&self, page: PageId) -> Result<String, AdapterError>;

    async fn evaluate_script(&self, page: PageId, expression: &str) -> Result<Value, AdapterError>;

    /// Number of elements the query currently matches. Never waits.
    async fn count(&self, page: PageId, query: &ElementQuery) -> Result<usize, AdapterError>;

    async fn scroll_into_view(
        &self,
        page: PageId,
        query: &ElementQuery,
        deadline: Duration,
    ) -> Result<(), AdapterError>;

    async fn click(&self, page: PageId, query: &ElementQuery, deadline: Duration) -> Result<(), AdapterError>;

    async fn hover(&self, page: PageId, query: &ElementQuery, deadline: Duration) -> Result<(), AdapterError>;

    /// Replaces the value of an editable element.
    async fn fill(
        &self,
        page: PageId,
        query: &ElementQuery,
        value: &str,
        deadline: Duration,
    ) -> Result<(), AdapterError>;

    async fn focus(&self, page: PageId, query: &ElementQuery, deadline: Duration) -> Result<(), AdapterError>;

    async fn wait_for_state(
        &self,
        page: PageId,
        query: &ElementQuery,
        state: ElementState,
        deadline: Duration,
    ) -> Result<(), AdapterError>;

    async fn key_down(&self, page: PageId, key: &str) -> Result<(), AdapterError>;

    async fn key_up(&self, page: PageId, key: &str) -> Result<(), AdapterError>;

    /// Presses and releases a single key.
    async fn press_key(&self, page: PageId, key: &str) -> Result<(), AdapterError>;

    /// Types `text` into whatever has focus, one character at a time.
    async fn type_text(&self, page: PageId, text: &str, delay: Duration) -> Result<(), AdapterError>;

    async fn mouse_wheel(&self, page: PageId, delta_x: f64, delta_y: f64) -> Result<(), AdapterError>;

    async fn wait_basic(&self, page: PageId, gate: WaitGate, timeout: Duration) -> Result<(), AdapterError>;

    /// PNG of the visible viewport.
    async fn screenshot(&self, page: PageId, deadline: Duration) -> Result<Vec<u8>, AdapterError>;
}

/// Adapter implementation with pluggable transport.
pub struct CdpAdapter {
    pub cfg: CdpConfig,
    registry: Arc<Registry>,
    transport: Arc<dyn CdpTransport>,
    shutdown: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl CdpAdapter {
    /// Adapter that launches (or attaches to) a real Chromium.
    pub fn new(cfg: CdpConfig) -> Self {
        let transport: Arc<dyn CdpTransport> = Arc::new(ChromiumTransport::new(cfg.clone()));
        Self::with_transport(cfg, transport)
    }

    pub fn with_transport(cfg: CdpConfig, transport: Arc<dyn CdpTransport>) -> Self {
        Self {
            cfg,
            registry: Arc::new(Registry::new()),
            transport,
            shutdown: CancellationToken::new(),
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    /// Connects the transport and spawns the event loop. Idempotent.
    pub async fn start(self: Arc<Self>) -> Result<(), AdapterError> {
        let mut tasks = self.tasks.lock().await;
        if !tasks.is_empty() {
            return Ok(());
        }
        self.transport.start().await?;
        tasks.push(spawn(Self::event_loop(Arc::clone(&self))));
        info!(target: "cdp-adapter", "event loop started");
        Ok(())
    }

    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let mut handles = self.tasks.lock().await;
        while let Some(handle) = handles.pop() {
            let _ = handle.await;
        }
    }

    pub fn register_page(
        &self,
        page: PageId,
        session: SessionId,
        target_id: Option<String>,
        cdp_session: Option<String>,
    ) {
        self.registry.insert_page(page, session, target_id, cdp_session);
    }

    /// Opens a new tab, waits for it to attach and prepares it for automation.
    pub async fn create_page(&self, url: &str) -> Result<PageId, AdapterError> {
        let response = self
            .send_command(CommandTarget::Browser, "Target.createTarget", json!({ "url": url }))
            .await?;
        let target_id = response
            .get("targetId")
            .and_then(Value::as_str)
            .ok_or_else(|| AdapterError::internal("createTarget missing targetId"))?
            .to_string();

        let deadline = Instant::now() + ATTACH_TIMEOUT;
        let page = loop {
            let attached = self
                .registry
                .page_for_target(&target_id)
                .filter(|page| self.registry.cdp_session(page).is_some());
            if let Some(page) = attached {
                break page;
            }
            if Instant::now() >= deadline {
                return Err(AdapterError::new(AdapterErrorKind::CdpIo)
                    .with_hint(format!("timed out waiting for target {target_id} to attach")));
            }
            sleep(Duration::from_millis(50)).await;
        };

        self.prepare_page(page).await?;
        info!(target: "cdp-adapter", %page, target = %target_id, "page ready");
        Ok(page)
    }

    async fn prepare_page(&self, page: PageId) -> Result<(), AdapterError> {
        for domain in ["Page.enable", "Runtime.enable", "Network.enable"] {
            self.send_page_command(page, domain, json!({})).await?;
        }
        let viewport = self.cfg.viewport;
        self.send_page_command(
            page,
            "Emulation.setDeviceMetricsOverride",
            json!({
                "width": viewport.width,
                "height": viewport.height,
                "deviceScaleFactor": 1,
                "mobile": false,
            }),
        )
        .await?;
        Ok(())
    }

    async fn event_loop(self: Arc<Self>) {
        debug!(target: "cdp-adapter", "event loop entered");
        const MIN_BACKOFF: Duration = Duration::from_millis(100);
        const MAX_BACKOFF: Duration = Duration::from_secs(5);
        let mut backoff = MIN_BACKOFF;

        loop {
            select! {
                _ = self.shutdown.cancelled() => break,
                event = self.transport.next_event() => match event {
                    Some(event) => {
                        backoff = MIN_BACKOFF;
                        if let Err(err) = self.process_event(event) {
                            debug!(target: "cdp-adapter", ?err, "dropped malformed event");
                        }
                    }
                    None => {
                        if self.shutdown.is_cancelled() {
                            break;
                        }
                        self.handle_transport_disconnect();
                        if let Err(err) = self.transport.start().await {
                            warn!(target: "cdp-adapter", ?err, "transport restart failed");
                        }
                        sleep(backoff).await;
                        backoff = (backoff + MIN_BACKOFF).min(MAX_BACKOFF);
                    }
                }
            }
        }
        debug!(target: "cdp-adapter", "event loop exiting");
    }

    fn handle_transport_disconnect(&self) {
        let pages = self.registry.pages();
        warn!(
            target: "cdp-adapter",
            pages = pages.len(),
            "transport stream ended; dropping attached pages"
        );
        for page in pages {
            self.registry.remove_page(&page);
        }
    }

    fn process_event(&self, event: TransportEvent) -> Result<(), AdapterError> {
        metrics::record_event();
        match event.method.as_str() {
            "Target.targetCreated" => {
                let payload: TargetInfoParams = serde_json::from_value(event.params)?;
                let info = payload.target_info;
                if info.target_type == "page" && self.registry.page_for_target(&info.target_id).is_none() {
                    let page = PageId::new();
                    self.registry
                        .insert_page(page, SessionId::new(), Some(info.target_id), None);
                    if let Some(url) = info.url.filter(|u| !u.is_empty()) {
                        self.registry.set_recent_url(&page, url);
                    }
                }
            }
            "Target.attachedToTarget" => {
                let payload: AttachedParams = serde_json::from_value(event.params)?;
                let info = payload.target_info;
                if info.target_type != "page" {
                    return Ok(());
                }
                let page = match self.registry.page_for_target(&info.target_id) {
                    Some(page) => page,
                    None => {
                        let page = PageId::new();
                        self.registry
                            .insert_page(page, SessionId::new(), Some(info.target_id.clone()), None);
                        page
                    }
                };
                self.registry.set_cdp_session(&page, payload.session_id);
                debug!(target: "cdp-adapter", %page, target = %info.target_id, "target attached");
            }
            "Target.targetDestroyed" | "Target.detachedFromTarget" => {
                let payload: TargetRefParams = serde_json::from_value(event.params)?;
                let page = payload
                    .target_id
                    .as_deref()
                    .and_then(|target| self.registry.page_for_target(target))
                    .or_else(|| {
                        payload
                            .session_id
                            .as_deref()
                            .and_then(|session| self.registry.page_for_session(session))
                    });
                if let Some(page) = page {
                    self.registry.remove_page(&page);
                    debug!(target: "cdp-adapter", %page, method = %event.method, "page gone");
                }
            }
            "Target.targetInfoChanged" => {
                let payload: TargetInfoParams = serde_json::from_value(event.params)?;
                if let Some(page) = self.registry.page_for_target(&payload.target_info.target_id) {
                    if let Some(url) = payload.target_info.url.filter(|u| !u.is_empty()) {
                        self.registry.set_recent_url(&page, url);
                    }
                }
            }
            "Network.requestWillBeSent" | "Network.loadingFinished" | "Network.loadingFailed" => {
                let Some(tracker) = self
                    .page_from_session(event.session_id.as_deref())
                    .and_then(|page| self.registry.network(&page))
                else {
                    return Ok(());
                };
                let payload: RequestParams = serde_json::from_value(event.params)?;
                if event.method == "Network.requestWillBeSent" {
                    tracker.request_started(&payload.request_id);
                } else {
                    tracker.request_done(&payload.request_id);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn page_from_session(&self, session: Option<&str>) -> Option<PageId> {
        session.and_then(|sid| self.registry.page_for_session(sid))
    }

    async fn send_command(
        &self,
        target: CommandTarget,
        method: &str,
        params: Value,
    ) -> Result<Value, AdapterError> {
        let start = std::time::Instant::now();
        metrics::record_command(method);
        match self.transport.send_command(target, method, params).await {
            Ok(value) => {
                metrics::record_command_success(method, start.elapsed());
                Ok(value)
            }
            Err(err) => {
                metrics::record_command_failure(method);
                Err(err)
            }
        }
    }

    async fn send_page_command(
        &self,
        page: PageId,
        method: &str,
        params: Value,
    ) -> Result<Value, AdapterError> {
        let session = self.registry.cdp_session(&page).ok_or_else(|| {
            AdapterError::new(AdapterErrorKind::CdpIo).with_hint(format!("no cdp session for {page}"))
        })?;
        self.send_command(CommandTarget::Session(session), method, params)
            .await
    }

    async fn evaluate(&self, page: PageId, expression: &str) -> Result<Value, AdapterError> {
        let response = self
            .send_page_command(
                page,
                "Runtime.evaluate",
                json!({
                    "expression": expression,
                    "awaitPromise": true,
                    "returnByValue": true,
                    "userGesture": true,
                }),
            )
            .await?;

        if let Some(details) = response.get("exceptionDetails") {
            let text = details
                .pointer("/exception/description")
                .or_else(|| details.get("text"))
                .and_then(Value::as_str)
                .unwrap_or("script raised an exception")
                .to_string();
            return Err(AdapterError::new(AdapterErrorKind::ScriptException)
                .with_hint(text)
                .with_data(details.clone()));
        }

        Ok(response
            .pointer("/result/value")
            .cloned()
            .unwrap_or(Value::Null))
    }

    /// Runs `body` against the query's first match until it reports
    /// something other than `not-found`/`not-visible`, or the deadline passes.
    async fn on_first_match(
        &self,
        page: PageId,
        query: &ElementQuery,
        body: &str,
        deadline: Duration,
    ) -> Result<Value, AdapterError> {
        let expression = query.on_first(body);
        let deadline_at = Instant::now() + deadline;
        loop {
            let value = self.evaluate(page, &expression).await?;
            let status = value.get("status").and_then(Value::as_str).unwrap_or("ok");
            match status {
                "not-found" | "not-visible" => {
                    if Instant::now() >= deadline_at {
                        let hint = if status == "not-found" {
                            format!("no element matches {query}")
                        } else {
                            format!("element {query} is not visible")
                        };
                        return Err(AdapterError::new(AdapterErrorKind::TargetNotFound).with_hint(hint));
                    }
                    sleep(POLL_INTERVAL).await;
                }
                "not-editable" => {
                    return Err(AdapterError::new(AdapterErrorKind::InvalidArgument)
                        .with_hint(format!("element {query} is not editable")))
                }
                _ => return Ok(value),
            }
        }
    }

    async fn pointer_target(
        &self,
        page: PageId,
        query: &ElementQuery,
        deadline: Duration,
    ) -> Result<(f64, f64), AdapterError> {
        let value = self
            .on_first_match(page, query, CENTER_POINT_BODY, deadline)
            .await?;
        let x = value.get("x").and_then(Value::as_f64);
        let y = value.get("y").and_then(Value::as_f64);
        match (x, y) {
            (Some(x), Some(y)) => Ok((x, y)),
            _ => Err(AdapterError::internal(format!(
                "element {query} returned no coordinates"
            ))),
        }
    }

    async fn mouse_event(&self, page: PageId, kind: &str, x: f64, y: f64) -> Result<(), AdapterError> {
        let mut params = json!({
            "type": kind,
            "x": x,
            "y": y,
            "button": "none",
            "pointerType": "mouse",
        });
        if kind != "mouseMoved" {
            params["button"] = json!("left");
            params["buttons"] = json!(1);
            params["clickCount"] = json!(1);
        }
        self.send_page_command(page, "Input.dispatchMouseEvent", params)
            .await?;
        self.registry.set_mouse(&page, x, y);
        Ok(())
    }

    async fn key_event(&self, page: PageId, def: &KeyDefinition, kind: &str) -> Result<(), AdapterError> {
        let held = if def.is_modifier() {
            self.registry.toggle_modifier(&page, def.modifier, kind == "keyDown")
        } else {
            self.registry.modifiers(&page)
        };
        self.send_page_command(page, "Input.dispatchKeyEvent", def.event(kind, held))
            .await
            .map(|_| ())
    }

    async fn press_definition(&self, page: PageId, def: &KeyDefinition) -> Result<(), AdapterError> {
        self.key_event(page, def, "keyDown").await?;
        self.key_event(page, def, "keyUp").await
    }

    async fn wait_for_dom_ready(&self, page: PageId, deadline_at: Instant) -> Result<(), AdapterError> {
        loop {
            let state = self.evaluate(page, "document.readyState").await?;
            if matches!(state.as_str(), Some("interactive" | "complete")) {
                return Ok(());
            }
            if Instant::now() >= deadline_at {
                return Err(AdapterError::new(AdapterErrorKind::NavTimeout)
                    .with_hint("document never became ready"));
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn wait_for_network_quiet(
        &self,
        page: PageId,
        window_ms: u64,
        max_inflight: u32,
        deadline_at: Instant,
    ) -> Result<(), AdapterError> {
        let tracker = self.registry.network(&page).ok_or_else(|| {
            AdapterError::new(AdapterErrorKind::CdpIo).with_hint(format!("unknown page {page}"))
        })?;
        let window = Duration::from_millis(window_ms);
        loop {
            let snapshot = tracker.snapshot();
            if snapshot.is_quiet(window, max_inflight) {
                return Ok(());
            }
            if Instant::now() >= deadline_at {
                return Err(AdapterError::new(AdapterErrorKind::WaitTimeout).with_hint(format!(
                    "network still busy ({} in flight)",
                    snapshot.inflight
                )));
            }
            sleep(POLL_INTERVAL).await;
        }
    }
}

const CENTER_POINT_BODY: &str = r#"
  const rect = el.getBoundingClientRect();
  if (!rect || rect.width === 0 || rect.height === 0) { return { status: 'not-visible' }; }
  return { status: 'ok', x: rect.left + rect.width / 2, y: rect.top + rect.height / 2 };
"#;

const SCROLL_INTO_VIEW_BODY: &str = r#"
  if (typeof el.scrollIntoViewIfNeeded === 'function') { el.scrollIntoViewIfNeeded(true); }
  else { el.scrollIntoView({ block: 'center', inline: 'center' }); }
  return { status: 'ok' };
"#;

const FOCUS_BODY: &str = r#"
  if (typeof el.focus === 'function') { el.focus(); }
  return { status: 'ok' };
"#;

fn fill_body(value: &str) -> String {
    format!(
        r#"
  const value = {value};
  const tag = (el.tagName || '').toLowerCase();
  if (tag === 'input' || tag === 'textarea') {{
    if (typeof el.focus === 'function') {{ el.focus(); }}
    const proto = tag === 'input' ? HTMLInputElement.prototype : HTMLTextAreaElement.prototype;
    const setter = Object.getOwnPropertyDescriptor(proto, 'value').set;
    setter.call(el, value);
  }} else if (el.isContentEditable) {{
    el.focus();
    el.textContent = value;
  }} else {{
    return {{ status: 'not-editable' }};
  }}
  el.dispatchEvent(new Event('input', {{ bubbles: true }}));
  el.dispatchEvent(new Event('change', {{ bubbles: true }}));
  return {{ status: 'ok' }};
"#,
        value = js_string(value)
    )
}

fn state_probe(query: &ElementQuery, state: ElementState) -> String {
    format!(
        r#"(() => {{
  const list = {script};
  const el = list && list.length ? list[0] : null;
  const visible = (node) => {{
    if (!node || !node.isConnected) {{ return false; }}
    const style = window.getComputedStyle(node);
    if (style.visibility === 'hidden' || style.display === 'none') {{ return false; }}
    const rect = node.getBoundingClientRect();
    return rect.width > 0 && rect.height > 0;
  }};
  switch ({state}) {{
    case 'attached': return !!el;
    case 'detached': return !el;
    case 'visible': return visible(el);
    case 'hidden': return !visible(el);
  }}
  return false;
}})()"#,
        script = query.script,
        state = js_string(state.as_str())
    )
}

const CONTENT_EXPRESSION: &str = "(() => { const dt = document.doctype ? new XMLSerializer().serializeToString(document.doctype) : ''; return dt + (document.documentElement ? document.documentElement.outerHTML : ''); })()";

#[derive(Debug, Deserialize)]
struct TargetInfoPayload {
    #[serde(rename = "targetId")]
    target_id: String,
    #[serde(rename = "type")]
    target_type: String,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TargetInfoParams {
    #[serde(rename = "targetInfo")]
    target_info: TargetInfoPayload,
}

#[derive(Debug, Deserialize)]
struct AttachedParams {
    #[serde(rename = "sessionId")]
    session_id: String,
    #[serde(rename = "targetInfo")]
    target_info: TargetInfoPayload,
}

#[derive(Debug, Deserialize)]
struct TargetRefParams {
    #[serde(rename = "targetId")]
    target_id: Option<String>,
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RequestParams {
    #[serde(rename = "requestId")]
    request_id: String,
}

#[async_trait]
impl Cdp for CdpAdapter {
    async fn navigate(&self, page: PageId, url: &str, deadline: Duration) -> Result<(), AdapterError> {
        url::Url::parse(url).map_err(|err| {
            AdapterError::new(AdapterErrorKind::InvalidArgument)
                .with_hint(format!("invalid url '{url}': {err}"))
        })?;

        let deadline_at = Instant::now() + deadline;
        if let Some(tracker) = self.registry.network(&page) {
            tracker.reset();
        }

        let navigation = async {
            let response = self
                .send_page_command(page, "Page.navigate", json!({ "url": url }))
                .await?;
            if let Some(error_text) = response.get("errorText").and_then(Value::as_str) {
                return Err(AdapterError::new(AdapterErrorKind::CdpIo)
                    .with_hint(format!("navigation to {url} failed: {error_text}")));
            }
            self.registry.set_recent_url(&page, url.to_string());
            self.wait_for_dom_ready(page, deadline_at).await
        };

        match tokio::time::timeout(deadline, navigation).await {
            Ok(result) => result,
            Err(_) => Err(AdapterError::new(AdapterErrorKind::NavTimeout)
                .with_hint(format!("navigation to {url} exceeded {}ms", deadline.as_millis()))),
        }
    }

    async fn current_url(&self, page: PageId) -> Result<String, AdapterError> {
        let value = self.evaluate(page, "window.location.href").await?;
        let url = value
            .as_str()
            .ok_or_else(|| AdapterError::internal("location.href was not a string"))?
            .to_string();
        self.registry.set_recent_url(&page, url.clone());
        Ok(url)
    }

    async fn content(&self, page: PageId) -> Result<String, AdapterError> {
        match self.evaluate(page, CONTENT_EXPRESSION).await? {
            Value::String(markup) => Ok(markup),
            other => Err(AdapterError::internal(format!(
                "document markup had unexpected type: {other}"
            ))),
        }
    }

    async fn evaluate_script(&self, page: PageId, expression: &str) -> Result<Value, AdapterError> {
        self.evaluate(page, expression).await
    }

    async fn count(&self, page: PageId, query: &ElementQuery) -> Result<usize, AdapterError> {
        let value = self.evaluate(page, &query.count_expression()).await?;
        Ok(value.as_u64().unwrap_or(0) as usize)
    }

    async fn scroll_into_view(
        &self,
        page: PageId,
        query: &ElementQuery,
        deadline: Duration,
    ) -> Result<(), AdapterError> {
        self.on_first_match(page, query, SCROLL_INTO_VIEW_BODY, deadline)
            .await
            .map(|_| ())
    }

    async fn click(&self, page: PageId, query: &ElementQuery, deadline: Duration) -> Result<(), AdapterError> {
        let (x, y) = self.pointer_target(page, query, deadline).await?;
        self.mouse_event(page, "mouseMoved", x, y).await?;
        self.mouse_event(page, "mousePressed", x, y).await?;
        self.mouse_event(page, "mouseReleased", x, y).await
    }

    async fn hover(&self, page: PageId, query: &ElementQuery, deadline: Duration) -> Result<(), AdapterError> {
        let (x, y) = self.pointer_target(page, query, deadline).await?;
        self.mouse_event(page, "mouseMoved", x, y).await
    }

    async fn fill(
        &self,
        page: PageId,
        query: &ElementQuery,
        value: &str,
        deadline: Duration,
    ) -> Result<(), AdapterError> {
        self.on_first_match(page, query, &fill_body(value), deadline)
            .await
            .map(|_| ())
    }

    async fn focus(&self, page: PageId, query: &ElementQuery, deadline: Duration) -> Result<(), AdapterError> {
        self.on_first_match(page, query, FOCUS_BODY, deadline)
            .await
            .map(|_| ())
    }

    async fn wait_for_state(
        &self,
        page: PageId,
        query: &ElementQuery,
        state: ElementState,
        deadline: Duration,
    ) -> Result<(), AdapterError> {
        let probe = state_probe(query, state);
        let deadline_at = Instant::now() + deadline;
        loop {
            if self.evaluate(page, &probe).await?.as_bool() == Some(true) {
                return Ok(());
            }
            if Instant::now() >= deadline_at {
                return Err(AdapterError::new(AdapterErrorKind::WaitTimeout).with_hint(format!(
                    "{query} did not become {} within {}ms",
                    state.as_str(),
                    deadline.as_millis()
                )));
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn key_down(&self, page: PageId, key: &str) -> Result<(), AdapterError> {
        let def = KeyDefinition::lookup(key)?;
        self.key_event(page, &def, "keyDown").await
    }

    async fn key_up(&self, page: PageId, key: &str) -> Result<(), AdapterError> {
        let def = KeyDefinition::lookup(key)?;
        self.key_event(page, &def, "keyUp").await
    }

    async fn press_key(&self, page: PageId, key: &str) -> Result<(), AdapterError> {
        let (modifiers, last) = split_combo(key);
        let modifiers = modifiers
            .into_iter()
            .map(KeyDefinition::lookup)
            .collect::<Result<Vec<_>, _>>()?;
        let last = KeyDefinition::lookup(last)?;

        for def in &modifiers {
            self.key_event(page, def, "keyDown").await?;
        }
        let pressed = self.press_definition(page, &last).await;
        for def in modifiers.iter().rev() {
            self.key_event(page, def, "keyUp").await?;
        }
        pressed
    }

    async fn type_text(&self, page: PageId, text: &str, delay: Duration) -> Result<(), AdapterError> {
        for (position, ch) in text.chars().enumerate() {
            if position > 0 && !delay.is_zero() {
                sleep(delay).await;
            }
            if ch == '\n' {
                self.press_key(page, "Enter").await?;
            } else if ch.is_ascii() && !ch.is_ascii_control() {
                self.press_definition(page, &KeyDefinition::character(ch))
                    .await?;
            } else {
                self.send_page_command(page, "Input.insertText", json!({ "text": ch.to_string() }))
                    .await?;
            }
        }
        Ok(())
    }

    async fn mouse_wheel(&self, page: PageId, delta_x: f64, delta_y: f64) -> Result<(), AdapterError> {
        let (x, y) = self.registry.mouse(&page);
        self.send_page_command(
            page,
            "Input.dispatchMouseEvent",
            json!({
                "type": "mouseWheel",
                "x": x,
                "y": y,
                "deltaX": delta_x,
                "deltaY": delta_y,
                "pointerType": "mouse",
            }),
        )
        .await
        .map(|_| ())
    }

    async fn wait_basic(&self, page: PageId, gate: WaitGate, timeout: Duration) -> Result<(), AdapterError> {
        let deadline_at = Instant::now() + timeout;
        match gate {
            WaitGate::DomReady => self.wait_for_dom_ready(page, deadline_at).await,
            WaitGate::NetworkQuiet {
                window_ms,
                max_inflight,
            } => {
                self.wait_for_network_quiet(page, window_ms, max_inflight, deadline_at)
                    .await
            }
        }
    }

    async fn screenshot(&self, page: PageId, deadline: Duration) -> Result<Vec<u8>, AdapterError> {
        let capture = self.send_page_command(
            page,
            "Page.captureScreenshot",
            json!({ "format": "png", "captureBeyondViewport": false, "fromSurface": true }),
        );
        let response = tokio::time::timeout(deadline, capture)
            .await
            .map_err(|_| {
                AdapterError::new(AdapterErrorKind::WaitTimeout)
                    .with_hint(format!("screenshot exceeded {}ms", deadline.as_millis()))
            })??;
        let data = response
            .get("data")
            .and_then(Value::as_str)
            .ok_or_else(|| AdapterError::internal("missing screenshot data"))?;
        let bytes = STANDARD
            .decode(data)
            .map_err(|err| AdapterError::internal(err.to_string()))?;
        metrics::record_screenshot();
        Ok(bytes)
    }
}
