//! In-memory page for exercising callers of [`Cdp`] without a browser.
//!
//! Elements are keyed by [`ElementQuery::label`], so a test registers
//! `css=#submit` or `role=button[name="Save"]` with a match count and
//! optionally the page change a click on it causes.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::adapter::Cdp;
use crate::commands::{ElementQuery, ElementState, WaitGate};
use crate::error::{AdapterError, AdapterErrorKind};
use crate::ids::PageId;

/// PNG signature followed by a marker, enough to look like an image on disk.
pub const FAKE_PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake-page";

/// One recorded interaction.
#[derive(Clone, Debug, PartialEq)]
pub enum FakeCall {
    Navigate(String),
    Click(String),
    Hover(String),
    Fill(String, String),
    Focus(String),
    ScrollIntoView(String),
    WaitFor(String, ElementState),
    KeyDown(String),
    KeyUp(String),
    Press(String),
    Type(String),
    Wheel(f64, f64),
    WaitBasic(WaitGate),
    Screenshot,
}

#[derive(Clone, Debug, Default)]
struct Effect {
    url: Option<String>,
    content: Option<String>,
    remove: Vec<String>,
}

#[derive(Default)]
struct FakeState {
    url: String,
    content: String,
    elements: HashMap<String, usize>,
    click_effects: HashMap<String, Effect>,
    pages: HashMap<String, String>,
    scripts: HashMap<String, Value>,
    failing: HashMap<&'static str, AdapterError>,
    stalled: HashSet<&'static str>,
    calls: Vec<FakeCall>,
    typed: String,
}

/// Scriptable stand-in for a browser page.
pub struct FakePage {
    state: Mutex<FakeState>,
}

impl Default for FakePage {
    fn default() -> Self {
        Self::new()
    }
}

impl FakePage {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                url: "about:blank".into(),
                content: "<html><head></head><body></body></html>".into(),
                ..FakeState::default()
            }),
        }
    }

    pub fn set_url(&self, url: impl Into<String>) {
        self.state.lock().url = url.into();
    }

    pub fn set_content(&self, content: impl Into<String>) {
        self.state.lock().content = content.into();
    }

    /// Markup served after navigating to `url`.
    pub fn serve(&self, url: impl Into<String>, content: impl Into<String>) {
        self.state.lock().pages.insert(url.into(), content.into());
    }

    /// Declares how many elements match the query labelled `label`.
    pub fn add_element(&self, label: impl Into<String>, count: usize) {
        self.state.lock().elements.insert(label.into(), count);
    }

    pub fn remove_element(&self, label: &str) {
        self.state.lock().elements.remove(label);
    }

    /// Clicking `label` replaces the page markup.
    pub fn on_click_content(&self, label: impl Into<String>, content: impl Into<String>) {
        self.state
            .lock()
            .click_effects
            .entry(label.into())
            .or_default()
            .content = Some(content.into());
    }

    /// Clicking `label` moves the page to `url`.
    pub fn on_click_url(&self, label: impl Into<String>, url: impl Into<String>) {
        self.state
            .lock()
            .click_effects
            .entry(label.into())
            .or_default()
            .url = Some(url.into());
    }

    /// Clicking `label` removes the element `removed` from the page.
    pub fn on_click_remove(&self, label: impl Into<String>, removed: impl Into<String>) {
        self.state
            .lock()
            .click_effects
            .entry(label.into())
            .or_default()
            .remove
            .push(removed.into());
    }

    /// Result returned by `evaluate_script` for an exact expression.
    pub fn script_result(&self, expression: impl Into<String>, value: Value) {
        self.state.lock().scripts.insert(expression.into(), value);
    }

    /// Makes every call of `op` fail with `error` until [`FakePage::heal`].
    pub fn fail(&self, op: &'static str, error: AdapterError) {
        self.state.lock().failing.insert(op, error);
    }

    /// Makes every call of `op` hang forever.
    pub fn stall(&self, op: &'static str) {
        self.state.lock().stalled.insert(op);
    }

    pub fn heal(&self, op: &'static str) {
        let mut state = self.state.lock();
        state.failing.remove(op);
        state.stalled.remove(op);
    }

    pub fn calls(&self) -> Vec<FakeCall> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Text delivered through `type_text` or `fill`, in order.
    pub fn typed(&self) -> String {
        self.state.lock().typed.clone()
    }

    async fn enter(&self, op: &'static str) -> Result<(), AdapterError> {
        let stalled = {
            let state = self.state.lock();
            if let Some(err) = state.failing.get(op) {
                return Err(err.clone());
            }
            state.stalled.contains(op)
        };
        if stalled {
            futures::future::pending::<()>().await;
        }
        Ok(())
    }

    fn record(&self, call: FakeCall) {
        self.state.lock().calls.push(call);
    }

    fn matches(&self, query: &ElementQuery) -> usize {
        self.state
            .lock()
            .elements
            .get(&query.label)
            .copied()
            .unwrap_or(0)
    }

    async fn require(&self, query: &ElementQuery, deadline: Duration) -> Result<(), AdapterError> {
        if self.matches(query) > 0 {
            return Ok(());
        }
        tokio::time::sleep(deadline).await;
        if self.matches(query) > 0 {
            return Ok(());
        }
        Err(AdapterError::new(AdapterErrorKind::TargetNotFound)
            .with_hint(format!("no element matches {query}")))
    }
}

#[async_trait]
impl Cdp for FakePage {
    async fn navigate(&self, _page: PageId, url: &str, _deadline: Duration) -> Result<(), AdapterError> {
        self.enter("navigate").await?;
        self.record(FakeCall::Navigate(url.to_string()));
        let mut state = self.state.lock();
        state.url = url.to_string();
        if let Some(content) = state.pages.get(url).cloned() {
            state.content = content;
        }
        Ok(())
    }

    async fn current_url(&self, _page: PageId) -> Result<String, AdapterError> {
        self.enter("current_url").await?;
        Ok(self.state.lock().url.clone())
    }

    async fn content(&self, _page: PageId) -> Result<String, AdapterError> {
        self.enter("content").await?;
        Ok(self.state.lock().content.clone())
    }

    async fn evaluate_script(&self, _page: PageId, expression: &str) -> Result<Value, AdapterError> {
        self.enter("evaluate_script").await?;
        Ok(self
            .state
            .lock()
            .scripts
            .get(expression)
            .cloned()
            .unwrap_or(Value::Null))
    }

    async fn count(&self, _page: PageId, query: &ElementQuery) -> Result<usize, AdapterError> {
        self.enter("count").await?;
        Ok(self.matches(query))
    }

    async fn scroll_into_view(
        &self,
        _page: PageId,
        query: &ElementQuery,
        deadline: Duration,
    ) -> Result<(), AdapterError> {
        self.enter("scroll_into_view").await?;
        self.require(query, deadline).await?;
        self.record(FakeCall::ScrollIntoView(query.label.clone()));
        Ok(())
    }

    async fn click(&self, _page: PageId, query: &ElementQuery, deadline: Duration) -> Result<(), AdapterError> {
        self.enter("click").await?;
        self.require(query, deadline).await?;
        self.record(FakeCall::Click(query.label.clone()));
        let mut state = self.state.lock();
        if let Some(effect) = state.click_effects.get(&query.label).cloned() {
            if let Some(url) = effect.url {
                state.url = url;
            }
            if let Some(content) = effect.content {
                state.content = content;
            }
            for removed in effect.remove {
                state.elements.remove(&removed);
            }
        }
        Ok(())
    }

    async fn hover(&self, _page: PageId, query: &ElementQuery, deadline: Duration) -> Result<(), AdapterError> {
        self.enter("hover").await?;
        self.require(query, deadline).await?;
        self.record(FakeCall::Hover(query.label.clone()));
        Ok(())
    }

    async fn fill(
        &self,
        _page: PageId,
        query: &ElementQuery,
        value: &str,
        deadline: Duration,
    ) -> Result<(), AdapterError> {
        self.enter("fill").await?;
        self.require(query, deadline).await?;
        self.record(FakeCall::Fill(query.label.clone(), value.to_string()));
        self.state.lock().typed.push_str(value);
        Ok(())
    }

    async fn focus(&self, _page: PageId, query: &ElementQuery, deadline: Duration) -> Result<(), AdapterError> {
        self.enter("focus").await?;
        self.require(query, deadline).await?;
        self.record(FakeCall::Focus(query.label.clone()));
        Ok(())
    }

    async fn wait_for_state(
        &self,
        _page: PageId,
        query: &ElementQuery,
        state: ElementState,
        deadline: Duration,
    ) -> Result<(), AdapterError> {
        self.enter("wait_for_state").await?;
        self.record(FakeCall::WaitFor(query.label.clone(), state));
        let satisfied = |count: usize| match state {
            ElementState::Attached | ElementState::Visible => count > 0,
            ElementState::Detached | ElementState::Hidden => count == 0,
        };
        if satisfied(self.matches(query)) {
            return Ok(());
        }
        tokio::time::sleep(deadline).await;
        if satisfied(self.matches(query)) {
            return Ok(());
        }
        Err(AdapterError::new(AdapterErrorKind::WaitTimeout).with_hint(format!(
            "{query} did not become {} within {}ms",
            state.as_str(),
            deadline.as_millis()
        )))
    }

    async fn key_down(&self, _page: PageId, key: &str) -> Result<(), AdapterError> {
        self.enter("key_down").await?;
        self.record(FakeCall::KeyDown(key.to_string()));
        Ok(())
    }

    async fn key_up(&self, _page: PageId, key: &str) -> Result<(), AdapterError> {
        self.enter("key_up").await?;
        self.record(FakeCall::KeyUp(key.to_string()));
        Ok(())
    }

    async fn press_key(&self, _page: PageId, key: &str) -> Result<(), AdapterError> {
        self.enter("press_key").await?;
        self.record(FakeCall::Press(key.to_string()));
        Ok(())
    }

    async fn type_text(&self, _page: PageId, text: &str, delay: Duration) -> Result<(), AdapterError> {
        self.enter("type_text").await?;
        let chars = text.chars().count() as u32;
        if chars > 1 && !delay.is_zero() {
            tokio::time::sleep(delay * (chars - 1)).await;
        }
        self.record(FakeCall::Type(text.to_string()));
        self.state.lock().typed.push_str(text);
        Ok(())
    }

    async fn mouse_wheel(&self, _page: PageId, delta_x: f64, delta_y: f64) -> Result<(), AdapterError> {
        self.enter("mouse_wheel").await?;
        self.record(FakeCall::Wheel(delta_x, delta_y));
        Ok(())
    }

    async fn wait_basic(&self, _page: PageId, gate: WaitGate, _timeout: Duration) -> Result<(), AdapterError> {
        self.enter("wait_basic").await?;
        self.record(FakeCall::WaitBasic(gate));
        Ok(())
    }

    async fn screenshot(&self, _page: PageId, _deadline: Duration) -> Result<Vec<u8>, AdapterError> {
        self.enter("screenshot").await?;
        self.record(FakeCall::Screenshot);
        Ok(FAKE_PNG.to_vec())
    }
}
