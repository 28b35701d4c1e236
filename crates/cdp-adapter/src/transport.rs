//! Raw DevTools connection: command routing and event forwarding.

use std::collections::HashMap;
use std::convert::TryInto;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::async_process::Child;
use chromiumoxide::cdp::browser_protocol::target::SessionId as CdpSessionId;
use chromiumoxide::cdp::events::CdpEventMessage;
use chromiumoxide::conn::Connection;
use chromiumoxide::error::CdpError;
use chromiumoxide_types::{CallId, CdpJsonEventMessage, Message, MethodId, Response};
use futures::{future::BoxFuture, StreamExt};
use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::CdpConfig;
use crate::error::{AdapterError, AdapterErrorKind};
use crate::launch;

#[derive(Clone, Debug)]
pub struct TransportEvent {
    pub method: String,
    pub params: Value,
    pub session_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandTarget {
    Browser,
    Session(String),
}

#[async_trait]
pub trait CdpTransport: Send + Sync {
    async fn start(&self) -> Result<(), AdapterError>;
    async fn next_event(&self) -> Option<TransportEvent>;
    async fn send_command(
        &self,
        target: CommandTarget,
        method: &str,
        params: Value,
    ) -> Result<Value, AdapterError>;
}

/// Transport that refuses every command; used when no browser is wanted.
#[derive(Default)]
pub struct NoopTransport;

#[async_trait]
impl CdpTransport for NoopTransport {
    async fn start(&self) -> Result<(), AdapterError> {
        Ok(())
    }

    async fn next_event(&self) -> Option<TransportEvent> {
        futures::future::pending().await
    }

    async fn send_command(
        &self,
        _target: CommandTarget,
        method: &str,
        _params: Value,
    ) -> Result<Value, AdapterError> {
        Err(AdapterError::new(AdapterErrorKind::CdpIo)
            .with_hint(format!("no browser attached for {method}")))
    }
}

type LinkFactory =
    Arc<dyn Fn(CdpConfig) -> BoxFuture<'static, Result<Arc<Link>, AdapterError>> + Send + Sync>;

/// Transport backed by a chromiumoxide websocket connection.
///
/// The connection is opened lazily and reopened when its reader task dies.
#[derive(Clone)]
pub struct ChromiumTransport {
    cfg: CdpConfig,
    link: Arc<Mutex<Option<Arc<Link>>>>,
    factory: LinkFactory,
}

impl ChromiumTransport {
    pub fn new(cfg: CdpConfig) -> Self {
        let factory: LinkFactory =
            Arc::new(|cfg: CdpConfig| Box::pin(async move { Link::open(cfg).await.map(Arc::new) }));
        Self::with_factory(cfg, factory)
    }

    fn with_factory(cfg: CdpConfig, factory: LinkFactory) -> Self {
        Self {
            cfg,
            link: Arc::new(Mutex::new(None)),
            factory,
        }
    }

    async fn link(&self) -> Result<Arc<Link>, AdapterError> {
        let mut guard = self.link.lock().await;
        if let Some(link) = guard.as_ref().filter(|link| link.is_alive()) {
            return Ok(Arc::clone(link));
        }
        if guard.is_some() {
            warn!(target: "cdp-transport", "connection lost; reconnecting");
        }
        let link = (self.factory)(self.cfg.clone()).await?;
        *guard = Some(Arc::clone(&link));
        Ok(link)
    }

    fn deadline(&self) -> Duration {
        Duration::from_millis(self.cfg.default_deadline_ms)
    }
}

#[async_trait]
impl CdpTransport for ChromiumTransport {
    async fn start(&self) -> Result<(), AdapterError> {
        let link = self.link().await?;
        link.call(
            CommandTarget::Browser,
            "Target.setDiscoverTargets",
            json!({ "discover": true }),
            self.deadline(),
        )
        .await?;
        link.call(
            CommandTarget::Browser,
            "Target.setAutoAttach",
            json!({
                "autoAttach": true,
                "waitForDebuggerOnStart": false,
                "flatten": true,
            }),
            self.deadline(),
        )
        .await?;
        Ok(())
    }

    async fn next_event(&self) -> Option<TransportEvent> {
        match self.link().await {
            Ok(link) => link.next_event().await,
            Err(err) => {
                warn!(target: "cdp-transport", ?err, "transport not ready");
                None
            }
        }
    }

    async fn send_command(
        &self,
        target: CommandTarget,
        method: &str,
        params: Value,
    ) -> Result<Value, AdapterError> {
        self.link()
            .await?
            .call(target, method, params, self.deadline())
            .await
    }
}

struct ControlMessage {
    target: CommandTarget,
    method: String,
    params: Value,
    responder: oneshot::Sender<Result<Value, AdapterError>>,
}

type Inflight = HashMap<CallId, oneshot::Sender<Result<Value, AdapterError>>>;

/// One live websocket plus the tasks pumping it.
struct Link {
    command_tx: mpsc::Sender<ControlMessage>,
    events_rx: Mutex<mpsc::Receiver<TransportEvent>>,
    pump: JoinHandle<()>,
    heartbeat: Option<JoinHandle<()>>,
    child: Mutex<Option<Child>>,
    alive: Arc<AtomicBool>,
}

impl Link {
    async fn open(cfg: CdpConfig) -> Result<Self, AdapterError> {
        let (child, ws_url) = match cfg.websocket_url.clone() {
            Some(url) => (None, url),
            None => {
                let browser_cfg = launch::browser_config(&cfg)?;
                let wait = Duration::from_millis(cfg.launch_timeout_ms);
                let (child, url) = launch::launch_browser(browser_cfg, wait).await?;
                (Some(child), url)
            }
        };

        let conn = Connection::<CdpEventMessage>::connect(&ws_url)
            .await
            .map_err(|err| AdapterError::new(AdapterErrorKind::CdpIo).with_hint(err.to_string()))?;

        let (command_tx, command_rx) = mpsc::channel(128);
        let (events_tx, events_rx) = mpsc::channel(1024);
        let alive = Arc::new(AtomicBool::new(true));

        let pump_alive = Arc::clone(&alive);
        let pump = tokio::spawn(async move {
            let result = Self::pump(conn, command_rx, events_tx).await;
            pump_alive.store(false, Ordering::Relaxed);
            if let Err(err) = result {
                error!(target: "cdp-transport", ?err, "connection pump terminated with error");
            }
        });

        let heartbeat = Self::spawn_heartbeat(
            command_tx.clone(),
            Arc::clone(&alive),
            Duration::from_millis(cfg.heartbeat_interval_ms),
        );

        info!(target: "cdp-transport", url = %ws_url, "chromium connection established");

        Ok(Self {
            command_tx,
            events_rx: Mutex::new(events_rx),
            pump,
            heartbeat,
            child: Mutex::new(child),
            alive,
        })
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Relaxed)
    }

    async fn call(
        &self,
        target: CommandTarget,
        method: &str,
        params: Value,
        deadline: Duration,
    ) -> Result<Value, AdapterError> {
        let (responder, response) = oneshot::channel();
        self.command_tx
            .send(ControlMessage {
                target,
                method: method.to_string(),
                params,
                responder,
            })
            .await
            .map_err(|err| AdapterError::new(AdapterErrorKind::CdpIo).with_hint(err.to_string()))?;

        match tokio::time::timeout(deadline, response).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(AdapterError::new(AdapterErrorKind::CdpIo)
                .with_hint(format!("{method}: response channel closed"))),
            Err(_) => Err(AdapterError::new(AdapterErrorKind::WaitTimeout)
                .with_hint(format!("{method}: no response within {}ms", deadline.as_millis()))
                .retriable(true)),
        }
    }

    async fn next_event(&self) -> Option<TransportEvent> {
        self.events_rx.lock().await.recv().await
    }

    /// Keeps idle connections from being dropped by proxies and notices dead browsers.
    fn spawn_heartbeat(
        sender: mpsc::Sender<ControlMessage>,
        alive: Arc<AtomicBool>,
        every: Duration,
    ) -> Option<JoinHandle<()>> {
        if every.is_zero() {
            return None;
        }
        let reply_within = every.min(Duration::from_secs(5));

        Some(tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker.tick().await;

            while alive.load(Ordering::Relaxed) {
                ticker.tick().await;
                let (responder, response) = oneshot::channel();
                let ping = ControlMessage {
                    target: CommandTarget::Browser,
                    method: "Browser.getVersion".to_string(),
                    params: json!({}),
                    responder,
                };
                if sender.send(ping).await.is_err() {
                    debug!(target: "cdp-transport", "heartbeat channel closed");
                    break;
                }
                match tokio::time::timeout(reply_within, response).await {
                    Ok(Ok(Ok(_))) => {}
                    Ok(Ok(Err(err))) => {
                        warn!(target: "cdp-transport", ?err, "heartbeat failed");
                        alive.store(false, Ordering::Relaxed);
                        break;
                    }
                    Ok(Err(_)) => break,
                    Err(_) => {
                        warn!(target: "cdp-transport", "heartbeat timed out");
                        alive.store(false, Ordering::Relaxed);
                        break;
                    }
                }
            }
        }))
    }

    async fn pump(
        mut conn: Connection<CdpEventMessage>,
        mut command_rx: mpsc::Receiver<ControlMessage>,
        events_tx: mpsc::Sender<TransportEvent>,
    ) -> Result<(), AdapterError> {
        let mut inflight = Inflight::new();

        loop {
            tokio::select! {
                Some(cmd) = command_rx.recv() => {
                    Self::submit(&mut conn, cmd, &mut inflight);
                }
                message = conn.next() => match message {
                    Some(Ok(Message::Response(resp))) => {
                        if let Some(sender) = inflight.remove(&resp.id) {
                            let _ = sender.send(Self::extract_payload(resp));
                        }
                    }
                    Some(Ok(Message::Event(event))) => {
                        if let Err(err) = Self::forward_event(event, &events_tx).await {
                            warn!(target: "cdp-transport", ?err, "failed to forward event");
                        }
                    }
                    Some(Err(err)) => {
                        let err = Self::map_cdp_error(err);
                        Self::fail_all(&mut inflight, &err);
                        return Err(err);
                    }
                    None => {
                        let err = AdapterError::new(AdapterErrorKind::CdpIo)
                            .with_hint("cdp connection closed");
                        Self::fail_all(&mut inflight, &err);
                        return Ok(());
                    }
                }
            }
        }
    }

    fn submit(conn: &mut Connection<CdpEventMessage>, cmd: ControlMessage, inflight: &mut Inflight) {
        let session = match cmd.target {
            CommandTarget::Browser => None,
            CommandTarget::Session(id) => Some(CdpSessionId::from(id)),
        };
        let method: MethodId = cmd.method.clone().into();
        match conn.submit_command(method, session, cmd.params) {
            Ok(call_id) => {
                inflight.insert(call_id, cmd.responder);
            }
            Err(err) => {
                let _ = cmd.responder.send(Err(AdapterError::new(AdapterErrorKind::CdpIo)
                    .with_hint(format!("{}: {err}", cmd.method))));
            }
        }
    }

    fn fail_all(inflight: &mut Inflight, err: &AdapterError) {
        for (_, sender) in inflight.drain() {
            let _ = sender.send(Err(err.clone()));
        }
    }

    async fn forward_event(
        event: CdpEventMessage,
        events_tx: &mpsc::Sender<TransportEvent>,
    ) -> Result<(), AdapterError> {
        let raw: CdpJsonEventMessage = event
            .try_into()
            .map_err(|err| AdapterError::internal(format!("failed to decode cdp event: {err}")))?;

        events_tx
            .send(TransportEvent {
                method: raw.method.into_owned(),
                params: raw.params,
                session_id: raw.session_id,
            })
            .await
            .map_err(|err| AdapterError::internal(err.to_string()))
    }

    fn extract_payload(resp: Response) -> Result<Value, AdapterError> {
        match (resp.result, resp.error) {
            (Some(result), _) => Ok(result),
            (None, Some(error)) => Err(AdapterError::new(AdapterErrorKind::CdpIo)
                .with_hint(format!("cdp error {}: {}", error.code, error.message))
                .retriable(error.code >= 500)),
            (None, None) => Err(AdapterError::internal("empty cdp response")),
        }
    }

    fn map_cdp_error(err: CdpError) -> AdapterError {
        let hint = err.to_string();
        match err {
            CdpError::Timeout => AdapterError::new(AdapterErrorKind::WaitTimeout)
                .with_hint(hint)
                .retriable(true),
            CdpError::JavascriptException(_) => {
                AdapterError::new(AdapterErrorKind::ScriptException).with_hint(hint)
            }
            CdpError::Serde(_) | CdpError::FrameNotFound(_) => AdapterError::internal(hint),
            _ => AdapterError::new(AdapterErrorKind::CdpIo)
                .with_hint(hint)
                .retriable(true),
        }
    }

    #[cfg(test)]
    fn stub() -> (Arc<Self>, Arc<AtomicBool>) {
        let (command_tx, _command_rx) = mpsc::channel(8);
        let (_events_tx, events_rx) = mpsc::channel(8);
        let alive = Arc::new(AtomicBool::new(true));
        let link = Self {
            command_tx,
            events_rx: Mutex::new(events_rx),
            pump: tokio::spawn(futures::future::pending::<()>()),
            heartbeat: None,
            child: Mutex::new(None),
            alive: Arc::clone(&alive),
        };
        (Arc::new(link), alive)
    }
}

impl Drop for Link {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::Relaxed);
        self.pump.abort();
        if let Some(handle) = &self.heartbeat {
            handle.abort();
        }

        let Some(mut child) = self.child.try_lock().ok().and_then(|mut guard| guard.take()) else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(err) = child.kill().await {
                        warn!(target: "cdp-transport", ?err, "failed to kill chromium child");
                    }
                });
            }
            Err(_) => debug!(target: "cdp-transport", "no runtime to reap chromium child"),
        }
    }
}
