//! Browser bootstrap and login.

use std::sync::Arc;
use std::time::Duration;

use action_locator::{ElementResolver, SelectorResolver};
use anyhow::{Context, Result};
use cdp_adapter::{AdapterError, Cdp, CdpAdapter, ElementQuery, PageId, WaitGate};
use tokio::time::sleep;
use tracewalk_core_types::TargetSpec;
use tracing::{info, warn};

use crate::apps::AppProfile;
use crate::config::{BrowserSettings, LoginSettings};

const FIELD_DEADLINE: Duration = Duration::from_secs(10);
const TEXTBOX_SELECTOR: &str = "input:not([type]), input[type=text], input[type=email], input[type=password], textarea, [role=textbox]";

/// A started adapter and the page the run drives.
pub struct BrowserSession {
    adapter: Arc<CdpAdapter>,
    page: PageId,
}

impl BrowserSession {
    pub async fn start(settings: &BrowserSettings) -> Result<Self> {
        let adapter = Arc::new(CdpAdapter::new(settings.cdp_config()));
        Arc::clone(&adapter)
            .start()
            .await
            .context("Failed to start the browser")?;
        let page = adapter
            .create_page("about:blank")
            .await
            .context("Failed to open a browser page")?;
        info!(target: "session", page = %page, headless = settings.headless, "Browser ready");
        Ok(Self { adapter, page })
    }

    pub fn cdp(&self) -> Arc<dyn Cdp> {
        self.adapter.clone()
    }

    pub fn page(&self) -> PageId {
        self.page
    }

    pub async fn close(&self) {
        self.adapter.shutdown().await;
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

impl Credentials {
    /// `<APP>_EMAIL`/`<APP>_PASSWORD`, else `EMAIL`/`PASSWORD`.
    pub fn lookup(app: &AppProfile, env: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let get = |key: &str| env(key).filter(|v| !v.trim().is_empty());
        let prefix = app.env_prefix();
        let email = get(&format!("{prefix}_EMAIL")).or_else(|| get("EMAIL"))?;
        let password = get(&format!("{prefix}_PASSWORD")).or_else(|| get("PASSWORD"))?;
        Some(Self { email, password })
    }

    pub fn from_process_env(app: &AppProfile) -> Option<Self> {
        Self::lookup(app, |key| std::env::var(key).ok())
    }
}

/// How to get past the login page.
#[derive(Debug, Clone)]
pub struct LoginPlan {
    pub manual: bool,
    pub credentials: Option<Credentials>,
    pub waits: LoginSettings,
    pub navigation_timeout: Duration,
}

fn nth_textbox(index: usize) -> ElementQuery {
    ElementQuery::new(
        format!(
            "(() => Array.from(document.querySelectorAll({selector})).slice({index}, {end}))()",
            selector = cdp_adapter::js_string(TEXTBOX_SELECTOR),
            end = index + 1,
        ),
        format!("textbox[{index}]"),
    )
}

fn login_button() -> ElementQuery {
    SelectorResolver::new()
        .resolve(&TargetSpec::RoleName {
            role: "button".into(),
            name: "Log in".into(),
        })
        .query
}

async fn submit_credentials(
    cdp: &dyn Cdp,
    page: PageId,
    credentials: &Credentials,
    navigation_timeout: Duration,
) -> Result<(), AdapterError> {
    cdp.fill(page, &nth_textbox(0), &credentials.email, FIELD_DEADLINE)
        .await?;
    cdp.fill(page, &nth_textbox(1), &credentials.password, FIELD_DEADLINE)
        .await?;
    cdp.click(page, &login_button(), FIELD_DEADLINE).await?;
    cdp.wait_basic(page, WaitGate::network_idle(), navigation_timeout)
        .await
}

/// Best-effort login; never fails the run.
pub async fn ensure_logged_in(cdp: &dyn Cdp, page: PageId, app: &AppProfile, plan: &LoginPlan) {
    let Some(login_url) = app.login_url.as_deref() else {
        return;
    };

    if let Err(err) = cdp.navigate(page, login_url, plan.navigation_timeout).await {
        warn!(target: "session", url = login_url, error = %err, "Login page did not load");
        if !plan.manual {
            sleep(Duration::from_millis(plan.waits.fallback_wait_ms)).await;
            return;
        }
    }

    // The operator gets the full window even when the login page stalled.
    if plan.manual {
        info!(
            target: "session",
            wait_ms = plan.waits.manual_wait_ms,
            "Manual login enabled; complete login in the browser window"
        );
        sleep(Duration::from_millis(plan.waits.manual_wait_ms)).await;
        return;
    }

    match &plan.credentials {
        Some(credentials) => {
            info!(target: "session", app = %app.name, "Attempting password login");
            if let Err(err) = submit_credentials(cdp, page, credentials, plan.navigation_timeout).await {
                warn!(target: "session", error = %err, "Login helper encountered an issue");
                sleep(Duration::from_millis(plan.waits.fallback_wait_ms)).await;
            }
        }
        None => {
            info!(
                target: "session",
                wait_ms = plan.waits.credential_wait_ms,
                "Credentials not provided; waiting for manual login"
            );
            sleep(Duration::from_millis(plan.waits.credential_wait_ms)).await;
        }
    }
}
