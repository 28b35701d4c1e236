//! Pages the adapter knows about and their per-page input state.

use std::sync::Arc;

use dashmap::DashMap;

use crate::ids::{PageId, SessionId};
use crate::network::NetworkTracker;

#[derive(Clone, Debug)]
pub struct PageContext {
    pub session_id: SessionId,
    pub target_id: Option<String>,
    pub cdp_session: Option<String>,
    pub recent_url: Option<String>,
    /// Last pointer position, the origin for wheel events.
    pub mouse: (f64, f64),
    /// Modifier mask of keys currently held down.
    pub modifiers: u32,
    pub network: Arc<NetworkTracker>,
}

/// Concurrent page registry, shared between the event loop and callers.
#[derive(Default)]
pub struct Registry {
    pages: DashMap<PageId, PageContext>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_page(
        &self,
        page: PageId,
        session: SessionId,
        target_id: Option<String>,
        cdp_session: Option<String>,
    ) {
        self.pages.insert(
            page,
            PageContext {
                session_id: session,
                target_id,
                cdp_session,
                recent_url: None,
                mouse: (0.0, 0.0),
                modifiers: 0,
                network: Arc::new(NetworkTracker::new()),
            },
        );
    }

    pub fn remove_page(&self, page: &PageId) {
        self.pages.remove(page);
    }

    pub fn get(&self, page: &PageId) -> Option<PageContext> {
        self.pages.get(page).map(|entry| entry.value().clone())
    }

    pub fn pages(&self) -> Vec<PageId> {
        self.pages.iter().map(|kv| *kv.key()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn page_for_target(&self, target_id: &str) -> Option<PageId> {
        self.pages
            .iter()
            .find(|kv| kv.target_id.as_deref() == Some(target_id))
            .map(|kv| *kv.key())
    }

    pub fn page_for_session(&self, cdp_session: &str) -> Option<PageId> {
        self.pages
            .iter()
            .find(|kv| kv.cdp_session.as_deref() == Some(cdp_session))
            .map(|kv| *kv.key())
    }

    pub fn set_recent_url(&self, page: &PageId, url: String) {
        if let Some(mut entry) = self.pages.get_mut(page) {
            entry.recent_url = Some(url);
        }
    }

    pub fn set_cdp_session(&self, page: &PageId, session: String) {
        if let Some(mut entry) = self.pages.get_mut(page) {
            entry.cdp_session = Some(session);
        }
    }

    pub fn cdp_session(&self, page: &PageId) -> Option<String> {
        self.pages
            .get(page)
            .and_then(|entry| entry.cdp_session.clone())
    }

    pub fn network(&self, page: &PageId) -> Option<Arc<NetworkTracker>> {
        self.pages.get(page).map(|entry| Arc::clone(&entry.network))
    }

    pub fn set_mouse(&self, page: &PageId, x: f64, y: f64) {
        if let Some(mut entry) = self.pages.get_mut(page) {
            entry.mouse = (x, y);
        }
    }

    pub fn mouse(&self, page: &PageId) -> (f64, f64) {
        self.pages.get(page).map(|entry| entry.mouse).unwrap_or_default()
    }

    /// Sets or clears `bit` and returns the resulting mask.
    pub fn toggle_modifier(&self, page: &PageId, bit: u32, down: bool) -> u32 {
        match self.pages.get_mut(page) {
            Some(mut entry) => {
                if down {
                    entry.modifiers |= bit;
                } else {
                    entry.modifiers &= !bit;
                }
                entry.modifiers
            }
            None => 0,
        }
    }

    pub fn modifiers(&self, page: &PageId) -> u32 {
        self.pages.get(page).map(|entry| entry.modifiers).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sessions_and_targets_map_back_to_pages() {
        let registry = Registry::new();
        let page = PageId::new();
        registry.insert_page(page, SessionId::new(), Some("T1".into()), None);
        assert_eq!(registry.page_for_target("T1"), Some(page));
        assert_eq!(registry.page_for_session("S1"), None);

        registry.set_cdp_session(&page, "S1".into());
        assert_eq!(registry.page_for_session("S1"), Some(page));
        assert_eq!(registry.cdp_session(&page).as_deref(), Some("S1"));
    }

    #[test]
    fn modifier_mask_tracks_press_and_release() {
        let registry = Registry::new();
        let page = PageId::new();
        registry.insert_page(page, SessionId::new(), None, None);
        assert_eq!(registry.toggle_modifier(&page, 2, true), 2);
        assert_eq!(registry.toggle_modifier(&page, 8, true), 10);
        assert_eq!(registry.toggle_modifier(&page, 2, false), 8);
        assert_eq!(registry.modifiers(&page), 8);
    }
}
