use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What the page looked like after one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageState {
    pub url: String,
    pub has_modal: bool,
    pub has_overlay: bool,
    /// `dom_<hex>`; `None` only before any markup has ever been read.
    pub content_signature: Option<String>,
    pub changed: bool,
    pub significant: bool,
    pub timestamp: DateTime<Utc>,
}

impl PageState {
    pub fn surfaces(&self) -> &'static str {
        match (self.has_modal, self.has_overlay) {
            (true, true) => "modal+overlay",
            (true, false) => "modal",
            (false, true) => "overlay",
            (false, false) => "none",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_serializes_with_flat_fields() {
        let state = PageState {
            url: "https://trello.com/b/1".into(),
            has_modal: true,
            has_overlay: false,
            content_signature: Some("dom_ab".into()),
            changed: false,
            significant: true,
            timestamp: Utc::now(),
        };
        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["has_modal"], true);
        assert_eq!(value["content_signature"], "dom_ab");
        assert_eq!(state.surfaces(), "modal");
    }
}
