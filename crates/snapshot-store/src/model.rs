use serde::{Deserialize, Serialize};

/// Cheap page identity: current url and markup length.
///
/// Either half may be unknown when the read failed; an incomplete
/// fingerprint never matches memory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub url: Option<String>,
    pub content_length: Option<usize>,
}

impl Fingerprint {
    pub fn is_complete(&self) -> bool {
        self.url.is_some() && self.content_length.is_some()
    }
}

/// The fingerprint of the last successful capture.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureMemory {
    pub last_url: Option<String>,
    pub last_content_length: Option<usize>,
}

impl CaptureMemory {
    pub fn matches(&self, fingerprint: &Fingerprint) -> bool {
        fingerprint.is_complete()
            && fingerprint.url == self.last_url
            && fingerprint.content_length == self.last_content_length
    }

    pub fn remember(&mut self, fingerprint: Fingerprint) {
        self.last_url = fingerprint.url;
        self.last_content_length = fingerprint.content_length;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known(url: &str, len: usize) -> Fingerprint {
        Fingerprint {
            url: Some(url.into()),
            content_length: Some(len),
        }
    }

    #[test]
    fn empty_memory_matches_nothing() {
        assert!(!CaptureMemory::default().matches(&known("about:blank", 0)));
        assert!(!CaptureMemory::default().matches(&Fingerprint::default()));
    }

    #[test]
    fn unknown_halves_never_match() {
        let mut memory = CaptureMemory::default();
        memory.remember(Fingerprint {
            url: None,
            content_length: Some(10),
        });
        assert!(!memory.matches(&Fingerprint {
            url: None,
            content_length: Some(10),
        }));
    }

    #[test]
    fn remembered_fingerprint_matches() {
        let mut memory = CaptureMemory::default();
        memory.remember(known("https://trello.com", 512));
        assert!(memory.matches(&known("https://trello.com", 512)));
        assert!(!memory.matches(&known("https://trello.com", 513)));
    }
}
