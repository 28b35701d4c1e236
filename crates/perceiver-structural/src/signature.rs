/// Deterministic fingerprint of page markup.
pub fn content_signature(markup: &str) -> String {
    format!("dom_{}", blake3::hash(markup.as_bytes()).to_hex())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_pure() {
        let html = "<html><body><h1>Board</h1></body></html>";
        assert_eq!(content_signature(html), content_signature(html));
        assert_ne!(content_signature(html), content_signature("<html></html>"));
    }

    #[test]
    fn signature_is_prefixed_hex() {
        let sig = content_signature("");
        assert!(sig.starts_with("dom_"));
        assert_eq!(sig.len(), 4 + 64);
        assert!(sig[4..].chars().all(|c| c.is_ascii_hexdigit()));
    }
}
