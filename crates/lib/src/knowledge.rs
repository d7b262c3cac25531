//! Knowledge document for grounding query replies.
//!
//! The document is an injected value loaded at startup (config `knowledge.document`),
//! falling back to the bundled project document. Dispatch never hard-wires the text.

use crate::config::Config;

/// Bundled project document, seeded into the config directory by `drpbot init`.
pub static DEFAULT_DOCUMENT: &str = include_str!("../config/knowledge.md");

/// Load the knowledge document per config. Read failures fall back to the
/// bundled document so the relay always has something to ground on.
pub fn load_knowledge(config: &Config) -> String {
    match &config.knowledge.document {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                log::warn!(
                    "reading knowledge document {} failed: {}, using bundled document",
                    path.display(),
                    e
                );
                DEFAULT_DOCUMENT.to_string()
            }
        },
        None => DEFAULT_DOCUMENT.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn unset_path_uses_bundled_document() {
        let config = Config::default();
        let doc = load_knowledge(&config);
        assert!(doc.contains("Dharavi Redevelopment Project"));
    }

    #[test]
    fn configured_path_wins() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"custom document text").expect("write");
        let mut config = Config::default();
        config.knowledge.document = Some(file.path().to_path_buf());
        assert_eq!(load_knowledge(&config), "custom document text");
    }

    #[test]
    fn unreadable_path_falls_back() {
        let mut config = Config::default();
        config.knowledge.document = Some("/nonexistent/knowledge.md".into());
        let doc = load_knowledge(&config);
        assert!(doc.contains("Dharavi Redevelopment Project"));
    }
}
