//! Initialize the configuration directory: create ~/.drpbot, a default config,
//! and a local copy of the knowledge document.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::knowledge;

/// Create the config directory and default files if they do not exist.
/// - Creates the config directory (parent of config file path).
/// - Writes `config.json` with `{}` if missing.
/// - Seeds `knowledge.md` from the bundled document if missing. Point
///   `knowledge.document` at it in config.json to customize the text.
pub fn init_config_dir(config_path: &Path) -> Result<PathBuf> {
    let config_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(config_dir)
        .with_context(|| format!("creating config directory {}", config_dir.display()))?;

    if !config_path.exists() {
        let default_config = b"{}";
        std::fs::write(config_path, default_config)
            .with_context(|| format!("writing default config to {}", config_path.display()))?;
        log::info!("created default config at {}", config_path.display());
    }

    let knowledge_path = config_dir.join("knowledge.md");
    if !knowledge_path.exists() {
        std::fs::write(&knowledge_path, knowledge::DEFAULT_DOCUMENT).with_context(|| {
            format!(
                "writing default knowledge document to {}",
                knowledge_path.display()
            )
        })?;
        log::info!(
            "wrote default knowledge document to {}",
            knowledge_path.display()
        );
    }

    Ok(config_dir.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_config_and_knowledge() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config_path = dir.path().join("nested").join("config.json");
        let created = init_config_dir(&config_path).expect("init");
        assert_eq!(created, dir.path().join("nested"));
        assert_eq!(
            std::fs::read_to_string(&config_path).expect("read config"),
            "{}"
        );
        let doc =
            std::fs::read_to_string(created.join("knowledge.md")).expect("read knowledge");
        assert!(doc.contains("Dharavi Redevelopment Project"));
    }

    #[test]
    fn existing_config_is_not_overwritten() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config_path = dir.path().join("config.json");
        std::fs::write(&config_path, r#"{"server":{"port":9000}}"#).expect("write");
        init_config_dir(&config_path).expect("init");
        let s = std::fs::read_to_string(&config_path).expect("read");
        assert!(s.contains("9000"));
    }
}
