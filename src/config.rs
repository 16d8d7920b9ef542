use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "xdoc.json";

/// Project-level `xdoc.json` schema.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XdocConfig {
    #[serde(default = "default_out_dir")]
    pub out_dir: String,

    /// Extension of source files picked up when building a directory.
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Bibliography used by documents whose front matter names none.
    #[serde(default)]
    pub bibliography: Option<String>,

    #[serde(default)]
    pub numbering: Option<bool>,

    /// Diagram kind (`dot`, `plantuml`, ...) to the command that turns
    /// source on stdin into SVG on stdout.
    #[serde(default)]
    pub diagrams: HashMap<String, String>,

    #[serde(default = "default_diagram_dir")]
    pub diagram_dir: String,

    /// Directory the config was read from. Relative paths in the config
    /// resolve against it.
    #[serde(skip)]
    pub root: Option<PathBuf>,
}

impl Default for XdocConfig {
    fn default() -> Self {
        Self {
            out_dir: default_out_dir(),
            extension: default_extension(),
            bibliography: None,
            numbering: None,
            diagrams: HashMap::new(),
            diagram_dir: default_diagram_dir(),
            root: None,
        }
    }
}

fn default_out_dir() -> String {
    "out".to_string()
}
fn default_extension() -> String {
    "xdoc".to_string()
}
fn default_diagram_dir() -> String {
    "diagrams".to_string()
}

impl XdocConfig {
    /// Bibliography path from the config, resolved against its directory.
    pub fn bibliography_path(&self) -> Option<PathBuf> {
        let bib = self.bibliography.as_ref()?;
        Some(match &self.root {
            Some(root) => root.join(bib),
            None => PathBuf::from(bib),
        })
    }
}

/// Load `xdoc.json` from `source_dir`, falling back to the working
/// directory, or return defaults if neither has one.
pub fn load_config(source_dir: &Path) -> Result<XdocConfig> {
    let mut candidates = vec![source_dir.to_path_buf()];
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd);
    }

    for dir in candidates {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.is_file() {
            let raw = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            let mut config: XdocConfig = serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse {}", config_path.display()))?;
            log::debug!("using config {}", config_path.display());
            config.root = Some(dir);
            return Ok(config);
        }
    }

    Ok(XdocConfig::default())
}
