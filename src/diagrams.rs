//! Diagram rendering through external commands, cached by content hash.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use xdoc_parse::{DiagramImage, DiagramRenderer};

/// Runs the command configured for a diagram kind with the source on stdin
/// and stores the SVG it prints under `cache_dir`.
pub struct CommandDiagrams {
    commands: HashMap<String, String>,
    cache_dir: PathBuf,
    /// Prefix for the `src` of generated images, relative to the page.
    url_prefix: String,
}

impl CommandDiagrams {
    pub fn new(commands: HashMap<String, String>, cache_dir: PathBuf, url_prefix: &str) -> Self {
        Self {
            commands,
            cache_dir,
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        }
    }

    fn run(&self, command_line: &str, source: &str) -> Result<Vec<u8>, String> {
        let mut parts = command_line.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| "empty diagram command".to_string())?;

        let mut child = Command::new(program)
            .args(parts)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| format!("failed to run '{program}': {e}"))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(source.as_bytes())
                .map_err(|e| format!("failed to write to '{program}': {e}"))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| format!("failed to run '{program}': {e}"))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!("'{program}' failed ({}): {}", output.status, stderr.trim()));
        }
        Ok(output.stdout)
    }
}

impl DiagramRenderer for CommandDiagrams {
    fn render_diagram(&self, kind: &str, source: &str) -> Result<DiagramImage, String> {
        let command_line = self
            .commands
            .get(kind)
            .ok_or_else(|| format!("no command configured for '{kind}' diagrams"))?;

        let hash = diagram_hash(kind, source);
        let file_name = format!("{hash}.svg");
        let path = self.cache_dir.join(&file_name);

        if path.is_file() {
            log::debug!("diagram cache hit {}", path.display());
        } else {
            let svg = self.run(command_line, source)?;
            std::fs::create_dir_all(&self.cache_dir)
                .map_err(|e| format!("failed to create '{}': {e}", self.cache_dir.display()))?;
            std::fs::write(&path, svg)
                .map_err(|e| format!("failed to write '{}': {e}", path.display()))?;
            log::debug!("rendered {kind} diagram to {}", path.display());
        }

        Ok(DiagramImage {
            src: format!("{}/{file_name}", self.url_prefix),
            alt: String::new(),
        })
    }
}

/// SHA-256 over the kind and source, hex encoded.
fn diagram_hash(kind: &str, source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(kind.as_bytes());
    hasher.update(b"\0");
    hasher.update(source.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("xdoc-test-diagrams").join(name);
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_hash_depends_on_kind_and_source() {
        let h1 = diagram_hash("dot", "a -> b");
        assert_eq!(h1.len(), 64);
        assert_eq!(h1, diagram_hash("dot", "a -> b"));
        assert_ne!(h1, diagram_hash("plantuml", "a -> b"));
        assert_ne!(h1, diagram_hash("dot", "a -> c"));
    }

    #[test]
    fn test_unconfigured_kind_fails() {
        let diagrams = CommandDiagrams::new(HashMap::new(), temp_dir("none"), "diagrams");
        let err = diagrams.render_diagram("dot", "a").unwrap_err();
        assert!(err.contains("'dot'"));
    }

    #[test]
    fn test_cached_file_is_reused() {
        let dir = temp_dir("cached");
        fs::create_dir_all(&dir).unwrap();
        let hash = diagram_hash("dot", "a -> b");
        fs::write(dir.join(format!("{hash}.svg")), "<svg/>").unwrap();

        let commands = HashMap::from([("dot".to_string(), "no-such-program-xdoc".to_string())]);
        let diagrams = CommandDiagrams::new(commands, dir.clone(), "diagrams/");
        let image = diagrams.render_diagram("dot", "a -> b").unwrap();
        assert_eq!(image.src, format!("diagrams/{hash}.svg"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_program_fails() {
        let commands = HashMap::from([("dot".to_string(), "no-such-program-xdoc".to_string())]);
        let diagrams = CommandDiagrams::new(commands, temp_dir("missing"), "diagrams");
        let err = diagrams.render_diagram("dot", "a -> b").unwrap_err();
        assert!(err.contains("no-such-program-xdoc"));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_output_is_written() {
        let dir = temp_dir("cat");
        let commands = HashMap::from([("svg".to_string(), "cat".to_string())]);
        let diagrams = CommandDiagrams::new(commands, dir.clone(), "d");
        let image = diagrams.render_diagram("svg", "<svg>x</svg>").unwrap();

        let file = image.src.trim_start_matches("d/");
        assert_eq!(fs::read_to_string(dir.join(file)).unwrap(), "<svg>x</svg>");

        let _ = fs::remove_dir_all(&dir);
    }
}
