//! `xdoc build`: compile a document, or every document under a directory,
//! into standalone HTML pages.
//!
//! Each source `a/b.xdoc` becomes `<out>/a/b.html`, with the source copied
//! next to it for the page's alternate link. Diagrams land in
//! `<out>/<diagramDir>/` and are shared by all pages.

use anyhow::{Context, Result};
use colored::Colorize;
use notify::{EventKind, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};
use walkdir::WalkDir;

use crate::compile::compile;
use crate::config::{XdocConfig, load_config};
use crate::diagrams::CommandDiagrams;
use crate::report;

pub struct BuildOpts<'a> {
    /// Overrides the config's `outDir`.
    pub out_dir: Option<&'a str>,
    pub title: Option<&'a str>,
    pub quiet: bool,
}

/// Build `input` (a file or a directory). Returns the number of documents
/// that failed; the others are still written.
pub fn handle_build(input: &str, opts: &BuildOpts) -> Result<usize> {
    let input_path = Path::new(input);
    let is_dir = std::fs::metadata(input_path)
        .with_context(|| format!("Failed to read '{}'", input))?
        .is_dir();
    let source_dir = source_dir(input_path, is_dir);

    let config = load_config(&source_dir)?;
    let out_path = out_root(opts.out_dir, &config);
    std::fs::create_dir_all(&out_path)
        .with_context(|| format!("Failed to create '{}'", out_path.display()))?;

    let sources: Vec<(PathBuf, PathBuf)> = if is_dir {
        let out_canon = std::fs::canonicalize(&out_path)
            .with_context(|| format!("Cannot resolve path '{}'", out_path.display()))?;
        collect_sources(input_path, &config.extension, &out_canon)?
            .into_iter()
            .map(|path| {
                let rel = path.strip_prefix(input_path).unwrap_or(&path).to_path_buf();
                (path, rel)
            })
            .collect()
    } else {
        let name = input_path
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("source.xdoc"));
        vec![(input_path.to_path_buf(), name)]
    };

    if sources.is_empty() && !opts.quiet {
        println!(
            "{} no .{} files under {}",
            "warning:".yellow().bold(),
            config.extension,
            input
        );
    }

    let diagram_dir = out_path.join(&config.diagram_dir);
    let mut built = 0;
    let mut failed = 0;

    for (source, rel) in &sources {
        // Pages in subdirectories reach the shared diagram directory via `..`.
        let depth = rel.components().count().saturating_sub(1);
        let prefix = format!("{}{}", "../".repeat(depth), config.diagram_dir);
        let diagrams = CommandDiagrams::new(config.diagrams.clone(), diagram_dir.clone(), &prefix);

        match build_document(source, rel, &out_path, &config, &diagrams, opts.title) {
            Ok((dest, clean)) => {
                built += 1;
                if !clean {
                    failed += 1;
                }
                if !opts.quiet {
                    println!("  {} {} → {}", "doc".dimmed(), source.display(), dest.display());
                }
            }
            Err(e) => {
                report::print_error(&e);
                failed += 1;
            }
        }
    }

    if !opts.quiet {
        println!(
            "{} {} of {} document(s) → {}",
            "Built".green().bold(),
            built,
            sources.len(),
            out_path.display(),
        );
    }

    Ok(failed)
}

/// Compile one document and write its page. Returns the page path and
/// whether the document was free of error diagnostics.
fn build_document(
    source: &Path,
    rel: &Path,
    out_path: &Path,
    config: &XdocConfig,
    diagrams: &CommandDiagrams,
    title: Option<&str>,
) -> Result<(PathBuf, bool)> {
    let compiled = compile(source, config, diagrams)?;
    let has_errors = report::print_diagnostics(&source.display().to_string(), &compiled.diagnostics);

    let source_name = source
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "source.xdoc".to_string());
    let html = compiled.page(&source_name, title);

    let dest = out_path.join(rel).with_extension("html");
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create '{}'", parent.display()))?;
    }
    std::fs::write(&dest, &html).with_context(|| format!("Failed to write '{}'", dest.display()))?;

    let source_dest = dest.with_file_name(&source_name);
    std::fs::copy(source, &source_dest)
        .with_context(|| format!("Failed to copy source to '{}'", source_dest.display()))?;

    Ok((dest, !has_errors))
}

fn source_dir(input_path: &Path, is_dir: bool) -> PathBuf {
    if is_dir {
        return input_path.to_path_buf();
    }
    match input_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// `--out` as given, else the config's `outDir` relative to the config.
pub fn out_root(out_dir: Option<&str>, config: &XdocConfig) -> PathBuf {
    match (out_dir, &config.root) {
        (Some(dir), _) => PathBuf::from(dir),
        (None, Some(root)) => root.join(&config.out_dir),
        (None, None) => PathBuf::from(&config.out_dir),
    }
}

/// Every `*.<extension>` file under `dir`, sorted, skipping the output
/// directory.
fn collect_sources(dir: &Path, extension: &str, out_canon: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    let walker = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_same_dir(entry.path(), out_canon));
    for entry in walker {
        let entry = entry?;
        let matches = entry
            .path()
            .extension()
            .is_some_and(|ext| ext.to_string_lossy() == extension);
        if entry.file_type().is_file() && matches {
            files.push(entry.path().to_path_buf());
        }
    }

    Ok(files)
}

fn is_same_dir(path: &Path, canon: &Path) -> bool {
    std::fs::canonicalize(path).is_ok_and(|p| p == canon)
}

/// Watch the source for changes and rebuild on each save.
///
/// Debounces rapid events (e.g. editors that write in stages) with a 200ms window.
/// Events inside the output directory are ignored. Ctrl+C exits cleanly.
pub fn watch_and_rebuild(input: &str, opts: &BuildOpts) -> Result<()> {
    let input_path = std::fs::canonicalize(input)
        .map_err(|e| anyhow::anyhow!("Cannot resolve path '{}': {}", input, e))?;
    let watch_dir = source_dir(&input_path, input_path.is_dir());

    let config = load_config(&watch_dir)?;
    let out_path = out_root(opts.out_dir, &config);
    std::fs::create_dir_all(&out_path)
        .with_context(|| format!("Failed to create '{}'", out_path.display()))?;
    let out_canon = std::fs::canonicalize(&out_path)
        .with_context(|| format!("Cannot resolve path '{}'", out_path.display()))?;

    println!(
        "{} {} for changes (Ctrl+C to stop)",
        "Watching".cyan().bold(),
        input
    );

    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        if let Ok(event) = res {
            let _ = tx.send(event);
        }
    })?;

    // Recursive so that included files in subdirectories trigger a rebuild.
    watcher.watch(&watch_dir, RecursiveMode::Recursive)?;

    let mut last_rebuild = Instant::now();
    let debounce = Duration::from_millis(200);

    loop {
        match rx.recv_timeout(Duration::from_secs(1)) {
            Ok(event) => {
                let is_write = matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_));
                let affects_sources = event.paths.iter().any(|p| !p.starts_with(&out_canon));

                if is_write && affects_sources && last_rebuild.elapsed() > debounce {
                    // Small delay to let the editor finish writing
                    std::thread::sleep(Duration::from_millis(50));
                    log::debug!("rebuilding after change to {:?}", event.paths);

                    match handle_build(input, opts) {
                        Ok(failed) => {
                            if failed > 0 {
                                eprintln!("{} {} document(s) failed", "Build error:".red().bold(), failed);
                            }
                            last_rebuild = Instant::now();
                        }
                        Err(e) => {
                            eprintln!("{} {:#}", "Build error:".red().bold(), e);
                        }
                    }
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                // Keep looping
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn test_out_root_precedence() {
        let mut config = XdocConfig::default();
        assert_eq!(out_root(None, &config), PathBuf::from("out"));
        config.root = Some(PathBuf::from("/proj"));
        assert_eq!(out_root(None, &config), PathBuf::from("/proj/out"));
        assert_eq!(out_root(Some("site"), &config), PathBuf::from("site"));
    }

    #[test]
    fn test_source_dir_of_bare_file_is_cwd() {
        assert_eq!(source_dir(Path::new("doc.xdoc"), false), PathBuf::from("."));
        assert_eq!(source_dir(Path::new("a/doc.xdoc"), false), PathBuf::from("a"));
        assert_eq!(source_dir(Path::new("a"), true), PathBuf::from("a"));
    }

    #[test]
    fn test_collect_sources_skips_output_dir() {
        let dir = std::env::temp_dir().join("xdoc-test-collect");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(dir.join("sub")).unwrap();
        fs::create_dir_all(dir.join("out")).unwrap();
        fs::write(dir.join("b.xdoc"), "x").unwrap();
        fs::write(dir.join("a.xdoc"), "x").unwrap();
        fs::write(dir.join("sub/c.xdoc"), "x").unwrap();
        fs::write(dir.join("out/a.xdoc"), "x").unwrap();
        fs::write(dir.join("notes.txt"), "x").unwrap();

        let out_canon = fs::canonicalize(dir.join("out")).unwrap();
        let found: Vec<PathBuf> = collect_sources(&dir, "xdoc", &out_canon)
            .unwrap()
            .into_iter()
            .map(|p| p.strip_prefix(&dir).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            found,
            vec![
                PathBuf::from("a.xdoc"),
                PathBuf::from("b.xdoc"),
                PathBuf::from("sub/c.xdoc"),
            ]
        );

        let _ = fs::remove_dir_all(&dir);
    }
}
