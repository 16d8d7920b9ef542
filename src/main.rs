use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::Path;

mod build;
mod compile;
mod config;
mod diagrams;
mod report;

use compile::{Compiled, compile};
use config::XdocConfig;
use diagrams::CommandDiagrams;

#[derive(Parser)]
#[command(name = "xdoc", version, about = "Compiler for xdoc documents")]
struct Cli {
    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Log include resolution, numbering and diagram caching
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum RenderFormat {
    /// HTML fragment
    Html,
    /// Standalone HTML page with styles and references
    Page,
    /// Document tree as JSON
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Render an xdoc file to stdout
    Render {
        /// Path to the .xdoc file
        file: String,

        /// Output format
        #[arg(long, value_enum, default_value = "html")]
        format: RenderFormat,
    },

    /// Check xdoc file(s) for errors and unresolved references
    Check {
        /// Path to the .xdoc file(s)
        #[arg(required = true)]
        files: Vec<String>,
    },

    /// Build HTML pages from an xdoc file or a directory of them
    Build {
        /// Path to a .xdoc file or a directory
        input: String,

        /// Output directory (default: outDir from xdoc.json, else "out")
        #[arg(long)]
        out: Option<String>,

        /// Page title (default: front matter title)
        #[arg(long)]
        title: Option<String>,

        /// Rebuild whenever a source changes
        #[arg(long)]
        watch: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Render { file, format } => {
            handle_render(&file, format)?;
        }
        Commands::Check { files } => {
            handle_check(&files)?;
        }
        Commands::Build {
            input,
            out,
            title,
            watch,
        } => {
            let opts = build::BuildOpts {
                out_dir: out.as_deref(),
                title: title.as_deref(),
                quiet: cli.quiet,
            };
            if watch {
                if let Err(e) = build::handle_build(&input, &opts) {
                    report::print_error(&e);
                }
                build::watch_and_rebuild(&input, &opts)?;
            } else if build::handle_build(&input, &opts)? > 0 {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// Default `warn`; `-v` raises to `debug`, `--quiet` lowers to `error`.
/// `RUST_LOG` overrides both.
fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else if quiet {
        log::LevelFilter::Error
    } else {
        log::LevelFilter::Warn
    };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    if !verbose {
        // The library's own warnings repeat diagnostics the CLI already prints.
        builder.filter_module("xdoc_parse", log::LevelFilter::Error);
    }
    builder.parse_default_env().format_timestamp(None).init();
}

/// Compile `file` with the project config found next to it. Diagrams go to
/// the same cache a build would use.
fn compile_file(file: &str) -> Result<Compiled> {
    let path = Path::new(file);
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let config: XdocConfig = config::load_config(dir)?;
    let cache = build::out_root(None, &config).join(&config.diagram_dir);
    let diagrams = CommandDiagrams::new(config.diagrams.clone(), cache, &config.diagram_dir);
    compile(path, &config, &diagrams)
}

fn handle_render(file: &str, format: RenderFormat) -> Result<()> {
    let compiled = match compile_file(file) {
        Ok(compiled) => compiled,
        Err(e) => {
            report::print_error(&e);
            std::process::exit(1);
        }
    };

    report::print_diagnostics(file, &compiled.diagnostics);

    let output = match format {
        RenderFormat::Html => compiled.rendered.html.clone(),
        RenderFormat::Page => {
            let source_name = Path::new(file)
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| file.to_string());
            compiled.page(&source_name, None)
        }
        RenderFormat::Json => compiled.doc.to_json()?,
    };

    println!("{output}");
    Ok(())
}

fn handle_check(files: &[String]) -> Result<()> {
    let mut has_errors = false;

    for file in files {
        match compile_file(file) {
            Ok(compiled) => {
                if compiled.diagnostics.is_empty() {
                    println!("{}: {}", file, "OK".green());
                } else if report::print_diagnostics(file, &compiled.diagnostics) {
                    has_errors = true;
                }
            }
            Err(e) => {
                report::print_error(&e);
                has_errors = true;
            }
        }
    }

    if has_errors {
        std::process::exit(1);
    }

    Ok(())
}
