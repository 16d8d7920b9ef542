//! Terminal output for errors and diagnostics.

use colored::Colorize;
use xdoc_parse::{Diagnostic, ParseError, Severity};

/// Print a failed compile. Structural errors get `file:line:col: error:`.
pub fn print_error(err: &anyhow::Error) {
    match err.downcast_ref::<ParseError>() {
        Some(parse_err) => eprintln!(
            "{}: {}: {}",
            parse_err.location(),
            "error".red().bold(),
            parse_err.message()
        ),
        None => eprintln!("{}: {:#}", "error".red().bold(), err),
    }
}

/// Print each diagnostic as `file:line: severity: [code] message`.
/// Returns true when any of them is an error.
pub fn print_diagnostics(file: &str, diagnostics: &[Diagnostic]) -> bool {
    let mut has_errors = false;

    for diag in diagnostics {
        let severity_str = match diag.severity {
            Severity::Error => {
                has_errors = true;
                format!("{}", "error".red().bold())
            }
            Severity::Warning => format!("{}", "warning".yellow().bold()),
            Severity::Info => format!("{}", "info".cyan().bold()),
        };

        let line_info = match &diag.location {
            Some(loc) => format!("{}:{}", loc.file, loc.line),
            None => file.to_string(),
        };

        let code_str = match &diag.code {
            Some(c) => format!("[{}] ", c),
            None => String::new(),
        };

        eprintln!("{line_info}: {severity_str}: {code_str}{}", diag.message);
    }

    has_errors
}
