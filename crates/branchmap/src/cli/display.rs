//! Common display utilities for CLI commands.

use branchmap::{ProjectRecord, RecordError, Severity};
use colored::{ColoredString, Colorize};

const MAX_DISPLAY_ITEMS: usize = 25;

/// Display a list of names with optional truncation.
///
/// Shows up to `MAX_DISPLAY_ITEMS` names with bullet points. If there are
/// more, shows "... and N more". If empty, shows the provided
/// `empty_message`.
pub fn print_names<'a>(names: impl ExactSizeIterator<Item = &'a str>, empty_message: &str) {
    let total = names.len();
    if total == 0 {
        println!("    {}", empty_message.dimmed());
        return;
    }

    for name in names.take(MAX_DISPLAY_ITEMS) {
        println!("    {} {name}", "•".dimmed());
    }

    if total > MAX_DISPLAY_ITEMS {
        println!(
            "    {} ... and {} more",
            "•".dimmed(),
            total - MAX_DISPLAY_ITEMS
        );
    }
}

/// One project per line with its migration flags.
pub fn print_project_line(project: &ProjectRecord) {
    println!("  {} {}", project.name.white().bold(), project_flags(project));
}

/// Compact flag summary, e.g. `[sdk pkgref required]`.
pub fn project_flags(project: &ProjectRecord) -> String {
    let mut flags = Vec::new();
    if !project.does_exist {
        flags.push("missing".red().to_string());
    }
    if project.is_sdk {
        flags.push("sdk".green().to_string());
    }
    if project.is_package_ref {
        flags.push("pkgref".green().to_string());
    }
    if project.is_net_standard2 {
        flags.push("netstandard2".green().to_string());
    }
    if project.is_test_project {
        flags.push("test".cyan().to_string());
    }
    if project.is_required {
        flags.push("required".yellow().to_string());
    }
    if flags.is_empty() {
        String::new()
    } else {
        format!("[{}]", flags.join(" "))
    }
}

/// Severity label in its color.
pub fn severity_label(severity: Severity) -> ColoredString {
    match severity {
        Severity::Warning => "warning".yellow(),
        Severity::Error => "error".red(),
        Severity::Critical => "critical".red().bold(),
    }
}

/// Record diagnostics, indented.
pub fn print_record_errors(errors: &[RecordError]) {
    for error in errors {
        println!("    {} {}", severity_label(error.severity), error.message);
        if let Some(exception) = &error.exception {
            println!("      {}", exception.dimmed());
        }
    }
}
