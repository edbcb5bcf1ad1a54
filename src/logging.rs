//! Pretty-printing messages to the console

use colored::Colorize;

use crate::errors::ErrorKind;

/// Pretty-print an error message to the console
pub fn error(error_message: impl std::fmt::Display) {
    let error_title = "error:".red().bold();
    eprintln!("{} {}", error_title, error_message);
}

/// Pretty-print a warning message to the console
pub fn warning(message: impl std::fmt::Display, line_number: usize) {
    let warning = "warning:".yellow().bold();
    eprintln!("{} line {}: {}", warning, line_number, message);
}

/// Print every accumulated error for a source file
pub fn report_errors(errors: &[ErrorKind]) {
    for err in errors {
        error(err);
    }
}

/// Print the one-line summary shown after a source file finishes processing
pub fn summary(name: &str, n_errors: usize) {
    if n_errors == 0 {
        let ok = "ok:".green().bold();
        eprintln!("{} {} assembled with no errors", ok, name);
    } else {
        let failed = "failed:".red().bold();
        eprintln!("{} {} produced {} error(s), no output written", failed, name, n_errors);
    }
}
