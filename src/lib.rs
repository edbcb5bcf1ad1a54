//! A two-pass assembler for a 10-bit-word, 16-opcode machine.
//!
//! Pipeline: macro preprocessing (`macros`) produces the `.am` intermediate
//! form, the first pass (`first_pass`) builds the symbol table and encodes
//! every instruction with unresolved label slots, the second pass
//! (`second_pass`) patches those slots and classifies each reference as
//! relocatable or external, and `emit` writes the base-4 `.ob`/`.ent`/`.ext`
//! files (`base4`).

pub mod base4;
pub mod context;
pub mod directives;
pub mod emit;
pub mod encoder;
pub mod errors;
pub mod first_pass;
pub mod logging;
pub mod macros;
pub mod operand;
pub mod reserved;
pub mod second_pass;
pub mod symbols;
pub mod words;

use std::fs;

use context::{AssembledOutput, AssemblerContext};
use errors::{ErrorKind, ErrorSink};

pub const MAX_FILE_NAME_LENGTH: usize = 30;
pub const SOURCE_EXTENSION: &str = ".as";
pub const EXPANDED_EXTENSION: &str = ".am";
pub const OBJECT_EXTENSION: &str = ".ob";
pub const ENTRIES_EXTENSION: &str = ".ent";
pub const EXTERNALS_EXTENSION: &str = ".ext";

fn single(error: ErrorKind) -> ErrorSink {
    let mut sink = ErrorSink::new();
    sink.push(error);
    sink
}

/// Assemble one named source file (no extension) end to end: read
/// `<base_name>.as`, preprocess it into `<base_name>.am`, run both passes,
/// and write `.ob`/`.ent`/`.ext`.
///
/// `<base_name>.am` is (over)written unconditionally as soon as
/// preprocessing succeeds; a preprocessor failure never reaches the write
/// (the `?` on `macros::preprocess` returns first), so no file is produced
/// in that case. Once written, the `.am` file is never removed again — a
/// later first-pass/second-pass/emit failure still leaves it on disk, since
/// only the preprocessor's own failure is defined to remove it (§4.1).
pub fn assemble_file(base_name: &str) -> Result<(), ErrorSink> {
    if base_name.len() > MAX_FILE_NAME_LENGTH {
        return Err(single(ErrorKind::FileNameTooLong { name: base_name.to_string() }));
    }

    let source_path = format!("{base_name}{SOURCE_EXTENSION}");
    let source = fs::read_to_string(&source_path)
        .map_err(|_| single(ErrorKind::OpenFailed { path: source_path }))?;

    let expanded = macros::preprocess(&source)?;

    let am_path = format!("{base_name}{EXPANDED_EXTENSION}");
    fs::write(&am_path, expanded.join("\n"))
        .map_err(|_| single(ErrorKind::OpenFailed { path: am_path.clone() }))?;

    let assembled = assemble_expanded(base_name, &expanded)?;
    write_outputs(base_name, &assembled).map_err(single)
}

/// Assemble a source string directly, skipping the `.am` file — used by
/// tests and by callers that already have expanded lines in hand.
pub fn assemble_source(name: &str, source: &str) -> Result<AssembledOutput, ErrorSink> {
    let expanded = macros::preprocess(source)?;
    assemble_expanded(name, &expanded)
}

fn assemble_expanded(name: &str, expanded: &[String]) -> Result<AssembledOutput, ErrorSink> {
    AssemblerContext::new(name).assemble(expanded)
}

fn write_outputs(base_name: &str, assembled: &AssembledOutput) -> Result<(), ErrorKind> {
    emit::write_ob(
        &format!("{base_name}{OBJECT_EXTENSION}"),
        assembled.instruction_word_count,
        assembled.data_word_count,
        &assembled.code,
        &assembled.data,
    )?;
    emit::write_ent(&format!("{base_name}{ENTRIES_EXTENSION}"), &assembled.entries())?;
    emit::write_ext(&format!("{base_name}{EXTERNALS_EXTENSION}"), assembled.external_usages())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assemble_source_runs_the_full_pipeline() {
        let out = assemble_source("demo", "MAIN: mov #5, r3\nstop\n").unwrap();
        assert_eq!(out.code.len(), 4);
    }

    #[test]
    fn file_name_over_limit_is_rejected_before_touching_disk() {
        let name = "a".repeat(MAX_FILE_NAME_LENGTH + 1);
        let err = assemble_file(&name).unwrap_err();
        assert!(err.iter().any(|e| matches!(e, ErrorKind::FileNameTooLong { .. })));
    }
}
