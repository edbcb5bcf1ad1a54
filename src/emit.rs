//! Output file writers (§4.8): `.ob`, `.ent`, `.ext`.
//!
//! `.ob` always gets written when assembly succeeds. `.ent`/`.ext` are only
//! written when there is something to put in them; a stale copy from a
//! previous run over the same base name is removed instead.

use std::fs;

use crate::base4;
use crate::errors::ErrorKind;
use crate::symbols::{ExternalUsage, Symbol};
use crate::words::Word;

fn remove_if_exists(path: &str) -> Result<(), ErrorKind> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(_) => Err(ErrorKind::RemoveFailed { path: path.to_string() }),
    }
}

/// Write the `.ob` file: header line (instruction word count, data word
/// count), then one `<address>\t<word>` line per code cell, then one per
/// data cell.
pub fn write_ob(
    path: &str,
    instruction_word_count: u16,
    data_word_count: u16,
    code: &[(u16, Word)],
    data: &[(u16, Word)],
) -> Result<(), ErrorKind> {
    let mut out = String::new();
    out.push_str(&format!(
        "\t{}\t{}\n",
        base4::encode_counter(instruction_word_count),
        base4::encode_counter(data_word_count)
    ));
    for (address, word) in code.iter().chain(data.iter()) {
        out.push_str(&format!(
            "{}\t{}\n",
            base4::encode_address(*address),
            base4::encode_word(word.bits())
        ));
    }
    fs::write(path, out).map_err(|_| ErrorKind::OpenFailed { path: path.to_string() })
}

/// Write the `.ent` file: one `<name>\t<address>` line per entry symbol, or
/// remove a stale one if there are none.
pub fn write_ent(path: &str, entries: &[&Symbol]) -> Result<(), ErrorKind> {
    if entries.is_empty() {
        return remove_if_exists(path);
    }
    let mut out = String::new();
    for symbol in entries {
        out.push_str(&format!("{}\t{}\n", symbol.name, base4::encode_address(symbol.address)));
    }
    fs::write(path, out).map_err(|_| ErrorKind::OpenFailed { path: path.to_string() })
}

/// Write the `.ext` file: one `<name>\t<address>` line per external usage,
/// or remove a stale one if there are none.
pub fn write_ext(path: &str, usages: &[ExternalUsage]) -> Result<(), ErrorKind> {
    if usages.is_empty() {
        return remove_if_exists(path);
    }
    let mut out = String::new();
    for usage in usages {
        out.push_str(&format!("{}\t{}\n", usage.name, base4::encode_address(usage.address)));
    }
    fs::write(path, out).map_err(|_| ErrorKind::OpenFailed { path: path.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::SymbolKind;

    fn temp_path(name: &str) -> String {
        format!("{}/crate_emit_test_{}_{}", std::env::temp_dir().display(), std::process::id(), name)
    }

    #[test]
    fn ob_header_then_code_then_data_lines() {
        let path = temp_path("ob");
        let code = vec![(100u16, Word::first(0, None, None))];
        let data = vec![(103u16, Word::new(7))];
        write_ob(&path, 3, 1, &code, &data).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with('\t'));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn ent_file_removed_when_no_entries() {
        let path = temp_path("ent_empty");
        fs::write(&path, "stale").unwrap();
        write_ent(&path, &[]).unwrap();
        assert!(!std::path::Path::new(&path).exists());
    }

    #[test]
    fn ent_file_lists_entry_symbols() {
        let path = temp_path("ent");
        let symbol = Symbol { name: "MYENT".to_string(), address: 100, kind: SymbolKind::Code, is_entry: true };
        write_ent(&path, &[&symbol]).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("MYENT"));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn ext_file_lists_usages() {
        let path = temp_path("ext");
        let usages = vec![ExternalUsage { name: "EXT".to_string(), address: 101 }];
        write_ext(&path, &usages).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("EXT"));
        fs::remove_file(&path).unwrap();
    }
}
