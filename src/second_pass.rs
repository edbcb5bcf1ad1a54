//! Second-pass resolver (§4.7): patch every unresolved label reference left
//! by the first pass, classify it as relocatable or external, and record
//! the `.ent`/`.ext` bookkeeping the emitter needs.

use crate::errors::{ErrorKind, ErrorSink};
use crate::first_pass::CodeCell;
use crate::symbols::SymbolTable;
use crate::words::{Are, Word};

pub struct SecondPassOutput {
    /// Final code words, in address order, ready for `.ob` emission.
    pub words: Vec<Word>,
}

/// Resolve every `CodeCell` left with a pending `referenced_label` and
/// surface the entries first pass could not match to a definition.
pub fn second_pass(
    code_cells: &[CodeCell],
    symbols: &mut SymbolTable,
    undefined_entries: &[String],
) -> Result<SecondPassOutput, ErrorSink> {
    let mut sink = ErrorSink::new();
    let mut words = Vec::with_capacity(code_cells.len());

    for cell in code_cells {
        let resolved = match &cell.referenced_label {
            None => cell.word,
            Some(label) => {
                if symbols.is_extern(label) {
                    symbols.add_external_usage(label, cell.address);
                    Word::resolved(0, Are::External)
                } else if let Some(symbol) = symbols.find(label) {
                    Word::resolved(symbol.address, Are::Relocatable)
                } else {
                    sink.push(ErrorKind::UnresolvedReference {
                        name: label.clone(),
                        address: cell.address,
                    });
                    cell.word
                }
            }
        };
        words.push(resolved);
    }

    for name in undefined_entries {
        sink.push(ErrorKind::EntryUndefined { name: name.clone() });
    }

    if sink.has_errors() {
        Err(sink)
    } else {
        Ok(SecondPassOutput { words })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::SymbolKind;

    fn cell(address: u16, word: Word, label: Option<&str>) -> CodeCell {
        CodeCell { address, word, referenced_label: label.map(str::to_string) }
    }

    #[test]
    fn resolves_internal_label_as_relocatable() {
        let mut symbols = SymbolTable::new();
        symbols.insert_definition("L1", SymbolKind::Code, 105, 1).unwrap();
        let cells = vec![cell(101, Word::zero(), Some("L1"))];
        let out = second_pass(&cells, &mut symbols, &[]).unwrap();
        assert_eq!(out.words[0].bits() >> 2, 105);
        assert_eq!(out.words[0].are(), Are::Relocatable.bits());
    }

    #[test]
    fn resolves_external_label_and_records_usage() {
        let mut symbols = SymbolTable::new();
        symbols.insert_external("EXT", 1).unwrap();
        let cells = vec![cell(101, Word::zero(), Some("EXT"))];
        let out = second_pass(&cells, &mut symbols, &[]).unwrap();
        assert_eq!(out.words[0].are(), Are::External.bits());
        assert_eq!(symbols.external_usages().len(), 1);
        assert_eq!(symbols.external_usages()[0].address, 101);
    }

    #[test]
    fn unresolved_label_is_an_error() {
        let mut symbols = SymbolTable::new();
        let cells = vec![cell(101, Word::zero(), Some("GHOST"))];
        let err = second_pass(&cells, &mut symbols, &[]).unwrap_err();
        assert!(err.iter().any(|e| matches!(e, ErrorKind::UnresolvedReference { .. })));
    }

    #[test]
    fn undefined_entry_is_reported() {
        let mut symbols = SymbolTable::new();
        let err = second_pass(&[], &mut symbols, &["MISSING".to_string()]).unwrap_err();
        assert!(err.iter().any(|e| matches!(e, ErrorKind::EntryUndefined { .. })));
    }

    #[test]
    fn already_final_cells_pass_through_untouched() {
        let mut symbols = SymbolTable::new();
        let word = Word::immediate(5);
        let cells = vec![cell(101, word, None)];
        let out = second_pass(&cells, &mut symbols, &[]).unwrap();
        assert_eq!(out.words[0], word);
    }
}
