//! The symbol table: labels, their addresses, and the external-usage list.

use std::collections::HashMap;

use crate::errors::ErrorKind;
use crate::reserved::is_reserved_word;

pub const MAX_LABEL_LENGTH: usize = 30;

/// Validate a label's syntax (§3: "Names are <=30 characters, begin with a
/// letter, alphanumeric thereafter, not a reserved word").
pub fn validate_label_name(name: &str, line_number: usize) -> Result<(), ErrorKind> {
    if name.len() > MAX_LABEL_LENGTH {
        return Err(ErrorKind::LabelTooLong { name: name.to_string(), line: line_number });
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        Some(_) => {
            return Err(ErrorKind::LabelStartsWithNonLetter {
                name: name.to_string(),
                line: line_number,
            })
        }
        None => {
            return Err(ErrorKind::LabelStartsWithNonLetter {
                name: name.to_string(),
                line: line_number,
            })
        }
    }
    if !chars.clone().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ErrorKind::LabelNotAlphanumeric { name: name.to_string(), line: line_number });
    }
    if is_reserved_word(name) {
        return Err(ErrorKind::LabelIsReservedWord { name: name.to_string(), line: line_number });
    }
    Ok(())
}

/// The kind of an internal symbol definition. `ENTRY` is not a kind of its
/// own: it is a flag layered on top of a `Code`/`Data` definition (§4.5 —
/// "ENTRY is permitted to coexist with exactly one matching CODE or DATA
/// definition").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Code,
    Data,
    External,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub address: u16,
    pub kind: SymbolKind,
    pub is_entry: bool,
}

struct EntryRequest {
    name: String,
    line_number: usize,
}

#[derive(Debug, Clone)]
pub struct ExternalUsage {
    pub name: String,
    pub address: u16,
}

#[derive(Default)]
pub struct SymbolTable {
    symbols: HashMap<String, Symbol>,
    entry_requests: Vec<EntryRequest>,
    external_usages: Vec<ExternalUsage>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a CODE or DATA definition discovered while scanning a line.
    pub fn insert_definition(
        &mut self,
        name: &str,
        kind: SymbolKind,
        address: u16,
        line_number: usize,
    ) -> Result<(), ErrorKind> {
        if let Some(existing) = self.symbols.get(name) {
            if existing.kind == SymbolKind::External || kind == SymbolKind::External {
                return Err(ErrorKind::ExternInternalConflict {
                    name: name.to_string(),
                    line: line_number,
                });
            }
            return Err(ErrorKind::LabelAlreadyDefined {
                name: name.to_string(),
                line: line_number,
            });
        }
        self.symbols.insert(
            name.to_string(),
            Symbol { name: name.to_string(), address, kind, is_entry: false },
        );
        Ok(())
    }

    /// Register an `.extern` declaration.
    pub fn insert_external(&mut self, name: &str, line_number: usize) -> Result<(), ErrorKind> {
        if let Some(existing) = self.symbols.get(name) {
            if existing.kind == SymbolKind::External {
                return Err(ErrorKind::ExternalAlreadyDeclared {
                    name: name.to_string(),
                    line: line_number,
                });
            }
            return Err(ErrorKind::ExternInternalConflict {
                name: name.to_string(),
                line: line_number,
            });
        }
        self.symbols.insert(
            name.to_string(),
            Symbol {
                name: name.to_string(),
                address: 0,
                kind: SymbolKind::External,
                is_entry: false,
            },
        );
        Ok(())
    }

    /// Register an `.entry` declaration; resolved against a definition at
    /// end of first pass by `reconcile_entries`.
    pub fn request_entry(&mut self, name: &str, line_number: usize) {
        self.entry_requests.push(EntryRequest { name: name.to_string(), line_number });
    }

    pub fn find(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn is_extern(&self, name: &str) -> bool {
        matches!(self.symbols.get(name), Some(s) if s.kind == SymbolKind::External)
    }

    pub fn add_external_usage(&mut self, name: &str, address: u16) {
        self.external_usages.push(ExternalUsage { name: name.to_string(), address });
    }

    pub fn external_usages(&self) -> &[ExternalUsage] {
        &self.external_usages
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }

    pub fn entries(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values().filter(|s| s.is_entry)
    }

    /// Shift every DATA symbol's address by the final instruction counter
    /// (GLOSSARY: "reconciliation").
    pub fn fold_data_addresses(&mut self, final_instruction_counter: u16) {
        for symbol in self.symbols.values_mut() {
            if symbol.kind == SymbolKind::Data {
                symbol.address += final_instruction_counter;
            }
        }
    }

    /// Match every `.entry` request against its definition. Returns the
    /// names that had no matching internal definition (reported as errors
    /// in pass two per §4.6/§4.7) and any entry/extern conflicts found along
    /// the way.
    pub fn reconcile_entries(&mut self) -> (Vec<String>, Vec<ErrorKind>) {
        let mut undefined = Vec::new();
        let mut conflicts = Vec::new();
        for request in &self.entry_requests {
            match self.symbols.get_mut(&request.name) {
                Some(symbol) if symbol.kind == SymbolKind::External => {
                    conflicts.push(ErrorKind::EntryExternConflict {
                        name: request.name.clone(),
                        line: request.line_number,
                    });
                }
                Some(symbol) => {
                    symbol.is_entry = true;
                }
                None => {
                    undefined.push(request.name.clone());
                }
            }
        }
        (undefined, conflicts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_insert_is_an_error() {
        let mut table = SymbolTable::new();
        table.insert_definition("L1", SymbolKind::Code, 100, 1).unwrap();
        let err = table.insert_definition("L1", SymbolKind::Data, 103, 2);
        assert!(matches!(err, Err(ErrorKind::LabelAlreadyDefined { .. })));
    }

    #[test]
    fn extern_and_internal_conflict() {
        let mut table = SymbolTable::new();
        table.insert_external("EXT", 1).unwrap();
        let err = table.insert_definition("EXT", SymbolKind::Code, 100, 2);
        assert!(matches!(err, Err(ErrorKind::ExternInternalConflict { .. })));
    }

    #[test]
    fn entry_reconciles_against_existing_definition() {
        let mut table = SymbolTable::new();
        table.insert_definition("MYENT", SymbolKind::Code, 100, 3).unwrap();
        table.request_entry("MYENT", 2);
        let (undefined, conflicts) = table.reconcile_entries();
        assert!(undefined.is_empty());
        assert!(conflicts.is_empty());
        assert!(table.find("MYENT").unwrap().is_entry);
    }

    #[test]
    fn entry_without_definition_is_reported() {
        let mut table = SymbolTable::new();
        table.request_entry("MISSING", 4);
        let (undefined, _) = table.reconcile_entries();
        assert_eq!(undefined, vec!["MISSING".to_string()]);
    }

    #[test]
    fn data_addresses_fold_by_final_ic() {
        let mut table = SymbolTable::new();
        table.insert_definition("L1", SymbolKind::Data, 1, 1).unwrap();
        table.fold_data_addresses(103);
        assert_eq!(table.find("L1").unwrap().address, 104);
    }
}
