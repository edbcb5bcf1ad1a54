//! Per-source assembly context (§5, §9 "no global mutable state"): every
//! pipeline stage threads its state through explicit structs instead of
//! statics, so two files assembled in the same process never see each
//! other's symbol tables or counters.

use crate::errors::ErrorSink;
use crate::first_pass::{self, INITIAL_INSTRUCTION_COUNTER};
use crate::second_pass;
use crate::symbols::{ExternalUsage, Symbol, SymbolTable};
use crate::words::Word;

/// Everything the emitter needs, already in address order.
pub struct AssembledOutput {
    pub instruction_word_count: u16,
    pub data_word_count: u16,
    pub code: Vec<(u16, Word)>,
    pub data: Vec<(u16, Word)>,
    pub symbols: SymbolTable,
}

impl AssembledOutput {
    pub fn entries(&self) -> Vec<&Symbol> {
        self.symbols.entries().collect()
    }

    pub fn external_usages(&self) -> &[ExternalUsage] {
        self.symbols.external_usages()
    }
}

/// Drives preprocessing and both passes for a single source file.
pub struct AssemblerContext {
    name: String,
}

impl AssemblerContext {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run both passes over already macro-expanded lines (the `.am` content).
    ///
    /// First pass never aborts on its own errors (it always returns its
    /// partial output alongside whatever it accumulated), so second pass
    /// still runs over that output and gets a chance to report its own
    /// errors — e.g. an undefined label reference, detected only here. Both
    /// sinks are merged before either is surfaced, so one run of a source
    /// with errors in both passes reports all of them together (§8 S4).
    pub fn assemble(&self, expanded_lines: &[String]) -> Result<AssembledOutput, ErrorSink> {
        let (first, mut sink) = first_pass::first_pass(expanded_lines);
        let mut symbols = first.symbols;

        let second = match second_pass::second_pass(&first.code_cells, &mut symbols, &first.undefined_entries) {
            Ok(second) => second,
            Err(second_sink) => {
                sink.extend(second_sink);
                return Err(sink);
            }
        };

        if sink.has_errors() {
            return Err(sink);
        }

        let code = first
            .code_cells
            .iter()
            .zip(second.words)
            .map(|(cell, word)| (cell.address, word))
            .collect();
        let data = first
            .data_cells
            .iter()
            .map(|cell| (cell.offset + first.instruction_counter, cell.word))
            .collect();

        Ok(AssembledOutput {
            instruction_word_count: first.instruction_counter - INITIAL_INSTRUCTION_COUNTER,
            data_word_count: first.data_counter,
            code,
            data,
            symbols,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(src: &str) -> Vec<String> {
        src.lines().map(str::to_string).collect()
    }

    #[test]
    fn assembles_a_minimal_source() {
        let ctx = AssemblerContext::new("demo");
        let out = ctx.assemble(&lines("MAIN: mov #5, r3\nstop\n")).unwrap();
        assert_eq!(out.instruction_word_count, 4);
        assert_eq!(out.data_word_count, 0);
        assert_eq!(out.code.len(), 4);
    }

    #[test]
    fn surfaces_errors_from_any_stage() {
        let ctx = AssemblerContext::new("demo");
        let err = ctx.assemble(&lines("mov UNDEF, r0\nstop\n")).unwrap_err();
        assert!(!err.is_empty());
    }

    #[test]
    fn s4_first_and_second_pass_errors_accumulate_together() {
        // §8 S4: two double-comma lines (first pass) plus one undefined
        // label reference (second pass) — three errors from one run.
        let ctx = AssemblerContext::new("demo");
        let src = "mov #5,, r3\nadd r1 r2,\nmov UNDEF, r0\nstop\n";
        let err = ctx.assemble(&lines(src)).unwrap_err();
        assert_eq!(err.len(), 3);
    }
}
