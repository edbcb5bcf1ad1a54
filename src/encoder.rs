//! Instruction encoder (§4.3): first word plus extra words per operand.

use crate::operand::{Opcode, Operand};
use crate::words::Word;

/// One emitted cell, still possibly unresolved.
#[derive(Debug, Clone)]
pub enum EncodedWord {
    /// A fully-formed word (first word, immediate, register operand(s)).
    Final(Word),
    /// A placeholder that pass two must patch once `label` resolves.
    Unresolved { label: String },
}

/// Encode one command into its sequence of words.
///
/// `source` / `destination` are `None` when the opcode does not take that
/// operand (§4.2 arity table).
pub fn encode(opcode: Opcode, source: Option<&Operand>, destination: Option<&Operand>) -> Vec<EncodedWord> {
    let mut words = vec![EncodedWord::Final(Word::first(
        opcode.code(),
        source.map(Operand::mode),
        destination.map(Operand::mode),
    ))];

    if let (Some(Operand::Register(src)), Some(Operand::Register(dst))) = (source, destination) {
        words.push(EncodedWord::Final(Word::register_pair(*src, *dst)));
        return words;
    }

    if let Some(operand) = source {
        encode_operand(operand, true, &mut words);
    }
    if let Some(operand) = destination {
        encode_operand(operand, false, &mut words);
    }

    words
}

fn encode_operand(operand: &Operand, is_source: bool, out: &mut Vec<EncodedWord>) {
    match operand {
        Operand::Immediate(value) => out.push(EncodedWord::Final(Word::immediate(*value))),
        Operand::Direct(label) => out.push(EncodedWord::Unresolved { label: label.clone() }),
        Operand::Matrix { label, r1, r2 } => {
            out.push(EncodedWord::Unresolved { label: label.clone() });
            out.push(EncodedWord::Final(Word::matrix_indices(*r1, *r2)));
        }
        Operand::Register(reg) => out.push(EncodedWord::Final(Word::single_register(*reg, is_source))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_register_emits_one_shared_extra_word() {
        let words = encode(Opcode::Mov, Some(&Operand::Register(3)), Some(&Operand::Register(5)));
        assert_eq!(words.len(), 2);
    }

    #[test]
    fn matrix_operand_emits_two_extra_words() {
        let words = encode(
            Opcode::Mov,
            Some(&Operand::Matrix { label: "M".to_string(), r1: 2, r2: 7 }),
            Some(&Operand::Register(0)),
        );
        // first word + (placeholder + index word) + register word = 4
        assert_eq!(words.len(), 4);
    }

    #[test]
    fn single_operand_emits_first_plus_one() {
        let words = encode(Opcode::Inc, None, Some(&Operand::Direct("L".to_string())));
        assert_eq!(words.len(), 2);
    }

    #[test]
    fn no_operand_emits_one_word() {
        let words = encode(Opcode::Stop, None, None);
        assert_eq!(words.len(), 1);
    }
}
