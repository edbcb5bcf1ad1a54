//! Operand classification and validation (§4.2), and the fixed opcode
//! table.

use regex::Regex;

use crate::errors::ErrorKind;
use crate::reserved::is_register;
use crate::symbols::validate_label_name;
use crate::words::AddressingMode;

/// A classified, parsed operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Immediate(i16),
    Direct(String),
    Matrix { label: String, r1: u8, r2: u8 },
    Register(u8),
}

impl Operand {
    pub fn mode(&self) -> AddressingMode {
        match self {
            Operand::Immediate(_) => AddressingMode::Immediate,
            Operand::Direct(_) => AddressingMode::Direct,
            Operand::Matrix { .. } => AddressingMode::Matrix,
            Operand::Register(_) => AddressingMode::Register,
        }
    }
}

/// Split a comma-separated operand/argument list, rejecting leading,
/// trailing, and doubled commas (§4.6).
pub fn split_comma_list(rest: &str, line_number: usize) -> Result<Vec<String>, ErrorKind> {
    let trimmed = rest.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let parts: Vec<&str> = trimmed.split(',').map(str::trim).collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(ErrorKind::DoubleComma { line: line_number });
    }
    Ok(parts.into_iter().map(str::to_string).collect())
}

fn parse_register_token(token: &str) -> Option<u8> {
    is_register(token).then(|| token.as_bytes()[1] - b'0')
}

fn matrix_pattern() -> Regex {
    Regex::new(r"^([A-Za-z][A-Za-z0-9]*)\[([^\[\]]*)\]\[([^\[\]]*)\]$").unwrap()
}

/// Classify a single operand token (already trimmed, comma-free).
pub fn classify(token: &str, line_number: usize) -> Result<Operand, ErrorKind> {
    if let Some(rest) = token.strip_prefix('#') {
        let value: i32 = rest
            .parse()
            .map_err(|_| ErrorKind::ExpectedNumber { token: token.to_string(), line: line_number })?;
        if !(-128..=127).contains(&value) {
            return Err(ErrorKind::ImmediateOutOfRange { value, line: line_number });
        }
        return Ok(Operand::Immediate(value as i16));
    }

    if let Some(reg) = parse_register_token(token) {
        return Ok(Operand::Register(reg));
    }

    if token.contains('[') || token.contains(']') {
        let re = matrix_pattern();
        let caps = re
            .captures(token)
            .ok_or(ErrorKind::MissingBracket { line: line_number })?;
        let label = caps.get(1).unwrap().as_str();
        validate_label_name(label, line_number)?;
        let r1 = parse_register_token(caps.get(2).unwrap().as_str())
            .ok_or(ErrorKind::MatrixMissingRegister { line: line_number })?;
        let r2 = parse_register_token(caps.get(3).unwrap().as_str())
            .ok_or(ErrorKind::MatrixMissingRegister { line: line_number })?;
        return Ok(Operand::Matrix { label: label.to_string(), r1, r2 });
    }

    validate_label_name(token, line_number)?;
    Ok(Operand::Direct(token.to_string()))
}

/// The fixed opcode table of §4.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Mov, Cmp, Add, Sub, Not, Clr, Lea, Inc, Dec, Jmp, Bne, Red, Prn, Jsr, Rts, Stop,
}

impl Opcode {
    pub fn code(self) -> u8 {
        match self {
            Opcode::Mov => 0, Opcode::Cmp => 1, Opcode::Add => 2, Opcode::Sub => 3,
            Opcode::Not => 4, Opcode::Clr => 5, Opcode::Lea => 6, Opcode::Inc => 7,
            Opcode::Dec => 8, Opcode::Jmp => 9, Opcode::Bne => 10, Opcode::Red => 11,
            Opcode::Prn => 12, Opcode::Jsr => 13, Opcode::Rts => 14, Opcode::Stop => 15,
        }
    }

    pub fn from_mnemonic(s: &str) -> Option<Opcode> {
        Some(match s {
            "mov" => Opcode::Mov, "cmp" => Opcode::Cmp, "add" => Opcode::Add,
            "sub" => Opcode::Sub, "not" => Opcode::Not, "clr" => Opcode::Clr,
            "lea" => Opcode::Lea, "inc" => Opcode::Inc, "dec" => Opcode::Dec,
            "jmp" => Opcode::Jmp, "bne" => Opcode::Bne, "red" => Opcode::Red,
            "prn" => Opcode::Prn, "jsr" => Opcode::Jsr, "rts" => Opcode::Rts,
            "stop" => Opcode::Stop,
            _ => return None,
        })
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Mov => "mov", Opcode::Cmp => "cmp", Opcode::Add => "add",
            Opcode::Sub => "sub", Opcode::Not => "not", Opcode::Clr => "clr",
            Opcode::Lea => "lea", Opcode::Inc => "inc", Opcode::Dec => "dec",
            Opcode::Jmp => "jmp", Opcode::Bne => "bne", Opcode::Red => "red",
            Opcode::Prn => "prn", Opcode::Jsr => "jsr", Opcode::Rts => "rts",
            Opcode::Stop => "stop",
        }
    }

    /// Number of operands this opcode takes: 0, 1 (destination only), or 2
    /// (source, destination).
    pub fn arity(self) -> usize {
        match self {
            Opcode::Rts | Opcode::Stop => 0,
            Opcode::Jmp | Opcode::Bne | Opcode::Jsr | Opcode::Prn | Opcode::Not | Opcode::Clr
            | Opcode::Inc | Opcode::Dec | Opcode::Red => 1,
            Opcode::Mov | Opcode::Cmp | Opcode::Add | Opcode::Sub | Opcode::Lea => 2,
        }
    }

    /// Addressing modes allowed for the source operand, if this opcode
    /// takes one.
    pub fn allowed_source_modes(self) -> &'static [AddressingMode] {
        use AddressingMode::*;
        match self {
            Opcode::Mov | Opcode::Add | Opcode::Sub | Opcode::Cmp =>
                &[Immediate, Direct, Matrix, Register],
            Opcode::Lea => &[Direct],
            _ => &[],
        }
    }

    /// Addressing modes allowed for the destination operand.
    pub fn allowed_destination_modes(self) -> &'static [AddressingMode] {
        use AddressingMode::*;
        match self {
            Opcode::Mov | Opcode::Add | Opcode::Sub | Opcode::Lea => &[Direct, Matrix, Register],
            Opcode::Cmp | Opcode::Prn => &[Immediate, Direct, Matrix, Register],
            Opcode::Not | Opcode::Clr | Opcode::Inc | Opcode::Dec | Opcode::Red
            | Opcode::Jmp | Opcode::Bne | Opcode::Jsr => &[Direct, Matrix, Register],
            Opcode::Rts | Opcode::Stop => &[],
        }
    }
}

/// Validate that an operand's addressing mode is legal for the given role
/// (source or destination) on this opcode.
pub fn validate_mode(
    opcode: Opcode,
    operand: &Operand,
    is_source: bool,
    line_number: usize,
) -> Result<(), ErrorKind> {
    let allowed = if is_source {
        opcode.allowed_source_modes()
    } else {
        opcode.allowed_destination_modes()
    };
    if allowed.contains(&operand.mode()) {
        Ok(())
    } else {
        Err(ErrorKind::InvalidAddressingMode { opcode: opcode.mnemonic().to_string(), line: line_number })
    }
}
