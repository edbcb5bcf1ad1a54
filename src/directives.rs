//! Directive handler (§4.4): `.data` / `.string` / `.mat` / `.entry` /
//! `.extern`.

use regex::Regex;

use crate::errors::ErrorKind;
use crate::operand::split_comma_list;
use crate::words::Word;

fn parse_signed(token: &str, line_number: usize) -> Result<i32, ErrorKind> {
    token
        .parse::<i32>()
        .map_err(|_| ErrorKind::ExpectedNumber { token: token.to_string(), line: line_number })
}

fn to_10bit_word(value: i32) -> Word {
    Word::new((value as u16) & crate::words::WORD_MASK)
}

/// `.data N1,N2,...`
pub fn data(rest: &str, line_number: usize) -> Result<Vec<Word>, ErrorKind> {
    let tokens = split_comma_list(rest, line_number)?;
    if tokens.is_empty() {
        return Err(ErrorKind::ExpectedNumber { token: String::new(), line: line_number });
    }
    tokens
        .iter()
        .map(|t| parse_signed(t, line_number).map(to_10bit_word))
        .collect()
}

/// `.string "..."`
pub fn string(rest: &str, line_number: usize) -> Result<Vec<Word>, ErrorKind> {
    let trimmed = rest.trim();
    if !trimmed.starts_with('"') || trimmed.len() < 2 || !trimmed.ends_with('"') {
        return Err(ErrorKind::UnterminatedString { line: line_number });
    }
    let inner = &trimmed[1..trimmed.len() - 1];
    let mut cells: Vec<Word> = inner.bytes().map(|b| Word::new(b as u16)).collect();
    cells.push(Word::zero());
    Ok(cells)
}

fn mat_header_pattern() -> Regex {
    Regex::new(r"^\[(\d+)\]\[(\d+)\]$").unwrap()
}

/// `.mat [ROWS][COLS] N1,N2,...`
pub fn mat(rest: &str, line_number: usize) -> Result<Vec<Word>, ErrorKind> {
    let trimmed = rest.trim();
    let (header, values) = trimmed
        .split_once(char::is_whitespace)
        .unwrap_or((trimmed, ""));
    let caps = mat_header_pattern()
        .captures(header)
        .ok_or(ErrorKind::MissingBracket { line: line_number })?;
    let rows: u16 = caps[1].parse().map_err(|_| ErrorKind::MissingBracket { line: line_number })?;
    let cols: u16 = caps[2].parse().map_err(|_| ErrorKind::MissingBracket { line: line_number })?;
    let expected = rows * cols;

    let tokens = split_comma_list(values, line_number)?;
    if tokens.len() as u16 != expected {
        return Err(ErrorKind::MatrixCountMismatch {
            expected,
            found: tokens.len(),
            line: line_number,
        });
    }
    tokens
        .iter()
        .map(|t| parse_signed(t, line_number).map(to_10bit_word))
        .collect()
}
