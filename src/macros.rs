//! Macro preprocessor (§4.1): lexical expansion with a macro symbol table.

use crate::errors::{ErrorKind, ErrorSink};
use crate::reserved::is_reserved_word;

pub const MAX_LINE_LENGTH: usize = 80;
pub const MAX_NAME_LENGTH: usize = 30;

/// One macro: its name and the ordered body lines it expands to.
#[derive(Debug, Clone, Default)]
struct Macro {
    body: Vec<String>,
}

/// Stores macro definitions and looks them up by name.
#[derive(Debug, Default)]
pub struct MacroTable {
    macros: std::collections::HashMap<String, Macro>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn contains(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }

    fn define(&mut self, name: &str) {
        self.macros.insert(name.to_string(), Macro::default());
    }

    fn append_body_line(&mut self, name: &str, line: String) {
        self.macros.get_mut(name).expect("macro being defined must exist").body.push(line);
    }

    fn find(&self, name: &str) -> Option<&[String]> {
        self.macros.get(name).map(|m| m.body.as_slice())
    }
}

/// Split a raw source line into normalized content and a flag for the
/// "`;` preceded by whitespace past the first column" hard error (§4.1).
///
/// Whitespace is stripped for keyword matching purposes by the caller;
/// here we only strip the comment tail.
fn strip_comment(line: &str) -> (String, bool) {
    if let Some(idx) = line.find(';') {
        let note_with_space = idx > 0
            && line[..idx].chars().last().is_some_and(char::is_whitespace);
        (line[..idx].trim_end().to_string(), note_with_space)
    } else {
        (line.to_string(), false)
    }
}

/// First whitespace-delimited token of a (already comment-stripped) line.
fn first_token(line: &str) -> &str {
    line.split_whitespace().next().unwrap_or("")
}

/// Split a "LABEL: rest" line into its label (without the colon) and
/// remainder, mirroring `first_pass::split_label` so a label preceding a
/// macro use on the same line (§8 S5: `MAIN: DBL`) is recognized instead of
/// folding the whole line into one keyword.
fn split_label_prefix(line: &str) -> (Option<&str>, &str) {
    if let Some(idx) = line.find(':') {
        let before = &line[..idx];
        if !before.is_empty() && !before.contains(char::is_whitespace) {
            return (Some(before), line[idx + 1..].trim());
        }
    }
    (None, line)
}

fn is_valid_macro_name(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_NAME_LENGTH {
        return false;
    }
    let mut chars = name.chars();
    let first = chars.next().unwrap();
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

enum State {
    Outside,
    InsideMacro { name: String },
}

/// Expand a source string into its macro-free intermediate form.
///
/// Returns the expanded lines on success. On failure, returns the
/// accumulated errors; the caller is responsible for not writing the `.am`
/// file (§4.1 — "the intermediate file is deleted on failure").
pub fn preprocess(source: &str) -> Result<Vec<String>, ErrorSink> {
    let mut sink = ErrorSink::new();
    let mut table = MacroTable::new();
    let mut output = Vec::new();
    let mut state = State::Outside;

    for (idx, raw_line) in source.lines().enumerate() {
        let line_number = idx + 1;

        if raw_line.len() > MAX_LINE_LENGTH {
            sink.push(ErrorKind::LineLengthExceedMaximum { line: line_number });
            continue;
        }

        let (content, note_with_space) = strip_comment(raw_line);
        if note_with_space {
            sink.push(ErrorKind::NoteWithSpace { line: line_number });
            continue;
        }

        let trimmed = content.trim();
        if trimmed.is_empty() {
            continue;
        }

        let keyword = first_token(trimmed);

        match &state {
            State::Outside => {
                if keyword == "mcro" {
                    let name = trimmed.splitn(2, char::is_whitespace).nth(1).map(str::trim);
                    let Some(name) = name.filter(|n| !n.is_empty()) else {
                        sink.push(ErrorKind::MissingMacroName { line: line_number });
                        continue;
                    };
                    if name.contains(char::is_whitespace) {
                        sink.push(ErrorKind::InvalidMacroName {
                            name: name.to_string(),
                            line: line_number,
                        });
                        continue;
                    }
                    if is_reserved_word(name) {
                        sink.push(ErrorKind::ReservedWordAsMacroName {
                            name: name.to_string(),
                            line: line_number,
                        });
                        continue;
                    }
                    if name.len() > MAX_NAME_LENGTH {
                        sink.push(ErrorKind::MacroNameTooLong {
                            name: name.to_string(),
                            line: line_number,
                        });
                        continue;
                    }
                    if !is_valid_macro_name(name) {
                        sink.push(ErrorKind::InvalidMacroName {
                            name: name.to_string(),
                            line: line_number,
                        });
                        continue;
                    }
                    if table.contains(name) {
                        sink.push(ErrorKind::MacroAlreadyDefined {
                            name: name.to_string(),
                            line: line_number,
                        });
                        continue;
                    }
                    table.define(name);
                    state = State::InsideMacro { name: name.to_string() };
                } else if keyword == "mcroend" {
                    sink.push(ErrorKind::MacroEndWithoutMacro { line: line_number });
                } else {
                    let (label, body) = split_label_prefix(trimmed);
                    let body_keyword = first_token(body);
                    let body_packed = body.replace([' ', '\t'], "");

                    if !body.is_empty() && body_packed == body_keyword && table.contains(&body_packed) {
                        // A line whose sole token (after an optional label) is
                        // a known macro name is a use; a label attaches to the
                        // macro's first expanded line so it still addresses
                        // the macro's first instruction.
                        let expansion = table.find(&body_packed).unwrap();
                        match (label, expansion.split_first()) {
                            (Some(label), Some((first, rest))) => {
                                output.push(format!("{label}: {first}"));
                                output.extend(rest.iter().cloned());
                            }
                            (Some(label), None) => output.push(format!("{label}:")),
                            (None, _) => output.extend(expansion.iter().cloned()),
                        }
                    } else {
                        output.push(trimmed.to_string());
                    }
                }
            }
            State::InsideMacro { name } => {
                if keyword == "mcro" {
                    sink.push(ErrorKind::NestedMacro { line: line_number });
                } else if keyword == "mcroend" {
                    let rest = trimmed.strip_prefix("mcroend").unwrap_or("").trim();
                    if !rest.is_empty() {
                        sink.push(ErrorKind::TextAfterMacroEnd { line: line_number });
                    }
                    state = State::Outside;
                } else {
                    table.append_body_line(name, trimmed.to_string());
                }
            }
        }
    }

    if let State::InsideMacro { name } = state {
        sink.push(ErrorKind::UnterminatedMacro { name, line: source.lines().count() });
    }

    if sink.has_errors() {
        Err(sink)
    } else {
        Ok(output)
    }
}
