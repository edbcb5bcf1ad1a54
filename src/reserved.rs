//! The reserved-word list (§6): opcodes, directives, registers, macro
//! keywords. None of these may be used as a label or macro name.

pub const OPCODES: [&str; 16] = [
    "mov", "cmp", "add", "sub", "not", "clr", "lea", "inc", "dec", "jmp", "bne", "red", "prn",
    "jsr", "rts", "stop",
];

pub const DIRECTIVES: [&str; 5] = [".data", ".string", ".mat", ".entry", ".extern"];

pub const MACRO_KEYWORDS: [&str; 2] = ["mcro", "mcroend"];

pub fn is_register(word: &str) -> bool {
    matches!(word, "r0" | "r1" | "r2" | "r3" | "r4" | "r5" | "r6" | "r7")
}

pub fn is_reserved_word(word: &str) -> bool {
    OPCODES.contains(&word)
        || DIRECTIVES.contains(&word)
        || MACRO_KEYWORDS.contains(&word)
        || is_register(word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcodes_and_registers_are_reserved() {
        assert!(is_reserved_word("mov"));
        assert!(is_reserved_word("r7"));
        assert!(is_reserved_word("mcro"));
        assert!(!is_reserved_word("MAIN"));
    }
}
