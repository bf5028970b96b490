/// Which flow a selection goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    /// A word or short phrase: ask for a definition.
    Word,
    /// Anything longer: ask for an answer.
    Question,
}

/// Selections of up to this many whitespace-separated tokens are words.
pub const MAX_WORD_TOKENS: usize = 3;

/// Token-count heuristic. Not language-aware; punctuation counts as text.
pub fn classify(text: &str) -> TextKind {
    match text.split_whitespace().count() {
        1..=MAX_WORD_TOKENS => TextKind::Word,
        _ => TextKind::Question,
    }
}
