use crate::ai::classifier::{classify, TextKind};

/// Output-shape instruction sent with every request.
pub const INSTRUCTION: &str = "You are a helpful AI Assistant. Given a question and its options, \
analyze and return ONLY the letter of the correct answer (A, B, C, or D) for multiple choice, \
or \"True\"/\"False\" for true/false questions. For definition questions, provide a brief, \
clear definition.";

pub const DEFAULT_DEFINITION_LANGUAGE: &str = "English";

/// One request's worth of text. Lives only for the duration of the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub kind: TextKind,
    pub instruction: &'static str,
    pub text: String,
}

impl Prompt {
    pub fn for_selection(selection: &str, definition_language: &str) -> Self {
        let kind = classify(selection);
        let text = match kind {
            TextKind::Word => format!(
                "Define this word in {}: \"{}\". Give a brief, clear definition only.",
                definition_language, selection
            ),
            TextKind::Question => format!(
                "Question: {}\nPlease provide only the answer, no explanation.",
                selection
            ),
        };
        Self {
            kind,
            instruction: INSTRUCTION,
            text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_prompt_asks_for_definition_in_language() {
        let prompt = Prompt::for_selection("kaunis", "Finnish");
        assert_eq!(prompt.kind, TextKind::Word);
        assert_eq!(
            prompt.text,
            "Define this word in Finnish: \"kaunis\". Give a brief, clear definition only."
        );
    }

    #[test]
    fn question_prompt_wraps_selection() {
        let prompt = Prompt::for_selection("Is water wet? True or False", "English");
        assert_eq!(prompt.kind, TextKind::Question);
        assert!(prompt.text.starts_with("Question: Is water wet?"));
        assert!(prompt.text.ends_with("Please provide only the answer, no explanation."));
        assert_eq!(prompt.instruction, INSTRUCTION);
    }
}
