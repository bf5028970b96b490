/// Legacy models sometimes lead with this token.
const ANSWER_PREFIX: &str = "Answer: ";

/// Strip the first `Answer: ` token (wherever it appears) and surrounding
/// whitespace.
pub fn clean_answer(raw: &str) -> String {
    raw.replacen(ANSWER_PREFIX, "", 1).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_prefix_once() {
        assert_eq!(clean_answer("Answer: B"), "B");
        assert_eq!(clean_answer("Answer: Answer: B"), "Answer: B");
    }

    #[test]
    fn leaves_plain_answers_alone() {
        assert_eq!(clean_answer("  True "), "True");
        assert_eq!(clean_answer("Answer:B"), "Answer:B");
    }
}
