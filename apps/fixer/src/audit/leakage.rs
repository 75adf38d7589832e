/// Replaces a leaked answer in the question text.
pub const BLANK_TOKEN: &str = "_____";

/// Case-insensitive check for the correct answer appearing inside the question.
/// An empty answer never leaks.
pub fn answer_leaks(question: &str, correct_answer: &str) -> bool {
    if correct_answer.trim().is_empty() {
        return false;
    }
    question
        .to_lowercase()
        .contains(&correct_answer.to_lowercase())
}

/// Lowercases the question, blanks every occurrence of the answer and
/// capitalizes the first character of the result.
pub fn blank_out(question: &str, correct_answer: &str) -> String {
    let lowered = question
        .to_lowercase()
        .replace(&correct_answer.to_lowercase(), BLANK_TOKEN);
    capitalize(&lowered)
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leak_is_case_insensitive() {
        assert!(answer_leaks("The Capital Of France Is Paris", "Paris"));
        assert!(answer_leaks("the capital of france is paris", "PARIS"));
        assert!(!answer_leaks("The capital of France is ____", "Paris"));
    }

    #[test]
    fn test_empty_answer_never_leaks() {
        assert!(!answer_leaks("Anything at all", ""));
        assert!(!answer_leaks("Anything at all", "  "));
    }

    #[test]
    fn test_blank_out_rewrites_and_capitalizes() {
        assert_eq!(
            blank_out("The Capital Of France Is Paris", "Paris"),
            "The capital of france is _____"
        );
        assert_eq!(
            blank_out("paris is the capital of france", "Paris"),
            "_____ is the capital of france"
        );
    }

    #[test]
    fn test_blank_out_replaces_every_occurrence() {
        assert_eq!(blank_out("Echo echo ECHO", "echo"), "_____ _____ _____");
    }

    #[test]
    fn test_capitalize_handles_non_ascii() {
        assert_eq!(capitalize("élan vital"), "Élan vital");
        assert_eq!(capitalize(""), "");
    }
}
