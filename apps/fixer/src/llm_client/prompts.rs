// Shared prompt fragments and the prompt builder.
// Each pipeline that needs LLM calls defines its own prompts.rs alongside it.

/// A fixed input/output pair that anchors the model's output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FewShotExample {
    pub input: &'static str,
    pub output: &'static str,
}

/// Assembles instructions, few-shot examples and a window of raw text into one prompt.
///
/// Examples are embedded verbatim. `window_text` is appended untouched, line
/// breaks included, so the model sees the original near-JSON structure.
pub fn build_prompt(instructions: &str, examples: &[FewShotExample], window_text: &str) -> String {
    let mut prompt = String::with_capacity(
        instructions.len()
            + window_text.len()
            + examples
                .iter()
                .map(|e| e.input.len() + e.output.len() + 32)
                .sum::<usize>()
            + 32,
    );
    prompt.push_str(instructions.trim_end());
    prompt.push_str("\n\n");

    if !examples.is_empty() {
        prompt.push_str("EXAMPLES:\n");
        for example in examples {
            prompt.push_str("input_text=");
            prompt.push_str(example.input);
            prompt.push('\n');
            prompt.push_str("output_text=");
            prompt.push_str(example.output);
            prompt.push_str("\n\n");
        }
    }

    prompt.push_str("INPUT:\n");
    prompt.push_str(window_text);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: FewShotExample = FewShotExample {
        input: r#"{"question":"The phrase "Homo sapiens " means ____"},"#,
        output: r#"{"question":"The phrase \"Homo sapiens\" means ____"},"#,
    };

    #[test]
    fn test_build_prompt_preserves_examples_verbatim() {
        let prompt = build_prompt("Fix these.", &[EXAMPLE], "line\n");
        assert!(prompt.contains(&format!("input_text={}\n", EXAMPLE.input)));
        assert!(prompt.contains(&format!("output_text={}\n", EXAMPLE.output)));
    }

    #[test]
    fn test_build_prompt_appends_window_with_line_breaks() {
        let window = "{\"a\":1},\n{\"b\":2},\n";
        let prompt = build_prompt("Fix these.", &[], window);
        assert!(prompt.starts_with("Fix these.\n\n"));
        assert!(prompt.ends_with(&format!("INPUT:\n{window}")));
        assert!(!prompt.contains("EXAMPLES:"));
    }

    #[test]
    fn test_build_prompt_is_deterministic() {
        let a = build_prompt("Fix.", &[EXAMPLE, EXAMPLE], "x\n");
        let b = build_prompt("Fix.", &[EXAMPLE, EXAMPLE], "x\n");
        assert_eq!(a, b);
        assert!(a.find("EXAMPLES:").unwrap() < a.find("INPUT:").unwrap());
    }
}
