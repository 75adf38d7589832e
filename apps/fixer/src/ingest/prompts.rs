// Ingestion LLM prompt templates.
// All prompts for the ingest module are defined here.

use crate::llm_client::prompts::FewShotExample;

pub const INGEST_SYSTEM: &str = "\
You are a code editor for a set of trivia questions stored as JSON objects. \
Please fix the following trivia questions.";

pub const INGEST_INSTRUCTIONS: &str = r#"For each line in the following input, perform these steps:
1) Inside the "question" element, escape every unescaped or duplicated quotation mark with a \ character so the line is valid JSON
2) Fix unnecessary title casing
3) Remove unnecessary spaces next to quotation marks
4) Add three plausible, unique, wrong entries to the end of the "answers" array; keep the correct answer first
5) Make sure the correct answer does not appear in the "question"; if the input contains a "____" blank, DO NOT REPLACE IT
6) Put a short explanation and an interesting factoid in an "explanation" field
7) Remove the "source" and "tags" fields
8) Write each object on ONE SINGLE line"#;

/// Raw input lines and their corrected form. Kept verbatim: they anchor the output format.
pub const INGEST_EXAMPLES: [FewShotExample; 2] = [
    FewShotExample {
        input: r#"{"category_id":"SCIENCE_AND_NATURE", "lang":"en", "tags":[], "question":"The phrase "Homo sapiens " means ____", "answer":0, "answers":["Man of knowledge"], "source":""},"#,
        output: r#"{"category_id":"SCIENCE_AND_NATURE", "lang":"en", "question":"The phrase \"Homo sapiens\" means ____", "answer":0, "answers":["Man of knowledge", "Man of science", "Man who thinks", "Man of steel"], "explanation":"The phrase \"Homo sapiens\" was coined by Carl Linnaeus in 1758 as part of his binomial nomenclature"},"#,
    },
    FewShotExample {
        input: r#"{"category_id":"SCIENCE_AND_NATURE", "lang":"en", "tags":["SCIENCE_AND_NATURE"], "question":"__________ and short_tailed shrews get by on only two hours of sleep a day.", "answer":0, "answers":["Elephants"], "source":""},"#,
        output: r#"{"category_id":"SCIENCE_AND_NATURE", "lang":"en", "question":"__________ and short tailed shrews get by on only two hours of sleep a day.", "answer":0, "answers":["Elephants", "Horses", "Hippos", "Voles"], "explanation":"Elephants are among the shortest sleeping mammals and may only dream every few days"},"#,
    },
];
