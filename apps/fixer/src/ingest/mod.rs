// Ingestion: batch reading, prompt assembly, response repair, normalization
// and content-addressed storage of corrected trivia, plus bulk banter import.
// All LLM calls go through llm_client.

pub mod banter;
pub mod batch_reader;
pub mod normalize;
pub mod pipeline;
pub mod prompts;
pub mod repair;
pub mod sink;
