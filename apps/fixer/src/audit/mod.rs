// Post-ingestion passes over the store: the audit loop, classify-only scoring
// and the read-only feedback aggregator.

pub mod classify;
pub mod feedback;
pub mod leakage;
pub mod prompts;
pub mod review;
