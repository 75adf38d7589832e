use tracing::debug;

use super::prompts::FewShotExample;
use super::retry::{with_backoff, RetryPolicy};
use super::{ChatMessage, ChatModel, ChatRequest, GenerationParams, LlmError};

/// Exchanges kept after the pinned few-shot examples.
const HISTORY_TURNS: usize = 4;

/// Multi-turn conversation with a fixed system context and few-shot examples.
///
/// Each successful exchange is appended to the history; only the latest
/// `HISTORY_TURNS` exchanges are replayed. A failed send leaves the history as it was.
pub struct ChatSession<'a> {
    model: &'a dyn ChatModel,
    retry: RetryPolicy,
    system: String,
    examples: Vec<ChatMessage>,
    history: Vec<ChatMessage>,
}

impl<'a> ChatSession<'a> {
    pub fn start(
        model: &'a dyn ChatModel,
        retry: RetryPolicy,
        system: &str,
        examples: &[FewShotExample],
    ) -> Self {
        let examples = examples
            .iter()
            .flat_map(|e| [ChatMessage::user(e.input), ChatMessage::assistant(e.output)])
            .collect();
        Self {
            model,
            retry,
            system: system.to_string(),
            examples,
            history: Vec::new(),
        }
    }

    pub async fn send(
        &mut self,
        prompt: &str,
        params: GenerationParams,
    ) -> Result<String, LlmError> {
        let mut messages = Vec::with_capacity(self.examples.len() + self.history.len() + 1);
        messages.extend(self.examples.iter().cloned());
        messages.extend(self.history.iter().cloned());
        messages.push(ChatMessage::user(prompt));

        let request = ChatRequest {
            system: Some(self.system.clone()),
            messages,
            params,
        };
        let model = self.model;
        let text = with_backoff(&self.retry, || model.chat(&request)).await?;

        self.history.push(ChatMessage::user(prompt));
        self.history.push(ChatMessage::assistant(text.as_str()));
        let excess = self.history.len().saturating_sub(HISTORY_TURNS * 2);
        if excess > 0 {
            self.history.drain(..excess);
            debug!("Session history trimmed by {} messages", excess);
        }

        Ok(text)
    }

    #[cfg(test)]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

/// Stateless single call: no system context, no history.
pub async fn complete(
    model: &dyn ChatModel,
    retry: &RetryPolicy,
    prompt: &str,
    params: GenerationParams,
) -> Result<String, LlmError> {
    let request = ChatRequest {
        system: None,
        messages: vec![ChatMessage::user(prompt)],
        params,
    };
    with_backoff(retry, || model.chat(&request)).await
}
