use serde::{Deserialize, Serialize};

use crate::{domain::PageContent, pipeline::SummarizeError};

const SYSTEM_PROMPT: &str =
    "Summarize the content of this webpage. Ensure all responses are in English.";

pub fn build_request(model: String, temperature: f32, page: &PageContent) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model,
        messages: vec![
            ChatMessage {
                role: "system".into(),
                content: SYSTEM_PROMPT.into(),
            },
            ChatMessage {
                role: "user".into(),
                content: format!("Title: {}\n\nContent: {}", page.title, page.content),
            },
        ],
        temperature,
        // -1 lets the server generate until the model stops.
        max_tokens: -1,
        stream: false,
    }
}

pub fn extract_summary(completion: ChatCompletionResponse) -> Result<String, SummarizeError> {
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|msg| msg.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or(SummarizeError::EmptyResponse)
}

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: i32,
    pub stream: bool,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: Option<ChatCompletionMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionMessage {
    pub content: Option<String>,
}
