//! Request conversion for OpenAI

use crate::openai::config::OpenAIConfig;
use crate::traits::RequestConverter;
use parley_core::{Conversation, Error, Role};
use serde_json::{json, Value};

/// Converts conversations to the chat completions format
#[derive(Debug, Clone)]
pub struct OpenAIConverter {
    model: String,
    temperature: f64,
    max_tokens: u32,
}

impl OpenAIConverter {
    /// Converter using the sampling settings of `config`
    pub fn new(config: &OpenAIConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    fn role_name(role: Role) -> &'static str {
        match role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl RequestConverter for OpenAIConverter {
    fn convert(&self, conversation: &Conversation) -> Result<Value, Error> {
        let messages: Vec<Value> = conversation
            .turns()
            .iter()
            .map(|turn| {
                json!({
                    "role": Self::role_name(turn.role),
                    "content": turn.content,
                })
            })
            .collect();

        Ok(json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "stream": false,
        }))
    }
}
