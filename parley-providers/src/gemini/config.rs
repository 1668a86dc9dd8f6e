//! Gemini provider configuration

use crate::constants::{
    DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, GEMINI_DEFAULT_BASE_URL, GEMINI_DEFAULT_MODEL,
    GEMINI_DEFAULT_TOP_K, GEMINI_DEFAULT_TOP_P,
};

/// Configuration for the Gemini provider
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key for authentication
    pub api_key: String,
    /// Base URL for the Generative Language API
    pub base_url: String,
    /// Model name
    pub model: String,
    /// Sampling temperature
    pub temperature: f64,
    /// Upper bound on generated tokens
    pub max_output_tokens: u32,
    /// Nucleus sampling
    pub top_p: f64,
    /// Top-k sampling
    pub top_k: u32,
}

impl GeminiConfig {
    /// Create a new configuration with the given API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: GEMINI_DEFAULT_BASE_URL.to_string(),
            model: GEMINI_DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_TOKENS,
            top_p: GEMINI_DEFAULT_TOP_P,
            top_k: GEMINI_DEFAULT_TOP_K,
        }
    }

    /// Set the base URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// URL of the one-shot generation endpoint
    pub fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}
