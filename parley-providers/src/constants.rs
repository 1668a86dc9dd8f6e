//! Constants for provider implementations

/// Default OpenAI base URL
pub const OPENAI_DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default OpenAI model
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Default Gemini base URL
pub const GEMINI_DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default Gemini model
pub const GEMINI_DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Sampling temperature sent to both vendors
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Upper bound on generated tokens sent to both vendors
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Gemini nucleus sampling
pub const GEMINI_DEFAULT_TOP_P: f64 = 0.95;

/// Gemini top-k sampling
pub const GEMINI_DEFAULT_TOP_K: u32 = 40;

/// Text sent to Gemini when the conversation is empty
pub const GEMINI_EMPTY_PROMPT: &str = "Hello";

/// Default HTTP timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default delay between simulated stream emits, in milliseconds
pub const DEFAULT_STREAM_DELAY_MS: u64 = 10;
