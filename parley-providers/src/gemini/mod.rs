//! Google Gemini provider implementation

mod config;
mod converter;
mod parser;
mod provider;

pub use config::GeminiConfig;
pub use converter::GeminiConverter;
pub use parser::GeminiParser;
pub use provider::Gemini;
