//! Configuration from the process environment

use crate::dispatcher::StreamMode;
use parley_core::{Error, Result};
use parley_providers::constants::{DEFAULT_STREAM_DELAY_MS, DEFAULT_TIMEOUT_SECS};
use parley_providers::ChunkUnit;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// A supported vendor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// OpenAI chat completions
    OpenAI,
    /// Google Gemini
    Gemini,
}

impl ProviderKind {
    /// Every supported vendor, in the default preference order
    pub const ALL: [ProviderKind; 2] = [ProviderKind::Gemini, ProviderKind::OpenAI];

    /// Lowercase name as used in configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "openai",
            ProviderKind::Gemini => "gemini",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAI),
            "gemini" => Ok(ProviderKind::Gemini),
            other => Err(Error::Configuration(format!("unknown provider '{}'", other))),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick primary and secondary from credential presence and preference
///
/// Kinds missing from `preference` rank after the listed ones, in the default
/// order. Fails with [`Error::NoProviderConfigured`] when nothing is
/// configured.
pub fn select_providers(
    openai_configured: bool,
    gemini_configured: bool,
    preference: &[ProviderKind],
) -> Result<(ProviderKind, Option<ProviderKind>)> {
    let configured = |kind: &ProviderKind| match kind {
        ProviderKind::OpenAI => openai_configured,
        ProviderKind::Gemini => gemini_configured,
    };

    let mut order: Vec<ProviderKind> = Vec::with_capacity(ProviderKind::ALL.len());
    for kind in preference.iter().chain(ProviderKind::ALL.iter()) {
        if !order.contains(kind) {
            order.push(*kind);
        }
    }

    let mut usable = order.into_iter().filter(configured);
    let primary = usable.next().ok_or(Error::NoProviderConfigured)?;
    Ok((primary, usable.next()))
}

/// Runtime configuration
///
/// | Variable | Default |
/// |---|---|
/// | `OPENAI_API_KEY` | unset |
/// | `GEMINI_API_KEY` | unset |
/// | `PARLEY_PROVIDER_PREFERENCE` | `gemini,openai` |
/// | `PARLEY_HTTP_TIMEOUT_SECS` | `60` |
/// | `PARLEY_STREAM_DELAY_MS` | `10` |
/// | `PARLEY_STREAM_MODE` | `splice` |
/// | `PARLEY_STREAM_UNIT` | `char` |
/// | `OPENAI_MODEL`, `GEMINI_MODEL` | vendor default |
/// | `OPENAI_BASE_URL`, `GEMINI_BASE_URL` | vendor default |
///
/// Blank values count as unset.
#[derive(Clone, PartialEq)]
pub struct Settings {
    /// OpenAI credential
    pub openai_api_key: Option<String>,
    /// Gemini credential
    pub gemini_api_key: Option<String>,
    /// Preference order between configured providers
    pub preference: Vec<ProviderKind>,
    /// Bound on every provider HTTP call
    pub http_timeout: Duration,
    /// Wait between simulated stream emits
    pub stream_delay: Duration,
    /// Reaction to mid-stream failures
    pub stream_mode: StreamMode,
    /// Granularity of simulated stream chunks
    pub chunk_unit: ChunkUnit,
    /// OpenAI model override
    pub openai_model: Option<String>,
    /// Gemini model override
    pub gemini_model: Option<String>,
    /// OpenAI base URL override
    pub openai_base_url: Option<String>,
    /// Gemini base URL override
    pub gemini_base_url: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            gemini_api_key: None,
            preference: ProviderKind::ALL.to_vec(),
            http_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            stream_delay: Duration::from_millis(DEFAULT_STREAM_DELAY_MS),
            stream_mode: StreamMode::default(),
            chunk_unit: ChunkUnit::default(),
            openai_model: None,
            gemini_model: None,
            openai_base_url: None,
            gemini_base_url: None,
        }
    }
}

// keys stay out of logs
impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |key: &Option<String>| key.as_ref().map(|_| "<redacted>");
        f.debug_struct("Settings")
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("gemini_api_key", &redact(&self.gemini_api_key))
            .field("preference", &self.preference)
            .field("http_timeout", &self.http_timeout)
            .field("stream_delay", &self.stream_delay)
            .field("stream_mode", &self.stream_mode)
            .field("chunk_unit", &self.chunk_unit)
            .field("openai_model", &self.openai_model)
            .field("gemini_model", &self.gemini_model)
            .field("openai_base_url", &self.openai_base_url)
            .field("gemini_base_url", &self.gemini_base_url)
            .finish()
    }
}

impl Settings {
    /// Read settings from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Settings::default();

        let preference = match get("PARLEY_PROVIDER_PREFERENCE") {
            Some(raw) => parse_preference(&raw)?,
            None => defaults.preference,
        };

        let http_timeout = match get("PARLEY_HTTP_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = parse_number("PARLEY_HTTP_TIMEOUT_SECS", &raw)?;
                if secs == 0 {
                    return Err(Error::Configuration(
                        "PARLEY_HTTP_TIMEOUT_SECS must be greater than zero".into(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => defaults.http_timeout,
        };

        let stream_delay = match get("PARLEY_STREAM_DELAY_MS") {
            Some(raw) => Duration::from_millis(parse_number("PARLEY_STREAM_DELAY_MS", &raw)?),
            None => defaults.stream_delay,
        };

        let stream_mode = match get("PARLEY_STREAM_MODE") {
            Some(raw) => raw.parse()?,
            None => defaults.stream_mode,
        };

        let chunk_unit = match get("PARLEY_STREAM_UNIT").as_deref() {
            None => defaults.chunk_unit,
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "char" => ChunkUnit::Char,
                "word" => ChunkUnit::Word,
                other => {
                    return Err(Error::Configuration(format!(
                        "unknown stream unit '{}', expected 'char' or 'word'",
                        other
                    )))
                }
            },
        };

        Ok(Self {
            openai_api_key: get("OPENAI_API_KEY"),
            gemini_api_key: get("GEMINI_API_KEY"),
            preference,
            http_timeout,
            stream_delay,
            stream_mode,
            chunk_unit,
            openai_model: get("OPENAI_MODEL"),
            gemini_model: get("GEMINI_MODEL"),
            openai_base_url: get("OPENAI_BASE_URL"),
            gemini_base_url: get("GEMINI_BASE_URL"),
        })
    }

    /// Whether a credential is present for `kind`
    pub fn is_configured(&self, kind: ProviderKind) -> bool {
        match kind {
            ProviderKind::OpenAI => self.openai_api_key.is_some(),
            ProviderKind::Gemini => self.gemini_api_key.is_some(),
        }
    }

    /// Primary and secondary according to the preference rule
    pub fn select(&self) -> Result<(ProviderKind, Option<ProviderKind>)> {
        select_providers(
            self.is_configured(ProviderKind::OpenAI),
            self.is_configured(ProviderKind::Gemini),
            &self.preference,
        )
    }
}

fn parse_preference(raw: &str) -> Result<Vec<ProviderKind>> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::parse)
        .collect()
}

fn parse_number(name: &str, raw: &str) -> Result<u64> {
    raw.parse()
        .map_err(|_| Error::Configuration(format!("{} must be a whole number, got '{}'", name, raw)))
}
