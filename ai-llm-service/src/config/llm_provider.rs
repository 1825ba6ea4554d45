use std::fmt;
use std::str::FromStr;

use crate::error_handler::ConfigError;

/// Backend used for embeddings and text generation.
///
/// Parsed from `LLM_KIND` (case-insensitive): `ollama`, `openai`
/// (`chatgpt` is accepted as an alias).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// Local Ollama runtime.
    Ollama,
    /// OpenAI REST API.
    OpenAI,
}

impl FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" | "chatgpt" => Ok(Self::OpenAI),
            other => Err(ConfigError::UnsupportedProvider(other.to_string())),
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ollama => f.write_str("ollama"),
            Self::OpenAI => f.write_str("openai"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_kinds() {
        assert_eq!("ollama".parse::<LlmProvider>().unwrap(), LlmProvider::Ollama);
        assert_eq!(" OpenAI ".parse::<LlmProvider>().unwrap(), LlmProvider::OpenAI);
        assert_eq!("chatgpt".parse::<LlmProvider>().unwrap(), LlmProvider::OpenAI);
    }

    #[test]
    fn rejects_unknown_kind() {
        let err = "anthropic".parse::<LlmProvider>().unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedProvider(k) if k == "anthropic"));
    }
}
