//! Provider identities and their resolved endpoint configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Chat-completion provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    /// Ollama's OpenAI-compatible endpoint (local, default)
    #[default]
    Ollama,
    /// DeepSeek hosted API
    #[serde(rename = "deepseek")]
    DeepSeek,
    /// NVIDIA NIM hosted API
    NvidiaNim,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Ollama, Provider::DeepSeek, Provider::NvidiaNim];

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Some(Self::Ollama),
            "deepseek" => Some(Self::DeepSeek),
            "nvidia_nim" | "nvidia-nim" | "nvidia" | "nim" => Some(Self::NvidiaNim),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::DeepSeek => "deepseek",
            Self::NvidiaNim => "nvidia_nim",
        }
    }

    /// Base URL the OpenAI-compatible API is served under.
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Self::Ollama => "http://localhost:11434/v1",
            Self::DeepSeek => "https://api.deepseek.com",
            Self::NvidiaNim => "https://integrate.api.nvidia.com/v1",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Ollama => "gemma2:latest",
            Self::DeepSeek => "deepseek-chat",
            Self::NvidiaNim => "mistralai/mistral-large-2-instruct",
        }
    }

    /// Environment variable holding this provider's API key, if it needs one.
    pub fn credential_env(&self) -> Option<&'static str> {
        match self {
            Self::Ollama => None,
            Self::DeepSeek => Some("DEEPKEY"),
            Self::NvidiaNim => Some("NVIDIA_key"),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-provider overrides read from the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Fully resolved backend: endpoint, credential and model for one provider.
///
/// Built once per run and never mutated afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub provider: Provider,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
}

impl ProviderConfig {
    /// Resolve a provider against the process environment.
    pub fn from_env(provider: Provider, overrides: Option<&ProviderOverrides>) -> Self {
        Self::resolve(provider, overrides, |name| std::env::var(name).ok())
    }

    /// Resolve a provider, reading credentials through `env`.
    ///
    /// Only the chosen provider's credential variable is looked up. A missing
    /// credential is not an error here; the backend rejects the request later.
    pub fn resolve<F>(provider: Provider, overrides: Option<&ProviderOverrides>, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = overrides
            .and_then(|o| o.endpoint.clone())
            .unwrap_or_else(|| provider.default_endpoint().to_string());
        let model = overrides
            .and_then(|o| o.model.clone())
            .unwrap_or_else(|| provider.default_model().to_string());

        let api_key = match provider.credential_env() {
            Some(var) => env(var).filter(|k| !k.is_empty()),
            // Ollama ignores the key but OpenAI-compatible clients always send one
            None => Some("ollama".to_string()),
        };

        Self {
            provider,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }

    /// URL of the chat-completions route.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint)
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_local_provider_defaults() {
        let config = ProviderConfig::resolve(Provider::Ollama, None, |_| None);
        assert_eq!(config.endpoint, "http://localhost:11434/v1");
        assert_eq!(config.model, "gemma2:latest");
        assert_eq!(config.api_key.as_deref(), Some("ollama"));
        assert_eq!(
            config.completions_url(),
            "http://localhost:11434/v1/chat/completions"
        );
    }

    #[test]
    fn test_remote_reads_only_its_own_credential() {
        let seen = RefCell::new(Vec::new());
        let config = ProviderConfig::resolve(Provider::DeepSeek, None, |name| {
            seen.borrow_mut().push(name.to_string());
            Some(format!("key-for-{}", name))
        });

        assert_eq!(seen.into_inner(), vec!["DEEPKEY".to_string()]);
        assert_eq!(config.api_key.as_deref(), Some("key-for-DEEPKEY"));
        assert_eq!(config.model, "deepseek-chat");
    }

    #[test]
    fn test_nim_credential_and_missing_key() {
        let seen = RefCell::new(Vec::new());
        let config = ProviderConfig::resolve(Provider::NvidiaNim, None, |name| {
            seen.borrow_mut().push(name.to_string());
            None
        });

        assert_eq!(seen.into_inner(), vec!["NVIDIA_key".to_string()]);
        assert!(config.api_key.is_none());
        assert_eq!(
            config.completions_url(),
            "https://integrate.api.nvidia.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_local_never_touches_environment() {
        let config = ProviderConfig::resolve(Provider::Ollama, None, |name| {
            panic!("unexpected env lookup: {}", name)
        });
        assert_eq!(config.provider, Provider::Ollama);
    }

    #[test]
    fn test_overrides() {
        let overrides = ProviderOverrides {
            endpoint: Some("http://gpu-box:11434/v1/".to_string()),
            model: Some("llama3.1:8b".to_string()),
        };
        let config = ProviderConfig::resolve(Provider::Ollama, Some(&overrides), |_| None);
        assert_eq!(config.endpoint, "http://gpu-box:11434/v1");
        assert_eq!(config.model, "llama3.1:8b");
    }

    #[test]
    fn test_provider_names() {
        for provider in Provider::ALL {
            assert_eq!(Provider::from_str(provider.as_str()), Some(provider));
        }
        assert_eq!(Provider::from_str("NVIDIA_NIM"), Some(Provider::NvidiaNim));
        assert_eq!(Provider::from_str("nvidia"), Some(Provider::NvidiaNim));
        assert_eq!(Provider::from_str("openai"), None);
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = ProviderConfig::resolve(Provider::DeepSeek, None, |_| {
            Some("sk-secret".to_string())
        });
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("redacted"));
    }
}
