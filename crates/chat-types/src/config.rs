use serde::{Deserialize, Serialize};

use crate::{ChatError, Result};

/// Top-level application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub assistant: AssistantConfig,
    pub logging: LoggingConfig,
    pub layout: LayoutVariant,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            assistant: AssistantConfig::default(),
            logging: LoggingConfig::default(),
            layout: LayoutVariant::Tabbed,
        }
    }
}

impl AppConfig {
    /// Parse a JSON config blob. Missing fields fall back to defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Check that everything a chat turn needs is present.
    /// The evaluation assistant is only required by the tabbed layout.
    pub fn validate(&self) -> Result<()> {
        if self.assistant.api_key.trim().is_empty() {
            return Err(ChatError::Config("API key is not set".to_string()));
        }
        if self.assistant.chat_assistant_id.trim().is_empty() {
            return Err(ChatError::Config("Chat assistant id is not set".to_string()));
        }
        if self.layout == LayoutVariant::Tabbed
            && self.assistant.eval_assistant_id.trim().is_empty()
        {
            return Err(ChatError::Config(
                "Evaluation assistant id is not set".to_string(),
            ));
        }
        Ok(())
    }

    /// Logging only applies to the tabbed layout
    pub fn logging_active(&self) -> bool {
        self.layout == LayoutVariant::Tabbed
            && self.logging.enabled
            && !self.logging.endpoint.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub api_key: String,
    pub api_base: Option<String>,
    /// Assistant used for ordinary chat turns
    pub chat_assistant_id: String,
    /// Assistant used for evaluation runs over the same thread
    pub eval_assistant_id: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: None,
            chat_assistant_id: String::new(),
            eval_assistant_id: String::new(),
        }
    }
}

impl AssistantConfig {
    pub fn base_url(&self) -> &str {
        match self.api_base.as_deref() {
            Some(base) if !base.trim().is_empty() => base.trim_end_matches('/'),
            _ => DEFAULT_API_BASE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,
    pub endpoint: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: DEFAULT_LOG_ENDPOINT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutVariant {
    /// Examine and Evaluate tabs, with transcript logging
    Tabbed,
    /// One continuous chat view, no evaluation
    Single,
}

impl LayoutVariant {
    pub fn all() -> &'static [LayoutVariant] {
        &[LayoutVariant::Tabbed, LayoutVariant::Single]
    }

    pub fn label(&self) -> &'static str {
        match self {
            LayoutVariant::Tabbed => "Examine / Evaluate",
            LayoutVariant::Single => "Single chat",
        }
    }
}

pub const DEFAULT_API_BASE: &str = "https://api.openai.com";
pub const DEFAULT_LOG_ENDPOINT: &str = "https://tools.ryanstewart.com/log.php";
