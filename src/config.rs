//! TOML configuration for matching thresholds and the answering service

use std::path::Path;

use bigdecimal::num_bigint::BigInt;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::reconciliation::scoring::{MAX_AMOUNT_SCALE, MAX_SCORE};
use crate::types::{ReconError, ReconResult};

/// Instruction given to the answering service ahead of the data
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a financial reconciliation assistant. \
Answer ONLY using the information in the provided transactions and attachments. \
Do NOT infer, guess, or hallucinate any missing data. \
If the answer cannot be fully derived from the data, say so clearly.";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconConfig {
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
}

impl ReconConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> ReconResult<Self> {
        let config: ReconConfig =
            toml::from_str(source).map_err(|e| ReconError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> ReconResult<Self> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> ReconResult<()> {
        self.matching.validate()?;
        self.assistant.validate()
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Which record set drives a batch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    /// Each transaction, in input order, picks from the remaining attachments
    #[default]
    Transactions,
    /// Each attachment, in input order, picks from the remaining transactions
    Attachments,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Lowest heuristic score accepted as a confident match
    #[serde(default = "default_min_score")]
    pub min_score: u8,
    /// Largest day distance still earning the date-proximity point
    #[serde(default = "default_date_window_days")]
    pub date_window_days: i64,
    /// Amounts closer than this are considered equal
    #[serde(default = "default_amount_epsilon")]
    pub amount_epsilon: BigDecimal,
    #[serde(default)]
    pub anchor: Anchor,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            min_score: default_min_score(),
            date_window_days: default_date_window_days(),
            amount_epsilon: default_amount_epsilon(),
            anchor: Anchor::default(),
        }
    }
}

impl MatchingConfig {
    pub fn validate(&self) -> ReconResult<()> {
        if self.min_score > MAX_SCORE {
            return Err(ReconError::Config(format!(
                "matching.min_score must be at most {MAX_SCORE}, got {}",
                self.min_score
            )));
        }
        if self.date_window_days < 0 {
            return Err(ReconError::Config(format!(
                "matching.date_window_days cannot be negative, got {}",
                self.date_window_days
            )));
        }
        if self.amount_epsilon < BigDecimal::from(0) {
            return Err(ReconError::Config(format!(
                "matching.amount_epsilon cannot be negative, got {}",
                self.amount_epsilon
            )));
        }
        if self.amount_epsilon.as_bigint_and_exponent().1.abs() > MAX_AMOUNT_SCALE {
            return Err(ReconError::Config(format!(
                "matching.amount_epsilon exponent must stay within {MAX_AMOUNT_SCALE} digits, got {}",
                self.amount_epsilon
            )));
        }
        Ok(())
    }
}

fn default_min_score() -> u8 {
    4
}

fn default_date_window_days() -> i64 {
    7
}

fn default_amount_epsilon() -> BigDecimal {
    BigDecimal::new(BigInt::from(1), 6)
}

// ---------------------------------------------------------------------------
// Answering service
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Root of an OpenAI-compatible API, without the `/chat/completions` suffix
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key: default_api_key(),
            timeout_secs: default_timeout_secs(),
            system_prompt: default_system_prompt(),
        }
    }
}

impl AssistantConfig {
    pub fn validate(&self) -> ReconResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(ReconError::Config(
                "assistant.base_url cannot be empty".to_string(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(ReconError::Config(
                "assistant.model cannot be empty".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(ReconError::Config(
                "assistant.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_base_url() -> String {
    "http://localhost:11434/v1".to_string()
}

fn default_model() -> String {
    "llama3.2:latest".to_string()
}

fn default_api_key() -> String {
    "ollama".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}
