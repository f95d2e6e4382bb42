//! Judgment oracle boundary: the external model that scores one
//! source/candidate pair, plus the reply normalization rules.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;

const SYSTEM_PROMPT: &str = "You are a senior technical recruiter. Analyze CV-JD matches \
accurately and provide concise bullet-point analysis. Return valid JSON with explanation \
as a single string.";

const EXPLANATION_MAX_CHARS: usize = 600;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("oracle returned status {0}")]
    Status(u16),
    #[error("oracle reply is not valid JSON: {0}")]
    MalformedReply(#[from] serde_json::Error),
    #[error("oracle reply has no content")]
    EmptyReply,
    #[error("oracle call timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Clone, PartialEq)]
pub struct JudgmentReply {
    pub score: i64,
    pub explanation: String,
}

#[async_trait]
pub trait JudgmentOracle: Send + Sync {
    /// Submit one prompt and return the raw reply content.
    async fn judge(&self, prompt: &str) -> Result<String, OracleError>;
}

/// Normalize a raw oracle reply: clamp the score to 0-100, rejoin list
/// explanations as bullet text, and truncate overlong explanations.
pub fn parse_oracle_reply(raw: &str, fallback_score: i64) -> Result<JudgmentReply, OracleError> {
    let value: Value = serde_json::from_str(raw)?;

    let score = value
        .get("score")
        .and_then(|s| s.as_i64().or_else(|| s.as_f64().map(|f| f as i64)))
        .unwrap_or(fallback_score)
        .clamp(0, 100);

    let explanation = match value.get("explanation") {
        Some(Value::Array(items)) => {
            let bullets: Vec<String> = items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.trim().to_string(),
                    other => other.to_string(),
                })
                .filter(|s| !s.is_empty())
                .map(|s| {
                    if s.starts_with('•') || s.starts_with('-') {
                        s
                    } else {
                        format!("• {s}")
                    }
                })
                .collect();
            bullets.join(" ")
        }
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "Analysis completed.".to_string(),
    };

    Ok(JudgmentReply {
        score,
        explanation: truncate_explanation(explanation),
    })
}

fn truncate_explanation(explanation: String) -> String {
    if explanation.chars().count() <= EXPLANATION_MAX_CHARS {
        return explanation;
    }
    let mut truncated: String = explanation.chars().take(EXPLANATION_MAX_CHARS - 3).collect();
    truncated.push_str("...");
    truncated
}

#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

impl OracleConfig {
    pub fn from_env() -> Self {
        let endpoint = std::env::var("HM_ORACLE_ENDPOINT")
            .unwrap_or_else(|_| "https://api.openai.com/v1/chat/completions".into());
        let api_key = std::env::var("HM_ORACLE_API_KEY").unwrap_or_default();
        let model = std::env::var("HM_ORACLE_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
        let timeout_seconds = std::env::var("HM_ORACLE_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        Self {
            endpoint,
            api_key,
            model,
            timeout: Duration::from_secs(timeout_seconds),
        }
    }
}

/// Chat-completions client used in production.
pub struct HttpJudgmentOracle {
    client: reqwest::Client,
    config: OracleConfig,
}

impl HttpJudgmentOracle {
    pub fn new(config: OracleConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_default();
        Self { client, config }
    }

    pub fn from_env() -> Self {
        Self::new(OracleConfig::from_env())
    }
}

#[async_trait]
impl JudgmentOracle for HttpJudgmentOracle {
    async fn judge(&self, prompt: &str) -> Result<String, OracleError> {
        let body = json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt },
            ],
            "temperature": 0.1,
            "max_tokens": 400,
            "response_format": { "type": "json_object" },
        });

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(OracleError::Status(status.as_u16()));
        }

        let reply: Value = response.json().await?;
        reply
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(|content| content.trim().to_string())
            .ok_or(OracleError::EmptyReply)
    }
}
