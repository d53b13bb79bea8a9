//! Document analysis via an OpenAI-compatible chat-completions API
//!
//! The analyzer is the metered external operation: one call consumes one
//! unit of the caller's monthly quota. It never touches the usage counters
//! itself; the analyze handler records consumption after a successful call.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

use crate::config;

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("Analysis request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Analysis API returned status {0}")]
    BadStatus(u16),

    #[error("Analysis API returned no choices")]
    EmptyResponse,
}

/// Structured result of one document analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub summary: String,
    pub keywords: Vec<String>,
    pub key_points: Vec<String>,
    pub action_items: Vec<String>,
}

// Chat-completions response shape (only the parts we read)
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

// The model is asked for camelCase keys; tolerate missing fields
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAnalysis {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    key_points: Vec<String>,
    #[serde(default)]
    action_items: Vec<String>,
}

/// Client for the document-analysis provider
pub struct DocumentAnalyzer {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    max_prompt_chars: usize,
}

impl DocumentAnalyzer {
    /// Build an analyzer from configuration; fails fast when no API key is
    /// configured so the handler can surface a clear 503
    pub fn from_config() -> Result<Self, AnalyzerError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or(AnalyzerError::MissingApiKey)?;

        let analyzer_config = &config::config().analyzer;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(analyzer_config.request_timeout_secs))
            .build()
            .map_err(|e| AnalyzerError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            base_url: analyzer_config.base_url.clone(),
            api_key,
            model: analyzer_config.model.clone(),
            max_prompt_chars: analyzer_config.max_prompt_chars,
        })
    }

    /// Analyze document text: summary, keywords, key points, action items
    pub async fn analyze(&self, text: &str) -> Result<AnalysisResult, AnalyzerError> {
        let body = json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": "You are a document analysis assistant. Provide clear, concise analysis in JSON format."
                },
                {
                    "role": "user",
                    "content": self.build_prompt(text)
                }
            ],
            "temperature": 0.5,
            "max_tokens": 1000
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            error!("Analysis API returned {}", status);
            return Err(AnalyzerError::BadStatus(status.as_u16()));
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .ok_or(AnalyzerError::EmptyResponse)?;

        debug!(chars = content.len(), "received analysis response");
        Ok(parse_analysis(content))
    }

    fn build_prompt(&self, text: &str) -> String {
        // Truncate to keep within the provider's context window
        let excerpt: String = text.chars().take(self.max_prompt_chars).collect();

        format!(
            r#"Analyze the following document and provide:
1. A concise summary (2-3 sentences)
2. Key keywords (5-8 words)
3. Main key points (3-5 bullet points)
4. Action items if any (tasks or next steps)

Document:
{excerpt}

Respond in JSON format:
{{
  "summary": "...",
  "keywords": ["...", "..."],
  "keyPoints": ["...", "..."],
  "actionItems": ["...", "..."]
}}"#
        )
    }
}

/// Parse the model's reply into an AnalysisResult, tolerating fenced code
/// blocks and missing fields; a reply that is not JSON at all degrades to
/// empty defaults rather than failing the whole upload
fn parse_analysis(content: &str) -> AnalysisResult {
    let trimmed = content.trim();
    let stripped = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    let raw: RawAnalysis = serde_json::from_str(stripped).unwrap_or_default();

    AnalysisResult {
        summary: raw.summary.unwrap_or_else(|| "No summary available".to_string()),
        keywords: raw.keywords,
        key_points: raw.key_points,
        action_items: raw.action_items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_reply() {
        let content = r#"{
            "summary": "Quarterly report on infrastructure spending.",
            "keywords": ["budget", "infrastructure"],
            "keyPoints": ["Spending rose 12%"],
            "actionItems": ["Review vendor contracts"]
        }"#;

        let result = parse_analysis(content);
        assert_eq!(result.summary, "Quarterly report on infrastructure spending.");
        assert_eq!(result.keywords, vec!["budget", "infrastructure"]);
        assert_eq!(result.key_points, vec!["Spending rose 12%"]);
        assert_eq!(result.action_items, vec!["Review vendor contracts"]);
    }

    #[test]
    fn parses_fenced_reply() {
        let content = "```json\n{\"summary\": \"Fenced.\", \"keywords\": []}\n```";
        let result = parse_analysis(content);
        assert_eq!(result.summary, "Fenced.");
        assert!(result.keywords.is_empty());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let result = parse_analysis(r#"{"keywords": ["only"]}"#);
        assert_eq!(result.summary, "No summary available");
        assert_eq!(result.keywords, vec!["only"]);
        assert!(result.key_points.is_empty());
    }

    #[test]
    fn non_json_reply_degrades_to_defaults() {
        let result = parse_analysis("Sorry, I cannot help with that.");
        assert_eq!(result.summary, "No summary available");
        assert!(result.keywords.is_empty());
        assert!(result.action_items.is_empty());
    }
}
