//! Medical-notes summarization over the Gemini `generateContent` API.
//!
//! Summaries are advisory. Every failure is turned into a placeholder
//! string so callers can show the result as-is.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

pub const NOT_CONFIGURED: &str = "Summarization API key not configured. Summary unavailable.";
pub const NO_SUMMARY: &str = "Could not generate summary.";

pub trait Summarizer: Send + Sync {
    /// Summarize free-text notes. Never fails; see the module docs.
    fn summarize(&self, text: &str) -> impl Future<Output = String> + Send;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    /// `None` disables summarization.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com".into(),
            model: "gemini-2.5-flash".into(),
            timeout_secs: 30,
        }
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Text of the first candidate, if it has any.
    fn text(self) -> Option<String> {
        let parts = self.candidates.into_iter().next()?.content?.parts;
        let text: String = parts.into_iter().filter_map(|p| p.text).collect();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

fn prompt(notes: &str) -> String {
    format!(
        "Summarize the following medical notes concisely for a quick overview. \
         Focus on the main diagnosis, treatment, and patient status. Notes: \"{notes}\""
    )
}

fn service_error(reason: impl std::fmt::Display) -> String {
    format!("Error from summarization service: {reason}")
}

pub struct GeminiSummarizer {
    client: reqwest::Client,
    config: SummarizerConfig,
}

impl GeminiSummarizer {
    pub fn new(config: SummarizerConfig) -> Self {
        if config.api_key.is_none() {
            warn!("summarization API key is not set; summaries are disabled");
        }
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

impl Summarizer for GeminiSummarizer {
    async fn summarize(&self, text: &str) -> String {
        let Some(key) = self.config.api_key.as_deref() else {
            return NOT_CONFIGURED.to_string();
        };

        let prompt = prompt(text);
        let body = GenerateRequest {
            contents: [Content {
                parts: [RequestPart { text: &prompt }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", key)])
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            // The URL carries the API key.
            .map_err(reqwest::Error::without_url);

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                error!(error = %e, "summarization request failed");
                return service_error(e);
            }
        };

        match response.json::<GenerateResponse>().await {
            Ok(parsed) => parsed.text().unwrap_or_else(|| NO_SUMMARY.to_string()),
            Err(e) => {
                let e = e.without_url();
                error!(error = %e, "summarization response could not be decoded");
                service_error(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_quotes_the_notes() {
        let p = prompt("fever, 3 days");
        assert!(p.starts_with("Summarize the following medical notes concisely"));
        assert!(p.ends_with("Notes: \"fever, 3 days\""));
    }

    #[test]
    fn first_candidate_text_is_joined() {
        let json = r#"{"candidates":[{"content":{"parts":[{"text":"Viral "},{"text":"infection."}]}},
                       {"content":{"parts":[{"text":"ignored"}]}}]}"#;
        let parsed: GenerateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.text().as_deref(), Some("Viral infection."));
    }

    #[test]
    fn empty_response_has_no_text() {
        let parsed: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.text(), None);

        let blank: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"content":{"parts":[{"text":"  "}]}}]}"#)
                .unwrap();
        assert_eq!(blank.text(), None);
    }

    #[test]
    fn endpoint_joins_base_and_model() {
        let s = GeminiSummarizer::new(SummarizerConfig {
            base_url: "http://localhost:8080/".into(),
            ..Default::default()
        });
        assert_eq!(
            s.endpoint(),
            "http://localhost:8080/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }
}
