use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AiError;

/// Where the backend's AI proxy lives.
#[derive(Clone, Debug)]
pub struct AiProxyConfig {
    pub base_url: String,
}

impl AiProxyConfig {
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/api/gemini-proxy", self.base_url)
    }
}

/// Sends free-form prompts to the backend proxy and returns the generated text.
#[derive(Clone)]
pub struct AiProxyClient {
    client: Client,
    config: Option<AiProxyConfig>,
}

impl AiProxyClient {
    #[must_use]
    pub fn new(config: Option<AiProxyConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    /// Generate text from a prompt.
    ///
    /// # Errors
    ///
    /// Returns `AiError` when the client is disabled, the prompt is blank,
    /// the proxy reports a failure, or the response carries no text.
    pub async fn generate(&self, prompt: &str) -> Result<String, AiError> {
        let config = self.config.as_ref().ok_or(AiError::Disabled)?;
        if prompt.trim().is_empty() {
            return Err(AiError::EmptyPrompt);
        }

        let url = config.endpoint();
        tracing::debug!(%url, prompt_len = prompt.len(), "POST AI prompt");
        let response = self
            .client
            .post(url)
            .json(&ProxyRequest { prompt })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ProxyError>()
                .await
                .ok()
                .and_then(ProxyError::message)
                .unwrap_or_else(|| "unknown AI service error".to_owned());
            tracing::warn!(%status, %message, "AI proxy failed");
            return Err(AiError::Proxy { status, message });
        }

        let body: GenerateResponse = response.json().await?;
        body.first_text().ok_or(AiError::EmptyResponse)
    }
}

#[derive(Debug, Serialize)]
struct ProxyRequest<'a> {
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct ProxyError {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    details: Option<Value>,
}

impl ProxyError {
    // Upstream detail first, then the proxy's own summary.
    fn message(self) -> Option<String> {
        self.details
            .as_ref()
            .and_then(|details| details.pointer("/error/message"))
            .and_then(Value::as_str)
            .map(str::to_owned)
            .or(self.error)
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateResponse {
    fn first_text(self) -> Option<String> {
        let text = self
            .candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text?;
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_owned())
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

/// Split a bulleted AI reply into its items.
#[must_use]
pub fn parse_suggestions(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.trim().trim_start_matches(['-', '*']).trim())
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggestions_drop_bullets_and_blank_lines() {
        let text = "- Review fractions\n\n* Practise 10 problems daily\n   plain line  \n-\n";
        assert_eq!(
            parse_suggestions(text),
            ["Review fractions", "Practise 10 problems daily", "plain line"]
        );
    }

    #[test]
    fn first_candidate_text_is_extracted() {
        let body: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"  Photosynthesis uses light. "}]}},
                               {"content":{"parts":[{"text":"ignored"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(body.first_text().as_deref(), Some("Photosynthesis uses light."));
    }

    #[test]
    fn empty_candidates_yield_nothing() {
        let body: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(body.first_text().is_none());
        let body: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"content":{"parts":[{"text":"  "}]}}]}"#)
                .unwrap();
        assert!(body.first_text().is_none());
    }

    #[test]
    fn proxy_error_prefers_upstream_detail() {
        let err: ProxyError = serde_json::from_str(
            r#"{"error":"Failed to communicate with the AI service.",
                "details":{"error":{"message":"API key not valid"}}}"#,
        )
        .unwrap();
        assert_eq!(err.message().as_deref(), Some("API key not valid"));

        let err: ProxyError =
            serde_json::from_str(r#"{"error":"No prompt provided.","details":"n/a"}"#).unwrap();
        assert_eq!(err.message().as_deref(), Some("No prompt provided."));
    }

    #[test]
    fn endpoint_is_joined_under_api() {
        let config = AiProxyConfig::new("http://localhost:5000/");
        assert_eq!(config.endpoint(), "http://localhost:5000/api/gemini-proxy");
    }

    #[tokio::test]
    async fn disabled_client_refuses_prompts() {
        let client = AiProxyClient::new(None);
        assert!(!client.enabled());
        assert!(matches!(client.generate("hi").await, Err(AiError::Disabled)));
    }

    #[tokio::test]
    async fn blank_prompt_is_rejected_before_sending() {
        let client = AiProxyClient::new(Some(AiProxyConfig::new("http://127.0.0.1:9")));
        assert!(matches!(client.generate("  ").await, Err(AiError::EmptyPrompt)));
    }
}
