use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use common::{Error, Result};
use strategy::Decision;

use crate::analysts::Analyst;
use crate::panel::PerformanceContext;

const BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 100;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Source of generated commentary. Failures are recovered by the panel with
/// a scripted line.
#[async_trait]
pub trait TextProvider: Send + Sync {
    async fn comment(
        &self,
        analyst: Analyst,
        decision: &Decision,
        context: &PerformanceContext,
    ) -> Result<String>;
}

/// Anthropic Messages API client.
pub struct AnthropicProvider {
    api_key: String,
    model: String,
    base_url: String,
    http: Client,
}

impl AnthropicProvider {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, model, BASE_URL)
    }

    pub fn with_base_url(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Http(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }
}

/// Persona prompt for one analyst reacting to one decision.
pub fn build_prompt(analyst: Analyst, decision: &Decision, context: &PerformanceContext) -> String {
    let profile = analyst.profile();
    format!(
        "You are {name}, a judge on the talent show \"Deriv's Got Talent\", watching a live \
         trading performance.\n\
         Your persona: {style}. You love {loves}; you can't stand {hates}.\n\n\
         Performance so far:\n\
         - Action: {action}\n\
         - Price: ${price:.2}\n\
         - Score: ${pnl:.2} total P&L over {trades} acts\n\n\
         React in one or two short, punchy sentences, in character, keeping to the talent \
         show metaphor. Avoid trading jargon unless your persona would use it.",
        name = profile.name,
        style = profile.style,
        loves = profile.loves.join(", "),
        hates = profile.hates.join(", "),
        action = decision.action(),
        price = decision.price().unwrap_or(0.0),
        pnl = context.pnl,
        trades = context.trade_count,
    )
}

#[async_trait]
impl TextProvider for AnthropicProvider {
    async fn comment(
        &self,
        analyst: Analyst,
        decision: &Decision,
        context: &PerformanceContext,
    ) -> Result<String> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            messages: vec![RequestMessage {
                role: "user",
                content: build_prompt(analyst, decision, context),
            }],
        };

        debug!(analyst = %analyst, model = %self.model, "Requesting generated comment");
        let resp = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;
        if !status.is_success() {
            return Err(Error::Http(format!("HTTP {status}: {body}")));
        }
        first_text(&body)
    }
}

/// Text of the first text block in a Messages API response.
pub fn first_text(body: &str) -> Result<String> {
    let resp: MessagesResponse = serde_json::from_str(body)?;
    resp.content
        .into_iter()
        .find(|block| block.kind == "text")
        .and_then(|block| block.text)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| Error::Commentary("response contained no text block".into()))
}

// ─── Wire types ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<RequestMessage>,
}

#[derive(Serialize)]
struct RequestMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}
