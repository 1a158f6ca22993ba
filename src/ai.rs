//! AI provider client used to generate client insights.
//!
//! The provider is asked for a JSON array of `{type, title, description}`
//! objects. A missing key or any provider failure degrades to a single static
//! `info` insight; insight generation never fails the request.

use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, instrument, warn};
use utoipa::ToSchema;

use common::ClientAnalytics;
use model::entities::insight::InsightType;

use crate::config::Settings;

pub const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const API_VERSION: &str = "2023-06-01";
const MAX_INSIGHTS: usize = 5;

/// Longest a whole generation may take, retries included. Stays below the
/// router's request timeout so the fallback insight is always answered.
pub const GENERATION_BUDGET: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, Error)]
pub enum AiError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("rate limited")]
    RateLimited,
    #[error("invalid api key")]
    InvalidApiKey,
    #[error("json error: {0}")]
    Serde(String),
    #[error("missing api key: AI_API_KEY is not set")]
    MissingApiKey,
}

impl AiError {
    /// Returns true if the error is transient and should be retried.
    pub fn should_retry(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout | Self::RateLimited => true,
            Self::Http { status, .. } => (500..=599).contains(status),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    Critical,
    Opportunity,
    Warning,
    Info,
}

impl From<InsightKind> for InsightType {
    fn from(kind: InsightKind) -> Self {
        match kind {
            InsightKind::Critical => InsightType::Critical,
            InsightKind::Opportunity => InsightType::Opportunity,
            InsightKind::Warning => InsightType::Warning,
            InsightKind::Info => InsightType::Info,
        }
    }
}

impl From<InsightType> for InsightKind {
    fn from(kind: InsightType) -> Self {
        match kind {
            InsightType::Critical => InsightKind::Critical,
            InsightType::Opportunity => InsightKind::Opportunity,
            InsightType::Warning => InsightKind::Warning,
            InsightType::Info => InsightKind::Info,
        }
    }
}

/// One insight as returned by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedInsight {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub title: String,
    pub description: String,
}

impl GeneratedInsight {
    /// Placeholder stored when no insight could be generated.
    pub fn unavailable(reason: &str) -> Self {
        Self {
            kind: InsightKind::Info,
            title: "AI insights unavailable".to_string(),
            description: reason.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    content: Vec<ContentBlock>,
}

impl CompletionResponse {
    fn text(&self) -> Option<&str> {
        self.content.iter().find_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            ContentBlock::Other => None,
        })
    }
}

#[derive(Clone)]
pub struct AiClient {
    http: Client,
    api_key: String,
    api_url: String,
    model: String,
    budget: Duration,
}

impl std::fmt::Debug for AiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiClient")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("budget", &self.budget)
            .finish_non_exhaustive()
    }
}

impl AiClient {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

    pub fn from_settings(settings: &Settings) -> Result<Self, AiError> {
        let api_key = settings
            .ai_api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(AiError::MissingApiKey)?;
        Self::new(api_key, settings.ai_api_url.clone(), settings.ai_model.clone())
    }

    pub fn new(api_key: String, api_url: String, model: String) -> Result<Self, AiError> {
        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("agencyops/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AiError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            api_key,
            api_url,
            model,
            budget: GENERATION_BUDGET,
        })
    }

    /// Caps the total time of one generation. Never raised above
    /// [`GENERATION_BUDGET`].
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget.min(GENERATION_BUDGET);
        self
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Sends one prompt and returns the text of the answer, retrying
    /// transient failures.
    pub async fn ask(&self, system: &str, prompt: &str) -> Result<String, AiError> {
        let request = CompletionRequest {
            model: self.model.clone(),
            max_tokens: 2048,
            system: system.to_string(),
            messages: vec![Message {
                role: "user",
                content: prompt.to_string(),
            }],
        };

        let response = (|| async { self.send_request(&request).await })
            .retry(
                &ExponentialBuilder::default()
                    .with_min_delay(Duration::from_millis(500))
                    .with_max_delay(Duration::from_secs(10))
                    .with_max_times(3)
                    .with_jitter(),
            )
            .when(|e: &AiError| e.should_retry())
            .notify(|e, dur| {
                warn!(
                    "AI provider call failed, retrying after {:.2}s: {}",
                    dur.as_secs_f64(),
                    e
                )
            })
            .await?;

        response
            .text()
            .map(str::to_string)
            .ok_or_else(|| AiError::Serde("No text content in response".to_string()))
    }

    async fn send_request(&self, request: &CompletionRequest) -> Result<CompletionResponse, AiError> {
        let res = self
            .http
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        match res.status() {
            s if s.is_success() => res
                .json::<CompletionResponse>()
                .await
                .map_err(|e| AiError::Serde(e.to_string())),
            StatusCode::UNAUTHORIZED => Err(AiError::InvalidApiKey),
            StatusCode::TOO_MANY_REQUESTS => Err(AiError::RateLimited),
            s => {
                let status = s.as_u16();
                let body = res.text().await.unwrap_or_default();
                Err(AiError::Http { status, body })
            }
        }
    }

    /// Asks the provider for insights about a client's current numbers.
    #[instrument(skip(self, analytics), fields(client_id = analytics.client_id))]
    pub async fn insights(
        &self,
        client_name: &str,
        analytics: &ClientAnalytics,
    ) -> Result<Vec<GeneratedInsight>, AiError> {
        let prompt = build_prompt(client_name, analytics);
        let answer = self.ask(SYSTEM_PROMPT, &prompt).await?;
        parse_insights(&answer)
    }
}

const SYSTEM_PROMPT: &str = "You are a performance marketing analyst for an agency. \
Answer with a JSON array only. Each element has the keys \"type\" (one of critical, \
opportunity, warning, info), \"title\" and \"description\".";

fn build_prompt(client_name: &str, analytics: &ClientAnalytics) -> String {
    let blended = &analytics.blended;
    let mut prompt = format!(
        "Client: {}\nPeriod: {} to {}\nAd spend: {}\nAd revenue: {}\nOffline revenue: {}\n\
         Blended ROAS: {}\nROI: {}\nLeads: {}\nCost per lead: {}\n",
        client_name,
        analytics.window.start,
        analytics.window.end,
        blended.ad_spend,
        blended.ad_revenue,
        blended.offline_revenue,
        blended.roas,
        blended.roi,
        blended.ad_leads,
        analytics.totals.cpl,
    );
    if let Some(target) = analytics.target_roas {
        prompt.push_str(&format!("Target ROAS: {}\n", target));
    }
    prompt.push_str(&format!(
        "Meetings: {}\nProposals: {}\nClosed deals: {}\n",
        analytics.commercial.meetings, analytics.commercial.proposals, analytics.commercial.closed_deals
    ));
    for campaign in &analytics.campaigns {
        prompt.push_str(&format!(
            "Campaign {} ({}): spend {}, revenue {}, ROAS {}, leads {}\n",
            campaign.name, campaign.platform, campaign.spend, campaign.revenue, campaign.roas, campaign.leads
        ));
    }
    prompt.push_str("Give at most five actionable insights.");
    prompt
}

/// Parses the provider's answer into insights.
pub fn parse_insights(answer: &str) -> Result<Vec<GeneratedInsight>, AiError> {
    let json = extract_json(answer);
    if json.is_empty() {
        error!("AI provider returned an empty answer");
        return Err(AiError::Serde("Empty response".to_string()));
    }

    let mut insights: Vec<GeneratedInsight> = serde_json::from_str(json).map_err(|e| {
        error!(
            json_error = %e,
            preview = %json.chars().take(200).collect::<String>(),
            "Failed to parse insights"
        );
        AiError::Serde(e.to_string())
    })?;
    insights.retain(|i| !i.title.trim().is_empty());
    insights.truncate(MAX_INSIGHTS);

    if insights.is_empty() {
        return Err(AiError::Serde("No insights in response".to_string()));
    }
    debug!(count = insights.len(), "Parsed insights");
    Ok(insights)
}

/// Generates insights, falling back to the static placeholder whenever the
/// provider is not configured or fails.
pub async fn generate_insights(
    ai: Option<&AiClient>,
    client_name: &str,
    analytics: &ClientAnalytics,
) -> Vec<GeneratedInsight> {
    let Some(ai) = ai else {
        return vec![GeneratedInsight::unavailable(
            "AI insights are not configured. Set AI_API_KEY to enable them.",
        )];
    };

    let failure = match tokio::time::timeout(ai.budget(), ai.insights(client_name, analytics)).await {
        Ok(Ok(insights)) => return insights,
        Ok(Err(e)) => e,
        Err(_) => AiError::Timeout,
    };
    warn!("Insight generation failed: {}", failure);
    vec![GeneratedInsight::unavailable(
        "AI insights could not be generated right now. Try again later.",
    )]
}

fn map_reqwest_error(e: reqwest::Error) -> AiError {
    if e.is_timeout() {
        AiError::Timeout
    } else {
        AiError::Transport(e.to_string())
    }
}

/// Extract JSON from a string that might contain markdown code blocks
fn extract_json(text: &str) -> &str {
    let text = text.trim();

    if let Some(start) = text.find("```json") {
        let content_start = start + 7;
        if let Some(end) = text[content_start..].find("```") {
            return text[content_start..content_start + end].trim();
        }
    }

    if let Some(start) = text.find("```") {
        let content_start = start + 3;
        let content_start = text[content_start..]
            .find('\n')
            .map(|i| content_start + i + 1)
            .unwrap_or(content_start);
        if let Some(end) = text[content_start..].find("```") {
            return text[content_start..content_start + end].trim();
        }
    }

    // Fall back to the outermost array
    match (text.find('['), text.rfind(']')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}
