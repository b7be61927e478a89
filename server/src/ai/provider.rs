//! Move provider abstraction and the chat-completions implementation.

use async_trait::async_trait;
use chess::{parse_promotion, parse_square, PieceColor};
use cozy_chess::{Piece, Square};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::personas::{build_prompt, Personality, MAX_COMMENT_CHARS};
use crate::config::AiConfig;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AiError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("could not parse reply: {0}")]
    Parse(String),
    #[error("provider timed out")]
    Timeout,
    #[error("no legal moves available")]
    NoLegalMoves,
    #[error("provider is not configured: {0}")]
    Config(String),
}

/// Everything a provider needs to propose a move.
#[derive(Debug, Clone)]
pub struct MoveRequest {
    pub fen: String,
    pub side: PieceColor,
    /// Legal moves in SAN.
    pub legal_moves: Vec<String>,
    pub bot_name: String,
    pub personality: Personality,
    pub recent_comments: Vec<String>,
}

/// A candidate move with flavor text. The move may be illegal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposedMove {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Piece>,
    pub comment: String,
}

/// Source of AI move proposals.
#[async_trait]
pub trait MoveProvider: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &'static str;

    async fn propose(&self, model: &str, request: &MoveRequest) -> Result<ProposedMove, AiError>;
}

/// Parser for replies of the form `e7 e5 comment`.
#[derive(Debug, Clone)]
pub struct ReplyParser {
    pattern: Regex,
}

impl ReplyParser {
    pub fn new() -> Result<Self, AiError> {
        let pattern = Regex::new(r"^([a-h][1-8])\s*-?\s*([a-h][1-8])([qrbnQRBN])?(?:\s+(.*))?$")
            .map_err(|e| AiError::Config(e.to_string()))?;
        Ok(Self { pattern })
    }

    pub fn parse(&self, reply: &str) -> Result<ProposedMove, AiError> {
        let line = reply
            .lines()
            .map(|l| l.trim().trim_matches('`').trim())
            .find(|l| !l.is_empty())
            .unwrap_or_default();
        let caps = self
            .pattern
            .captures(line)
            .ok_or_else(|| AiError::Parse(format!("unexpected reply {line:?}")))?;

        let square = |i: usize| {
            caps.get(i)
                .and_then(|m| parse_square(m.as_str()))
                .ok_or_else(|| AiError::Parse(format!("bad square in {line:?}")))
        };
        let from = square(1)?;
        let to = square(2)?;
        let promotion = caps
            .get(3)
            .and_then(|m| parse_promotion(&m.as_str().to_ascii_lowercase()));
        let comment = caps
            .get(4)
            .map(|m| clean_comment(m.as_str()))
            .unwrap_or_default();

        Ok(ProposedMove {
            from,
            to,
            promotion,
            comment,
        })
    }
}

/// Strip surrounding quotes and cap the length.
pub fn clean_comment(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .chars()
        .take(MAX_COMMENT_CHARS)
        .collect()
}

/// OpenAI-compatible chat completions endpoint (OpenRouter by default).
pub struct OpenRouterProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    parser: ReplyParser,
}

impl OpenRouterProvider {
    /// Returns None when no API key is configured.
    pub fn from_config(config: &AiConfig) -> Result<Option<Self>, AiError> {
        let Some(api_key) = config.api_key.clone() else {
            return Ok(None);
        };
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AiError::Config(e.to_string()))?;
        Ok(Some(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            parser: ReplyParser::new()?,
        }))
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<CompletionMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct CompletionMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionReply,
}

#[derive(Debug, Deserialize)]
struct CompletionReply {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl MoveProvider for OpenRouterProvider {
    fn name(&self) -> &'static str {
        "openrouter"
    }

    async fn propose(&self, model: &str, request: &MoveRequest) -> Result<ProposedMove, AiError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = CompletionRequest {
            model,
            messages: vec![CompletionMessage {
                role: "user",
                content: build_prompt(request),
            }],
            max_tokens: 150,
            temperature: 0.9,
        };

        debug!(model, "Requesting move from {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AiError::Timeout
                } else {
                    AiError::Http(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Status { status, body });
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| AiError::Parse(e.to_string()))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AiError::Parse("empty completion".into()))?;

        debug!(model, reply = %content.trim(), "Provider replied");
        self.parser.parse(&content)
    }
}
