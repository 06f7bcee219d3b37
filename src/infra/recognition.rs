//! Asynchronous client for the vision model that turns a photo of a lot into candidate items.
//!
//! - Sends the image base64-encoded together with the scan prompt.
//! - Parses the reply leniently: a reply with no readable JSON array is an empty
//!   scan, not an error.

use std::{env, sync::OnceLock, time::Duration};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use regex::Regex;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{
    money::{non_negative, parse_price},
    CandidateItem, Condition, Confidence, ItemCategory, Platform, PriceEstimates, WeightClass,
};
use crate::util::{generate_id, version};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1/";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4000;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(90);

pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
pub const BASE_URL_ENV: &str = "RECOGNITION_BASE_URL";
pub const MODEL_ENV: &str = "RECOGNITION_MODEL";

pub const SUPPORTED_MEDIA_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/webp", "image/gif"];

#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),
    #[error("image is empty")]
    EmptyImage,
    #[error("ANTHROPIC_API_KEY is not set")]
    MissingApiKey,
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("http request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("rate limited by the recognition service")]
    RateLimited,
    #[error("api error: {0}")]
    Api(String),
    #[error("no reply within {0:?}")]
    Timeout(Duration),
}

#[derive(Clone)]
pub struct RecognitionClient {
    http: Client,
    base_url: Url,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl RecognitionClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, RecognitionError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: impl Into<String>, base: &str) -> Result<Self, RecognitionError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(RecognitionError::MissingApiKey);
        }
        let base_url = Url::parse(base)?;
        let http = Client::builder().user_agent(version::user_agent()).build()?;
        Ok(Self {
            http,
            base_url,
            api_key,
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Reads the API key, and optionally the base URL and model, from the environment.
    pub fn from_env() -> Result<Self, RecognitionError> {
        let api_key = env::var(API_KEY_ENV).map_err(|_| RecognitionError::MissingApiKey)?;
        let base = env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let mut client = Self::with_base_url(api_key, &base)?;
        if let Ok(model) = env::var(MODEL_ENV) {
            if !model.trim().is_empty() {
                client.model = model;
            }
        }
        Ok(client)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Identifies every game, console and accessory in the image.
    pub async fn scan(
        &self,
        image: &[u8],
        media_type: &str,
    ) -> Result<Vec<CandidateItem>, RecognitionError> {
        if !SUPPORTED_MEDIA_TYPES.contains(&media_type) {
            return Err(RecognitionError::UnsupportedMediaType(media_type.to_string()));
        }
        if image.is_empty() {
            return Err(RecognitionError::EmptyImage);
        }

        let url = self.url("messages")?;
        let body = MessagesRequest::new(&self.model, media_type, BASE64.encode(image));
        debug!(model = %self.model, bytes = image.len(), media_type, "sending scan request");

        let request = self
            .http
            .post(url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send();

        let response = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| RecognitionError::Timeout(self.timeout))??;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("recognition service rate limited the scan");
            return Err(RecognitionError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(%status, "recognition request failed");
            return Err(RecognitionError::Api(format!("{status}: {text}")));
        }

        let reply: MessagesResponse = response.json().await?;
        let text = reply
            .text()
            .ok_or_else(|| RecognitionError::Api("reply contained no text".to_string()))?;

        let items = parse_reply(text);
        info!(count = items.len(), "scan recognised items");
        Ok(items)
    }

    fn url(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(path)
    }
}

fn scan_prompt() -> String {
    let platforms: Vec<&str> = Platform::ALL.iter().map(Platform::label).collect();
    let weights: Vec<&str> = WeightClass::ALL.iter().map(WeightClass::label).collect();
    format!(
        "Identify ALL video games, consoles, and accessories in this image. \
Return ONLY a JSON array, no other text.\n\n\
Example format:\n\
[{{\"id\":\"1\",\"name\":\"Super Mario 64\",\"platform\":\"N64\",\"type\":\"game\",\
\"condition_guess\":\"loose\",\"variant\":\"Standard\",\"loose_price\":35,\"cib_price\":80,\
\"new_price\":400,\"weight\":\"4oz\",\"confidence\":\"high\",\"notes\":\"\"}}]\n\n\
Valid platforms: {}\n\
Valid weights: {}\n\
Valid types: game, console, accessory\n\
Valid conditions: loose, cib, sealed\n\n\
Price guidelines (2025 market):\n\
- Common: $5-15\n\
- Popular: $15-40\n\
- Uncommon: $40-80\n\
- Rare: $80-200\n\
- Grails: $200+\n\n\
If you cannot identify any games, return exactly: []\n\n\
IMPORTANT: Return ONLY the JSON array. No markdown, no explanation, no code blocks.",
        platforms.join(", "),
        weights.join(", "),
    )
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: [ContentBlock<'a>; 2],
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock<'a> {
    Image { source: ImageSource<'a> },
    Text { text: String },
}

#[derive(Debug, Serialize)]
struct ImageSource<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    media_type: &'a str,
    data: String,
}

impl<'a> MessagesRequest<'a> {
    fn new(model: &'a str, media_type: &'a str, data: String) -> Self {
        Self {
            model,
            max_tokens: MAX_TOKENS,
            messages: [Message {
                role: "user",
                content: [
                    ContentBlock::Image {
                        source: ImageSource {
                            kind: "base64",
                            media_type,
                            data,
                        },
                    },
                    ContentBlock::Text {
                        text: scan_prompt(),
                    },
                ],
            }],
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ReplyBlock>,
}

#[derive(Debug, Deserialize)]
struct ReplyBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl MessagesResponse {
    fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text.as_deref())
            .filter(|text| !text.trim().is_empty())
    }
}

fn fenced_block() -> Option<&'static Regex> {
    static FENCED: OnceLock<Option<Regex>> = OnceLock::new();
    FENCED
        .get_or_init(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").ok())
        .as_ref()
}

fn bracketed_span() -> Option<&'static Regex> {
    static BRACKETED: OnceLock<Option<Regex>> = OnceLock::new();
    BRACKETED
        .get_or_init(|| Regex::new(r"(?s)\[.*\]").ok())
        .as_ref()
}

/// Extracts candidates from the model's reply text.
///
/// Tries the whole text as a JSON array, then a fenced code block, then the
/// outermost `[...]` span. Anything else yields an empty list.
pub fn parse_reply(text: &str) -> Vec<CandidateItem> {
    let entries = parse_array(text.trim())
        .filter(|entries| !entries.is_empty())
        .or_else(|| {
            fenced_block()
                .and_then(|re| re.captures(text))
                .and_then(|captures| captures.get(1))
                .and_then(|block| parse_array(block.as_str()))
                .filter(|entries| !entries.is_empty())
        })
        .or_else(|| {
            bracketed_span()
                .and_then(|re| re.find(text))
                .and_then(|span| parse_array(span.as_str()))
        })
        .unwrap_or_default();

    if entries.is_empty() {
        debug!("reply held no parseable item array");
    }

    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<CandidateDto>(entry) {
            Ok(dto) => Some(CandidateItem::from(dto)),
            Err(error) => {
                warn!(%error, "skipping unreadable scan entry");
                None
            }
        })
        .collect()
}

fn parse_array(raw: &str) -> Option<Vec<Value>> {
    serde_json::from_str::<Vec<Value>>(raw).ok()
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CandidateDto {
    #[serde(deserialize_with = "lenient_string")]
    name: String,
    #[serde(deserialize_with = "lenient_string")]
    platform: String,
    #[serde(rename = "type", deserialize_with = "lenient_string")]
    kind: String,
    #[serde(deserialize_with = "lenient_string")]
    condition_guess: String,
    #[serde(deserialize_with = "lenient_string")]
    variant: String,
    #[serde(deserialize_with = "lenient_price")]
    loose_price: f64,
    #[serde(deserialize_with = "lenient_price")]
    cib_price: f64,
    #[serde(deserialize_with = "lenient_price")]
    new_price: f64,
    #[serde(deserialize_with = "lenient_string")]
    weight: String,
    #[serde(deserialize_with = "lenient_string")]
    confidence: String,
    #[serde(deserialize_with = "lenient_string")]
    notes: String,
}

impl From<CandidateDto> for CandidateItem {
    /// Model-supplied ids are not trusted to be unique, so every candidate gets a fresh one.
    fn from(dto: CandidateDto) -> Self {
        let name = dto.name.trim();
        Self {
            id: generate_id("candidate"),
            name: if name.is_empty() { "Unknown item".to_string() } else { name.to_string() },
            platform: Platform::from_label(&dto.platform),
            category: ItemCategory::from_label(&dto.kind),
            condition: Condition::from_label(&dto.condition_guess),
            variant: dto.variant,
            prices: PriceEstimates {
                loose: non_negative(dto.loose_price),
                cib: non_negative(dto.cib_price),
                sealed: non_negative(dto.new_price),
            },
            weight: WeightClass::from_label(&dto.weight),
            confidence: Confidence::from_label(&dto.confidence),
            notes: dto.notes,
        }
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Numbers pass through, strings like `"$1,200"` are parsed, anything else is 0.
fn lenient_price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(number) => number.as_f64().unwrap_or(0.0),
        Value::String(text) => parse_price(&text),
        _ => 0.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPLY: &str = r#"[{"id":"1","name":"Super Mario 64","platform":"N64","type":"game","condition_guess":"loose","variant":"Standard","loose_price":35,"cib_price":80,"new_price":400,"weight":"4oz","confidence":"high","notes":""}]"#;

    #[test]
    fn parses_plain_array() {
        let items = parse_reply(REPLY);
        assert_eq!(items.len(), 1);
        let mario = &items[0];
        assert_eq!(mario.name, "Super Mario 64");
        assert_eq!(mario.platform, Platform::N64);
        assert_eq!(mario.category, ItemCategory::Game);
        assert_eq!(mario.condition, Condition::Loose);
        assert_eq!(mario.prices.sealed, 400.0);
        assert_eq!(mario.weight, WeightClass::Oz4);
        assert_eq!(mario.confidence, Confidence::High);
        assert!(mario.id.starts_with("candidate-"));
    }

    #[test]
    fn parses_fenced_block() {
        let reply = format!("Here you go:\n```json\n{REPLY}\n```\nEnjoy!");
        assert_eq!(parse_reply(&reply).len(), 1);
    }

    #[test]
    fn parses_bracketed_span_in_prose() {
        let reply = format!("I found these items: {REPLY} and nothing else.");
        assert_eq!(parse_reply(&reply).len(), 1);
    }

    #[test]
    fn unreadable_reply_is_an_empty_scan() {
        assert!(parse_reply("Sorry, I can't tell what is in this photo.").is_empty());
        assert!(parse_reply("[]").is_empty());
        assert!(parse_reply("[not json").is_empty());
    }

    #[test]
    fn missing_and_odd_fields_take_defaults() {
        let reply = r#"[{"name":"Mystery Console","platform":"Zapper 9000","type":"console","loose_price":-20,"cib_price":"$1,250.50","weight":"3lb"}]"#;
        let items = parse_reply(reply);
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.platform, Platform::Other);
        assert_eq!(item.category, ItemCategory::Console);
        assert_eq!(item.condition, Condition::Loose);
        assert_eq!(item.prices.loose, 0.0);
        assert_eq!(item.prices.cib, 1250.5);
        assert_eq!(item.prices.sealed, 0.0);
        assert_eq!(item.weight, WeightClass::Oz8);
        assert_eq!(item.confidence, Confidence::Medium);
    }

    #[test]
    fn non_object_entries_are_skipped() {
        let reply = format!("[1, {}]", &REPLY[1..REPLY.len() - 1]);
        assert_eq!(parse_reply(&reply).len(), 1);
    }

    #[test]
    fn prompt_lists_valid_values() {
        let prompt = scan_prompt();
        assert!(prompt.contains("Valid platforms: NES, SNES, N64"));
        assert!(prompt.contains("Valid weights: 4oz, 8oz, 12oz, 16oz, 24oz, 32oz, 48oz"));
    }

    #[test]
    fn rejects_blank_api_key() {
        assert!(matches!(
            RecognitionClient::new("  "),
            Err(RecognitionError::MissingApiKey)
        ));
    }

    #[tokio::test]
    async fn rejects_unsupported_media_before_sending() {
        let client = RecognitionClient::with_base_url("key", "http://127.0.0.1:9/").unwrap();
        let result = client.scan(b"GIF89a", "image/bmp").await;
        assert!(matches!(result, Err(RecognitionError::UnsupportedMediaType(_))));

        let result = client.scan(&[], "image/png").await;
        assert!(matches!(result, Err(RecognitionError::EmptyImage)));
    }
}
