//! Gemini 모듈 - generateContent API를 통한 텍스트 생성
//!
//! FAQ 생성기가 의존하는 `TextGenerator` 트레이트와
//! Google Gemini 구현체를 제공합니다.
//!
//! ## 사용법
//! ```rust,ignore
//! let client = GeminiClient::new(api_key, DEFAULT_MODEL)?;
//! let text = client.generate("Hello").await?;
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::FaqError;

// ============================================================================
// TextGenerator Trait
// ============================================================================

/// 텍스트 생성 프로바이더 트레이트
///
/// 프롬프트 하나를 보내고 모델의 텍스트 응답을 받습니다.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// 프롬프트로 텍스트 생성 (응답이 없으면 빈 문자열)
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// 사용 중인 모델 이름
    fn model(&self) -> &str;
}

// ============================================================================
// Models
// ============================================================================

/// 기본 모델
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// 지원 모델 목록
pub const SUPPORTED_MODELS: &[&str] = &["gemini-2.5-flash", "gemini-1.5-flash", "gemini-1.5-pro"];

/// 지원 목록에 있는 모델인지 확인
pub fn is_supported_model(model: &str) -> bool {
    SUPPORTED_MODELS.contains(&model)
}

// ============================================================================
// Google Gemini Client
// ============================================================================

/// 기본 API 베이스 URL
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Rate Limiter 설정 (Gemini 무료 티어: 60 RPM)
const RATE_LIMIT_RPM: u32 = 60;
const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);
/// 호출 간 최소 딜레이 (청크 사이 1초)
const MIN_DELAY: Duration = Duration::from_millis(1000);
/// 429/네트워크 에러 시 최대 재시도 횟수
const MAX_RETRIES: u32 = 3;
/// 재시도 시 초기 백오프
const INITIAL_BACKOFF: Duration = Duration::from_millis(2000);
/// 요청 타임아웃
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// 생성 파라미터
#[derive(Debug, Clone, Serialize)]
pub struct GenerationConfig {
    pub temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    pub max_output_tokens: u32,
    #[serde(rename = "topP")]
    pub top_p: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_output_tokens: 2500,
            top_p: 0.95,
        }
    }
}

/// Google Gemini generateContent 클라이언트
#[derive(Debug)]
pub struct GeminiClient {
    api_key: String,
    model: String,
    base_url: String,
    generation: GenerationConfig,
    client: reqwest::Client,
    rate_limiter: Arc<Mutex<RateLimiter>>,
    initial_backoff: Duration,
}

/// 최소 딜레이 + 윈도우 기반 Rate Limiter
#[derive(Debug)]
struct RateLimiter {
    requests: Vec<Instant>,
    max_requests: u32,
    window: Duration,
    min_delay: Duration,
    last_request: Option<Instant>,
}

impl RateLimiter {
    fn new(max_requests: u32, window: Duration, min_delay: Duration) -> Self {
        Self {
            requests: Vec::new(),
            max_requests,
            window,
            min_delay,
            last_request: None,
        }
    }

    /// 요청 가능할 때까지 대기 후 요청 기록
    async fn acquire(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_delay {
                let wait_time = self.min_delay - elapsed;
                tracing::debug!("Min delay: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        let now = Instant::now();
        self.requests.retain(|&t| now.duration_since(t) < self.window);

        if self.requests.len() >= self.max_requests as usize {
            if let Some(&oldest) = self.requests.first() {
                let wait_time = self.window.saturating_sub(now.duration_since(oldest));
                if !wait_time.is_zero() {
                    tracing::debug!("Rate limit reached, waiting {:?}", wait_time);
                    tokio::time::sleep(wait_time).await;
                }
                let now = Instant::now();
                self.requests.retain(|&t| now.duration_since(t) < self.window);
            }
        }

        let now = Instant::now();
        self.requests.push(now);
        self.last_request = Some(now);
    }
}

impl GeminiClient {
    /// 새 클라이언트 생성 (기본 베이스 URL)
    pub fn new(api_key: String, model: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, model, DEFAULT_BASE_URL)
    }

    /// 베이스 URL을 지정하여 생성 (프록시, 호환 게이트웨이 등)
    pub fn with_base_url(
        api_key: String,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        let model: String = model.into();
        let base_url: String = base_url.into();
        if model.trim().is_empty() {
            anyhow::bail!("Model name must not be empty");
        }
        if !is_supported_model(&model) {
            tracing::warn!(
                "Model '{}' is not in the supported list ({}); trying anyway",
                model,
                SUPPORTED_MODELS.join(", ")
            );
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            generation: GenerationConfig::default(),
            client,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(
                RATE_LIMIT_RPM,
                RATE_LIMIT_WINDOW,
                MIN_DELAY,
            ))),
            initial_backoff: INITIAL_BACKOFF,
        })
    }

    /// 생성 파라미터 교체
    pub fn with_generation_config(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    /// 재시도 간격과 호출 간 최소 딜레이 조정
    #[cfg(test)]
    fn with_pacing(mut self, initial_backoff: Duration, min_delay: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self.rate_limiter = Arc::new(Mutex::new(RateLimiter::new(
            RATE_LIMIT_RPM,
            RATE_LIMIT_WINDOW,
            min_delay,
        )));
        self
    }

    /// generateContent 엔드포인트
    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    /// 연결 테스트
    ///
    /// "Hello" 프롬프트를 보내 텍스트가 돌아오는지 확인합니다.
    pub async fn check_connection(&self) -> Result<()> {
        let text = self
            .request(&GenerateRequest::new("Hello", None))
            .await
            .with_context(|| format!("Connection test failed for model {}", self.model))?;

        if text.trim().is_empty() {
            anyhow::bail!("Connection test for {} returned no text", self.model);
        }
        Ok(())
    }

    /// 재시도/레이트 리밋을 포함한 요청 수행
    ///
    /// 429와 네트워크 에러만 재시도하고, 그 외 비정상 응답은 즉시 실패합니다.
    async fn request(&self, request: &GenerateRequest) -> Result<String> {
        let url = self.endpoint();
        let total_attempts = MAX_RETRIES + 1;
        let mut last_error: Option<anyhow::Error> = None;

        for attempt in 0..total_attempts {
            {
                let mut limiter = self.rate_limiter.lock().await;
                limiter.acquire().await;
            }

            let backoff = self.initial_backoff * 2u32.pow(attempt);

            // API 키는 URL이 아닌 헤더로 전송
            let response = match self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(request)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    last_error = Some(anyhow::anyhow!("Failed to send Gemini request: {}", e));
                    if attempt < MAX_RETRIES {
                        tracing::warn!(
                            "Request failed, retrying in {:?} (attempt {}/{})",
                            backoff,
                            attempt + 1,
                            total_attempts
                        );
                        tokio::time::sleep(backoff).await;
                        continue;
                    }
                    tracing::warn!(
                        "Request failed, giving up (attempt {}/{})",
                        attempt + 1,
                        total_attempts
                    );
                    break;
                }
            };

            let status = response.status();
            let body = response
                .text()
                .await
                .context("Failed to read response body")?;

            if status.is_success() {
                let parsed: GenerateResponse =
                    serde_json::from_str(&body).context("Failed to parse Gemini response")?;
                return Ok(parsed.text());
            }

            if status.as_u16() != 429 {
                return Err(api_error(status, &body));
            }

            last_error = Some(anyhow::anyhow!("Rate limit exceeded (429)"));
            if attempt < MAX_RETRIES {
                tracing::warn!(
                    "Rate limit hit (429), backing off {:?} (attempt {}/{})",
                    backoff,
                    attempt + 1,
                    total_attempts
                );
                tokio::time::sleep(backoff).await;
            } else {
                tracing::warn!(
                    "Rate limit hit (429), giving up (attempt {}/{})",
                    attempt + 1,
                    total_attempts
                );
            }
        }

        Err(last_error
            .unwrap_or_else(|| anyhow::anyhow!("Gemini request failed after {} retries", MAX_RETRIES)))
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest::new(prompt, Some(self.generation.clone()));
        self.request(&request).await
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// 비정상 응답을 에러로 변환 (Gemini 에러 본문이면 메시지 추출)
fn api_error(status: reqwest::StatusCode, body: &str) -> anyhow::Error {
    match serde_json::from_str::<GeminiError>(body) {
        Ok(error) => anyhow::anyhow!(
            "Gemini API error ({}): {}",
            error.error.status,
            error.error.message
        ),
        Err(_) => anyhow::anyhow!("Gemini API error ({}): {}", status, body),
    }
}

// ============================================================================
// API Types
// ============================================================================

/// generateContent 요청 본문
/// source: https://ai.google.dev/api/generate-content
#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

impl GenerateRequest {
    fn new(prompt: &str, generation_config: Option<GenerationConfig>) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    text: Option<String>,
}

/// generateContent 응답
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

impl GenerateResponse {
    /// 첫 번째 후보의 텍스트 파트를 이어 붙임
    fn text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// Gemini API 에러 응답
#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
    #[serde(default)]
    status: String,
}

// ============================================================================
// API Key Management
// ============================================================================

const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_AI_API_KEY"];

/// API 키 결정
///
/// 우선순위:
/// 1. 명시적으로 전달된 키 (`--api-key`)
/// 2. `GEMINI_API_KEY` 환경변수
/// 3. `GOOGLE_AI_API_KEY` 환경변수
pub fn resolve_api_key(explicit: Option<&str>) -> Result<String, FaqError> {
    resolve_api_key_with(explicit, |var| std::env::var(var).ok())
}

fn resolve_api_key_with(
    explicit: Option<&str>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, FaqError> {
    if let Some(key) = explicit.map(str::trim).filter(|k| !k.is_empty()) {
        return Ok(key.to_string());
    }

    for var in API_KEY_VARS {
        if let Some(key) = lookup(var).filter(|k| !k.trim().is_empty()) {
            tracing::debug!("Using API key from {}", var);
            return Ok(key.trim().to_string());
        }
    }

    Err(FaqError::MissingApiKey)
}

/// 베이스 URL (`GEMINI_API_BASE` 환경변수로 변경 가능)
pub fn api_base_from_env() -> String {
    std::env::var("GEMINI_API_BASE")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
}

// ============================================================================
// Tests
// ============================================================================
