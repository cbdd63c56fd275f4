//! 도메인 에러 타입
//!
//! 호출자가 분기해야 하는 실패만 여기 정의합니다.
//! I/O, HTTP 등 나머지는 `anyhow::Result`로 컨텍스트와 함께 전파합니다.

use thiserror::Error;

/// FAQ 생성 과정의 도메인 에러
#[derive(Debug, Error)]
pub enum FaqError {
    /// 지원하지 않는 문서 형식
    #[error("Unsupported document format: {0} (supported: pdf, txt, md)")]
    UnsupportedFormat(String),

    /// 크기 제한 초과
    #[error("File too large: {path} ({size} bytes, limit {limit} bytes)")]
    FileTooLarge { path: String, size: u64, limit: u64 },

    /// 추출/정제 후 텍스트가 비어 있음
    #[error("No text extracted from document: {0}")]
    NoText(String),

    /// 모델 응답이 비어 있음
    #[error("Empty response from model")]
    EmptyResponse,

    /// 모델 응답이 JSON이 아님
    #[error("Failed to parse model response as JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// JSON이지만 배열이 아님
    #[error("Model response is not a JSON array")]
    NotAnArray,

    /// 모든 청크에서 FAQ를 얻지 못함
    #[error("No FAQs generated for {0}")]
    NoFaqs(String),

    /// 설정값 범위 오류
    #[error("Invalid setting `{name}`: {value} (expected {expected})")]
    InvalidSetting {
        name: &'static str,
        value: usize,
        expected: String,
    },

    /// API 키 없음
    #[error(
        "API key not found. Pass --api-key or set GEMINI_API_KEY / GOOGLE_AI_API_KEY.\n\
         Get your API key at: https://aistudio.google.com/apikey"
    )]
    MissingApiKey,
}

impl FaqError {
    /// 모델 응답 파싱 단계의 실패인지 여부
    ///
    /// 파싱 실패는 warn, 그 외 API 실패는 error 레벨로 기록합니다.
    pub fn is_parse_failure(&self) -> bool {
        matches!(
            self,
            FaqError::EmptyResponse | FaqError::InvalidJson(_) | FaqError::NotAnArray
        )
    }
}
