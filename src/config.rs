//! 설정
//!
//! 기본값 → 환경변수 → CLI 플래그 순으로 덮어씁니다.

use std::path::PathBuf;

use crate::chunker::ChunkConfig;
use crate::error::FaqError;
use crate::export::ExportFormat;
use crate::faq::QUESTIONS_PER_CHUNK_RANGE;
use crate::gemini::DEFAULT_MODEL;

/// FAQ 생성 설정
#[derive(Debug, Clone)]
pub struct FaqConfig {
    /// Gemini 모델 이름
    pub model: String,
    /// 청킹 설정
    pub chunk: ChunkConfig,
    /// 청크당 질문 수
    pub questions_per_chunk: usize,
    /// 출력 디렉토리
    pub output_dir: PathBuf,
    /// 출력 형식
    pub formats: Vec<ExportFormat>,
}

impl Default for FaqConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            chunk: ChunkConfig::default(),
            questions_per_chunk: 5,
            output_dir: PathBuf::from("."),
            formats: ExportFormat::ALL.to_vec(),
        }
    }
}

impl FaqConfig {
    /// 환경변수 적용
    ///
    /// `SMART_FAQ_MODEL`, `SMART_FAQ_CHUNK_SIZE`, `SMART_FAQ_OVERLAP`,
    /// `SMART_FAQ_QUESTIONS`, `SMART_FAQ_OUTPUT_DIR`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let default = Self::default();
        let number = |key: &str, fallback: usize| {
            lookup(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(fallback)
        };

        Self {
            model: lookup("SMART_FAQ_MODEL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(default.model),
            chunk: ChunkConfig {
                chunk_words: number("SMART_FAQ_CHUNK_SIZE", default.chunk.chunk_words),
                overlap_words: number("SMART_FAQ_OVERLAP", default.chunk.overlap_words),
            },
            questions_per_chunk: number("SMART_FAQ_QUESTIONS", default.questions_per_chunk),
            output_dir: lookup("SMART_FAQ_OUTPUT_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(default.output_dir),
            formats: default.formats,
        }
    }

    /// 범위 검사
    pub fn validate(&self) -> Result<(), FaqError> {
        self.chunk.validate()?;

        if !QUESTIONS_PER_CHUNK_RANGE.contains(&self.questions_per_chunk) {
            return Err(FaqError::InvalidSetting {
                name: "questions",
                value: self.questions_per_chunk,
                expected: format!("{:?}", QUESTIONS_PER_CHUNK_RANGE),
            });
        }
        Ok(())
    }
}
