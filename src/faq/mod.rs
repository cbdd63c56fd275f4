//! FAQ 모듈
//!
//! - prompt: 청크별 생성 프롬프트
//! - parser: 모델 응답에서 질문/답변 쌍 복구
//! - generator: 청크 순회, 실패 허용, 중복 제거를 담당하는 오케스트레이터

mod generator;
mod parser;
mod prompt;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

pub use generator::{ChunkProgress, FaqGenerator, GenerationReport, QUESTIONS_PER_CHUNK_RANGE};
pub use parser::parse_faq_response;
pub use prompt::build_prompt;

// ============================================================================
// Types
// ============================================================================

/// 질문/답변 한 쌍
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqItem {
    pub question: String,
    pub answer: String,
}

impl FaqItem {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }

    /// 중복 판정용 정규화 키
    ///
    /// 소문자화, 앞뒤 공백 제거 후 끝의 `?`, 이어서 끝의 `.`를 제거합니다.
    pub fn dedup_key(&self) -> String {
        self.question
            .to_lowercase()
            .trim()
            .trim_end_matches('?')
            .trim_end_matches('.')
            .to_string()
    }
}

/// 한 문서에서 생성된 FAQ 목록 (생성 순서 유지)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaqSet {
    /// 원본 문서 이름
    pub document: String,
    /// 생성에 사용한 모델
    pub model: String,
    pub items: Vec<FaqItem>,
}

impl FaqSet {
    pub fn new(document: impl Into<String>, model: impl Into<String>, items: Vec<FaqItem>) -> Self {
        Self {
            document: document.into(),
            model: model.into(),
            items,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// 정규화된 질문 기준 중복 제거 (처음 나온 항목 유지)
pub fn deduplicate(items: Vec<FaqItem>) -> Vec<FaqItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.dedup_key()))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
