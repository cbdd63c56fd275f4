//! Text Chunking Module
//!
//! 정제된 텍스트를 문장 경계에 맞춰 단어 수 기준 청크로 나눕니다.
//! 인접 청크는 끝 문장 몇 개를 공유(오버랩)하여 문맥이 끊기지 않게 합니다.

use std::ops::RangeInclusive;

use crate::error::FaqError;

// ============================================================================
// Chunk Configuration
// ============================================================================

/// 허용되는 청크 크기 (단어 수)
pub const CHUNK_WORDS_RANGE: RangeInclusive<usize> = 500..=3000;
/// 허용되는 오버랩 크기 (단어 수)
pub const OVERLAP_WORDS_RANGE: RangeInclusive<usize> = 0..=500;

/// 청킹 설정
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    /// 청크 최대 단어 수
    pub chunk_words: usize,
    /// 다음 청크에 반복되는 최대 단어 수
    pub overlap_words: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_words: 2000,
            overlap_words: 200,
        }
    }
}

impl ChunkConfig {
    /// 허용 범위 검사
    pub fn validate(&self) -> Result<(), FaqError> {
        if !CHUNK_WORDS_RANGE.contains(&self.chunk_words) {
            return Err(FaqError::InvalidSetting {
                name: "chunk_size",
                value: self.chunk_words,
                expected: format!("{:?}", CHUNK_WORDS_RANGE),
            });
        }
        if !OVERLAP_WORDS_RANGE.contains(&self.overlap_words) {
            return Err(FaqError::InvalidSetting {
                name: "overlap",
                value: self.overlap_words,
                expected: format!("{:?}", OVERLAP_WORDS_RANGE),
            });
        }
        if self.overlap_words >= self.chunk_words {
            return Err(FaqError::InvalidSetting {
                name: "overlap",
                value: self.overlap_words,
                expected: format!("less than chunk_size ({})", self.chunk_words),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Chunker Trait
// ============================================================================

/// 텍스트 청킹 전략 트레이트
pub trait Chunker: Send + Sync {
    /// 텍스트를 청크로 분할
    fn chunk(&self, text: &str) -> Vec<String>;

    /// 청커 이름
    fn name(&self) -> &'static str;
}

// ============================================================================
// SentenceChunker
// ============================================================================

/// 문장 단위 청커
///
/// - 문장은 `.`, `!`, `?` 뒤의 공백에서 나뉩니다
/// - 새 청크는 이전 청크의 끝 문장들 중 `overlap_words` 이내로 시작합니다
/// - 문장 하나가 `chunk_words`보다 길어도 자르지 않습니다. 앞에 오버랩 문장이
///   붙을 수 있으므로 그 청크는 `chunk_words`를 넘을 수 있습니다
pub struct SentenceChunker {
    config: ChunkConfig,
}

impl SentenceChunker {
    pub fn new(config: ChunkConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(ChunkConfig::default())
    }

    /// 청크 끝에서 오버랩 한도 안에 들어가는 문장들 (원래 순서 유지)
    fn overlap_tail<'a>(&self, sentences: &[&'a str]) -> (Vec<&'a str>, usize) {
        let mut taken = 0;
        let mut words = 0;

        for sentence in sentences.iter().rev() {
            let len = word_count(sentence);
            if words + len > self.config.overlap_words {
                break;
            }
            words += len;
            taken += 1;
        }

        (sentences[sentences.len() - taken..].to_vec(), words)
    }
}

impl Chunker for SentenceChunker {
    fn chunk(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut current_words = 0;

        for sentence in split_sentences(text) {
            let len = word_count(sentence);

            if current_words + len > self.config.chunk_words && !current.is_empty() {
                chunks.push(current.join(" "));
                let (tail, tail_words) = self.overlap_tail(&current);
                current = tail;
                current_words = tail_words;
            }

            current.push(sentence);
            current_words += len;
        }

        if !current.is_empty() {
            chunks.push(current.join(" "));
        }

        chunks
    }

    fn name(&self) -> &'static str {
        "SentenceChunker"
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn word_count(s: &str) -> usize {
    s.split_whitespace().count()
}

/// 문장 분리: 종결 부호(. ! ?) 바로 뒤의 공백 구간에서 자름
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut prev: Option<char> = None;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c.is_whitespace() && matches!(prev, Some('.' | '!' | '?')) {
            push_trimmed(&mut sentences, &text[start..i]);
            // 연속된 공백 건너뛰기
            while let Some(&(_, next)) = chars.peek() {
                if !next.is_whitespace() {
                    break;
                }
                chars.next();
            }
            start = chars.peek().map(|&(j, _)| j).unwrap_or(text.len());
            prev = None;
            continue;
        }
        prev = Some(c);
    }

    push_trimmed(&mut sentences, &text[start..]);
    sentences
}

fn push_trimmed<'a>(out: &mut Vec<&'a str>, s: &'a str) {
    let s = s.trim();
    if !s.is_empty() {
        out.push(s);
    }
}

// ============================================================================
// Factory Functions
// ============================================================================

/// 기본 청커 생성
pub fn default_chunker() -> Box<dyn Chunker> {
    Box::new(SentenceChunker::with_defaults())
}

/// 설정을 지정한 문장 청커 생성
pub fn sentence_chunker(config: ChunkConfig) -> Box<dyn Chunker> {
    Box::new(SentenceChunker::new(config))
}

// ============================================================================
// Tests
// ============================================================================
