//! FAQ 생성 오케스트레이터
//!
//! 청크를 순서대로 모델에 보내고, 청크 단위 실패는 기록만 한 채 계속 진행합니다.
//! 전체 결과는 중복 제거 후 `FaqSet`으로 묶습니다.

use std::ops::RangeInclusive;

use anyhow::Result;

use super::{build_prompt, deduplicate, parse_faq_response, FaqItem, FaqSet};
use crate::error::FaqError;
use crate::gemini::TextGenerator;

/// 청크당 질문 수 허용 범위
pub const QUESTIONS_PER_CHUNK_RANGE: RangeInclusive<usize> = 3..=8;

/// 청크 하나의 처리 결과 (진행 표시용)
#[derive(Debug, Clone)]
pub struct ChunkProgress {
    /// 1부터 시작
    pub chunk_num: usize,
    pub total_chunks: usize,
    /// 성공 시 얻은 FAQ 수, 실패 시 에러 메시지
    pub outcome: std::result::Result<usize, String>,
}

/// 문서 하나의 생성 결과
#[derive(Debug, Clone)]
pub struct GenerationReport {
    /// 중복 제거된 FAQ
    pub faqs: FaqSet,
    pub chunks_total: usize,
    pub chunks_failed: usize,
    /// 중복 제거 전 FAQ 수
    pub raw_count: usize,
}

impl GenerationReport {
    /// 중복으로 제거된 항목 수
    pub fn duplicates_removed(&self) -> usize {
        self.raw_count - self.faqs.len()
    }
}

/// FAQ 생성기
pub struct FaqGenerator {
    generator: Box<dyn TextGenerator>,
    questions_per_chunk: usize,
}

impl FaqGenerator {
    /// 생성기 생성 (`questions_per_chunk`는 3..=8)
    pub fn new(
        generator: Box<dyn TextGenerator>,
        questions_per_chunk: usize,
    ) -> std::result::Result<Self, FaqError> {
        if !QUESTIONS_PER_CHUNK_RANGE.contains(&questions_per_chunk) {
            return Err(FaqError::InvalidSetting {
                name: "questions",
                value: questions_per_chunk,
                expected: format!("{:?}", QUESTIONS_PER_CHUNK_RANGE),
            });
        }

        Ok(Self {
            generator,
            questions_per_chunk,
        })
    }

    pub fn model(&self) -> &str {
        self.generator.model()
    }

    /// 청크 하나에서 FAQ 생성
    pub async fn generate_chunk(
        &self,
        chunk: &str,
        chunk_num: usize,
        total_chunks: usize,
    ) -> Result<Vec<FaqItem>> {
        let prompt = build_prompt(chunk, chunk_num, total_chunks, self.questions_per_chunk);
        let response = self.generator.generate(&prompt).await?;
        Ok(parse_faq_response(&response)?)
    }

    /// 모든 청크에서 FAQ 생성
    pub async fn generate(&self, document: &str, chunks: &[String]) -> Result<GenerationReport> {
        self.generate_with_progress(document, chunks, |_| {}).await
    }

    /// 모든 청크에서 FAQ 생성 (청크마다 콜백 호출)
    ///
    /// 실패한 청크는 건너뜁니다. FAQ가 하나도 없으면 `FaqError::NoFaqs`.
    pub async fn generate_with_progress<F>(
        &self,
        document: &str,
        chunks: &[String],
        mut on_chunk: F,
    ) -> Result<GenerationReport>
    where
        F: FnMut(&ChunkProgress),
    {
        let total_chunks = chunks.len();
        let mut all_faqs = Vec::new();
        let mut chunks_failed = 0;

        for (i, chunk) in chunks.iter().enumerate() {
            let chunk_num = i + 1;
            tracing::debug!("Generating FAQs for chunk {}/{}", chunk_num, total_chunks);

            let outcome = match self.generate_chunk(chunk, chunk_num, total_chunks).await {
                Ok(faqs) => {
                    tracing::info!("Chunk {}/{}: {} FAQs", chunk_num, total_chunks, faqs.len());
                    let count = faqs.len();
                    all_faqs.extend(faqs);
                    Ok(count)
                }
                Err(e) => {
                    chunks_failed += 1;
                    let parse_failure = e
                        .downcast_ref::<FaqError>()
                        .map(FaqError::is_parse_failure)
                        .unwrap_or(false);
                    if parse_failure {
                        tracing::warn!("Chunk {}: could not parse response: {}", chunk_num, e);
                    } else {
                        tracing::error!("Chunk {}: {:#}", chunk_num, e);
                    }
                    Err(e.to_string())
                }
            };

            on_chunk(&ChunkProgress {
                chunk_num,
                total_chunks,
                outcome,
            });
        }

        let raw_count = all_faqs.len();
        let unique = deduplicate(all_faqs);

        if unique.is_empty() {
            return Err(FaqError::NoFaqs(document.to_string()).into());
        }

        tracing::info!(
            "{}: {} unique FAQs ({} duplicates removed, {}/{} chunks failed)",
            document,
            unique.len(),
            raw_count - unique.len(),
            chunks_failed,
            total_chunks
        );

        Ok(GenerationReport {
            faqs: FaqSet::new(document, self.model(), unique),
            chunks_total: total_chunks,
            chunks_failed,
            raw_count,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// 미리 정한 응답을 순서대로 돌려주는 모의 생성기
    struct ScriptedGenerator {
        responses: Mutex<VecDeque<Result<String>>>,
        prompts: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedGenerator {
        fn new(responses: Vec<Result<String>>) -> (Self, Arc<Mutex<Vec<String>>>) {
            let prompts = Arc::new(Mutex::new(Vec::new()));
            let generator = Self {
                responses: Mutex::new(responses.into()),
                prompts: prompts.clone(),
            };
            (generator, prompts)
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(String::new()))
        }

        fn model(&self) -> &str {
            "mock-model"
        }
    }

    fn ok(s: &str) -> Result<String> {
        Ok(s.to_string())
    }

    fn chunks(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("Chunk text {}.", i)).collect()
    }

    #[test]
    fn test_questions_range() {
        let (g, _) = ScriptedGenerator::new(vec![]);
        assert!(FaqGenerator::new(Box::new(g), 2).is_err());
        let (g, _) = ScriptedGenerator::new(vec![]);
        assert!(FaqGenerator::new(Box::new(g), 9).is_err());
        let (g, _) = ScriptedGenerator::new(vec![]);
        assert!(FaqGenerator::new(Box::new(g), 5).is_ok());
    }

    #[tokio::test]
    async fn test_generate_collects_and_deduplicates() {
        let (g, prompts) = ScriptedGenerator::new(vec![
            ok(r#"[{"question": "What is A?", "answer": "A is first."},
                   {"question": "What is B?", "answer": "B is second."}]"#),
            ok("```json\n[{\"question\": \"what is a\", \"answer\": \"dup\"},\
                {\"question\": \"What is C?\", \"answer\": \"C is third.\"}]\n```"),
        ]);
        let generator = FaqGenerator::new(Box::new(g), 4).unwrap();

        let report = generator.generate("doc.txt", &chunks(2)).await.unwrap();

        assert_eq!(report.chunks_total, 2);
        assert_eq!(report.chunks_failed, 0);
        assert_eq!(report.raw_count, 4);
        assert_eq!(report.duplicates_removed(), 1);
        assert_eq!(report.faqs.document, "doc.txt");
        assert_eq!(report.faqs.model, "mock-model");

        let questions: Vec<&str> = report.faqs.items.iter().map(|f| f.question.as_str()).collect();
        assert_eq!(questions, vec!["What is A?", "What is B?", "What is C?"]);
        assert_eq!(report.faqs.items[0].answer, "A is first.");

        let prompts = prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("(chunk 1/2)"));
        assert!(prompts[1].contains("Chunk text 2."));
        assert!(prompts[1].contains("Generate exactly 4"));
    }

    #[tokio::test]
    async fn test_failed_chunks_are_skipped() {
        let (g, _) = ScriptedGenerator::new(vec![
            Err(anyhow::anyhow!("Gemini API error (UNAVAILABLE): overloaded")),
            ok("not json at all"),
            ok(r#"[{"question": "Q3?", "answer": "A3."}]"#),
            ok(""),
        ]);
        let generator = FaqGenerator::new(Box::new(g), 5).unwrap();

        let mut events = Vec::new();
        let report = generator
            .generate_with_progress("doc.md", &chunks(4), |p| events.push(p.clone()))
            .await
            .unwrap();

        assert_eq!(report.chunks_failed, 3);
        assert_eq!(report.faqs.items, vec![FaqItem::new("Q3?", "A3.")]);

        assert_eq!(events.len(), 4);
        assert!(events[0].outcome.as_ref().unwrap_err().contains("overloaded"));
        assert!(events[1].outcome.is_err());
        assert_eq!(events[2].outcome, Ok(1));
        assert_eq!(events[3].chunk_num, 4);
        assert_eq!(events[3].total_chunks, 4);
    }

    #[tokio::test]
    async fn test_no_faqs_is_error() {
        let (g, _) = ScriptedGenerator::new(vec![ok("[]"), ok("garbage")]);
        let generator = FaqGenerator::new(Box::new(g), 5).unwrap();

        let err = generator.generate("empty.pdf", &chunks(2)).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FaqError>(),
            Some(FaqError::NoFaqs(name)) if name == "empty.pdf"
        ));
    }

    #[tokio::test]
    async fn test_no_chunks_is_error() {
        let (g, prompts) = ScriptedGenerator::new(vec![]);
        let generator = FaqGenerator::new(Box::new(g), 5).unwrap();

        assert!(generator.generate("doc", &[]).await.is_err());
        assert!(prompts.lock().unwrap().is_empty());
    }
}
