//! FAQ 생성 프롬프트

/// 청크 하나에 대한 FAQ 생성 프롬프트
///
/// 모델에게 정확히 `num_questions`개의 질문/답변 쌍을
/// `[{"question": ..., "answer": ...}]` 형태의 JSON 배열로만 반환하도록 요구합니다.
pub fn build_prompt(chunk: &str, chunk_num: usize, total_chunks: usize, num_questions: usize) -> String {
    format!(
        r#"You are an expert at creating educational FAQ content.

Generate exactly {n} high-quality question-answer pairs from the following text (chunk {chunk_num}/{total_chunks}).

TEXT:
"""
{chunk}
"""

REQUIREMENTS:
1. Generate EXACTLY {n} question-answer pairs
2. Questions should be natural and specific to the content
3. Answers must be complete and informative (2-4 sentences)
4. Cover different aspects of the text
5. Base answers ONLY on the provided text

OUTPUT: Return ONLY a valid JSON array with this structure:
[
  {{
    "question": "What is the main topic?",
    "answer": "The main topic is... [complete answer]"
  }}
]

CRITICAL: Return ONLY the JSON array, no markdown, no extra text."#,
        n = num_questions,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_inputs() {
        let prompt = build_prompt("Rust is a systems language.", 2, 7, 5);
        assert!(prompt.contains("Generate exactly 5 high-quality"));
        assert!(prompt.contains("(chunk 2/7)"));
        assert!(prompt.contains("\"\"\"\nRust is a systems language.\n\"\"\""));
        assert!(prompt.contains("EXACTLY 5 question-answer pairs"));
    }

    #[test]
    fn test_prompt_json_braces_escaped() {
        let prompt = build_prompt("x", 1, 1, 3);
        assert!(prompt.contains("  {\n    \"question\": \"What is the main topic?\","));
        assert!(prompt.ends_with("no markdown, no extra text."));
    }
}
