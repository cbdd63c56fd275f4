//! 모델 응답 파싱
//!
//! 모델이 지시를 어기고 코드 펜스나 설명을 붙여도 JSON 배열을 복구합니다.

use serde_json::Value;

use super::FaqItem;
use crate::error::FaqError;

const FENCE: &str = "```";

/// 응답 텍스트에서 FAQ 목록 파싱
///
/// 질문/답변이 문자열이 아니거나 비어 있는 항목은 조용히 버립니다.
pub fn parse_faq_response(text: &str) -> Result<Vec<FaqItem>, FaqError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(FaqError::EmptyResponse);
    }

    let payload = strip_code_fence(text).trim();
    let value: Value = serde_json::from_str(payload)?;

    let entries = match value {
        Value::Array(entries) => entries,
        _ => return Err(FaqError::NotAnArray),
    };

    let total = entries.len();
    let items: Vec<FaqItem> = entries.iter().filter_map(entry_to_item).collect();

    if items.len() < total {
        tracing::debug!("Dropped {} malformed FAQ entries", total - items.len());
    }

    Ok(items)
}

fn entry_to_item(entry: &Value) -> Option<FaqItem> {
    let obj = entry.as_object()?;
    let question = obj.get("question")?.as_str()?.trim();
    let answer = obj.get("answer")?.as_str()?.trim();

    if question.is_empty() || answer.is_empty() {
        return None;
    }

    Some(FaqItem::new(question, answer))
}

/// 코드 펜스 내부만 추출
///
/// "```json" 펜스를 우선하고, 없으면 첫 번째 "```" 펜스를 사용합니다.
/// 일반 펜스 뒤의 언어 태그 줄(예: "JSON")은 제거합니다.
fn strip_code_fence(text: &str) -> &str {
    if let Some((_, rest)) = text.split_once("```json") {
        return rest.split(FENCE).next().unwrap_or(rest);
    }

    if let Some((_, rest)) = text.split_once(FENCE) {
        let inner = rest.split(FENCE).next().unwrap_or(rest);
        return match inner.split_once('\n') {
            Some((tag, body)) if is_language_tag(tag) => body,
            _ => inner,
        };
    }

    text
}

fn is_language_tag(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty() && line.chars().all(|c| c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_array() {
        let text = r#"[{"question": " What is Rust? ", "answer": "A language. "}]"#;
        let items = parse_faq_response(text).unwrap();
        assert_eq!(items, vec![FaqItem::new("What is Rust?", "A language.")]);
    }

    #[test]
    fn test_parse_json_fence_with_chatter() {
        let text = "Here you go:\n```json\n[{\"question\": \"Q1?\", \"answer\": \"A1\"}]\n```\nHope this helps.";
        let items = parse_faq_response(text).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].question, "Q1?");
    }

    #[test]
    fn test_parse_generic_fence() {
        let text = "```\n[{\"question\": \"Q\", \"answer\": \"A\"}]\n```";
        assert_eq!(parse_faq_response(text).unwrap().len(), 1);
    }

    #[test]
    fn test_parse_uppercase_language_tag() {
        let text = "```JSON\n[{\"question\": \"Q\", \"answer\": \"A\"}]\n```";
        assert_eq!(parse_faq_response(text).unwrap().len(), 1);
    }

    #[test]
    fn test_parse_drops_malformed_entries() {
        let text = r#"[
            {"question": "Good?", "answer": "Yes."},
            {"question": "", "answer": "No question"},
            {"question": "No answer"},
            {"question": 42, "answer": "numeric question"},
            "just a string",
            {"question": "Also good?", "answer": "  Indeed.  ", "extra": true}
        ]"#;
        let items = parse_faq_response(text).unwrap();
        assert_eq!(
            items,
            vec![
                FaqItem::new("Good?", "Yes."),
                FaqItem::new("Also good?", "Indeed."),
            ]
        );
    }

    #[test]
    fn test_parse_empty_response() {
        assert!(matches!(parse_faq_response("  \n"), Err(FaqError::EmptyResponse)));
    }

    #[test]
    fn test_parse_invalid_json() {
        let err = parse_faq_response("Sorry, I cannot help with that.").unwrap_err();
        assert!(matches!(err, FaqError::InvalidJson(_)));
        assert!(err.is_parse_failure());
    }

    #[test]
    fn test_parse_not_an_array() {
        let err = parse_faq_response(r#"{"question": "Q", "answer": "A"}"#).unwrap_err();
        assert!(matches!(err, FaqError::NotAnArray));
    }

    #[test]
    fn test_parse_empty_array() {
        assert!(parse_faq_response("[]").unwrap().is_empty());
    }
}
