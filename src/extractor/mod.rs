//! 텍스트 추출 모듈
//!
//! 문서 형식별로 원문 텍스트를 추출하고, 프롬프트에 넣기 좋게 정제합니다.
//! - PDF: pdf-extract
//! - TXT/MD: UTF-8 디코딩 (잘못된 바이트는 버림)

pub mod pdf;

use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use regex::Regex;

use crate::document::{Document, DocumentFormat};

// ============================================================================
// Extracted Text
// ============================================================================

/// 추출된 텍스트
#[derive(Debug, Clone)]
pub struct ExtractedText {
    /// 추출된 (정제 전) 텍스트
    pub text: String,
    /// 원본 문서 형식
    pub format: DocumentFormat,
    /// 텍스트가 있는 PDF 페이지 수
    pub page_count: Option<usize>,
}

impl ExtractedText {
    /// 단어 수 (공백 기준)
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

// ============================================================================
// Text Extractor
// ============================================================================

/// 문서에서 텍스트 추출
pub async fn extract(doc: &Document) -> Result<ExtractedText> {
    match doc.format {
        DocumentFormat::Pdf => extract_pdf(&doc.path).await,
        DocumentFormat::Text | DocumentFormat::Markdown => {
            let text = extract_plain(&doc.path).await?;
            Ok(ExtractedText {
                text,
                format: doc.format,
                page_count: None,
            })
        }
    }
}

/// TXT/MD 파일 읽기
async fn extract_plain(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read text file: {:?}", path))?;

    Ok(decode_lossy(&bytes))
}

/// PDF 추출 (CPU 바운드이므로 spawn_blocking)
async fn extract_pdf(path: &Path) -> Result<ExtractedText> {
    let owned = path.to_path_buf();
    let pages = tokio::task::spawn_blocking(move || pdf::extract_pages(&owned))
        .await
        .context("PDF extraction task failed")??;

    Ok(ExtractedText {
        page_count: Some(pages.len()),
        text: pages.join("\n\n"),
        format: DocumentFormat::Pdf,
    })
}

/// UTF-8 디코딩, 잘못된 바이트 시퀀스와 BOM은 제거
fn decode_lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .replace(char::REPLACEMENT_CHARACTER, "")
        .trim_start_matches('\u{feff}')
        .trim()
        .to_string()
}

// ============================================================================
// Cleaning
// ============================================================================

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace regex"))
}

fn url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https?://\S+").expect("valid url regex"))
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\S+@\S+").expect("valid email regex"))
}

/// 텍스트 정제
///
/// 공백을 한 칸으로 합치고 URL과 이메일 주소를 제거합니다.
/// 결과는 한 줄짜리 텍스트가 됩니다.
pub fn clean_text(text: &str) -> String {
    let text = whitespace_re().replace_all(text, " ");
    let text = url_re().replace_all(&text, "");
    let text = email_re().replace_all(&text, "");
    whitespace_re().replace_all(&text, " ").trim().to_string()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_clean_text_whitespace() {
        assert_eq!(clean_text("  Hello\n\n\tworld  \r\n again "), "Hello world again");
    }

    #[test]
    fn test_clean_text_removes_urls_and_emails() {
        let text = "Visit https://example.com/docs?id=1 or http://foo.bar now. Mail admin@example.com today.";
        assert_eq!(clean_text(text), "Visit or now. Mail today.");
    }

    #[test]
    fn test_clean_text_empty() {
        assert_eq!(clean_text(" \n\t "), "");
    }

    #[test]
    fn test_decode_lossy_drops_invalid_bytes() {
        let bytes = [b'a', 0xff, b'b', b' ', 0xfe, b'c'];
        assert_eq!(decode_lossy(&bytes), "ab c");
    }

    #[test]
    fn test_decode_lossy_strips_bom() {
        let mut bytes = vec![0xef, 0xbb, 0xbf];
        bytes.extend_from_slice("  제목\n".as_bytes());
        assert_eq!(decode_lossy(&bytes), "제목");
    }

    #[tokio::test]
    async fn test_extract_markdown() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("readme.md");
        std::fs::write(&path, "# Title\n\nSome body text.\n").unwrap();

        let doc = Document::from_path(path).unwrap().unwrap();
        let extracted = extract(&doc).await.unwrap();

        assert_eq!(extracted.format, DocumentFormat::Markdown);
        assert_eq!(extracted.text, "# Title\n\nSome body text.");
        assert_eq!(extracted.word_count(), 5);
        assert!(extracted.page_count.is_none());
    }
}
