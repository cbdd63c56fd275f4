//! PDF 텍스트 추출
//!
//! pdf-extract 크레이트로 PDF 전체 텍스트를 뽑은 뒤 페이지 단위로 나눕니다.

use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use regex::Regex;

/// PDF에서 페이지별 텍스트 추출
///
/// 빈 페이지는 제외됩니다. 텍스트가 전혀 없으면 (스캔본 등) 빈 벡터를 반환합니다.
pub fn extract_pages(path: &Path) -> Result<Vec<String>> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read PDF: {:?}", path))?;

    let text = pdf_extract::extract_text_from_mem(&bytes)
        .with_context(|| format!("Failed to extract text from PDF: {:?}", path))?;

    if text.trim().is_empty() {
        tracing::warn!(
            "No text extracted from PDF: {:?}. It might be a scanned document.",
            path
        );
        return Ok(Vec::new());
    }

    let pages = split_pages(&text);
    tracing::debug!("PDF {:?}: {} pages with text", path, pages.len());
    Ok(pages)
}

/// 폼피드(\x0c) 또는 "--- Page N ---" 구분자로 페이지 분리
fn split_pages(text: &str) -> Vec<String> {
    let pages = non_empty_trimmed(text.split('\x0c'));
    if pages.len() > 1 {
        return pages;
    }

    let marker = page_marker();
    if marker.is_match(text) {
        let pages = non_empty_trimmed(marker.split(text));
        if pages.len() > 1 {
            return pages;
        }
    }

    non_empty_trimmed(std::iter::once(text))
}

fn non_empty_trimmed<'a>(parts: impl Iterator<Item = &'a str>) -> Vec<String> {
    parts
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn page_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*[-=]+\s*(?:Page\s*)?\d+\s*[-=]+\s*$").expect("valid page marker regex")
    })
}
