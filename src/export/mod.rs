//! 내보내기 모듈
//!
//! FAQ 목록을 JSON, Markdown, HTML로 렌더링하고 파일로 저장합니다.
//! 렌더러는 생성 시각을 인자로 받아 출력이 결정적입니다.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::faq::{deduplicate, FaqItem, FaqSet};

// ============================================================================
// Export Format
// ============================================================================

/// 출력 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Json,
    #[value(alias = "md")]
    Markdown,
    Html,
}

impl ExportFormat {
    /// 모든 형식
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Json, ExportFormat::Markdown, ExportFormat::Html];

    /// 파일 확장자
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Markdown => "md",
            ExportFormat::Html => "html",
        }
    }

    /// 출력 파일명: `{문서명}_faqs.{ext}`
    pub fn file_name(&self, document: &str) -> String {
        format!("{}_faqs.{}", document, self.extension())
    }

    /// 형식에 맞게 렌더링
    pub fn render(&self, faqs: &FaqSet, generated_at: DateTime<Local>) -> Result<String> {
        match self {
            ExportFormat::Json => to_json(faqs, generated_at),
            ExportFormat::Markdown => Ok(to_markdown(faqs, generated_at)),
            ExportFormat::Html => Ok(to_html(faqs, generated_at)),
        }
    }
}

// ============================================================================
// JSON
// ============================================================================

/// JSON 내보내기 문서 구조 (다시 읽어 들일 때도 사용)
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonExport {
    pub document: String,
    pub generated_at: String,
    pub total_faqs: usize,
    pub model: String,
    pub faqs: Vec<FaqItem>,
}

/// JSON 렌더링 (2칸 들여쓰기, 비ASCII 문자 그대로)
pub fn to_json(faqs: &FaqSet, generated_at: DateTime<Local>) -> Result<String> {
    let export = JsonExport {
        document: faqs.document.clone(),
        generated_at: generated_at.to_rfc3339(),
        total_faqs: faqs.len(),
        model: faqs.model.clone(),
        faqs: faqs.items.clone(),
    };
    serde_json::to_string_pretty(&export).context("Failed to serialize FAQs to JSON")
}

/// 다시 읽어 들인 JSON 내보내기
#[derive(Debug, Clone)]
pub struct LoadedExport {
    pub faqs: FaqSet,
    /// 원래 생성 시각 (파싱 실패 시 None)
    pub generated_at: Option<DateTime<Local>>,
}

/// JSON 내보내기 파일 읽기
///
/// 항목은 앞뒤 공백을 제거하고, 질문이나 답변이 빈 항목과 중복 질문은 버립니다.
/// 남는 항목이 없으면 에러입니다.
pub fn load_json_export(path: &Path) -> Result<LoadedExport> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read FAQ export: {:?}", path))?;
    let export: JsonExport = serde_json::from_str(&content)
        .with_context(|| format!("Not a FAQ JSON export: {:?}", path))?;

    if export.total_faqs != export.faqs.len() {
        tracing::warn!(
            "{:?}: total_faqs says {} but {} entries found",
            path,
            export.total_faqs,
            export.faqs.len()
        );
    }

    let found = export.faqs.len();
    let items = deduplicate(
        export
            .faqs
            .into_iter()
            .map(|f| FaqItem::new(f.question.trim(), f.answer.trim()))
            .filter(|f| !f.question.is_empty() && !f.answer.is_empty())
            .collect(),
    );

    if items.is_empty() {
        anyhow::bail!("FAQ export has no usable entries: {:?}", path);
    }
    if items.len() != found {
        tracing::warn!(
            "{:?}: dropped {} empty or duplicate entries",
            path,
            found - items.len()
        );
    }

    let generated_at = DateTime::parse_from_rfc3339(&export.generated_at)
        .map(|t| t.with_timezone(&Local))
        .ok();

    Ok(LoadedExport {
        faqs: FaqSet::new(export.document, export.model, items),
        generated_at,
    })
}

// ============================================================================
// Markdown
// ============================================================================

/// Markdown 렌더링
pub fn to_markdown(faqs: &FaqSet, generated_at: DateTime<Local>) -> String {
    let mut md = String::new();
    let _ = writeln!(md, "# FAQs - {}\n", faqs.document);
    let _ = writeln!(md, "**Generated:** {}  ", generated_at.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(md, "**Total Questions:** {}  \n\n---\n", faqs.len());

    for (i, faq) in faqs.items.iter().enumerate() {
        let _ = writeln!(md, "## {}. {}\n", i + 1, faq.question);
        let _ = writeln!(md, "**Answer:** {}\n\n---\n", faq.answer);
    }

    md
}

// ============================================================================
// HTML
// ============================================================================

const HTML_STYLE: &str = r#"        * { margin: 0; padding: 0; box-sizing: border-box; }
        body {
            font-family: 'Segoe UI', system-ui, sans-serif;
            background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
            padding: 40px 20px;
            min-height: 100vh;
        }
        .container {
            max-width: 900px;
            margin: 0 auto;
            background: white;
            border-radius: 20px;
            box-shadow: 0 20px 60px rgba(0,0,0,0.3);
            padding: 50px;
        }
        h1 { color: #2c3e50; text-align: center; margin-bottom: 30px; }
        .meta { text-align: center; color: #888; margin-bottom: 30px; }
        .faq {
            margin: 25px 0;
            padding: 25px;
            background: linear-gradient(135deg, #f5f7fa 0%, #c3cfe2 100%);
            border-radius: 12px;
            border-left: 6px solid #667eea;
            transition: transform 0.3s;
        }
        .faq:hover { transform: translateY(-5px); box-shadow: 0 8px 20px rgba(0,0,0,0.1); }
        .question { font-size: 1.3em; font-weight: bold; color: #2c3e50; margin-bottom: 12px; }
        .answer { color: #34495e; line-height: 1.8; font-size: 1.05em; }"#;

/// HTML 렌더링 (모든 본문 텍스트는 이스케이프)
pub fn to_html(faqs: &FaqSet, generated_at: DateTime<Local>) -> String {
    let name = escape_html(&faqs.document);
    let mut html = String::new();

    let _ = write!(
        html,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>FAQs - {name}</title>
    <style>
{style}
    </style>
</head>
<body>
    <div class="container">
        <h1>{name}</h1>
        <p class="meta">Generated: {generated} | Total: {total} FAQs</p>
"#,
        style = HTML_STYLE,
        generated = generated_at.format("%Y-%m-%d %H:%M"),
        total = faqs.len(),
    );

    for (i, faq) in faqs.items.iter().enumerate() {
        let _ = write!(
            html,
            r#"
        <div class="faq">
            <div class="question">Q{num}: {question}</div>
            <div class="answer">{answer}</div>
        </div>
"#,
            num = i + 1,
            question = escape_html(&faq.question),
            answer = escape_html(&faq.answer),
        );
    }

    html.push_str("\n    </div>\n</body>\n</html>\n");
    html
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// ============================================================================
// Writing
// ============================================================================

/// 선택한 형식들로 파일 저장, 저장된 경로 반환
pub fn write_exports(
    faqs: &FaqSet,
    formats: &[ExportFormat],
    output_dir: &Path,
    generated_at: DateTime<Local>,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    let mut written = Vec::with_capacity(formats.len());

    for format in formats {
        let content = format.render(faqs, generated_at)?;
        let path = output_dir.join(format.file_name(&faqs.document));
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write export: {:?}", path))?;
        tracing::debug!("Wrote {:?}", path);
        written.push(path);
    }

    Ok(written)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn sample() -> FaqSet {
        FaqSet::new(
            "guide.pdf",
            "gemini-2.5-flash",
            vec![
                FaqItem::new("What is Rust?", "A systems language."),
                FaqItem::new("Is it <safe>?", "Yes & fast. 안전합니다."),
            ],
        )
    }

    fn at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap()
    }

    #[test]
    fn test_file_names() {
        assert_eq!(ExportFormat::Json.file_name("guide.pdf"), "guide.pdf_faqs.json");
        assert_eq!(ExportFormat::Markdown.file_name("a"), "a_faqs.md");
        assert_eq!(ExportFormat::Html.file_name("a"), "a_faqs.html");
    }

    #[test]
    fn test_json_shape() {
        let json = to_json(&sample(), at()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["document"], "guide.pdf");
        assert_eq!(value["total_faqs"], 2);
        assert_eq!(value["model"], "gemini-2.5-flash");
        assert_eq!(value["faqs"][1]["question"], "Is it <safe>?");
        assert!(value["generated_at"].as_str().unwrap().starts_with("2024-05-06T07:08:09"));

        // 2칸 들여쓰기, 한글은 이스케이프하지 않음
        assert!(json.contains("\n  \"document\": \"guide.pdf\""));
        assert!(json.contains("안전합니다"));
    }

    #[test]
    fn test_markdown_layout() {
        let md = to_markdown(&sample(), at());
        let expected_head = "# FAQs - guide.pdf\n\n\
                             **Generated:** 2024-05-06 07:08:09  \n\
                             **Total Questions:** 2  \n\n---\n\n\
                             ## 1. What is Rust?\n\n\
                             **Answer:** A systems language.\n\n---\n\n";
        assert!(md.starts_with(expected_head), "got:\n{}", md);
        assert!(md.ends_with("**Answer:** Yes & fast. 안전합니다.\n\n---\n\n"));
    }

    #[test]
    fn test_html_escapes_content() {
        let html = to_html(&sample(), at());
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>FAQs - guide.pdf</title>"));
        assert!(html.contains("Generated: 2024-05-06 07:08 | Total: 2 FAQs"));
        assert!(html.contains("<div class=\"question\">Q2: Is it &lt;safe&gt;?</div>"));
        assert!(html.contains("<div class=\"answer\">Yes &amp; fast. 안전합니다.</div>"));
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
    }

    #[test]
    fn test_write_and_reload() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");

        let written = write_exports(&sample(), &ExportFormat::ALL, &out, at()).unwrap();
        assert_eq!(written.len(), 3);
        assert!(out.join("guide.pdf_faqs.md").exists());
        assert!(out.join("guide.pdf_faqs.html").exists());

        let reloaded = load_json_export(&out.join("guide.pdf_faqs.json")).unwrap();
        assert_eq!(reloaded.faqs, sample());
        assert_eq!(reloaded.generated_at, Some(at()));
    }

    #[test]
    fn test_load_rejects_other_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("other.json");
        std::fs::write(&path, r#"[{"question": "Q", "answer": "A"}]"#).unwrap();
        assert!(load_json_export(&path).is_err());
    }

    #[test]
    fn test_load_normalizes_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("edited_faqs.json");
        std::fs::write(
            &path,
            r#"{
                "document": "edited.md",
                "generated_at": "not a date",
                "total_faqs": 5,
                "model": "gemini-2.5-flash",
                "faqs": [
                    {"question": "  What is Rust?  ", "answer": " A language. "},
                    {"question": "", "answer": "orphan answer"},
                    {"question": "What is Cargo?", "answer": "   "},
                    {"question": "what is rust", "answer": "duplicate"},
                    {"question": "Why Rust?", "answer": "Safety."}
                ]
            }"#,
        )
        .unwrap();

        let loaded = load_json_export(&path).unwrap();
        assert_eq!(
            loaded.faqs.items,
            vec![
                FaqItem::new("What is Rust?", "A language."),
                FaqItem::new("Why Rust?", "Safety."),
            ]
        );
        assert_eq!(loaded.faqs.document, "edited.md");
        assert!(loaded.generated_at.is_none());
    }

    #[test]
    fn test_load_rejects_export_without_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty_faqs.json");
        std::fs::write(
            &path,
            r#"{"document": "d", "generated_at": "", "total_faqs": 1, "model": "m",
                "faqs": [{"question": " ", "answer": "A"}]}"#,
        )
        .unwrap();

        let err = load_json_export(&path).unwrap_err();
        assert!(err.to_string().contains("no usable entries"));
    }
}
