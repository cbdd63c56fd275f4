//! 문서 수집 모듈
//!
//! 단일 파일 또는 폴더에서 FAQ 생성 대상 문서를 수집합니다.
//! .gitignore 패턴을 존중하고, PDF/TXT/MD만 수집합니다.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ignore::WalkBuilder;

use crate::error::FaqError;

// ============================================================================
// Document Format
// ============================================================================

/// 지원하는 문서 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Text,
    Markdown,
}

impl DocumentFormat {
    /// 확장자로 문서 형식 결정
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(DocumentFormat::Pdf),
            "txt" => Some(DocumentFormat::Text),
            "md" | "markdown" => Some(DocumentFormat::Markdown),
            _ => None,
        }
    }

    /// 파일 경로에서 형식 결정
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// 짧은 표시용 라벨
    pub fn label(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "PDF",
            DocumentFormat::Text => "TXT",
            DocumentFormat::Markdown => "MD",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Document
// ============================================================================

/// 수집된 문서
#[derive(Debug, Clone)]
pub struct Document {
    /// 파일 절대 경로
    pub path: PathBuf,
    /// 문서 형식
    pub format: DocumentFormat,
    /// 파일 크기 (바이트)
    pub size: u64,
}

impl Document {
    /// 경로에서 Document 생성 (지원하지 않는 형식이면 None)
    pub fn from_path(path: PathBuf) -> Result<Option<Self>> {
        let format = match DocumentFormat::from_path(&path) {
            Some(f) => f,
            None => return Ok(None),
        };

        let metadata = std::fs::metadata(&path)
            .with_context(|| format!("Failed to read metadata: {:?}", path))?;

        if !metadata.is_file() {
            return Ok(None);
        }

        Ok(Some(Self {
            path,
            format,
            size: metadata.len(),
        }))
    }

    /// 내보내기 파일명에 쓰는 문서 이름 (확장자 포함)
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document")
            .to_string()
    }
}

// ============================================================================
// Document Collector
// ============================================================================

/// 수집기 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// .gitignore 패턴 존중 여부
    pub respect_gitignore: bool,
    /// 숨김 파일 포함 여부
    pub include_hidden: bool,
    /// 최대 파일 크기 (바이트, 0이면 제한 없음)
    pub max_file_size: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            respect_gitignore: true,
            include_hidden: false,
            max_file_size: 50 * 1024 * 1024, // 50MB
        }
    }
}

/// 문서 수집기
pub struct DocumentCollector {
    config: CollectorConfig,
}

impl DocumentCollector {
    pub fn new(config: CollectorConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(CollectorConfig::default())
    }

    /// 단일 파일 수집
    ///
    /// 지원하지 않는 확장자는 `FaqError::UnsupportedFormat`,
    /// 크기 제한을 넘으면 `FaqError::FileTooLarge`.
    pub fn collect_file(&self, path: &Path) -> Result<Document> {
        let abs_path = absolutize(path)?;

        if !abs_path.exists() {
            anyhow::bail!("File not found: {:?}", abs_path);
        }

        if !abs_path.is_file() {
            anyhow::bail!("Not a file: {:?}", abs_path);
        }

        let doc = match Document::from_path(abs_path.clone())? {
            Some(doc) => doc,
            None => {
                let ext = abs_path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("")
                    .to_string();
                return Err(FaqError::UnsupportedFormat(ext).into());
            }
        };

        if !self.should_include(&doc) {
            return Err(FaqError::FileTooLarge {
                path: doc.path.display().to_string(),
                size: doc.size,
                limit: self.config.max_file_size,
            }
            .into());
        }

        Ok(doc)
    }

    /// 폴더 재귀 수집 (경로순 정렬)
    pub fn collect_directory(&self, path: &Path) -> Result<Vec<Document>> {
        let abs_path = absolutize(path)?;

        if !abs_path.exists() {
            anyhow::bail!("Directory not found: {:?}", abs_path);
        }

        if !abs_path.is_dir() {
            anyhow::bail!("Not a directory: {:?}", abs_path);
        }

        let walker = WalkBuilder::new(&abs_path)
            .hidden(!self.config.include_hidden)
            .git_ignore(self.config.respect_gitignore)
            .git_global(self.config.respect_gitignore)
            .git_exclude(self.config.respect_gitignore)
            .build();

        let mut docs = Vec::new();

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!("Failed to read entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                continue;
            }

            match Document::from_path(entry.path().to_path_buf()) {
                Ok(Some(doc)) => {
                    if self.should_include(&doc) {
                        docs.push(doc);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("Failed to collect file: {}", e);
                }
            }
        }

        docs.sort_by(|a, b| a.path.cmp(&b.path));

        tracing::info!("Collected {} documents from {:?}", docs.len(), abs_path);
        Ok(docs)
    }

    fn should_include(&self, doc: &Document) -> bool {
        if self.config.max_file_size > 0 && doc.size > self.config.max_file_size {
            tracing::debug!("Skipping large file: {:?} ({} bytes)", doc.path, doc.size);
            return false;
        }
        true
    }
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()
            .context("Failed to resolve current directory")?
            .join(path))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(DocumentFormat::from_extension("pdf"), Some(DocumentFormat::Pdf));
        assert_eq!(DocumentFormat::from_extension("PDF"), Some(DocumentFormat::Pdf));
        assert_eq!(DocumentFormat::from_extension("txt"), Some(DocumentFormat::Text));
        assert_eq!(DocumentFormat::from_extension("md"), Some(DocumentFormat::Markdown));
        assert_eq!(DocumentFormat::from_extension("docx"), None);
        assert_eq!(DocumentFormat::from_extension("rs"), None);
    }

    #[test]
    fn test_collect_file_unsupported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.docx");
        std::fs::write(&path, "hello").unwrap();

        let collector = DocumentCollector::with_defaults();
        let err = collector.collect_file(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FaqError>(),
            Some(FaqError::UnsupportedFormat(ext)) if ext == "docx"
        ));
    }

    #[test]
    fn test_collect_file_missing() {
        let collector = DocumentCollector::with_defaults();
        let result = collector.collect_file(Path::new("/definitely/not/here.txt"));
        assert!(result.is_err());
    }

    #[test]
    fn test_collect_file_size_limit() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big.txt");
        std::fs::write(&path, "x".repeat(64)).unwrap();

        let collector = DocumentCollector::new(CollectorConfig {
            max_file_size: 10,
            ..Default::default()
        });
        let err = collector.collect_file(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FaqError>(),
            Some(FaqError::FileTooLarge { size: 64, limit: 10, .. })
        ));
        assert!(err.to_string().starts_with("File too large"));

        // 제한 이하면 그대로 수집
        std::fs::write(&path, "small").unwrap();
        let doc = collector.collect_file(&path).unwrap();
        assert_eq!(doc.size, 5);
        assert_eq!(doc.format, DocumentFormat::Text);
    }

    #[test]
    fn test_collect_directory_sorted_and_filtered() {
        // 숨김 디렉토리(.tmpXXXX)를 피하기 위해 접두사 지정
        let dir = tempfile::Builder::new()
            .prefix("smartfaq")
            .tempdir()
            .unwrap();
        std::fs::write(dir.path().join("b.md"), "# B").unwrap();
        std::fs::write(dir.path().join("a.txt"), "A").unwrap();
        std::fs::write(dir.path().join("image.png"), [0u8; 4]).unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("c.txt"), "C").unwrap();

        let collector = DocumentCollector::with_defaults();
        let docs = collector.collect_directory(dir.path()).unwrap();

        let names: Vec<String> = docs.iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["a.txt", "b.md", "c.txt"]);
        assert_eq!(docs[1].format, DocumentFormat::Markdown);
    }

    #[test]
    fn test_document_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("guide.md");
        std::fs::write(&path, "# Guide").unwrap();

        let doc = Document::from_path(path).unwrap().unwrap();
        assert_eq!(doc.name(), "guide.md");
        assert_eq!(doc.format.label(), "MD");
    }
}
