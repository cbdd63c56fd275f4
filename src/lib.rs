//! smart-faq - 문서 기반 FAQ 생성기
//!
//! PDF/TXT/MD 문서에서 텍스트를 추출하고, 문장 단위로 청킹한 뒤
//! Gemini API로 질문/답변 쌍을 생성하여 JSON, Markdown, HTML로 내보냅니다.

pub mod chunker;
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod export;
pub mod extractor;
pub mod faq;
pub mod gemini;

// Re-exports
pub use chunker::{default_chunker, sentence_chunker, ChunkConfig, Chunker, SentenceChunker};
pub use config::FaqConfig;
pub use document::{CollectorConfig, Document, DocumentCollector, DocumentFormat};
pub use error::FaqError;
pub use export::{load_json_export, write_exports, ExportFormat, LoadedExport};
pub use extractor::{clean_text, extract, ExtractedText};
pub use faq::{deduplicate, parse_faq_response, FaqGenerator, FaqItem, FaqSet, GenerationReport};
pub use gemini::{resolve_api_key, GeminiClient, TextGenerator, DEFAULT_MODEL, SUPPORTED_MODELS};
