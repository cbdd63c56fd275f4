//! CLI 모듈
//!
//! smart-faq CLI 명령어 정의 및 구현

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};

use crate::chunker::{sentence_chunker, Chunker};
use crate::config::FaqConfig;
use crate::document::{Document, DocumentCollector};
use crate::error::FaqError;
use crate::export::{load_json_export, write_exports, ExportFormat};
use crate::extractor::{clean_text, extract};
use crate::faq::{ChunkProgress, FaqGenerator, FaqSet, GenerationReport};
use crate::gemini::{
    api_base_from_env, resolve_api_key, GeminiClient, DEFAULT_MODEL, SUPPORTED_MODELS,
};

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "smart-faq")]
#[command(version, about = "문서 기반 FAQ 생성기 (Gemini)", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 문서(PDF/TXT/MD)에서 FAQ 생성
    Generate(GenerateArgs),

    /// Gemini API 연결 테스트
    Check {
        /// 테스트할 모델
        #[arg(short, long, default_value = DEFAULT_MODEL)]
        model: String,

        /// API 키 (미지정 시 GEMINI_API_KEY / GOOGLE_AI_API_KEY)
        #[arg(long)]
        api_key: Option<String>,
    },

    /// 저장된 JSON 결과를 다른 형식으로 변환
    Convert {
        /// `generate`가 만든 JSON 파일
        input: PathBuf,

        /// 출력 형식 (반복 가능, 기본: markdown + html)
        #[arg(short, long = "format", value_enum)]
        formats: Vec<ExportFormat>,

        /// 출력 디렉토리 (기본: 입력 파일과 같은 폴더)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// 지원 모델 목록
    Models,
}

#[derive(Args)]
pub struct GenerateArgs {
    /// 단일 문서 경로
    #[arg(long, conflicts_with = "dir")]
    pub file: Option<PathBuf>,

    /// 문서 폴더 경로 (재귀)
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// 출력 디렉토리
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// 출력 형식 (반복 가능, 기본: 전체)
    #[arg(short, long = "format", value_enum)]
    pub formats: Vec<ExportFormat>,

    /// Gemini 모델
    #[arg(short, long)]
    pub model: Option<String>,

    /// 청크 크기 (단어 수, 500-3000)
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// 청크 오버랩 (단어 수, 0-500)
    #[arg(long)]
    pub overlap: Option<usize>,

    /// 청크당 질문 수 (3-8)
    #[arg(short, long)]
    pub questions: Option<usize>,

    /// API 키 (미지정 시 GEMINI_API_KEY / GOOGLE_AI_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,

    /// 생성된 FAQ를 터미널에 출력
    #[arg(long)]
    pub preview: bool,
}

// ============================================================================
// CLI Runner
// ============================================================================

/// CLI 명령어 실행
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Generate(args) => cmd_generate(args).await,
        Commands::Check { model, api_key } => cmd_check(&model, api_key.as_deref()).await,
        Commands::Convert {
            input,
            formats,
            output_dir,
        } => cmd_convert(&input, formats, output_dir),
        Commands::Models => {
            cmd_models();
            Ok(())
        }
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

/// FAQ 생성 명령어 (generate)
async fn cmd_generate(args: GenerateArgs) -> Result<()> {
    let config = build_config(&args)?;

    let collector = DocumentCollector::with_defaults();
    let docs = if let Some(ref file_path) = args.file {
        vec![collector.collect_file(file_path)?]
    } else if let Some(ref dir_path) = args.dir {
        collector.collect_directory(dir_path)?
    } else {
        bail!("--file 또는 --dir 중 하나를 지정해야 합니다");
    };

    if docs.is_empty() {
        println!("[!] 처리할 문서가 없습니다 (지원 형식: pdf, txt, md)");
        return Ok(());
    }

    let api_key = resolve_api_key(args.api_key.as_deref())?;
    let client = GeminiClient::with_base_url(api_key, config.model.clone(), api_base_from_env())?;
    let generator = FaqGenerator::new(Box::new(client), config.questions_per_chunk)?;
    let chunker = sentence_chunker(config.chunk);

    println!(
        "[*] 모델: {} | 청크: {} 단어 (오버랩 {}) | 청크당 질문: {}",
        config.model, config.chunk.chunk_words, config.chunk.overlap_words, config.questions_per_chunk
    );

    // 단일 파일은 실패 시 바로 에러, 폴더는 문서별로 계속 진행
    if docs.len() == 1 {
        return process_document(&docs[0], &generator, chunker.as_ref(), &config, args.preview)
            .await;
    }

    let total_size: u64 = docs.iter().map(|d| d.size).sum();
    println!(
        "[*] 대상 문서: {} 개 ({})",
        docs.len(),
        format_bytes(total_size as usize)
    );

    let mut success_count = 0;
    let mut error_count = 0;

    for (i, doc) in docs.iter().enumerate() {
        println!();
        println!("[{}/{}]", i + 1, docs.len());

        match process_document(doc, &generator, chunker.as_ref(), &config, args.preview).await {
            Ok(()) => success_count += 1,
            Err(e) => {
                println!("[!] 실패: {:#}", e);
                error_count += 1;
            }
        }
    }

    println!();
    println!("[OK] 완료: 성공 {}, 실패 {}", success_count, error_count);

    if success_count == 0 {
        bail!("모든 문서 처리에 실패했습니다");
    }

    Ok(())
}

/// 문서 하나 처리: 추출 → 정제 → 청킹 → 생성 → 저장
async fn process_document(
    doc: &Document,
    generator: &FaqGenerator,
    chunker: &dyn Chunker,
    config: &FaqConfig,
    preview: bool,
) -> Result<()> {
    let name = doc.name();
    println!(
        "[*] [{}] {} ({})",
        doc.format,
        name,
        format_bytes(doc.size as usize)
    );

    let extracted = extract(doc)
        .await
        .with_context(|| format!("텍스트 추출 실패: {}", name))?;

    if let Some(pages) = extracted.page_count {
        println!("    PDF 페이지: {}", pages);
    }

    let text = clean_text(&extracted.text);
    if text.is_empty() {
        return Err(FaqError::NoText(name).into());
    }

    println!(
        "[OK] 추출: {} 문자 / {} 단어",
        text.chars().count(),
        text.split_whitespace().count()
    );

    let chunks = chunker.chunk(&text);
    println!("[OK] 청크 {} 개 생성", chunks.len());
    println!("[*] FAQ 생성 중...");

    let report = generator
        .generate_with_progress(&name, &chunks, print_chunk_progress)
        .await?;

    print_report(&report);

    let written = write_exports(&report.faqs, &config.formats, &config.output_dir, Local::now())?;
    for path in &written {
        println!("     저장: {}", path.display());
    }

    if preview {
        print_preview(&report.faqs);
    }

    Ok(())
}

/// 연결 테스트 명령어 (check)
async fn cmd_check(model: &str, api_key: Option<&str>) -> Result<()> {
    let api_key = resolve_api_key(api_key)?;
    let client = GeminiClient::with_base_url(api_key, model, api_base_from_env())?;

    println!("[*] 연결 테스트 중: {}", model);
    client.check_connection().await?;
    println!("[OK] {} 준비 완료", model);

    Ok(())
}

/// 변환 명령어 (convert)
fn cmd_convert(input: &Path, formats: Vec<ExportFormat>, output_dir: Option<PathBuf>) -> Result<()> {
    let loaded = load_json_export(input)?;

    let formats = if formats.is_empty() {
        vec![ExportFormat::Markdown, ExportFormat::Html]
    } else {
        unique_formats(formats)
    };

    let output_dir = output_dir.unwrap_or_else(|| {
        input
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    });

    let generated_at = loaded.generated_at.unwrap_or_else(Local::now);
    let written = write_exports(&loaded.faqs, &formats, &output_dir, generated_at)?;

    println!(
        "[OK] {} ({} FAQs) 변환 완료",
        loaded.faqs.document,
        loaded.faqs.len()
    );
    for path in &written {
        println!("     저장: {}", path.display());
    }

    Ok(())
}

/// 모델 목록 명령어 (models)
fn cmd_models() {
    println!("지원 모델:");
    for model in SUPPORTED_MODELS {
        if *model == DEFAULT_MODEL {
            println!("  {} (기본)", model);
        } else {
            println!("  {}", model);
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 기본값 + 환경변수 + CLI 플래그로 설정 구성
fn build_config(args: &GenerateArgs) -> Result<FaqConfig> {
    let mut config = FaqConfig::from_env();

    if let Some(ref model) = args.model {
        config.model = model.clone();
    }
    if let Some(chunk_size) = args.chunk_size {
        config.chunk.chunk_words = chunk_size;
    }
    if let Some(overlap) = args.overlap {
        config.chunk.overlap_words = overlap;
    }
    if let Some(questions) = args.questions {
        config.questions_per_chunk = questions;
    }
    if let Some(ref dir) = args.output_dir {
        config.output_dir = dir.clone();
    }
    if !args.formats.is_empty() {
        config.formats = unique_formats(args.formats.clone());
    }

    config.validate()?;
    Ok(config)
}

/// 중복 형식 제거 (순서 유지)
fn unique_formats(formats: Vec<ExportFormat>) -> Vec<ExportFormat> {
    let mut unique = Vec::with_capacity(formats.len());
    for format in formats {
        if !unique.contains(&format) {
            unique.push(format);
        }
    }
    unique
}

fn print_chunk_progress(progress: &ChunkProgress) {
    match &progress.outcome {
        Ok(count) => println!(
            "    [{}/{}] {} FAQs",
            progress.chunk_num, progress.total_chunks, count
        ),
        Err(e) => println!(
            "    [{}/{}] 실패: {}",
            progress.chunk_num,
            progress.total_chunks,
            truncate_text(e, 200)
        ),
    }
}

fn print_report(report: &GenerationReport) {
    println!(
        "[OK] 고유 FAQ {} 개 생성 (중복 {} 개 제거)",
        report.faqs.len(),
        report.duplicates_removed()
    );
    if report.chunks_failed > 0 {
        println!(
            "[!] 청크 {}/{} 개 실패",
            report.chunks_failed, report.chunks_total
        );
    }
}

fn print_preview(faqs: &FaqSet) {
    println!();
    for (i, faq) in faqs.items.iter().enumerate() {
        println!("Q{}: {}", i + 1, faq.question);
        println!("    {}", faq.answer);
        println!();
    }
}

/// 텍스트 자르기 (UTF-8 안전)
fn truncate_text(text: &str, max_chars: usize) -> String {
    let cleaned = text.replace('\n', " ").replace('\r', "");
    let cleaned = cleaned.trim();

    if cleaned.chars().count() <= max_chars {
        cleaned.to_string()
    } else {
        let truncated: String = cleaned.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

/// 바이트 크기 포맷팅
fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

// ============================================================================
// Tests
// ============================================================================
