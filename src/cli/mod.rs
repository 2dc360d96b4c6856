//! CLI 모듈
//!
//! folio-rag CLI 명령어 정의 및 구현.
//! 재시도/백오프 정책이 필요하다면 이 계층의 몫입니다 - 코어는 fail-fast.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use crate::embedding::has_api_key;
use crate::knowledge::{get_data_dir, Indexer, LanceVectorStore, Retriever, VectorStore};

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "folio-rag")]
#[command(version, about = "마크다운 코퍼스 RAG 인덱싱/검색 엔진", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 코퍼스 전체 재색인 (기존 색인은 모두 교체)
    Index {
        /// 코퍼스 루트 디렉토리
        #[arg(short, long, default_value = "data/content")]
        dir: PathBuf,

        /// 데이터 디렉토리 (기본: ~/.folio-rag)
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// 색인 검색
    Query {
        /// 검색 쿼리
        query: String,

        /// 결과 개수 제한
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// 데이터 디렉토리 (기본: ~/.folio-rag)
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// 상태 확인
    Status {
        /// 데이터 디렉토리 (기본: ~/.folio-rag)
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

// ============================================================================
// CLI Runner
// ============================================================================

/// CLI 명령어 실행
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Index { dir, data_dir } => cmd_index(dir, resolve_data_dir(data_dir)).await,
        Commands::Query {
            query,
            limit,
            data_dir,
        } => cmd_query(&query, limit, resolve_data_dir(data_dir)).await,
        Commands::Status { data_dir } => cmd_status(resolve_data_dir(data_dir)).await,
    }
}

/// 데이터 디렉토리 결정 (옵션 > 기본 경로)
fn resolve_data_dir(data_dir: Option<PathBuf>) -> PathBuf {
    data_dir.unwrap_or_else(get_data_dir)
}

// ============================================================================
// Command Implementations
// ============================================================================

/// 재색인 명령어 (index)
///
/// 기존 레코드를 전부 삭제하고 코퍼스 전체를 다시 색인합니다.
async fn cmd_index(dir: PathBuf, data_dir: PathBuf) -> Result<()> {
    ensure_api_key()?;

    println!("[*] 전체 재색인 시작: {}", dir.display());

    let indexer = Indexer::new(&dir, &data_dir)
        .await
        .context("Indexer 초기화 실패")?;

    let summary = indexer.run().await.context("재색인 실패")?;

    if summary.documents_indexed == 0 && summary.documents_skipped == 0 {
        println!("[!] 마크다운 문서가 없습니다: {}", dir.display());
        println!("    .md 파일을 추가한 뒤 다시 실행하세요.");
        return Ok(());
    }

    println!("[OK] 재색인 완료");
    println!("     문서: {} 건", summary.documents_indexed);
    if summary.documents_skipped > 0 {
        println!("     건너뜀: {} 건 (유효 청크 없음)", summary.documents_skipped);
    }
    println!("     청크: {} 건", summary.chunks_indexed);

    Ok(())
}

/// 검색 명령어 (query)
async fn cmd_query(query: &str, limit: usize, data_dir: PathBuf) -> Result<()> {
    ensure_api_key()?;

    println!("[*] 검색 중: \"{}\"", query);

    let retriever = Retriever::new(&data_dir)
        .await
        .context("Retriever 초기화 실패")?;

    let results = retriever
        .retrieve(query, limit)
        .await
        .context("검색 실패")?;

    if results.is_empty() {
        println!("\n[!] 관련 컨텍스트를 찾지 못했습니다.");
        return Ok(());
    }

    println!("\n[OK] 검색 결과 ({} 건):\n", results.len());

    for (i, result) in results.iter().enumerate() {
        println!("{}. [유사도: {:.2}] {}", i + 1, result.similarity, result.source_file);

        if let Some(ref title) = result.title {
            println!("   제목: {}", title);
        }
        if let Some(ref heading_path) = result.heading_path {
            println!("   위치: {}", heading_path);
        }
        println!("   내용: {}", truncate_text(&result.content, 200));
        println!();
    }

    Ok(())
}

/// 상태 명령어 (status)
async fn cmd_status(data_dir: PathBuf) -> Result<()> {
    println!("folio-rag v{}", env!("CARGO_PKG_VERSION"));
    println!();

    // 데이터 디렉토리
    println!("[*] 데이터 디렉토리: {}", data_dir.display());

    // API 키 상태
    if has_api_key() {
        println!("[OK] API 키: 설정됨");
    } else {
        println!("[!] API 키: 미설정");
        println!("    설정: export OPENAI_API_KEY=your-key");
    }

    // 색인 상태 (API 키 없이도 조회 가능)
    match LanceVectorStore::open(&data_dir.join("embeddings.lance")).await {
        Ok(store) => match store.count().await {
            Ok(count) => {
                println!("[OK] 색인된 청크: {} 건", count);
            }
            Err(e) => {
                println!("[!] 색인 조회 실패: {}", e);
            }
        },
        Err(e) => {
            tracing::debug!("Vector store open failed: {}", e);
            println!("[!] 색인 없음 (아직 index를 실행하지 않았습니다)");
        }
    }

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// API 키 확인 (없으면 안내와 함께 종료)
fn ensure_api_key() -> Result<()> {
    if !has_api_key() {
        bail!(
            "API 키가 설정되지 않았습니다.\n\n\
             설정 방법:\n  \
             export OPENAI_API_KEY=your-api-key\n\n\
             선택: export OPENAI_EMBEDDING_MODEL=text-embedding-3-small"
        );
    }
    Ok(())
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

// ============================================================================
// Tests
// ============================================================================
