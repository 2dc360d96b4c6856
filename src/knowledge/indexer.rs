//! Indexer - 전체 코퍼스 재색인
//!
//! 코퍼스 스캔 -> 청킹 -> 배치 임베딩 -> 저장을 오케스트레이션합니다.
//! 증분 모드는 없습니다: 매 실행이 전체 교체(full replace)입니다.

use std::path::Path;

use crate::corpus::MarkdownCorpus;
use crate::embedding::{create_embedder, EmbeddingProvider};
use crate::error::RagError;

use super::chunker::{default_chunker, Chunker};
use super::lance::LanceVectorStore;
use super::metadata::extract_title;
use super::vector::{IndexedRecord, VectorStore};

// ============================================================================
// Types
// ============================================================================

/// 재색인 실행 요약
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexSummary {
    /// 청크를 1개 이상 색인한 문서 수
    pub documents_indexed: usize,
    /// 발견됐지만 유효 청크가 없어 건너뛴 문서 수
    pub documents_skipped: usize,
    /// 색인된 총 청크 수
    pub chunks_indexed: usize,
}

// ============================================================================
// Indexer
// ============================================================================

/// 전체 재색인 오케스트레이터
///
/// 실행 흐름: clear -> scan -> 문서별 (read -> title -> chunk ->
/// embed_batch -> insert) -> summary.
///
/// 한 문서의 청크 집합은 한 배치로 함께 삽입되므로
/// "부분 색인된 문서"는 생기지 않습니다. 문서 처리 중 어떤 단계든
/// 실패하면 실행 전체가 실패로 끝납니다 - 어중간하게 색인된 코퍼스보다
/// 명확하게 실패한 재색인이 낫습니다.
pub struct Indexer {
    corpus: MarkdownCorpus,
    chunker: Box<dyn Chunker>,
    embedder: Box<dyn EmbeddingProvider>,
    store: Box<dyn VectorStore>,
}

impl Indexer {
    /// 새 인덱서 생성
    ///
    /// # Arguments
    /// * `corpus_root` - 마크다운 코퍼스 루트
    /// * `data_dir` - LanceDB 데이터 디렉토리
    pub async fn new(corpus_root: &Path, data_dir: &Path) -> Result<Self, RagError> {
        if !data_dir.exists() {
            std::fs::create_dir_all(data_dir)
                .map_err(|e| RagError::store(format!("failed to create data directory: {e}")))?;
        }

        let store = LanceVectorStore::open(&data_dir.join("embeddings.lance")).await?;
        let embedder = create_embedder()?;

        Ok(Self::with_components(
            MarkdownCorpus::new(corpus_root),
            default_chunker(),
            Box::new(embedder),
            Box::new(store),
        ))
    }

    /// 구성 요소를 직접 지정하여 생성
    pub fn with_components(
        corpus: MarkdownCorpus,
        chunker: Box<dyn Chunker>,
        embedder: Box<dyn EmbeddingProvider>,
        store: Box<dyn VectorStore>,
    ) -> Self {
        Self {
            corpus,
            chunker,
            embedder,
            store,
        }
    }

    /// 전체 재색인 실행
    ///
    /// 기존 레코드를 모두 삭제한 뒤 코퍼스 전체를 다시 색인합니다.
    /// 문서가 하나도 없으면 빈 요약으로 정상 종료합니다.
    pub async fn run(&self) -> Result<IndexSummary, RagError> {
        tracing::info!("Starting full reindex (corpus: {:?})", self.corpus.root());

        // 1. 기존 레코드 전체 삭제 (전체 교체 설계)
        self.store.clear().await?;

        // 2. 코퍼스 스캔
        let documents = self.corpus.discover()?;
        if documents.is_empty() {
            tracing::info!("No markdown documents found - nothing to index");
            return Ok(IndexSummary::default());
        }

        let mut summary = IndexSummary::default();

        // 3. 문서별 처리 (발견 순서 = 상대 경로 정렬 순서)
        for document in &documents {
            let content = document.read()?;
            let title = extract_title(&content);

            let chunks = self.chunker.chunk(&content);
            if chunks.is_empty() {
                tracing::warn!("No indexable chunks in {}", document.relative_path);
                summary.documents_skipped += 1;
                continue;
            }

            // 문서의 모든 청크를 한 번의 배치 호출로 임베딩
            let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
            let embeddings = self.embedder.embed_batch(&texts).await?;

            let records: Vec<IndexedRecord> = chunks
                .iter()
                .zip(embeddings)
                .map(|(chunk, embedding)| {
                    IndexedRecord::new(
                        chunk.text.clone(),
                        embedding,
                        document.relative_path.clone(),
                        title.clone(),
                        chunk.heading_path(),
                    )
                })
                .collect();

            // 다음 문서로 넘어가기 전에 이 문서의 배치를 커밋
            let inserted = self.store.insert_batch(&records).await?;

            tracing::info!(
                "Indexed {} ({} chunks)",
                document.relative_path,
                inserted
            );

            summary.documents_indexed += 1;
            summary.chunks_indexed += inserted;
        }

        tracing::info!(
            "Reindex complete: {} document(s), {} chunk(s), {} skipped",
            summary.documents_indexed,
            summary.chunks_indexed,
            summary.documents_skipped
        );

        Ok(summary)
    }

    /// 색인된 청크 수
    pub async fn indexed_count(&self) -> Result<usize, RagError> {
        self.store.count().await
    }
}

// ============================================================================
// Tests
// ============================================================================
