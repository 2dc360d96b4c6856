//! Retriever - 쿼리 시점 유사도 검색
//!
//! 쿼리 임베딩 -> 저장소 검색 -> 결과 매핑의 읽기 전용 경로입니다.
//! 상태가 없으므로 여러 호출이 동시에 실행되어도 안전합니다.

use std::path::Path;

use crate::embedding::{create_embedder, EmbeddingProvider};
use crate::error::RagError;

use super::lance::LanceVectorStore;
use super::vector::VectorStore;

/// 기본 검색 결과 수
pub const DEFAULT_LIMIT: usize = 10;

// ============================================================================
// Types
// ============================================================================

/// 검색된 청크
///
/// 단일 검색 호출 동안만 유효한 요청 스코프 값입니다.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    /// 청크 텍스트
    pub content: String,
    /// 원본 문서 경로
    pub source_file: String,
    /// 문서 제목
    pub title: Option<String>,
    /// 헤딩 경로
    pub heading_path: Option<String>,
    /// 유사도 (소수점 2자리 반올림, 높을수록 관련)
    pub similarity: f32,
}

/// 채팅 계층에 제공하는 컨텍스트 스니펫
///
/// source는 인용 라벨: 헤딩 경로, 제목, 파일 경로 중
/// 처음으로 비어 있지 않은 값입니다.
#[derive(Debug, Clone)]
pub struct ContextSnippet {
    pub content: String,
    pub source: String,
    pub similarity: f32,
}

// ============================================================================
// Retriever
// ============================================================================

/// 유사도 검색기
pub struct Retriever {
    embedder: Box<dyn EmbeddingProvider>,
    store: Box<dyn VectorStore>,
}

impl Retriever {
    /// 새 검색기 생성
    ///
    /// # Arguments
    /// * `data_dir` - LanceDB 데이터 디렉토리
    pub async fn new(data_dir: &Path) -> Result<Self, RagError> {
        let store = LanceVectorStore::open(&data_dir.join("embeddings.lance")).await?;
        let embedder = create_embedder()?;

        Ok(Self::with_components(Box::new(embedder), Box::new(store)))
    }

    /// 구성 요소를 직접 지정하여 생성
    pub fn with_components(
        embedder: Box<dyn EmbeddingProvider>,
        store: Box<dyn VectorStore>,
    ) -> Self {
        Self { embedder, store }
    }

    /// 쿼리와 가장 유사한 청크 검색
    ///
    /// 결과는 유사도 내림차순이며 최대 limit개입니다.
    /// 빈 저장소나 일치 없음은 빈 목록 - 에러가 아닙니다.
    /// 임베딩 호출이나 저장소 쿼리 실패는 그대로 전파됩니다.
    pub async fn retrieve(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<RetrievedChunk>, RagError> {
        // 1. 쿼리 임베딩 (단건)
        let query_embedding = self.embedder.embed(query).await?;

        // 2. 저장소 검색
        let hits = self.store.search(&query_embedding, limit).await?;

        tracing::debug!("Query matched {} chunk(s)", hits.len());

        // 3. 결과 매핑 (표시 안정성을 위해 유사도 2자리 반올림)
        Ok(hits
            .into_iter()
            .map(|hit| RetrievedChunk {
                content: hit.content,
                source_file: hit.source_file,
                title: hit.title,
                heading_path: hit.heading_path,
                similarity: round_similarity(hit.similarity),
            })
            .collect())
    }

    /// 채팅 계층용 검색
    ///
    /// 기본 limit으로 검색하고 인용 라벨을 붙여 반환합니다.
    pub async fn search(&self, query: &str) -> Result<Vec<ContextSnippet>, RagError> {
        let chunks = self.retrieve(query, DEFAULT_LIMIT).await?;

        Ok(chunks
            .into_iter()
            .map(|chunk| {
                let source = source_label(&chunk);
                ContextSnippet {
                    content: chunk.content,
                    source,
                    similarity: chunk.similarity,
                }
            })
            .collect())
    }

    /// 색인된 청크 수
    pub async fn indexed_count(&self) -> Result<usize, RagError> {
        self.store.count().await
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 유사도를 소수점 2자리로 반올림
fn round_similarity(similarity: f32) -> f32 {
    (similarity * 100.0).round() / 100.0
}

/// 인용 라벨 선택: 헤딩 경로 > 제목 > 파일 경로
fn source_label(chunk: &RetrievedChunk) -> String {
    chunk
        .heading_path
        .as_deref()
        .filter(|s| !s.is_empty())
        .or_else(|| chunk.title.as_deref().filter(|s| !s.is_empty()))
        .unwrap_or(&chunk.source_file)
        .to_string()
}

// ============================================================================
// Tests
// ============================================================================
