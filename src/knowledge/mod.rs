//! Knowledge 모듈 - RAG 색인/검색 코어
//!
//! - Chunker: Markdown 헤딩 경계 기반 텍스트 분할
//! - Metadata: 문서 수준 제목 추출
//! - LanceDB: 임베딩 영속화 및 코사인 유사도 검색 (ANN)
//! - Indexer: 전체 코퍼스 재색인 (full replace)
//! - Retriever: 쿼리 시점 유사도 검색

mod chunker;
mod indexer;
mod lance;
mod metadata;
mod retriever;
mod vector;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports
pub use chunker::{default_chunker, Chunk, Chunker, MarkdownChunker, HEADING_SEPARATOR};
pub use indexer::{IndexSummary, Indexer};
pub use lance::{get_data_dir, LanceVectorStore};
pub use metadata::extract_title;
pub use retriever::{ContextSnippet, RetrievedChunk, Retriever, DEFAULT_LIMIT};
pub use vector::{
    cosine_similarity, generate_record_id, IndexedRecord, SearchHit, VectorStore,
    EMBEDDING_DIMENSION,
};
