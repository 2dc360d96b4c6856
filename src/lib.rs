//! folio-rag - 마크다운 코퍼스 RAG 인덱싱/검색 엔진
//!
//! 마크다운 문서 트리를 구조 단위 청크로 나누고 OpenAI 임베딩을 생성해
//! LanceDB에 저장한 뒤, 자연어 쿼리에 대해 코사인 유사도 순으로
//! 청크를 돌려주는 파이프라인입니다.

pub mod cli;
pub mod corpus;
pub mod embedding;
pub mod error;
pub mod knowledge;

// Re-exports
pub use corpus::{MarkdownCorpus, SourceDocument};
pub use embedding::{
    create_embedder, get_api_key, has_api_key, EmbeddingProvider, OpenAiEmbedding,
};
pub use error::RagError;
pub use knowledge::{
    cosine_similarity, default_chunker, extract_title, get_data_dir, Chunk, Chunker,
    ContextSnippet, IndexSummary, IndexedRecord, Indexer, LanceVectorStore, MarkdownChunker,
    RetrievedChunk, Retriever, SearchHit, VectorStore, DEFAULT_LIMIT, EMBEDDING_DIMENSION,
};
