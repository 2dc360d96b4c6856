//! Vector Store - 벡터 검색 트레이트 및 레코드 타입
//!
//! 색인된 레코드의 스키마와 저장소 공통 인터페이스를 정의합니다.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::RagError;

/// 벡터 임베딩 차원 (OpenAI text-embedding-3-small 기본값)
/// ref: https://platform.openai.com/docs/guides/embeddings
pub const EMBEDDING_DIMENSION: i32 = 1536;

// ============================================================================
// Types
// ============================================================================

/// 색인 레코드 (저장용)
///
/// 전체 재색인 때만 생성되고, 다음 재색인의 clear 단계에서만 삭제됩니다.
/// content는 한 번 쓰면 불변입니다.
#[derive(Debug, Clone)]
pub struct IndexedRecord {
    /// 고유 식별자 (삽입 시점에 부여, 행 수명 동안 고정)
    pub id: String,
    /// 청크 텍스트
    pub content: String,
    /// 임베딩 벡터
    pub embedding: Vec<f32>,
    /// 원본 문서 경로 (코퍼스 루트 기준 상대 경로)
    pub source_file: String,
    /// 문서 수준 제목
    pub title: Option<String>,
    /// 청크 수준 헤딩 경로
    pub heading_path: Option<String>,
    /// 생성 시각 (감사용, 쿼리에는 쓰이지 않음)
    pub created_at: DateTime<Utc>,
    /// 수정 시각 (감사용)
    pub updated_at: DateTime<Utc>,
}

impl IndexedRecord {
    /// 새 레코드 생성 (id와 타임스탬프 자동 부여)
    pub fn new(
        content: String,
        embedding: Vec<f32>,
        source_file: String,
        title: Option<String>,
        heading_path: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: generate_record_id(),
            content,
            embedding,
            source_file,
            title,
            heading_path,
            created_at: now,
            updated_at: now,
        }
    }
}

/// 검색 결과 (저장소가 반환)
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// 레코드 식별자
    pub id: String,
    /// 청크 텍스트
    pub content: String,
    /// 원본 문서 경로
    pub source_file: String,
    /// 문서 제목
    pub title: Option<String>,
    /// 헤딩 경로
    pub heading_path: Option<String>,
    /// 유사도 (1 - 코사인 거리, 높을수록 유사)
    pub similarity: f32,
}

// ============================================================================
// VectorStore Trait
// ============================================================================

/// VectorStore 트레이트 (async)
///
/// 벡터 저장소의 공통 인터페이스입니다.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// 모든 레코드 삭제
    ///
    /// 멱등: 빈 저장소에 대한 호출도 성공입니다.
    async fn clear(&self) -> Result<(), RagError>;

    /// 레코드 배치 삽입
    ///
    /// 한 문서의 청크 집합은 하나의 배치로 함께 삽입됩니다.
    /// 배치 내 어떤 레코드라도 차원이 맞지 않으면
    /// 저장소를 건드리기 전에 배치 전체가 실패합니다.
    async fn insert_batch(&self, records: &[IndexedRecord]) -> Result<usize, RagError>;

    /// 유사도 검색
    ///
    /// limit 이하의 결과를 유사도 내림차순으로 반환합니다.
    /// 빈 저장소는 빈 목록 - 에러가 아닙니다.
    async fn search(&self, query_embedding: &[f32], limit: usize)
        -> Result<Vec<SearchHit>, RagError>;

    /// 레코드 개수 조회
    async fn count(&self) -> Result<usize, RagError>;
}

// ============================================================================
// Utility Functions
// ============================================================================

/// 레코드 id 생성
///
/// UUID v4에서 하이픈을 제거한 앞 20자를 사용합니다.
pub fn generate_record_id() -> String {
    Uuid::new_v4().simple().to_string()[..20].to_string()
}

/// 코사인 유사도 계산
///
/// 두 벡터 간의 코사인 유사도를 계산합니다.
/// 결과는 -1.0 ~ 1.0 범위입니다.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

// ============================================================================
// Tests
// ============================================================================
