//! LanceDB Vector Store - 임베딩 영속화 및 유사도 검색
//!
//! ANN (Approximate Nearest Neighbor) 검색으로 대용량 벡터에서도 빠른 검색을 지원합니다.
//! ref: https://lancedb.github.io/lancedb/

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arrow_array::{
    Array, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray,
};
use arrow_schema::{DataType, Field, Schema};
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::connection::Connection;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::DistanceType;

use crate::error::RagError;

use super::vector::{IndexedRecord, SearchHit, VectorStore, EMBEDDING_DIMENSION};

/// 벡터 테이블 이름
const TABLE_NAME: &str = "embeddings";

/// 저장소 쿼리 타임아웃 (초)
const STORE_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Data Directory
// ============================================================================

/// 데이터 디렉토리 경로 (~/.folio-rag/)
pub fn get_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".folio-rag")
}

// ============================================================================
// LanceVectorStore
// ============================================================================

/// LanceDB 벡터 저장소 구현
///
/// LanceDB는 고성능 벡터 검색을 위한 columnar 데이터베이스입니다.
/// Apache Arrow 기반으로 빠른 읽기/쓰기를 제공합니다.
/// 유사도는 1 - 코사인 거리로 계산합니다: 동일 벡터 1.0, 직교 벡터 0.0.
pub struct LanceVectorStore {
    db: Connection,
}

impl LanceVectorStore {
    /// LanceDB 저장소 열기
    ///
    /// # Arguments
    /// * `path` - .lance 디렉토리 경로
    pub async fn open(path: &Path) -> Result<Self, RagError> {
        // 부모 디렉토리 생성
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    RagError::store(format!("failed to create LanceDB directory: {e}"))
                })?;
            }
        }

        let path_str = path
            .to_str()
            .ok_or_else(|| RagError::store("invalid path encoding"))?;

        let db = lancedb::connect(path_str).execute().await?;

        Ok(Self { db })
    }

    /// 벡터 테이블 스키마 생성
    fn create_schema() -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("content", DataType::Utf8, false),
            Field::new(
                "embedding",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    EMBEDDING_DIMENSION,
                ),
                false,
            ),
            Field::new("source_file", DataType::Utf8, false),
            Field::new("title", DataType::Utf8, true),
            Field::new("heading_path", DataType::Utf8, true),
            Field::new("created_at", DataType::Utf8, false),
            Field::new("updated_at", DataType::Utf8, false),
        ])
    }

    /// 레코드들을 Arrow RecordBatch로 변환
    ///
    /// 차원이 다른 임베딩이 하나라도 있으면 저장소를 건드리기 전에 실패합니다.
    fn records_to_batch(records: &[IndexedRecord]) -> Result<RecordBatch, RagError> {
        if records.is_empty() {
            return Err(RagError::store("cannot create batch from empty records"));
        }

        for record in records {
            if record.embedding.len() != EMBEDDING_DIMENSION as usize {
                return Err(RagError::store(format!(
                    "embedding dimension mismatch: expected {}, got {} (id={})",
                    EMBEDDING_DIMENSION,
                    record.embedding.len(),
                    record.id
                )));
            }
        }

        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        let contents: Vec<&str> = records.iter().map(|r| r.content.as_str()).collect();
        let source_files: Vec<&str> = records.iter().map(|r| r.source_file.as_str()).collect();
        let titles: Vec<Option<&str>> = records.iter().map(|r| r.title.as_deref()).collect();
        let heading_paths: Vec<Option<&str>> =
            records.iter().map(|r| r.heading_path.as_deref()).collect();
        let created: Vec<String> = records.iter().map(|r| r.created_at.to_rfc3339()).collect();
        let updated: Vec<String> = records.iter().map(|r| r.updated_at.to_rfc3339()).collect();

        // 임베딩을 FixedSizeList로 변환
        let embeddings_flat: Vec<f32> = records
            .iter()
            .flat_map(|r| r.embedding.iter().copied())
            .collect();

        let values = Float32Array::from(embeddings_flat);
        let field = Arc::new(Field::new("item", DataType::Float32, true));
        let embeddings_list = FixedSizeListArray::try_new(
            field,
            EMBEDDING_DIMENSION,
            Arc::new(values) as Arc<dyn Array>,
            None,
        )?;

        let batch = RecordBatch::try_new(
            Arc::new(Self::create_schema()),
            vec![
                Arc::new(StringArray::from(ids)),
                Arc::new(StringArray::from(contents)),
                Arc::new(embeddings_list),
                Arc::new(StringArray::from(source_files)),
                Arc::new(StringArray::from(titles)),
                Arc::new(StringArray::from(heading_paths)),
                Arc::new(StringArray::from(created)),
                Arc::new(StringArray::from(updated)),
            ],
        )?;

        Ok(batch)
    }

    /// 테이블 존재 여부 확인
    async fn table_exists(&self) -> bool {
        self.db
            .table_names()
            .execute()
            .await
            .map(|names| names.contains(&TABLE_NAME.to_string()))
            .unwrap_or(false)
    }
}

#[async_trait]
impl VectorStore for LanceVectorStore {
    async fn clear(&self) -> Result<(), RagError> {
        // 없는 테이블 삭제는 no-op 성공
        if !self.table_exists().await {
            return Ok(());
        }

        // 테이블째로 삭제 - 다음 insert가 새로 만든다
        self.db.drop_table(TABLE_NAME).await?;
        tracing::info!("Cleared vector table");
        Ok(())
    }

    async fn insert_batch(&self, records: &[IndexedRecord]) -> Result<usize, RagError> {
        if records.is_empty() {
            return Ok(0);
        }

        let batch = Self::records_to_batch(records)?;
        let schema = batch.schema();

        if self.table_exists().await {
            // 기존 테이블에 추가
            let table = self.db.open_table(TABLE_NAME).execute().await?;

            let batches = RecordBatchIterator::new(vec![Ok(batch)], schema);
            table.add(batches).execute().await?;
        } else {
            // 새 테이블 생성
            let batches = RecordBatchIterator::new(vec![Ok(batch)], schema);
            self.db.create_table(TABLE_NAME, batches).execute().await?;
        }

        Ok(records.len())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchHit>, RagError> {
        if !self.table_exists().await {
            return Ok(vec![]);
        }

        let table = self.db.open_table(TABLE_NAME).execute().await?;

        // 코사인 거리 기반 벡터 검색 (거리 오름차순 = 유사도 내림차순)
        let query_vector = query_embedding.to_vec();
        let fetch = async {
            let stream = table
                .vector_search(query_vector)
                .map_err(RagError::from)?
                .distance_type(DistanceType::Cosine)
                .limit(limit)
                .execute()
                .await
                .map_err(RagError::from)?;

            let batches: Vec<RecordBatch> = stream.try_collect().await.map_err(RagError::from)?;
            Ok::<_, RagError>(batches)
        };

        let batches = tokio::time::timeout(Duration::from_secs(STORE_TIMEOUT_SECS), fetch)
            .await
            .map_err(|_| RagError::Timeout {
                operation: "vector search",
                seconds: STORE_TIMEOUT_SECS,
            })??;

        let mut hits = Vec::new();

        for batch in batches {
            let ids = string_column(&batch, "id")?;
            let contents = string_column(&batch, "content")?;
            let source_files = string_column(&batch, "source_file")?;
            let titles = string_column(&batch, "title")?;
            let heading_paths = string_column(&batch, "heading_path")?;

            // _distance 컬럼 (LanceDB가 자동 추가)
            let distances = batch
                .column_by_name("_distance")
                .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
                .ok_or_else(|| RagError::store("missing _distance column"))?;

            for i in 0..batch.num_rows() {
                // 코사인 거리 -> 유사도
                let similarity = 1.0 - distances.value(i);

                hits.push(SearchHit {
                    id: ids.value(i).to_string(),
                    content: contents.value(i).to_string(),
                    source_file: source_files.value(i).to_string(),
                    title: optional_value(titles, i),
                    heading_path: optional_value(heading_paths, i),
                    similarity,
                });
            }
        }

        Ok(hits)
    }

    async fn count(&self) -> Result<usize, RagError> {
        if !self.table_exists().await {
            return Ok(0);
        }

        let table = self.db.open_table(TABLE_NAME).execute().await?;

        let count = table.count_rows(None).await?;
        Ok(count)
    }
}

// ============================================================================
// Column Helpers
// ============================================================================

/// 문자열 컬럼 추출
fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray, RagError> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| RagError::store(format!("missing {name} column")))
}

/// nullable 문자열 값 추출
fn optional_value(array: &StringArray, index: usize) -> Option<String> {
    if array.is_null(index) {
        None
    } else {
        Some(array.value(index).to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// 지정 축에 1.0을 둔 단위 벡터 레코드
    fn axis_record(content: &str, axis: usize) -> IndexedRecord {
        let mut embedding = vec![0.0; EMBEDDING_DIMENSION as usize];
        embedding[axis] = 1.0;
        IndexedRecord::new(
            content.to_string(),
            embedding,
            "notes/test.md".to_string(),
            Some("Test".to_string()),
            Some(format!("Test > Section {axis}")),
        )
    }

    #[tokio::test]
    async fn test_lance_store_basic() {
        let temp_dir = TempDir::new().unwrap();
        let store = LanceVectorStore::open(&temp_dir.path().join("test.lance"))
            .await
            .unwrap();

        // 초기 상태
        assert_eq!(store.count().await.unwrap(), 0);

        // 삽입
        let records = vec![axis_record("first chunk", 0), axis_record("second chunk", 1)];
        let inserted = store.insert_batch(&records).await.unwrap();
        assert_eq!(inserted, 2);
        assert_eq!(store.count().await.unwrap(), 2);

        // 빈 배치는 no-op
        assert_eq!(store.insert_batch(&[]).await.unwrap(), 0);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let store = LanceVectorStore::open(&temp_dir.path().join("clear.lance"))
            .await
            .unwrap();

        // 빈 저장소 clear도 성공
        store.clear().await.unwrap();

        store
            .insert_batch(&[axis_record("chunk", 0)])
            .await
            .unwrap();
        assert_eq!(store.count().await.unwrap(), 1);

        store.clear().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);

        // 두 번 연속 clear도 성공
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_search_empty_store() {
        let temp_dir = TempDir::new().unwrap();
        let store = LanceVectorStore::open(&temp_dir.path().join("empty.lance"))
            .await
            .unwrap();

        let query = vec![1.0; EMBEDDING_DIMENSION as usize];
        let hits = store.search(&query, 5).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_search_orders_by_similarity() {
        let temp_dir = TempDir::new().unwrap();
        let store = LanceVectorStore::open(&temp_dir.path().join("search.lance"))
            .await
            .unwrap();

        let records = vec![
            axis_record("about axis zero", 0),
            axis_record("about axis one", 1),
            axis_record("about axis two", 2),
        ];
        store.insert_batch(&records).await.unwrap();

        // 축 0 쿼리: 동일 벡터가 1위, 유사도는 1.0 근처
        let mut query = vec![0.0; EMBEDDING_DIMENSION as usize];
        query[0] = 1.0;
        let hits = store.search(&query, 3).await.unwrap();

        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].content, "about axis zero");
        assert!((hits[0].similarity - 1.0).abs() < 0.001);

        // 유사도 내림차순, [0,1] 범위 (부동소수점 오차 허용)
        for pair in hits.windows(2) {
            assert!(pair[0].similarity >= pair[1].similarity);
        }
        for hit in &hits {
            assert!(hit.similarity >= -0.001 && hit.similarity <= 1.001);
        }
    }

    #[tokio::test]
    async fn test_search_respects_limit() {
        let temp_dir = TempDir::new().unwrap();
        let store = LanceVectorStore::open(&temp_dir.path().join("limit.lance"))
            .await
            .unwrap();

        let records: Vec<IndexedRecord> =
            (0..5).map(|i| axis_record(&format!("chunk {i}"), i)).collect();
        store.insert_batch(&records).await.unwrap();

        let mut query = vec![0.0; EMBEDDING_DIMENSION as usize];
        query[0] = 1.0;
        let hits = store.search(&query, 2).await.unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn test_nullable_metadata_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let store = LanceVectorStore::open(&temp_dir.path().join("nulls.lance"))
            .await
            .unwrap();

        let mut embedding = vec![0.0; EMBEDDING_DIMENSION as usize];
        embedding[0] = 1.0;
        let record = IndexedRecord::new(
            "untitled chunk".to_string(),
            embedding.clone(),
            "misc.md".to_string(),
            None,
            None,
        );
        store.insert_batch(&[record]).await.unwrap();

        let hits = store.search(&embedding, 1).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, None);
        assert_eq!(hits[0].heading_path, None);
        assert_eq!(hits[0].source_file, "misc.md");
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejects_whole_batch() {
        let temp_dir = TempDir::new().unwrap();
        let store = LanceVectorStore::open(&temp_dir.path().join("dim.lance"))
            .await
            .unwrap();

        let good = axis_record("good chunk", 0);
        let bad = IndexedRecord::new(
            "bad chunk".to_string(),
            vec![0.1; 8], // 잘못된 차원
            "misc.md".to_string(),
            None,
            None,
        );

        let result = store.insert_batch(&[good, bad]).await;
        assert!(result.is_err());

        // 배치 전체가 거부되어 저장소는 비어 있어야 함
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
