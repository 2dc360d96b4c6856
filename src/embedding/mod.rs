//! 임베딩 모듈 - OpenAI API를 통한 텍스트 벡터화
//!
//! 청크 텍스트를 고정 차원 벡터로 변환하는 임베딩 프로바이더입니다.
//! 시맨틱 검색을 위한 핵심 모듈입니다.
//!
//! ## 사용법
//! ```rust,ignore
//! let embedder = OpenAiEmbedding::from_env()?;
//! let vectors = embedder.embed_batch(&chunks).await?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RagError;

// ============================================================================
// EmbeddingProvider Trait
// ============================================================================

/// 임베딩 프로바이더 트레이트
///
/// 텍스트를 벡터로 변환하는 인터페이스입니다.
/// `embed_batch`는 입력 순서와 길이를 보존합니다:
/// `output[i]`는 항상 `texts[i]`의 임베딩입니다.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// 단일 텍스트 임베딩
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError>;

    /// 배치 임베딩 (순서/길이 보존)
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError>;

    /// 임베딩 차원 수
    fn dimension(&self) -> usize;

    /// 프로바이더 이름
    fn name(&self) -> &str;
}

// ============================================================================
// OpenAI Embedding
// ============================================================================

/// OpenAI 임베딩 API 엔드포인트
/// ref: https://platform.openai.com/docs/api-reference/embeddings
const OPENAI_EMBED_URL: &str = "https://api.openai.com/v1/embeddings";

/// 기본 임베딩 모델
pub const DEFAULT_MODEL: &str = "text-embedding-3-small";

/// 기본 임베딩 차원 (text-embedding-3-small)
pub const DEFAULT_DIMENSION: usize = 1536;

/// 요청당 최대 입력 수
///
/// API 상한(2048)보다 훨씬 낮게 잡아 요청 본문을 작게 유지합니다.
/// 이를 넘는 배치는 나누어 호출하고 결과를 순서대로 이어 붙입니다.
const MAX_BATCH_INPUTS: usize = 100;

/// HTTP 요청 타임아웃 (초)
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// OpenAI 임베딩 구현체
///
/// 내부 재시도는 하지 않습니다. 프로바이더 오류는 배치 전체 실패로
/// 즉시 전파되며, 재시도 정책은 호출자 몫입니다.
#[derive(Debug)]
pub struct OpenAiEmbedding {
    api_key: String,
    model: String,
    client: reqwest::Client,
    dimension: usize,
}

impl OpenAiEmbedding {
    /// 새 OpenAI 임베딩 인스턴스 생성
    ///
    /// # Arguments
    /// * `api_key` - OpenAI API 키
    /// * `model` - 임베딩 모델 식별자
    pub fn new(api_key: String, model: String) -> Result<Self, RagError> {
        if api_key.trim().is_empty() {
            return Err(RagError::provider("API key is empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| RagError::provider(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            api_key,
            model,
            client,
            dimension: DEFAULT_DIMENSION,
        })
    }

    /// 환경변수에서 생성
    ///
    /// API 키는 `OPENAI_API_KEY`, 모델은 `OPENAI_EMBEDDING_MODEL`
    /// (미설정 시 text-embedding-3-small)을 사용합니다.
    pub fn from_env() -> Result<Self, RagError> {
        let api_key = get_api_key()?;
        let model =
            std::env::var("OPENAI_EMBEDDING_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Self::new(api_key, model)
    }

    /// 단일 하위 배치 임베딩 (MAX_BATCH_INPUTS 이하)
    async fn embed_sub_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        let request = EmbedRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .client
            .post(OPENAI_EMBED_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RagError::provider(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            // 에러 본문 파싱 시도 (실패하면 원문 그대로)
            if let Ok(error) = serde_json::from_str::<OpenAiError>(&body) {
                return Err(RagError::provider(format!(
                    "{}: {}",
                    status, error.error.message
                )));
            }
            return Err(RagError::provider(format!("{status}: {body}")));
        }

        let mut parsed: EmbedResponse = serde_json::from_str(&body)
            .map_err(|e| RagError::provider(format!("failed to parse embedding response: {e}")))?;

        // index 기준 정렬 후 입력과 1:1 대응 확인
        parsed.data.sort_by_key(|entry| entry.index);

        if parsed.data.len() != texts.len() {
            return Err(RagError::provider(format!(
                "provider returned {} embeddings for {} inputs",
                parsed.data.len(),
                texts.len()
            )));
        }

        let mut vectors = Vec::with_capacity(parsed.data.len());
        for entry in parsed.data {
            if entry.embedding.len() != self.dimension {
                return Err(RagError::provider(format!(
                    "expected {}-dim embedding, got {}",
                    self.dimension,
                    entry.embedding.len()
                )));
            }
            vectors.push(entry.embedding);
        }

        Ok(vectors)
    }
}

/// reqwest 오류를 RagError로 변환 (타임아웃은 별도 배리언트)
fn map_request_error(err: reqwest::Error) -> RagError {
    if err.is_timeout() {
        RagError::Timeout {
            operation: "embedding request",
            seconds: REQUEST_TIMEOUT_SECS,
        }
    } else {
        RagError::provider(format!("failed to send embedding request: {err}"))
    }
}

/// OpenAI API 요청 본문
/// ref: https://platform.openai.com/docs/api-reference/embeddings
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

/// OpenAI API 응답
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Debug, Deserialize)]
struct EmbedData {
    embedding: Vec<f32>,
    index: usize,
}

/// OpenAI API 에러 응답
#[derive(Debug, Deserialize)]
struct OpenAiError {
    error: OpenAiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    message: String,
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| RagError::provider("provider returned no embedding"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let mut vectors = Vec::with_capacity(texts.len());

        for (i, sub_batch) in texts.chunks(MAX_BATCH_INPUTS).enumerate() {
            tracing::debug!(
                "Embedding sub-batch {}/{} ({} inputs)",
                i + 1,
                texts.len().div_ceil(MAX_BATCH_INPUTS),
                sub_batch.len()
            );
            vectors.extend(self.embed_sub_batch(sub_batch).await?);
        }

        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// API Key Management
// ============================================================================

/// API 키 로드 (OPENAI_API_KEY 환경변수)
pub fn get_api_key() -> Result<String, RagError> {
    if let Ok(key) = std::env::var("OPENAI_API_KEY") {
        if !key.is_empty() {
            return Ok(key);
        }
    }

    Err(RagError::provider(
        "API key not found. Set OPENAI_API_KEY environment variable.",
    ))
}

/// API 키 존재 여부 확인
pub fn has_api_key() -> bool {
    std::env::var("OPENAI_API_KEY")
        .map(|key| !key.is_empty())
        .unwrap_or(false)
}

// ============================================================================
// Factory Function
// ============================================================================

/// 임베딩 프로바이더 생성 (OpenAI API)
///
/// 환경변수에서 API 키와 모델명을 읽어 OpenAiEmbedding을 생성합니다.
pub fn create_embedder() -> Result<OpenAiEmbedding, RagError> {
    let embedder = OpenAiEmbedding::from_env()?;
    tracing::info!(
        "Using OpenAI embedding model {} (dimension: {})",
        embedder.name(),
        embedder.dimension()
    );
    Ok(embedder)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_api_key_rejected() {
        let result = OpenAiEmbedding::new("  ".to_string(), DEFAULT_MODEL.to_string());
        assert!(result.is_err());
    }

    #[test]
    fn test_provider_name_is_model() {
        let embedder =
            OpenAiEmbedding::new("test-key".to_string(), "text-embedding-3-large".to_string())
                .unwrap();
        assert_eq!(embedder.name(), "text-embedding-3-large");
        assert_eq!(embedder.dimension(), DEFAULT_DIMENSION);
    }

    #[test]
    fn test_request_serialization() {
        let input = vec!["hello".to_string(), "world".to_string()];
        let request = EmbedRequest {
            model: "text-embedding-3-small",
            input: &input,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "text-embedding-3-small");
        assert_eq!(json["input"][0], "hello");
        assert_eq!(json["input"][1], "world");
    }

    #[test]
    fn test_response_index_ordering() {
        // 프로바이더가 순서를 섞어 돌려줘도 index로 복원되는지 확인
        let body = r#"{"data":[
            {"embedding":[2.0],"index":1},
            {"embedding":[1.0],"index":0}
        ]}"#;

        let mut parsed: EmbedResponse = serde_json::from_str(body).unwrap();
        parsed.data.sort_by_key(|e| e.index);

        assert_eq!(parsed.data[0].embedding, vec![1.0]);
        assert_eq!(parsed.data[1].embedding, vec![2.0]);
    }

    #[test]
    fn test_sub_batch_split_sizes() {
        let texts: Vec<String> = (0..250).map(|i| format!("text {i}")).collect();
        let sizes: Vec<usize> = texts.chunks(MAX_BATCH_INPUTS).map(|c| c.len()).collect();
        assert_eq!(sizes, vec![100, 100, 50]);
    }

    #[tokio::test]
    async fn test_embed_batch_empty_input() {
        let embedder =
            OpenAiEmbedding::new("test-key".to_string(), DEFAULT_MODEL.to_string()).unwrap();
        let vectors = embedder.embed_batch(&[]).await.unwrap();
        assert!(vectors.is_empty());
    }
}
