//! 테스트용 임베딩 더블
//!
//! 네트워크 없이 인덱서/검색기를 검증하기 위한 결정적 구현입니다.

use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::embedding::EmbeddingProvider;
use crate::error::RagError;

use super::vector::EMBEDDING_DIMENSION;

/// 결정적 bag-of-words 임베딩
///
/// 단어를 해시해 고정 차원에 가중치를 쌓고 정규화합니다.
/// 단어가 겹치는 텍스트끼리 코사인 유사도가 높아지므로
/// 순위 검증에 쓸 수 있습니다.
pub struct MockEmbedding {
    dimension: usize,
}

impl MockEmbedding {
    pub fn new() -> Self {
        Self {
            dimension: EMBEDDING_DIMENSION as usize,
        }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];

        for word in text.split_whitespace() {
            let word: String = word
                .chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase();
            if word.is_empty() {
                continue;
            }

            let mut hasher = DefaultHasher::new();
            word.hash(&mut hasher);
            let dim = (hasher.finish() as usize) % self.dimension;
            vector[dim] += 1.0;
        }

        // 정규화 (모두 0이면 첫 차원에 1)
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        } else {
            vector[0] = 1.0;
        }

        vector
    }
}

impl Default for MockEmbedding {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        Ok(self.embed_text(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "mock-bag-of-words"
    }
}

/// 항상 실패하는 임베딩 (실행 중단 경로 검증용)
pub struct FailingEmbedding;

#[async_trait]
impl EmbeddingProvider for FailingEmbedding {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, RagError> {
        Err(RagError::provider("simulated provider failure"))
    }

    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        Err(RagError::provider("simulated provider failure"))
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIMENSION as usize
    }

    fn name(&self) -> &str {
        "mock-failing"
    }
}
