//! 에러 타입 정의
//!
//! 코어 파이프라인에서 발생하는 실패를 종류별로 구분합니다.
//! 호출자가 타임아웃과 프로바이더/저장소 오류를 구분하여
//! 재시도 여부를 결정할 수 있도록 별도 배리언트로 둡니다.

use std::path::PathBuf;

use thiserror::Error;

// ============================================================================
// RagError
// ============================================================================

/// RAG 코어 에러
///
/// 재시도 정책은 코어에 없습니다. 실패는 즉시 호출자로 전파되며,
/// 재시도/백오프가 필요하면 CLI 등 오케스트레이션 계층에서 처리합니다.
#[derive(Debug, Error)]
pub enum RagError {
    /// 임베딩 프로바이더 오류 (인증, rate limit, 잘못된 입력, 네트워크)
    #[error("embedding provider error: {0}")]
    Provider(String),

    /// 벡터 저장소 오류 (연결 실패, 제약 위반, 차원 불일치)
    #[error("vector store error: {0}")]
    Store(String),

    /// 타임아웃 (임베딩 호출 또는 저장소 쿼리)
    ///
    /// Provider/Store 오류와 구분됩니다. 호출자가 재시도할 가치가
    /// 있는지 판단하는 기준이 됩니다.
    #[error("{operation} timed out after {seconds}s")]
    Timeout {
        operation: &'static str,
        seconds: u64,
    },

    /// 코퍼스 문서 읽기 실패
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RagError {
    /// 프로바이더 오류 생성
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    /// 저장소 오류 생성
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// 타임아웃 여부
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl From<lancedb::Error> for RagError {
    fn from(err: lancedb::Error) -> Self {
        Self::Store(err.to_string())
    }
}

impl From<arrow_schema::ArrowError> for RagError {
    fn from(err: arrow_schema::ArrowError) -> Self {
        Self::Store(err.to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_is_distinguishable() {
        let err = RagError::Timeout {
            operation: "vector search",
            seconds: 30,
        };
        assert!(err.is_timeout());
        assert!(!RagError::provider("boom").is_timeout());
        assert!(!RagError::store("boom").is_timeout());
    }

    #[test]
    fn test_error_display() {
        let err = RagError::provider("401 Unauthorized");
        assert_eq!(err.to_string(), "embedding provider error: 401 Unauthorized");

        let err = RagError::Timeout {
            operation: "embedding request",
            seconds: 30,
        };
        assert_eq!(err.to_string(), "embedding request timed out after 30s");
    }
}
