//! 코퍼스 수집 모듈
//!
//! 코퍼스 루트 아래의 마크다운 문서를 탐색합니다.
//! .gitignore 패턴을 존중하고, `.md` 확장자만 수집합니다.

use std::io;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::error::RagError;

// ============================================================================
// Source Document
// ============================================================================

/// 발견된 코퍼스 문서
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// 파일 절대 경로
    pub path: PathBuf,
    /// 코퍼스 루트 기준 상대 경로 (저장소의 source_file 값)
    pub relative_path: String,
}

impl SourceDocument {
    /// 문서 본문 읽기 (UTF-8)
    pub fn read(&self) -> Result<String, RagError> {
        std::fs::read_to_string(&self.path).map_err(|source| RagError::Read {
            path: self.path.clone(),
            source,
        })
    }
}

// ============================================================================
// Markdown Corpus
// ============================================================================

/// 마크다운 코퍼스
///
/// 루트 디렉토리 트리에서 `.md` 파일을 재귀적으로 탐색합니다.
pub struct MarkdownCorpus {
    root: PathBuf,
}

impl MarkdownCorpus {
    /// 코퍼스 루트 지정하여 생성
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 코퍼스 루트 경로
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 코퍼스 문서 탐색
    ///
    /// 상대 경로 기준으로 정렬된 목록을 반환합니다 (실행 간 순서 고정).
    /// 문서가 없으면 빈 목록 - 에러가 아닙니다.
    pub fn discover(&self) -> Result<Vec<SourceDocument>, RagError> {
        if !self.root.is_dir() {
            return Err(RagError::Read {
                path: self.root.clone(),
                source: io::Error::new(
                    io::ErrorKind::NotFound,
                    "corpus root is not a directory",
                ),
            });
        }

        let mut documents = Vec::new();

        // ignore 크레이트로 .gitignore 지원 (숨김 파일 제외)
        let walker = WalkBuilder::new(&self.root).build();

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!("Failed to read entry: {}", e);
                    continue;
                }
            };

            // 파일만 처리
            if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                continue;
            }

            let path = entry.path();
            if !is_markdown(path) {
                continue;
            }

            let relative_path = path
                .strip_prefix(&self.root)
                .unwrap_or(path)
                .to_string_lossy()
                .replace('\\', "/");

            documents.push(SourceDocument {
                path: path.to_path_buf(),
                relative_path,
            });
        }

        documents.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

        tracing::info!(
            "Discovered {} markdown file(s) under {:?}",
            documents.len(),
            self.root
        );
        Ok(documents)
    }
}

/// `.md` 확장자 여부
fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("md"))
        .unwrap_or(false)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_is_markdown() {
        assert!(is_markdown(Path::new("notes.md")));
        assert!(is_markdown(Path::new("NOTES.MD")));
        assert!(!is_markdown(Path::new("notes.txt")));
        assert!(!is_markdown(Path::new("Makefile")));
    }

    #[test]
    fn test_discover_empty_dir() {
        let temp = TempDir::new().unwrap();
        let corpus = MarkdownCorpus::new(temp.path());

        let docs = corpus.discover().unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn test_discover_missing_root() {
        let corpus = MarkdownCorpus::new("/nonexistent/corpus/root");
        assert!(corpus.discover().is_err());
    }

    #[test]
    fn test_discover_sorted_and_filtered() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("sub")).unwrap();
        std::fs::write(temp.path().join("b.md"), "# B").unwrap();
        std::fs::write(temp.path().join("a.md"), "# A").unwrap();
        std::fs::write(temp.path().join("sub/c.md"), "# C").unwrap();
        std::fs::write(temp.path().join("skip.txt"), "not markdown").unwrap();

        let corpus = MarkdownCorpus::new(temp.path());
        let docs = corpus.discover().unwrap();

        let paths: Vec<&str> = docs.iter().map(|d| d.relative_path.as_str()).collect();
        assert_eq!(paths, vec!["a.md", "b.md", "sub/c.md"]);
    }

    #[test]
    fn test_read_document() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("doc.md"), "# Title\n\nBody text.").unwrap();

        let corpus = MarkdownCorpus::new(temp.path());
        let docs = corpus.discover().unwrap();
        assert_eq!(docs.len(), 1);

        let text = docs[0].read().unwrap();
        assert!(text.starts_with("# Title"));
    }
}
