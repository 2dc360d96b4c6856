//! 문서 메타데이터 추출
//!
//! 문서 본문에서 문서 수준 제목을 뽑아냅니다.
//! 제목은 해당 문서의 모든 청크에 동일하게 붙습니다.

use regex::Regex;

/// 문서 제목 추출
///
/// 문서 어디에 있든 첫 번째 최상위(`#` 한 개) 헤딩 라인의 텍스트를
/// 공백 제거 후 반환합니다. 없으면 None.
pub fn extract_title(content: &str) -> Option<String> {
    let re = Regex::new(r"(?m)^#\s+(.+)$").unwrap();
    re.captures(content)
        .map(|caps| caps[1].trim().to_string())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_title_first_line() {
        assert_eq!(
            extract_title("# About Me\n\nSome text."),
            Some("About Me".to_string())
        );
    }

    #[test]
    fn test_extract_title_not_first_line() {
        // 최상위 헤딩이 문서 중간에 있어도 찾는다
        let content = "preamble text\n\n# Projects\n\n## One\n";
        assert_eq!(extract_title(content), Some("Projects".to_string()));
    }

    #[test]
    fn test_extract_title_ignores_deeper_headings() {
        assert_eq!(extract_title("## Subsection\ncontent"), None);
        assert_eq!(extract_title("### Deeper\ncontent"), None);
    }

    #[test]
    fn test_extract_title_absent() {
        assert_eq!(extract_title("no headings here at all"), None);
        assert_eq!(extract_title(""), None);
    }

    #[test]
    fn test_extract_title_trims_whitespace() {
        assert_eq!(
            extract_title("#   Spaced Out   \nbody"),
            Some("Spaced Out".to_string())
        );
    }
}
