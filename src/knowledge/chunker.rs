//! 텍스트 청킹 모듈
//!
//! Markdown 구조 경계 기반 텍스트 분할을 제공합니다.
//! 각 청크는 자신이 속한 헤딩 계층 경로를 함께 가집니다.

use regex::Regex;

// ============================================================================
// Chunk
// ============================================================================

/// 구조 단위 청크
///
/// 문서의 한 헤딩 섹션에 해당하는 텍스트와,
/// 그 섹션까지의 헤딩 경로(바깥쪽부터 순서대로)를 가집니다.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// 섹션 텍스트 (헤딩 라인 포함, 앞뒤 공백 제거됨, 비어있지 않음)
    pub text: String,
    /// 헤딩 경로: 최상위 조상부터 이 섹션의 헤딩까지
    /// 헤딩 이전의 서두 텍스트라면 비어 있음
    pub headings: Vec<String>,
}

/// 헤딩 경로 구분자
pub const HEADING_SEPARATOR: &str = " > ";

impl Chunk {
    /// 헤딩 경로를 " > "로 이어붙인 문자열 (경로가 없으면 None)
    pub fn heading_path(&self) -> Option<String> {
        if self.headings.is_empty() {
            None
        } else {
            Some(self.headings.join(HEADING_SEPARATOR))
        }
    }
}

// ============================================================================
// Chunker Trait
// ============================================================================

/// 텍스트 청킹 전략 트레이트
pub trait Chunker: Send + Sync {
    /// 텍스트를 임베딩 대상 청크로 분할
    ///
    /// 제목뿐인 섹션은 걸러진 뒤의 목록입니다.
    fn chunk(&self, text: &str) -> Vec<Chunk>;

    /// 청커 이름
    fn name(&self) -> &'static str;
}

// ============================================================================
// MarkdownChunker
// ============================================================================

/// 제목뿐인 청크 판정 길이 (문자 수)
///
/// 줄바꿈이 없고 이 길이 이하인 청크는 헤딩 외 정보가 없어
/// 임베딩 비용만 낭비하므로 색인에서 제외합니다.
const TITLE_ONLY_MAX_CHARS: usize = 100;

/// Markdown 인식 청커
///
/// Markdown 구조를 존중하면서 텍스트를 분할합니다:
/// - 헤딩(`#`~`######`) 경계에서만 분할
/// - 코드 블록 내부의 `#` 라인은 헤딩으로 취급하지 않음
/// - 헤딩이 전혀 없는 문서는 통째로 한 청크
pub struct MarkdownChunker {
    heading_re: Regex,
}

impl MarkdownChunker {
    /// 새 청커 생성
    pub fn new() -> Self {
        Self {
            heading_re: Regex::new(r"^(#{1,6})\s+(.*)$").unwrap(),
        }
    }

    /// Markdown을 헤딩 경계로 섹션 분할 (필터 적용 전)
    fn split_sections(&self, text: &str) -> Vec<Chunk> {
        let mut sections = Vec::new();
        // (레벨, 헤딩 텍스트) 조상 스택
        let mut stack: Vec<(usize, String)> = Vec::new();
        let mut current = String::new();
        let mut current_headings: Vec<String> = Vec::new();
        let mut in_code_block = false;

        for line in text.lines() {
            // 코드 블록 추적
            if line.trim_start().starts_with("```") {
                in_code_block = !in_code_block;
            }

            // 코드 블록 내부가 아닌 헤딩에서 새 섹션 시작
            if !in_code_block {
                if let Some(caps) = self.heading_re.captures(line) {
                    if !current.trim().is_empty() {
                        sections.push(Chunk {
                            text: current.trim().to_string(),
                            headings: current_headings.clone(),
                        });
                    }
                    current.clear();

                    // 같거나 깊은 레벨의 조상 제거 후 현재 헤딩 푸시
                    let level = caps[1].len();
                    let title = caps[2].trim().to_string();
                    while stack.last().map(|(l, _)| *l >= level).unwrap_or(false) {
                        stack.pop();
                    }
                    stack.push((level, title));
                    current_headings = stack.iter().map(|(_, t)| t.clone()).collect();
                }
            }

            current.push_str(line);
            current.push('\n');
        }

        // 마지막 섹션 추가
        if !current.trim().is_empty() {
            sections.push(Chunk {
                text: current.trim().to_string(),
                headings: current_headings,
            });
        }

        sections
    }
}

impl Default for MarkdownChunker {
    fn default() -> Self {
        Self::new()
    }
}

impl Chunker for MarkdownChunker {
    fn chunk(&self, text: &str) -> Vec<Chunk> {
        if text.trim().is_empty() {
            return vec![];
        }

        let sections = self.split_sections(text);
        let total = sections.len();

        // 제목뿐인 섹션 제거
        let chunks: Vec<Chunk> = sections.into_iter().filter(|c| !is_title_only(c)).collect();

        if chunks.len() < total {
            tracing::debug!("Skipped {} title-only section(s)", total - chunks.len());
        }

        chunks
    }

    fn name(&self) -> &'static str {
        "MarkdownChunker"
    }
}

/// 제목뿐인 청크 여부
///
/// 줄바꿈이 없고 TITLE_ONLY_MAX_CHARS 이하인 청크는
/// 헤딩 한 줄 외에 검색할 내용이 없습니다.
fn is_title_only(chunk: &Chunk) -> bool {
    !chunk.text.contains('\n') && chunk.text.chars().count() <= TITLE_ONLY_MAX_CHARS
}

// ============================================================================
// Factory Functions
// ============================================================================

/// 기본 청커 생성
pub fn default_chunker() -> Box<dyn Chunker> {
    Box::new(MarkdownChunker::new())
}

// ============================================================================
// Tests
// ============================================================================
