//! 페이지 렌더러 -- 인덱스를 PEP 503 정적 HTML 페이지로 변환
//!
//! # 출력 구조
//!
//! 경로는 인덱스 접두사(`index_prefix`) 기준의 상대 경로입니다.
//!
//! ```text
//! index.html               # 루트: 모든 패키지 이름
//! {package}/index.html     # 패키지: 모든 아티팩트 링크
//! {ref}/index.html         # (선택) ref 하위 트리
//! {ref}/{package}/index.html
//! ```
//!
//! # 링크
//!
//! - 상대 모드(기본): 페이지 위치(`{index_prefix}/{package}/`)에서 `raw_key`까지의
//!   상대 경로. 각 경로 구성요소는 퍼센트 인코딩됩니다.
//! - 절대 모드(`base_url` 설정): `{base_url}/{인코딩된 raw_key}`
//! - 다이제스트가 있으면 `#sha256={hex}`를 붙입니다.
//!
//! 같은 인덱스는 항상 바이트 단위로 같은 출력을 만듭니다. 패키지는 이름 순,
//! 아티팩트는 `(filename, raw_key)` 순으로 정렬됩니다.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use html_escape::{encode_double_quoted_attribute, encode_text};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::{debug, warn};

use wheelhouse_core::metrics as m;

use crate::index::{Index, PackageEntry};
use crate::types::ParsedArtifact;

/// 루트 페이지 파일명
pub const INDEX_FILE: &str = "index.html";

/// 경로 구성요소에서 그대로 두는 문자: 영숫자와 `-._~`
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// 링크 기준
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkBase {
    /// 페이지 위치 기준 상대 경로
    Relative,
    /// 버킷 공개 URL 기준 절대 경로 (끝 `/` 제외)
    Absolute(String),
}

impl LinkBase {
    /// `base_url`이 비어 있으면 상대 모드를 반환합니다.
    pub fn from_base_url(base_url: Option<&str>) -> Self {
        match base_url.map(|u| u.trim_end_matches('/')) {
            Some(url) if !url.is_empty() => Self::Absolute(url.to_owned()),
            _ => Self::Relative,
        }
    }
}

/// 렌더링된 페이지 모음 (경로 -> HTML, 경로 순)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedPages {
    pages: BTreeMap<String, String>,
}

impl RenderedPages {
    /// 경로로 페이지 내용을 찾습니다.
    pub fn get(&self, path: &str) -> Option<&str> {
        self.pages.get(path).map(String::as_str)
    }

    /// 경로 순으로 `(경로, 내용)`을 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pages.iter().map(|(p, c)| (p.as_str(), c.as_str()))
    }

    /// 경로 목록 (정렬됨)
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.pages.keys().map(String::as_str)
    }

    /// 페이지 수
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// 페이지가 없는지 여부
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// 전체 바이트 수
    pub fn total_bytes(&self) -> usize {
        self.pages.values().map(String::len).sum()
    }

    fn insert(&mut self, path: String, content: String) {
        self.pages.insert(path, content);
    }
}

/// PEP 503 페이지 렌더러
#[derive(Debug, Clone)]
pub struct PageRenderer {
    /// 인덱스가 게시될 버킷 내 디렉토리 (`/` 없이 정규화)
    index_prefix: String,
    link_base: LinkBase,
}

impl PageRenderer {
    /// 렌더러를 생성합니다.
    pub fn new(index_prefix: &str, link_base: LinkBase) -> Self {
        Self {
            index_prefix: index_prefix.trim_matches('/').to_owned(),
            link_base,
        }
    }

    /// 인덱스 접두사
    pub fn index_prefix(&self) -> &str {
        &self.index_prefix
    }

    /// 링크 기준
    pub fn link_base(&self) -> &LinkBase {
        &self.link_base
    }

    /// 루트 페이지와 패키지 페이지를 렌더링합니다.
    ///
    /// 패키지가 없으면 링크 없는 루트 페이지 하나만 만듭니다.
    pub fn render(&self, index: &Index) -> RenderedPages {
        let mut pages = RenderedPages::default();
        self.render_tree(index, "", &mut pages);
        metrics::counter!(m::RENDER_PAGES_TOTAL).increment(pages.len() as u64);
        debug!(pages = pages.len(), bytes = pages.total_bytes(), "rendered index");
        pages
    }

    /// ref별 하위 트리를 `pages`에 추가하고, 건너뛴 ref 이름을 반환합니다.
    ///
    /// 패키지 이름과 같거나 안전한 경로 구성요소가 아닌 ref는 메인 트리와
    /// 충돌하므로 건너뜁니다.
    pub fn render_refs(
        &self,
        main: &Index,
        refs: &BTreeMap<String, Index>,
        pages: &mut RenderedPages,
    ) -> Vec<String> {
        let before = pages.len();
        let mut skipped = Vec::new();

        for (git_ref, ref_index) in refs {
            if !is_safe_ref(git_ref) {
                warn!(git_ref = %git_ref, "skipping ref index: not a safe path segment");
                skipped.push(git_ref.clone());
                continue;
            }
            if main.contains(git_ref) {
                warn!(git_ref = %git_ref, "skipping ref index: name collides with a package");
                skipped.push(git_ref.clone());
                continue;
            }
            self.render_tree(ref_index, git_ref, pages);
        }

        let added = pages.len() - before;
        metrics::counter!(m::RENDER_PAGES_TOTAL).increment(added as u64);
        debug!(refs = refs.len(), skipped = skipped.len(), pages = added, "rendered ref indexes");
        skipped
    }

    /// `subdir` 아래에 루트 + 패키지 페이지를 만듭니다 (빈 문자열이면 최상위).
    fn render_tree(&self, index: &Index, subdir: &str, pages: &mut RenderedPages) {
        let base = if subdir.is_empty() {
            String::new()
        } else {
            format!("{subdir}/")
        };

        pages.insert(format!("{base}{INDEX_FILE}"), render_root(index));
        for entry in index.packages() {
            let page_dir = join_path(&[self.index_prefix.as_str(), subdir, entry.name()]);
            pages.insert(
                format!("{base}{}/{INDEX_FILE}", entry.name()),
                self.render_package(entry, &page_dir),
            );
        }
    }

    fn render_package(&self, entry: &PackageEntry, page_dir: &str) -> String {
        let mut artifacts: Vec<&ParsedArtifact> = entry.artifacts().iter().collect();
        artifacts.sort_by(|a, b| {
            (a.filename.as_str(), a.raw_key.as_str()).cmp(&(b.filename.as_str(), b.raw_key.as_str()))
        });

        let title = format!("Links for {}", entry.name());
        let mut body = String::new();
        for artifact in artifacts {
            let href = self.href(artifact, page_dir);
            let _ = writeln!(
                body,
                "    <a href=\"{}\">{}</a><br/>",
                encode_double_quoted_attribute(&href),
                encode_text(&artifact.filename)
            );
        }
        document(&title, &body)
    }

    /// 아티팩트 링크 주소
    fn href(&self, artifact: &ParsedArtifact, page_dir: &str) -> String {
        let mut href = match &self.link_base {
            LinkBase::Relative => relative_href(page_dir, &artifact.raw_key),
            LinkBase::Absolute(base) => format!("{base}/{}", encode_key(&artifact.raw_key)),
        };
        if let Some(digest) = &artifact.sha256 {
            let _ = write!(href, "#sha256={digest}");
        }
        href
    }
}

fn render_root(index: &Index) -> String {
    let mut body = String::new();
    for entry in index.packages() {
        let name = encode_text(entry.name());
        let _ = writeln!(
            body,
            "    <a href=\"{}/\">{name}</a><br/>",
            encode_double_quoted_attribute(&encode_segment(entry.name()))
        );
    }
    document("Simple index", &body)
}

fn document(title: &str, body: &str) -> String {
    let title = encode_text(title);
    format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         \x20 <head>\n\
         \x20   <meta name=\"pypi:repository-version\" content=\"1.0\">\n\
         \x20   <title>{title}</title>\n\
         \x20 </head>\n\
         \x20 <body>\n\
         \x20   <h1>{title}</h1>\n\
         {body}\
         \x20 </body>\n\
         </html>\n"
    )
}

/// 빈 구성요소를 빼고 `/`로 잇습니다.
fn join_path(parts: &[&str]) -> String {
    parts
        .iter()
        .flat_map(|p| p.split('/'))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

fn encode_key(key: &str) -> String {
    key.split('/').map(encode_segment).collect::<Vec<_>>().join("/")
}

/// 디렉토리 `from_dir`에서 `to_key`까지의 상대 경로를 계산합니다.
pub fn relative_href(from_dir: &str, to_key: &str) -> String {
    let from: Vec<&str> = from_dir.split('/').filter(|s| !s.is_empty()).collect();
    let to: Vec<&str> = to_key.split('/').collect();
    let (to_dirs, file) = to.split_at(to.len().saturating_sub(1));

    let common = from
        .iter()
        .zip(to_dirs)
        .take_while(|(a, b)| a == b)
        .count();

    let mut segments: Vec<String> = vec!["..".to_owned(); from.len() - common];
    segments.extend(to_dirs[common..].iter().map(|s| encode_segment(s)));
    segments.extend(file.iter().map(|s| encode_segment(s)));
    segments.join("/")
}

/// ref 이름이 단일 경로 구성요소로 안전한지 확인합니다.
pub fn is_safe_ref(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name != INDEX_FILE
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-' | b'+'))
}
