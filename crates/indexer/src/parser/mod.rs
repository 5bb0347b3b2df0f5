//! 아티팩트 이름 파서 -- 스토리지 키를 배포 아티팩트로 해석
//!
//! [`ArtifactParser`] trait은 각 배포 형식의 파일명 파서가 구현해야 하는 인터페이스입니다.
//! [`parse`]는 키의 마지막 경로 구성요소(파일명)를 등록된 파서에 차례로 넘기고,
//! 처음 성공한 결과를 반환합니다.
//!
//! # 지원 형식
//!
//! - `{name}-{version}(-{build})?-{python}-{abi}-{platform}.whl` -- [`WheelParser`]
//! - `{name}-{version}.tar.gz`, `{name}-{version}.zip` -- [`SdistParser`]
//!
//! 인식할 수 없는 키는 에러가 아니라 `None`입니다. 파서는 어떤 입력에도
//! 패닉하지 않습니다.

pub mod sdist;
pub mod wheel;

pub use sdist::SdistParser;
pub use wheel::WheelParser;

use crate::types::{ArtifactKind, ParsedArtifact};

/// 배포 아티팩트 파일명 파서 trait
pub trait ArtifactParser: Send + Sync {
    /// 이 파서가 만드는 아티팩트 종류를 반환합니다.
    fn kind(&self) -> ArtifactKind;

    /// 파일명의 확장자로 이 파서가 처리할 수 있는지 확인합니다.
    fn can_parse(&self, filename: &str) -> bool;

    /// 파일명에서 `(이름, 버전)`을 추출합니다.
    ///
    /// 반환되는 이름은 정규화 전의 원본입니다.
    fn split_name_version<'a>(&self, filename: &'a str) -> Option<(&'a str, &'a str)>;
}

static WHEEL: WheelParser = WheelParser;
static SDIST: SdistParser = SdistParser;

/// 등록된 파서 목록 (검사 순서)
fn parsers() -> [&'static dyn ArtifactParser; 2] {
    [&WHEEL, &SDIST]
}

/// 스토리지 키를 아티팩트로 파싱합니다.
///
/// 키에 디렉토리 접두사가 있으면 마지막 `/` 이후의 파일명만 해석합니다.
/// `size`, `last_modified`, `sha256`은 비어 있는 상태로 반환됩니다.
/// `.`이나 `..` 경로 구성요소가 있는 키는 href가 다른 오브젝트로 해석되므로
/// 건너뜁니다.
pub fn parse(key: &str) -> Option<ParsedArtifact> {
    let filename = leaf_name(key);
    if filename.is_empty() || has_dot_segment(key) {
        return None;
    }

    for parser in parsers() {
        if !parser.can_parse(filename) {
            continue;
        }
        let (name, version) = parser.split_name_version(filename)?;
        if version.is_empty() || !is_valid_name(name) {
            return None;
        }
        return Some(ParsedArtifact {
            package_name: normalize_name(name),
            version: version.to_owned(),
            filename: filename.to_owned(),
            raw_key: key.to_owned(),
            kind: parser.kind(),
            size: None,
            last_modified: None,
            sha256: None,
        });
    }

    None
}

/// PEP 503 이름 정규화
///
/// 소문자로 바꾸고 `-`, `_`, `.`의 연속을 하나의 `-`로 합칩니다.
pub fn normalize_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut in_separator = false;

    for ch in name.chars() {
        if matches!(ch, '-' | '_' | '.') {
            if !in_separator {
                normalized.push('-');
                in_separator = true;
            }
        } else {
            normalized.extend(ch.to_lowercase());
            in_separator = false;
        }
    }

    normalized
}

/// 유효한 배포 이름인지 확인합니다.
///
/// ASCII 영숫자와 `.`, `_`, `-`만 허용하며 영숫자로 시작하고 끝나야 합니다.
pub fn is_valid_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    let (Some(first), Some(last)) = (bytes.first(), bytes.last()) else {
        return false;
    };

    first.is_ascii_alphanumeric()
        && last.is_ascii_alphanumeric()
        && bytes
            .iter()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'))
}

/// 키의 마지막 경로 구성요소
fn has_dot_segment(key: &str) -> bool {
    key.split('/').any(|segment| segment == "." || segment == "..")
}

fn leaf_name(key: &str) -> &str {
    match key.rfind('/') {
        Some(pos) => &key[pos + 1..],
        None => key,
    }
}

/// ASCII 대소문자를 무시하고 접미사를 제거합니다.
pub(crate) fn strip_suffix_ignore_case<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    let split = s.len().checked_sub(suffix.len())?;
    if !s.is_char_boundary(split) {
        return None;
    }
    let (head, tail) = s.split_at(split);
    tail.eq_ignore_ascii_case(suffix).then_some(head)
}
