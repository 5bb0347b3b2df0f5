//! Wheel 파일명 파서
//!
//! `{name}-{version}(-{build})?-{python}-{abi}-{platform}.whl`

use super::{ArtifactParser, strip_suffix_ignore_case};
use crate::types::ArtifactKind;

const EXTENSION: &str = ".whl";

/// Wheel (`.whl`) 파서
///
/// `-`로 나눈 구성요소가 정확히 5개 또는 6개이고 모두 비어 있지 않아야 합니다.
/// 6개인 경우 세 번째 구성요소(build tag)는 숫자로 시작해야 합니다.
pub struct WheelParser;

impl ArtifactParser for WheelParser {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Wheel
    }

    fn can_parse(&self, filename: &str) -> bool {
        strip_suffix_ignore_case(filename, EXTENSION).is_some()
    }

    fn split_name_version<'a>(&self, filename: &'a str) -> Option<(&'a str, &'a str)> {
        let stem = strip_suffix_ignore_case(filename, EXTENSION)?;
        let parts: Vec<&str> = stem.split('-').collect();

        if !(5..=6).contains(&parts.len()) || parts.iter().any(|p| p.is_empty()) {
            return None;
        }
        if parts.len() == 6 && !parts[2].starts_with(|c: char| c.is_ascii_digit()) {
            return None;
        }

        Some((parts[0], parts[1]))
    }
}
