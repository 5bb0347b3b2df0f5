//! 소스 배포본 파일명 파서
//!
//! `{name}-{version}.tar.gz`, `{name}-{version}.zip`

use super::{ArtifactParser, strip_suffix_ignore_case};
use crate::types::ArtifactKind;

const EXTENSIONS: [&str; 2] = [".tar.gz", ".zip"];

/// 소스 배포본 (`.tar.gz`, `.zip`) 파서
///
/// 숫자가 바로 뒤따르는 첫 번째 `-`에서 이름과 버전을 나눕니다.
/// 따라서 `my-pkg-1.0.tar.gz`는 `my-pkg` / `1.0`이 됩니다.
pub struct SdistParser;

impl SdistParser {
    fn stem<'a>(&self, filename: &'a str) -> Option<&'a str> {
        EXTENSIONS
            .iter()
            .find_map(|ext| strip_suffix_ignore_case(filename, ext))
    }
}

impl ArtifactParser for SdistParser {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Sdist
    }

    fn can_parse(&self, filename: &str) -> bool {
        self.stem(filename).is_some()
    }

    fn split_name_version<'a>(&self, filename: &'a str) -> Option<(&'a str, &'a str)> {
        let stem = self.stem(filename)?;
        let split = stem
            .as_bytes()
            .windows(2)
            .position(|w| w[0] == b'-' && w[1].is_ascii_digit())?;

        let (name, version) = (&stem[..split], &stem[split + 1..]);
        if name.is_empty() || version.is_empty() {
            return None;
        }
        Some((name, version))
    }
}
