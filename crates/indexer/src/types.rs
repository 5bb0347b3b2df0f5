//! 도메인 타입 -- 인덱서 전용 데이터 구조
//!
//! 버킷 키에서 파싱된 아티팩트와 그 종류를 정의합니다.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 배포 아티팩트 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// 빌드된 wheel (`.whl`)
    Wheel,
    /// 소스 배포본 (`.tar.gz`, `.zip`)
    Sdist,
}

impl ArtifactKind {
    /// 레이블/출력용 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wheel => "wheel",
            Self::Sdist => "sdist",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 스토리지 키에서 파싱된 배포 아티팩트
///
/// `package_name`은 항상 정규화되어 있으며 비어 있지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedArtifact {
    /// 정규화된 패키지 이름 (예: `bar-thing`)
    pub package_name: String,
    /// 버전 문자열 (표시용, 의미 비교하지 않음)
    pub version: String,
    /// 원본 파일명 (링크 텍스트)
    pub filename: String,
    /// 전체 스토리지 키 (다운로드 참조)
    pub raw_key: String,
    /// 아티팩트 종류
    pub kind: ArtifactKind,
    /// 오브젝트 크기 (목록 조회에서 온 경우)
    pub size: Option<u64>,
    /// 마지막 수정 시각 (목록 조회에서 온 경우)
    pub last_modified: Option<DateTime<Utc>>,
    /// 게시된 sha256 다이제스트 (소문자 16진수)
    pub sha256: Option<String>,
}

impl ParsedArtifact {
    /// 목록 조회 메타데이터를 붙인 아티팩트를 반환합니다.
    pub fn with_object_meta(mut self, size: u64, last_modified: Option<DateTime<Utc>>) -> Self {
        self.size = Some(size);
        self.last_modified = last_modified;
        self
    }

    /// 키에서 파일명을 뺀 디렉토리 부분을 반환합니다 (없으면 빈 문자열).
    pub fn directory(&self) -> &str {
        match self.raw_key.rfind('/') {
            Some(pos) => &self.raw_key[..pos],
            None => "",
        }
    }
}

impl fmt::Display for ParsedArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{} ({}, {})",
            self.package_name, self.version, self.kind, self.raw_key
        )
    }
}
