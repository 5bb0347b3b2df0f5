//! 인덱스 빌더 -- 아티팩트를 패키지 이름별로 그룹화
//!
//! [`IndexBuilder`]는 스캔 중 아티팩트를 받아 정규화된 패키지 이름으로 묶고,
//! 같은 `raw_key`가 반복되면 처음 것만 유지합니다. 완성된 [`Index`]는
//! 렌더러가 읽기 전용으로 사용합니다.
//!
//! 실행마다 새로 만들어지며 실행 간에 상태를 유지하지 않습니다.

use std::collections::{BTreeMap, HashSet};

use futures::{Stream, TryStreamExt};
use serde::Serialize;

use crate::error::IndexerError;
use crate::storage::normalize_prefix;
use crate::types::ParsedArtifact;

/// 하나의 패키지와 그 아티팩트 목록 (발견 순서)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageEntry {
    name: String,
    artifacts: Vec<ParsedArtifact>,
}

impl PackageEntry {
    fn new(name: String) -> Self {
        Self {
            name,
            artifacts: Vec::new(),
        }
    }

    /// 정규화된 패키지 이름
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 발견 순서의 아티팩트 목록
    pub fn artifacts(&self) -> &[ParsedArtifact] {
        &self.artifacts
    }

    /// 중복 없는 버전 목록 (발견 순서, 표시용)
    pub fn versions(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.artifacts
            .iter()
            .map(|a| a.version.as_str())
            .filter(|v| seen.insert(*v))
            .collect()
    }
}

/// 패키지 이름 -> 패키지 항목 (이름 순)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Index {
    packages: BTreeMap<String, PackageEntry>,
}

impl Index {
    /// 이름 순으로 패키지를 순회합니다.
    pub fn packages(&self) -> impl Iterator<Item = &PackageEntry> {
        self.packages.values()
    }

    /// 이름으로 패키지를 찾습니다. 조회 전에 이름을 정규화합니다.
    pub fn get(&self, name: &str) -> Option<&PackageEntry> {
        self.packages.get(&crate::parser::normalize_name(name))
    }

    /// 패키지가 있는지 확인합니다.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// 패키지 수
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// 패키지가 없는지 여부
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// 전체 아티팩트 수
    pub fn artifact_count(&self) -> usize {
        self.packages.values().map(|p| p.artifacts.len()).sum()
    }

    /// 모든 아티팩트를 순회합니다.
    pub fn artifacts(&self) -> impl Iterator<Item = &ParsedArtifact> {
        self.packages.values().flat_map(|p| p.artifacts.iter())
    }

    /// 다이제스트 부착용 가변 순회
    pub(crate) fn artifacts_mut(&mut self) -> impl Iterator<Item = &mut ParsedArtifact> {
        self.packages
            .values_mut()
            .flat_map(|p| p.artifacts.iter_mut())
    }

    /// 아티팩트를 ref(스캔 접두사 아래 첫 번째 디렉토리)별 인덱스로 나눕니다.
    ///
    /// 스캔 접두사 바로 아래에 있는 아티팩트는 어떤 ref에도 속하지 않습니다.
    pub fn partition_by_ref(&self, scan_prefix: &str) -> BTreeMap<String, Index> {
        let mut builders: BTreeMap<String, IndexBuilder> = BTreeMap::new();
        for artifact in self.artifacts() {
            if let Some(git_ref) = ref_of(&artifact.raw_key, scan_prefix) {
                builders
                    .entry(git_ref.to_owned())
                    .or_default()
                    .insert(artifact.clone());
            }
        }
        builders
            .into_iter()
            .map(|(git_ref, builder)| (git_ref, builder.finish()))
            .collect()
    }
}

/// 키의 ref를 반환합니다 (스캔 접두사를 뗀 뒤 첫 번째 경로 구성요소).
pub fn ref_of<'a>(raw_key: &'a str, scan_prefix: &str) -> Option<&'a str> {
    let relative = match normalize_prefix(Some(scan_prefix)) {
        None => raw_key,
        Some(dir) => raw_key.strip_prefix(dir)?.strip_prefix('/')?,
    };
    let (first, _rest) = relative.split_once('/')?;
    (!first.is_empty()).then_some(first)
}

/// 점진적 인덱스 빌더
#[derive(Debug, Default)]
pub struct IndexBuilder {
    packages: BTreeMap<String, PackageEntry>,
    seen_keys: HashSet<String>,
    duplicates: usize,
}

impl IndexBuilder {
    /// 빈 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 아티팩트를 추가합니다.
    ///
    /// 이미 본 `raw_key`이면 무시하고 `false`를 반환합니다.
    pub fn insert(&mut self, artifact: ParsedArtifact) -> bool {
        if !self.seen_keys.insert(artifact.raw_key.clone()) {
            self.duplicates += 1;
            return false;
        }

        self.packages
            .entry(artifact.package_name.clone())
            .or_insert_with_key(|name| PackageEntry::new(name.clone()))
            .artifacts
            .push(artifact);
        true
    }

    /// 중복으로 무시된 아티팩트 수
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    /// 인덱스를 완성합니다.
    pub fn finish(self) -> Index {
        Index {
            packages: self.packages,
        }
    }

    /// 스캐너 스트림을 끝까지 소비하여 인덱스를 만듭니다.
    ///
    /// 스트림의 첫 번째 에러에서 중단하고 그 에러를 반환합니다.
    pub async fn collect<St>(mut self, stream: St) -> Result<Index, IndexerError>
    where
        St: Stream<Item = Result<ParsedArtifact, IndexerError>>,
    {
        let mut stream = std::pin::pin!(stream);
        while let Some(artifact) = stream.try_next().await? {
            self.insert(artifact);
        }
        Ok(self.finish())
    }
}

/// 아티팩트 모음으로 인덱스를 만듭니다.
pub fn build(artifacts: impl IntoIterator<Item = ParsedArtifact>) -> Index {
    let mut builder = IndexBuilder::new();
    for artifact in artifacts {
        builder.insert(artifact);
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use futures::stream;

    use super::*;
    use crate::parser::parse;

    fn artifacts(keys: &[&str]) -> Vec<ParsedArtifact> {
        keys.iter().filter_map(|k| parse(k)).collect()
    }

    #[test]
    fn groups_by_normalized_name() {
        let index = build(artifacts(&[
            "pkg/foo-1.0.0-py3-none-any.whl",
            "pkg/Foo-1.2.0-py3-none-any.whl",
            "bar_thing-0.1.tar.gz",
            "Bar.Thing-0.2.zip",
        ]));

        assert_eq!(index.len(), 2);
        assert_eq!(index.artifact_count(), 4);
        assert_eq!(index.get("foo").unwrap().artifacts().len(), 2);
        assert_eq!(index.get("bar_thing").unwrap().artifacts().len(), 2);
    }

    #[test]
    fn packages_are_name_ordered() {
        let index = build(artifacts(&[
            "zeta-1.0.tar.gz",
            "alpha-1.0.tar.gz",
            "mid-1.0.tar.gz",
        ]));
        let names: Vec<_> = index.packages().map(PackageEntry::name).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn duplicate_keys_keep_first() {
        let mut first = parse("foo-1.0.tar.gz").unwrap();
        first.size = Some(1);
        let mut second = first.clone();
        second.size = Some(2);

        let mut builder = IndexBuilder::new();
        assert!(builder.insert(first));
        assert!(!builder.insert(second));
        assert_eq!(builder.duplicates(), 1);

        let index = builder.finish();
        let entry = index.get("foo").unwrap();
        assert_eq!(entry.artifacts().len(), 1);
        assert_eq!(entry.artifacts()[0].size, Some(1));
    }

    #[test]
    fn artifacts_keep_discovery_order() {
        let index = build(artifacts(&[
            "foo-2.0.tar.gz",
            "foo-1.0.tar.gz",
            "foo-2.0-py3-none-any.whl",
        ]));
        let entry = index.get("foo").unwrap();
        let files: Vec<_> = entry.artifacts().iter().map(|a| a.filename.as_str()).collect();
        assert_eq!(
            files,
            vec!["foo-2.0.tar.gz", "foo-1.0.tar.gz", "foo-2.0-py3-none-any.whl"]
        );
        assert_eq!(entry.versions(), vec!["2.0", "1.0"]);
    }

    #[test]
    fn grouping_is_order_independent() {
        let keys = [
            "a/foo-1.0.tar.gz",
            "b/foo-1.1.tar.gz",
            "bar-2.0.zip",
            "a/foo-1.0.tar.gz",
        ];
        let forward = build(artifacts(&keys));
        let mut reversed_keys = keys;
        reversed_keys.reverse();
        let backward = build(artifacts(&reversed_keys));

        assert_eq!(forward.len(), backward.len());
        for entry in forward.packages() {
            let other = backward.get(entry.name()).unwrap();
            let mut a: Vec<_> = entry.artifacts().iter().map(|x| &x.raw_key).collect();
            let mut b: Vec<_> = other.artifacts().iter().map(|x| &x.raw_key).collect();
            a.sort();
            b.sort();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn empty_index() {
        let index = build(Vec::new());
        assert!(index.is_empty());
        assert_eq!(index.artifact_count(), 0);
    }

    #[tokio::test]
    async fn collect_from_stream() {
        let items = artifacts(&["foo-1.0.tar.gz", "bar-1.0.zip"])
            .into_iter()
            .map(Ok);
        let index = IndexBuilder::new()
            .collect(stream::iter(items))
            .await
            .unwrap();
        assert_eq!(index.len(), 2);
    }

    #[tokio::test]
    async fn collect_stops_at_error() {
        let items = vec![
            Ok(parse("foo-1.0.tar.gz").unwrap()),
            Err(IndexerError::StalledPagination {
                prefix: String::new(),
                token: "foo-1.0.tar.gz".to_owned(),
            }),
        ];
        let result = IndexBuilder::new().collect(stream::iter(items)).await;
        assert!(matches!(result, Err(IndexerError::StalledPagination { .. })));
    }

    #[test]
    fn ref_of_first_segment_after_prefix() {
        assert_eq!(ref_of("nightly/foo-1.0.tar.gz", ""), Some("nightly"));
        assert_eq!(ref_of("abc123/sub/foo-1.0.tar.gz", ""), Some("abc123"));
        assert_eq!(ref_of("foo-1.0.tar.gz", ""), None);
        assert_eq!(ref_of("wheels/nightly/foo-1.0.tar.gz", "wheels/"), Some("nightly"));
        assert_eq!(ref_of("wheels/foo-1.0.tar.gz", "wheels"), None);
        assert_eq!(ref_of("other/nightly/foo-1.0.tar.gz", "wheels"), None);
    }

    #[test]
    fn partition_by_ref_groups_artifacts() {
        let index = build(artifacts(&[
            "nightly/foo-1.1.dev0-py3-none-any.whl",
            "abc123/foo-1.0-py3-none-any.whl",
            "abc123/bar-1.0-py3-none-any.whl",
            "foo-0.9.tar.gz",
        ]));
        let refs = index.partition_by_ref("");

        let names: Vec<_> = refs.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["abc123", "nightly"]);
        assert_eq!(refs["abc123"].len(), 2);
        assert_eq!(refs["nightly"].len(), 1);
        assert_eq!(refs["nightly"].artifact_count(), 1);
    }
}
