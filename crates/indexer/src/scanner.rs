//! 버킷 스캐너 -- 페이지 단위 목록 조회를 아티팩트 스트림으로 변환
//!
//! [`BucketScanner::scan`]은 설정된 접두사 아래의 모든 오브젝트를 연속 토큰이
//! 없어질 때까지 순차적으로 조회하고, 각 키를 [`parser::parse`]에 넘겨
//! 아티팩트만 내보내는 지연(lazy) 스트림을 반환합니다.
//!
//! # 에러 처리
//!
//! - 아티팩트가 아닌 키: 건너뜀 (debug 로그, `wheelhouse_scanner_keys_skipped_total`)
//! - 목록 조회 실패: `IndexerError::Listing` 하나를 내보내고 스트림 종료
//! - 같은 연속 토큰이 반복됨: `IndexerError::StalledPagination` 후 종료

use std::sync::Arc;

use futures::stream::{self, Stream, TryStreamExt};
use tracing::{debug, trace};

use wheelhouse_core::metrics as m;

use crate::error::IndexerError;
use crate::parser;
use crate::storage::{ObjectInfo, ObjectStorage, normalize_prefix};
use crate::types::ParsedArtifact;

/// 목록 조회 진행 상태
enum Cursor {
    Start,
    After(String),
    Exhausted,
}

/// 버킷 스캐너
///
/// 스트림은 한 번만 소비할 수 있으며, 다시 스캔하려면 `scan()`을 다시 호출합니다.
pub struct BucketScanner<S: ObjectStorage> {
    storage: Arc<S>,
    /// 디렉토리 형태로 정규화된 접두사 (`None`이면 버킷 전체)
    prefix: Option<String>,
}

impl<S: ObjectStorage> BucketScanner<S> {
    /// 스캐너를 생성합니다. 빈 접두사는 버킷 전체를 의미합니다.
    pub fn new(storage: Arc<S>, prefix: &str) -> Self {
        Self {
            storage,
            prefix: normalize_prefix(Some(prefix)).map(str::to_owned),
        }
    }

    /// 정규화된 스캔 접두사 (버킷 전체이면 빈 문자열)
    pub fn prefix(&self) -> &str {
        self.prefix.as_deref().unwrap_or_default()
    }

    /// 버킷을 스캔하여 아티팩트 스트림을 반환합니다.
    ///
    /// 페이지는 엄격히 순차적으로 조회됩니다. 목록 조회 에러는 치명적이며
    /// 스트림의 마지막 항목이 됩니다.
    pub fn scan(&self) -> impl Stream<Item = Result<ParsedArtifact, IndexerError>> + Send + use<S> {
        let storage = Arc::clone(&self.storage);
        let prefix = self.prefix.clone();

        stream::try_unfold(Cursor::Start, move |cursor| {
            let storage = Arc::clone(&storage);
            let prefix = prefix.clone();
            async move {
                let token = match cursor {
                    Cursor::Exhausted => return Ok(None),
                    Cursor::Start => None,
                    Cursor::After(token) => Some(token),
                };

                let page = storage
                    .list_page(prefix.as_deref(), token.as_deref())
                    .await
                    .map_err(|source| IndexerError::Listing {
                        prefix: prefix.clone().unwrap_or_default(),
                        source,
                    })?;
                metrics::counter!(m::SCANNER_LIST_PAGES_TOTAL).increment(1);

                let next = match page.continuation {
                    None => Cursor::Exhausted,
                    Some(next) if token.as_deref() == Some(next.as_str()) => {
                        return Err(IndexerError::StalledPagination {
                            prefix: prefix.unwrap_or_default(),
                            token: next,
                        });
                    }
                    Some(next) => Cursor::After(next),
                };

                trace!(
                    objects = page.objects.len(),
                    more = matches!(next, Cursor::After(_)),
                    "listed page"
                );

                Ok(Some((parse_page(page.objects), next)))
            }
        })
        .map_ok(|artifacts| stream::iter(artifacts.into_iter().map(Ok::<_, IndexerError>)))
        .try_flatten()
    }
}

/// 한 페이지의 오브젝트를 아티팩트로 변환합니다.
fn parse_page(objects: Vec<ObjectInfo>) -> Vec<ParsedArtifact> {
    metrics::counter!(m::SCANNER_OBJECTS_TOTAL).increment(objects.len() as u64);

    let mut artifacts = Vec::with_capacity(objects.len());
    for object in objects {
        match parser::parse(&object.key) {
            Some(artifact) => {
                metrics::counter!(m::SCANNER_ARTIFACTS_TOTAL, m::LABEL_KIND => artifact.kind.as_str())
                    .increment(1);
                artifacts.push(artifact.with_object_meta(object.size, object.last_modified));
            }
            None => {
                debug!(key = %object.key, "skipping non-artifact key");
                metrics::counter!(m::SCANNER_KEYS_SKIPPED_TOTAL).increment(1);
            }
        }
    }
    artifacts
}
