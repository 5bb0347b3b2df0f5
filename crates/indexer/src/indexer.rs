//! 인덱서 오케스트레이터 -- 한 번의 인덱싱 실행 전체 흐름 관리
//!
//! # 내부 아키텍처
//!
//! ```text
//! source bucket --> BucketScanner --> IndexBuilder --> Index
//!                                                        |
//!                                   (with_digests) DigestResolver
//!                                                        |
//!                                                   PageRenderer --> RenderedPages
//!                                                        |
//!                                   (ref_indexes) render_refs
//!                                                        |
//!                                                    Publisher --> destination
//!                                                        |
//!                                                   PublishReport
//! ```
//!
//! 목록 조회 실패는 렌더링이나 쓰기 전에 실행을 중단합니다. 실행 간에 상태를
//! 유지하지 않으므로 중단된 실행은 다시 실행하면 복구됩니다.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{error, info, warn};

use wheelhouse_core::metrics as m;

use crate::config::IndexerConfig;
use crate::digest::{DigestResolver, DigestSummary};
use crate::error::IndexerError;
use crate::index::{Index, IndexBuilder};
use crate::publish::{PublishReport, Publisher};
use crate::render::{LinkBase, PageRenderer, RenderedPages};
use crate::scanner::BucketScanner;
use crate::storage::ObjectStorage;

/// 실행 결과 요약
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// 패키지 수
    pub packages: usize,
    /// 아티팩트 수
    pub artifacts: usize,
    /// 렌더링된 페이지 수
    pub pages: usize,
    /// 충돌로 건너뛴 ref 이름
    pub skipped_refs: Vec<String>,
    /// 다이제스트 연결 결과 (비활성화 시 `None`)
    pub digests: Option<DigestSummary>,
    /// 게시 보고서
    pub report: PublishReport,
    /// 소요 시간
    #[serde(with = "duration_millis")]
    pub elapsed: Duration,
}

impl RunSummary {
    /// 모든 페이지가 게시(또는 dry run으로 건너뜀)되었는지 여부
    pub fn is_success(&self) -> bool {
        self.report.is_success()
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u128(value.as_millis())
    }
}

/// 정적 인덱스 생성기
///
/// `source`에서 아티팩트를 스캔하고 `destination`에 페이지를 게시합니다.
/// 보통 둘은 같은 버킷이며, 로컬 미리보기에서는 destination이 로컬 디렉토리입니다.
pub struct WheelIndexer<S: ObjectStorage, D: ObjectStorage = S> {
    config: IndexerConfig,
    source: Arc<S>,
    destination: Arc<D>,
}

impl<S: ObjectStorage> WheelIndexer<S, S> {
    /// 같은 버킷에서 스캔하고 게시하는 인덱서를 생성합니다.
    pub fn with_storage(config: IndexerConfig, storage: Arc<S>) -> Result<Self, IndexerError> {
        Self::new(config, Arc::clone(&storage), storage)
    }
}

impl<S: ObjectStorage, D: ObjectStorage> WheelIndexer<S, D> {
    /// 인덱서를 생성합니다.
    ///
    /// # Errors
    ///
    /// 설정 검증 실패 시 `IndexerError::Config` 반환
    pub fn new(config: IndexerConfig, source: Arc<S>, destination: Arc<D>) -> Result<Self, IndexerError> {
        config.validate()?;
        Ok(Self {
            config,
            source,
            destination,
        })
    }

    /// 실행 설정
    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    /// 버킷을 스캔하여 인덱스를 만듭니다. 설정 시 다이제스트도 연결합니다.
    pub async fn build_index(&self) -> Result<(Index, Option<DigestSummary>), IndexerError> {
        let scanner = BucketScanner::new(Arc::clone(&self.source), &self.config.prefix);
        let mut index = IndexBuilder::new().collect(scanner.scan()).await?;

        let digests = if self.config.with_digests {
            let resolver = DigestResolver::new(Arc::clone(&self.source), self.config.concurrency);
            Some(resolver.resolve(&mut index).await)
        } else {
            None
        };

        Ok((index, digests))
    }

    /// 인덱스를 페이지로 렌더링합니다. 건너뛴 ref 이름도 반환합니다.
    pub fn render(&self, index: &Index) -> (RenderedPages, Vec<String>) {
        let renderer = PageRenderer::new(
            &self.config.index_prefix,
            LinkBase::from_base_url(self.config.base_url.as_deref()),
        );
        let mut pages = renderer.render(index);

        let skipped_refs = if self.config.ref_indexes {
            let refs = index.partition_by_ref(&self.config.prefix);
            renderer.render_refs(index, &refs, &mut pages)
        } else {
            Vec::new()
        };

        (pages, skipped_refs)
    }

    /// 스캔 -> 그룹화 -> 렌더링 -> 게시 전체를 한 번 실행합니다.
    ///
    /// 개별 페이지 쓰기 실패는 에러가 아니라 [`RunSummary::report`]에 기록됩니다.
    ///
    /// # Errors
    ///
    /// 목록 조회 실패 시 `IndexerError::Listing`/`StalledPagination` 반환
    /// (아무것도 쓰지 않음)
    pub async fn run(&self) -> Result<RunSummary, IndexerError> {
        let started = Instant::now();
        info!(
            source = %self.source.location(),
            destination = %self.destination.location(),
            prefix = %self.config.prefix,
            dry_run = self.config.dry_run,
            "starting index run"
        );

        let (index, digests) = self.build_index().await.inspect_err(|e| {
            error!(error = %e, "scan failed, nothing rendered or written");
        })?;
        info!(
            packages = index.len(),
            artifacts = index.artifact_count(),
            "index built"
        );

        let (pages, skipped_refs) = self.render(&index);

        let publisher = Publisher::new(
            Arc::clone(&self.destination),
            &self.config.index_prefix,
            self.config.concurrency,
        );
        let report = publisher.publish(&pages, self.config.dry_run).await;
        if !report.is_success() {
            warn!(
                failed = report.failed_count(),
                total = report.total(),
                "some index pages could not be written"
            );
        }

        let elapsed = started.elapsed();
        metrics::histogram!(m::RUN_DURATION_SECONDS).record(elapsed.as_secs_f64());

        Ok(RunSummary {
            packages: index.len(),
            artifacts: index.artifact_count(),
            pages: pages.len(),
            skipped_refs,
            digests,
            report,
            elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexerConfigBuilder;
    use crate::storage::MemoryStorage;

    fn config(dry_run: bool) -> IndexerConfig {
        IndexerConfigBuilder::new()
            .bucket("test-bucket")
            .dry_run(dry_run)
            .build()
            .unwrap()
    }

    #[test]
    fn new_rejects_invalid_config() {
        let result = WheelIndexer::with_storage(IndexerConfig::default(), Arc::new(MemoryStorage::new()));
        assert!(matches!(result, Err(IndexerError::Config { .. })));
    }

    #[tokio::test]
    async fn run_writes_pages() {
        let storage = Arc::new(MemoryStorage::with_keys([
            "pkg/foo-1.0.0-py3-none-any.whl",
            "pkg/foo-1.2.0-py3-none-any.whl",
        ]));
        let indexer = WheelIndexer::with_storage(config(false), Arc::clone(&storage)).unwrap();

        let summary = indexer.run().await.unwrap();

        assert!(summary.is_success());
        assert_eq!(summary.packages, 1);
        assert_eq!(summary.artifacts, 2);
        assert_eq!(summary.pages, 2);
        assert!(storage.object("simple/index.html").is_some());
        assert!(storage.object("simple/foo/index.html").is_some());
    }

    #[tokio::test]
    async fn run_separate_destination() {
        let source = Arc::new(MemoryStorage::with_keys(["foo-1.0.tar.gz"]));
        let destination = Arc::new(MemoryStorage::new());
        let indexer = WheelIndexer::new(config(false), Arc::clone(&source), Arc::clone(&destination)).unwrap();

        indexer.run().await.unwrap();

        assert_eq!(source.put_count(), 0);
        assert_eq!(destination.keys(), vec!["simple/foo/index.html", "simple/index.html"]);
    }

    #[tokio::test]
    async fn run_digests_only_when_enabled() {
        let storage = Arc::new(
            MemoryStorage::new()
                .with_object("foo-1.0.tar.gz", "x")
                .with_object("foo-1.0.tar.gz.sha256", "ab".repeat(32)),
        );
        let plain = WheelIndexer::with_storage(config(true), Arc::clone(&storage))
            .unwrap()
            .run()
            .await
            .unwrap();
        assert!(plain.digests.is_none());

        let with = IndexerConfigBuilder::from_config(config(true))
            .with_digests(true)
            .build()
            .unwrap();
        let summary = WheelIndexer::with_storage(with, storage).unwrap().run().await.unwrap();
        assert_eq!(summary.digests.unwrap().attached, 1);
    }
}
