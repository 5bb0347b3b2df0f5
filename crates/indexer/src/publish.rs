//! 퍼블리셔 -- 렌더링된 페이지를 대상 스토리지에 기록
//!
//! 각 페이지는 `{index_prefix}/{path}` 키로 덮어쓰기됩니다. 쓰기는 서로 독립적이며
//! 최대 `concurrency`개까지 동시에 수행됩니다. 한 페이지의 실패는
//! [`PublishOutcome::Failed`]로 기록되고 나머지 페이지는 계속 진행됩니다.
//!
//! dry run에서는 쓰기 호출을 전혀 하지 않고 모든 페이지를
//! [`PublishOutcome::Skipped`]로 보고합니다.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use wheelhouse_core::metrics as m;

use crate::render::RenderedPages;
use crate::storage::ObjectStorage;

/// 페이지별 게시 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PublishOutcome {
    /// 기록됨
    Written,
    /// dry run으로 건너뜀
    Skipped,
    /// 기록 실패
    Failed {
        /// 실패 사유
        reason: String,
    },
}

impl PublishOutcome {
    fn label(&self) -> &'static str {
        match self {
            Self::Written => "written",
            Self::Skipped => "skipped",
            Self::Failed { .. } => "failed",
        }
    }
}

impl fmt::Display for PublishOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Written => write!(f, "written"),
            Self::Skipped => write!(f, "skipped (dry run)"),
            Self::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}

/// 게시 항목
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishEntry {
    /// 대상 키 (인덱스 접두사 포함)
    pub path: String,
    /// 페이지 크기 (바이트)
    pub bytes: usize,
    /// 결과
    #[serde(flatten)]
    pub outcome: PublishOutcome,
}

/// 게시 보고서
#[derive(Debug, Clone, Serialize)]
pub struct PublishReport {
    /// 실행 ID
    pub run_id: String,
    /// dry run 여부
    pub dry_run: bool,
    /// 대상 위치 (예: `s3://bucket`, `file:///tmp/out`)
    pub destination: String,
    /// 게시 시작 시각
    pub started_at: DateTime<Utc>,
    /// 경로 순으로 정렬된 항목
    pub entries: Vec<PublishEntry>,
}

impl PublishReport {
    /// 기록된 항목
    pub fn written(&self) -> impl Iterator<Item = &PublishEntry> {
        self.with_outcome(|o| matches!(o, PublishOutcome::Written))
    }

    /// dry run으로 건너뛴 항목
    pub fn skipped(&self) -> impl Iterator<Item = &PublishEntry> {
        self.with_outcome(|o| matches!(o, PublishOutcome::Skipped))
    }

    /// 실패한 항목
    pub fn failed(&self) -> impl Iterator<Item = &PublishEntry> {
        self.with_outcome(|o| matches!(o, PublishOutcome::Failed { .. }))
    }

    /// 실패한 페이지 수
    pub fn failed_count(&self) -> usize {
        self.failed().count()
    }

    /// 실패 없이 완료되었는지 여부
    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }

    /// 전체 항목 수
    pub fn total(&self) -> usize {
        self.entries.len()
    }

    /// 기록(또는 dry run에서 기록 예정)된 바이트 수
    pub fn total_bytes(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| !matches!(e.outcome, PublishOutcome::Failed { .. }))
            .map(|e| e.bytes)
            .sum()
    }

    fn with_outcome(
        &self,
        pred: impl Fn(&PublishOutcome) -> bool,
    ) -> impl Iterator<Item = &PublishEntry> {
        self.entries.iter().filter(move |e| pred(&e.outcome))
    }
}

/// 페이지 퍼블리셔
pub struct Publisher<S: ObjectStorage> {
    storage: Arc<S>,
    index_prefix: String,
    concurrency: usize,
}

impl<S: ObjectStorage> Publisher<S> {
    /// 퍼블리셔를 생성합니다. 동시 쓰기 수는 최소 1입니다.
    pub fn new(storage: Arc<S>, index_prefix: &str, concurrency: usize) -> Self {
        Self {
            storage,
            index_prefix: index_prefix.trim_matches('/').to_owned(),
            concurrency: concurrency.max(1),
        }
    }

    /// 렌더링 경로를 대상 키로 바꿉니다.
    pub fn destination_key(&self, path: &str) -> String {
        if self.index_prefix.is_empty() {
            path.to_owned()
        } else {
            format!("{}/{path}", self.index_prefix)
        }
    }

    /// 페이지를 게시합니다.
    ///
    /// 개별 쓰기 실패는 보고서에 기록되며 이 함수는 실패하지 않습니다.
    pub async fn publish(&self, pages: &RenderedPages, dry_run: bool) -> PublishReport {
        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let destination = self.storage.location();

        let mut entries: Vec<PublishEntry> = if dry_run {
            pages
                .iter()
                .map(|(path, content)| PublishEntry {
                    path: self.destination_key(path),
                    bytes: content.len(),
                    outcome: PublishOutcome::Skipped,
                })
                .collect()
        } else {
            futures::stream::iter(pages.iter())
                .map(|(path, content)| self.write_page(path, content))
                .buffer_unordered(self.concurrency)
                .collect()
                .await
        };
        entries.sort_by(|a, b| a.path.cmp(&b.path));

        for entry in &entries {
            metrics::counter!(m::PUBLISH_PAGES_TOTAL, m::LABEL_RESULT => entry.outcome.label())
                .increment(1);
        }

        let report = PublishReport {
            run_id,
            dry_run,
            destination,
            started_at,
            entries,
        };
        info!(
            run_id = %report.run_id,
            destination = %report.destination,
            dry_run,
            written = report.written().count(),
            skipped = report.skipped().count(),
            failed = report.failed_count(),
            "publish complete"
        );
        report
    }

    async fn write_page(&self, path: &str, content: &str) -> PublishEntry {
        let key = self.destination_key(path);
        let body = Bytes::copy_from_slice(content.as_bytes());
        let outcome = match self.storage.put_object(&key, body).await {
            Ok(()) => PublishOutcome::Written,
            Err(e) => {
                warn!(key = %key, error = %e, "failed to write index page");
                PublishOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };
        PublishEntry {
            path: key,
            bytes: content.len(),
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::build;
    use crate::parser::parse;
    use crate::render::{LinkBase, PageRenderer};
    use crate::storage::MemoryStorage;

    fn sample_pages() -> RenderedPages {
        let index = build(
            ["foo-1.0.tar.gz", "bar-1.0.zip", "baz-1.0-py3-none-any.whl"]
                .iter()
                .filter_map(|k| parse(k)),
        );
        PageRenderer::new("simple", LinkBase::Relative).render(&index)
    }

    #[tokio::test]
    async fn dry_run_makes_no_writes() {
        let storage = Arc::new(MemoryStorage::new());
        let publisher = Publisher::new(Arc::clone(&storage), "simple", 4);
        let pages = sample_pages();

        let report = publisher.publish(&pages, true).await;

        assert!(report.dry_run);
        assert_eq!(storage.put_count(), 0);
        assert!(storage.is_empty());
        assert_eq!(report.skipped().count(), pages.len());
        assert_eq!(report.total_bytes(), pages.total_bytes());
        assert!(report.is_success());
    }

    #[tokio::test]
    async fn dry_run_skips_exactly_what_a_real_run_writes() {
        let pages = sample_pages();

        let dry = Publisher::new(Arc::new(MemoryStorage::new()), "simple", 2)
            .publish(&pages, true)
            .await;
        let storage = Arc::new(MemoryStorage::new());
        let real = Publisher::new(Arc::clone(&storage), "simple", 2)
            .publish(&pages, false)
            .await;

        let skipped: Vec<_> = dry.skipped().map(|e| e.path.clone()).collect();
        let written: Vec<_> = real.written().map(|e| e.path.clone()).collect();
        assert_eq!(skipped, written);
        assert_eq!(storage.keys(), written);
    }

    #[tokio::test]
    async fn writes_under_index_prefix() {
        let storage = Arc::new(MemoryStorage::new());
        let pages = sample_pages();
        let report = Publisher::new(Arc::clone(&storage), "simple/", 8)
            .publish(&pages, false)
            .await;

        assert!(report.is_success());
        assert_eq!(storage.put_count(), pages.len());
        let root = storage.object("simple/index.html").unwrap();
        assert_eq!(&root[..], pages.get("index.html").unwrap().as_bytes());
    }

    #[tokio::test]
    async fn failed_write_is_recorded_and_others_continue() {
        let storage = Arc::new(MemoryStorage::new().with_failing_write("simple/foo/index.html"));
        let pages = sample_pages();
        let report = Publisher::new(Arc::clone(&storage), "simple", 1)
            .publish(&pages, false)
            .await;

        assert!(!report.is_success());
        assert_eq!(report.failed_count(), 1);
        let failed = report.failed().next().unwrap();
        assert_eq!(failed.path, "simple/foo/index.html");
        assert!(matches!(&failed.outcome, PublishOutcome::Failed { reason } if reason.contains("simulated")));
        assert_eq!(report.written().count(), pages.len() - 1);
        assert_eq!(storage.len(), pages.len() - 1);
    }

    #[tokio::test]
    async fn entries_are_sorted_by_path() {
        let report = Publisher::new(Arc::new(MemoryStorage::new()), "", 8)
            .publish(&sample_pages(), false)
            .await;
        let paths: Vec<_> = report.entries.iter().map(|e| e.path.as_str()).collect();
        let mut sorted = paths.clone();
        sorted.sort();
        assert_eq!(paths, sorted);
        assert!(paths.contains(&"index.html"));
    }

    #[test]
    fn outcome_display() {
        assert_eq!(PublishOutcome::Skipped.to_string(), "skipped (dry run)");
        assert_eq!(
            PublishOutcome::Failed {
                reason: "denied".to_owned()
            }
            .to_string(),
            "failed: denied"
        );
    }

    #[test]
    fn report_serializes_outcome_inline() {
        let entry = PublishEntry {
            path: "simple/index.html".to_owned(),
            bytes: 10,
            outcome: PublishOutcome::Written,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["status"], "written");
        assert_eq!(json["path"], "simple/index.html");
    }
}
