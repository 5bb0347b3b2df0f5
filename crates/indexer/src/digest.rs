//! 게시된 sha256 다이제스트 연결
//!
//! 각 아티팩트 옆의 `<raw_key>.sha256` 사이드카 오브젝트를 읽어 링크에
//! `#sha256=<hex>`를 붙일 수 있도록 아티팩트에 기록합니다.
//! 다이제스트를 계산하거나 검증하지 않습니다.
//!
//! 사이드카가 없거나 읽을 수 없거나 형식이 잘못된 경우 경고만 남기고
//! 다이제스트 없이 링크합니다.

use std::collections::HashMap;
use std::sync::Arc;

use futures::StreamExt;
use serde::Serialize;
use tracing::{debug, warn};

use wheelhouse_core::error::StorageError;

use crate::index::Index;
use crate::storage::ObjectStorage;

/// 사이드카 오브젝트 접미사
pub const DIGEST_SUFFIX: &str = ".sha256";

/// sha256 16진수 길이
const SHA256_HEX_LEN: usize = 64;

/// 사이드카 내용에서 sha256 다이제스트를 추출합니다.
///
/// 앞뒤 공백은 무시하며 `sha256sum` 출력처럼 뒤에 파일명이 붙어도 됩니다.
/// 결과는 소문자 16진수입니다.
pub fn parse_sidecar(content: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(content).ok()?;
    let digest = text.split_whitespace().next()?;

    (digest.len() == SHA256_HEX_LEN && digest.bytes().all(|b| b.is_ascii_hexdigit()))
        .then(|| digest.to_ascii_lowercase())
}

/// 다이제스트 연결 결과 요약
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DigestSummary {
    /// 다이제스트가 연결된 아티팩트 수
    pub attached: usize,
    /// 사이드카가 없는 아티팩트 수
    pub missing: usize,
    /// 읽기 실패 또는 형식 오류 수
    pub invalid: usize,
}

enum Lookup {
    Found(String),
    Missing,
    Invalid,
}

/// 사이드카 다이제스트 조회기
pub struct DigestResolver<S: ObjectStorage> {
    storage: Arc<S>,
    concurrency: usize,
}

impl<S: ObjectStorage> DigestResolver<S> {
    /// 조회기를 생성합니다. 동시 조회 수는 최소 1입니다.
    pub fn new(storage: Arc<S>, concurrency: usize) -> Self {
        Self {
            storage,
            concurrency: concurrency.max(1),
        }
    }

    /// 인덱스의 모든 아티팩트에 대해 사이드카를 읽어 다이제스트를 기록합니다.
    pub async fn resolve(&self, index: &mut Index) -> DigestSummary {
        let keys: Vec<String> = index.artifacts().map(|a| a.raw_key.clone()).collect();

        let lookups: HashMap<String, Lookup> = futures::stream::iter(keys)
            .map(|key| async move {
                let lookup = self.lookup(&key).await;
                (key, lookup)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut summary = DigestSummary::default();
        for artifact in index.artifacts_mut() {
            match lookups.get(&artifact.raw_key) {
                Some(Lookup::Found(digest)) => {
                    artifact.sha256 = Some(digest.clone());
                    summary.attached += 1;
                }
                Some(Lookup::Missing) => summary.missing += 1,
                Some(Lookup::Invalid) | None => summary.invalid += 1,
            }
        }

        debug!(
            attached = summary.attached,
            missing = summary.missing,
            invalid = summary.invalid,
            "digest resolution complete"
        );
        summary
    }

    async fn lookup(&self, raw_key: &str) -> Lookup {
        let sidecar = format!("{raw_key}{DIGEST_SUFFIX}");
        match self.storage.get_object(&sidecar).await {
            Ok(content) => match parse_sidecar(&content) {
                Some(digest) => Lookup::Found(digest),
                None => {
                    warn!(key = %sidecar, "malformed sha256 sidecar, linking without digest");
                    Lookup::Invalid
                }
            },
            Err(StorageError::NotFound { .. }) => {
                warn!(key = %sidecar, "sha256 sidecar not found, linking without digest");
                Lookup::Missing
            }
            Err(e) => {
                warn!(key = %sidecar, error = %e, "failed to read sha256 sidecar, linking without digest");
                Lookup::Invalid
            }
        }
    }
}
