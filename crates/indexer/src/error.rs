//! 인덱서 에러 타입
//!
//! [`IndexerError`]는 인덱서 모듈 내에서 실행을 중단시키는 에러를 나타냅니다.
//! `From<IndexerError> for WheelhouseError` 구현을 통해 `?` 연산자로
//! 상위 에러 타입으로 자연스럽게 전파됩니다.
//!
//! # 에러 카테고리
//!
//! - **목록 조회 (치명적)**: `Listing`, `StalledPagination`
//! - **설정**: `Config`
//! - **스토리지 백엔드 구성**: `Storage`
//!
//! 아티팩트가 아닌 키는 에러가 아니며(건너뜀), 개별 페이지 쓰기 실패는
//! 에러 대신 [`PublishReport`](crate::publish::PublishReport)에 기록됩니다.

use wheelhouse_core::error::{ConfigError, IndexError, StorageError, WheelhouseError};

/// 인덱서 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum IndexerError {
    /// 버킷 목록 조회 실패 (인증, 네트워크, 버킷 없음)
    /// `source`가 접두사를 이미 포함하므로 메시지에 반복하지 않습니다.
    #[error("listing failed: {source}")]
    Listing {
        /// 조회 대상 접두사
        prefix: String,
        /// 원본 스토리지 에러
        source: StorageError,
    },

    /// 연속 토큰이 진행하지 않는 페이지네이션
    #[error("listing under '{prefix}' did not advance past continuation token '{token}'")]
    StalledPagination {
        /// 조회 대상 접두사
        prefix: String,
        /// 반복된 연속 토큰
        token: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 스토리지 백엔드 구성 실패
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl IndexerError {
    /// 목록 조회 단계에서 발생한 치명적 에러인지 반환합니다.
    pub fn is_listing_failure(&self) -> bool {
        matches!(self, Self::Listing { .. } | Self::StalledPagination { .. })
    }
}

/// 스토리지 에러에서 접두사 문맥을 뺀 원인만 꺼냅니다.
fn storage_reason(source: &StorageError) -> String {
    match source {
        StorageError::List { reason, .. } => reason.clone(),
        other => other.to_string(),
    }
}

impl From<IndexerError> for WheelhouseError {
    fn from(err: IndexerError) -> Self {
        match err {
            IndexerError::Listing { prefix, source } => {
                let reason = storage_reason(&source);
                WheelhouseError::Index(IndexError::ScanFailed(format!(
                    "listing failed under '{prefix}': {reason}"
                )))
            }
            err @ IndexerError::StalledPagination { .. } => {
                WheelhouseError::Index(IndexError::ScanFailed(err.to_string()))
            }
            IndexerError::Config { field, reason } => {
                WheelhouseError::Config(ConfigError::InvalidValue { field, reason })
            }
            IndexerError::Storage(source) => WheelhouseError::Storage(source),
        }
    }
}
