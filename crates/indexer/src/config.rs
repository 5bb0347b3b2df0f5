//! 인덱서 설정
//!
//! [`IndexerConfig`]는 core의 [`WheelhouseConfig`]에서 한 번의 실행에 필요한 값만
//! 골라낸 명시적 설정입니다. 인덱서 구성요소는 환경변수를 직접 읽지 않습니다.
//!
//! # 사용 예시
//!
//! ```
//! use wheelhouse_indexer::IndexerConfigBuilder;
//!
//! let config = IndexerConfigBuilder::new()
//!     .bucket("vllm-wheels")
//!     .prefix("nightly/")
//!     .dry_run(false)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.index_prefix, "simple");
//! ```

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use wheelhouse_core::config::WheelhouseConfig;

use crate::error::IndexerError;
use crate::storage::DEFAULT_PAGE_SIZE;

/// 목록 페이지 크기 상한
const MAX_LIST_PAGE_SIZE: usize = 10_000;
/// 동시 쓰기/조회 상한
const MAX_CONCURRENCY: usize = 64;

/// 스캔 대상 백엔드
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// S3 (또는 S3 호환) 버킷
    S3,
    /// 로컬 디렉토리
    Local,
}

impl StorageBackend {
    /// 문자열에서 백엔드를 해석합니다 (대소문자 무시).
    pub fn from_str_loose(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "s3" => Some(Self::S3),
            "local" => Some(Self::Local),
            _ => None,
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::S3 => write!(f, "s3"),
            Self::Local => write!(f, "local"),
        }
    }
}

/// 인덱서 실행 설정
#[derive(Debug, Clone, Serialize)]
pub struct IndexerConfig {
    /// 스캔 대상 백엔드
    pub backend: StorageBackend,
    /// 버킷 이름 (local 백엔드는 디렉토리 경로)
    pub bucket: String,
    /// 스캔 접두사 (빈 문자열이면 버킷 전체)
    pub prefix: String,
    /// S3 호환 엔드포인트
    pub endpoint: Option<String>,
    /// 리전
    pub region: Option<String>,
    /// 목록 조회 페이지 크기
    pub list_page_size: usize,
    /// 인덱스 루트 경로
    pub index_prefix: String,
    /// 절대 링크 기준 URL
    pub base_url: Option<String>,
    /// 사이드카 다이제스트 연결 여부
    pub with_digests: bool,
    /// ref 하위 인덱스 생성 여부
    pub ref_indexes: bool,
    /// dry run 여부
    pub dry_run: bool,
    /// 로컬 출력 디렉토리 (`None`이면 버킷에 게시)
    pub local_dir: Option<PathBuf>,
    /// 동시 쓰기/조회 수
    pub concurrency: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::S3,
            bucket: String::new(),
            prefix: String::new(),
            endpoint: None,
            region: None,
            list_page_size: DEFAULT_PAGE_SIZE,
            index_prefix: "simple".to_owned(),
            base_url: None,
            with_digests: false,
            ref_indexes: false,
            dry_run: true,
            local_dir: None,
            concurrency: 8,
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_owned())
}

impl IndexerConfig {
    /// core 설정에서 인덱서 설정을 생성합니다.
    ///
    /// 알 수 없는 백엔드 이름은 S3로 간주합니다 (core 검증에서 이미 거부됨).
    pub fn from_core(core: &WheelhouseConfig) -> Self {
        Self {
            backend: StorageBackend::from_str_loose(&core.storage.backend)
                .unwrap_or(StorageBackend::S3),
            bucket: core.storage.bucket.clone(),
            prefix: core.storage.prefix.clone(),
            endpoint: non_empty(&core.storage.endpoint),
            region: non_empty(&core.storage.region),
            list_page_size: core.storage.list_page_size,
            index_prefix: core.index.index_prefix.clone(),
            base_url: non_empty(&core.index.base_url),
            with_digests: core.index.with_digests,
            ref_indexes: core.index.ref_indexes,
            dry_run: core.publish.dry_run,
            local_dir: non_empty(&core.publish.local_dir).map(PathBuf::from),
            concurrency: core.publish.concurrency,
        }
    }

    /// 설정 값의 유효성을 검증합니다.
    ///
    /// # 검증 규칙
    ///
    /// - `bucket`: 비어 있으면 안 됨
    /// - `list_page_size`: 1-10000
    /// - `concurrency`: 1-64
    /// - `index_prefix`: `/`로 시작하지 않고 `..` 구성요소가 없어야 함
    /// - `base_url`: `http://` 또는 `https://`로 시작
    pub fn validate(&self) -> Result<(), IndexerError> {
        if self.bucket.trim().is_empty() {
            return Err(IndexerError::Config {
                field: "storage.bucket".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        if self.list_page_size == 0 || self.list_page_size > MAX_LIST_PAGE_SIZE {
            return Err(IndexerError::Config {
                field: "storage.list_page_size".to_owned(),
                reason: format!("must be 1-{MAX_LIST_PAGE_SIZE}"),
            });
        }

        if self.concurrency == 0 || self.concurrency > MAX_CONCURRENCY {
            return Err(IndexerError::Config {
                field: "publish.concurrency".to_owned(),
                reason: format!("must be 1-{MAX_CONCURRENCY}"),
            });
        }

        if self.index_prefix.starts_with('/')
            || self.index_prefix.split('/').any(|seg| seg == "..")
        {
            return Err(IndexerError::Config {
                field: "index.index_prefix".to_owned(),
                reason: "must be a relative path without '..' segments".to_owned(),
            });
        }

        if self
            .base_url
            .as_deref()
            .is_some_and(|url| !(url.starts_with("http://") || url.starts_with("https://")))
        {
            return Err(IndexerError::Config {
                field: "index.base_url".to_owned(),
                reason: "must start with http:// or https://".to_owned(),
            });
        }

        Ok(())
    }
}

/// [`IndexerConfig`] 빌더
///
/// 빌드 시 유효성을 검증합니다.
#[derive(Default)]
pub struct IndexerConfigBuilder {
    config: IndexerConfig,
}

impl IndexerConfigBuilder {
    /// 기본값을 가진 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 기존 설정에서 시작합니다.
    pub fn from_config(config: IndexerConfig) -> Self {
        Self { config }
    }

    /// 백엔드를 설정합니다.
    pub fn backend(mut self, backend: StorageBackend) -> Self {
        self.config.backend = backend;
        self
    }

    /// 버킷 이름을 설정합니다.
    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.config.bucket = bucket.into();
        self
    }

    /// 스캔 접두사를 설정합니다.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.prefix = prefix.into();
        self
    }

    /// 목록 페이지 크기를 설정합니다.
    pub fn list_page_size(mut self, size: usize) -> Self {
        self.config.list_page_size = size;
        self
    }

    /// 인덱스 루트 경로를 설정합니다.
    pub fn index_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.index_prefix = prefix.into();
        self
    }

    /// 절대 링크 기준 URL을 설정합니다. 빈 문자열은 상대 링크입니다.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = non_empty(&url.into());
        self
    }

    /// 다이제스트 연결 여부를 설정합니다.
    pub fn with_digests(mut self, enabled: bool) -> Self {
        self.config.with_digests = enabled;
        self
    }

    /// ref 하위 인덱스 생성 여부를 설정합니다.
    pub fn ref_indexes(mut self, enabled: bool) -> Self {
        self.config.ref_indexes = enabled;
        self
    }

    /// dry run 여부를 설정합니다.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.config.dry_run = dry_run;
        self
    }

    /// 로컬 출력 디렉토리를 설정합니다.
    pub fn local_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.local_dir = Some(dir.into());
        self
    }

    /// 동시 쓰기 수를 설정합니다.
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    /// 설정을 검증하고 빌드합니다.
    ///
    /// # Errors
    ///
    /// 유효성 검증 실패 시 `IndexerError::Config` 반환
    pub fn build(self) -> Result<IndexerConfig, IndexerError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
