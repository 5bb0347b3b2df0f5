//! 설정 관리 — wheelhouse.toml 파싱 및 런타임 설정
//!
//! [`WheelhouseConfig`]는 인덱서 실행에 필요한 모든 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`WHEELHOUSE_STORAGE_BUCKET=my-wheels` 형식)
//! 3. 설정 파일 (`wheelhouse.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), wheelhouse_core::error::WheelhouseError> {
//! use wheelhouse_core::config::WheelhouseConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = WheelhouseConfig::load("wheelhouse.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = WheelhouseConfig::parse("[storage]\nbucket = \"my-wheels\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, WheelhouseError};

/// wheelhouse 통합 설정
///
/// `wheelhouse.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WheelhouseConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 스캔 대상 스토리지 설정
    #[serde(default)]
    pub storage: StorageConfig,
    /// 인덱스 페이지 생성 설정
    #[serde(default)]
    pub index: IndexConfig,
    /// 게시 설정
    #[serde(default)]
    pub publish: PublishConfig,
}

/// 설정 상한값 상수
const MAX_LIST_PAGE_SIZE: usize = 10_000;
const MAX_PUBLISH_CONCURRENCY: usize = 64;

impl WheelhouseConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    /// 3. 유효성 검증
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, WheelhouseError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 설정 파일이 없으면 기본값에 환경변수 오버라이드만 적용합니다.
    ///
    /// 파일이 존재하지만 파싱/검증에 실패하면 에러를 반환합니다.
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self, WheelhouseError> {
        match Self::load(path.as_ref()).await {
            Err(WheelhouseError::Config(ConfigError::FileNotFound { path })) => {
                warn!(path = %path, "config file not found, using defaults");
                let mut config = Self::default();
                config.apply_env_overrides();
                config.validate()?;
                Ok(config)
            }
            other => other,
        }
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, WheelhouseError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                WheelhouseError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                WheelhouseError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, WheelhouseError> {
        toml::from_str(toml_str).map_err(|e| {
            WheelhouseError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `WHEELHOUSE_{SECTION}_{FIELD}`
    /// 예: `WHEELHOUSE_PUBLISH_DRY_RUN=false`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "WHEELHOUSE_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "WHEELHOUSE_GENERAL_LOG_FORMAT");

        // Storage
        override_string(&mut self.storage.backend, "WHEELHOUSE_STORAGE_BACKEND");
        override_string(&mut self.storage.bucket, "WHEELHOUSE_STORAGE_BUCKET");
        override_string(&mut self.storage.prefix, "WHEELHOUSE_STORAGE_PREFIX");
        override_string(&mut self.storage.endpoint, "WHEELHOUSE_STORAGE_ENDPOINT");
        override_string(&mut self.storage.region, "WHEELHOUSE_STORAGE_REGION");
        override_usize(
            &mut self.storage.list_page_size,
            "WHEELHOUSE_STORAGE_LIST_PAGE_SIZE",
        );

        // Index
        override_string(&mut self.index.index_prefix, "WHEELHOUSE_INDEX_INDEX_PREFIX");
        override_string(&mut self.index.base_url, "WHEELHOUSE_INDEX_BASE_URL");
        override_bool(&mut self.index.with_digests, "WHEELHOUSE_INDEX_WITH_DIGESTS");
        override_bool(&mut self.index.ref_indexes, "WHEELHOUSE_INDEX_REF_INDEXES");

        // Publish
        override_bool(&mut self.publish.dry_run, "WHEELHOUSE_PUBLISH_DRY_RUN");
        override_string(&mut self.publish.local_dir, "WHEELHOUSE_PUBLISH_LOCAL_DIR");
        override_usize(
            &mut self.publish.concurrency,
            "WHEELHOUSE_PUBLISH_CONCURRENCY",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    ///
    /// 버킷 이름처럼 실행 시점에만 필요한 값은 여기서 검사하지 않습니다.
    /// (`wheelhouse-indexer`의 `IndexerConfig::validate` 참고)
    pub fn validate(&self) -> Result<(), WheelhouseError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        // backend 검증
        let valid_backends = ["s3", "local"];
        if !valid_backends.contains(&self.storage.backend.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "storage.backend".to_owned(),
                reason: format!("must be one of: {}", valid_backends.join(", ")),
            }
            .into());
        }

        if self.storage.list_page_size == 0 || self.storage.list_page_size > MAX_LIST_PAGE_SIZE {
            return Err(ConfigError::InvalidValue {
                field: "storage.list_page_size".to_owned(),
                reason: format!("must be 1-{MAX_LIST_PAGE_SIZE}"),
            }
            .into());
        }

        if self.publish.concurrency == 0 || self.publish.concurrency > MAX_PUBLISH_CONCURRENCY {
            return Err(ConfigError::InvalidValue {
                field: "publish.concurrency".to_owned(),
                reason: format!("must be 1-{MAX_PUBLISH_CONCURRENCY}"),
            }
            .into());
        }

        // index_prefix는 버킷 내 상대 경로여야 함
        let prefix = self.index.index_prefix.as_str();
        if prefix.starts_with('/') || prefix.split('/').any(|seg| seg == "..") {
            return Err(ConfigError::InvalidValue {
                field: "index.index_prefix".to_owned(),
                reason: "must be a relative path without '..' segments".to_owned(),
            }
            .into());
        }

        if !self.index.base_url.is_empty()
            && !(self.index.base_url.starts_with("http://")
                || self.index.base_url.starts_with("https://"))
        {
            return Err(ConfigError::InvalidValue {
                field: "index.base_url".to_owned(),
                reason: "must start with http:// or https://".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 스캔 대상 스토리지 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// 백엔드 종류 (s3, local)
    pub backend: String,
    /// 버킷 이름 (local 백엔드는 디렉토리 경로)
    pub bucket: String,
    /// 스캔할 키 접두사 (빈 문자열이면 버킷 전체)
    pub prefix: String,
    /// S3 호환 엔드포인트 (빈 문자열이면 AWS 기본값)
    pub endpoint: String,
    /// 리전 (빈 문자열이면 환경에서 결정)
    pub region: String,
    /// 목록 조회 페이지 크기
    pub list_page_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: "s3".to_owned(),
            bucket: String::new(),
            prefix: String::new(),
            endpoint: String::new(),
            region: String::new(),
            list_page_size: 1000,
        }
    }
}

/// 인덱스 페이지 생성 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// 버킷 내 인덱스 루트 경로 (예: "simple")
    pub index_prefix: String,
    /// 다운로드 링크 기준 URL (빈 문자열이면 상대 경로 링크)
    pub base_url: String,
    /// `<key>.sha256` 사이드카 다이제스트를 링크에 포함할지 여부
    pub with_digests: bool,
    /// 최상위 디렉토리(ref)별 하위 인덱스 생성 여부
    pub ref_indexes: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            index_prefix: "simple".to_owned(),
            base_url: String::new(),
            with_digests: false,
            ref_indexes: false,
        }
    }
}

/// 게시 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// dry run 여부 (기본값 true: 명시적으로 끄기 전에는 아무것도 쓰지 않음)
    pub dry_run: bool,
    /// 로컬 출력 디렉토리 (빈 문자열이면 버킷에 게시)
    pub local_dir: String,
    /// 동시 쓰기 수
    pub concurrency: usize,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            dry_run: true,
            local_dir: String::new(),
            concurrency: 8,
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

/// bool 환경변수 값을 관대하게 해석합니다 (true/false, 1/0, yes/no, on/off).
pub fn parse_bool_loose(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match parse_bool_loose(&val) {
            Some(parsed) => *target = parsed,
            None => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}
