//! 에러 타입 — 도메인별 에러 정의

/// wheelhouse 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum WheelhouseError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 오브젝트 스토리지 에러
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// 인덱싱 처리 에러
    #[error("index error: {0}")]
    Index(#[from] IndexError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 오브젝트 스토리지 에러
///
/// 스토리지 백엔드(S3, 로컬 디렉토리, 인메모리)가 공통으로 반환합니다.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// 백엔드 연결/인증 실패
    #[error("connection failed: {0}")]
    Connection(String),

    /// 오브젝트가 존재하지 않음
    #[error("object not found: {key}")]
    NotFound { key: String },

    /// 목록 조회 실패
    #[error("list failed under '{prefix}': {reason}")]
    List { prefix: String, reason: String },

    /// 오브젝트 읽기 실패
    #[error("read failed for '{key}': {reason}")]
    Read { key: String, reason: String },

    /// 오브젝트 쓰기 실패
    #[error("write failed for '{key}': {reason}")]
    Write { key: String, reason: String },

    /// 스토리지 키로 사용할 수 없는 경로
    #[error("invalid object key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },
}

/// 인덱싱 처리 에러
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// 버킷 스캔 실패 (실행 중단)
    #[error("scan failed: {0}")]
    ScanFailed(String),

    /// 일부 페이지 게시 실패
    #[error("publish incomplete: {failed} of {total} pages failed")]
    PublishIncomplete { failed: usize, total: usize },
}
