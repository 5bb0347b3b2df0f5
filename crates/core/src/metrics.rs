//! 메트릭 상수 및 설명 등록
//!
//! 인덱서가 기록하는 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::histogram!()`
//! 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `wheelhouse_`
//! - 단계명: `scanner_`, `render_`, `publish_`, `run_`
//! - 접미어: `_total` (counter), `_seconds` (histogram)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(wheelhouse_core::metrics::SCANNER_ARTIFACTS_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 아티팩트 종류 레이블 키 (wheel, sdist)
pub const LABEL_KIND: &str = "kind";

/// 결과 레이블 키 (written, skipped, failed)
pub const LABEL_RESULT: &str = "result";

// ─── Scanner 메트릭 ────────────────────────────────────────────────

/// Scanner: 조회한 목록 페이지 수 (counter)
pub const SCANNER_LIST_PAGES_TOTAL: &str = "wheelhouse_scanner_list_pages_total";

/// Scanner: 목록에서 확인한 전체 오브젝트 수 (counter)
pub const SCANNER_OBJECTS_TOTAL: &str = "wheelhouse_scanner_objects_total";

/// Scanner: 아티팩트로 인식된 오브젝트 수 (counter, label: kind)
pub const SCANNER_ARTIFACTS_TOTAL: &str = "wheelhouse_scanner_artifacts_total";

/// Scanner: 아티팩트가 아니어서 건너뛴 키 수 (counter)
pub const SCANNER_KEYS_SKIPPED_TOTAL: &str = "wheelhouse_scanner_keys_skipped_total";

// ─── Render / Publish 메트릭 ───────────────────────────────────────

/// Render: 생성된 페이지 수 (counter)
pub const RENDER_PAGES_TOTAL: &str = "wheelhouse_render_pages_total";

/// Publish: 게시 결과별 페이지 수 (counter, label: result)
pub const PUBLISH_PAGES_TOTAL: &str = "wheelhouse_publish_pages_total";

/// Run: 전체 인덱싱 실행 소요 시간 (histogram, 초)
pub const RUN_DURATION_SECONDS: &str = "wheelhouse_run_duration_seconds";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더를 설치한 애플리케이션이 시작 시점에 한 번 호출합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!(
        SCANNER_LIST_PAGES_TOTAL,
        "Total number of listing pages fetched from object storage"
    );
    describe_counter!(
        SCANNER_OBJECTS_TOTAL,
        "Total number of objects seen while listing the bucket"
    );
    describe_counter!(
        SCANNER_ARTIFACTS_TOTAL,
        "Total number of objects recognized as distributable artifacts"
    );
    describe_counter!(
        SCANNER_KEYS_SKIPPED_TOTAL,
        "Total number of object keys skipped as not an artifact"
    );
    describe_counter!(RENDER_PAGES_TOTAL, "Total number of index pages rendered");
    describe_counter!(
        PUBLISH_PAGES_TOTAL,
        "Index pages handled by the publisher, by result"
    );
    describe_histogram!(
        RUN_DURATION_SECONDS,
        "Time to complete a full indexing run in seconds"
    );
}
