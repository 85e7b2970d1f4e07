//! 메트릭 상수 및 설명 등록
//!
//! 파이프라인이 기록하는 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `logfan_pipeline_`
//! - 접미어: `_total` (counter), `_seconds` (histogram)
//!
//! 레코더는 이 크레이트가 설치하지 않습니다. 레코더가 없으면 매크로 호출은 no-op입니다.
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(logfan_core::metrics::PIPELINE_RECORDS_RECEIVED_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 레코드 변형 레이블 키 (nginx_access, application, nginx_error, php-fpm-error)
pub const LABEL_VARIANT: &str = "variant";

/// 스테이지 레이블 키 (alert, archive, index)
pub const LABEL_STAGE: &str = "stage";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

// ─── Pipeline 메트릭 ────────────────────────────────────────────────

/// 수신된 원시 레코드 수 (counter)
pub const PIPELINE_RECORDS_RECEIVED_TOTAL: &str = "logfan_pipeline_records_received_total";

/// 분류되지 못해 드롭된 레코드 수 (counter)
pub const PIPELINE_RECORDS_DROPPED_TOTAL: &str = "logfan_pipeline_records_dropped_total";

/// 전송된 알림 수 (counter, label: variant)
pub const PIPELINE_ALERTS_SENT_TOTAL: &str = "logfan_pipeline_alerts_sent_total";

/// 업로드된 아카이브 오브젝트 수 (counter, label: variant)
pub const PIPELINE_ARCHIVES_UPLOADED_TOTAL: &str = "logfan_pipeline_archives_uploaded_total";

/// 색인된 문서 수 (counter, label: variant)
pub const PIPELINE_DOCUMENTS_INDEXED_TOTAL: &str = "logfan_pipeline_documents_indexed_total";

/// 실패한 호출 수 (counter, labels: variant, stage)
pub const PIPELINE_INVOCATION_FAILURES_TOTAL: &str = "logfan_pipeline_invocation_failures_total";

/// 호출 처리 시간 (histogram, 초, label: result)
pub const PIPELINE_INVOCATION_DURATION_SECONDS: &str =
    "logfan_pipeline_invocation_duration_seconds";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!(
        PIPELINE_RECORDS_RECEIVED_TOTAL,
        "Total number of raw records received from the stream"
    );
    describe_counter!(
        PIPELINE_RECORDS_DROPPED_TOTAL,
        "Total number of raw records dropped because no schema matched"
    );
    describe_counter!(
        PIPELINE_ALERTS_SENT_TOTAL,
        "Total number of webhook notifications posted"
    );
    describe_counter!(
        PIPELINE_ARCHIVES_UPLOADED_TOTAL,
        "Total number of compressed archives uploaded to object storage"
    );
    describe_counter!(
        PIPELINE_DOCUMENTS_INDEXED_TOTAL,
        "Total number of documents written to the search store"
    );
    describe_counter!(
        PIPELINE_INVOCATION_FAILURES_TOTAL,
        "Total number of invocations that failed in a sink stage"
    );
    describe_histogram!(
        PIPELINE_INVOCATION_DURATION_SECONDS,
        "Time to process one stream batch in seconds"
    );
}
