//! 레코드 분류기 -- 원시 레코드를 알려진 스키마 변형 하나로 분류합니다.
//!
//! [`Classifier`]는 등록된 [`RecordDecoder`] 목록을 순서대로 시도하여
//! 첫 번째로 마커가 일치한 디코더의 결과를 사용합니다 (first match wins).
//! 어떤 마커도 없는 레코드, JSON 객체가 아닌 레코드, 크기 제한을 넘는 레코드는
//! 조용히 드롭되며 에러가 아닙니다.
//!
//! # 기본 우선순위
//! 1. `nginx_error` -> [`NginxErrorLog`]
//! 2. `php-fpm-error` -> [`PhpFpmErrorLog`]
//! 3. `forwardedfor` -> [`AccessLog`]
//! 4. `extra` -> [`ApplicationLog`]
//!
//! # 사용 예시
//! ```ignore
//! use logfan_log_pipeline::classifier::Classifier;
//! use logfan_log_pipeline::record::RawRecord;
//!
//! let classifier = Classifier::with_defaults();
//! let batch = classifier.classify_batch(&raw_records);
//! println!("{} classified, {} dropped", batch.records.len(), batch.dropped);
//! ```

use serde_json::{Map, Value};
use tracing::debug;

use crate::config::DEFAULT_MAX_RECORD_SIZE;
use crate::record::{
    AccessLog, ApplicationLog, ClassifiedRecord, NginxErrorLog, PhpFpmErrorLog, RawRecord,
    RecordKind,
};

/// 스키마 판별 + 디코딩 쌍
pub trait RecordDecoder: Send + Sync {
    /// 이 디코더가 만드는 변형
    fn kind(&self) -> RecordKind;

    /// 판별에 쓰는 최상위 키
    fn marker(&self) -> &str;

    /// 이 디코더가 처리할 레코드인지 판별합니다.
    fn matches(&self, object: &Map<String, Value>) -> bool {
        object.contains_key(self.marker())
    }

    /// 관대한 규칙으로 레코드를 디코딩합니다. 실패하지 않습니다.
    fn decode(&self, object: &Map<String, Value>) -> ClassifiedRecord;
}

/// 최상위 마커 키로 판별하는 디코더
pub struct MarkerDecoder {
    kind: RecordKind,
    marker: &'static str,
    decode_fn: fn(&Map<String, Value>) -> ClassifiedRecord,
}

impl MarkerDecoder {
    /// nginx 에러 로그 디코더
    pub fn nginx_error() -> Self {
        Self {
            kind: RecordKind::NginxError,
            marker: NginxErrorLog::MARKER,
            decode_fn: |o| ClassifiedRecord::NginxError(NginxErrorLog::from_object(o)),
        }
    }

    /// php-fpm 에러 로그 디코더
    pub fn php_fpm_error() -> Self {
        Self {
            kind: RecordKind::PhpFpmError,
            marker: PhpFpmErrorLog::MARKER,
            decode_fn: |o| ClassifiedRecord::PhpFpmError(PhpFpmErrorLog::from_object(o)),
        }
    }

    /// nginx 액세스 로그 디코더
    pub fn access() -> Self {
        Self {
            kind: RecordKind::Access,
            marker: AccessLog::MARKER,
            decode_fn: |o| ClassifiedRecord::Access(AccessLog::from_object(o)),
        }
    }

    /// 애플리케이션 로그 디코더
    pub fn application() -> Self {
        Self {
            kind: RecordKind::Application,
            marker: ApplicationLog::MARKER,
            decode_fn: |o| ClassifiedRecord::Application(ApplicationLog::from_object(o)),
        }
    }
}

impl RecordDecoder for MarkerDecoder {
    fn kind(&self) -> RecordKind {
        self.kind
    }

    fn marker(&self) -> &str {
        self.marker
    }

    fn decode(&self, object: &Map<String, Value>) -> ClassifiedRecord {
        (self.decode_fn)(object)
    }
}

/// 배치 분류 결과
#[derive(Debug, Default)]
pub struct ClassifiedBatch {
    /// 분류된 레코드 (입력 순서 유지)
    pub records: Vec<ClassifiedRecord>,
    /// 드롭된 레코드 수
    pub dropped: usize,
}

/// 레코드 분류기
pub struct Classifier {
    /// 등록된 디코더 목록 (순서대로 시도)
    decoders: Vec<Box<dyn RecordDecoder>>,
    /// 레코드 최대 크기 (바이트)
    max_record_size: usize,
}

impl Classifier {
    /// 디코더 없는 분류기를 생성합니다.
    pub fn new() -> Self {
        Self {
            decoders: Vec::new(),
            max_record_size: DEFAULT_MAX_RECORD_SIZE,
        }
    }

    /// 기본 디코더 세트로 분류기를 생성합니다.
    pub fn with_defaults() -> Self {
        Self::new()
            .register(Box::new(MarkerDecoder::nginx_error()))
            .register(Box::new(MarkerDecoder::php_fpm_error()))
            .register(Box::new(MarkerDecoder::access()))
            .register(Box::new(MarkerDecoder::application()))
    }

    /// 디코더를 등록합니다. 등록 순서대로 시도됩니다.
    pub fn register(mut self, decoder: Box<dyn RecordDecoder>) -> Self {
        self.decoders.push(decoder);
        self
    }

    /// 최대 레코드 크기를 설정합니다.
    pub fn with_max_record_size(mut self, size: usize) -> Self {
        self.max_record_size = size;
        self
    }

    /// 원시 레코드 하나를 분류합니다. 분류할 수 없으면 `None`입니다.
    pub fn classify(&self, raw: &RawRecord) -> Option<ClassifiedRecord> {
        if raw.is_empty() {
            debug!("dropping empty record");
            return None;
        }
        if raw.len() > self.max_record_size {
            debug!(
                size = raw.len(),
                max = self.max_record_size,
                "dropping oversized record"
            );
            return None;
        }

        let object = match serde_json::from_slice::<Value>(&raw.data) {
            Ok(Value::Object(object)) => object,
            Ok(_) => {
                debug!("dropping record: payload is not a JSON object");
                return None;
            }
            Err(e) => {
                debug!(error = %e, "dropping record: invalid JSON");
                return None;
            }
        };

        let decoder = self.decoders.iter().find(|d| d.matches(&object));
        match decoder {
            Some(decoder) => Some(decoder.decode(&object)),
            None => {
                debug!(
                    sequence_number = raw.sequence_number.as_deref().unwrap_or("-"),
                    "dropping record: no schema marker"
                );
                None
            }
        }
    }

    /// 배치 전체를 분류합니다. 결과는 입력 순서를 유지하며 입력보다 커지지 않습니다.
    pub fn classify_batch(&self, raws: &[RawRecord]) -> ClassifiedBatch {
        let mut batch = ClassifiedBatch {
            records: Vec::with_capacity(raws.len()),
            dropped: 0,
        };
        for raw in raws {
            match self.classify(raw) {
                Some(record) => batch.records.push(record),
                None => batch.dropped += 1,
            }
        }
        batch
    }

    /// 등록된 변형 목록 (시도 순서)
    pub fn registered_kinds(&self) -> Vec<RecordKind> {
        self.decoders.iter().map(|d| d.kind()).collect()
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(text: &str) -> RawRecord {
        RawRecord::new(text.to_owned())
    }

    #[test]
    fn empty_classifier_drops_everything() {
        let classifier = Classifier::new();
        assert!(classifier.classify(&raw(r#"{"extra":{}}"#)).is_none());
    }

    #[test]
    fn default_priority_order() {
        let kinds = Classifier::with_defaults().registered_kinds();
        assert_eq!(
            kinds,
            vec![
                RecordKind::NginxError,
                RecordKind::PhpFpmError,
                RecordKind::Access,
                RecordKind::Application,
            ]
        );
    }

    #[test]
    fn classifies_each_variant() {
        let classifier = Classifier::with_defaults();
        let cases = [
            (r#"{"nginx_error":"","log_level":"error"}"#, RecordKind::NginxError),
            (r#"{"php-fpm-error":"","log_level":"WARNING"}"#, RecordKind::PhpFpmError),
            (r#"{"host":"a","forwardedfor":"1.2.3.4"}"#, RecordKind::Access),
            (r#"{"message":"m","extra":{}}"#, RecordKind::Application),
        ];
        for (text, kind) in cases {
            let record = classifier.classify(&raw(text)).unwrap();
            assert_eq!(record.kind(), kind, "input: {text}");
        }
    }

    #[test]
    fn first_match_wins_when_markers_overlap() {
        let classifier = Classifier::with_defaults();
        let record = classifier
            .classify(&raw(r#"{"extra":{},"forwardedfor":"x","host":"h"}"#))
            .unwrap();
        assert_eq!(record.kind(), RecordKind::Access);
    }

    #[test]
    fn marker_must_be_a_top_level_key() {
        let classifier = Classifier::with_defaults();
        // 값 안에 마커 문자열이 있어도 키가 아니면 매칭되지 않음
        assert!(classifier
            .classify(&raw(r#"{"message":"nginx_error in extra"}"#))
            .is_none());
    }

    #[test]
    fn drops_non_object_and_invalid_payloads() {
        let classifier = Classifier::with_defaults();
        assert!(classifier.classify(&raw("not json")).is_none());
        assert!(classifier.classify(&raw(r#"["extra"]"#)).is_none());
        assert!(classifier.classify(&raw("")).is_none());
    }

    #[test]
    fn drops_oversized_record() {
        let classifier = Classifier::with_defaults().with_max_record_size(16);
        let text = r#"{"extra":{},"message":"this is too long"}"#;
        assert!(classifier.classify(&raw(text)).is_none());
    }

    #[test]
    fn batch_keeps_order_and_counts_drops() {
        let classifier = Classifier::with_defaults();
        let raws = vec![
            raw(r#"{"forwardedfor":"","host":"a"}"#),
            raw("garbage"),
            raw(r#"{"nginx_error":""}"#),
            raw(r#"{"unknown":1}"#),
        ];
        let batch = classifier.classify_batch(&raws);
        assert_eq!(batch.dropped, 2);
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.records[0].kind(), RecordKind::Access);
        assert_eq!(batch.records[1].kind(), RecordKind::NginxError);
    }

    #[test]
    fn custom_decoder_can_take_priority() {
        struct EverythingIsAccess;
        impl RecordDecoder for EverythingIsAccess {
            fn kind(&self) -> RecordKind {
                RecordKind::Access
            }
            fn marker(&self) -> &str {
                "*"
            }
            fn matches(&self, _object: &Map<String, Value>) -> bool {
                true
            }
            fn decode(&self, _object: &Map<String, Value>) -> ClassifiedRecord {
                ClassifiedRecord::Access(AccessLog::default())
            }
        }

        let classifier = Classifier::new()
            .register(Box::new(EverythingIsAccess))
            .register(Box::new(MarkerDecoder::application()));
        let record = classifier.classify(&raw(r#"{"extra":{}}"#)).unwrap();
        assert_eq!(record.kind(), RecordKind::Access);
    }
}
