//! 스트림 배치 디코딩 -- 트리거 이벤트를 원시 레코드 목록으로 변환합니다.
//!
//! 두 가지 입력 형식을 지원합니다.
//! - 스트림 트리거 봉투: `{"Records":[{"kinesis":{"data":"<base64>", ...}}]}`
//! - 줄 단위 입력: 한 줄에 원시 레코드 하나 (로컬 재생용)
//!
//! 봉투 안의 레코드는 하나씩 디코딩합니다. 형태가 맞지 않거나 `data`가 없는
//! 레코드, base64 디코딩에 실패한 레코드, 빈 페이로드는 경고와 함께 드롭되며
//! 같은 봉투의 나머지 레코드에는 영향을 주지 않습니다.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::error::LogPipelineError;
use crate::record::RawRecord;

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "Records", default)]
    records: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeRecord {
    #[serde(default)]
    kinesis: Option<StreamPayload>,
    #[serde(rename = "eventID", default)]
    event_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamPayload {
    #[serde(default)]
    data: Option<String>,
    #[serde(rename = "partitionKey", default)]
    partition_key: Option<String>,
    #[serde(rename = "sequenceNumber", default)]
    sequence_number: Option<String>,
}

/// 호출 하나가 처리할 원시 레코드 배치
#[derive(Debug, Clone, Default)]
pub struct StreamBatch {
    /// 배치 순서를 유지한 원시 레코드 (모두 비어 있지 않음)
    pub records: Vec<RawRecord>,
    /// 디코딩 단계에서 버려진 레코드 수
    pub skipped: usize,
}

impl StreamBatch {
    /// 원시 레코드로 배치를 만듭니다. 빈 페이로드는 제외됩니다.
    pub fn new(records: Vec<RawRecord>) -> Self {
        let total = records.len();
        let records: Vec<RawRecord> = records.into_iter().filter(|r| !r.is_empty()).collect();
        Self {
            skipped: total - records.len(),
            records,
        }
    }

    /// 스트림 트리거 봉투 JSON을 디코딩합니다.
    ///
    /// # Errors
    ///
    /// 봉투 자체가 올바른 JSON이 아니면 `LogPipelineError::Decode`를 반환합니다.
    /// 개별 레코드의 오류는 에러가 아니며 해당 레코드만 드롭됩니다.
    pub fn from_event_json(input: &[u8]) -> Result<Self, LogPipelineError> {
        let envelope: Envelope = serde_json::from_slice(input)
            .map_err(|e| LogPipelineError::Decode(format!("invalid stream envelope: {e}")))?;

        let mut batch = Self::default();
        for (index, value) in envelope.records.into_iter().enumerate() {
            match decode_record(value) {
                Ok(raw) => batch.records.push(raw),
                Err(reason) => {
                    warn!(index, reason = %reason, "dropping stream record");
                    batch.skipped += 1;
                }
            }
        }
        Ok(batch)
    }

    /// 줄 단위 입력을 디코딩합니다. 공백뿐인 줄은 건너뜁니다.
    pub fn from_lines(input: &[u8]) -> Self {
        let records = input
            .split(|b| *b == b'\n')
            .map(<[u8]>::trim_ascii)
            .filter(|line| !line.is_empty())
            .map(|line| RawRecord::new(Bytes::copy_from_slice(line)))
            .collect();
        Self {
            records,
            skipped: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// 봉투 레코드 하나를 원시 레코드로 변환합니다. 실패 시 드롭 사유를 반환합니다.
fn decode_record(value: Value) -> Result<RawRecord, String> {
    let record: EnvelopeRecord =
        serde_json::from_value(value).map_err(|e| format!("malformed record: {e}"))?;
    let event_id = record.event_id.unwrap_or_default();
    let payload = record
        .kinesis
        .ok_or_else(|| format!("record {event_id} has no stream payload"))?;
    let data = payload
        .data
        .ok_or_else(|| format!("record {event_id} has no data"))?;
    let decoded = STANDARD
        .decode(data.as_bytes())
        .map_err(|e| format!("record {event_id} has invalid base64 payload: {e}"))?;
    if decoded.is_empty() {
        return Err(format!("record {event_id} has an empty payload"));
    }

    let mut raw = RawRecord::new(decoded);
    raw.partition_key = payload.partition_key;
    raw.sequence_number = payload.sequence_number;
    Ok(raw)
}
