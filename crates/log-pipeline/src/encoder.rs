//! 줄 단위 JSON(NDJSON) 인코더
//!
//! 레코드를 각각 독립적으로 직렬화하고 줄바꿈으로 이어 붙입니다.
//! 출력 줄 수는 입력 레코드 수와 같고, 마지막 줄 뒤에는 줄바꿈이 없습니다.
//! 객체의 필드 순서는 변형 구조체의 선언 순서를 따릅니다.

use serde::Serialize;

use crate::error::LogPipelineError;
use crate::group::Group;

/// 레코드 시퀀스를 NDJSON 바이트로 인코딩합니다.
///
/// 입력이 비어 있으면 빈 출력을 반환합니다.
pub fn encode_records<T: Serialize>(records: &[T]) -> Result<Vec<u8>, LogPipelineError> {
    let mut out = Vec::with_capacity(records.len() * 256);
    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            out.push(b'\n');
        }
        serde_json::to_writer(&mut out, record)
            .map_err(|e| LogPipelineError::Encode(e.to_string()))?;
    }
    Ok(out)
}

/// 그룹을 NDJSON 바이트로 인코딩합니다.
pub fn encode_group(group: &Group) -> Result<Vec<u8>, LogPipelineError> {
    encode_records(&group.records)
}
