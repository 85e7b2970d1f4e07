//! 관대한(lenient) 필드 추출 헬퍼
//!
//! 필드가 없거나 `null`이면 빈 값으로 취급하고, 문자열 필드에 숫자나 불리언이
//! 들어 있으면 텍스트로 변환합니다. 타입 불일치로 레코드 전체를 버리지 않습니다.

use serde_json::{Map, Value};

/// JSON 객체 타입
pub(crate) type Object = Map<String, Value>;

/// 문자열 필드를 추출합니다.
///
/// 문자열/숫자/불리언은 텍스트로, 객체/배열은 압축 JSON 텍스트로 변환합니다.
pub(crate) fn string(obj: &Object, key: &str) -> String {
    obj.get(key).map(value_to_text).unwrap_or_default()
}

/// 별칭 중 처음으로 존재하는 필드의 문자열 값을 추출합니다.
pub(crate) fn string_any(obj: &Object, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|k| obj.get(*k).filter(|v| !v.is_null()))
        .map(value_to_text)
        .unwrap_or_default()
}

/// 불리언 필드를 추출합니다. `"true"`/`"false"` 문자열도 허용합니다.
pub(crate) fn boolean(obj: &Object, key: &str) -> bool {
    match obj.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// 문자열 배열 필드를 추출합니다. 단일 스칼라는 원소 1개짜리 배열이 됩니다.
pub(crate) fn string_list(obj: &Object, key: &str) -> Vec<String> {
    match obj.get(key) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .filter(|v| !v.is_null())
            .map(value_to_text)
            .collect(),
        Some(other) => vec![value_to_text(other)],
    }
}

/// 중첩 객체 필드를 추출합니다. 객체가 아니면 빈 객체를 반환합니다.
pub(crate) fn object<'a>(obj: &'a Object, key: &str) -> &'a Object {
    static EMPTY: std::sync::OnceLock<Object> = std::sync::OnceLock::new();
    match obj.get(key) {
        Some(Value::Object(inner)) => inner,
        _ => EMPTY.get_or_init(Object::new),
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}
