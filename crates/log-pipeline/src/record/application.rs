//! 애플리케이션 로그 레코드와 알림 지시자

use serde::{Deserialize, Serialize};

use super::lenient::{self, Object};

/// 애플리케이션 로그
///
/// `slack` 필드는 레코드에 포함된 알림 지시자로, 이 변형의 알림 여부를
/// 결정하는 유일한 근거입니다. 레코드의 `level`은 알림과 무관합니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationLog {
    pub id: String,
    pub system: String,
    pub level: String,
    pub datetime: String,
    pub env: String,
    pub message: String,
    pub code: String,
    pub response: String,
    pub trace: Vec<String>,
    pub genre: String,
    pub parameters: String,
    pub slack: SlackDirective,
    pub extra: ExtraContext,
}

/// 레코드에 포함된 알림 지시자 (`slack`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackDirective {
    pub notification: bool,
    pub body: SlackBody,
}

/// 알림 지시자 본문
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackBody {
    pub send_channel: String,
    pub at_channel: bool,
    #[serde(rename = "Message")]
    pub message: String,
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Level")]
    pub level: String,
}

/// 발생 위치 및 요청 컨텍스트 (`extra`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraContext {
    pub file: String,
    pub line: String,
    pub class: String,
    pub function: String,
    pub process_id: String,
    pub url: String,
    pub ip: String,
    pub http_method: String,
    pub server: String,
    pub referrer: String,
}

/// 알림 지시자의 정규화된 형태
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertDirective {
    /// 알림 전송 여부
    pub should_notify: bool,
    /// at-channel 표시 여부
    pub at_channel: bool,
    /// 대상 채널 (비어 있으면 기본 채널)
    pub target_channel: String,
    /// 알림 본문
    pub message: String,
}

impl ApplicationLog {
    /// 분류 마커 (최상위 키)
    pub const MARKER: &'static str = "extra";

    pub(crate) fn from_object(obj: &Object) -> Self {
        let s = |key| lenient::string(obj, key);
        Self {
            id: s("id"),
            system: s("system"),
            level: s("level"),
            datetime: s("datetime"),
            env: s("env"),
            message: s("message"),
            code: s("code"),
            response: s("response"),
            trace: lenient::string_list(obj, "trace"),
            genre: s("genre"),
            parameters: s("parameters"),
            slack: SlackDirective::from_object(lenient::object(obj, "slack")),
            extra: ExtraContext::from_object(lenient::object(obj, "extra")),
        }
    }

    /// 알림 지시자를 반환합니다.
    pub fn directive(&self) -> AlertDirective {
        AlertDirective {
            should_notify: self.slack.notification,
            at_channel: self.slack.body.at_channel,
            target_channel: self.slack.body.send_channel.clone(),
            message: self.slack.body.message.clone(),
        }
    }
}

impl SlackDirective {
    fn from_object(obj: &Object) -> Self {
        let body = lenient::object(obj, "body");
        Self {
            notification: lenient::boolean(obj, "notification"),
            body: SlackBody {
                send_channel: lenient::string(body, "send_channel"),
                at_channel: lenient::boolean(body, "at_channel"),
                message: lenient::string_any(body, &["Message", "message"]),
                id: lenient::string_any(body, &["Id", "id"]),
                level: lenient::string_any(body, &["Level", "level"]),
            },
        }
    }
}

impl ExtraContext {
    fn from_object(obj: &Object) -> Self {
        let s = |key| lenient::string(obj, key);
        Self {
            file: s("file"),
            line: s("line"),
            class: s("class"),
            function: s("function"),
            process_id: s("process_id"),
            url: s("url"),
            ip: s("ip"),
            http_method: s("http_method"),
            server: s("server"),
            referrer: s("referrer"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> serde_json::Value {
        json!({
            "id": "a1",
            "system": "billing",
            "level": "INFO",
            "datetime": "2024-01-15 12:00:00",
            "message": "charge failed",
            "trace": ["#0 /app/Charge.php(10)"],
            "slack": {
                "notification": true,
                "body": {
                    "send_channel": "#billing",
                    "at_channel": "true",
                    "message": "card declined",
                    "Id": "a1",
                    "level": "ERROR"
                }
            },
            "extra": {"file": "/app/Charge.php", "line": 10, "process_id": 4242}
        })
    }

    #[test]
    fn decodes_nested_directive_with_aliases() {
        let log = ApplicationLog::from_object(sample().as_object().unwrap());
        assert!(log.slack.notification);
        assert!(log.slack.body.at_channel);
        assert_eq!(log.slack.body.message, "card declined");
        assert_eq!(log.slack.body.level, "ERROR");
        assert_eq!(log.extra.line, "10");
        assert_eq!(log.extra.process_id, "4242");
        assert_eq!(log.trace.len(), 1);
    }

    #[test]
    fn directive_ignores_record_level() {
        let log = ApplicationLog::from_object(sample().as_object().unwrap());
        let directive = log.directive();
        assert!(directive.should_notify);
        assert_eq!(directive.target_channel, "#billing");
        assert_eq!(directive.message, "card declined");
        assert_eq!(log.level, "INFO");
    }

    #[test]
    fn missing_slack_means_no_notification() {
        let value = json!({"message": "ok", "extra": {}});
        let log = ApplicationLog::from_object(value.as_object().unwrap());
        assert!(!log.directive().should_notify);
        assert!(log.trace.is_empty());
    }

    #[test]
    fn serializes_directive_with_original_key_names() {
        let log = ApplicationLog::from_object(sample().as_object().unwrap());
        let value = serde_json::to_value(&log).unwrap();
        assert_eq!(value["slack"]["body"]["Message"], "card declined");
        assert_eq!(value["slack"]["body"]["Level"], "ERROR");
    }
}
