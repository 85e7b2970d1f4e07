//! nginx 액세스 로그 레코드

use serde::{Deserialize, Serialize};

use super::lenient::{self, Object};

/// nginx 액세스 로그
///
/// 필드 순서는 직렬화(NDJSON, 색인 문서) 순서와 같습니다.
/// 모든 값은 nginx 로그 포맷이 내보낸 텍스트 그대로 유지합니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessLog {
    pub time: String,
    pub remote_addr: String,
    pub host: String,
    pub request_method: String,
    pub request_length: String,
    pub request_uri: String,
    pub https: String,
    pub uri: String,
    pub query_string: String,
    pub status: String,
    pub bytes_sent: String,
    pub body_bytes_sent: String,
    pub referer: String,
    pub useragent: String,
    pub http_x_amzn_trace_id: String,
    pub http_x_amzn_apigateway_api_id: String,
    pub forwardedfor: String,
    pub request_time: String,
    pub upstream_response_time: String,
}

impl AccessLog {
    /// 분류 마커 (최상위 키)
    pub const MARKER: &'static str = "forwardedfor";

    pub(crate) fn from_object(obj: &Object) -> Self {
        let s = |key| lenient::string(obj, key);
        Self {
            time: s("time"),
            remote_addr: s("remote_addr"),
            host: s("host"),
            request_method: s("request_method"),
            request_length: s("request_length"),
            request_uri: s("request_uri"),
            https: s("https"),
            uri: s("uri"),
            query_string: s("query_string"),
            status: s("status"),
            bytes_sent: s("bytes_sent"),
            body_bytes_sent: s("body_bytes_sent"),
            referer: s("referer"),
            useragent: s("useragent"),
            http_x_amzn_trace_id: s("http_x_amzn_trace_id"),
            http_x_amzn_apigateway_api_id: s("http_x_amzn_apigateway_api_id"),
            forwardedfor: s("forwardedfor"),
            request_time: s("request_time"),
            upstream_response_time: s("upstream_response_time"),
        }
    }

    /// 알림 본문 (`<status> <method> <uri> (<host>)`)
    pub fn summary(&self) -> String {
        format!(
            "{} {} {} ({})",
            self.status, self.request_method, self.request_uri, self.host
        )
    }
}
