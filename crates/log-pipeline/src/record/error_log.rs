//! nginx / php-fpm 에러 로그 레코드

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::lenient::{self, Object};

/// php-fpm이 내보내는 시각 형식 (`15-Jan-2024 12:00:00`)
const PHP_FPM_TIME_FORMAT: &str = "%d-%b-%Y %H:%M:%S";

/// 쿼리 엔진이 읽는 시각 형식 (`2024/01/15 12:00:00`)
const ARCHIVE_TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// nginx 에러 로그
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NginxErrorLog {
    pub nginx_error: String,
    pub time_stamp: String,
    pub log_level: String,
    pub message: String,
}

impl NginxErrorLog {
    /// 분류 마커 (최상위 키)
    pub const MARKER: &'static str = "nginx_error";

    pub(crate) fn from_object(obj: &Object) -> Self {
        Self {
            nginx_error: lenient::string(obj, Self::MARKER),
            time_stamp: lenient::string(obj, "time_stamp"),
            log_level: lenient::string(obj, "log_level"),
            message: lenient::string(obj, "message"),
        }
    }
}

/// php-fpm 에러 로그
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhpFpmErrorLog {
    #[serde(rename = "php-fpm-error")]
    pub php_fpm_error: String,
    pub time_stamp: String,
    pub log_level: String,
    pub message: String,
}

impl PhpFpmErrorLog {
    /// 분류 마커 (최상위 키)
    pub const MARKER: &'static str = "php-fpm-error";

    /// `time_stamp`는 쿼리 엔진 형식으로 바뀝니다. 해석할 수 없는 값은 그대로 둡니다.
    pub(crate) fn from_object(obj: &Object) -> Self {
        Self {
            php_fpm_error: lenient::string(obj, Self::MARKER),
            time_stamp: normalize_php_time(&lenient::string(obj, "time_stamp")),
            log_level: lenient::string(obj, "log_level"),
            message: lenient::string(obj, "message"),
        }
    }
}

fn normalize_php_time(raw: &str) -> String {
    match NaiveDateTime::parse_from_str(raw.trim(), PHP_FPM_TIME_FORMAT) {
        Ok(parsed) => parsed.format(ARCHIVE_TIME_FORMAT).to_string(),
        Err(_) => raw.to_owned(),
    }
}
