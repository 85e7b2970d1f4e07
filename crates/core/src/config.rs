//! 설정 관리 -- logfan.toml 파싱 및 런타임 설정
//!
//! [`LogfanConfig`]는 파이프라인 전체의 설정을 담는 최상위 구조체입니다.
//! 프로세스 시작 시 한 번 생성되어 각 컴포넌트 생성자로 전달됩니다.
//!
//! # 설정 로딩 우선순위
//! 1. 환경변수 (`LOGFAN_NOTIFY_WEBHOOK_URL=...` 형식)
//! 2. 설정 파일 (`logfan.toml`)
//! 3. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), logfan_core::error::LogfanError> {
//! use logfan_core::config::LogfanConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = LogfanConfig::load("logfan.toml").await?;
//!
//! // 파일 없이 기본값 + 환경변수만 사용
//! let config = LogfanConfig::from_env()?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, LogfanError};

/// UTC+9 (초 단위)
pub const DEFAULT_TIMEZONE_OFFSET_SECS: i32 = 9 * 3600;

/// 싱크 요청 타임아웃 상한 (초)
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Logfan 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogfanConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 오브젝트 스토리지 아카이브 설정
    #[serde(default)]
    pub archive: ArchiveConfig,
    /// 검색 스토어 설정
    #[serde(default)]
    pub search: SearchConfig,
    /// 웹훅 알림 설정
    #[serde(default)]
    pub notify: NotifyConfig,
    /// 알림 트리거 정책
    #[serde(default)]
    pub alert: AlertConfig,
}

impl LogfanConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LogfanError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, LogfanError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LogfanError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                LogfanError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// 기본값에 환경변수 오버라이드만 적용한 설정을 만듭니다.
    ///
    /// 설정 파일 없이 환경변수로만 배포되는 경우에 사용합니다.
    pub fn from_env() -> Result<Self, LogfanError> {
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, LogfanError> {
        toml::from_str(toml_str).map_err(|e| {
            LogfanError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `LOGFAN_{SECTION}_{FIELD}`
    /// 예: `LOGFAN_ARCHIVE_BUCKET=my-logs`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "LOGFAN_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "LOGFAN_GENERAL_LOG_FORMAT");

        // Archive
        override_string(&mut self.archive.region, "LOGFAN_ARCHIVE_REGION");
        override_string(&mut self.archive.endpoint, "LOGFAN_ARCHIVE_ENDPOINT");
        override_string(&mut self.archive.bucket, "LOGFAN_ARCHIVE_BUCKET");
        override_i32(
            &mut self.archive.timezone_offset_secs,
            "LOGFAN_ARCHIVE_TIMEZONE_OFFSET_SECS",
        );

        // Search
        override_string(&mut self.search.url, "LOGFAN_SEARCH_URL");
        override_string(&mut self.search.access_index, "LOGFAN_SEARCH_ACCESS_INDEX");
        override_string(
            &mut self.search.access_index_type,
            "LOGFAN_SEARCH_ACCESS_INDEX_TYPE",
        );
        override_string(&mut self.search.app_index, "LOGFAN_SEARCH_APP_INDEX");
        override_string(
            &mut self.search.app_index_type,
            "LOGFAN_SEARCH_APP_INDEX_TYPE",
        );
        override_string(
            &mut self.search.timestamp_offset,
            "LOGFAN_SEARCH_TIMESTAMP_OFFSET",
        );

        // Notify
        override_string(&mut self.notify.webhook_url, "LOGFAN_NOTIFY_WEBHOOK_URL");
        override_string(&mut self.notify.channel, "LOGFAN_NOTIFY_CHANNEL");
        override_string(&mut self.notify.username, "LOGFAN_NOTIFY_USERNAME");
        override_u64(&mut self.notify.timeout_secs, "LOGFAN_NOTIFY_TIMEOUT_SECS");

        // Alert
        override_csv(
            &mut self.alert.nginx_error_levels,
            "LOGFAN_ALERT_NGINX_ERROR_LEVELS",
        );
        override_csv(
            &mut self.alert.php_fpm_ignore_levels,
            "LOGFAN_ALERT_PHP_FPM_IGNORE_LEVELS",
        );
        override_csv(
            &mut self.alert.access_statuses,
            "LOGFAN_ALERT_ACCESS_STATUSES",
        );
        override_bool(
            &mut self.alert.error_at_channel,
            "LOGFAN_ALERT_ERROR_AT_CHANNEL",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogfanError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        if self.archive.bucket.trim().is_empty() {
            return Err(invalid("archive.bucket", "must not be empty"));
        }
        if self.archive.endpoint.is_empty() && self.archive.region.trim().is_empty() {
            return Err(invalid(
                "archive.region",
                "region is required when endpoint is not set",
            ));
        }
        if !self.archive.endpoint.is_empty() {
            check_http_url("archive.endpoint", &self.archive.endpoint)?;
        }
        // 유효한 UTC 오프셋은 ±18시간 이내
        if self.archive.timezone_offset_secs.abs() >= 18 * 3600 {
            return Err(invalid(
                "archive.timezone_offset_secs",
                "must be within +/-18 hours",
            ));
        }

        check_http_url("search.url", &self.search.url)?;
        check_index_name("search.access_index", &self.search.access_index)?;
        check_index_name("search.app_index", &self.search.app_index)?;
        if self.search.access_index_type.is_empty() {
            return Err(invalid("search.access_index_type", "must not be empty"));
        }
        if self.search.app_index_type.is_empty() {
            return Err(invalid("search.app_index_type", "must not be empty"));
        }
        if !is_offset_notation(&self.search.timestamp_offset) {
            return Err(invalid(
                "search.timestamp_offset",
                "must look like +HH:MM or -HH:MM",
            ));
        }

        check_http_url("notify.webhook_url", &self.notify.webhook_url)?;
        if self.notify.channel.is_empty() {
            return Err(invalid("notify.channel", "must not be empty"));
        }
        if self.notify.timeout_secs == 0 || self.notify.timeout_secs > MAX_REQUEST_TIMEOUT_SECS {
            return Err(invalid(
                "notify.timeout_secs",
                format!("must be 1-{MAX_REQUEST_TIMEOUT_SECS}"),
            ));
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 오브젝트 스토리지 아카이브 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// 스토리지 리전
    pub region: String,
    /// 엔드포인트 URL (비어 있으면 리전에서 유도)
    pub endpoint: String,
    /// 버킷 이름
    pub bucket: String,
    /// 아카이브 키 시간 파티션에 쓰는 UTC 오프셋 (초)
    pub timezone_offset_secs: i32,
}

impl ArchiveConfig {
    /// 실제 업로드에 사용할 엔드포인트를 반환합니다.
    pub fn resolved_endpoint(&self) -> String {
        if self.endpoint.is_empty() {
            format!("https://s3.{}.amazonaws.com", self.region)
        } else {
            self.endpoint.trim_end_matches('/').to_owned()
        }
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            region: "ap-northeast-1".to_owned(),
            endpoint: String::new(),
            bucket: "logfan-archive".to_owned(),
            timezone_offset_secs: DEFAULT_TIMEZONE_OFFSET_SECS,
        }
    }
}

/// 검색 스토어 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// 검색 스토어 URL
    pub url: String,
    /// 액세스 로그 인덱스
    pub access_index: String,
    /// 액세스 로그 문서 타입
    pub access_index_type: String,
    /// 애플리케이션 로그 인덱스
    pub app_index: String,
    /// 애플리케이션 로그 문서 타입
    pub app_index_type: String,
    /// 애플리케이션 로그 datetime에 붙이는 오프셋 표기
    pub timestamp_offset: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".to_owned(),
            access_index: "nginx".to_owned(),
            access_index_type: "access".to_owned(),
            app_index: "application".to_owned(),
            app_index_type: "log".to_owned(),
            timestamp_offset: "+09:00".to_owned(),
        }
    }
}

/// 웹훅 알림 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// 웹훅 URL
    pub webhook_url: String,
    /// 기본 채널
    pub channel: String,
    /// 발신자 표시 이름
    pub username: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            webhook_url: "http://localhost:8080/webhook".to_owned(),
            channel: "#alerts".to_owned(),
            username: "logfan".to_owned(),
            timeout_secs: 10,
        }
    }
}

/// 알림 트리거 정책
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// nginx 에러 로그: 이 레벨 중 하나면 알림
    pub nginx_error_levels: Vec<String>,
    /// php-fpm 에러 로그: 이 레벨이 아니면 알림
    pub php_fpm_ignore_levels: Vec<String>,
    /// 액세스 로그: 이 상태 코드 중 하나면 알림 (비어 있으면 알림 없음)
    pub access_statuses: Vec<String>,
    /// 에러/액세스 로그 알림에 at-channel 표시를 붙일지 여부
    pub error_at_channel: bool,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            nginx_error_levels: vec!["error".to_owned()],
            php_fpm_ignore_levels: vec!["NOTICE".to_owned()],
            access_statuses: Vec::new(),
            error_at_channel: false,
        }
    }
}

// --- 검증 헬퍼 ---

fn invalid(field: &str, reason: impl Into<String>) -> LogfanError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason: reason.into(),
    }
    .into()
}

fn check_http_url(field: &str, value: &str) -> Result<(), LogfanError> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(invalid(field, "must start with http:// or https://"))
    }
}

fn check_index_name(field: &str, value: &str) -> Result<(), LogfanError> {
    if value.is_empty() {
        return Err(invalid(field, "must not be empty"));
    }
    if value.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(invalid(field, "must be lowercase"));
    }
    if value.starts_with(['-', '_', '+']) {
        return Err(invalid(field, "must not start with '-', '_' or '+'"));
    }
    Ok(())
}

fn is_offset_notation(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 6
        && (bytes[0] == b'+' || bytes[0] == b'-')
        && bytes[1].is_ascii_digit()
        && bytes[2].is_ascii_digit()
        && bytes[3] == b':'
        && bytes[4].is_ascii_digit()
        && bytes[5].is_ascii_digit()
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_i32(target: &mut i32, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<i32>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse i32 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}
