//! 로그 파이프라인 설정
//!
//! [`PipelineConfig`]는 core의 [`LogfanConfig`](logfan_core::config::LogfanConfig)를
//! 기반으로 파이프라인 각 컴포넌트가 사용하는 설정을 제공합니다.
//! 프로세스 시작 시 한 번 만들어져 각 컴포넌트 생성자로 전달되며,
//! 파이프라인 내부에서 환경변수를 직접 읽지 않습니다.
//!
//! # 사용 예시
//! ```ignore
//! use logfan_core::config::LogfanConfig;
//! use logfan_log_pipeline::config::PipelineConfig;
//!
//! let core_config = LogfanConfig::default();
//! let config = PipelineConfig::from_core(&core_config);
//! ```

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use logfan_core::config::{DEFAULT_TIMEZONE_OFFSET_SECS, LogfanConfig, MAX_REQUEST_TIMEOUT_SECS};

use crate::error::LogPipelineError;

/// 레코드 1건의 기본 최대 크기 (1MB)
pub const DEFAULT_MAX_RECORD_SIZE: usize = 1024 * 1024;

/// 레벨/상태 값 기반 알림 트리거
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelTrigger {
    /// 값이 목록 중 하나와 정확히 일치하면 발동
    AnyOf(Vec<String>),
    /// 값이 목록 어디에도 없으면 발동
    NoneOf(Vec<String>),
}

impl LevelTrigger {
    /// 주어진 값에 대해 트리거가 발동하는지 확인합니다.
    pub fn fires(&self, value: &str) -> bool {
        match self {
            Self::AnyOf(set) => set.iter().any(|v| v == value),
            Self::NoneOf(set) => !set.iter().any(|v| v == value),
        }
    }

    /// 절대 발동하지 않는 트리거
    pub fn never() -> Self {
        Self::AnyOf(Vec::new())
    }
}

/// 변형별 알림 정책
///
/// 애플리케이션 로그는 레코드에 포함된 알림 지시자만 따르므로 여기에 없습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertPolicy {
    /// nginx 에러 로그의 `log_level` 트리거
    pub nginx_error: LevelTrigger,
    /// php-fpm 에러 로그의 `log_level` 트리거
    pub php_fpm_error: LevelTrigger,
    /// 액세스 로그의 `status` 트리거
    pub access_status: LevelTrigger,
    /// 에러/액세스 로그 알림에 at-channel 표시를 붙일지 여부
    pub at_channel: bool,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            nginx_error: LevelTrigger::AnyOf(vec!["error".to_owned()]),
            php_fpm_error: LevelTrigger::NoneOf(vec!["NOTICE".to_owned()]),
            access_status: LevelTrigger::never(),
            at_channel: false,
        }
    }
}

/// 로그 파이프라인 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// 오브젝트 스토리지 엔드포인트 (리전에서 유도된 값 포함)
    pub archive_endpoint: String,
    /// 아카이브 버킷
    pub archive_bucket: String,
    /// 아카이브 키 시간 파티션 오프셋 (초)
    pub timezone_offset_secs: i32,

    /// 검색 스토어 URL
    pub search_url: String,
    /// 액세스 로그 인덱스
    pub access_index: String,
    /// 액세스 로그 문서 타입
    pub access_index_type: String,
    /// 애플리케이션 로그 인덱스
    pub app_index: String,
    /// 애플리케이션 로그 문서 타입
    pub app_index_type: String,
    /// 애플리케이션 로그 datetime 오프셋 표기
    pub timestamp_offset: String,

    /// 웹훅 URL
    pub webhook_url: String,
    /// 기본 알림 채널
    pub channel: String,
    /// 발신자 표시 이름
    pub username: String,
    /// HTTP 요청 타임아웃 (초)
    pub request_timeout_secs: u64,

    /// 알림 정책
    pub alert: AlertPolicy,
    /// 레코드 1건 최대 크기 (바이트), 초과 시 드롭
    pub max_record_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_core(&LogfanConfig::default())
    }
}

impl PipelineConfig {
    /// core의 `LogfanConfig`에서 파이프라인 설정을 생성합니다.
    pub fn from_core(core: &LogfanConfig) -> Self {
        let alert = &core.alert;
        Self {
            archive_endpoint: core.archive.resolved_endpoint(),
            archive_bucket: core.archive.bucket.clone(),
            timezone_offset_secs: core.archive.timezone_offset_secs,
            search_url: core.search.url.trim_end_matches('/').to_owned(),
            access_index: core.search.access_index.clone(),
            access_index_type: core.search.access_index_type.clone(),
            app_index: core.search.app_index.clone(),
            app_index_type: core.search.app_index_type.clone(),
            timestamp_offset: core.search.timestamp_offset.clone(),
            webhook_url: core.notify.webhook_url.clone(),
            channel: core.notify.channel.clone(),
            username: core.notify.username.clone(),
            request_timeout_secs: core.notify.timeout_secs,
            alert: AlertPolicy {
                nginx_error: LevelTrigger::AnyOf(alert.nginx_error_levels.clone()),
                php_fpm_error: LevelTrigger::NoneOf(alert.php_fpm_ignore_levels.clone()),
                access_status: LevelTrigger::AnyOf(alert.access_statuses.clone()),
                at_channel: alert.error_at_channel,
            },
            max_record_size: DEFAULT_MAX_RECORD_SIZE,
        }
    }

    /// 아카이브 키에 사용하는 고정 오프셋을 반환합니다.
    pub fn archive_offset(&self) -> Result<FixedOffset, LogPipelineError> {
        FixedOffset::east_opt(self.timezone_offset_secs).ok_or_else(|| LogPipelineError::Config {
            field: "timezone_offset_secs".to_owned(),
            reason: format!("{} is out of range", self.timezone_offset_secs),
        })
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogPipelineError> {
        const MAX_RECORD_SIZE_LIMIT: usize = 16 * 1024 * 1024;

        for (field, value) in [
            ("archive_endpoint", &self.archive_endpoint),
            ("search_url", &self.search_url),
            ("webhook_url", &self.webhook_url),
        ] {
            if !(value.starts_with("http://") || value.starts_with("https://")) {
                return Err(config_err(field, "must start with http:// or https://"));
            }
        }

        for (field, value) in [
            ("archive_bucket", &self.archive_bucket),
            ("access_index", &self.access_index),
            ("access_index_type", &self.access_index_type),
            ("app_index", &self.app_index),
            ("app_index_type", &self.app_index_type),
            ("channel", &self.channel),
        ] {
            if value.is_empty() {
                return Err(config_err(field, "must not be empty"));
            }
        }

        self.archive_offset()?;

        if self.max_record_size == 0 || self.max_record_size > MAX_RECORD_SIZE_LIMIT {
            return Err(config_err(
                "max_record_size",
                format!("must be 1-{}", MAX_RECORD_SIZE_LIMIT),
            ));
        }

        if self.request_timeout_secs == 0 || self.request_timeout_secs > MAX_REQUEST_TIMEOUT_SECS {
            return Err(config_err(
                "request_timeout_secs",
                format!("must be 1-{}", MAX_REQUEST_TIMEOUT_SECS),
            ));
        }

        Ok(())
    }
}

fn config_err(field: &str, reason: impl Into<String>) -> LogPipelineError {
    LogPipelineError::Config {
        field: field.to_owned(),
        reason: reason.into(),
    }
}

/// 파이프라인 설정 빌더
#[derive(Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 오브젝트 스토리지 엔드포인트와 버킷을 설정합니다.
    pub fn archive(mut self, endpoint: impl Into<String>, bucket: impl Into<String>) -> Self {
        self.config.archive_endpoint = endpoint.into();
        self.config.archive_bucket = bucket.into();
        self
    }

    /// 아카이브 시간 파티션 오프셋(초)을 설정합니다.
    pub fn timezone_offset_secs(mut self, secs: i32) -> Self {
        self.config.timezone_offset_secs = secs;
        self
    }

    /// 검색 스토어 URL을 설정합니다.
    pub fn search_url(mut self, url: impl Into<String>) -> Self {
        self.config.search_url = url.into();
        self
    }

    /// 액세스 로그 인덱스/타입을 설정합니다.
    pub fn access_index(mut self, index: impl Into<String>, doc_type: impl Into<String>) -> Self {
        self.config.access_index = index.into();
        self.config.access_index_type = doc_type.into();
        self
    }

    /// 애플리케이션 로그 인덱스/타입을 설정합니다.
    pub fn app_index(mut self, index: impl Into<String>, doc_type: impl Into<String>) -> Self {
        self.config.app_index = index.into();
        self.config.app_index_type = doc_type.into();
        self
    }

    /// 웹훅 URL을 설정합니다.
    pub fn webhook_url(mut self, url: impl Into<String>) -> Self {
        self.config.webhook_url = url.into();
        self
    }

    /// 기본 채널과 발신자 이름을 설정합니다.
    pub fn sender(mut self, channel: impl Into<String>, username: impl Into<String>) -> Self {
        self.config.channel = channel.into();
        self.config.username = username.into();
        self
    }

    /// 알림 정책을 설정합니다.
    pub fn alert_policy(mut self, policy: AlertPolicy) -> Self {
        self.config.alert = policy;
        self
    }

    /// 레코드 최대 크기를 설정합니다.
    pub fn max_record_size(mut self, size: usize) -> Self {
        self.config.max_record_size = size;
        self
    }

    /// 설정을 검증하고 `PipelineConfig`를 생성합니다.
    pub fn build(self) -> Result<PipelineConfig, LogPipelineError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        PipelineConfig::default().validate().unwrap();
    }

    #[test]
    fn from_core_derives_policies() {
        let mut core = LogfanConfig::default();
        core.alert.access_statuses = vec!["500".to_owned()];
        core.alert.error_at_channel = true;
        core.archive.endpoint = "http://127.0.0.1:9000/".to_owned();
        core.search.url = "http://es:9200/".to_owned();

        let config = PipelineConfig::from_core(&core);
        assert_eq!(config.archive_endpoint, "http://127.0.0.1:9000");
        assert_eq!(config.search_url, "http://es:9200");
        assert!(config.alert.access_status.fires("500"));
        assert!(!config.alert.access_status.fires("200"));
        assert!(config.alert.at_channel);
        assert_eq!(config.max_record_size, DEFAULT_MAX_RECORD_SIZE);
        assert_eq!(config.timezone_offset_secs, DEFAULT_TIMEZONE_OFFSET_SECS);
    }

    #[test]
    fn default_policy_matches_error_log_rules() {
        let policy = AlertPolicy::default();
        assert!(policy.nginx_error.fires("error"));
        assert!(!policy.nginx_error.fires("warning"));
        assert!(!policy.nginx_error.fires("ERROR"));
        assert!(policy.php_fpm_error.fires("WARNING"));
        assert!(!policy.php_fpm_error.fires("NOTICE"));
        assert!(!policy.access_status.fires("500"));
    }

    #[test]
    fn archive_offset_is_utc_plus_nine_by_default() {
        let offset = PipelineConfig::default().archive_offset().unwrap();
        assert_eq!(offset.local_minus_utc(), 9 * 3600);
    }

    #[test]
    fn validate_rejects_out_of_range_offset() {
        let config = PipelineConfig {
            timezone_offset_secs: 90_000,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_record_size() {
        let result = PipelineConfigBuilder::new().max_record_size(0).build();
        assert!(result.is_err());
    }

    #[test]
    fn validate_rejects_non_http_webhook() {
        let result = PipelineConfigBuilder::new()
            .webhook_url("hooks.example.com")
            .build();
        let err = result.unwrap_err();
        assert!(err.to_string().contains("webhook_url"));
    }

    #[test]
    fn builder_creates_valid_config() {
        let config = PipelineConfigBuilder::new()
            .archive("http://127.0.0.1:9000", "test-bucket")
            .app_index("app", "doc")
            .sender("#ops", "bot")
            .build()
            .unwrap();
        assert_eq!(config.archive_bucket, "test-bucket");
        assert_eq!(config.app_index, "app");
        assert_eq!(config.app_index_type, "doc");
        assert_eq!(config.channel, "#ops");
    }
}
