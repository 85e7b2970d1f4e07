//! 로그 파이프라인 에러 타입
//!
//! [`LogPipelineError`]는 로그 파이프라인 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<LogPipelineError> for LogfanError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.
//!
//! 분류 실패는 에러가 아닙니다. 분류기는 알 수 없는 레코드를 조용히 드롭합니다.

use std::fmt;

use logfan_core::error::{LogfanError, PipelineError};

/// 변형별 처리 스테이지
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// 웹훅 알림
    Alert,
    /// 인코딩 + 압축 + 오브젝트 스토리지 업로드
    Archive,
    /// 검색 스토어 색인
    Index,
}

impl Stage {
    /// 스테이지 이름 (메트릭 레이블, 로그 필드에 사용)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alert => "alert",
            Self::Archive => "archive",
            Self::Index => "index",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 로그 파이프라인 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum LogPipelineError {
    /// gzip 압축 실패
    #[error("compression error: {0}")]
    Compression(String),

    /// 오브젝트 스토리지 업로드 실패 (압축 실패 전파 포함)
    #[error("upload error: {key}: {reason}")]
    Upload {
        /// 업로드 대상 키
        key: String,
        /// 실패 사유
        reason: String,
    },

    /// 검색 스토어 색인 실패
    #[error("index error: {index}: {reason}")]
    Index {
        /// 대상 인덱스
        index: String,
        /// 실패 사유
        reason: String,
    },

    /// 웹훅 알림 실패
    #[error("notification error: {0}")]
    Notification(String),

    /// 레코드 직렬화 실패
    #[error("encode error: {0}")]
    Encode(String),

    /// 스트림 배치 디코딩 실패
    #[error("decode error: {0}")]
    Decode(String),

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 변형/스테이지 컨텍스트가 붙은 싱크 에러
    #[error("{variant} {stage} failed: {source}")]
    Stage {
        /// 레코드 변형의 논리 이름
        variant: &'static str,
        /// 실패한 스테이지
        stage: Stage,
        /// 원인 에러
        #[source]
        source: Box<LogPipelineError>,
    },
}

impl LogPipelineError {
    /// 변형/스테이지 컨텍스트로 에러를 감쌉니다.
    pub fn at(self, variant: &'static str, stage: Stage) -> Self {
        Self::Stage {
            variant,
            stage,
            source: Box::new(self),
        }
    }

    /// 컨텍스트가 있으면 (변형, 스테이지)를 반환합니다.
    pub fn stage_context(&self) -> Option<(&'static str, Stage)> {
        match self {
            Self::Stage { variant, stage, .. } => Some((variant, *stage)),
            _ => None,
        }
    }
}

impl From<LogPipelineError> for LogfanError {
    fn from(err: LogPipelineError) -> Self {
        match err {
            LogPipelineError::Stage {
                variant,
                stage,
                source,
            } => LogfanError::Pipeline(PipelineError::StageFailed {
                variant: variant.to_owned(),
                stage: stage.as_str().to_owned(),
                reason: source.to_string(),
            }),
            LogPipelineError::Decode(reason) => {
                LogfanError::Pipeline(PipelineError::Decode(reason))
            }
            LogPipelineError::Config { .. } => {
                LogfanError::Pipeline(PipelineError::InitFailed(err.to_string()))
            }
            other => LogfanError::Pipeline(PipelineError::Sink(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_error_display_carries_context() {
        let err = LogPipelineError::Upload {
            key: "/application/2024/01/15/120000-application.gz".to_owned(),
            reason: "503 Service Unavailable".to_owned(),
        }
        .at("application", Stage::Archive);
        let msg = err.to_string();
        assert!(msg.starts_with("application archive failed"));
        assert!(msg.contains("503"));
        assert_eq!(
            err.stage_context(),
            Some(("application", Stage::Archive))
        );
    }

    #[test]
    fn stage_error_converts_to_stage_failed() {
        let err = LogPipelineError::Notification("connection refused".to_owned())
            .at("nginx_error", Stage::Alert);
        let logfan_err: LogfanError = err.into();
        match logfan_err {
            LogfanError::Pipeline(PipelineError::StageFailed {
                variant,
                stage,
                reason,
            }) => {
                assert_eq!(variant, "nginx_error");
                assert_eq!(stage, "alert");
                assert!(reason.contains("connection refused"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn config_error_converts_to_init_failed() {
        let err = LogPipelineError::Config {
            field: "max_record_size".to_owned(),
            reason: "must be greater than 0".to_owned(),
        };
        let logfan_err: LogfanError = err.into();
        assert!(matches!(
            logfan_err,
            LogfanError::Pipeline(PipelineError::InitFailed(_))
        ));
    }

    #[test]
    fn bare_sink_error_converts_to_sink() {
        let err: LogfanError = LogPipelineError::Compression("broken pipe".to_owned()).into();
        assert!(matches!(err, LogfanError::Pipeline(PipelineError::Sink(_))));
    }

    #[test]
    fn stage_names() {
        assert_eq!(Stage::Alert.to_string(), "alert");
        assert_eq!(Stage::Archive.as_str(), "archive");
        assert_eq!(Stage::Index.as_str(), "index");
    }
}
