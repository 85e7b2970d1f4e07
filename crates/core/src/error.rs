//! 에러 타입 -- 도메인별 에러 정의

/// Logfan 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum LogfanError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 파이프라인 처리 에러
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 파이프라인 처리 에러
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 특정 레코드 변형의 스테이지 실패 (알림, 아카이브, 색인)
    #[error("{variant} {stage} failed: {reason}")]
    StageFailed {
        /// 레코드 변형의 논리 이름 (nginx_access, application 등)
        variant: String,
        /// 실패한 스테이지
        stage: String,
        /// 실패 사유
        reason: String,
    },

    /// 스테이지 컨텍스트 없이 발생한 싱크 에러
    #[error("sink error: {0}")]
    Sink(String),

    /// 입력 배치 디코딩 실패
    #[error("batch decode failed: {0}")]
    Decode(String),

    /// 파이프라인 초기화 실패
    #[error("pipeline init failed: {0}")]
    InitFailed(String),
}
