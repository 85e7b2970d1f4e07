//! 레코드 모델 -- 원시 레코드와 분류된 변형
//!
//! [`RawRecord`]는 스트림에서 받은 불투명한 바이트 페이로드이고,
//! [`ClassifiedRecord`]는 알려진 스키마 중 정확히 하나로 분류된 레코드입니다.

pub mod access;
pub mod application;
pub mod error_log;
pub(crate) mod lenient;

pub use access::AccessLog;
pub use application::{AlertDirective, ApplicationLog, ExtraContext, SlackBody, SlackDirective};
pub use error_log::{NginxErrorLog, PhpFpmErrorLog};

use std::fmt;

use bytes::Bytes;
use serde::Serialize;

/// 스트림에서 받은 원시 레코드
#[derive(Debug, Clone)]
pub struct RawRecord {
    /// 레코드 페이로드
    pub data: Bytes,
    /// 스트림 파티션 키
    pub partition_key: Option<String>,
    /// 스트림 시퀀스 번호
    pub sequence_number: Option<String>,
}

impl RawRecord {
    /// 페이로드만으로 레코드를 생성합니다.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            partition_key: None,
            sequence_number: None,
        }
    }

    /// 스트림 메타데이터를 설정합니다.
    pub fn with_stream_meta(
        mut self,
        partition_key: impl Into<String>,
        sequence_number: impl Into<String>,
    ) -> Self {
        self.partition_key = Some(partition_key.into());
        self.sequence_number = Some(sequence_number.into());
        self
    }

    /// 페이로드 크기 (바이트)
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// 페이로드가 비어 있는지 여부
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// 레코드 변형 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordKind {
    /// nginx 액세스 로그
    Access,
    /// 애플리케이션 로그
    Application,
    /// nginx 에러 로그
    NginxError,
    /// php-fpm 에러 로그
    PhpFpmError,
}

impl RecordKind {
    /// 호출 내 처리 순서
    pub const PROCESSING_ORDER: [RecordKind; 4] = [
        RecordKind::Access,
        RecordKind::Application,
        RecordKind::NginxError,
        RecordKind::PhpFpmError,
    ];

    /// 아카이브 키와 로그 필드에 쓰는 논리 이름
    pub fn log_name(&self) -> &'static str {
        match self {
            Self::Access => "nginx_access",
            Self::Application => "application",
            Self::NginxError => "nginx_error",
            Self::PhpFpmError => "php-fpm-error",
        }
    }

    /// 호스트별로 그룹화되는 변형인지 여부
    pub fn is_grouped_by_host(&self) -> bool {
        matches!(self, Self::Access)
    }

    /// 검색 스토어에 색인되는 변형인지 여부
    pub fn is_indexed(&self) -> bool {
        matches!(self, Self::Access | Self::Application)
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.log_name())
    }
}

impl Serialize for RecordKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.log_name())
    }
}

/// 분류된 레코드
///
/// 직렬화 시 태그 없이 변형의 필드만 선언 순서대로 내보냅니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ClassifiedRecord {
    Access(AccessLog),
    Application(ApplicationLog),
    NginxError(NginxErrorLog),
    PhpFpmError(PhpFpmErrorLog),
}

impl ClassifiedRecord {
    /// 변형 종류를 반환합니다.
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Access(_) => RecordKind::Access,
            Self::Application(_) => RecordKind::Application,
            Self::NginxError(_) => RecordKind::NginxError,
            Self::PhpFpmError(_) => RecordKind::PhpFpmError,
        }
    }

    /// 그룹화 키 (액세스 로그는 호스트, 나머지는 빈 문자열)
    pub fn group_key(&self) -> &str {
        match self {
            Self::Access(log) => &log.host,
            _ => "",
        }
    }
}
