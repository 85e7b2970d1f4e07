#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`event`]: 스트림 트리거 봉투 / 줄 단위 입력 디코딩
//! - [`record`]: 원시 레코드와 분류된 변형 (액세스, 애플리케이션, nginx/php-fpm 에러)
//! - [`classifier`]: 마커 기반 스키마 판별과 관대한 디코딩 (first match wins)
//! - [`group`]: 변형별, 호스트별 그룹화
//! - [`encoder`]: 줄 단위 JSON(NDJSON) 인코딩
//! - [`compress`]: gzip 압축
//! - [`archive`]: 시간 파티션 키 계산과 오브젝트 스토리지 업로드
//! - [`search`]: 검색 스토어 인덱스 관리와 문서 색인
//! - [`alert`]: 알림 조건 평가와 웹훅 전송
//! - [`pipeline`]: 호출 하나의 전체 흐름 오케스트레이션
//! - [`config`]: 파이프라인 설정 (core 설정 확장)
//! - [`error`]: 도메인 에러 타입

pub mod alert;
pub mod archive;
pub mod classifier;
pub mod compress;
pub mod config;
pub mod encoder;
pub mod error;
pub mod event;
pub mod group;
pub mod pipeline;
pub mod record;
pub mod search;

// --- 주요 타입 re-export ---

// 파이프라인
pub use pipeline::{
    HttpLogPipeline, InvocationReport, LogPipeline, LogPipelineBuilder, VariantReport,
};

// 설정
pub use config::{AlertPolicy, LevelTrigger, PipelineConfig, PipelineConfigBuilder};

// 에러
pub use error::{LogPipelineError, Stage};

// 입력
pub use event::StreamBatch;
pub use record::{ClassifiedRecord, RawRecord, RecordKind};

// 분류 / 그룹화
pub use classifier::{Classifier, RecordDecoder};
pub use group::{Group, GroupedBatch};

// 싱크
pub use alert::{AlertDispatcher, Notifier, WebhookMessage, WebhookNotifier};
pub use archive::{ArchiveKey, ArchiveLocation, ArchiveWriter, HttpObjectStore, ObjectStore};
pub use search::{HttpSearchClient, IndexTargets, SearchClient, SearchIndexer};
