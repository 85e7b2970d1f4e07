//! 검색 색인 -- 그룹의 레코드를 문서 단위로 검색 스토어에 씁니다.
//!
//! 애플리케이션 로그는 첫 문서를 쓰기 전에 인덱스 존재를 확인하고, 없으면
//! `datetime`을 date 타입으로 고정한 매핑으로 생성합니다. 검색 스토어의 동적
//! 타입 추론은 수집된 시각 표현을 받아들이지 못하기 때문입니다.
//! 액세스 로그는 동적 매핑으로 바로 씁니다.
//!
//! # 인덱스 상태
//! ```text
//! Unknown --(존재 확인)--> Exists
//!    |
//!    +----(존재 확인)--> Missing --(매핑과 함께 생성)--> Exists
//! ```
//! `Exists`는 호출이 끝날 때까지 유지되므로 존재 확인은 호출당 최대 한 번입니다.

pub mod client;

pub use client::{HttpSearchClient, SearchClient};

use serde_json::{Value, json};
use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::error::LogPipelineError;
use crate::group::Group;
use crate::record::{ClassifiedRecord, RecordKind};

/// 애플리케이션 로그 `datetime` 필드의 date 형식
pub const APP_DATETIME_FORMAT: &str = "yyyy-MM-dd HH:mm:ssZ";

/// 애플리케이션 인덱스 생성에 쓰는 매핑 본문
pub fn app_mapping(doc_type: &str) -> Value {
    json!({
        "mappings": {
            doc_type: {
                "properties": {
                    "datetime": {
                        "type": "date",
                        "format": APP_DATETIME_FORMAT
                    }
                }
            }
        }
    })
}

/// 인덱스 생명주기 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    /// 아직 확인하지 않음
    Unknown,
    /// 존재하지 않음 (생성 필요)
    Missing,
    /// 존재함 (호출 끝까지 유지)
    Exists,
}

/// 색인 대상 (인덱스, 타입, 시각 오프셋)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexTargets {
    pub access_index: String,
    pub access_type: String,
    pub app_index: String,
    pub app_type: String,
    /// 애플리케이션 로그 datetime에 붙이는 오프셋 (`+09:00`)
    pub timestamp_offset: String,
}

impl IndexTargets {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            access_index: config.access_index.clone(),
            access_type: config.access_index_type.clone(),
            app_index: config.app_index.clone(),
            app_type: config.app_index_type.clone(),
            timestamp_offset: config.timestamp_offset.clone(),
        }
    }
}

/// 호출 하나 동안 유지되는 검색 색인기
pub struct SearchIndexer<'a, C: SearchClient> {
    client: &'a C,
    targets: &'a IndexTargets,
    app_index_state: IndexState,
}

impl<'a, C: SearchClient> SearchIndexer<'a, C> {
    pub fn new(client: &'a C, targets: &'a IndexTargets) -> Self {
        Self {
            client,
            targets,
            app_index_state: IndexState::Unknown,
        }
    }

    /// 애플리케이션 인덱스의 현재 상태
    pub fn app_index_state(&self) -> IndexState {
        self.app_index_state
    }

    /// 애플리케이션 인덱스가 존재하도록 보장합니다.
    ///
    /// `Exists` 상태면 아무 요청도 보내지 않습니다.
    pub async fn ensure_app_index(&mut self) -> Result<(), LogPipelineError> {
        if self.app_index_state == IndexState::Unknown {
            let exists = self.client.index_exists(&self.targets.app_index).await?;
            self.app_index_state = if exists {
                IndexState::Exists
            } else {
                IndexState::Missing
            };
            debug!(
                index = %self.targets.app_index,
                exists,
                "checked application index"
            );
        }

        if self.app_index_state == IndexState::Missing {
            let mapping = app_mapping(&self.targets.app_type);
            self.client
                .create_index(&self.targets.app_index, &mapping)
                .await?;
            info!(index = %self.targets.app_index, "created application index with mapping");
            self.app_index_state = IndexState::Exists;
        }

        Ok(())
    }

    /// 그룹의 레코드를 순서대로 색인합니다.
    ///
    /// 한 레코드라도 실패하면 그룹의 나머지 레코드는 쓰지 않습니다.
    /// 색인 대상이 아닌 변형은 0을 반환합니다.
    pub async fn index_group(&mut self, group: &Group) -> Result<usize, LogPipelineError> {
        let targets = self.targets;
        let (index, doc_type) = match group.kind {
            RecordKind::Access => (&targets.access_index, &targets.access_type),
            RecordKind::Application => {
                self.ensure_app_index().await?;
                (&targets.app_index, &targets.app_type)
            }
            RecordKind::NginxError | RecordKind::PhpFpmError => return Ok(0),
        };

        let mut written = 0;
        for record in &group.records {
            let document = self.document_for(record)?;
            self.client
                .index_document(index, doc_type, &document)
                .await?;
            written += 1;
        }
        debug!(index = %index, documents = written, "indexed group");
        Ok(written)
    }

    /// 레코드를 색인 문서로 변환합니다.
    pub fn document_for(&self, record: &ClassifiedRecord) -> Result<Value, LogPipelineError> {
        let result = match record {
            ClassifiedRecord::Application(log) => {
                let mut log = log.clone();
                log.datetime = with_offset(&log.datetime, &self.targets.timestamp_offset);
                serde_json::to_value(&log)
            }
            other => serde_json::to_value(other),
        };
        result.map_err(|e| LogPipelineError::Encode(e.to_string()))
    }
}

/// 시각 문자열에 오프셋 표기를 붙입니다. 비어 있거나 이미 붙어 있으면 그대로 둡니다.
fn with_offset(datetime: &str, offset: &str) -> String {
    if datetime.is_empty() || datetime.ends_with(offset) {
        datetime.to_owned()
    } else {
        format!("{datetime}{offset}")
    }
}
