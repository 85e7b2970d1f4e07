//! 파이프라인 오케스트레이션 -- 호출 하나의 분류/그룹화/알림/아카이브/색인 흐름
//!
//! [`LogPipeline`]은 스트림 배치 하나를 받아 동기적으로 처리합니다.
//! 싱크(오브젝트 스토리지, 검색 스토어, 웹훅)는 trait으로 주입되므로
//! 운영에서는 HTTP 구현을, 테스트에서는 Mock 구현을 사용합니다.
//!
//! # 처리 순서
//! ```text
//! StreamBatch -> Classifier -> GroupedBatch
//!   for variant in [nginx_access, application, nginx_error, php-fpm-error]:
//!     1. AlertDispatcher  (레코드 순서대로, 첫 실패에서 중단)
//!     2. ArchiveWriter    (그룹마다 encode -> gzip -> upload)
//!     3. SearchIndexer    (색인 대상 변형만, 그룹마다)
//! ```
//!
//! 어느 스테이지든 실패하면 변형/스테이지 컨텍스트를 붙여 호출 전체를 실패로
//! 반환합니다. 이미 끝난 변형의 부수 효과는 되돌리지 않으며, 복구는 외부
//! 트리거의 재전달에 맡깁니다.

use std::time::{Duration, Instant};

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use tracing::{Instrument, error, info, info_span};
use uuid::Uuid;

use logfan_core::metrics as m;

use crate::alert::{AlertDispatcher, Notifier, WebhookNotifier};
use crate::archive::{ArchiveLocation, ArchiveWriter, HttpObjectStore, ObjectStore};
use crate::classifier::Classifier;
use crate::config::PipelineConfig;
use crate::error::{LogPipelineError, Stage};
use crate::event::StreamBatch;
use crate::group::{GroupedBatch, VariantBatch};
use crate::record::RecordKind;
use crate::search::{HttpSearchClient, IndexTargets, SearchClient, SearchIndexer};

/// 변형 하나의 처리 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantReport {
    /// 변형
    pub kind: RecordKind,
    /// 전송된 알림 수
    pub alerts_sent: usize,
    /// 업로드된 아카이브 (그룹 순서)
    pub archives: Vec<ArchiveLocation>,
    /// 색인된 문서 수
    pub documents_indexed: usize,
}

/// 호출 하나의 처리 결과
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InvocationReport {
    /// 봉투에 담겨 온 레코드 수 (디코딩 단계에서 버려진 레코드 포함)
    pub records_received: usize,
    /// 봉투 디코딩 단계에서 버려진 레코드 수 (`records_dropped`에 포함)
    pub records_undecodable: usize,
    /// 분류된 레코드 수
    pub records_classified: usize,
    /// 드롭된 레코드 수 (디코딩 실패 + 분류 실패)
    pub records_dropped: usize,
    /// 처리 순서대로 정렬된 변형별 결과
    pub variants: Vec<VariantReport>,
}

impl InvocationReport {
    /// 특정 변형의 결과
    pub fn variant(&self, kind: RecordKind) -> Option<&VariantReport> {
        self.variants.iter().find(|v| v.kind == kind)
    }

    pub fn alerts_sent(&self) -> usize {
        self.variants.iter().map(|v| v.alerts_sent).sum()
    }

    pub fn archives_uploaded(&self) -> usize {
        self.variants.iter().map(|v| v.archives.len()).sum()
    }

    pub fn documents_indexed(&self) -> usize {
        self.variants.iter().map(|v| v.documents_indexed).sum()
    }
}

/// HTTP 싱크로 연결된 운영용 파이프라인
pub type HttpLogPipeline = LogPipeline<HttpObjectStore, HttpSearchClient, WebhookNotifier>;

/// 로그 팬아웃 파이프라인
///
/// # 사용 예시
/// ```ignore
/// use logfan_log_pipeline::{HttpLogPipeline, PipelineConfig, StreamBatch};
///
/// let pipeline = HttpLogPipeline::connect(PipelineConfig::default())?;
/// let batch = StreamBatch::from_event_json(&event_bytes)?;
/// let report = pipeline.process(&batch).await?;
/// ```
pub struct LogPipeline<S: ObjectStore, C: SearchClient, N: Notifier> {
    /// 파이프라인 설정
    config: PipelineConfig,
    /// 레코드 분류기
    classifier: Classifier,
    /// 아카이브 작성기
    archive: ArchiveWriter<S>,
    /// 검색 스토어 클라이언트
    search: C,
    /// 색인 대상
    targets: IndexTargets,
    /// 알림 디스패처
    alerts: AlertDispatcher<N>,
    /// 아카이브 키 시각 오프셋
    offset: FixedOffset,
}

impl HttpLogPipeline {
    /// 설정의 엔드포인트로 HTTP 싱크를 만들어 파이프라인을 구성합니다.
    ///
    /// 세 싱크는 요청 타임아웃이 설정된 `reqwest::Client` 하나를 공유합니다.
    pub fn connect(config: PipelineConfig) -> Result<Self, LogPipelineError> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| LogPipelineError::Config {
                field: "http_client".to_owned(),
                reason: e.to_string(),
            })?;

        let store = HttpObjectStore::new(
            client.clone(),
            config.archive_endpoint.clone(),
            config.archive_bucket.clone(),
        );
        let search = HttpSearchClient::new(client.clone(), config.search_url.clone());
        let notifier = WebhookNotifier::new(client, config.webhook_url.clone());

        LogPipelineBuilder::new()
            .config(config)
            .object_store(store)
            .search_client(search)
            .notifier(notifier)
            .build()
    }
}

impl<S: ObjectStore, C: SearchClient, N: Notifier> LogPipeline<S, C, N> {
    /// 파이프라인 설정
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn object_store(&self) -> &S {
        self.archive.store()
    }

    pub fn search_client(&self) -> &C {
        &self.search
    }

    pub fn notifier(&self) -> &N {
        self.alerts.notifier()
    }

    /// 현재 시각(설정된 오프셋 기준)으로 배치를 처리합니다.
    pub async fn process(&self, batch: &StreamBatch) -> Result<InvocationReport, LogPipelineError> {
        let now = Utc::now().with_timezone(&self.offset);
        self.process_at(batch, now).await
    }

    /// 지정한 호출 시각으로 배치를 처리합니다.
    ///
    /// 시각은 호출당 한 번만 정해지며 모든 아카이브 키가 같은 시각을 씁니다.
    pub async fn process_at(
        &self,
        batch: &StreamBatch,
        at: DateTime<FixedOffset>,
    ) -> Result<InvocationReport, LogPipelineError> {
        let invocation_id = Uuid::new_v4();
        let span = info_span!("invocation", %invocation_id, records = batch.len());
        let started = Instant::now();

        let result = self.run(batch, at).instrument(span).await;

        let outcome = if result.is_ok() { "success" } else { "failure" };
        metrics::histogram!(m::PIPELINE_INVOCATION_DURATION_SECONDS, m::LABEL_RESULT => outcome)
            .record(started.elapsed().as_secs_f64());

        if let Err(err) = &result {
            let (variant, stage) = err
                .stage_context()
                .map_or(("none", "none"), |(v, s)| (v, s.as_str()));
            metrics::counter!(
                m::PIPELINE_INVOCATION_FAILURES_TOTAL,
                m::LABEL_VARIANT => variant,
                m::LABEL_STAGE => stage
            )
            .increment(1);
            error!(%invocation_id, error = %err, "invocation failed");
        }
        result
    }

    async fn run(
        &self,
        batch: &StreamBatch,
        at: DateTime<FixedOffset>,
    ) -> Result<InvocationReport, LogPipelineError> {
        let records_undecodable = batch.skipped;
        let records_received = batch.len() + records_undecodable;
        metrics::counter!(m::PIPELINE_RECORDS_RECEIVED_TOTAL).increment(records_received as u64);

        let classified = self.classifier.classify_batch(&batch.records);
        let records_dropped = classified.dropped + records_undecodable;
        let records_classified = classified.records.len();
        if records_dropped > 0 {
            metrics::counter!(m::PIPELINE_RECORDS_DROPPED_TOTAL).increment(records_dropped as u64);
        }

        let grouped = GroupedBatch::from_records(classified.records);
        info!(
            received = records_received,
            undecodable = records_undecodable,
            classified = records_classified,
            dropped = records_dropped,
            groups = grouped.group_count(),
            "classified batch"
        );

        let mut indexer = SearchIndexer::new(&self.search, &self.targets);
        let mut variants = Vec::with_capacity(grouped.variants.len());
        for variant in &grouped.variants {
            variants.push(self.process_variant(variant, &mut indexer, at).await?);
        }

        let report = InvocationReport {
            records_received,
            records_undecodable,
            records_classified,
            records_dropped,
            variants,
        };
        info!(
            alerts = report.alerts_sent(),
            archives = report.archives_uploaded(),
            documents = report.documents_indexed(),
            "invocation complete"
        );
        Ok(report)
    }

    async fn process_variant(
        &self,
        variant: &VariantBatch,
        indexer: &mut SearchIndexer<'_, C>,
        at: DateTime<FixedOffset>,
    ) -> Result<VariantReport, LogPipelineError> {
        let name = variant.kind.log_name();

        // 1. 알림: 실패하면 이 변형의 아카이브/색인은 시도하지 않음
        let alerts_sent = self
            .alerts
            .dispatch_all(&variant.records)
            .await
            .map_err(|e| e.at(name, Stage::Alert))?;
        if alerts_sent > 0 {
            metrics::counter!(m::PIPELINE_ALERTS_SENT_TOTAL, m::LABEL_VARIANT => name)
                .increment(alerts_sent as u64);
        }

        // 2. 아카이브
        let mut archives = Vec::with_capacity(variant.groups.len());
        for group in &variant.groups {
            let location = self
                .archive
                .archive_group(group, at)
                .await
                .map_err(|e| e.at(name, Stage::Archive))?;
            metrics::counter!(m::PIPELINE_ARCHIVES_UPLOADED_TOTAL, m::LABEL_VARIANT => name)
                .increment(1);
            info!(variant = name, key = %location.key, records = group.len(), "archived group");
            archives.push(location);
        }

        // 3. 색인
        let mut documents_indexed = 0;
        if variant.kind.is_indexed() {
            for group in &variant.groups {
                documents_indexed += indexer
                    .index_group(group)
                    .await
                    .map_err(|e| e.at(name, Stage::Index))?;
            }
            metrics::counter!(m::PIPELINE_DOCUMENTS_INDEXED_TOTAL, m::LABEL_VARIANT => name)
                .increment(documents_indexed as u64);
        }

        Ok(VariantReport {
            kind: variant.kind,
            alerts_sent,
            archives,
            documents_indexed,
        })
    }
}

/// 로그 파이프라인 빌더
///
/// 세 싱크를 모두 지정해야 빌드할 수 있습니다.
pub struct LogPipelineBuilder<S, C, N> {
    config: PipelineConfig,
    classifier: Option<Classifier>,
    store: Option<S>,
    search: Option<C>,
    notifier: Option<N>,
}

impl<S: ObjectStore, C: SearchClient, N: Notifier> LogPipelineBuilder<S, C, N> {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            classifier: None,
            store: None,
            search: None,
            notifier: None,
        }
    }

    /// 파이프라인 설정을 지정합니다.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// 기본 분류기 대신 사용할 분류기를 지정합니다.
    pub fn classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn object_store(mut self, store: S) -> Self {
        self.store = Some(store);
        self
    }

    pub fn search_client(mut self, search: C) -> Self {
        self.search = Some(search);
        self
    }

    pub fn notifier(mut self, notifier: N) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// 파이프라인을 빌드합니다.
    pub fn build(self) -> Result<LogPipeline<S, C, N>, LogPipelineError> {
        self.config.validate()?;
        let offset = self.config.archive_offset()?;

        let store = self.store.ok_or_else(|| missing("object_store"))?;
        let search = self.search.ok_or_else(|| missing("search_client"))?;
        let notifier = self.notifier.ok_or_else(|| missing("notifier"))?;

        let classifier = self.classifier.unwrap_or_else(|| {
            Classifier::with_defaults().with_max_record_size(self.config.max_record_size)
        });

        Ok(LogPipeline {
            classifier,
            archive: ArchiveWriter::new(store),
            search,
            targets: IndexTargets::from_config(&self.config),
            alerts: AlertDispatcher::from_config(notifier, &self.config),
            offset,
            config: self.config,
        })
    }
}

impl<S: ObjectStore, C: SearchClient, N: Notifier> Default for LogPipelineBuilder<S, C, N> {
    fn default() -> Self {
        Self::new()
    }
}

fn missing(field: &str) -> LogPipelineError {
    LogPipelineError::Config {
        field: field.to_owned(),
        reason: "not set".to_owned(),
    }
}
