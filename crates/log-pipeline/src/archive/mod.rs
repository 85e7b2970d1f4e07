//! 아카이브 -- 그룹을 인코딩, 압축하여 시간 파티션 키로 업로드합니다.
//!
//! # 키 형식
//! ```text
//! /<name>/<YYYY>/<MM>/<DD>/<HHMMSS>[-<group>]-<name>.gz
//! ```
//! 모든 시각 구성요소는 호출 시각(고정 오프셋, 기본 UTC+9)에서 나옵니다.
//! 같은 초, 같은 그룹화 키로 다시 업로드하면 같은 키를 덮어씁니다.

pub mod store;

pub use store::{ArchiveLocation, HttpObjectStore, ObjectStore};

use std::fmt;

use chrono::{DateTime, FixedOffset};
use tracing::debug;

use crate::compress;
use crate::encoder;
use crate::error::LogPipelineError;
use crate::group::Group;

/// 결정적인 시간 파티션 아카이브 키
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArchiveKey(String);

impl ArchiveKey {
    /// 논리 이름, 그룹화 키, 시각으로 키를 만듭니다.
    ///
    /// 그룹화 키가 `None`이거나 비어 있으면 키에서 생략됩니다.
    pub fn new(log_name: &str, group_key: Option<&str>, at: DateTime<FixedOffset>) -> Self {
        let group = match group_key {
            Some(g) if !g.is_empty() => format!("-{g}"),
            _ => String::new(),
        };
        Self(format!(
            "/{name}/{date}/{time}{group}-{name}.gz",
            name = log_name,
            date = at.format("%Y/%m/%d"),
            time = at.format("%H%M%S"),
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArchiveKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 아카이브 작성기
pub struct ArchiveWriter<S: ObjectStore> {
    store: S,
}

impl<S: ObjectStore> ArchiveWriter<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// 오브젝트 스토리지 클라이언트 참조
    pub fn store(&self) -> &S {
        &self.store
    }

    /// 이미 압축된 페이로드를 업로드합니다.
    pub async fn upload(
        &self,
        compressed: Vec<u8>,
        log_name: &str,
        group_key: Option<&str>,
        at: DateTime<FixedOffset>,
    ) -> Result<ArchiveLocation, LogPipelineError> {
        let key = ArchiveKey::new(log_name, group_key, at);
        debug!(key = %key, bytes = compressed.len(), "uploading archive");
        self.store.put_object(&key, compressed).await
    }

    /// 그룹을 인코딩, 압축한 뒤 업로드합니다.
    ///
    /// 압축은 블로킹 스레드에서 수행합니다. 압축 실패는 업로드 실패
    /// (`LogPipelineError::Upload`)로 전파됩니다.
    pub async fn archive_group(
        &self,
        group: &Group,
        at: DateTime<FixedOffset>,
    ) -> Result<ArchiveLocation, LogPipelineError> {
        let log_name = group.kind.log_name();
        let group_key = group.archive_group_key();

        let encoded = encoder::encode_group(group)?;
        let compressed = tokio::task::spawn_blocking(move || compress::gzip(&encoded))
            .await
            .map_err(|e| LogPipelineError::Compression(format!("spawn_blocking failed: {e}")))
            .and_then(|result| result)
            .map_err(|e| LogPipelineError::Upload {
                key: ArchiveKey::new(log_name, group_key, at).to_string(),
                reason: e.to_string(),
            })?;

        self.upload(compressed, log_name, group_key, at).await
    }
}
