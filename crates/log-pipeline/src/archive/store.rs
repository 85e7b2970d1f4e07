//! 오브젝트 스토리지 추상화
//!
//! [`ObjectStore`] trait은 스토리지 업로드를 추상화하여, 운영 코드는
//! [`HttpObjectStore`]를, 테스트는 `MockObjectStore`를 사용하게 합니다.
//!
//! [`HttpObjectStore`]는 path-style `PUT <endpoint>/<bucket><key>` 요청을 보냅니다.
//! 키의 각 세그먼트는 퍼센트 인코딩되므로 호스트 값에 `#`, `?`, `%`가 있어도
//! 스토리지 키는 [`ArchiveKey`]와 같습니다.
//! 요청 서명은 하지 않으므로, 서명이 필요한 환경에서는 SDK 기반 구현으로 교체합니다.

use std::future::Future;

use serde::Serialize;

use crate::archive::ArchiveKey;
use crate::error::LogPipelineError;

/// 업로드된 오브젝트의 위치
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveLocation {
    /// 버킷
    pub bucket: String,
    /// 오브젝트 키
    pub key: String,
    /// 오브젝트 URL
    pub url: String,
}

/// 오브젝트 스토리지 클라이언트
///
/// # Implementations
///
/// - [`HttpObjectStore`]: reqwest 기반 운영 구현
/// - `MockObjectStore`: 업로드를 메모리에 기록하는 테스트 구현 (테스트 전용)
pub trait ObjectStore: Send + Sync + 'static {
    /// 압축된 페이로드를 키 위치에 업로드합니다. 같은 키는 덮어씁니다.
    ///
    /// # Errors
    ///
    /// 전송 실패나 2xx가 아닌 응답은 `LogPipelineError::Upload`입니다.
    fn put_object(
        &self,
        key: &ArchiveKey,
        body: Vec<u8>,
    ) -> impl Future<Output = Result<ArchiveLocation, LogPipelineError>> + Send;
}

/// HTTP(path-style) 오브젝트 스토리지 클라이언트
#[derive(Debug, Clone)]
pub struct HttpObjectStore {
    client: reqwest::Client,
    endpoint: String,
    bucket: String,
}

impl HttpObjectStore {
    /// 새 클라이언트를 생성합니다.
    pub fn new(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_owned(),
            bucket: bucket.into(),
        }
    }

    /// 키에 해당하는 오브젝트 URL
    ///
    /// # Errors
    ///
    /// 엔드포인트가 경로를 가질 수 없는 URL이면 `LogPipelineError::Upload`입니다.
    pub fn object_url(&self, key: &ArchiveKey) -> Result<reqwest::Url, LogPipelineError> {
        let upload_err = |reason: String| LogPipelineError::Upload {
            key: key.as_str().to_owned(),
            reason,
        };

        let mut url = reqwest::Url::parse(&self.endpoint)
            .map_err(|e| upload_err(format!("invalid endpoint {}: {e}", self.endpoint)))?;
        url.path_segments_mut()
            .map_err(|()| upload_err(format!("endpoint {} cannot carry a path", self.endpoint)))?
            .pop_if_empty()
            .push(&self.bucket)
            .extend(key.as_str().split('/').skip(1));
        Ok(url)
    }
}

impl ObjectStore for HttpObjectStore {
    async fn put_object(
        &self,
        key: &ArchiveKey,
        body: Vec<u8>,
    ) -> Result<ArchiveLocation, LogPipelineError> {
        let url = self.object_url(key)?;
        let upload_err = |reason: String| LogPipelineError::Upload {
            key: key.as_str().to_owned(),
            reason,
        };

        let response = self
            .client
            .put(url.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/gzip")
            .body(body)
            .send()
            .await
            .map_err(|e| upload_err(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(upload_err(format!("{status}: {text}")));
        }

        Ok(ArchiveLocation {
            bucket: self.bucket.clone(),
            key: key.as_str().to_owned(),
            url: url.to_string(),
        })
    }
}

/// 테스트용 Mock 오브젝트 스토리지
///
/// 업로드된 (키, 페이로드)를 순서대로 기록합니다.
#[cfg(test)]
#[derive(Default)]
pub struct MockObjectStore {
    /// 업로드 기록
    pub uploads: std::sync::Mutex<Vec<(String, Vec<u8>)>>,
    /// 업로드 실패를 시뮬레이션할지 여부
    pub fail_uploads: bool,
}

#[cfg(test)]
impl MockObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 업로드 시 실패하도록 설정합니다.
    pub fn with_failing_uploads(mut self) -> Self {
        self.fail_uploads = true;
        self
    }

    /// 업로드된 키 목록
    pub fn keys(&self) -> Vec<String> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .map(|(k, _)| k.clone())
            .collect()
    }
}

#[cfg(test)]
impl ObjectStore for MockObjectStore {
    async fn put_object(
        &self,
        key: &ArchiveKey,
        body: Vec<u8>,
    ) -> Result<ArchiveLocation, LogPipelineError> {
        if self.fail_uploads {
            return Err(LogPipelineError::Upload {
                key: key.as_str().to_owned(),
                reason: "mock failure".to_owned(),
            });
        }
        self.uploads
            .lock()
            .unwrap()
            .push((key.as_str().to_owned(), body));
        Ok(ArchiveLocation {
            bucket: "mock".to_owned(),
            key: key.as_str().to_owned(),
            url: format!("mock://mock{}", key.as_str()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn key() -> ArchiveKey {
        let jst = FixedOffset::east_opt(9 * 3600).unwrap();
        let at = jst.with_ymd_and_hms(2024, 1, 15, 12, 34, 56).unwrap();
        ArchiveKey::new("application", None, at)
    }

    #[test]
    fn object_url_is_path_style() {
        let store = HttpObjectStore::new(reqwest::Client::new(), "http://s3.local/", "logs");
        assert_eq!(
            store.object_url(&key()).unwrap().as_str(),
            "http://s3.local/logs/application/2024/01/15/123456-application.gz"
        );
    }

    #[test]
    fn object_url_keeps_endpoint_path_prefix() {
        let store = HttpObjectStore::new(reqwest::Client::new(), "http://gw.local/s3/", "logs");
        assert_eq!(
            store.object_url(&key()).unwrap().as_str(),
            "http://gw.local/s3/logs/application/2024/01/15/123456-application.gz"
        );
    }

    #[test]
    fn object_url_percent_encodes_group_key() {
        let store = HttpObjectStore::new(reqwest::Client::new(), "http://s3.local", "logs");
        let at = FixedOffset::east_opt(9 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 15, 12, 34, 56)
            .unwrap();

        let cases = [
            ("a#b", "123456-a%23b-nginx_access.gz"),
            ("a?b", "123456-a%3Fb-nginx_access.gz"),
            ("a%b", "123456-a%25b-nginx_access.gz"),
            ("a/b", "123456-a%2Fb-nginx_access.gz"),
        ];
        for (host, file) in cases {
            let key = ArchiveKey::new("nginx_access", Some(host), at);
            let url = store.object_url(&key).unwrap();
            assert_eq!(
                url.as_str(),
                format!("http://s3.local/logs/nginx_access/2024/01/15/{file}"),
                "host {host}"
            );
            assert!(url.fragment().is_none());
            assert!(url.query().is_none());
        }
    }

    #[test]
    fn object_url_rejects_invalid_endpoint() {
        let store = HttpObjectStore::new(reqwest::Client::new(), "not a url", "logs");
        assert!(matches!(
            store.object_url(&key()),
            Err(LogPipelineError::Upload { .. })
        ));
    }

    #[tokio::test]
    async fn put_object_sends_special_host_to_its_own_key() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock(
                "PUT",
                "/logs/nginx_access/2024/01/15/123456-a%23b-nginx_access.gz",
            )
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let at = FixedOffset::east_opt(9 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 15, 12, 34, 56)
            .unwrap();
        let key = ArchiveKey::new("nginx_access", Some("a#b"), at);
        let store = HttpObjectStore::new(reqwest::Client::new(), server.url(), "logs");
        let location = store.put_object(&key, vec![0x1f, 0x8b]).await.unwrap();

        mock.assert_async().await;
        assert_eq!(location.key, "/nginx_access/2024/01/15/123456-a#b-nginx_access.gz");
        assert!(location.url.ends_with("123456-a%23b-nginx_access.gz"));
    }

    #[tokio::test]
    async fn put_object_sends_gzip_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/logs/application/2024/01/15/123456-application.gz")
            .match_header("content-type", "application/gzip")
            .with_status(200)
            .create_async()
            .await;

        let store = HttpObjectStore::new(reqwest::Client::new(), server.url(), "logs");
        let location = store.put_object(&key(), vec![0x1f, 0x8b, 0x08]).await.unwrap();

        mock.assert_async().await;
        assert_eq!(location.bucket, "logs");
        assert_eq!(location.key, "/application/2024/01/15/123456-application.gz");
        assert!(location.url.starts_with(&server.url()));
    }

    #[tokio::test]
    async fn put_object_maps_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("PUT", mockito::Matcher::Any)
            .with_status(403)
            .with_body("AccessDenied")
            .create_async()
            .await;

        let store = HttpObjectStore::new(reqwest::Client::new(), server.url(), "logs");
        let err = store.put_object(&key(), vec![1]).await.unwrap_err();
        match err {
            LogPipelineError::Upload { key, reason } => {
                assert!(key.ends_with("-application.gz"));
                assert!(reason.contains("403"));
                assert!(reason.contains("AccessDenied"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn mock_store_records_uploads() {
        let store = MockObjectStore::new();
        store.put_object(&key(), vec![1, 2]).await.unwrap();
        assert_eq!(store.keys(), vec![key().as_str().to_owned()]);

        let failing = MockObjectStore::new().with_failing_uploads();
        assert!(failing.put_object(&key(), vec![]).await.is_err());
    }
}
