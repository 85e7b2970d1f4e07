//! 검색 스토어 클라이언트 추상화
//!
//! [`SearchClient`] trait은 인덱스 존재 확인, 생성, 문서 쓰기 세 가지 연산만
//! 노출합니다. [`HttpSearchClient`]는 Elasticsearch 6 REST API를 사용합니다.
//!
//! | 연산 | 요청 | 성공 |
//! |---|---|---|
//! | 존재 확인 | `HEAD /<index>` | 200 존재, 404 없음 |
//! | 생성 | `PUT /<index>` + 매핑 | 2xx 또는 `resource_already_exists_exception` |
//! | 문서 쓰기 | `POST /<index>/<type>` | 2xx |

use std::future::Future;

use reqwest::StatusCode;
use serde_json::Value;

use crate::error::LogPipelineError;

/// 검색 스토어 클라이언트
pub trait SearchClient: Send + Sync + 'static {
    /// 인덱스 존재 여부를 확인합니다.
    fn index_exists(
        &self,
        index: &str,
    ) -> impl Future<Output = Result<bool, LogPipelineError>> + Send;

    /// 매핑과 함께 인덱스를 생성합니다. 이미 존재하면 성공으로 취급합니다.
    fn create_index(
        &self,
        index: &str,
        body: &Value,
    ) -> impl Future<Output = Result<(), LogPipelineError>> + Send;

    /// 문서 하나를 씁니다.
    fn index_document(
        &self,
        index: &str,
        doc_type: &str,
        document: &Value,
    ) -> impl Future<Output = Result<(), LogPipelineError>> + Send;
}

/// Elasticsearch REST 클라이언트
#[derive(Debug, Clone)]
pub struct HttpSearchClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSearchClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    fn index_err(index: &str, reason: impl Into<String>) -> LogPipelineError {
        LogPipelineError::Index {
            index: index.to_owned(),
            reason: reason.into(),
        }
    }
}

impl SearchClient for HttpSearchClient {
    async fn index_exists(&self, index: &str) -> Result<bool, LogPipelineError> {
        let response = self
            .client
            .head(format!("{}/{}", self.base_url, index))
            .send()
            .await
            .map_err(|e| Self::index_err(index, e.to_string()))?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            other => Err(Self::index_err(
                index,
                format!("unexpected status on existence check: {other}"),
            )),
        }
    }

    async fn create_index(&self, index: &str, body: &Value) -> Result<(), LogPipelineError> {
        let response = self
            .client
            .put(format!("{}/{}", self.base_url, index))
            .json(body)
            .send()
            .await
            .map_err(|e| Self::index_err(index, e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let text = response.text().await.unwrap_or_default();
        // 동시 생성 경합
        if status == StatusCode::BAD_REQUEST && text.contains("resource_already_exists_exception") {
            return Ok(());
        }
        Err(Self::index_err(
            index,
            format!("create failed: {status}: {text}"),
        ))
    }

    async fn index_document(
        &self,
        index: &str,
        doc_type: &str,
        document: &Value,
    ) -> Result<(), LogPipelineError> {
        let response = self
            .client
            .post(format!("{}/{}/{}", self.base_url, index, doc_type))
            .json(document)
            .send()
            .await
            .map_err(|e| Self::index_err(index, e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(Self::index_err(
                index,
                format!("document write failed: {status}: {text}"),
            ))
        }
    }
}

/// 테스트용 Mock 검색 스토어
#[cfg(test)]
#[derive(Default)]
pub struct MockSearchClient {
    /// 현재 존재하는 인덱스
    pub existing: std::sync::Mutex<Vec<String>>,
    /// 존재 확인 호출 횟수
    pub exists_calls: std::sync::atomic::AtomicUsize,
    /// 생성 요청 (인덱스, 본문)
    pub created: std::sync::Mutex<Vec<(String, Value)>>,
    /// 쓰인 문서 (인덱스, 타입, 문서)
    pub documents: std::sync::Mutex<Vec<(String, String, Value)>>,
    /// 이 개수만큼 쓴 뒤 문서 쓰기가 실패함
    pub fail_after: Option<usize>,
}

#[cfg(test)]
impl MockSearchClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 인덱스가 이미 존재하는 상태로 시작합니다.
    pub fn with_existing_index(self, index: &str) -> Self {
        self.existing.lock().unwrap().push(index.to_owned());
        self
    }

    /// `n`개 문서를 쓴 뒤 실패하도록 설정합니다.
    pub fn failing_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    pub fn document_count(&self) -> usize {
        self.documents.lock().unwrap().len()
    }
}

#[cfg(test)]
impl SearchClient for MockSearchClient {
    async fn index_exists(&self, index: &str) -> Result<bool, LogPipelineError> {
        self.exists_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(self.existing.lock().unwrap().iter().any(|i| i == index))
    }

    async fn create_index(&self, index: &str, body: &Value) -> Result<(), LogPipelineError> {
        self.created
            .lock()
            .unwrap()
            .push((index.to_owned(), body.clone()));
        self.existing.lock().unwrap().push(index.to_owned());
        Ok(())
    }

    async fn index_document(
        &self,
        index: &str,
        doc_type: &str,
        document: &Value,
    ) -> Result<(), LogPipelineError> {
        let mut documents = self.documents.lock().unwrap();
        if self.fail_after.is_some_and(|n| documents.len() >= n) {
            return Err(LogPipelineError::Index {
                index: index.to_owned(),
                reason: "mock failure".to_owned(),
            });
        }
        documents.push((index.to_owned(), doc_type.to_owned(), document.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn index_exists_maps_status() {
        let mut server = mockito::Server::new_async().await;
        let _found = server
            .mock("HEAD", "/application")
            .with_status(200)
            .create_async()
            .await;
        let _missing = server
            .mock("HEAD", "/absent")
            .with_status(404)
            .create_async()
            .await;
        let _broken = server
            .mock("HEAD", "/broken")
            .with_status(500)
            .create_async()
            .await;

        let client = HttpSearchClient::new(reqwest::Client::new(), server.url());
        assert!(client.index_exists("application").await.unwrap());
        assert!(!client.index_exists("absent").await.unwrap());
        assert!(matches!(
            client.index_exists("broken").await,
            Err(LogPipelineError::Index { .. })
        ));
    }

    #[tokio::test]
    async fn create_index_sends_mapping() {
        let mut server = mockito::Server::new_async().await;
        let body = json!({"mappings": {"log": {"properties": {}}}});
        let mock = server
            .mock("PUT", "/application")
            .match_body(mockito::Matcher::Json(body.clone()))
            .with_status(200)
            .with_body(r#"{"acknowledged":true}"#)
            .create_async()
            .await;

        let client = HttpSearchClient::new(reqwest::Client::new(), server.url());
        client.create_index("application", &body).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn create_index_tolerates_already_exists() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("PUT", "/application")
            .with_status(400)
            .with_body(r#"{"error":{"type":"resource_already_exists_exception"},"status":400}"#)
            .create_async()
            .await;

        let client = HttpSearchClient::new(reqwest::Client::new(), server.url());
        client.create_index("application", &json!({})).await.unwrap();
    }

    #[tokio::test]
    async fn index_document_posts_to_type_path() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/nginx/access")
            .match_header("content-type", "application/json")
            .with_status(201)
            .create_async()
            .await;

        let client = HttpSearchClient::new(reqwest::Client::new(), format!("{}/", server.url()));
        client
            .index_document("nginx", "access", &json!({"status": "200"}))
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn index_document_failure_is_index_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/nginx/access")
            .with_status(429)
            .create_async()
            .await;

        let client = HttpSearchClient::new(reqwest::Client::new(), server.url());
        let err = client
            .index_document("nginx", "access", &json!({}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("429"));
    }
}
