//! 웹훅 알림 전송
//!
//! [`Notifier`] trait은 알림 채널을 추상화합니다. [`WebhookNotifier`]는
//! `{channel, username, text}` JSON을 Slack 호환 웹훅에 POST합니다.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::LogPipelineError;

/// 웹훅 페이로드
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookMessage {
    pub channel: String,
    pub username: String,
    pub text: String,
}

/// 알림 채널
pub trait Notifier: Send + Sync + 'static {
    /// 메시지 하나를 전송합니다. 재시도하지 않습니다.
    ///
    /// # Errors
    ///
    /// 전송 실패나 2xx가 아닌 응답은 `LogPipelineError::Notification`입니다.
    fn notify(
        &self,
        message: &WebhookMessage,
    ) -> impl Future<Output = Result<(), LogPipelineError>> + Send;
}

/// Slack 호환 웹훅 클라이언트
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

impl Notifier for WebhookNotifier {
    async fn notify(&self, message: &WebhookMessage) -> Result<(), LogPipelineError> {
        let response = self
            .client
            .post(&self.url)
            .json(message)
            .send()
            .await
            .map_err(|e| LogPipelineError::Notification(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(LogPipelineError::Notification(format!(
                "webhook returned {status}: {text}"
            )))
        }
    }
}

/// 테스트용 Mock 알림 채널
#[cfg(test)]
#[derive(Default)]
pub struct MockNotifier {
    /// 전송된 메시지
    pub sent: std::sync::Mutex<Vec<WebhookMessage>>,
    /// 이 개수만큼 보낸 뒤 실패함
    pub fail_after: Option<usize>,
}

#[cfg(test)]
impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// `n`개를 보낸 뒤 실패하도록 설정합니다.
    pub fn failing_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    pub fn sent(&self) -> Vec<WebhookMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl Notifier for MockNotifier {
    async fn notify(&self, message: &WebhookMessage) -> Result<(), LogPipelineError> {
        let mut sent = self.sent.lock().unwrap();
        if self.fail_after.is_some_and(|n| sent.len() >= n) {
            return Err(LogPipelineError::Notification("mock failure".to_owned()));
        }
        sent.push(message.clone());
        Ok(())
    }
}
