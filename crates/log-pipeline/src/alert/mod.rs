//! 알림 디스패치 -- 레코드별 조건을 평가하고 웹훅 알림을 보냅니다.
//!
//! 변형별 조건:
//! - 애플리케이션 로그: 레코드에 포함된 알림 지시자의 `notification`만 따름
//! - nginx 에러 로그: `log_level`이 트리거 집합에 있으면 (기본 `error`)
//! - php-fpm 에러 로그: `log_level`이 제외 집합에 없으면 (기본 `NOTICE` 제외)
//! - 액세스 로그: `status`가 트리거 집합에 있으면 (기본 없음)
//!
//! 전송은 최선 노력(best effort)이 아닙니다. 첫 실패에서 멈추고 에러를 반환합니다.

pub mod notifier;

pub use notifier::{Notifier, WebhookMessage, WebhookNotifier};

use tracing::{debug, info};

use crate::config::{AlertPolicy, PipelineConfig};
use crate::error::LogPipelineError;
use crate::record::ClassifiedRecord;

/// 채널 전체 호출 표시
pub const AT_CHANNEL_MARKER: &str = "<!channel>";

/// 알림 디스패처
pub struct AlertDispatcher<N: Notifier> {
    notifier: N,
    policy: AlertPolicy,
    default_channel: String,
    username: String,
}

impl<N: Notifier> AlertDispatcher<N> {
    pub fn new(
        notifier: N,
        policy: AlertPolicy,
        default_channel: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            notifier,
            policy,
            default_channel: default_channel.into(),
            username: username.into(),
        }
    }

    /// 설정에서 디스패처를 생성합니다.
    pub fn from_config(notifier: N, config: &PipelineConfig) -> Self {
        Self::new(
            notifier,
            config.alert.clone(),
            config.channel.clone(),
            config.username.clone(),
        )
    }

    /// 알림 채널 참조
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// 레코드가 알림 조건을 만족하는지 평가합니다.
    pub fn should_dispatch(&self, record: &ClassifiedRecord) -> bool {
        match record {
            ClassifiedRecord::Application(log) => log.slack.notification,
            ClassifiedRecord::NginxError(log) => self.policy.nginx_error.fires(&log.log_level),
            ClassifiedRecord::PhpFpmError(log) => {
                self.policy.php_fpm_error.fires(&log.log_level)
            }
            ClassifiedRecord::Access(log) => self.policy.access_status.fires(&log.status),
        }
    }

    /// 조건을 만족하는 레코드의 웹훅 메시지를 만듭니다.
    pub fn compose(&self, record: &ClassifiedRecord) -> Option<WebhookMessage> {
        if !self.should_dispatch(record) {
            return None;
        }

        let (at_channel, channel, body) = match record {
            ClassifiedRecord::Application(log) => {
                let directive = log.directive();
                (
                    directive.at_channel,
                    directive.target_channel,
                    directive.message,
                )
            }
            ClassifiedRecord::NginxError(log) => {
                (self.policy.at_channel, String::new(), log.message.clone())
            }
            ClassifiedRecord::PhpFpmError(log) => {
                (self.policy.at_channel, String::new(), log.message.clone())
            }
            ClassifiedRecord::Access(log) => (self.policy.at_channel, String::new(), log.summary()),
        };

        let text = if at_channel {
            format!("{AT_CHANNEL_MARKER} {body}")
        } else {
            body
        };
        let channel = if channel.is_empty() {
            self.default_channel.clone()
        } else {
            channel
        };

        Some(WebhookMessage {
            channel,
            username: self.username.clone(),
            text,
        })
    }

    /// 레코드를 순서대로 평가하여 알림을 보냅니다.
    ///
    /// 첫 실패에서 멈추며, 보낸 알림 수를 반환합니다.
    pub async fn dispatch_all(
        &self,
        records: &[ClassifiedRecord],
    ) -> Result<usize, LogPipelineError> {
        let mut sent = 0;
        for record in records {
            let Some(message) = self.compose(record) else {
                continue;
            };
            self.notifier.notify(&message).await?;
            debug!(channel = %message.channel, kind = %record.kind(), "alert sent");
            sent += 1;
        }
        if sent > 0 {
            info!(alerts = sent, "dispatched alerts");
        }
        Ok(sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::notifier::MockNotifier;
    use crate::config::LevelTrigger;
    use crate::record::{AccessLog, ApplicationLog, NginxErrorLog, PhpFpmErrorLog, SlackBody, SlackDirective};

    fn dispatcher(notifier: MockNotifier) -> AlertDispatcher<MockNotifier> {
        AlertDispatcher::new(notifier, AlertPolicy::default(), "#alerts", "logfan")
    }

    fn app(notification: bool, at_channel: bool, channel: &str, message: &str) -> ClassifiedRecord {
        ClassifiedRecord::Application(ApplicationLog {
            level: "DEBUG".to_owned(),
            slack: SlackDirective {
                notification,
                body: SlackBody {
                    send_channel: channel.to_owned(),
                    at_channel,
                    message: message.to_owned(),
                    ..Default::default()
                },
            },
            ..Default::default()
        })
    }

    fn nginx(level: &str) -> ClassifiedRecord {
        ClassifiedRecord::NginxError(NginxErrorLog {
            log_level: level.to_owned(),
            message: format!("{level} happened"),
            ..Default::default()
        })
    }

    fn php(level: &str) -> ClassifiedRecord {
        ClassifiedRecord::PhpFpmError(PhpFpmErrorLog {
            log_level: level.to_owned(),
            message: "pool busy".to_owned(),
            ..Default::default()
        })
    }

    #[test]
    fn at_channel_directive_prefixes_marker() {
        let d = dispatcher(MockNotifier::new());
        let message = d.compose(&app(true, true, "", "X")).unwrap();
        assert!(message.text.starts_with(AT_CHANNEL_MARKER));
        assert_eq!(message.text, "<!channel> X");
        assert_eq!(message.channel, "#alerts");
        assert_eq!(message.username, "logfan");
    }

    #[test]
    fn directive_channel_overrides_default() {
        let d = dispatcher(MockNotifier::new());
        let message = d.compose(&app(true, false, "#billing", "Y")).unwrap();
        assert_eq!(message.channel, "#billing");
        assert_eq!(message.text, "Y");
    }

    #[test]
    fn directive_is_sole_authority_for_application_logs() {
        let d = dispatcher(MockNotifier::new());
        assert!(d.compose(&app(false, true, "", "ignored")).is_none());
    }

    #[test]
    fn nginx_error_level_triggers() {
        let d = dispatcher(MockNotifier::new());
        assert!(d.should_dispatch(&nginx("error")));
        assert!(!d.should_dispatch(&nginx("warning")));
        assert!(!d.should_dispatch(&nginx("crit")));
    }

    #[test]
    fn php_fpm_all_but_notice() {
        let d = dispatcher(MockNotifier::new());
        assert!(d.should_dispatch(&php("WARNING")));
        assert!(d.should_dispatch(&php("ERROR")));
        assert!(!d.should_dispatch(&php("NOTICE")));
    }

    #[test]
    fn access_logs_silent_by_default() {
        let d = dispatcher(MockNotifier::new());
        let record = ClassifiedRecord::Access(AccessLog {
            status: "500".to_owned(),
            ..Default::default()
        });
        assert!(!d.should_dispatch(&record));
    }

    #[test]
    fn access_status_policy_composes_summary() {
        let policy = AlertPolicy {
            access_status: LevelTrigger::AnyOf(vec!["502".to_owned()]),
            at_channel: true,
            ..AlertPolicy::default()
        };
        let d = AlertDispatcher::new(MockNotifier::new(), policy, "#web", "nginx");
        let record = ClassifiedRecord::Access(AccessLog {
            status: "502".to_owned(),
            request_method: "POST".to_owned(),
            request_uri: "/api/pay".to_owned(),
            host: "shop.example".to_owned(),
            ..Default::default()
        });
        let message = d.compose(&record).unwrap();
        assert_eq!(message.text, "<!channel> 502 POST /api/pay (shop.example)");
        assert_eq!(message.channel, "#web");
    }

    #[tokio::test]
    async fn dispatch_all_sends_in_batch_order() {
        let d = dispatcher(MockNotifier::new());
        let sent = d
            .dispatch_all(&[nginx("error"), nginx("warning"), nginx("error")])
            .await
            .unwrap();
        assert_eq!(sent, 2);
        assert_eq!(d.notifier().sent().len(), 2);
    }

    #[tokio::test]
    async fn dispatch_all_stops_at_first_failure() {
        let d = dispatcher(MockNotifier::new().failing_after(1));
        let err = d
            .dispatch_all(&[php("ERROR"), php("ERROR"), php("ERROR")])
            .await
            .unwrap_err();
        assert!(matches!(err, LogPipelineError::Notification(_)));
        assert_eq!(d.notifier().sent().len(), 1);
    }
}
