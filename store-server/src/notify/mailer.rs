//! 邮件 outbox 与投递 worker
//!
//! [`Mailer`] 把 [`EmailMessage`] 推进 mpsc 队列，[`MailWorker`] 在后台
//! 消费并投递。投递失败固定延迟后重试一次，再失败记录日志后丢弃
//! （at-least-once，无去重）。

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use shared::EmailMessage;

/// 邮件传输层
///
/// 生产环境走 HTTP 网关，开发/测试环境用日志或内存实现。
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn deliver(&self, mail: &EmailMessage) -> Result<(), String>;
}

/// HTTP 邮件网关传输
pub struct GatewayTransport {
    client: reqwest::Client,
    url: String,
    from: String,
}

impl GatewayTransport {
    pub fn new(url: String, from: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
            from,
        }
    }
}

#[async_trait]
impl MailTransport for GatewayTransport {
    async fn deliver(&self, mail: &EmailMessage) -> Result<(), String> {
        let payload = json!({
            "from": self.from,
            "to": mail.recipients,
            "subject": mail.subject,
            "body": mail.rendered_body(),
        });

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| format!("gateway request failed: {}", e))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(format!("gateway returned {}", response.status()))
        }
    }
}

/// 仅记录日志的传输（未配置网关时使用）
pub struct LogTransport;

#[async_trait]
impl MailTransport for LogTransport {
    async fn deliver(&self, mail: &EmailMessage) -> Result<(), String> {
        tracing::info!(
            subject = %mail.subject,
            recipients = ?mail.recipients,
            "📧 (log-only) {}",
            mail.rendered_body()
        );
        Ok(())
    }
}

/// 邮件 outbox 发送端
#[derive(Clone)]
pub struct Mailer {
    tx: mpsc::Sender<EmailMessage>,
}

impl Mailer {
    /// 创建 outbox，返回 (发送端, 接收端)；接收端交给 [`MailWorker::run`]。
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<EmailMessage>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// 入队一封邮件。队列关闭或已满时只记日志，绝不让请求失败。
    pub async fn enqueue(&self, mail: EmailMessage) {
        if let Err(e) = self.tx.send(mail).await {
            tracing::error!(error = %e, "Mail outbox closed, message dropped");
        }
    }
}

/// 邮件投递 worker
pub struct MailWorker {
    transport: Arc<dyn MailTransport>,
    retry_delay: Duration,
}

impl MailWorker {
    pub fn new(transport: Arc<dyn MailTransport>, retry_delay: Duration) -> Self {
        Self {
            transport,
            retry_delay,
        }
    }

    /// 主循环：消费队列直到 shutdown 或队列关闭
    pub async fn run(self, mut rx: mpsc::Receiver<EmailMessage>, shutdown: CancellationToken) {
        tracing::info!("Mail worker started");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                msg = rx.recv() => {
                    let Some(mail) = msg else { break };
                    self.deliver_with_retry(&mail, &shutdown).await;
                }
            }
        }
        tracing::info!("Mail worker stopped");
    }

    /// 投递一封邮件，失败后延迟重试一次
    pub async fn deliver_with_retry(&self, mail: &EmailMessage, shutdown: &CancellationToken) {
        match self.transport.deliver(mail).await {
            Ok(()) => {
                tracing::info!(
                    subject = %mail.subject,
                    recipients = mail.recipients.len(),
                    "Email sent"
                );
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    subject = %mail.subject,
                    "Email send failed, retrying in {}s",
                    self.retry_delay.as_secs()
                );
                tokio::select! {
                    _ = tokio::time::sleep(self.retry_delay) => {}
                    _ = shutdown.cancelled() => return,
                }
                match self.transport.deliver(mail).await {
                    Ok(()) => {
                        tracing::info!(subject = %mail.subject, "Email sent on retry");
                    }
                    Err(e) => {
                        tracing::error!(
                            error = %e,
                            subject = %mail.subject,
                            "Email send failed after retry, message dropped"
                        );
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails the first `fail_first` deliveries, then succeeds.
    struct FlakyTransport {
        fail_first: usize,
        attempts: AtomicUsize,
        delivered: AtomicUsize,
    }

    impl FlakyTransport {
        fn new(fail_first: usize) -> Self {
            Self {
                fail_first,
                attempts: AtomicUsize::new(0),
                delivered: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl MailTransport for FlakyTransport {
        async fn deliver(&self, _mail: &EmailMessage) -> Result<(), String> {
            let n = self.attempts.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_first {
                Err("smtp unavailable".into())
            } else {
                self.delivered.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }
    }

    fn mail() -> EmailMessage {
        EmailMessage::new("Test", "Halo", vec!["budi@example.com".into()])
    }

    #[tokio::test]
    async fn first_failure_triggers_single_retry() {
        let transport = Arc::new(FlakyTransport::new(1));
        let worker = MailWorker::new(transport.clone(), Duration::from_millis(10));

        worker
            .deliver_with_retry(&mail(), &CancellationToken::new())
            .await;

        assert_eq!(transport.attempts.load(Ordering::SeqCst), 2);
        assert_eq!(transport.delivered.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn second_failure_drops_the_message() {
        let transport = Arc::new(FlakyTransport::new(2));
        let worker = MailWorker::new(transport.clone(), Duration::from_millis(10));

        worker
            .deliver_with_retry(&mail(), &CancellationToken::new())
            .await;

        // Exactly two attempts, never a third
        assert_eq!(transport.attempts.load(Ordering::SeqCst), 2);
        assert_eq!(transport.delivered.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn worker_drains_queue_until_shutdown() {
        let transport = Arc::new(FlakyTransport::new(0));
        let worker = MailWorker::new(transport.clone(), Duration::from_millis(10));
        let (mailer, rx) = Mailer::new(8);
        let shutdown = CancellationToken::new();

        let handle = tokio::spawn(worker.run(rx, shutdown.clone()));

        mailer.enqueue(mail()).await;
        mailer.enqueue(mail()).await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.cancel();
        handle.await.unwrap();

        assert_eq!(transport.delivered.load(Ordering::SeqCst), 2);
    }
}
