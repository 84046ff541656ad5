//! 通知门面
//!
//! handler 与后台任务统一通过 [`Notifier`] 发出顾客邮件、管理员邮件和
//! 站内通知。邮件是异步入队的，永远不会让业务请求失败。

use std::time::Duration;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use shared::EmailMessage;

use crate::core::Config;
use crate::db::models::{Customer, NotificationKind};
use crate::db::repository::{CustomerRepository, NotificationRepository, OrderRepository};
use crate::notify::Mailer;

#[derive(Clone)]
pub struct Notifier {
    mailer: Mailer,
    db: Surreal<Db>,
    admin_emails: Vec<String>,
    feedback_reminder_delay: Duration,
}

impl Notifier {
    pub fn new(mailer: Mailer, db: Surreal<Db>, config: &Config) -> Self {
        Self {
            mailer,
            db,
            admin_emails: config.admin_emails.clone(),
            feedback_reminder_delay: Duration::from_secs(config.feedback_reminder_secs),
        }
    }

    /// 给任意收件人列表发一封邮件
    pub async fn email(
        &self,
        recipients: Vec<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
        link_url: Option<String>,
    ) {
        if recipients.is_empty() {
            return;
        }
        let mut mail = EmailMessage::new(subject, body, recipients);
        if let Some(url) = link_url {
            mail = mail.with_link(url);
        }
        self.mailer.enqueue(mail).await;
    }

    /// 给顾客发邮件；没有邮箱的顾客直接跳过
    pub async fn email_customer(
        &self,
        customer: &Customer,
        subject: impl Into<String>,
        body: impl Into<String>,
        link_url: Option<String>,
    ) {
        let Some(email) = customer.email.clone().filter(|e| !e.is_empty()) else {
            tracing::debug!(customer = %customer.username, "Customer has no email, skipping");
            return;
        };
        self.email(vec![email], subject, body, link_url).await;
    }

    /// 给管理员列表发邮件
    pub async fn email_admins(
        &self,
        subject: impl Into<String>,
        body: impl Into<String>,
        link_url: Option<String>,
    ) {
        self.email(self.admin_emails.clone(), subject, body, link_url)
            .await;
    }

    /// 写一条站内通知；失败只记日志
    pub async fn in_app(&self, customer_id: &str, kind: NotificationKind, body: String) {
        let repo = NotificationRepository::new(self.db.clone());
        if let Err(e) = repo.create(customer_id, kind, body).await {
            tracing::error!(error = %e, customer = %customer_id, "Failed to write in-app notification");
        }
    }

    /// 订单完成后调度反馈提醒（默认 +3 天）
    ///
    /// 进程内延迟任务：进程重启会丢失待触发的提醒（与原系统的
    /// fire-and-forget 行为一致）。
    pub fn schedule_feedback_reminder(&self, order_key: String) {
        let notifier = self.clone();
        let delay = self.feedback_reminder_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            notifier.send_feedback_reminder_if_pending(&order_key).await;
        });
    }

    /// 触发条件：订单仍存在、仍是已完成、反馈仍为空
    pub async fn send_feedback_reminder_if_pending(&self, order_key: &str) {
        let orders = OrderRepository::new(self.db.clone());
        let order = match orders.find_by_id(order_key).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                tracing::info!(order = %order_key, "Order gone, skipping feedback reminder");
                return;
            }
            Err(e) => {
                tracing::error!(error = %e, order = %order_key, "Failed to load order for feedback reminder");
                return;
            }
        };

        if !order.feedback_is_empty() {
            tracing::info!(order = %order_key, "Feedback already given, skipping reminder");
            return;
        }

        let customers = CustomerRepository::new(self.db.clone());
        let customer = match customers.find_by_id(&order.customer_id).await {
            Ok(Some(customer)) => customer,
            Ok(None) => {
                tracing::warn!(order = %order_key, "Customer gone, skipping feedback reminder");
                return;
            }
            Err(e) => {
                tracing::error!(error = %e, order = %order_key, "Failed to load customer for feedback reminder");
                return;
            }
        };

        let body = format!(
            "Halo {}, pesanan #{} sudah selesai. Bagaimana pengalaman belanja Anda? \
             Kami tunggu ulasannya ya!",
            customer.name,
            order.key()
        );
        self.email_customer(
            &customer,
            "⭐ Jangan Lupa Beri Ulasan",
            body.clone(),
            Some(format!("/orders/{}", order.key())),
        )
        .await;
        self.in_app(&order.customer_id, NotificationKind::FeedbackReminder, body)
            .await;
    }
}
