//! 付款期限扫描
//!
//! 周期性后台任务（`TaskKind::Periodic`），每轮两件事：
//!
//! 1. **超时取消**：未付款且已过 `payment_deadline_at` 的订单转为
//!    CANCELLED（走正常状态变更扇出），外加一封自动取消邮件和站内通知
//! 2. **付款提醒**：未付款、1–24 小时内到期、尚未提醒过的订单发一次
//!    提醒（邮件 + 站内通知），然后置位提醒标志
//!
//! 全表过滤后逐单处理，不分页——单店数据量完全扛得住。

use std::time::Duration;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tokio_util::sync::CancellationToken;

use shared::util::{HOUR_MILLIS, now_millis};

use crate::db::models::{NotificationKind, Order, OrderStatus};
use crate::db::repository::{CustomerRepository, OrderRepository};
use crate::notify::Notifier;
use crate::orders::OrderLifecycle;
use crate::utils::{format_millis, format_rupiah};

/// 提醒窗口：到期前 1 到 24 小时
const REMINDER_WINDOW_FROM_HOURS: i64 = 1;
const REMINDER_WINDOW_TO_HOURS: i64 = 24;

pub struct DeadlineSweeper {
    db: Surreal<Db>,
    lifecycle: OrderLifecycle,
    notifier: Notifier,
    interval: Duration,
    shutdown: CancellationToken,
}

impl DeadlineSweeper {
    pub fn new(
        db: Surreal<Db>,
        lifecycle: OrderLifecycle,
        notifier: Notifier,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            db,
            lifecycle,
            notifier,
            interval,
            shutdown,
        }
    }

    /// 主循环
    pub async fn run(self) {
        tracing::info!("Deadline sweeper started (interval {:?})", self.interval);
        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = self.shutdown.cancelled() => break,
            }
            self.sweep_once().await;
        }
        tracing::info!("Deadline sweeper stopped");
    }

    /// 一轮扫描：先取消过期，再发提醒
    pub async fn sweep_once(&self) {
        self.cancel_expired().await;
        self.send_payment_reminders().await;
    }

    async fn cancel_expired(&self) {
        let repo = OrderRepository::new(self.db.clone());
        let expired = match repo.find_expired_unpaid(now_millis()).await {
            Ok(orders) => orders,
            Err(e) => {
                tracing::error!(error = %e, "Expiry sweep query failed");
                return;
            }
        };

        if expired.is_empty() {
            tracing::debug!("No orders past payment deadline");
            return;
        }
        tracing::info!(count = expired.len(), "Cancelling orders past payment deadline");

        for order in expired {
            let key = order.key();
            match self.lifecycle.change_status(&key, OrderStatus::Cancelled).await {
                Ok(cancelled) => self.notify_auto_cancelled(&cancelled).await,
                Err(e) => {
                    tracing::error!(error = %e, order = %key, "Failed to cancel expired order");
                }
            }
        }
    }

    async fn notify_auto_cancelled(&self, order: &Order) {
        let deadline = order
            .payment_deadline_at
            .map(format_millis)
            .unwrap_or_else(|| "-".into());
        let body = format!(
            "Pesanan #{} senilai {} dibatalkan otomatis karena pembayaran tidak \
             diterima sebelum {}.",
            order.key(),
            format_rupiah(order.total),
            deadline
        );

        self.notifier
            .in_app(&order.customer_id, NotificationKind::OrderAutoCancelled, body.clone())
            .await;

        let customers = CustomerRepository::new(self.db.clone());
        if let Ok(Some(customer)) = customers.find_by_id(&order.customer_id).await {
            self.notifier
                .email_customer(
                    &customer,
                    format!("❌ Pesanan Dibatalkan Otomatis #{}", order.key()),
                    body,
                    Some(format!("/orders/{}", order.key())),
                )
                .await;
        }
    }

    async fn send_payment_reminders(&self) {
        let repo = OrderRepository::new(self.db.clone());
        let customers = CustomerRepository::new(self.db.clone());

        let now = now_millis();
        let from = now + REMINDER_WINDOW_FROM_HOURS * HOUR_MILLIS;
        let to = now + REMINDER_WINDOW_TO_HOURS * HOUR_MILLIS;

        let due = match repo.find_due_for_reminder(from, to).await {
            Ok(orders) => orders,
            Err(e) => {
                tracing::error!(error = %e, "Reminder sweep query failed");
                return;
            }
        };

        for order in due {
            let key = order.key();
            let deadline = order
                .payment_deadline_at
                .map(format_millis)
                .unwrap_or_else(|| "-".into());
            let body = format!(
                "Pesanan #{} senilai {} belum dibayar. Batas waktu pembayaran: {}. \
                 Setelah lewat, pesanan dibatalkan otomatis.",
                key,
                format_rupiah(order.total),
                deadline
            );

            if let Ok(Some(customer)) = customers.find_by_id(&order.customer_id).await {
                self.notifier
                    .email_customer(
                        &customer,
                        format!("⏰ Pengingat Pembayaran #{}", key),
                        body.clone(),
                        Some(format!("/orders/{}", key)),
                    )
                    .await;
            }
            self.notifier
                .in_app(&order.customer_id, NotificationKind::PaymentReminder, body)
                .await;

            if let Err(e) = repo.set_reminder_sent(&key).await {
                tracing::error!(error = %e, order = %key, "Failed to persist reminder flag");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use crate::db::DbService;
    use crate::db::models::Customer;
    use crate::notify::Mailer;
    use chrono::NaiveDate;
    use shared::EmailMessage;
    use tokio::sync::mpsc;

    struct Ctx {
        sweeper: DeadlineSweeper,
        orders: OrderRepository,
        customers: CustomerRepository,
        rx: mpsc::Receiver<EmailMessage>,
    }

    async fn setup() -> Ctx {
        let db = DbService::open_in_memory().await.unwrap().db;
        let (mailer, rx) = Mailer::new(64);
        let config = Config::with_overrides("/tmp/store-sweep-test", 0);
        let notifier = Notifier::new(mailer, db.clone(), &config);
        let lifecycle = OrderLifecycle::new(db.clone(), notifier.clone());
        Ctx {
            sweeper: DeadlineSweeper::new(
                db.clone(),
                lifecycle,
                notifier,
                Duration::from_secs(300),
                CancellationToken::new(),
            ),
            orders: OrderRepository::new(db.clone()),
            customers: CustomerRepository::new(db),
            rx,
        }
    }

    async fn seed_customer(repo: &CustomerRepository) -> String {
        repo.create(Customer {
            id: None,
            name: "Budi".into(),
            address: "Jl. Merdeka 1".into(),
            birth_date: NaiveDate::from_ymd_opt(1990, 5, 17).unwrap(),
            phone: "0812345678".into(),
            username: "budi".into(),
            password: "hash".into(),
            email: Some("budi@example.com".into()),
            is_birthday_discount_active: false,
            birthday_discount_activated_at: None,
            lifetime_spend: 0.0,
        })
        .await
        .unwrap()
        .key()
    }

    async fn seed_order(repo: &OrderRepository, customer_key: &str, deadline: i64) -> Order {
        let now = now_millis();
        repo.create(Order {
            id: None,
            customer_id: format!("customer:{}", customer_key),
            created_at: now,
            total: 200_000.0,
            shipping_fee: 0.0,
            status: OrderStatus::Processing,
            payment_proof: None,
            shipping_address: None,
            feedback: None,
            feedback_photo: None,
            checkout_at: now,
            payment_deadline_at: Some(deadline),
            is_payment_reminder_sent: false,
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn expired_order_is_cancelled_with_extra_email() {
        let mut ctx = setup().await;
        let customer_key = seed_customer(&ctx.customers).await;
        let order = seed_order(&ctx.orders, &customer_key, now_millis() - HOUR_MILLIS).await;

        ctx.sweeper.sweep_once().await;

        let reloaded = ctx.orders.find_by_id(&order.key()).await.unwrap().unwrap();
        assert_eq!(reloaded.status, OrderStatus::Cancelled);
        assert!(reloaded.is_payment_reminder_sent);

        // Status-change email + auto-cancel email
        assert!(ctx.rx.try_recv().unwrap().subject.contains("Perubahan Status"));
        assert!(ctx.rx.try_recv().unwrap().subject.contains("Dibatalkan Otomatis"));
        assert!(ctx.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn reminder_sent_exactly_once() {
        let mut ctx = setup().await;
        let customer_key = seed_customer(&ctx.customers).await;
        let order = seed_order(&ctx.orders, &customer_key, now_millis() + 2 * HOUR_MILLIS).await;

        ctx.sweeper.sweep_once().await;

        let reloaded = ctx.orders.find_by_id(&order.key()).await.unwrap().unwrap();
        assert!(reloaded.is_payment_reminder_sent);
        assert_eq!(reloaded.status, OrderStatus::Processing);
        assert!(ctx.rx.try_recv().unwrap().subject.contains("Pengingat Pembayaran"));

        // Second pass sends nothing
        ctx.sweeper.sweep_once().await;
        assert!(ctx.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn order_due_far_in_future_is_untouched() {
        let mut ctx = setup().await;
        let customer_key = seed_customer(&ctx.customers).await;
        let order =
            seed_order(&ctx.orders, &customer_key, now_millis() + 48 * HOUR_MILLIS).await;

        ctx.sweeper.sweep_once().await;

        let reloaded = ctx.orders.find_by_id(&order.key()).await.unwrap().unwrap();
        assert_eq!(reloaded.status, OrderStatus::Processing);
        assert!(!reloaded.is_payment_reminder_sent);
        assert!(ctx.rx.try_recv().is_err());
    }
}
