//! 订单生命周期
//!
//! 状态流转: PROCESSING → AWAITING_VERIFICATION → PAID → SHIPPED → COMPLETED，
//! CANCELLED 可从两个未付款状态进入。直接条件分派，不做非法流转拦截 ——
//! 管理员操作以仓库实际情况为准。
//!
//! 每次状态变更：
//! 1. 重算付款提醒标志（进入 PAID/CANCELLED/COMPLETED 置位，其余清零），
//!    与状态同一条 UPDATE 持久化
//! 2. 给顾客发状态变更邮件
//! 3. 进入 COMPLETED：写 TRANSACTION_COMPLETED 站内通知 + 调度反馈提醒
//! 4. 进入 PROCESSING：通知管理员

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::db::models::{Customer, NotificationKind, Order, OrderStatus};
use crate::db::repository::{CustomerRepository, OrderRepository};
use crate::notify::Notifier;
use crate::utils::{AppError, AppResult, format_rupiah};

#[derive(Clone)]
pub struct OrderLifecycle {
    db: Surreal<Db>,
    notifier: Notifier,
}

impl OrderLifecycle {
    pub fn new(db: Surreal<Db>, notifier: Notifier) -> Self {
        Self { db, notifier }
    }

    /// 变更订单状态并触发通知扇出。幂等：状态相同直接返回。
    pub async fn change_status(&self, order_id: &str, new_status: OrderStatus) -> AppResult<Order> {
        let repo = OrderRepository::new(self.db.clone());
        let order = repo
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))?;

        let old_status = order.status;
        if old_status == new_status {
            return Ok(order);
        }

        let reminder_sent = new_status.settles_payment_reminder();
        let updated = repo.set_status(order_id, new_status, reminder_sent).await?;

        tracing::info!(
            order = %updated.key(),
            from = %old_status,
            to = %new_status,
            "Order status changed"
        );

        self.after_change(&updated, old_status).await;
        Ok(updated)
    }

    /// 新订单创建完成后的通知扇出（结账）
    pub async fn handle_created(&self, order: &Order) {
        let Some(customer) = self.load_customer(order).await else {
            return;
        };
        let order_no = order.key();

        let body = format!(
            "Halo {}, pesanan #{} senilai {} berhasil dibuat. \
             Segera lakukan pembayaran sebelum batas waktu ya!",
            customer.name,
            order_no,
            format_rupiah(order.total)
        );
        self.notifier
            .email_customer(
                &customer,
                "🥳 Transaksi Berhasil Dibuat",
                body.clone(),
                Some(format!("/orders/{}", order_no)),
            )
            .await;
        self.notifier
            .in_app(&order.customer_id, NotificationKind::TransactionCreated, body)
            .await;

        self.notifier
            .email_admins(
                format!("📥 Pesanan Baru #{}", order_no),
                format!(
                    "Pesanan baru dari {} senilai {} menunggu diproses.",
                    customer.name,
                    format_rupiah(order.total)
                ),
                None,
            )
            .await;
    }

    /// 付款凭证上传后的通知扇出
    pub async fn handle_payment_proof(&self, order: &Order) {
        let Some(customer) = self.load_customer(order).await else {
            return;
        };
        let order_no = order.key();

        self.notifier
            .email_customer(
                &customer,
                format!("🧾 Bukti Pembayaran Diterima #{}", order_no),
                format!(
                    "Halo {}, bukti pembayaran untuk pesanan #{} sudah kami terima \
                     dan sedang diverifikasi.",
                    customer.name, order_no
                ),
                Some(format!("/orders/{}", order_no)),
            )
            .await;

        self.notifier
            .email_admins(
                format!("🔍 Verifikasi Pembayaran #{}", order_no),
                format!(
                    "{} mengunggah bukti pembayaran untuk pesanan #{} senilai {}. \
                     Mohon segera diverifikasi.",
                    customer.name,
                    order_no,
                    format_rupiah(order.total)
                ),
                None,
            )
            .await;
    }

    async fn after_change(&self, order: &Order, old_status: OrderStatus) {
        let Some(customer) = self.load_customer(order).await else {
            return;
        };
        let order_no = order.key();

        // 状态变更邮件（所有流转都发）
        self.notifier
            .email_customer(
                &customer,
                format!("📣 Perubahan Status Pesanan #{}", order_no),
                format!(
                    "Halo {}, status pesanan #{} berubah dari \"{}\" menjadi \"{}\".",
                    customer.name,
                    order_no,
                    old_status.label(),
                    order.status.label()
                ),
                Some(format!("/orders/{}", order_no)),
            )
            .await;

        match order.status {
            OrderStatus::Completed => {
                let body = format!(
                    "Pesanan #{} senilai {} telah selesai. Terima kasih sudah \
                     berbelanja di Barokah Jaya Beton!",
                    order_no,
                    format_rupiah(order.total)
                );
                self.notifier
                    .in_app(
                        &order.customer_id,
                        NotificationKind::TransactionCompleted,
                        body,
                    )
                    .await;
                self.notifier.schedule_feedback_reminder(order_no);
            }
            OrderStatus::Processing => {
                self.notifier
                    .email_admins(
                        format!("📥 Pesanan #{} Kembali Diproses", order_no),
                        format!(
                            "Pesanan #{} milik {} kembali ke status Diproses.",
                            order_no, customer.name
                        ),
                        None,
                    )
                    .await;
            }
            _ => {}
        }
    }

    async fn load_customer(&self, order: &Order) -> Option<Customer> {
        let repo = CustomerRepository::new(self.db.clone());
        match repo.find_by_id(&order.customer_id).await {
            Ok(Some(customer)) => Some(customer),
            Ok(None) => {
                tracing::warn!(order = %order.key(), customer = %order.customer_id, "Order customer missing");
                None
            }
            Err(e) => {
                tracing::error!(error = %e, order = %order.key(), "Failed to load order customer");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use crate::db::DbService;
    use crate::notify::Mailer;
    use chrono::NaiveDate;
    use shared::EmailMessage;
    use shared::util::now_millis;
    use tokio::sync::mpsc;

    struct Ctx {
        lifecycle: OrderLifecycle,
        orders: OrderRepository,
        customers: CustomerRepository,
        rx: mpsc::Receiver<EmailMessage>,
        db: Surreal<Db>,
    }

    async fn setup() -> Ctx {
        let db = DbService::open_in_memory().await.unwrap().db;
        let (mailer, rx) = Mailer::new(32);
        let config = Config::with_overrides("/tmp/store-lifecycle-test", 0);
        let notifier = Notifier::new(mailer, db.clone(), &config);
        Ctx {
            lifecycle: OrderLifecycle::new(db.clone(), notifier),
            orders: OrderRepository::new(db.clone()),
            customers: CustomerRepository::new(db.clone()),
            rx,
            db,
        }
    }

    async fn seed_customer(repo: &CustomerRepository) -> String {
        let customer = Customer {
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
        };
        repo.create(customer).await.unwrap().key()
    }

    async fn seed_order(repo: &OrderRepository, customer_key: &str) -> Order {
        let now = now_millis();
        repo.create(Order {
            id: None,
            customer_id: format!("customer:{}", customer_key),
            created_at: now,
            total: 170_000.0,
            shipping_fee: 0.0,
            status: OrderStatus::Processing,
            payment_proof: None,
            shipping_address: Some("Jl. Melati 2".into()),
            feedback: None,
            feedback_photo: None,
            checkout_at: now,
            payment_deadline_at: Some(now + shared::util::DAY_MILLIS),
            is_payment_reminder_sent: false,
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn cancelling_sends_exactly_one_customer_email() {
        let mut ctx = setup().await;
        let customer_key = seed_customer(&ctx.customers).await;
        let order = seed_order(&ctx.orders, &customer_key).await;

        let cancelled = ctx
            .lifecycle
            .change_status(&order.key(), OrderStatus::Cancelled)
            .await
            .unwrap();

        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert!(cancelled.is_payment_reminder_sent);

        let first = ctx.rx.try_recv().unwrap();
        assert!(first.subject.contains("Perubahan Status"));
        assert!(ctx.rx.try_recv().is_err(), "no further emails expected");
    }

    #[tokio::test]
    async fn same_status_is_a_noop() {
        let mut ctx = setup().await;
        let customer_key = seed_customer(&ctx.customers).await;
        let order = seed_order(&ctx.orders, &customer_key).await;

        ctx.lifecycle
            .change_status(&order.key(), OrderStatus::Processing)
            .await
            .unwrap();
        assert!(ctx.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn completion_writes_in_app_notification() {
        let mut ctx = setup().await;
        let customer_key = seed_customer(&ctx.customers).await;
        let order = seed_order(&ctx.orders, &customer_key).await;

        let completed = ctx
            .lifecycle
            .change_status(&order.key(), OrderStatus::Completed)
            .await
            .unwrap();
        assert!(completed.is_payment_reminder_sent);

        // Status email to the customer
        assert!(ctx.rx.try_recv().is_ok());

        let notifications =
            crate::db::repository::NotificationRepository::new(ctx.db.clone())
                .find_by_customer(&customer_key)
                .await
                .unwrap();
        assert!(
            notifications
                .iter()
                .any(|n| n.kind == NotificationKind::TransactionCompleted)
        );
    }

    #[tokio::test]
    async fn reminder_flag_clears_on_unpaid_statuses() {
        let ctx = setup().await;
        let customer_key = seed_customer(&ctx.customers).await;
        let order = seed_order(&ctx.orders, &customer_key).await;
        let key = order.key();

        let paid = ctx
            .lifecycle
            .change_status(&key, OrderStatus::Paid)
            .await
            .unwrap();
        assert!(paid.is_payment_reminder_sent);

        let reverted = ctx
            .lifecycle
            .change_status(&key, OrderStatus::AwaitingVerification)
            .await
            .unwrap();
        assert!(!reverted.is_payment_reminder_sent);
    }
}
