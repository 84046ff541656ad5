//! 服务器状态
//!
//! 所有 handler 和后台任务共享的单例引用。`Clone` 只是浅拷贝
//! （数据库句柄和 Arc 字段），传给 axum `with_state` 成本极低。

use std::sync::{Arc, Mutex};
use std::time::Duration;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tokio::sync::mpsc;

use shared::EmailMessage;

use crate::auth::SessionService;
use crate::cart::CartStore;
use crate::catalog::LowStockReporter;
use crate::core::{BackgroundTasks, Config, TaskKind};
use crate::db::DbService;
use crate::marketing::BirthdayScheduler;
use crate::notify::{GatewayTransport, LogTransport, MailTransport, MailWorker, Mailer, Notifier};
use crate::orders::{DeadlineSweeper, OrderLifecycle};
use crate::services::UploadStorage;
use crate::utils::AppError;

/// 邮件 outbox 队列容量
const MAIL_OUTBOX_CAPACITY: usize = 256;

/// 服务器状态 - 持有所有服务的共享引用
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项（不可变） |
/// | db | 嵌入式数据库 (SurrealDB) |
/// | sessions | 内存会话存储 |
/// | carts | 会话购物车 |
/// | mailer | 邮件 outbox 发送端 |
/// | notifier | 通知门面 |
/// | lifecycle | 订单状态机 |
/// | storage | 上传文件存储 |
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 嵌入式数据库 (SurrealDB)
    pub db: Surreal<Db>,
    /// 会话存储
    pub sessions: Arc<SessionService>,
    /// 购物车存储
    pub carts: Arc<CartStore>,
    /// 邮件 outbox 发送端
    pub mailer: Mailer,
    /// 通知门面
    pub notifier: Notifier,
    /// 订单生命周期
    pub lifecycle: OrderLifecycle,
    /// 上传文件存储
    pub storage: UploadStorage,
    /// 邮件 outbox 接收端，启动后台任务时被取走
    outbox_rx: Arc<Mutex<Option<mpsc::Receiver<EmailMessage>>>>,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 按顺序初始化：工作目录结构 → 数据库 (work_dir/database/store.db)
    /// → 会话/购物车/邮件/通知服务。
    ///
    /// # Panics
    ///
    /// 工作目录或数据库初始化失败时 panic
    pub async fn initialize(config: &Config) -> Self {
        config
            .ensure_work_dir_structure()
            .expect("Failed to create work directory structure");

        let db_path = config.database_dir().join("store.db");
        let db_service = DbService::open(&db_path.to_string_lossy())
            .await
            .expect("Failed to initialize database");

        Self::with_db(config.clone(), db_service.db)
    }

    /// 初始化内存数据库状态（测试、本地试验）
    pub async fn initialize_in_memory(config: Config) -> Result<Self, AppError> {
        let db_service = DbService::open_in_memory().await?;
        Ok(Self::with_db(config, db_service.db))
    }

    /// 用现成的数据库句柄组装状态
    pub fn with_db(config: Config, db: Surreal<Db>) -> Self {
        let (mailer, outbox_rx) = Mailer::new(MAIL_OUTBOX_CAPACITY);
        let notifier = Notifier::new(mailer.clone(), db.clone(), &config);
        let lifecycle = OrderLifecycle::new(db.clone(), notifier.clone());
        let storage = UploadStorage::new(config.uploads_dir());

        Self {
            config,
            db,
            sessions: Arc::new(SessionService::new()),
            carts: Arc::new(CartStore::new()),
            mailer,
            notifier,
            lifecycle,
            storage,
            outbox_rx: Arc::new(Mutex::new(Some(outbox_rx))),
        }
    }

    /// 启动后台任务
    ///
    /// 必须在 `Server::run()` 之前调用。启动的任务：
    ///
    /// - `mail_worker` (Worker): 邮件投递（失败重试一次）
    /// - `deadline_sweeper` (Periodic): 付款超时取消 + 付款提醒
    /// - `birthday_scheduler` (Periodic): 生日问候 + 忠诚度折扣
    /// - `low_stock_reporter` (Periodic): 每日低库存报告
    pub fn start_background_tasks(&self) -> BackgroundTasks {
        let mut tasks = BackgroundTasks::new();

        // Mail worker consumes the outbox receiver exactly once
        let outbox_rx = self.outbox_rx.lock().ok().and_then(|mut rx| rx.take());
        match outbox_rx {
            Some(rx) => {
                let transport: Arc<dyn MailTransport> = match &self.config.mail_gateway_url {
                    Some(url) => {
                        tracing::info!(gateway = %url, "Mail delivery via HTTP gateway");
                        Arc::new(GatewayTransport::new(
                            url.clone(),
                            self.config.mail_from.clone(),
                        ))
                    }
                    None => {
                        tracing::warn!("MAIL_GATEWAY_URL not set, emails are logged only");
                        Arc::new(LogTransport)
                    }
                };
                let worker = MailWorker::new(
                    transport,
                    Duration::from_secs(self.config.mail_retry_delay_secs),
                );
                let shutdown = tasks.shutdown_token();
                tasks.spawn("mail_worker", TaskKind::Worker, async move {
                    worker.run(rx, shutdown).await;
                });
            }
            None => {
                tracing::warn!("Mail outbox receiver already taken, mail worker not started");
            }
        }

        let sweeper = DeadlineSweeper::new(
            self.db.clone(),
            self.lifecycle.clone(),
            self.notifier.clone(),
            Duration::from_secs(self.config.sweep_interval_secs),
            tasks.shutdown_token(),
        );
        tasks.spawn("deadline_sweeper", TaskKind::Periodic, sweeper.run());

        let birthdays = BirthdayScheduler::new(
            self.db.clone(),
            self.notifier.clone(),
            self.config.loyalty_spend_threshold,
            self.config.loyalty_discount_percent,
            Duration::from_secs(self.config.daily_interval_secs),
            tasks.shutdown_token(),
        );
        tasks.spawn("birthday_scheduler", TaskKind::Periodic, birthdays.run());

        let low_stock = LowStockReporter::new(
            self.db.clone(),
            self.notifier.clone(),
            self.config.low_stock_threshold,
            Duration::from_secs(self.config.daily_interval_secs),
            tasks.shutdown_token(),
        );
        tasks.spawn("low_stock_reporter", TaskKind::Periodic, low_stock.run());

        tasks.log_summary();
        tasks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn background_tasks_start_and_shut_down() {
        let config = Config::with_overrides("/tmp/store-state-test", 0);
        let state = ServerState::initialize_in_memory(config).await.unwrap();

        let tasks = state.start_background_tasks();
        // mail worker + 3 periodic tasks
        assert_eq!(tasks.len(), 4);
        assert_eq!(tasks.count_by_kind(), (0, 1, 3));
        tasks.shutdown().await;
    }

    #[tokio::test]
    async fn outbox_receiver_is_taken_only_once() {
        let config = Config::with_overrides("/tmp/store-state-test2", 0);
        let state = ServerState::initialize_in_memory(config).await.unwrap();

        let first = state.start_background_tasks();
        let second = state.start_background_tasks();
        // Second call must not spawn another mail worker
        assert_eq!(second.count_by_kind(), (0, 0, 3));

        first.shutdown().await;
        second.shutdown().await;
    }
}
