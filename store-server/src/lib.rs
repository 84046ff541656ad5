//! Barokah Store Server - online storefront for a ready-mix concrete retailer
//!
//! # Architecture
//!
//! - **HTTP API** (`api`): RESTful JSON endpoints per resource
//! - **Database** (`db`): embedded SurrealDB models + repositories
//! - **Auth** (`auth`): Argon2 password hashing + cookie sessions
//! - **Cart** (`cart`): in-memory session carts
//! - **Orders** (`orders`): status lifecycle + deadline sweeps
//! - **Marketing** (`marketing`): birthday greetings and loyalty discounts
//! - **Catalog** (`catalog`): restock broadcast, low-stock report
//! - **Notify** (`notify`): email outbox worker + in-app notifications
//!
//! # Module structure
//!
//! ```text
//! store-server/src/
//! ├── core/          # 配置、状态、后台任务
//! ├── auth/          # 密码、会话、extractor
//! ├── api/           # HTTP 路由和处理器
//! ├── db/            # 数据库层
//! ├── cart/          # 购物车
//! ├── orders/        # 订单生命周期
//! ├── marketing/     # 生日/忠诚度
//! ├── catalog/       # 库存通知
//! ├── notify/        # 邮件与站内通知
//! ├── services/      # 上传存储
//! └── utils/         # 工具函数
//! ```

pub mod api;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod core;
pub mod db;
pub mod marketing;
pub mod notify;
pub mod orders;
pub mod services;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentCustomer, SessionService};
pub use cart::CartStore;
pub use core::{BackgroundTasks, Config, Server, ServerState, TaskKind};
pub use notify::{Mailer, Notifier};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::init_logger_with_file;

/// Load .env and initialize logging. Call once at process start.
pub fn setup_environment() -> Result<(), Box<dyn std::error::Error>> {
    // Missing .env is fine; env vars may come from the shell
    let _ = dotenv::dotenv();

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok();
    init_logger_with_file(log_level.as_deref(), log_dir.as_deref());

    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
    ____                  __         __
   / __ )____ __________ / /______ _/ /_
  / __  / __ `/ ___/ __ \/ //_/ __ `/ __ \
 / /_/ / /_/ / /  / /_/ / ,< / /_/ / / / /
/_____/\__,_/_/   \____/_/|_|\__,_/_/ /_/
        Jaya Beton Store Server
    "#
    );
}
