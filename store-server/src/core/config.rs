use std::path::PathBuf;

/// 服务器配置 - 在线商店的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | /var/lib/barokah/store | 工作目录 |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | ADMIN_TOKEN | (无) | 管理接口令牌，未设置时管理接口关闭 |
/// | ADMIN_EMAILS | admin@barokah.com | 管理员邮件列表（逗号分隔） |
/// | MAIL_FROM | noreply@barokah.com | 发件人地址 |
/// | MAIL_GATEWAY_URL | (无) | 邮件网关地址，未设置时仅记录日志 |
/// | PAYMENT_DEADLINE_HOURS | 24 | 付款期限（小时） |
/// | FEEDBACK_REMINDER_SECS | 259200 | 反馈提醒延迟（秒，默认 3 天） |
/// | MAIL_RETRY_DELAY_SECS | 60 | 邮件重试延迟（秒） |
/// | SWEEP_INTERVAL_SECS | 300 | 订单扫描周期（秒） |
/// | DAILY_INTERVAL_SECS | 86400 | 每日任务周期（秒） |
/// | LOW_STOCK_THRESHOLD | 5 | 低库存阈值 |
/// | LOYALTY_SPEND_THRESHOLD | 5000000 | 忠诚度消费门槛 (Rp) |
/// | LOYALTY_DISCOUNT_PERCENT | 10 | 忠诚度折扣 (%) |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/store HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库、上传文件、日志
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,

    // === 管理接口 ===
    /// 管理接口共享令牌 (X-Admin-Token)
    pub admin_token: Option<String>,
    /// 管理员邮件列表
    pub admin_emails: Vec<String>,

    // === 邮件 ===
    /// 发件人地址
    pub mail_from: String,
    /// HTTP 邮件网关地址（未设置时仅记录日志）
    pub mail_gateway_url: Option<String>,
    /// 邮件发送失败后的重试延迟（秒）
    pub mail_retry_delay_secs: u64,

    // === 订单 ===
    /// 付款期限（小时）
    pub payment_deadline_hours: i64,
    /// 订单完成后反馈提醒延迟（秒）
    pub feedback_reminder_secs: u64,
    /// 过期/提醒扫描周期（秒）
    pub sweep_interval_secs: u64,
    /// 每日任务（生日、低库存报告）周期（秒）
    pub daily_interval_secs: u64,

    // === 库存与折扣 ===
    /// 低库存阈值
    pub low_stock_threshold: i64,
    /// 忠诚度消费门槛 (Rp)
    pub loyalty_spend_threshold: f64,
    /// 忠诚度折扣百分比
    pub loyalty_discount_percent: i32,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/barokah/store".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),

            admin_token: std::env::var("ADMIN_TOKEN").ok().filter(|t| !t.is_empty()),
            admin_emails: std::env::var("ADMIN_EMAILS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_else(|_| vec!["admin@barokah.com".into()]),

            mail_from: std::env::var("MAIL_FROM").unwrap_or_else(|_| "noreply@barokah.com".into()),
            mail_gateway_url: std::env::var("MAIL_GATEWAY_URL").ok().filter(|u| !u.is_empty()),
            mail_retry_delay_secs: std::env::var("MAIL_RETRY_DELAY_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(60),

            payment_deadline_hours: std::env::var("PAYMENT_DEADLINE_HOURS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(24),
            feedback_reminder_secs: std::env::var("FEEDBACK_REMINDER_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(259_200),
            sweep_interval_secs: std::env::var("SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(300),
            daily_interval_secs: std::env::var("DAILY_INTERVAL_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(86_400),

            low_stock_threshold: std::env::var("LOW_STOCK_THRESHOLD")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5),
            loyalty_spend_threshold: std::env::var("LOYALTY_SPEND_THRESHOLD")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5_000_000.0),
            loyalty_discount_percent: std::env::var("LOYALTY_DISCOUNT_PERCENT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(10),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// 数据库目录: work_dir/database
    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    /// 上传文件目录: work_dir/uploads
    pub fn uploads_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("uploads")
    }

    /// 日志目录: work_dir/logs
    pub fn logs_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    /// 确保工作目录结构存在
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.database_dir())?;
        std::fs::create_dir_all(self.uploads_dir())?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
