/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Milliseconds in one hour.
pub const HOUR_MILLIS: i64 = 60 * 60 * 1000;

/// Milliseconds in one day.
pub const DAY_MILLIS: i64 = 24 * HOUR_MILLIS;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_constants_line_up() {
        assert_eq!(DAY_MILLIS, 24 * HOUR_MILLIS);
        assert_eq!(HOUR_MILLIS, 3_600_000);
    }
}
