use chrono::{DateTime, Utc};

/// 格式化字节数
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const UNIT_SIZE: f64 = 1024.0;

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= UNIT_SIZE && unit_index < UNITS.len() - 1 {
        size /= UNIT_SIZE;
        unit_index += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_index])
}

/// 把秒数差格式化为相对时间标签
///
/// 负数（时钟偏差）按 "just now" 处理
pub fn relative_label(seconds: i64) -> String {
    if seconds < 60 {
        "just now".to_string()
    } else if seconds < 3600 {
        format!("{}m ago", seconds / 60)
    } else {
        format!("{}h ago", seconds / 3600)
    }
}

/// 格式化在线用户的最后活跃时间
///
/// 时间戳是服务端的 RFC 3339 字符串，解析失败时返回 "unknown" 而不是报错
pub fn format_last_seen(timestamp: &str) -> String {
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(parsed) => {
            let seconds = Utc::now()
                .signed_duration_since(parsed.with_timezone(&Utc))
                .num_seconds();
            relative_label(seconds)
        }
        Err(_) => "unknown".to_string(),
    }
}
