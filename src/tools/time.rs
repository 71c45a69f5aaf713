//! 当前时间工具
//!
//! 时区输入支持：常见 IANA 名称与中文城市名（固定偏移表，不处理夏令时）、UTC、
//! "+08:00" / "UTC+8" / "GMT-5" 等偏移写法。无法识别时使用默认时区并在结果中注明。

use async_trait::async_trait;
use chrono::{DateTime, Datelike, FixedOffset, Offset, Utc, Weekday};
use regex::Regex;
use serde_json::Value;

use crate::tools::schema::input_schema;
use crate::tools::Tool;

/// 时区名 -> UTC 偏移（分钟）
const ZONE_OFFSETS: &[(&str, i32)] = &[
    ("utc", 0),
    ("gmt", 0),
    ("asia/shanghai", 480),
    ("asia/chongqing", 480),
    ("asia/hong_kong", 480),
    ("asia/taipei", 480),
    ("asia/singapore", 480),
    ("asia/tokyo", 540),
    ("asia/seoul", 540),
    ("asia/kolkata", 330),
    ("asia/dubai", 240),
    ("europe/london", 0),
    ("europe/paris", 60),
    ("europe/berlin", 60),
    ("europe/moscow", 180),
    ("america/new_york", -300),
    ("america/chicago", -360),
    ("america/denver", -420),
    ("america/los_angeles", -480),
    ("australia/sydney", 600),
    ("北京", 480),
    ("上海", 480),
    ("西安", 480),
    ("香港", 480),
    ("台北", 480),
    ("东京", 540),
    ("首尔", 540),
    ("伦敦", 0),
    ("巴黎", 60),
    ("纽约", -300),
    ("洛杉矶", -480),
];

fn offset_regex() -> Option<&'static Regex> {
    static RE: std::sync::OnceLock<Option<Regex>> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?i:utc|gmt)?\s*([+-])(\d{1,2})(?::?(\d{2}))?$").ok())
        .as_ref()
}

/// 解析时区输入为（展示名, 偏移）
pub fn parse_timezone(input: &str) -> Option<(String, FixedOffset)> {
    let raw = input.trim();
    let key = raw.to_lowercase();
    if let Some((_, minutes)) = ZONE_OFFSETS.iter().find(|(name, _)| *name == key) {
        return FixedOffset::east_opt(minutes * 60).map(|o| (raw.to_string(), o));
    }
    let caps = offset_regex()?.captures(raw)?;
    let sign = if &caps[1] == "-" { -1 } else { 1 };
    let hours: i32 = caps[2].parse().ok()?;
    let minutes: i32 = caps.get(3).map_or(Ok(0), |m| m.as_str().parse()).ok()?;
    if hours > 14 || minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).map(|o| (raw.to_string(), o))
}

fn weekday_cn(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "星期一",
        Weekday::Tue => "星期二",
        Weekday::Wed => "星期三",
        Weekday::Thu => "星期四",
        Weekday::Fri => "星期五",
        Weekday::Sat => "星期六",
        Weekday::Sun => "星期日",
    }
}

/// 在给定 UTC 时刻按时区输入格式化
pub fn format_time_at(now: DateTime<Utc>, input: &str, default_timezone: &str) -> String {
    let (label, offset, note) = match parse_timezone(input) {
        Some((label, offset)) => (label, offset, None),
        None => {
            let (label, offset) = parse_timezone(default_timezone)
                .unwrap_or_else(|| ("UTC".to_string(), Utc.fix()));
            let note = (!input.trim().is_empty())
                .then(|| format!("（无法识别时区「{}」，已使用 {}）", input.trim(), label));
            (label, offset, note)
        }
    };
    let local = now.with_timezone(&offset);
    format!(
        "{} ({}) {} (UTC{}){}",
        local.format("%Y-%m-%d %H:%M:%S"),
        weekday_cn(local.weekday()),
        label,
        offset,
        note.unwrap_or_default()
    )
}

pub struct CurrentTimeTool {
    default_timezone: String,
}

impl CurrentTimeTool {
    pub fn new(default_timezone: impl Into<String>) -> Self {
        Self {
            default_timezone: default_timezone.into(),
        }
    }
}

#[async_trait]
impl Tool for CurrentTimeTool {
    fn name(&self) -> &str {
        "get_current_time"
    }

    fn description(&self) -> &str {
        "获取当前日期、时间与星期。可选输入时区（如 Asia/Shanghai、UTC+8、东京）；为空时使用默认时区。"
    }

    fn parameters_schema(&self) -> Value {
        input_schema("时区，可为空")
    }

    async fn invoke(&self, input: &str) -> String {
        format_time_at(Utc::now(), input, &self.default_timezone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn noon_utc() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 4, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_timezone_forms() {
        assert_eq!(parse_timezone("Asia/Shanghai").unwrap().1.local_minus_utc(), 8 * 3600);
        assert_eq!(parse_timezone("UTC+8").unwrap().1.local_minus_utc(), 8 * 3600);
        assert_eq!(parse_timezone("+05:30").unwrap().1.local_minus_utc(), 5 * 3600 + 1800);
        assert_eq!(parse_timezone("GMT-5").unwrap().1.local_minus_utc(), -5 * 3600);
        assert_eq!(parse_timezone("东京").unwrap().1.local_minus_utc(), 9 * 3600);
        assert!(parse_timezone("Mars/Olympus").is_none());
        assert!(parse_timezone("+25").is_none());
    }

    #[test]
    fn test_format_default_timezone() {
        let text = format_time_at(noon_utc(), "", "Asia/Shanghai");
        assert_eq!(text, "2026-01-01 12:00:00 (星期四) Asia/Shanghai (UTC+08:00)");
    }

    #[test]
    fn test_format_unknown_timezone_notes_fallback() {
        let text = format_time_at(noon_utc(), "Mars/Olympus", "Asia/Shanghai");
        assert!(text.starts_with("2026-01-01 12:00:00"));
        assert!(text.contains("无法识别时区「Mars/Olympus」"));
    }

    #[test]
    fn test_format_explicit_timezone() {
        let text = format_time_at(noon_utc(), "America/New_York", "Asia/Shanghai");
        assert!(text.starts_with("2025-12-31 23:00:00 (星期三) America/New_York"));
    }
}
