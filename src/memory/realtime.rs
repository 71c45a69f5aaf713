//! 实时查询分类
//!
//! 时间、天气、空气质量这类答案随时刻变化，长期记忆里的旧答案一律不可用：
//! 命中任一模式的输入既不读也不写长期记忆，迫使模型走工具。

use std::sync::OnceLock;

use regex::Regex;

/// 有序模式表（大小写不敏感），命中第一个即判定为实时查询；
/// 英文 wind / date 按整词匹配，避免 window、update 之类误判
pub const REALTIME_PATTERNS: &[&str] = &[
    r"空气质量",
    r"aqi",
    r"pm2\.?5",
    r"pm10",
    r"天气",
    r"气温",
    r"温度",
    r"降水",
    r"下雨",
    r"风速",
    r"几点",
    r"时间",
    r"今天几号",
    r"日期",
    r"air[ -]?quality",
    r"weather",
    r"temperature",
    r"precipitation",
    r"\bwind(?:s|y)?\b",
    r"what time is it",
    r"\bdates?\b",
];

fn compiled() -> &'static [(Regex, &'static str)] {
    static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        REALTIME_PATTERNS
            .iter()
            .filter_map(|p| match Regex::new(&format!("(?i){p}")) {
                Ok(re) => Some((re, *p)),
                Err(e) => {
                    tracing::error!(pattern = p, error = %e, "invalid realtime pattern");
                    None
                }
            })
            .collect()
    })
}

/// 返回第一个命中的模式（用于日志）
pub fn realtime_pattern(text: &str) -> Option<&'static str> {
    compiled()
        .iter()
        .find(|(re, _)| re.is_match(text))
        .map(|(_, p)| *p)
}

/// 输入是否属于实时查询
pub fn classify_realtime(text: &str) -> bool {
    realtime_pattern(text).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chinese_realtime_queries() {
        assert!(classify_realtime("今天空气质量怎么样"));
        assert!(classify_realtime("西安明天天气如何？"));
        assert!(classify_realtime("现在几点了"));
        assert!(classify_realtime("今天几号"));
        assert!(classify_realtime("PM2.5 多少"));
        assert!(classify_realtime("pm25 指数"));
        assert!(classify_realtime("会下雨吗"));
    }

    #[test]
    fn test_english_realtime_queries() {
        assert!(classify_realtime("What time is it in Tokyo?"));
        assert!(classify_realtime("current AQI please"));
        assert!(classify_realtime("Weather in Paris"));
        assert!(classify_realtime("what's the date today"));
        assert!(classify_realtime("how strong is the wind"));
    }

    #[test]
    fn test_wind_and_date_match_whole_words() {
        assert!(classify_realtime("Is it windy outside?"));
        assert!(classify_realtime("strong winds tonight?"));
        assert!(classify_realtime("Date?"));
        assert!(classify_realtime("which dates are holidays"));
        assert_eq!(realtime_pattern("windy"), Some(r"\bwind(?:s|y)?\b"));
        assert!(!classify_realtime("open a new window"));
        assert!(!classify_realtime("please update the README"));
        assert!(!classify_realtime("she is my candidate"));
    }

    #[test]
    fn test_non_realtime_queries() {
        assert!(!classify_realtime("给我讲讲 Rust 的所有权"));
        assert!(!classify_realtime("我最喜欢的颜色是蓝色"));
        assert!(!classify_realtime("update the window layout"));
        assert!(!classify_realtime(""));
    }

    #[test]
    fn test_first_matching_pattern_reported() {
        assert_eq!(realtime_pattern("空气质量和天气"), Some("空气质量"));
        assert_eq!(realtime_pattern("你好"), None);
    }
}
