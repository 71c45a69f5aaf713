//! 日历查询工具 get_calendar_events
//!
//! 输入为 JSON {start?, end?, keyword?, limit?}；非 JSON 文本视为关键词。
//! 未配置日历路径时直接返回配置提示，不读任何文件。

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, NaiveDate};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use crate::calendar::{load_events, parse_generic_date, query_events, CalendarEvent, EventQuery};
use crate::tools::schema::schema_of;
use crate::tools::Tool;

pub const CALENDAR_NOT_CONFIGURED: &str =
    "未配置日历文件路径，请设置环境变量 CALENDAR_ICS_PATH（或 WREN__TOOLS__CALENDAR_PATH）后重试。";

const DEFAULT_WINDOW_DAYS: i64 = 7;

fn is_date_only(value: &str) -> bool {
    ["%Y-%m-%d", "%Y/%m/%d"]
        .iter()
        .any(|fmt| NaiveDate::parse_from_str(value, fmt).is_ok())
}

/// 日历查询参数
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct CalendarArgs {
    /// 起始时间（RFC3339 或 YYYY-MM-DD），默认当前时刻
    #[serde(default)]
    pub start: Option<String>,
    /// 结束时间（RFC3339 或 YYYY-MM-DD，只写日期时包含当天），默认起始后 7 天
    #[serde(default)]
    pub end: Option<String>,
    /// 关键词，匹配标题、地点、描述
    #[serde(default)]
    pub keyword: Option<String>,
    /// 返回条数上限，1 到 50，默认 10
    #[serde(default)]
    pub limit: Option<i64>,
}

impl CalendarArgs {
    pub fn parse(input: &str) -> Result<Self, String> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(Self::default());
        }
        if input.starts_with('{') {
            return serde_json::from_str(input).map_err(|e| format!("参数格式错误：{e}"));
        }
        Ok(Self {
            keyword: Some(input.to_string()),
            ..Self::default()
        })
    }

    /// 以 now 为基准组装查询
    pub fn to_query(&self, now: DateTime<Local>) -> Result<EventQuery, String> {
        let start = match self.start.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => parse_generic_date(s).ok_or_else(|| format!("无法解析开始时间「{s}」"))?,
            None => now,
        };
        let end = match self.end.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => {
                let end = parse_generic_date(s).ok_or_else(|| format!("无法解析结束时间「{s}」"))?;
                // 只有日期的结束时间包含当天
                let end = if is_date_only(s) { end + Duration::days(1) } else { end };
                if end <= start {
                    start + Duration::days(1)
                } else {
                    end
                }
            }
            None => start + Duration::days(DEFAULT_WINDOW_DAYS),
        };
        let mut query = EventQuery::new(start, end);
        if let Some(keyword) = &self.keyword {
            query = query.with_keyword(keyword.clone());
        }
        if let Some(limit) = self.limit {
            query = query.with_limit(limit.max(0) as usize);
        }
        Ok(query)
    }
}

fn format_event(event: &CalendarEvent) -> String {
    let when = match (event.start, event.end) {
        (Some(s), Some(e)) if e != s => {
            format!("{} ~ {}", s.format("%Y-%m-%d %H:%M"), e.format("%Y-%m-%d %H:%M"))
        }
        (Some(s), _) => s.format("%Y-%m-%d %H:%M").to_string(),
        (None, _) => "时间未知".to_string(),
    };
    let mut line = format!("- {when} {}", event.summary);
    if let Some(loc) = event.location.as_deref().filter(|l| !l.is_empty()) {
        line.push_str(&format!(" @ {loc}"));
    }
    line
}

pub fn format_events(events: &[CalendarEvent], query: &EventQuery) -> String {
    let range = format!(
        "{} 至 {}",
        query.start.format("%Y-%m-%d %H:%M"),
        query.end.format("%Y-%m-%d %H:%M")
    );
    if events.is_empty() {
        return format!("{range} 没有日程。");
    }
    let mut out = format!("{range} 共 {} 条日程：", events.len());
    for e in events {
        out.push('\n');
        out.push_str(&format_event(e));
    }
    out
}

pub struct CalendarTool {
    path: Option<PathBuf>,
}

impl CalendarTool {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path: path.filter(|p| !p.as_os_str().is_empty()),
        }
    }

    /// 以指定时刻为“现在”执行查询
    pub async fn query_with_now(&self, input: &str, now: DateTime<Local>) -> String {
        let Some(path) = &self.path else {
            return CALENDAR_NOT_CONFIGURED.to_string();
        };
        let query = match CalendarArgs::parse(input).and_then(|args| args.to_query(now)) {
            Ok(q) => q,
            Err(e) => return format!("日历查询失败：{e}"),
        };
        let events = match load_events(path).await {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!(error = %e, "get_calendar_events failed");
                return format!("日历查询失败：{e}");
            }
        };
        let hits = query_events(&events, &query);
        format_events(&hits, &query)
    }
}

#[async_trait]
impl Tool for CalendarTool {
    fn name(&self) -> &str {
        "get_calendar_events"
    }

    fn description(&self) -> &str {
        "查询本地日历中的日程。参数 start/end 为 RFC3339 或 YYYY-MM-DD（默认从现在起 7 天），keyword 匹配标题/地点/描述，limit 为条数上限（1-50，默认 10）。"
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<CalendarArgs>()
    }

    async fn invoke(&self, input: &str) -> String {
        self.query_with_now(input, Local::now()).await
    }
}
