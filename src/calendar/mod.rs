//! 日历区间解析：读取 RFC 5545 风格的日历文本，按时间区间与关键词查询单次事件
//!
//! 不展开 RRULE 重复规则；每个 VEVENT 只按其自身 DTSTART/DTEND 计算。

pub mod parser;
pub mod query;

use std::path::Path;

use chrono::{DateTime, Local};
use thiserror::Error;

pub use parser::{parse_events, parse_generic_date, parse_ical_date, unfold_lines};
pub use query::{overlaps, query_events, EventQuery, MAX_LIMIT, MIN_LIMIT};

#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("failed to read calendar file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// 解析得到的单次事件（只读，生命周期为一次查询）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub start: Option<DateTime<Local>>,
    /// 缺省时等于 start
    pub end: Option<DateTime<Local>>,
    pub summary: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub uid: Option<String>,
}

/// 读取并解析日历文件（非 UTF-8 字节按有损方式解码）
pub async fn load_events(path: impl AsRef<Path>) -> Result<Vec<CalendarEvent>, CalendarError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(|source| CalendarError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let text = String::from_utf8_lossy(&bytes);
    let events = parse_events(&text);
    tracing::debug!(path = %path.display(), count = events.len(), "calendar parsed");
    Ok(events)
}
