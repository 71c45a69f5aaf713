//! 区间与关键词查询
//!
//! 半开区间 [start, end) 严格重叠：event.start < range.end && range.start < event.end。
//! 结果按开始时间升序（稳定排序，同刻保持文件顺序），数量上限夹在 [1, 50]。

use chrono::{DateTime, Local};

use crate::calendar::CalendarEvent;

pub const MIN_LIMIT: usize = 1;
pub const MAX_LIMIT: usize = 50;

#[derive(Debug, Clone)]
pub struct EventQuery {
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
    /// 大小写不敏感，匹配 summary + location + description
    pub keyword: Option<String>,
    pub limit: usize,
}

impl EventQuery {
    pub fn new(start: DateTime<Local>, end: DateTime<Local>) -> Self {
        Self {
            start,
            end,
            keyword: None,
            limit: 10,
        }
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn clamped_limit(&self) -> usize {
        self.limit.clamp(MIN_LIMIT, MAX_LIMIT)
    }
}

/// 事件区间是否与查询区间严格重叠；缺少开始时间的事件不参与区间查询
pub fn overlaps(event: &CalendarEvent, start: DateTime<Local>, end: DateTime<Local>) -> bool {
    let Some(ev_start) = event.start else {
        return false;
    };
    let ev_end = event.end.unwrap_or(ev_start);
    ev_start < end && start < ev_end
}

fn matches_keyword(event: &CalendarEvent, keyword: &str) -> bool {
    let haystack = format!(
        "{} {} {}",
        event.summary,
        event.location.as_deref().unwrap_or(""),
        event.description.as_deref().unwrap_or("")
    )
    .to_lowercase();
    haystack.contains(&keyword.to_lowercase())
}

pub fn query_events(events: &[CalendarEvent], query: &EventQuery) -> Vec<CalendarEvent> {
    let keyword = query
        .keyword
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty());
    let mut hits: Vec<CalendarEvent> = events
        .iter()
        .filter(|e| overlaps(e, query.start, query.end))
        .filter(|e| keyword.map_or(true, |k| matches_keyword(e, k)))
        .cloned()
        .collect();
    hits.sort_by_key(|e| e.start);
    hits.truncate(query.clamped_limit());
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 1, 1, h, m, 0).unwrap()
    }

    fn event(summary: &str, start: DateTime<Local>, end: Option<DateTime<Local>>) -> CalendarEvent {
        CalendarEvent {
            start: Some(start),
            end: end.or(Some(start)),
            summary: summary.to_string(),
            location: None,
            description: None,
            uid: None,
        }
    }

    #[test]
    fn test_partial_overlap_included_adjacent_excluded() {
        let e = event("standup", at(9, 0), Some(at(10, 0)));
        assert!(overlaps(&e, at(8, 0), at(9, 30)));
        assert!(!overlaps(&e, at(10, 0), at(11, 0)));
        assert!(!overlaps(&e, at(7, 0), at(9, 0)));
        assert!(overlaps(&e, at(9, 15), at(9, 45)));
    }

    #[test]
    fn test_point_event_inside_range() {
        let e = event("提醒", at(9, 0), None);
        assert!(overlaps(&e, at(8, 0), at(10, 0)));
        assert!(!overlaps(&e, at(9, 0), at(10, 0)));
    }

    #[test]
    fn test_keyword_case_insensitive_over_all_text_fields() {
        let mut e = event("Sync", at(9, 0), Some(at(10, 0)));
        e.location = Some("Room B".into());
        e.description = Some("讨论预算".into());
        let events = vec![e, event("Lunch", at(12, 0), Some(at(13, 0)))];
        let q = EventQuery::new(at(0, 0), at(23, 0)).with_keyword("ROOM b");
        assert_eq!(query_events(&events, &q).len(), 1);
        let q = EventQuery::new(at(0, 0), at(23, 0)).with_keyword("预算");
        assert_eq!(query_events(&events, &q)[0].summary, "Sync");
        let q = EventQuery::new(at(0, 0), at(23, 0)).with_keyword("  ");
        assert_eq!(query_events(&events, &q).len(), 2);
    }

    #[test]
    fn test_sorted_and_limit_clamped() {
        let events: Vec<CalendarEvent> = (0..60)
            .rev()
            .map(|i| event(&format!("e{i}"), at(0, 0) + chrono::Duration::minutes(i), None))
            .collect();
        let q = EventQuery::new(at(0, 0) - chrono::Duration::minutes(1), at(23, 0)).with_limit(0);
        let hits = query_events(&events, &q);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].summary, "e0");
        let q = q.with_limit(500);
        let hits = query_events(&events, &q);
        assert_eq!(hits.len(), 50);
        assert!(hits.windows(2).all(|w| w[0].start <= w[1].start));
    }

    #[test]
    fn test_events_without_start_excluded() {
        let mut e = event("x", at(9, 0), None);
        e.start = None;
        e.end = None;
        let q = EventQuery::new(at(0, 0), at(23, 0));
        assert!(query_events(&[e], &q).is_empty());
    }
}
