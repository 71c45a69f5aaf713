//! 日历文本解析：折行展开 -> 逻辑行 -> VEVENT 事件列表
//!
//! 纯函数流水线，同样输入必得同样输出（顺序与文件中出现顺序一致）。
//! 日期只认三种形式：YYYYMMDD（本地零点）、YYYYMMDDTHHMMSSZ（UTC）、YYYYMMDDTHHMMSS（本地浮动时间）；
//! TZID 等参数不解析，带时区参数的本地时间按本机时区近似。其余格式走通用解析，解析失败该字段记为无日期。

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::calendar::CalendarEvent;

/// 展开折行：以空格或 Tab 开头的物理行去掉该空白字符后拼到上一逻辑行
pub fn unfold_lines(text: &str) -> Vec<String> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines: Vec<String> = Vec::new();
    for raw in text.split('\n') {
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        match line.chars().next() {
            Some(c @ (' ' | '\t')) => {
                let rest = &line[c.len_utf8()..];
                match lines.last_mut() {
                    Some(prev) => prev.push_str(rest),
                    None => lines.push(rest.to_string()),
                }
            }
            _ => lines.push(line.to_string()),
        }
    }
    lines
}

/// 拆分 `NAME;PARAM=x:value`，返回（大写字段名，值）；无冒号的行返回 None
fn split_field(line: &str) -> Option<(String, &str)> {
    let colon = line.find(':')?;
    let (head, value) = (&line[..colon], &line[colon + 1..]);
    let name = head.split(';').next().unwrap_or(head).trim();
    Some((name.to_ascii_uppercase(), value))
}

/// 文本值反转义：\n \N \, \; \\
fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn local_from_naive(naive: NaiveDateTime) -> Option<DateTime<Local>> {
    Local.from_local_datetime(&naive).earliest()
}

/// 解析日历日期值；无法识别时返回 None
pub fn parse_ical_date(value: &str) -> Option<DateTime<Local>> {
    let v = value.trim();
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());

    if v.len() == 8 && all_digits(v) {
        let date = NaiveDate::parse_from_str(v, "%Y%m%d").ok()?;
        return local_from_naive(date.and_hms_opt(0, 0, 0)?);
    }
    if v.len() == 16 && v.ends_with('Z') && v.as_bytes()[8] == b'T' {
        let naive = NaiveDateTime::parse_from_str(&v[..15], "%Y%m%dT%H%M%S").ok()?;
        return Some(Utc.from_utc_datetime(&naive).with_timezone(&Local));
    }
    if v.len() == 15 && v.as_bytes()[8] == b'T' {
        let naive = NaiveDateTime::parse_from_str(v, "%Y%m%dT%H%M%S").ok()?;
        return local_from_naive(naive);
    }
    parse_generic_date(v)
}

/// 通用日期解析（RFC 3339 / RFC 2822 / 常见本地格式）
pub fn parse_generic_date(value: &str) -> Option<DateTime<Local>> {
    let v = value.trim();
    if v.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(v) {
        return Some(dt.with_timezone(&Local));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(v) {
        return Some(dt.with_timezone(&Local));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(v, fmt) {
            return local_from_naive(naive);
        }
    }
    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(v, fmt) {
            return local_from_naive(date.and_hms_opt(0, 0, 0)?);
        }
    }
    None
}

#[derive(Default)]
struct EventBuilder {
    start: Option<DateTime<Local>>,
    end: Option<DateTime<Local>>,
    summary: Option<String>,
    location: Option<String>,
    description: Option<String>,
    uid: Option<String>,
}

impl EventBuilder {
    fn apply(&mut self, name: &str, value: &str) {
        match name {
            "DTSTART" => self.start = parse_ical_date(value),
            "DTEND" => self.end = parse_ical_date(value),
            "SUMMARY" => self.summary = Some(unescape_text(value)),
            "LOCATION" => self.location = Some(unescape_text(value)),
            "DESCRIPTION" => self.description = Some(unescape_text(value)),
            "UID" => self.uid = Some(value.trim().to_string()),
            _ => {}
        }
    }

    fn build(self) -> CalendarEvent {
        CalendarEvent {
            start: self.start,
            end: self.end.or(self.start),
            summary: self.summary.unwrap_or_default(),
            location: self.location,
            description: self.description,
            uid: self.uid,
        }
    }
}

/// 解析日历文本为事件列表；VEVENT 内嵌套的组件（如 VALARM）字段不计入事件
pub fn parse_events(text: &str) -> Vec<CalendarEvent> {
    let mut events = Vec::new();
    let mut current: Option<EventBuilder> = None;
    let mut nested_depth = 0usize;

    for line in unfold_lines(text) {
        let Some((name, value)) = split_field(&line) else {
            continue;
        };
        let component = value.trim().to_ascii_uppercase();
        match (name.as_str(), current.is_some()) {
            ("BEGIN", false) if component == "VEVENT" => {
                current = Some(EventBuilder::default());
                nested_depth = 0;
            }
            ("BEGIN", true) => nested_depth += 1,
            ("END", true) if nested_depth > 0 => nested_depth -= 1,
            ("END", true) if component == "VEVENT" => {
                if let Some(builder) = current.take() {
                    events.push(builder.build());
                }
            }
            (field, true) if nested_depth == 0 => {
                if let Some(builder) = current.as_mut() {
                    builder.apply(field, value);
                }
            }
            _ => {}
        }
    }
    events
}
