//! Date and time inference from free-text requests.
//!
//! Rules are tried in a fixed order and every rule that matches overwrites the
//! result of the ones before it, so the last matching rule in the list wins,
//! not the phrase that appears last in the text.

use chrono::{Datelike, Duration, Local, NaiveDate, NaiveTime};
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::fmt;

/// Start hour used when the request names no time
pub const DEFAULT_START_HOUR: u32 = 17;

/// Markers that push a bare hour below 12 into the afternoon
const AFTERNOON_MARKERS: [&str; 3] = ["오후", "저녁", "밤"];

const WEEKDAYS: [&str; 7] = ["월", "화", "수", "목", "금", "토", "일"];

/// The moment an outing is planned for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanTime {
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl fmt::Display for PlanTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date.format("%Y-%m-%d"), self.time.format("%H:%M"))
    }
}

#[derive(Debug, Clone, Copy)]
enum DateKind {
    /// `[YYYY년] M월 D일`
    MonthDay,
    /// Fixed offset from today
    Offset(i64),
    /// "다음주 X요일": always a week ahead before aligning the weekday
    NextWeek,
    /// "이번주 X요일": the next occurrence, never today
    ThisWeek,
}

#[derive(Debug, Clone, Copy)]
enum TimeKind {
    /// Bare clock value, moved to the afternoon if a marker appears anywhere
    Clock,
    /// Morning phrase: hour taken literally
    Morning,
    /// Afternoon or evening phrase: hour + 12
    Evening,
}

struct Rule<K> {
    pattern: Regex,
    kind: K,
}

impl<K> Rule<K> {
    fn new(pattern: &str, kind: K) -> Self {
        Self {
            pattern: Regex::new(pattern).unwrap(),
            kind,
        }
    }
}

lazy_static! {
    static ref DATE_RULES: Vec<Rule<DateKind>> = vec![
        Rule::new(r"(?:(\d{4})년\s*)?(\d{1,2})월\s*(\d{1,2})일", DateKind::MonthDay),
        Rule::new("오늘", DateKind::Offset(0)),
        Rule::new("내일", DateKind::Offset(1)),
        Rule::new("모레", DateKind::Offset(2)),
        Rule::new(r"다음\s*주\s*(월|화|수|목|금|토|일)요일", DateKind::NextWeek),
        Rule::new(r"이번\s*주\s*(월|화|수|목|금|토|일)요일", DateKind::ThisWeek),
    ];

    static ref TIME_RULES: Vec<Rule<TimeKind>> = vec![
        Rule::new(r"(\d{1,2})시\s*(\d{1,2})?분?", TimeKind::Clock),
        Rule::new(r"(\d{1,2}):(\d{2})", TimeKind::Clock),
        Rule::new(r"(\d{1,2})[시:](\d{2})", TimeKind::Clock),
        Rule::new(r"(?:오전|아침)\s*(\d{1,2})시", TimeKind::Morning),
        Rule::new(r"(?:오후|저녁|밤)\s*(\d{1,2})시", TimeKind::Evening),
    ];
}

/// Infer the planned date and time relative to the local current date
pub fn extract(text: &str) -> PlanTime {
    extract_at(text, Local::now().date_naive())
}

/// Infer the planned date and time relative to `today`
pub fn extract_at(text: &str, today: NaiveDate) -> PlanTime {
    PlanTime {
        date: infer_date(text, today),
        time: infer_time(text),
    }
}

/// The start time alone, as used when rebuilding a timeline
pub fn start_time(text: &str) -> NaiveTime {
    infer_time(text)
}

pub fn default_start() -> NaiveTime {
    NaiveTime::from_hms_opt(DEFAULT_START_HOUR, 0, 0).unwrap_or(NaiveTime::MIN)
}

fn infer_date(text: &str, today: NaiveDate) -> NaiveDate {
    let mut date = today;
    for rule in DATE_RULES.iter() {
        let Some(caps) = rule.pattern.captures(text) else {
            continue;
        };
        if let Some(found) = resolve_date(rule.kind, &caps, today) {
            date = found;
        }
    }
    date
}

fn resolve_date(kind: DateKind, caps: &Captures<'_>, today: NaiveDate) -> Option<NaiveDate> {
    match kind {
        DateKind::MonthDay => {
            let year = match caps.get(1) {
                Some(y) => y.as_str().parse().ok()?,
                None => today.year(),
            };
            let month = caps[2].parse().ok()?;
            let day = caps[3].parse().ok()?;
            NaiveDate::from_ymd_opt(year, month, day)
        }
        DateKind::Offset(days) => Some(today + Duration::days(days)),
        DateKind::NextWeek | DateKind::ThisWeek => {
            let target = weekday_index(&caps[1])?;
            let current = today.weekday().num_days_from_monday() as i64;
            let mut days = target - current;
            match kind {
                DateKind::NextWeek => days += 7,
                _ if days <= 0 => days += 7,
                _ => {}
            }
            Some(today + Duration::days(days))
        }
    }
}

fn weekday_index(name: &str) -> Option<i64> {
    WEEKDAYS.iter().position(|d| *d == name).map(|i| i as i64)
}

fn infer_time(text: &str) -> NaiveTime {
    let mut time = default_start();
    for rule in TIME_RULES.iter() {
        let Some(caps) = rule.pattern.captures(text) else {
            continue;
        };
        if let Some(found) = resolve_time(rule.kind, &caps, text) {
            time = found;
        }
    }
    time
}

fn resolve_time(kind: TimeKind, caps: &Captures<'_>, text: &str) -> Option<NaiveTime> {
    let mut hour: u32 = caps[1].parse().ok()?;
    match kind {
        TimeKind::Morning => {}
        TimeKind::Evening => {
            if hour < 12 {
                hour += 12;
            }
        }
        TimeKind::Clock => {
            if hour < 12 && AFTERNOON_MARKERS.iter().any(|m| text.contains(m)) {
                hour += 12;
            }
        }
    }
    let minute = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    NaiveTime::from_hms_opt(hour, minute, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2026-10-19 is a Monday
    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn tomorrow_evening() {
        let plan = extract_at("내일 저녁 7시", today());
        assert_eq!(plan.date, date(2026, 10, 20));
        assert_eq!(plan.time, hm(19, 0));
    }

    #[test]
    fn defaults_when_nothing_matches() {
        let plan = extract_at("분위기 좋은 곳 추천해줘", today());
        assert_eq!(plan.date, today());
        assert_eq!(plan.time, hm(17, 0));
    }

    #[test]
    fn relative_day_literals() {
        let cases = [
            ("오늘 가고 싶어", date(2026, 10, 19)),
            ("내일 가고 싶어", date(2026, 10, 20)),
            ("모레 가고 싶어", date(2026, 10, 21)),
            ("내일모레 가고 싶어", date(2026, 10, 21)),
        ];
        for (text, expected) in cases {
            assert_eq!(extract_at(text, today()).date, expected, "{text}");
        }
    }

    #[test]
    fn weekday_phrases() {
        let cases = [
            ("다음주 금요일", date(2026, 10, 30)),
            ("다음주 월요일", date(2026, 10, 26)),
            ("이번주 토요일", date(2026, 10, 24)),
            // same weekday as today wraps to next week
            ("이번주 월요일", date(2026, 10, 26)),
        ];
        for (text, expected) in cases {
            assert_eq!(extract_at(text, today()).date, expected, "{text}");
        }

        let sunday = date(2026, 10, 25);
        assert_eq!(extract_at("이번주 금요일", sunday).date, date(2026, 10, 30));
        assert_eq!(extract_at("다음주 금요일", sunday).date, date(2026, 10, 30));
    }

    #[test]
    fn month_day_with_and_without_year() {
        assert_eq!(extract_at("3월 15일", today()).date, date(2026, 3, 15));
        assert_eq!(
            extract_at("2025년 12월 24일 저녁", today()).date,
            date(2025, 12, 24)
        );
        // impossible dates are ignored
        assert_eq!(extract_at("2월 30일", today()).date, today());
    }

    #[test]
    fn later_rule_in_list_wins_over_text_order() {
        assert_eq!(
            extract_at("내일 말고 12월 1일", today()).date,
            date(2026, 10, 20)
        );
        assert_eq!(
            extract_at("12월 1일 말고 내일", today()).date,
            date(2026, 10, 20)
        );
    }

    #[test]
    fn clock_patterns() {
        assert_eq!(extract_at("17시 30분", today()).time, hm(17, 30));
        assert_eq!(extract_at("14:30", today()).time, hm(14, 30));
        assert_eq!(extract_at("오전 11시", today()).time, hm(11, 0));
        assert_eq!(extract_at("5시에 만나", today()).time, hm(5, 0));
        assert_eq!(extract_at("오후 5시", today()).time, hm(17, 0));
        assert_eq!(extract_at("오후 12시", today()).time, hm(12, 0));
    }

    #[test]
    fn afternoon_phrase_overrides_minutes() {
        // the afternoon rule comes last and carries no minutes
        assert_eq!(extract_at("내일 오후 2시 30분", today()).time, hm(14, 0));
    }

    #[test]
    fn out_of_range_time_is_ignored() {
        assert_eq!(extract_at("25시", today()).time, hm(17, 0));
    }
}
