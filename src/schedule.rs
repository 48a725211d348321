//! Duration estimates and the timeline built from them.

use crate::course::Stop;
use chrono::{NaiveTime, Timelike};
use std::fmt;

/// Minutes assumed when no keyword matches
pub const DEFAULT_DURATION: u32 = 60;

/// Keyword to expected minutes; the first keyword found wins
const DURATIONS: [(&str, u32); 12] = [
    ("식사", 90),
    ("디너", 90),
    ("런치", 60),
    ("브런치", 60),
    ("카페", 60),
    ("술집", 90),
    ("바", 90),
    ("산책", 45),
    ("전시", 90),
    ("영화", 120),
    ("공연", 120),
    ("쇼핑", 90),
];

pub const TABLE_HEADER: &str = "| 시간 | 활동 | 장소 | 링크 |";
pub const TABLE_RULE: &str = "|------|------|------|------|";

/// Expected minutes for an activity description
pub fn estimate_duration(activity: &str) -> u32 {
    let activity = activity.to_lowercase();
    DURATIONS
        .iter()
        .find(|(keyword, _)| activity.contains(*keyword))
        .map(|(_, minutes)| *minutes)
        .unwrap_or(DEFAULT_DURATION)
}

/// Minutes since the start day's midnight.
///
/// Does not wrap at midnight: a course running past the end of the day shows
/// as 24:30, 25:15 and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClockTime(u32);

impl ClockTime {
    pub fn from_hm(hour: u32, minute: u32) -> Self {
        Self(hour * 60 + minute)
    }

    pub fn advance(self, minutes: u32) -> Self {
        Self(self.0 + minutes)
    }
}

impl From<NaiveTime> for ClockTime {
    fn from(time: NaiveTime) -> Self {
        Self::from_hm(time.hour(), time.minute())
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

/// One row of the rendered schedule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineEntry {
    pub clock: ClockTime,
    pub activity: String,
    pub name: String,
    pub link: String,
}

/// Walk the stops in order, each starting when the previous one is expected to end
pub fn build_timeline(stops: &[Stop], start: NaiveTime) -> Vec<TimelineEntry> {
    let mut clock = ClockTime::from(start);
    stops
        .iter()
        .map(|stop| {
            let entry = TimelineEntry {
                clock,
                activity: stop.activity.clone(),
                name: stop.display_name.clone(),
                link: stop.link_or_placeholder().to_string(),
            };
            clock = clock.advance(estimate_duration(&stop.activity));
            entry
        })
        .collect()
}

/// Render as a markdown table; an empty timeline is the two header rows only
pub fn render_table(entries: &[TimelineEntry]) -> String {
    let mut lines = vec![TABLE_HEADER.to_string(), TABLE_RULE.to_string()];
    lines.extend(entries.iter().map(|e| {
        format!(
            "| {} | {} | {} | [🔗]({}) |",
            e.clock, e.activity, e.name, e.link
        )
    }));
    lines.join("\n")
}
