//! Course stops and the extraction grammar over the model's itinerary text.
//!
//! The itinerary text is the unit of truth. Stops are a view that can be
//! re-extracted from it at any time; the only edits made to the text are the
//! link and rating splices in [`crate::links`] and [`crate::ratings`].
//!
//! A stop block looks like:
//!
//! ```text
//! ### **[코스 1] 가게명**
//! 🎯 내용: 이탈리안 파인다이닝
//! ✨ 추천 이유: ...
//! ⭐ 별점: 4.5/5.0 (1,203)
//! 💰 가격대: 1인 5만원
//! 🔗 네이버 링크: https://map.naver.com/p/search/...
//! ```

use lazy_static::lazy_static;
use regex::Regex;
use tracing::warn;

/// Link rendered for stops without a usable link, and spliced into blocks
/// whose place name cannot be searched
pub const PLACEHOLDER_LINK: &str = "#";

pub const ACTIVITY_LABEL: &str = "🎯 내용:";
pub const REASON_LABEL: &str = "✨ 추천 이유:";
pub const RATING_LABEL: &str = "⭐ 별점:";
pub const PRICE_LABEL: &str = "💰 가격대:";
pub const LINK_LABEL: &str = "🔗 네이버 링크:";

lazy_static! {
    /// Start of a stop block, used to split the text
    static ref BLOCK_HEADER: Regex = Regex::new(r"### \*\*\[코스 \d+\]").unwrap();

    /// Header, name, activity and link lines, with anything in between
    static ref FULL_STOP: Regex = Regex::new(
        r"(?s)\[코스 (\d+)\]\s*([^\n]+).*?🎯\s*내용:\s*([^\n]+).*?🔗\s*네이버 링크:\s*([^\n]+)"
    ).unwrap();

    /// Fallback for a block without a link line
    static ref LINKLESS_STOP: Regex = Regex::new(
        r"(?s)\[코스 (\d+)\]\s*([^\n]+).*?🎯\s*내용:\s*([^\n]+)"
    ).unwrap();

    static ref HEADER_MARK: Regex = Regex::new(r"\[코스 \d+\]").unwrap();
    static ref REASON_LINE: Regex = Regex::new(r"✨\s*추천 이유:\s*([^\n]+)").unwrap();
    static ref RATING_LINE: Regex = Regex::new(r"⭐\s*별점:\s*([^\n]+)").unwrap();
    static ref PRICE_LINE: Regex = Regex::new(r"💰\s*가격대:\s*([^\n]+)").unwrap();
}

/// One recommended venue or activity within a course
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stop {
    /// 1-based position, as numbered by the model
    pub sequence_index: u32,
    pub display_name: String,
    pub activity: String,
    pub reason: Option<String>,
    pub rating: Option<String>,
    pub price: Option<String>,
    pub link: Option<String>,
}

impl Stop {
    pub fn link_or_placeholder(&self) -> &str {
        self.link.as_deref().unwrap_or(PLACEHOLDER_LINK)
    }

    /// Serialize the stop back into the block format it was parsed from
    pub fn to_block(&self) -> String {
        let mut block = format!(
            "### **[코스 {}] {}**\n\n{} {}\n\n",
            self.sequence_index, self.display_name, ACTIVITY_LABEL, self.activity
        );
        for (label, value) in [
            (REASON_LABEL, &self.reason),
            (RATING_LABEL, &self.rating),
            (PRICE_LABEL, &self.price),
            (LINK_LABEL, &self.link),
        ] {
            if let Some(value) = value {
                block.push_str(&format!("{} {}\n\n", label, value));
            }
        }
        block
    }
}

/// Model output for one turn; `stops` is derived from `text` on demand
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Itinerary {
    pub text: String,
}

impl Itinerary {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn stops(&self) -> Vec<Stop> {
        parse_stops(&self.text)
    }
}

/// Text split at stop headers: whatever precedes the first header, then one
/// slice per stop running up to the next header or the end of the text.
#[derive(Debug, PartialEq, Eq)]
pub struct Blocks<'a> {
    pub preamble: &'a str,
    pub stops: Vec<&'a str>,
}

impl Blocks<'_> {
    /// Reassemble after each stop block has been transformed
    pub fn join_with(&self, stops: impl IntoIterator<Item = String>) -> String {
        let mut out = self.preamble.to_string();
        for block in stops {
            out.push_str(&block);
        }
        out
    }
}

pub fn split_blocks(text: &str) -> Blocks<'_> {
    let starts: Vec<usize> = BLOCK_HEADER.find_iter(text).map(|m| m.start()).collect();
    let Some(&first) = starts.first() else {
        return Blocks {
            preamble: text,
            stops: Vec::new(),
        };
    };

    let stops = starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(text.len());
            &text[start..end]
        })
        .collect();

    Blocks {
        preamble: &text[..first],
        stops,
    }
}

/// Extract stops from itinerary text.
///
/// Each stop is read from its own slice, from one `[코스 N]` mark up to the
/// next, so a block missing a line never borrows it from its neighbour. The
/// full pattern (header, name, activity, link) is tried first and the
/// link-less one second, so blocks with and without link lines can be mixed.
/// A course number that does not increase is renumbered after the previous
/// stop. Text without any recognisable stop yields an empty list.
pub fn parse_stops(text: &str) -> Vec<Stop> {
    let mut stops: Vec<Stop> = Vec::new();
    for block in stop_slices(text) {
        let Some(mut stop) = parse_block(block) else {
            continue;
        };
        if let Some(previous) = stops.last() {
            if stop.sequence_index <= previous.sequence_index {
                let renumbered = previous.sequence_index + 1;
                warn!(
                    place = %stop.display_name,
                    found = stop.sequence_index,
                    renumbered,
                    "Course number out of order"
                );
                stop.sequence_index = renumbered;
            }
        }
        stops.push(stop);
    }
    stops
}

/// One slice per `[코스 N]` mark, whether or not the header carries emphasis
fn stop_slices(text: &str) -> Vec<&str> {
    let starts: Vec<usize> = HEADER_MARK.find_iter(text).map(|m| m.start()).collect();
    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| &text[start..starts.get(i + 1).copied().unwrap_or(text.len())])
        .collect()
}

fn parse_block(block: &str) -> Option<Stop> {
    let (caps, link) = match FULL_STOP.captures(block) {
        Some(caps) => {
            let link = caps[4].trim().to_string();
            let link = (link != PLACEHOLDER_LINK).then_some(link);
            (caps, link)
        }
        None => (LINKLESS_STOP.captures(block)?, None),
    };

    let display_name = clean_name(&caps[2]);
    if display_name.is_empty() {
        return None;
    }
    Some(Stop {
        sequence_index: caps[1].parse().ok()?,
        display_name,
        activity: caps[3].trim().to_string(),
        reason: field(&REASON_LINE, block),
        rating: field(&RATING_LINE, block),
        price: field(&PRICE_LINE, block),
        link,
    })
}

fn field(pattern: &Regex, block: &str) -> Option<String> {
    pattern
        .captures(block)
        .map(|caps| caps[1].trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Names arrive wrapped in markdown emphasis, e.g. `가게명**`
fn clean_name(raw: &str) -> String {
    raw.trim().trim_matches('*').trim().to_string()
}
