//! Map-search links regenerated from each stop's name.
//!
//! Links written by the model are often invented, so every stop block gets a
//! search link built from its cleaned display name instead.

use crate::course::{split_blocks, LINK_LABEL, PLACEHOLDER_LINK};
use crate::scraper::is_listing_url;
use lazy_static::lazy_static;
use regex::{NoExpand, Regex};
use tracing::{debug, warn};

const SEARCH_URL_PREFIX: &str = "https://map.naver.com/p/search/";

lazy_static! {
    /// A parenthetical and any emphasis markers right after it
    static ref PARENTHETICAL: Regex = Regex::new(r"\([^)]*\)\**").unwrap();
    static ref HEADER_NAME: Regex = Regex::new(r"\[코스 \d+\]\s*([^\n]+)").unwrap();
    static ref LINK_LINE: Regex = Regex::new(r"🔗 네이버 링크:([^\n]*)").unwrap();
    static ref FIELD_LINE: Regex =
        Regex::new(r"(?:🎯\s*내용|✨\s*추천 이유|⭐\s*별점|💰\s*가격대):[^\n]*").unwrap();
}

/// Strip parentheticals and emphasis markers from a display name.
///
/// `None` when nothing searchable remains.
pub fn clean_place_name(name: &str) -> Option<String> {
    let cleaned = PARENTHETICAL.replace_all(name, "");
    let cleaned = cleaned.trim().trim_matches('*').trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

/// Map search URL for a display name
pub fn search_url(name: &str) -> Option<String> {
    let query = clean_place_name(name)?;
    Some(format!("{}{}", SEARCH_URL_PREFIX, urlencoding::encode(&query)))
}

/// Replace the link line of every stop block with a search link.
///
/// Blocks without a link line get one after their last field. A block whose
/// name cannot be turned into a link keeps its link line, or gets the
/// placeholder link when it has none. With
/// `keep_listing_links`, blocks already pointing at the listing site keep
/// their link so ratings can still be fetched for them.
pub fn update_place_links(text: &str, keep_listing_links: bool) -> String {
    let blocks = split_blocks(text);
    blocks.join_with(
        blocks
            .stops
            .iter()
            .map(|block| relink_block(block, keep_listing_links)),
    )
}

fn relink_block(block: &str, keep_listing_links: bool) -> String {
    let Some(caps) = HEADER_NAME.captures(block) else {
        return block.to_string();
    };
    let name = caps[1].trim();

    if keep_listing_links {
        let existing = LINK_LINE.captures(block).map(|c| c[1].trim().to_string());
        if existing.as_deref().is_some_and(is_listing_url) {
            debug!(place = name, "Keeping listing link");
            return block.to_string();
        }
    }

    let Some(url) = search_url(name) else {
        if LINK_LINE.is_match(block) {
            warn!(place = name, "Could not build a search link, keeping existing link");
            return block.to_string();
        }
        warn!(place = name, "Could not build a search link, adding placeholder");
        return splice_link(block, PLACEHOLDER_LINK);
    };
    debug!(place = name, url = %url, "Updated link");
    splice_link(block, &url)
}

fn splice_link(block: &str, url: &str) -> String {
    let line = format!("{} {}", LINK_LABEL, url);
    if LINK_LINE.is_match(block) {
        return LINK_LINE.replace_all(block, NoExpand(&line)).into_owned();
    }

    let at = FIELD_LINE
        .find_iter(block)
        .last()
        .map(|m| m.end())
        .or_else(|| HEADER_NAME.find(block).map(|m| m.end()))
        .unwrap_or(block.len());
    format!("{}\n\n{}{}", &block[..at], line, &block[at..])
}
