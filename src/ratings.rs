//! Live rating enrichment for stops that link to the listing site.
//!
//! Fetches run concurrently up to a fixed limit, but request starts are spaced
//! by a shared delay so the listing site sees a steady, low request rate.
//! Blocks are reassembled by position, never by completion order.

use crate::course::{split_blocks, RATING_LABEL};
use crate::scraper::{RatingFetcher, LISTING_PREFIX};
use futures::stream::{self, StreamExt};
use lazy_static::lazy_static;
use regex::{NoExpand, Regex};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

lazy_static! {
    static ref LISTING_LINK: Regex = Regex::new(&format!(
        r"🔗 네이버 링크: ({}[^\n]+)",
        regex::escape(LISTING_PREFIX)
    ))
    .unwrap();
    static ref RATING_LINE: Regex = Regex::new(r"⭐ 별점: [^\n]+").unwrap();
}

#[derive(Debug, Clone)]
pub struct EnrichOptions {
    /// Fetches in flight at once
    pub concurrency: usize,
    /// Minimum spacing between request starts
    pub delay: Duration,
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            delay: Duration::from_secs(1),
        }
    }
}

/// Spaces request starts at least `delay` apart across all workers
struct Pacer {
    next: Mutex<Instant>,
    delay: Duration,
}

impl Pacer {
    fn new(delay: Duration) -> Self {
        Self {
            next: Mutex::new(Instant::now()),
            delay,
        }
    }

    async fn wait(&self) {
        let mut next = self.next.lock().await;
        tokio::time::sleep_until(*next).await;
        *next = Instant::now() + self.delay;
    }
}

/// Replace the rating line of every block whose listing link yields a rating.
///
/// Blocks without a listing link, or whose fetch comes back empty, are
/// returned byte for byte.
pub async fn enrich_ratings(
    text: &str,
    fetcher: &dyn RatingFetcher,
    options: &EnrichOptions,
) -> String {
    let blocks = split_blocks(text);
    let pacer = Pacer::new(options.delay);

    let enriched: Vec<String> = stream::iter(blocks.stops.iter())
        .map(|block| enrich_block(block, fetcher, &pacer))
        .buffered(options.concurrency.max(1))
        .collect()
        .await;

    blocks.join_with(enriched)
}

async fn enrich_block(block: &str, fetcher: &dyn RatingFetcher, pacer: &Pacer) -> String {
    let Some(url) = listing_link(block) else {
        return block.to_string();
    };

    pacer.wait().await;
    match fetcher.fetch_rating(&url).await {
        Some(rating) => {
            debug!(url = %url, rating = %rating, "Splicing rating");
            splice_rating(block, &rating)
        }
        None => block.to_string(),
    }
}

fn listing_link(block: &str) -> Option<String> {
    LISTING_LINK
        .captures(block)
        .map(|caps| caps[1].trim().to_string())
}

fn splice_rating(block: &str, rating: &str) -> String {
    let line = format!("{} {}", RATING_LABEL, rating);
    RATING_LINE.replace_all(block, NoExpand(&line)).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;

    struct FakeFetcher {
        ratings: HashMap<String, String>,
        latency: HashMap<String, Duration>,
        calls: StdMutex<Vec<String>>,
    }

    impl FakeFetcher {
        fn new(ratings: &[(&str, &str)]) -> Self {
            Self {
                ratings: ratings
                    .iter()
                    .map(|(u, r)| (u.to_string(), r.to_string()))
                    .collect(),
                latency: HashMap::new(),
                calls: StdMutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl RatingFetcher for FakeFetcher {
        async fn fetch_rating(&self, url: &str) -> Option<String> {
            self.calls.lock().unwrap().push(url.to_string());
            if let Some(latency) = self.latency.get(url) {
                tokio::time::sleep(*latency).await;
            }
            self.ratings.get(url).cloned()
        }
    }

    fn block(index: u32, link: &str) -> String {
        format!(
            "### **[코스 {index}] 가게{index}**\n🎯 내용: 카페\n⭐ 별점: 모름\n🔗 네이버 링크: {link}\n\n"
        )
    }

    fn fast() -> EnrichOptions {
        EnrichOptions {
            concurrency: 4,
            delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn replaces_rating_for_listing_links() {
        let text = format!("인사말\n{}", block(1, "https://place.naver.com/restaurant/1"));
        let fetcher = FakeFetcher::new(&[("https://place.naver.com/restaurant/1", "4.5/5.0 (1,203)")]);

        let enriched = enrich_ratings(&text, &fetcher, &fast()).await;
        assert!(enriched.starts_with("인사말\n"));
        assert!(enriched.contains("⭐ 별점: 4.5/5.0 (1,203)\n"));
        assert!(!enriched.contains("모름"));
    }

    #[tokio::test]
    async fn other_blocks_are_byte_identical() {
        let text = [
            block(1, "https://map.naver.com/p/search/abc"),
            block(2, "[네이버 플레이스 URL]"),
            "### **[코스 3] 링크 없음**\n🎯 내용: 산책\n".to_string(),
            block(4, "https://place.naver.com/restaurant/404"),
        ]
        .concat();
        let fetcher = FakeFetcher::new(&[]);

        let enriched = enrich_ratings(&text, &fetcher, &fast()).await;
        assert_eq!(enriched, text);
        assert_eq!(
            *fetcher.calls.lock().unwrap(),
            vec!["https://place.naver.com/restaurant/404".to_string()]
        );
    }

    #[tokio::test]
    async fn order_follows_input_not_completion() {
        let slow = "https://place.naver.com/restaurant/slow";
        let quick = "https://place.naver.com/restaurant/quick";
        let mut fetcher = FakeFetcher::new(&[(slow, "3.0/5.0 (1)"), (quick, "5.0/5.0 (2)")]);
        fetcher.latency.insert(slow.to_string(), Duration::from_millis(50));

        let text = [block(1, slow), block(2, quick)].concat();
        let enriched = enrich_ratings(&text, &fetcher, &fast()).await;

        let first = enriched.find("3.0/5.0 (1)").unwrap();
        let second = enriched.find("5.0/5.0 (2)").unwrap();
        assert!(first < second);
        assert!(enriched.find("[코스 1]").unwrap() < enriched.find("[코스 2]").unwrap());
    }

    #[tokio::test]
    async fn request_starts_are_spaced() {
        let urls: Vec<String> = (1..=3)
            .map(|i| format!("https://place.naver.com/restaurant/{i}"))
            .collect();
        let text: String = urls
            .iter()
            .enumerate()
            .map(|(i, u)| block(i as u32 + 1, u))
            .collect();
        let fetcher = FakeFetcher::new(&[]);
        let options = EnrichOptions {
            concurrency: 3,
            delay: Duration::from_millis(30),
        };

        let started = std::time::Instant::now();
        enrich_ratings(&text, &fetcher, &options).await;
        assert!(started.elapsed() >= Duration::from_millis(60));
        assert_eq!(fetcher.calls.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn text_without_blocks_passes_through() {
        let fetcher = FakeFetcher::new(&[]);
        let text = "코스 헤더가 없는 응답";
        assert_eq!(enrich_ratings(text, &fetcher, &fast()).await, text);
    }
}
