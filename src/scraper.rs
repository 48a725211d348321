//! Listing-site scraping for live ratings.
//!
//! Uses reqwest for fetching and scraper for HTML parsing.

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Only URLs under this prefix are fetched
pub const LISTING_PREFIX: &str = "https://place.naver.com/";

/// Browser User-Agent; the listing site rejects unknown agents
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Default timeout for HTTP requests
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("failed to fetch URL: {0}")]
    FetchError(#[from] reqwest::Error),
    #[error("not a listing URL: {0}")]
    NotListing(String),
    #[error("no rating found on page")]
    NoRating,
}

/// Source of rating summaries for listing pages.
///
/// Implementations never fail: anything that goes wrong is `None`.
#[async_trait]
pub trait RatingFetcher: Send + Sync {
    async fn fetch_rating(&self, url: &str) -> Option<String>;
}

pub fn is_listing_url(url: &str) -> bool {
    url.starts_with(LISTING_PREFIX)
}

/// Scrapes rating and review count from listing pages
pub struct PlaceScraper {
    client: Client,
}

impl PlaceScraper {
    pub fn new() -> Result<Self, ScraperError> {
        Ok(Self {
            client: create_client()?,
        })
    }

    /// Fetch a listing page and pull the rating out of it
    pub async fn scrape(&self, url: &str) -> Result<String, ScraperError> {
        if !is_listing_url(url) {
            return Err(ScraperError::NotListing(url.to_string()));
        }

        let response = self.client.get(url).send().await?.error_for_status()?;
        let html = response.text().await?;
        let document = Html::parse_document(&html);

        extract_rating(&document).ok_or(ScraperError::NoRating)
    }
}

#[async_trait]
impl RatingFetcher for PlaceScraper {
    async fn fetch_rating(&self, url: &str) -> Option<String> {
        match self.scrape(url).await {
            Ok(rating) => {
                debug!(url = %url, rating = %rating, "Fetched rating");
                Some(rating)
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Rating unavailable");
                None
            }
        }
    }
}

/// Create a configured HTTP client for scraping
fn create_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()
}

/// Rating and review count formatted as `"4.5/5.0 (1,203)"`
fn extract_rating(document: &Html) -> Option<String> {
    let rating_selector = Selector::parse(r#"span[class*="rating"]"#).unwrap();
    let count_selector = Selector::parse(r#"span[class*="review_count"]"#).unwrap();

    let rating = element_text(document, &rating_selector)?;
    let count = element_text(document, &count_selector)?;
    Some(format!("{}/5.0 ({})", rating, count))
}

fn element_text(document: &Html, selector: &Selector) -> Option<String> {
    let element = document.select(selector).next()?;
    let text: String = element.text().collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_rating_and_count() {
        let document = Html::parse_document(
            r#"<html><body>
                <span class="place_rating_value">4.52</span>
                <span class="review_count_total">1,203</span>
            </body></html>"#,
        );
        assert_eq!(extract_rating(&document).as_deref(), Some("4.52/5.0 (1,203)"));
    }

    #[test]
    fn missing_count_means_no_rating() {
        let document = Html::parse_document(r#"<span class="rating">4.1</span>"#);
        assert_eq!(extract_rating(&document), None);
    }

    #[test]
    fn listing_prefix() {
        assert!(is_listing_url("https://place.naver.com/restaurant/1234"));
        assert!(!is_listing_url("https://map.naver.com/p/search/abc"));
        assert!(!is_listing_url("#"));
    }

    #[tokio::test]
    async fn non_listing_urls_are_not_fetched() {
        let scraper = PlaceScraper::new().unwrap();
        assert!(matches!(
            scraper.scrape("https://example.com/").await,
            Err(ScraperError::NotListing(_))
        ));
        assert_eq!(scraper.fetch_rating("not a url").await, None);
    }
}
