//! Conversation state and the turn handler that drives one request through
//! the whole pipeline.
//!
//! Only the generator call can fail a turn. Every stage after it passes its
//! input through unchanged when it cannot do better, so the user always gets
//! some itinerary back.

use crate::agent::{AgentError, TextGenerator};
use crate::config::Config;
use crate::course::{Itinerary, Stop};
use crate::datetime::{self, PlanTime};
use crate::export::TIMELINE_TITLE;
use crate::links::update_place_links;
use crate::prompt::{PromptInput, PromptKind, SYSTEM_CONTEXT};
use crate::ratings::{enrich_ratings, EnrichOptions};
use crate::schedule::{build_timeline, render_table, TimelineEntry};
use crate::scraper::RatingFetcher;
use crate::weather::WeatherLookup;
use chrono::{Local, NaiveDate};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum TurnError {
    #[error("model call failed: {0}")]
    ModelCall(#[from] AgentError),
    #[error("{stage} timed out after {secs}s")]
    UpstreamTimeout { stage: &'static str, secs: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// History plus the latest enriched itinerary text
#[derive(Debug, Clone, Default)]
pub struct Session {
    history: Vec<Message>,
    last_itinerary: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn last_itinerary(&self) -> Option<&str> {
        self.last_itinerary.as_deref()
    }

    /// Most recent user request, if any
    pub fn last_request(&self) -> Option<&str> {
        self.history
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }

    /// Forget everything and start over
    pub fn reset(&mut self) {
        self.history.clear();
        self.last_itinerary = None;
    }

    fn push(&mut self, role: Role, content: impl Into<String>) {
        self.history.push(Message {
            role,
            content: content.into(),
        });
    }
}

/// Result of one completed turn
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub plan: PlanTime,
    pub weather: String,
    pub kind: PromptKind,
    pub itinerary: Itinerary,
    pub stops: Vec<Stop>,
    pub timeline: Vec<TimelineEntry>,
}

impl TurnOutcome {
    pub fn timeline_table(&self) -> String {
        render_table(&self.timeline)
    }

    /// Itinerary text followed by the timeline, as stored in history
    pub fn render(&self) -> String {
        format!(
            "{}\n\n### {}\n{}",
            self.itinerary.text,
            TIMELINE_TITLE,
            self.timeline_table()
        )
    }
}

#[derive(Debug, Clone)]
pub struct PlannerOptions {
    /// System context sent ahead of every request
    pub context: String,
    pub generate_timeout: Duration,
    pub keep_listing_links: bool,
    pub enrich: EnrichOptions,
}

impl PlannerOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            context: config
                .agent
                .persona
                .clone()
                .unwrap_or_else(|| SYSTEM_CONTEXT.to_string()),
            generate_timeout: config.agent.timeout(),
            keep_listing_links: config.enrichment.keep_listing_links,
            enrich: EnrichOptions {
                concurrency: config.enrichment.concurrency,
                delay: config.enrichment.delay(),
            },
        }
    }
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Runs requests through extraction, generation, linking, enrichment and scheduling
pub struct Planner {
    generator: Box<dyn TextGenerator>,
    weather: Box<dyn WeatherLookup>,
    ratings: Box<dyn RatingFetcher>,
    options: PlannerOptions,
}

impl Planner {
    pub fn new(
        generator: Box<dyn TextGenerator>,
        weather: Box<dyn WeatherLookup>,
        ratings: Box<dyn RatingFetcher>,
        options: PlannerOptions,
    ) -> Self {
        Self {
            generator,
            weather,
            ratings,
            options,
        }
    }

    pub async fn handle_turn(
        &self,
        session: &mut Session,
        request: &str,
    ) -> Result<TurnOutcome, TurnError> {
        self.handle_turn_at(session, request, Local::now().date_naive())
            .await
    }

    /// Same as [`Planner::handle_turn`] with relative dates resolved against `today`
    pub async fn handle_turn_at(
        &self,
        session: &mut Session,
        request: &str,
        today: NaiveDate,
    ) -> Result<TurnOutcome, TurnError> {
        session.push(Role::User, request);

        let plan = datetime::extract_at(request, today);
        let weather = self.weather.lookup(plan.date, plan.time).await;

        let (kind, prompt) = {
            let input = PromptInput {
                context: &self.options.context,
                request,
                previous: session.last_itinerary(),
                plan,
                weather: &weather,
            };
            (input.kind(), input.render())
        };
        info!(plan = %plan, kind = ?kind, "Requesting course");

        let raw = self.generate(&prompt).await?;

        let linked = update_place_links(&raw, self.options.keep_listing_links);
        let enriched = enrich_ratings(&linked, &*self.ratings, &self.options.enrich).await;

        let itinerary = Itinerary::new(enriched);
        let stops = itinerary.stops();
        if stops.is_empty() {
            warn!("No course blocks found in response");
        }
        let timeline = build_timeline(&stops, plan.time);

        let outcome = TurnOutcome {
            plan,
            weather,
            kind,
            itinerary,
            stops,
            timeline,
        };
        session.push(Role::Assistant, outcome.render());
        session.last_itinerary = Some(outcome.itinerary.text.clone());
        Ok(outcome)
    }

    async fn generate(&self, prompt: &str) -> Result<String, TurnError> {
        let limit = self.options.generate_timeout;
        match tokio::time::timeout(limit, self.generator.generate(prompt)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(TurnError::UpstreamTimeout {
                stage: "text generation",
                secs: limit.as_secs(),
            }),
        }
    }
}
