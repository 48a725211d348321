//! # Datecourse
//!
//! A conversational date-course planner backed by an LLM.
//!
//! ## Features
//!
//! - **Date and time inference**: Korean phrases like `내일 저녁 7시` become a concrete date and start time
//! - **Tolerant parsing**: Course blocks are extracted from free-text model output, with a fallback tier
//! - **Verified links**: Every stop gets a map-search link built from its cleaned name
//! - **Live ratings**: Listing-site links are enriched with current ratings under a shared rate limit
//! - **Timelines**: Stops are laid out on a clock using per-activity duration estimates

pub mod agent;
pub mod config;
pub mod course;
pub mod datetime;
pub mod export;
pub mod links;
pub mod prompt;
pub mod ratings;
pub mod schedule;
pub mod scraper;
pub mod session;
pub mod weather;

pub use config::Config;
pub use course::{Itinerary, Stop};
pub use session::{Planner, PlannerOptions, Session, TurnError, TurnOutcome};
