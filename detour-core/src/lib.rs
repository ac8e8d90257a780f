//! Core types for detour.
//!
//! This crate decides whether a newly drafted appointment fits into a day of
//! existing appointments once travel between their locations is accounted for:
//! - `event` and `date_range` model the timeline
//! - `travel` wraps the routing provider behind the `TravelEstimator` trait
//! - `conflict` classifies one candidate/other pair
//! - `recommend` folds every pair of the day into a single recommendation
//! - `reschedule` shifts the candidate and everything after it, writing back
//! - `cycle` drives one candidate through snapshot, evaluation and persistence

pub mod calendar;
pub mod config;
pub mod conflict;
pub mod constants;
pub mod cycle;
pub mod date_range;
pub mod error;
pub mod event;
pub mod protocol;
pub mod provider;
pub mod recommend;
pub mod reschedule;
pub mod travel;

pub use conflict::{PairKind, PairwiseResult, evaluate_pair};
pub use error::{DetourError, DetourResult};
pub use event::{EventOrigin, TimedEvent};
pub use recommend::{Recommendation, RecommendationStatus, SchedulePolicy, recommend};
pub use reschedule::{RescheduleReport, Rescheduler};
pub use travel::{TravelEstimate, TravelEstimator, TravelMode};
