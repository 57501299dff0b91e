//! Helpfulness feedback on assistant replies.
//!
//! - `service`: the remote `FeedbackService` interface
//! - `tracker`: `FeedbackTracker`, at-most-once rating per message

mod service;
mod tracker;

pub use service::{FeedbackRequest, FeedbackService};
pub use tracker::{FeedbackTracker, RateOutcome};
