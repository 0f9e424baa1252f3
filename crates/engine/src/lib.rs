//! Client-side alerting engine for channel analytics.
//!
//! An [`watcher::AlertWatcher`] samples channel metrics on an interval,
//! evaluates the configured rule set against each sample, suppresses repeat
//! firings inside a cooldown window, reconciles local alerts with any the
//! backend already knows, and publishes a bounded most-recent-first
//! collection to subscribers.

pub mod backend;
pub mod config;
pub mod evaluator;
pub mod gate;
pub mod reconciler;
pub mod ruleset;
pub mod source;
pub mod watcher;

pub use backend::{AlertBackend, HttpAlertBackend};
pub use config::WatcherConfig;
pub use evaluator::{Candidate, RandomSurge, SurgeDetector};
pub use ruleset::{NewRule, RuleError, RuleSet};
pub use source::{HttpMetricSource, MetricSource, SimulatedSource};
pub use watcher::AlertWatcher;
