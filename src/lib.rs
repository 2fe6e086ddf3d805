//! Confidence under a mental filter.
//!
//! A player walks a branching social scenario. After each arrival the
//! outcome's reward updates a 0-10 confidence value with an asymmetric
//! temporal-difference rule: one learning rate for pleasant surprises,
//! another for unpleasant ones. A low positive rate paired with a high
//! negative rate keeps confidence low even when most outcomes are good.
//!
//! - [`scenario`]: immutable scenario graphs, validated on load.
//! - [`td`]: the update rule, learning-rate estimation and choice gating.
//! - [`episode`]: one playthrough as an explicit state machine.
//! - [`agent`]: a scripted player for side-by-side comparisons.

pub mod agent;
pub mod episode;
pub mod error;
pub mod scenario;
pub mod td;

pub use episode::{Advance, Episode, EpisodeState, EpisodeSummary, Phase, Rejection, Variant};
pub use error::{ConfigError, EpisodeError, GraphError};
pub use scenario::{Choice, Outcome, ScenarioGraph, ScenarioNode};
pub use td::{LearningRates, TdStep};
