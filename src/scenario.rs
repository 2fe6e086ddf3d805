//! Scenario content: the immutable branching graph an episode walks.

pub mod datasets;
pub mod graph;
pub mod node;

pub use graph::{ScenarioDocument, ScenarioGraph};
pub use node::{Choice, Outcome, ScenarioNode};
