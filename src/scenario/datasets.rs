//! Scenario graphs compiled into the binary.
//!
//! `mental_filter` and `outcome` tell the same Monday morning with slightly
//! different wording; `school_week` is a linear run of decisions where every
//! option at a step leads to the same outcome.

use crate::error::GraphError;
use crate::scenario::graph::ScenarioGraph;

pub const MENTAL_FILTER: &str = "mental_filter";
pub const OUTCOME: &str = "outcome";
pub const SCHOOL_WEEK: &str = "school_week";

pub const NAMES: &[&str] = &[MENTAL_FILTER, OUTCOME, SCHOOL_WEEK];

/// Raw JSON for a bundled dataset.
pub fn source(name: &str) -> Option<&'static str> {
    match name {
        MENTAL_FILTER => Some(include_str!("../../scenarios/mental_filter.json")),
        OUTCOME => Some(include_str!("../../scenarios/outcome.json")),
        SCHOOL_WEEK => Some(include_str!("../../scenarios/school_week.json")),
        _ => None,
    }
}

/// Parse and validate a bundled dataset. `None` if no dataset has that name.
pub fn load(name: &str) -> Option<Result<ScenarioGraph, GraphError>> {
    source(name).map(ScenarioGraph::from_json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_bundled_dataset_validates() {
        for name in NAMES {
            let graph = load(name).unwrap().unwrap_or_else(|e| panic!("{name}: {e}"));
            assert_eq!(graph.start_node_id(), "start");
            assert!(!graph.terminals().is_empty(), "{name} has no terminal");
        }
    }

    #[test]
    fn test_unknown_dataset() {
        assert!(source("tuesday").is_none());
        assert!(load("tuesday").is_none());
    }

    #[test]
    fn test_school_week_is_linear() {
        let graph = load(SCHOOL_WEEK).unwrap().unwrap();
        assert_eq!(graph.terminals(), vec!["week_end"]);
        for node in graph.nodes().filter(|n| !n.is_terminal) {
            let first = node.choices[0].next_node_id.as_deref();
            assert!(node
                .choices
                .iter()
                .all(|c| c.next_node_id.as_deref() == first));
        }
    }
}
