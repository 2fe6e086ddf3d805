//! A scripted player that walks a scenario on its own.
//!
//! At every node it takes the option whose confidence level is closest to the
//! confidence it currently holds, so its path is shaped entirely by the TD
//! updates. Running it with the mental-filter rates next to a human
//! playthrough shows how the same story reads through the filter.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::episode::{Advance, Episode, EpisodeSummary, Variant};
use crate::error::EpisodeError;
use crate::scenario::{Choice, ScenarioGraph, ScenarioNode};

/// Upper bound on decisions per run, for graphs with cycles.
pub const MAX_AGENT_STEPS: usize = 256;

/// The choice nearest to `value`, considering only those `allowed` accepts.
/// Ties go to the one listed first.
pub fn pick_choice<'a>(
    node: &'a ScenarioNode,
    value: f64,
    allowed: impl Fn(&Choice) -> bool,
) -> Option<&'a Choice> {
    let mut best: Option<(&Choice, f64)> = None;
    for choice in node.choices.iter().filter(|c| allowed(c)) {
        let distance = (f64::from(choice.confidence_level) - value).abs();
        match best {
            Some((_, d)) if distance >= d => {}
            _ => best = Some((choice, distance)),
        }
    }
    best.map(|(choice, _)| choice)
}

/// Play `graph` from its start node until a terminal node, the step limit, or
/// a node where every option is blocked. The episode is returned in whatever
/// phase it ended.
pub fn simulate(graph: Arc<ScenarioGraph>, variant: Variant) -> Result<Episode, EpisodeError> {
    let mut episode = Episode::started(graph, variant);
    info!("Agent run on '{}' with {:?}", episode.graph().title(), variant);

    for _ in 0..MAX_AGENT_STEPS {
        let choice_id = {
            let node = episode.current_node()?;
            let value = episode.state().current_value;
            match pick_choice(node, value, |c| !episode.is_blocked(c)) {
                Some(choice) => choice.id.clone(),
                None => {
                    warn!(
                        "Agent stuck at '{}': every choice needs more than {:.2}",
                        node.id, value
                    );
                    return Ok(episode);
                }
            }
        };

        match episode.advance(&choice_id)? {
            Advance::Moved { node_id, .. } => {
                debug!("Agent took '{choice_id}' -> {node_id}");
            }
            Advance::Finished { node_id, .. } => {
                info!(
                    "Agent finished at '{}' with confidence {:.2}",
                    node_id,
                    episode.state().current_value
                );
                return Ok(episode);
            }
            Advance::Rejected(reason) => {
                // pick_choice already filtered blocked options
                warn!("Agent choice '{choice_id}' rejected: {reason:?}");
                return Ok(episode);
            }
        }
    }

    warn!("Agent hit the step limit of {MAX_AGENT_STEPS}");
    Ok(episode)
}

/// Side-by-side view of two playthroughs.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub player: EpisodeSummary,
    pub agent: EpisodeSummary,
    /// `player.final_value - agent.final_value`
    pub final_gap: f64,
    /// `player.mean_value - agent.mean_value`
    pub mean_gap: f64,
}

pub fn compare(player: &Episode, agent: &Episode) -> Comparison {
    let player = player.summary();
    let agent = agent.summary();
    Comparison {
        final_gap: player.final_value - agent.final_value,
        mean_gap: player.mean_value - agent.mean_value,
        player,
        agent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::td::LearningRates;

    fn node(levels: &[u8]) -> ScenarioNode {
        ScenarioNode {
            id: "n".into(),
            situation: String::new(),
            choices: levels
                .iter()
                .enumerate()
                .map(|(i, &level)| Choice {
                    id: ((b'a' + i as u8) as char).to_string(),
                    text: String::new(),
                    confidence_level: level,
                    next_node_id: Some("n".into()),
                })
                .collect(),
            outcome: None,
            is_terminal: false,
        }
    }

    #[test]
    fn test_pick_closest() {
        let n = node(&[8, 5, 2]);
        assert_eq!(pick_choice(&n, 5.4, |_| true).unwrap().id, "b");
        assert_eq!(pick_choice(&n, 9.0, |_| true).unwrap().id, "a");
        assert_eq!(pick_choice(&n, 0.5, |_| true).unwrap().id, "c");
    }

    #[test]
    fn test_pick_tie_goes_to_first() {
        let n = node(&[7, 3]);
        assert_eq!(pick_choice(&n, 5.0, |_| true).unwrap().id, "a");
    }

    #[test]
    fn test_pick_respects_filter() {
        let n = node(&[8, 5, 2]);
        assert_eq!(
            pick_choice(&n, 4.9, |c| c.confidence_level <= 4).unwrap().id,
            "c"
        );
        assert!(pick_choice(&n, 1.0, |c| c.confidence_level <= 1).is_none());
    }

    fn linear() -> Arc<ScenarioGraph> {
        Arc::new(
            ScenarioGraph::from_json(
                r#"{"nodes": [
                    {"id": "start", "situation": "", "choices": [
                        {"id": "a", "text": "", "confidenceLevel": 8, "nextNodeId": "one"},
                        {"id": "b", "text": "", "confidenceLevel": 5, "nextNodeId": "one"},
                        {"id": "c", "text": "", "confidenceLevel": 2, "nextNodeId": "one"}]},
                    {"id": "one", "situation": "", "choices": [
                        {"id": "a", "text": "", "confidenceLevel": 8, "nextNodeId": "two"},
                        {"id": "b", "text": "", "confidenceLevel": 5, "nextNodeId": "two"},
                        {"id": "c", "text": "", "confidenceLevel": 2, "nextNodeId": "two"}],
                        "outcome": {"reward": 7, "description": ""}},
                    {"id": "two", "situation": "", "choices": [
                        {"id": "a", "text": "", "confidenceLevel": 8, "nextNodeId": "end"},
                        {"id": "b", "text": "", "confidenceLevel": 5, "nextNodeId": "end"},
                        {"id": "c", "text": "", "confidenceLevel": 2, "nextNodeId": "end"}],
                        "outcome": {"reward": -4, "description": ""}},
                    {"id": "end", "situation": "", "isTerminal": true,
                        "outcome": {"reward": 9, "description": ""}}
                ]}"#,
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_simulate_reaches_terminal() {
        let episode = simulate(linear(), Variant::custom(LearningRates::MENTAL_FILTER)).unwrap();
        assert!(episode.is_finished());
        assert_eq!(episode.state().choice_history.len(), 3);
        assert_eq!(episode.state().value_history.len(), 4);
    }

    #[test]
    fn test_filter_agent_ends_lower_than_neutral_agent() {
        let filtered = simulate(linear(), Variant::custom(LearningRates::MENTAL_FILTER)).unwrap();
        let neutral = simulate(linear(), Variant::custom(LearningRates::NEUTRAL)).unwrap();
        let cmp = compare(&neutral, &filtered);
        assert!(cmp.final_gap > 0.0, "{cmp:?}");
        assert!(cmp.mean_gap > 0.0, "{cmp:?}");
        assert_eq!(cmp.player.terminal_node_id.as_deref(), Some("end"));
    }

    #[test]
    fn test_simulate_stops_on_cycle() {
        let graph = Arc::new(
            ScenarioGraph::from_json(
                r#"{"nodes": [
                    {"id": "start", "situation": "", "choices": [
                        {"id": "a", "text": "", "confidenceLevel": 5, "nextNodeId": "start"}],
                        "outcome": {"reward": 0, "description": ""}}
                ]}"#,
            )
            .unwrap(),
        );
        let episode = simulate(graph, Variant::Adaptive).unwrap();
        assert!(!episode.is_finished());
        assert_eq!(episode.state().choice_history.len(), MAX_AGENT_STEPS);
    }

    #[test]
    fn test_gated_agent_stops_when_stuck() {
        let graph = Arc::new(
            ScenarioGraph::from_json(
                r#"{"nodes": [
                    {"id": "start", "situation": "", "choices": [
                        {"id": "a", "text": "", "confidenceLevel": 5, "nextNodeId": "snub"}]},
                    {"id": "snub", "situation": "", "choices": [
                        {"id": "a", "text": "", "confidenceLevel": 4, "nextNodeId": "end"}],
                        "outcome": {"reward": -10, "description": ""}},
                    {"id": "end", "situation": "", "isTerminal": true}
                ]}"#,
            )
            .unwrap(),
        );
        let episode = simulate(graph, Variant::mental_filter()).unwrap();
        assert!(episode.is_stuck());
        assert_eq!(episode.state().current_node_id, "snub");
    }
}
