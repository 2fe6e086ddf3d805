use serde::Deserialize;

/// A single beat of the story.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioNode {
    /// Unique identifier for this node (e.g. "start", "waved", "high_engagement").
    pub id: String,
    /// What the player sees on arrival. Opaque to the engine.
    pub situation: String,
    /// Options offered at this node, in display order. Empty only on terminal nodes.
    #[serde(default)]
    pub choices: Vec<Choice>,
    /// Reward signal experienced when the player arrives here.
    #[serde(default)]
    pub outcome: Option<Outcome>,
    /// If true, arriving here ends the episode.
    #[serde(default)]
    pub is_terminal: bool,
}

impl ScenarioNode {
    pub fn choice(&self, id: &str) -> Option<&Choice> {
        self.choices.iter().find(|c| c.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    /// Short identifier, unique within the owning node ("a", "b", ...).
    pub id: String,
    pub text: String,
    /// Confidence this option represents, 0-10. Doubles as the gating threshold.
    pub confidence_level: u8,
    /// Successor node. Every choice on a non-terminal node must have one.
    #[serde(default)]
    pub next_node_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Outcome {
    /// Signed reward, roughly -5..10 in the bundled content.
    pub reward: f64,
    pub description: String,
}
