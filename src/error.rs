use thiserror::Error;

/// Defects in scenario content. All of these are authoring bugs and are
/// reported when a graph is loaded, before any episode runs.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("node '{id}' not found in scenario graph")]
    NotFound { id: String },

    #[error("start node '{id}' is not part of the graph")]
    MissingStart { id: String },

    #[error("start node '{id}' is terminal")]
    TerminalStart { id: String },

    #[error("node '{id}' is defined more than once")]
    DuplicateNode { id: String },

    #[error("non-terminal node '{id}' offers no choices")]
    EmptyChoices { id: String },

    #[error("choice '{choice_id}' on non-terminal node '{node_id}' has no next node")]
    MissingNext { node_id: String, choice_id: String },

    #[error("choice '{choice_id}' appears twice on node '{node_id}'")]
    DuplicateChoice { node_id: String, choice_id: String },

    #[error("choice '{choice_id}' on node '{node_id}' has confidence level {level} (expected 0-10)")]
    ConfidenceOutOfRange {
        node_id: String,
        choice_id: String,
        level: u8,
    },

    #[error("malformed scenario document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Rejected numeric configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} learning rate {value} is outside [0, 1]")]
    RateOutOfRange { name: &'static str, value: f64 },
}

#[derive(Debug, Error)]
pub enum EpisodeError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("node '{node_id}' has no choice '{choice_id}'")]
    UnknownChoice { node_id: String, choice_id: String },
}
