use std::sync::Arc;

use log::{debug, info, warn};

use crate::error::{EpisodeError, GraphError};
use crate::scenario::{Choice, Outcome, ScenarioGraph, ScenarioNode};
use crate::td::{self, LearningRates, TdStep, INITIAL_CONFIDENCE};

// ---------------------------------------------------------------------------
// Variant
// ---------------------------------------------------------------------------

/// How the learning rates behave during an episode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Variant {
    /// Rates never change. With `gating`, choices asking for more confidence
    /// than is currently held cannot be taken.
    Fixed { rates: LearningRates, gating: bool },
    /// Rates start neutral and are re-estimated from the player's own choices
    /// after every step. Never gates.
    Adaptive,
}

impl Variant {
    /// The canned depressed profile: {0.1, 0.8} with gating.
    pub fn mental_filter() -> Self {
        Variant::Fixed {
            rates: LearningRates::MENTAL_FILTER,
            gating: true,
        }
    }

    /// User-chosen fixed rates, no gating.
    pub fn custom(rates: LearningRates) -> Self {
        Variant::Fixed {
            rates,
            gating: false,
        }
    }

    pub fn initial_rates(&self) -> LearningRates {
        match self {
            Variant::Fixed { rates, .. } => *rates,
            Variant::Adaptive => LearningRates::NEUTRAL,
        }
    }

    pub fn gates(&self) -> bool {
        matches!(self, Variant::Fixed { gating: true, .. })
    }

    pub fn is_adaptive(&self) -> bool {
        matches!(self, Variant::Adaptive)
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    NotStarted,
    InProgress,
    Finished { terminal_node_id: String },
}

/// Everything one playthrough accumulates. Histories are append-only.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeState {
    /// Node whose choices are on offer. Stays on the last non-terminal node
    /// once the episode finishes.
    pub current_node_id: String,
    /// Confidence, always within [0, 10].
    pub current_value: f64,
    /// Starts with the initial value; one entry per outcome after that.
    pub value_history: Vec<f64>,
    pub choice_history: Vec<Choice>,
    pub outcome_history: Vec<Outcome>,
    /// One TD record per entry in `outcome_history`.
    pub rpe_history: Vec<TdStep>,
    pub rates: LearningRates,
}

impl EpisodeState {
    pub fn new(start_node_id: impl Into<String>, rates: LearningRates) -> Self {
        Self {
            current_node_id: start_node_id.into(),
            current_value: INITIAL_CONFIDENCE,
            value_history: vec![INITIAL_CONFIDENCE],
            choice_history: Vec::new(),
            outcome_history: Vec::new(),
            rpe_history: Vec::new(),
            rates,
        }
    }
}

/// Why an advance was refused. None of these change the episode.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    NotStarted,
    Finished,
    Blocked {
        choice_id: String,
        required: u8,
        current_value: f64,
    },
}

/// Result of offering a choice to [`Episode::advance`].
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// Moved to another non-terminal node.
    Moved {
        node_id: String,
        step: Option<TdStep>,
    },
    /// Arrived at a terminal node.
    Finished {
        node_id: String,
        step: Option<TdStep>,
    },
    Rejected(Rejection),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeSummary {
    pub final_value: f64,
    pub mean_value: f64,
    pub min_value: f64,
    pub max_value: f64,
    pub choices_made: usize,
    pub rates: LearningRates,
    pub terminal_node_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Episode
// ---------------------------------------------------------------------------

/// A single playthrough of a scenario graph.
///
/// The graph is shared; the state is owned here and only changes through
/// [`advance`](Self::advance), [`start`](Self::start) and [`reset`](Self::reset).
#[derive(Debug, Clone)]
pub struct Episode {
    graph: Arc<ScenarioGraph>,
    variant: Variant,
    phase: Phase,
    state: EpisodeState,
}

impl Episode {
    pub fn new(graph: Arc<ScenarioGraph>, variant: Variant) -> Self {
        let state = EpisodeState::new(graph.start_node_id(), variant.initial_rates());
        Self {
            graph,
            variant,
            phase: Phase::NotStarted,
            state,
        }
    }

    /// Same as `new` followed by `start`.
    pub fn started(graph: Arc<ScenarioGraph>, variant: Variant) -> Self {
        let mut episode = Self::new(graph, variant);
        episode.start();
        episode
    }

    /// Begin the episode at the start node. Only has an effect when not yet started.
    pub fn start(&mut self) {
        if self.phase == Phase::NotStarted {
            info!(
                "Episode started at '{}' ({:?}, {})",
                self.state.current_node_id, self.variant, self.state.rates
            );
            self.phase = Phase::InProgress;
        }
    }

    /// Throw away all progress and return to `NotStarted`.
    pub fn reset(&mut self) {
        info!("Episode reset");
        self.state = EpisodeState::new(self.graph.start_node_id(), self.variant.initial_rates());
        self.phase = Phase::NotStarted;
    }

    pub fn graph(&self) -> &ScenarioGraph {
        &self.graph
    }

    pub fn shared_graph(&self) -> Arc<ScenarioGraph> {
        Arc::clone(&self.graph)
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Finished { .. })
    }

    pub fn state(&self) -> &EpisodeState {
        &self.state
    }

    pub fn current_node(&self) -> Result<&ScenarioNode, GraphError> {
        self.graph.node(&self.state.current_node_id)
    }

    /// Whether `choice` is out of reach right now. Always false for variants
    /// that do not gate.
    pub fn is_blocked(&self, choice: &Choice) -> bool {
        self.variant.gates() && td::is_choice_blocked(choice, self.state.current_value)
    }

    /// In progress, but every choice on offer is blocked.
    pub fn is_stuck(&self) -> bool {
        if self.phase != Phase::InProgress {
            return false;
        }
        match self.current_node() {
            Ok(node) => node.choices.iter().all(|c| self.is_blocked(c)),
            Err(_) => false,
        }
    }

    /// Take choice `choice_id` from the current node.
    ///
    /// Refusals (not started, already finished, blocked) come back as
    /// [`Advance::Rejected`]. Errors mean the scenario data or the caller is
    /// inconsistent; in every non-`Ok(Moved | Finished)` case the episode is
    /// left exactly as it was.
    pub fn advance(&mut self, choice_id: &str) -> Result<Advance, EpisodeError> {
        match self.phase {
            Phase::NotStarted => return Ok(Advance::Rejected(Rejection::NotStarted)),
            Phase::Finished { .. } => return Ok(Advance::Rejected(Rejection::Finished)),
            Phase::InProgress => {}
        }

        let graph = Arc::clone(&self.graph);
        let node = graph.node(&self.state.current_node_id)?;
        let choice = node
            .choice(choice_id)
            .ok_or_else(|| EpisodeError::UnknownChoice {
                node_id: node.id.clone(),
                choice_id: choice_id.to_string(),
            })?;

        if self.is_blocked(choice) {
            warn!(
                "Choice '{}' at '{}' needs confidence {} but only {:.2} is held",
                choice.id, node.id, choice.confidence_level, self.state.current_value
            );
            return Ok(Advance::Rejected(Rejection::Blocked {
                choice_id: choice.id.clone(),
                required: choice.confidence_level,
                current_value: self.state.current_value,
            }));
        }

        let next_id = choice
            .next_node_id
            .as_deref()
            .ok_or_else(|| GraphError::MissingNext {
                node_id: node.id.clone(),
                choice_id: choice.id.clone(),
            })?;
        let next = graph.node(next_id)?;

        // Estimation sees the histories as they were before this step.
        let estimated = self.variant.is_adaptive().then(|| {
            td::estimate_learning_rates(&self.state.choice_history, &self.state.outcome_history)
        });

        debug!("Transition: {} -[{}]-> {}", node.id, choice.id, next.id);
        self.state.choice_history.push(choice.clone());

        let step = next.outcome.as_ref().map(|outcome| {
            let step = td::step(outcome.reward, self.state.current_value, self.state.rates);
            self.state.outcome_history.push(outcome.clone());
            self.state.value_history.push(step.value);
            self.state.rpe_history.push(step);
            self.state.current_value = step.value;
            step
        });

        if let Some(rates) = estimated {
            debug!("Re-estimated rates: {} -> {}", self.state.rates, rates);
            self.state.rates = rates;
        }

        if graph.is_terminal(next) {
            info!(
                "Episode finished at '{}' with confidence {:.2}",
                next.id, self.state.current_value
            );
            self.phase = Phase::Finished {
                terminal_node_id: next.id.clone(),
            };
            Ok(Advance::Finished {
                node_id: next.id.clone(),
                step,
            })
        } else {
            self.state.current_node_id = next.id.clone();
            Ok(Advance::Moved {
                node_id: next.id.clone(),
                step,
            })
        }
    }

    pub fn summary(&self) -> EpisodeSummary {
        let values = &self.state.value_history;
        let mean_value = if values.is_empty() {
            self.state.current_value
        } else {
            values.iter().sum::<f64>() / values.len() as f64
        };
        EpisodeSummary {
            final_value: self.state.current_value,
            mean_value,
            min_value: values.iter().copied().fold(f64::INFINITY, f64::min),
            max_value: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            choices_made: self.state.choice_history.len(),
            rates: self.state.rates,
            terminal_node_id: match &self.phase {
                Phase::Finished { terminal_node_id } => Some(terminal_node_id.clone()),
                _ => None,
            },
        }
    }
}
