//! Asymmetric temporal-difference confidence model.
//!
//! Confidence lives on a 0-10 scale. Each outcome's reward is mapped onto the
//! same scale and the gap to the current confidence (the reward prediction
//! error) is applied at one of two learning rates, depending on its sign.
//! With a low positive rate and a high negative rate the value ratchets
//! downward even when most outcomes are good: the "mental filter".

use log::{debug, trace};

use crate::error::ConfigError;
use crate::scenario::{Choice, Outcome};

pub const INITIAL_CONFIDENCE: f64 = 5.0;
pub const MIN_CONFIDENCE: f64 = 0.0;
pub const MAX_CONFIDENCE: f64 = 10.0;

const NEUTRAL_REWARD: f64 = 5.0;
const REWARD_SCALE: f64 = 0.4;

const DEFAULT_IMPLIED_ALPHA: f64 = 0.5;
const ESTIMATE_DAMPING: f64 = 0.8;
const ESTIMATE_FLOOR: f64 = 0.1;
const ESTIMATE_CEILING: f64 = 0.9;

// ---------------------------------------------------------------------------
// Learning rates
// ---------------------------------------------------------------------------

/// Pair of learning rates, both in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LearningRates {
    positive: f64,
    negative: f64,
}

impl LearningRates {
    /// Positive surprises barely register, negative ones hit hard.
    pub const MENTAL_FILTER: Self = Self {
        positive: 0.1,
        negative: 0.8,
    };

    pub const NEUTRAL: Self = Self {
        positive: 0.5,
        negative: 0.5,
    };

    pub fn new(positive: f64, negative: f64) -> Result<Self, ConfigError> {
        check_rate("positive", positive)?;
        check_rate("negative", negative)?;
        Ok(Self { positive, negative })
    }

    pub fn positive(&self) -> f64 {
        self.positive
    }

    pub fn negative(&self) -> f64 {
        self.negative
    }
}

impl Default for LearningRates {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl std::fmt::Display for LearningRates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "α⁺={:.2}, α⁻={:.2}", self.positive, self.negative)
    }
}

fn check_rate(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::RateOutOfRange { name, value })
    }
}

// ---------------------------------------------------------------------------
// Update rule
// ---------------------------------------------------------------------------

/// Everything computed by one TD update, kept for display and history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TdStep {
    pub reward: f64,
    pub normalized_reward: f64,
    /// Reward prediction error: `normalized_reward - previous`.
    pub rpe: f64,
    /// Learning rate that was applied.
    pub alpha: f64,
    pub previous: f64,
    pub value: f64,
}

/// Map a reward onto the confidence scale, centred on 5.
pub fn normalize_reward(reward: f64) -> f64 {
    NEUTRAL_REWARD + reward * REWARD_SCALE
}

pub fn step(reward: f64, current_value: f64, rates: LearningRates) -> TdStep {
    let normalized_reward = normalize_reward(reward);
    let rpe = normalized_reward - current_value;
    // A zero error takes the negative rate. The result is the same either way.
    let alpha = if rpe > 0.0 {
        rates.positive
    } else {
        rates.negative
    };
    let value = (current_value + alpha * rpe).clamp(MIN_CONFIDENCE, MAX_CONFIDENCE);

    debug!(
        "TD step: reward={reward} normalized={normalized_reward:.2} rpe={rpe:.2} alpha={alpha} {current_value:.2} -> {value:.2}"
    );

    TdStep {
        reward,
        normalized_reward,
        rpe,
        alpha,
        previous: current_value,
        value,
    }
}

/// New confidence after experiencing `reward`. Always within [0, 10].
pub fn update_confidence(reward: f64, current_value: f64, rates: LearningRates) -> f64 {
    step(reward, current_value, rates).value
}

// ---------------------------------------------------------------------------
// Learning-rate estimation
// ---------------------------------------------------------------------------

/// Infer learning rates from how the confidence of consecutive choices moved
/// after each outcome.
///
/// `outcomes[i]` is the outcome that followed `choices[i]`. For every pair
/// `(i, i + 1)` the change in confidence level is divided by the reward's
/// magnitude to give an implied rate; samples are bucketed by the reward's
/// sign (zero rewards are dropped) and averaged, an empty bucket counting as
/// 0.5. Each average is then damped by 0.8 and held to [0.1, 0.9].
///
/// Fewer than two entries in either history returns [`LearningRates::NEUTRAL`]
/// untouched.
///
/// This is a heuristic, not a likelihood fit.
pub fn estimate_learning_rates(choices: &[Choice], outcomes: &[Outcome]) -> LearningRates {
    if choices.len() < 2 || outcomes.len() < 2 {
        return LearningRates::NEUTRAL;
    }

    let pairs = choices.len().min(outcomes.len());

    let mut positive = Vec::new();
    let mut negative = Vec::new();

    for i in 0..pairs.saturating_sub(1) {
        let current = f64::from(choices[i].confidence_level);
        let next = f64::from(choices[i + 1].confidence_level);
        let change = next - current;
        let reward = outcomes[i].reward;

        if reward > 0.0 {
            let implied = (change / reward).max(0.0);
            trace!("sample {i}: reward={reward} change={change} implied α⁺={implied:.3}");
            positive.push(implied);
        } else if reward < 0.0 {
            let implied = (-change / reward.abs()).max(0.0);
            trace!("sample {i}: reward={reward} change={change} implied α⁻={implied:.3}");
            negative.push(implied);
        }
    }

    let rates = LearningRates {
        positive: finalize_estimate(&positive),
        negative: finalize_estimate(&negative),
    };
    debug!(
        "Estimated {rates} from {} positive / {} negative samples",
        positive.len(),
        negative.len()
    );
    rates
}

fn finalize_estimate(samples: &[f64]) -> f64 {
    let average = if samples.is_empty() {
        DEFAULT_IMPLIED_ALPHA
    } else {
        samples.iter().sum::<f64>() / samples.len() as f64
    };
    (average * ESTIMATE_DAMPING).clamp(ESTIMATE_FLOOR, ESTIMATE_CEILING)
}

// ---------------------------------------------------------------------------
// Gating
// ---------------------------------------------------------------------------

/// A choice is out of reach when it asks for more confidence than is held.
pub fn is_choice_blocked(choice: &Choice, current_value: f64) -> bool {
    f64::from(choice.confidence_level) > current_value
}

// ---------------------------------------------------------------------------
// Interpretation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sensitivity {
    Low,
    Moderate,
    High,
}

/// Coarse reading of a pair of rates for feedback to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateInterpretation {
    pub positive: Sensitivity,
    pub negative: Sensitivity,
    /// Positive rate sits more than 0.2 below the negative one.
    pub mental_filter: bool,
}

impl RateInterpretation {
    pub fn of(rates: LearningRates) -> Self {
        let positive = if rates.positive > 0.6 {
            Sensitivity::High
        } else if rates.positive > 0.3 {
            Sensitivity::Moderate
        } else {
            Sensitivity::Low
        };
        let negative = if rates.negative > 0.7 {
            Sensitivity::High
        } else if rates.negative > 0.4 {
            Sensitivity::Moderate
        } else {
            Sensitivity::Low
        };
        Self {
            positive,
            negative,
            mental_filter: rates.positive < rates.negative - 0.2,
        }
    }

    pub fn positive_summary(&self) -> &'static str {
        match self.positive {
            Sensitivity::High => "You learn well from positive outcomes.",
            Sensitivity::Moderate => "You update moderately from positives.",
            Sensitivity::Low => "Positive outcomes barely move you.",
        }
    }

    pub fn negative_summary(&self) -> &'static str {
        match self.negative {
            Sensitivity::High => "You may be overgeneralizing from negatives.",
            Sensitivity::Moderate => "You update moderately from setbacks.",
            Sensitivity::Low => "You are resilient to setbacks.",
        }
    }
}
