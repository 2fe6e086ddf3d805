use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Result;
use log::info;

use mental_filter::agent;
use mental_filter::scenario::datasets;
use mental_filter::td::RateInterpretation;
use mental_filter::{
    Advance, Episode, EpisodeError, LearningRates, Rejection, ScenarioGraph, ScenarioNode, TdStep,
    Variant,
};

// ---------------------------------------------------------------------------
// Modes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mode {
    /// Fixed {0.1, 0.8} rates; options above the current confidence are locked.
    Filter,
    /// Fixed rates of the player's choosing, nothing locked.
    Custom(LearningRates),
    /// Rates estimated from the player's own choices as they go.
    Adaptive,
    /// Play adaptively, then watch an agent with the given rates play the same story.
    Agent(LearningRates),
}

impl Mode {
    pub fn variant(&self) -> Variant {
        match self {
            Mode::Filter => Variant::mental_filter(),
            Mode::Custom(rates) => Variant::custom(*rates),
            Mode::Adaptive | Mode::Agent(_) => Variant::Adaptive,
        }
    }

    pub fn default_dataset(&self) -> &'static str {
        match self {
            Mode::Filter => datasets::MENTAL_FILTER,
            Mode::Custom(_) | Mode::Adaptive => datasets::OUTCOME,
            Mode::Agent(_) => datasets::SCHOOL_WEEK,
        }
    }

    fn title(&self) -> &'static str {
        match self {
            Mode::Filter => "THE MENTAL FILTER",
            Mode::Custom(_) => "CUSTOM LEARNING RATES",
            Mode::Adaptive => "CHOOSE YOUR OWN OUTCOME",
            Mode::Agent(_) => "YOU VS. THE FILTERED AGENT",
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn confidence_bar(value: f64) -> String {
    let filled = (value.round().max(0.0) as usize).min(10);
    format!("[{}{}] {:.2}", "#".repeat(filled), ".".repeat(10 - filled), value)
}

fn show_node(episode: &Episode, node: &ScenarioNode) {
    println!("\n{}", node.situation);
    println!("  Confidence: {}", confidence_bar(episode.state().current_value));
    println!();
    for (i, choice) in node.choices.iter().enumerate() {
        let lock = if episode.is_blocked(choice) {
            "  [locked]"
        } else {
            ""
        };
        println!(
            "  {}) {} (needs {}){}",
            i + 1,
            choice.text,
            choice.confidence_level,
            lock
        );
    }
}

fn show_step(step: &TdStep) {
    let direction = if step.rpe > 0.0 { "better" } else { "worse" };
    println!(
        "  (Felt {direction} than expected: RPE {:+.2} x α {:.2}, confidence {:.2} -> {:.2})",
        step.rpe, step.alpha, step.previous, step.value
    );
}

fn show_arrival(episode: &Episode, node_id: &str, step: Option<&TdStep>) {
    let Some(node) = episode.graph().get(node_id) else {
        return;
    };
    if let Some(outcome) = &node.outcome {
        println!("\n>> {}", outcome.description);
    }
    if let Some(step) = step {
        show_step(step);
    }
}

fn show_rates(label: &str, rates: LearningRates) {
    let reading = RateInterpretation::of(rates);
    println!("  {label}: {rates}");
    println!("    {}", reading.positive_summary());
    println!("    {}", reading.negative_summary());
    if reading.mental_filter {
        println!("    Positive updates lag far behind negative ones: a mental filter pattern.");
    }
}

// ---------------------------------------------------------------------------
// Round over screen
// ---------------------------------------------------------------------------

/// How a single round ended.
enum RoundOutcome {
    /// Reached a terminal node.
    Finished,
    /// Every remaining option was locked.
    Stuck,
    /// Player typed quit mid-round.
    Quit,
}

fn show_round_over(outcome: &RoundOutcome, episode: &Episode, mode: Mode) -> Result<()> {
    println!("\n========================================");
    println!("             ROUND OVER");
    println!("========================================");

    match outcome {
        RoundOutcome::Finished => {}
        RoundOutcome::Stuck => {
            println!("  Every option felt out of reach. The filter won this time.");
        }
        RoundOutcome::Quit => {
            println!("  You walked away.");
        }
    }

    let summary = episode.summary();
    println!("  Final confidence : {}", confidence_bar(summary.final_value));
    println!("  Average          : {:.2}", summary.mean_value);
    println!(
        "  Range            : {:.2} - {:.2}",
        summary.min_value, summary.max_value
    );
    println!("  Choices made     : {}", summary.choices_made);
    if let Some(id) = &summary.terminal_node_id {
        println!("  Ended at         : {id}");
    }
    let trajectory: Vec<String> = episode
        .state()
        .value_history
        .iter()
        .map(|v| format!("{v:.1}"))
        .collect();
    println!("  Trajectory       : {}", trajectory.join(" -> "));

    if episode.variant().is_adaptive() {
        println!();
        show_rates("Your estimated rates", summary.rates);
    }

    if let (Mode::Agent(rates), RoundOutcome::Finished) = (mode, outcome) {
        let agent = agent::simulate(episode.shared_graph(), Variant::custom(rates))?;
        let cmp = agent::compare(episode, &agent);
        println!("\n  --- Agent ({rates}) ---");
        println!("  Final confidence : {}", confidence_bar(cmp.agent.final_value));
        println!("  Average          : {:.2}", cmp.agent.mean_value);
        println!(
            "  You ended {:+.2} relative to the agent (average {:+.2}).",
            cmp.final_gap, cmp.mean_gap
        );
    }

    println!("========================================\n");
    println!("  [r] Restart    [q] Quit\n");
    Ok(())
}

fn read_line(prompt: &str) -> Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Read the player's post-round choice. Returns `true` to restart, `false` to quit.
fn prompt_restart() -> Result<bool> {
    loop {
        match read_line("> ")?.to_lowercase().as_str() {
            "r" => return Ok(true),
            "q" => return Ok(false),
            _ => println!("  Press [r] to restart or [q] to quit."),
        }
    }
}

// ---------------------------------------------------------------------------
// Single round
// ---------------------------------------------------------------------------

/// Map what the player typed to a choice id: a 1-based position or the id itself.
fn resolve_input<'a>(node: &'a ScenarioNode, input: &'a str) -> &'a str {
    input
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| node.choices.get(i))
        .map_or(input, |c| c.id.as_str())
}

fn play_round(episode: &mut Episode) -> Result<RoundOutcome> {
    episode.start();

    loop {
        let node = episode.current_node()?.clone();
        show_node(episode, &node);

        if episode.is_stuck() {
            return Ok(RoundOutcome::Stuck);
        }

        let input = read_line("\n[You]: ")?;
        if input.is_empty() {
            println!("(Pick an option by number.)");
            continue;
        }
        if input.eq_ignore_ascii_case("quit") || input.eq_ignore_ascii_case("exit") {
            return Ok(RoundOutcome::Quit);
        }

        let choice_id = resolve_input(&node, &input);
        match episode.advance(choice_id) {
            Ok(Advance::Moved { node_id, step }) => {
                show_arrival(episode, &node_id, step.as_ref());
            }
            Ok(Advance::Finished { node_id, step }) => {
                show_arrival(episode, &node_id, step.as_ref());
                return Ok(RoundOutcome::Finished);
            }
            Ok(Advance::Rejected(Rejection::Blocked {
                required,
                current_value,
                ..
            })) => {
                println!(
                    "(That feels out of reach right now: it takes {required}, you have {current_value:.2}.)"
                );
            }
            Ok(Advance::Rejected(reason)) => {
                println!("(Nothing happens: {reason:?})");
            }
            Err(EpisodeError::UnknownChoice { .. }) => {
                println!("(No such option. Pick one of the numbers above.)");
            }
            Err(e) => return Err(e.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry point — runs rounds in a loop until the player quits
// ---------------------------------------------------------------------------

pub fn run(graph: ScenarioGraph, mode: Mode) -> Result<()> {
    let mut episode = Episode::new(Arc::new(graph), mode.variant());

    loop {
        println!("\n========================================");
        println!("   {}", mode.title());
        println!("========================================");
        println!("{}", episode.graph().title());
        println!("Pick options by number. Type quit to stop.");
        if mode == Mode::Filter {
            println!("Options that need more confidence than you have are locked.");
        }

        let outcome = play_round(&mut episode)?;
        show_round_over(&outcome, &episode, mode)?;

        if !prompt_restart()? {
            println!("Thanks for playing!");
            break;
        }

        info!("Player chose to restart");
        episode.reset();
    }

    Ok(())
}
