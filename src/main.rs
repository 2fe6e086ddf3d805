mod game;

use anyhow::{bail, Context, Result};
use game::Mode;
use mental_filter::scenario::datasets;
use mental_filter::{LearningRates, ScenarioGraph};

const USAGE: &str = "\
Usage: mental-filter <mode> [scenario] [positive_rate] [negative_rate]

Modes:
  filter    fixed rates α⁺=0.1 α⁻=0.8, high-confidence options locked
  custom    fixed rates from the command line, nothing locked
  adaptive  rates estimated from your own choices
  agent     play adaptively, then compare with an agent using the given rates

Scenario: a bundled dataset (mental_filter, outcome, school_week), a path to a
JSON file, or - for the mode's default. Rates default to 0.1 / 0.8.

Example:
  mental-filter custom outcome 0.3 0.6

Logging: set RUST_LOG=debug to see every TD update, RUST_LOG=trace for
estimator samples";

fn parse_rate(arg: Option<&String>, name: &str, default: f64) -> Result<f64> {
    match arg {
        Some(s) => s
            .parse::<f64>()
            .with_context(|| format!("{name} rate '{s}' is not a number")),
        None => Ok(default),
    }
}

/// Rates at positions 3 and 4 only matter to the modes that take them.
fn parse_rates(args: &[String]) -> Result<LearningRates> {
    let filter = LearningRates::MENTAL_FILTER;
    LearningRates::new(
        parse_rate(args.get(3), "positive", filter.positive())?,
        parse_rate(args.get(4), "negative", filter.negative())?,
    )
    .context("learning rates must lie in [0, 1]")
}

fn parse_mode(args: &[String]) -> Result<Mode> {
    let mode_arg = args.get(1).context(USAGE)?;
    let mode = match mode_arg.as_str() {
        "filter" => Mode::Filter,
        "custom" => Mode::Custom(parse_rates(args)?),
        "adaptive" => Mode::Adaptive,
        "agent" => Mode::Agent(parse_rates(args)?),
        other => bail!("unknown mode '{other}'\n\n{USAGE}"),
    };
    Ok(mode)
}

fn load_scenario(name: &str) -> Result<ScenarioGraph> {
    if let Some(graph) = datasets::load(name) {
        return graph.with_context(|| format!("bundled scenario '{name}' is invalid"));
    }
    let source = std::fs::read_to_string(name)
        .with_context(|| format!("'{name}' is neither a bundled scenario nor a readable file"))?;
    ScenarioGraph::from_json(&source).with_context(|| format!("invalid scenario file {name}"))
}

fn main() -> Result<()> {
    // Initialize logging. Control verbosity with RUST_LOG env var:
    //   RUST_LOG=info   mental-filter filter   # episode lifecycle
    //   RUST_LOG=debug  mental-filter filter   # + every TD step and re-estimation
    //   RUST_LOG=trace  mental-filter adaptive # + estimator samples
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("error"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = std::env::args().collect();
    let mode = parse_mode(&args)?;

    let scenario = match args.get(2).map(String::as_str) {
        None | Some("-") => mode.default_dataset(),
        Some(name) => name,
    };

    println!("Loading scenario: {scenario}");
    let graph = load_scenario(scenario)?;
    println!("  Nodes          : {}", graph.len());
    println!("  Longest path   : {} decisions", graph.longest_path());
    if let Mode::Custom(r) | Mode::Agent(r) = mode {
        println!("  Learning rates : {r}");
    }

    game::run(graph, mode)
}
