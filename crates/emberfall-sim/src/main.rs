//! Headless match harness.
//!
//! Usage:
//!
//! ```text
//! emberfall-sim [--players N] [--seed S] [--matches M] [--realtime] [--tuning FILE]
//! ```
//!
//! Batch mode runs `M` independent matches (seeds `S`, `S + 1`, ...) in
//! parallel as fast as possible. `--realtime` runs a single match through the
//! tokio driver at the tuned tick rate. Either way the final rankings are
//! printed to stdout as JSON. Logs go to stderr, filtered by `RUST_LOG`;
//! `LOG_FORMAT=json` switches them to JSON lines.

use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use emberfall_core::{
    ClassKind, ConnectionId, MatchDriver, Output, RankEntry, RosterEntry, Simulation, Tuning,
};
use rayon::prelude::*;
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

/// Step budget for a batch match that somehow never ends.
const MAX_TICKS: u64 = 1_000_000;

// =============================================================================
// Arguments
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
struct Args {
    players: u32,
    seed: u64,
    matches: u32,
    realtime: bool,
    tuning: Option<PathBuf>,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            players: 10,
            seed: 1,
            matches: 1,
            realtime: false,
            tuning: None,
        }
    }
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self> {
        let mut parsed = Self::default();
        while let Some(flag) = args.next() {
            match flag.as_str() {
                "--players" => parsed.players = value(&flag, args.next())?,
                "--seed" => parsed.seed = value(&flag, args.next())?,
                "--matches" => parsed.matches = value(&flag, args.next())?,
                "--realtime" => parsed.realtime = true,
                "--tuning" => {
                    let path = args.next().with_context(|| format!("{flag} needs a path"))?;
                    parsed.tuning = Some(PathBuf::from(path));
                }
                other => bail!("unknown argument `{other}`"),
            }
        }
        if parsed.players == 0 {
            bail!("--players must be at least 1");
        }
        Ok(parsed)
    }
}

fn value<T>(flag: &str, raw: Option<String>) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = raw.with_context(|| format!("{flag} needs a value"))?;
    raw.parse()
        .with_context(|| format!("invalid value `{raw}` for {flag}"))
}

// =============================================================================
// Setup
// =============================================================================

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact()
            .init();
    }
}

fn load_tuning(path: Option<&PathBuf>) -> Result<Tuning> {
    let Some(path) = path else {
        return Ok(Tuning::default());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading tuning file {}", path.display()))?;
    let tuning: Tuning = serde_json::from_str(&raw)
        .with_context(|| format!("parsing tuning file {}", path.display()))?;
    tuning
        .validate()
        .with_context(|| format!("invalid tuning in {}", path.display()))?;
    Ok(tuning)
}

fn bot_roster(players: u32) -> Vec<RosterEntry> {
    (1..=players)
        .map(|i| {
            let class = ClassKind::ALL[(i as usize) % ClassKind::ALL.len()];
            RosterEntry::new(format!("bot-{i}"), i, format!("Bot {i}"), class)
        })
        .collect()
}

// =============================================================================
// Running
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MatchSummary {
    seed: u64,
    ticks: u64,
    ranking: Vec<RankEntry>,
}

fn run_batch_match(players: u32, seed: u64, tuning: Tuning) -> Result<MatchSummary> {
    let mut sim = Simulation::with_tuning(&bot_roster(players), tuning, seed)?;
    while sim.tick() < MAX_TICKS {
        for output in sim.step() {
            if let Output::End(result) = output {
                info!(seed, ticks = sim.tick(), "batch match finished");
                return Ok(MatchSummary {
                    seed,
                    ticks: sim.tick(),
                    ranking: result.ranking,
                });
            }
        }
    }
    bail!("match with seed {seed} did not end within {MAX_TICKS} ticks")
}

fn run_batch(args: &Args, tuning: &Tuning) -> Result<Vec<MatchSummary>> {
    info!(
        matches = args.matches,
        players = args.players,
        seed = args.seed,
        "running batch"
    );
    (0..args.matches)
        .into_par_iter()
        .map(|i| run_batch_match(args.players, args.seed + u64::from(i), tuning.clone()))
        .collect()
}

fn run_realtime(args: &Args, tuning: Tuning) -> Result<MatchSummary> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;

    runtime.block_on(async {
        let sim = Simulation::with_tuning(&bot_roster(args.players), tuning, args.seed)?;
        let driver = MatchDriver::new(sim);
        let mut outputs = driver.subscribe();
        driver.start()?;

        loop {
            tokio::select! {
                signal = tokio::signal::ctrl_c() => {
                    signal.context("listening for ctrl-c")?;
                    warn!("interrupted, disconnecting every bot");
                    for i in 1..=args.players {
                        driver.remove_player(&ConnectionId::from(format!("bot-{i}")));
                    }
                }
                received = outputs.recv() => match received {
                    Ok(Output::Snapshot(snapshot)) => {
                        debug!(
                            tick = snapshot.tick,
                            alive = snapshot.players.len(),
                            hazards = snapshot.hazards.len(),
                            items = snapshot.items.len(),
                            "snapshot"
                        );
                    }
                    Ok(Output::End(result)) => {
                        let ticks = driver.with_simulation(Simulation::tick);
                        driver.stop();
                        return Ok(MatchSummary {
                            seed: args.seed,
                            ticks,
                            ranking: result.ranking,
                        });
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "output receiver lagged");
                    }
                    Err(RecvError::Closed) => bail!("match driver closed before the match ended"),
                },
            }
        }
    })
}

fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse(env::args().skip(1))?;
    let tuning = load_tuning(args.tuning.as_ref())?;

    let summaries = if args.realtime {
        vec![run_realtime(&args, tuning)?]
    } else {
        run_batch(&args, &tuning)?
    };

    for summary in &summaries {
        if let Some(winner) = summary.ranking.first() {
            info!(seed = summary.seed, ticks = summary.ticks, winner = %winner.name, "result");
        }
    }
    println!("{}", serde_json::to_string_pretty(&summaries)?);
    Ok(())
}
