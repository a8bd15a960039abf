//! Tumbler CLI - binary entry point.
//!
//! ```text
//! tumbler unlock --bits TTFT      one attempt against a ring built from flags
//! tumbler trials --count 1000     success rate over random rings
//! ```
//!
//! Settings come from `~/.tumbler/config.toml` (see [`tumbler_config`]);
//! flags override them. Logs go to stderr, filtered by `RUST_LOG`.

mod trials;

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use tumbler_config::TumblerConfig;
use tumbler_core::Unlocker;
use tumbler_device::BitRing;
use tumbler_types::{RotationPolicy, parse_bits};

use crate::trials::TrialPlan;

#[derive(Debug, Parser)]
#[command(name = "tumbler", version, about = "Drive a bit-ring lock to a uniform state")]
struct Cli {
    /// Config file to use instead of ~/.tumbler/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one unlock attempt against a ring built from flags.
    Unlock(UnlockArgs),
    /// Run many attempts over random rings and report the success rate.
    Trials(TrialsArgs),
}

#[derive(Debug, Args)]
struct UnlockArgs {
    /// Initial ring contents, e.g. TTFT.
    #[arg(long)]
    bits: String,

    /// Positions a single peek may disclose.
    #[arg(long)]
    budget: Option<usize>,

    /// Rotation policy. Defaults to the configured policy, then fixed.
    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,

    #[arg(long, default_value_t = 1)]
    step: u64,

    /// Multiplier for the polynomial policy.
    #[arg(long, default_value_t = 1)]
    multiplier: u64,

    /// Seed for the ring and the unlocker.
    #[arg(long)]
    seed: Option<u64>,

    /// Print the recorded trace.
    #[arg(long)]
    trace: bool,

    /// Print the result as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct TrialsArgs {
    #[arg(long, default_value_t = 1000)]
    count: usize,

    #[arg(long)]
    size: Option<usize>,

    #[arg(long)]
    budget: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,

    /// Exit with failure when the success rate falls below this.
    #[arg(long, default_value_t = 0.99)]
    min_rate: f64,

    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PolicyArg {
    Fixed,
    Polynomial,
    Random,
}

impl PolicyArg {
    fn into_policy(self, step: u64, multiplier: u64) -> RotationPolicy {
        match self {
            Self::Fixed => RotationPolicy::Fixed { step },
            Self::Polynomial => RotationPolicy::Polynomial { step, multiplier },
            Self::Random => RotationPolicy::Random,
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<TumblerConfig> {
    match path {
        Some(path) => TumblerConfig::load_from(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(TumblerConfig::load()?.unwrap_or_default()),
    }
}

fn run_unlock(config: &TumblerConfig, args: UnlockArgs) -> Result<ExitCode> {
    let bits = parse_bits(&args.bits).map_err(|(index, glyph)| {
        anyhow!("--bits: {glyph:?} at position {index} is not T or F")
    })?;
    let shape = config.device_shape()?;
    let budget = args.budget.unwrap_or(shape.budget.min(bits.len()));
    let policy = match args.policy {
        Some(kind) => kind.into_policy(args.step, args.multiplier),
        None => shape.policy.unwrap_or_default(),
    };

    let mut settings = config.unlock_settings()?;
    if let Some(seed) = args.seed {
        settings.seed = Some(seed);
    }
    let mut ring = match settings.seed {
        Some(seed) => BitRing::with_seed(bits, budget, policy, seed),
        None => BitRing::new(bits, budget, policy),
    }
    .context("building ring")?;
    let initial = ring.render_bits();

    let mut unlocker = Unlocker::with_settings(Some(&mut ring), settings);
    let unlocked = unlocker.unlock();
    let trace = unlocker.trace().clone();

    if args.json {
        let report = serde_json::json!({
            "unlocked": unlocked,
            "policy": policy,
            "initial": initial,
            "bits": ring.render_bits(),
            "spins": ring.spins(),
            "calls": trace.device_calls(),
            "trace": trace,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        if args.trace {
            print!("{}", trace.render());
        }
        println!(
            "{} after {} device calls: {} -> {}",
            if unlocked { "unlocked" } else { "still locked" },
            trace.device_calls(),
            initial,
            ring.render_bits()
        );
    }

    Ok(if unlocked {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn run_trials(config: &TumblerConfig, args: TrialsArgs) -> Result<ExitCode> {
    if !(0.0..=1.0).contains(&args.min_rate) {
        bail!("--min-rate must be between 0 and 1, got {}", args.min_rate);
    }
    let shape = config.device_shape()?;
    let settings = config.unlock_settings()?;
    let plan = TrialPlan {
        count: args.count,
        size: args.size.unwrap_or(shape.size),
        budget: args.budget.unwrap_or(shape.budget),
        settings,
    };

    let mut rng = match args.seed.or(settings.seed) {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let report = trials::run(plan, &mut rng).context("generating rings")?;
    tracing::info!(
        attempts = report.attempts(),
        unlocked = report.unlocked(),
        calls = report.calls,
        "trials finished"
    );

    if args.json {
        let summary = serde_json::json!({
            "report": report,
            "rate": report.rate(),
            "min_rate": args.min_rate,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{report}");
    }

    if report.rate() < args.min_rate {
        eprintln!(
            "success rate {:.3} is below the minimum {:.3}",
            report.rate(),
            args.min_rate
        );
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing();

    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Unlock(args) => run_unlock(&config, args),
        Command::Trials(args) => run_trials(&config, args),
    }
}
