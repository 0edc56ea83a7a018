//! belay climbing environment CLI.
//!
//! Provides three modes of operation:
//! - `headless`: Run N episodes on the kinematic wall and print statistics
//! - `plan`: Print the motion plan of a config as JSON
//! - `info`: Print workspace crate versions and configuration

use std::error::Error;
use std::path::{Path, PathBuf};

use bevy::log::{Level, LogPlugin};
use bevy::prelude::*;
use clap::{Parser, Subcommand, ValueEnum};

use belay_core::config::{ClimbConfig, RewardVariant};
use belay_core::physics::ClimbPhysics;
use belay_core::traits::Policy;
use belay_env::observation::TASK_DIM;
use belay_gym::env::ClimbEnv;
use belay_sim::prelude::*;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Stance-driven climbing environment.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Log at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run episodes on the kinematic wall and print statistics.
    Headless {
        /// TOML task config; the built-in four-stance route when omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of episodes to run.
        #[arg(short = 'n', long, default_value_t = 1)]
        episodes: usize,

        /// Maximum steps per episode.
        #[arg(short, long)]
        max_steps: Option<u32>,

        /// Root seed for per-episode reset seeds.
        #[arg(short, long)]
        seed: Option<u64>,

        /// Reward strategy (improved, negative_distance, equation).
        #[arg(short, long)]
        reward: Option<RewardVariant>,

        /// Truncate after this many steps without reaching the desired stance.
        #[arg(long, default_value_t = 700)]
        stance_budget: u32,

        /// Policy driving the climber.
        #[arg(short, long, value_enum, default_value_t = PolicyKind::Grip)]
        policy: PolicyKind,
    },

    /// Print the motion plan of a config as JSON.
    Plan {
        /// TOML task config; the built-in four-stance route when omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print crate information.
    Info,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyKind {
    /// Still limbs, every grasp released.
    Zero,
    /// Still limbs, every grasp held.
    Grip,
    /// Uniform random actions.
    Random,
}

// ---------------------------------------------------------------------------
// Mode implementations
// ---------------------------------------------------------------------------

fn load_config(path: Option<&Path>) -> Result<ClimbConfig, Box<dyn Error>> {
    Ok(match path {
        Some(path) => ClimbConfig::from_file(path)?,
        None => ClimbConfig::default(),
    })
}

fn make_policy(kind: PolicyKind, env: &ClimbEnv, seed: u64) -> Box<dyn Policy> {
    match kind {
        PolicyKind::Zero => Box::new(ZeroPolicy::new(env.action_space().dim())),
        PolicyKind::Grip => Box::new(ConstantPolicy::grip(env.num_joints(), [true; 4])),
        PolicyKind::Random => Box::new(RandomPolicy::new(env.action_space().clone(), seed)),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_headless(
    config: Option<&Path>,
    episodes: usize,
    max_steps: Option<u32>,
    seed: Option<u64>,
    reward: Option<RewardVariant>,
    stance_budget: u32,
    policy: PolicyKind,
    log_level: Level,
) -> Result<(), Box<dyn Error>> {
    let config = load_config(config)?;
    let root_seed = seed.unwrap_or(config.simulation.seed);

    let mut builder = SceneBuilder::new(config)
        .with_seed(root_seed)
        .with_stance_step_budget(Some(stance_budget));
    if let Some(max_steps) = max_steps {
        builder = builder.with_max_episode_steps(max_steps);
    }
    if let Some(variant) = reward {
        builder = builder.with_reward_variant(variant);
    }

    let mut app = App::new();
    app.add_plugins(LogPlugin {
        level: log_level,
        ..Default::default()
    });
    let mut env = builder.build_in(app)?;

    let policy = make_policy(policy, &env, root_seed);
    let summaries = HeadlessRunner::new(root_seed).run(&mut env, policy.as_ref(), episodes)?;

    for (i, summary) in summaries.iter().enumerate() {
        println!(
            "episode {}: steps={}, reward={:.3}, stance={}/{}, success={}{}",
            i + 1,
            summary.steps,
            summary.total_reward,
            summary.final_stance_index,
            env.plan().len(),
            summary.is_success,
            if summary.truncated { " (truncated)" } else { "" },
        );
    }

    let stats = env.app().world().resource::<EpisodeStats>();
    println!(
        "\ntotal: episodes={}, steps={}, stance advances={}",
        stats.episodes_completed, stats.total_steps, stats.stance_advances
    );
    if let Some(rate) = stats.success_rate() {
        println!("success rate: {:.1}%", rate * 100.0);
    }
    Ok(())
}

fn run_plan(config: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let config = load_config(config)?;
    config.validate()?;
    println!("{}", serde_json::to_string_pretty(&config.stances)?);
    Ok(())
}

fn run_info() {
    let config = ClimbConfig::default();
    let body_dim = KinematicWall::from_config(&config).body_state().len();

    println!("belay v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("crates:");
    println!("  belay-core  {}", env!("CARGO_PKG_VERSION"));
    println!("  belay-env   {}", env!("CARGO_PKG_VERSION"));
    println!("  belay-gym   {}", env!("CARGO_PKG_VERSION"));
    println!("  belay-sim   {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("defaults:");
    println!("  holds              {}", config.wall.holds.len());
    println!("  stances            {}", config.stances.len());
    println!("  max_episode_steps  {}", config.simulation.max_episode_steps);
    println!("  action_dim         {}", config.simulation.action_dim());
    println!("  obs_dim            {}", body_dim + TASK_DIM);
    println!("  reward             {}", config.reward.variant);
    println!();
    println!("edition: 2024");
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };

    match cli.command {
        Some(Commands::Headless {
            config,
            episodes,
            max_steps,
            seed,
            reward,
            stance_budget,
            policy,
        }) => run_headless(
            config.as_deref(),
            episodes,
            max_steps,
            seed,
            reward,
            stance_budget,
            policy,
            log_level,
        ),
        Some(Commands::Plan { config }) => run_plan(config.as_deref()),
        Some(Commands::Info) => {
            run_info();
            Ok(())
        }
        None => run_headless(None, 1, None, None, None, 700, PolicyKind::Grip, log_level),
    }
}
