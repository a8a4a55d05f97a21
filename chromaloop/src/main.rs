// src/main.rs
//
// chromaloop CLI:
// - filter:  raw recordings directory -> filtered recordings directory
// - episode: run one environment episode with a built-in policy and persist
//            the resulting color scheme
// - scheme:  decode one filtered recording and print its scheme as-is

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use chromaloop::config::Config;
use chromaloop::engagement::load_engagement;
use chromaloop::logging::init_tracing;
use chromaloop::pipeline::filter_all;
use chromaloop::recording::{decode_recording, FilteredRecording};
use chromaloop::rl::{
    run_episode, ColorEnv, EnvTelemetry, EpisodeConfig, NoopPolicy, Policy, UniformPolicy,
};
use chromaloop::scheme::{write_scheme, ColorScheme};
use chromaloop::store::DirRecordingStore;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum PolicyArg {
    Noop,
    Uniform,
}

#[derive(Debug, Parser)]
#[command(
    name = "chromaloop",
    about = "Session-recording color extraction and optimisation",
    version
)]
struct Args {
    /// YAML config file (optional).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Raw recordings directory (overrides config / CHROMALOOP_RECORDINGS_DIR).
    #[arg(long, global = true)]
    recordings_dir: Option<PathBuf>,

    /// Filtered recordings directory (overrides config / CHROMALOOP_FILTERED_DIR).
    #[arg(long, global = true)]
    filtered_dir: Option<PathBuf>,

    /// Scheme output directory (overrides config / CHROMALOOP_SCHEMES_DIR).
    #[arg(long, global = true)]
    schemes_dir: Option<PathBuf>,

    /// Engagement table JSON (overrides config / CHROMALOOP_ENGAGEMENT_PATH).
    #[arg(long, global = true)]
    engagement: Option<PathBuf>,

    /// Deterministic seed (overrides config / CHROMALOOP_SEED).
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Filter every raw recording into `<stem>-filtered.json`.
    Filter,
    /// Reset the environment, run a policy, persist the scheme.
    Episode {
        #[arg(long, value_enum, default_value = "noop")]
        policy: PolicyArg,

        /// Step cap for the episode.
        #[arg(long, default_value_t = 100)]
        max_steps: u64,

        /// Print the summary without writing a scheme file.
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the scheme of one filtered recording without optimisation.
    Scheme { file: PathBuf },
}

fn resolve_config(args: &Args) -> Result<Config> {
    let mut cfg = Config::load(args.config.as_deref()).context("loading configuration")?;

    if let Some(dir) = &args.recordings_dir {
        cfg.recordings_dir = dir.clone();
    }
    if let Some(dir) = &args.filtered_dir {
        cfg.filtered_dir = dir.clone();
    }
    if let Some(dir) = &args.schemes_dir {
        cfg.schemes_dir = dir.clone();
    }
    if let Some(path) = &args.engagement {
        cfg.engagement_path = Some(path.clone());
    }
    if let Some(seed) = args.seed {
        cfg.seed = seed;
    }
    cfg.validate().context("validating configuration")?;
    Ok(cfg)
}

fn unix_now() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock before unix epoch")?
        .as_secs())
}

fn run_filter(cfg: &Config) -> Result<()> {
    let store = DirRecordingStore::new(&cfg.recordings_dir);
    let mut rng = ChaCha8Rng::seed_from_u64(cfg.seed);
    let report = filter_all(&store, &cfg.filtered_dir, &mut rng)
        .with_context(|| format!("filtering {}", cfg.recordings_dir.display()))?;

    info!(
        written = report.written.len(),
        skipped = report.skipped.len(),
        snapshots = report.snapshots,
        "batch filter finished"
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_episode_cmd(cfg: &Config, policy: PolicyArg, max_steps: u64, dry_run: bool) -> Result<()> {
    let store = DirRecordingStore::new(&cfg.filtered_dir);
    let engagement = load_engagement(cfg.engagement_path.as_deref())
        .context("loading engagement table")?;
    let mut env = ColorEnv::new(Box::new(store), engagement, cfg.env_config())
        .with_context(|| format!("opening {}", cfg.filtered_dir.display()))?;
    if env.recordings().is_empty() {
        bail!("no filtered recordings in {}", cfg.filtered_dir.display());
    }

    let mut policy: Box<dyn Policy> = match policy {
        PolicyArg::Noop => Box::new(NoopPolicy),
        PolicyArg::Uniform => Box::new(UniformPolicy::new(cfg.seed)),
    };
    let episode = EpisodeConfig::default()
        .with_seed(cfg.seed)
        .with_max_steps(max_steps);
    let mut telemetry = EnvTelemetry::from_env();

    let summary = run_episode(&mut env, policy.as_mut(), &episode, &mut telemetry)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if !dry_run {
        let path = write_scheme(&cfg.schemes_dir, &summary.scheme, unix_now()?)?;
        info!(path = %path.display(), "scheme written");
    }
    Ok(())
}

fn run_scheme(file: &Path) -> Result<()> {
    let contents =
        fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let recording = FilteredRecording::from_json_str(&contents)
        .with_context(|| format!("parsing {}", file.display()))?;
    let scheme = ColorScheme::from_colors(&decode_recording(recording));

    info!(scheme = %scheme.describe(), "decoded scheme");
    println!("{}", serde_json::to_string(&scheme)?);
    Ok(())
}

fn main() -> Result<()> {
    init_tracing("info");
    let args = Args::parse();

    match &args.command {
        Command::Scheme { file } => run_scheme(file),
        Command::Filter => run_filter(&resolve_config(&args)?),
        Command::Episode {
            policy,
            max_steps,
            dry_run,
        } => run_episode_cmd(&resolve_config(&args)?, *policy, *max_steps, *dry_run),
    }
}
