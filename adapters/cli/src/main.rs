#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless runner that plays an Orbital Defence session and reports the outcome.

use std::{fs, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use orbital_defence_core::{Event, UnitKind, Vec2};
use orbital_defence_persistence::{
    AchievementStore, FileAchievementStore, FileSaveStore, MemoryAchievementStore,
};
use orbital_defence_session::{Session, SessionConfig, Summary};
use orbital_defence_world::query;
use tracing_subscriber::EnvFilter;

/// Rings around the tower that auto-placement fills from the inside out.
const PLACEMENT_RINGS: [f32; 3] = [95.0, 160.0, 230.0];
const SLOTS_PER_RING: u32 = 16;

/// Command-line arguments accepted by the runner.
#[derive(Debug, Parser)]
#[command(name = "orbital-defence", about = "Run a headless Orbital Defence session")]
struct CliArgs {
    /// TOML file with session parameters.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Seed overriding the configured one.
    #[arg(long)]
    seed: Option<u64>,

    /// Number of frames to simulate.
    #[arg(long, default_value_t = 10_000)]
    frames: u32,

    /// Wall-clock length of a frame in milliseconds.
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,

    /// Game speed multiplier.
    #[arg(long, default_value_t = 1)]
    speed: u32,

    /// Spend credits on units around the tower whenever possible.
    #[arg(long)]
    auto_place: bool,

    /// Resume from this save file before playing and write it back afterwards.
    #[arg(long, value_name = "PATH")]
    save: Option<PathBuf>,

    /// Achievement file shared across runs.
    #[arg(long, value_name = "PATH")]
    achievements: Option<PathBuf>,
}

/// Entry point for the Orbital Defence command-line interface.
fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let args = CliArgs::parse();
    let config = load_config(&args)?;

    let achievements: Box<dyn AchievementStore> = match &args.achievements {
        Some(path) => Box::new(FileAchievementStore::new(path)),
        None => Box::new(MemoryAchievementStore::new()),
    };
    let mut session = Session::new(config, achievements).context("invalid session config")?;
    session
        .set_speed(args.speed)
        .context("invalid --speed value")?;

    if let Some(path) = &args.save {
        if path.exists() {
            let _ = session
                .load(&FileSaveStore::new(path))
                .with_context(|| format!("failed to load save {}", path.display()))?;
        }
    }

    let frame = Duration::from_millis(args.frame_ms);
    for _ in 0..args.frames {
        if args.auto_place {
            auto_place(&mut session);
        }
        let events = session.advance(frame);
        report(&events);
        if query::is_game_over(session.world()) {
            break;
        }
    }

    if let Some(path) = &args.save {
        session
            .save(&mut FileSaveStore::new(path))
            .with_context(|| format!("failed to write save {}", path.display()))?;
    }

    print_summary(&session.summary());
    Ok(())
}

fn load_config(args: &CliArgs) -> Result<SessionConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            SessionConfig::from_toml_str(&contents)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => SessionConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    Ok(config)
}

/// Buys the most expensive affordable unit for the first free slot, repeatedly.
fn auto_place<A: AchievementStore>(session: &mut Session<A>) {
    let center = query::tower(session.world()).position();
    let mut kinds: Vec<UnitKind> = UnitKind::ALL
        .into_iter()
        .filter(|kind| query::is_unlocked(session.world(), *kind))
        .collect();
    kinds.sort_by_key(|kind| std::cmp::Reverse(kind.archetype().cost));

    for kind in kinds {
        for radius in PLACEMENT_RINGS {
            for slot in 0..SLOTS_PER_RING {
                if query::credits(session.world()) < kind.archetype().cost {
                    break;
                }
                let angle = slot as f32 * std::f32::consts::TAU / SLOTS_PER_RING as f32;
                let position = center + Vec2::new(angle.cos(), angle.sin()) * radius;
                let _ = session.place_unit(kind, position);
            }
        }
    }
}

fn report(events: &[Event]) {
    for event in events {
        match event {
            Event::WaveCompleted {
                completed, bonus, ..
            } => tracing::info!(wave = completed, bonus, "wave cleared"),
            Event::AchievementUnlocked { achievement } => {
                tracing::info!(achievement = achievement.name(), "achievement unlocked");
            }
            Event::GameOver { wave, score } => tracing::info!(wave, score, "tower destroyed"),
            _ => {}
        }
    }
}

fn print_summary(summary: &Summary) {
    println!("wave:    {}", summary.wave);
    println!("credits: {}", summary.credits);
    println!("score:   {}", summary.score);
    println!("tower:   {}/{}", summary.tower_hp, summary.tower_max_hp);
    println!(
        "status:  {}",
        if summary.game_over {
            "mission failed"
        } else {
            "holding"
        }
    );
    for (achievement, unlocked) in &summary.achievements {
        let mark = if *unlocked { "x" } else { " " };
        println!("[{mark}] {} - {}", achievement.name(), achievement.description());
    }
}
