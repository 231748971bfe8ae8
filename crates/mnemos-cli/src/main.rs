//! Mnemos CLI
//!
//! Command-line interface for the Mnemos scheduling engine. Cards, review
//! logs and histories are JSON documents; pass `-` to read one from stdin.
//! Results go to stdout as JSON, logs go to stderr (`RUST_LOG=debug`).

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use mnemos_core::fsrs::{format_date, show_diff_message};
use mnemos_core::{
    create_empty_card, due_items, items_due_on, Card, DailyBudget, FSRSConfig, FSRSScheduler,
    LearningState, QueueItem, Rating, ReplayEntry, RescheduleOptions, ReviewLog, ReviewResult,
    SeedStrategy,
};

/// Mnemos - Spaced Repetition Scheduler CLI
#[derive(Parser)]
#[command(name = "mnemos")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "CLI for the Mnemos FSRS-6 spaced repetition scheduler")]
#[command(long_about = "Mnemos schedules flashcard reviews with the FSRS-6 memory model.\n\nCards and logs are read and written as JSON so the tool composes with any store.")]
struct Cli {
    /// Parameters JSON file (default: parameters.json in the platform config dir)
    #[arg(long, global = true, env = "MNEMOS_PARAMS")]
    params: Option<PathBuf>,

    /// Review time in RFC 3339 (default: current time)
    #[arg(long, global = true, value_parser = parse_time)]
    now: Option<DateTime<Utc>>,

    /// Fixed fuzz seed for reproducible intervals
    #[arg(long, global = true)]
    seed: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print an empty card due now
    New,

    /// Show where each rating would send a card
    Preview {
        /// Card JSON file (`-` for stdin)
        card: PathBuf,
        /// Print machine-readable JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Review a card and print the new card with its log
    Review {
        /// Card JSON file (`-` for stdin)
        card: PathBuf,
        /// again, hard, good, easy (or 1-4)
        rating: Rating,
    },

    /// Print the probability of recalling a card
    Retrievability {
        /// Card JSON file (`-` for stdin)
        card: PathBuf,
        /// Print the raw probability instead of a percentage
        #[arg(long)]
        raw: bool,
    },

    /// Undo the review a log describes
    Rollback {
        /// Card JSON file produced by the review
        card: PathBuf,
        /// Review log (or full review result) JSON file
        log: PathBuf,
    },

    /// Reset a card to New
    Forget {
        /// Card JSON file (`-` for stdin)
        card: PathBuf,
        /// Also reset the rep and lapse counters
        #[arg(long)]
        reset_count: bool,
    },

    /// Replay a review history and compute the correction for the stored card
    Reschedule {
        /// Stored card JSON file
        card: PathBuf,
        /// History JSON file: array of {review, rating[, state, due, stability, difficulty]}
        history: PathBuf,
        /// Replay Manual entries instead of skipping them
        #[arg(long)]
        keep_manual: bool,
        /// Carry recomputed stability/difficulty into the correction
        #[arg(long)]
        update_memory: bool,
        /// Replay in file order instead of sorting by review time
        #[arg(long)]
        no_sort: bool,
        /// Card to start replaying from
        #[arg(long)]
        first_card: Option<PathBuf>,
    },

    /// List cards to study from a collection
    Queue {
        /// Items JSON file: array of {id, card[, suspended, buried_until]}
        items: PathBuf,
        /// Maximum New cards per day
        #[arg(long, default_value = "20")]
        max_new: u32,
        /// New cards already introduced today
        #[arg(long, default_value = "0")]
        reviewed_today: u32,
        /// Shuffle New cards
        #[arg(long)]
        shuffle: bool,
        /// List scheduled cards due on this day (YYYY-MM-DD) instead
        #[arg(long)]
        day: Option<NaiveDate>,
    },

    /// Print the effective scheduler parameters
    Params {
        /// Print the parameters file location instead
        #[arg(long)]
        path: bool,
    },
}

/// A bare card, or a review result whose card is used
#[derive(Deserialize)]
#[serde(untagged)]
enum CardInput {
    Result(ReviewResult),
    Card(Card),
}

impl CardInput {
    fn into_card(self) -> Card {
        match self {
            CardInput::Result(result) => result.card,
            CardInput::Card(card) => card,
        }
    }
}

/// A bare review log, or a review result whose log is used
#[derive(Deserialize)]
#[serde(untagged)]
enum LogInput {
    Result(ReviewResult),
    Log(ReviewLog),
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let now = cli.now.unwrap_or_else(Utc::now);

    match cli.command {
        Commands::Params { path } => run_params(cli.params, path),
        command => {
            let scheduler = build_scheduler(cli.params.as_deref(), cli.seed)?;
            match command {
                Commands::New => print_json(&create_empty_card(now)),
                Commands::Preview { card, json } => run_preview(&scheduler, &card, now, json),
                Commands::Review { card, rating } => run_review(&scheduler, &card, now, rating),
                Commands::Retrievability { card, raw } => {
                    run_retrievability(&scheduler, &card, now, raw)
                }
                Commands::Rollback { card, log } => run_rollback(&scheduler, &card, &log),
                Commands::Forget { card, reset_count } => {
                    let card = read_card(&card)?;
                    print_json(&scheduler.forget(&card, now, reset_count))
                }
                Commands::Reschedule {
                    card,
                    history,
                    keep_manual,
                    update_memory,
                    no_sort,
                    first_card,
                } => {
                    let first_card = first_card.as_deref().map(read_card).transpose()?;
                    let options = RescheduleOptions {
                        order_by_review_time: !no_sort,
                        skip_manual: !keep_manual,
                        update_memory_state: update_memory,
                        first_card,
                        now,
                    };
                    run_reschedule(&scheduler, &card, &history, &options)
                }
                Commands::Queue {
                    items,
                    max_new,
                    reviewed_today,
                    shuffle,
                    day,
                } => {
                    let budget = DailyBudget {
                        max_new_per_day: max_new,
                        new_reviewed_today: reviewed_today,
                        last_review_date: Some(now.date_naive()),
                        shuffle_new: shuffle,
                    };
                    run_queue(&items, now, budget, day)
                }
                Commands::Params { .. } => Ok(()),
            }
        }
    }
}

/// Log to stderr so stdout stays machine-readable
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .with_ansi(false)
        .init();
}

fn parse_time(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {}", e))
}

// ============================================================================
// PARAMETERS
// ============================================================================

/// Default parameters file location
fn default_params_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "mnemos", "mnemos")
        .map(|dirs| dirs.config_dir().join("parameters.json"))
}

/// Load the parameter config from `explicit`, else the default file, else defaults
fn load_config(explicit: Option<&Path>) -> anyhow::Result<FSRSConfig> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => default_params_path().filter(|path| path.exists()),
    };
    match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading parameters");
            read_json(&path)
        }
        None => Ok(FSRSConfig::default()),
    }
}

fn build_scheduler(params: Option<&Path>, seed: Option<String>) -> anyhow::Result<FSRSScheduler> {
    let config = load_config(params)?;
    let scheduler = FSRSScheduler::from_config(config).context("invalid scheduler parameters")?;
    Ok(match seed {
        Some(seed) => scheduler.with_seed_strategy(SeedStrategy::Fixed(seed)),
        None => scheduler,
    })
}

fn run_params(params: Option<PathBuf>, show_path: bool) -> anyhow::Result<()> {
    if show_path {
        match params.or_else(default_params_path) {
            Some(path) => println!("{}", path.display()),
            None => anyhow::bail!("Could not determine project directories"),
        }
        return Ok(());
    }
    let scheduler = build_scheduler(params.as_deref(), None)?;
    print_json(&scheduler.params().to_config())
}

// ============================================================================
// JSON I/O
// ============================================================================

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = if path == Path::new("-") {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("reading stdin")?;
        buffer
    } else {
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
    };
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

fn read_card(path: &Path) -> anyhow::Result<Card> {
    read_json::<CardInput>(path).map(CardInput::into_card)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ============================================================================
// COMMANDS
// ============================================================================

fn run_preview(
    scheduler: &FSRSScheduler,
    card_path: &Path,
    now: DateTime<Utc>,
    json: bool,
) -> anyhow::Result<()> {
    let card = read_card(card_path)?;
    let preview = scheduler.preview(&card, now)?;
    if json {
        return print_json(&preview);
    }

    println!("{}", "=== Mnemos Preview ===".cyan().bold());
    println!(
        "{}: {}  {}: {}",
        "State".white().bold(),
        state_label(card.state),
        "Retrievability".white().bold(),
        scheduler.retrievability_percent(&card, now)
    );
    println!();
    for (rating, result) in preview.iter() {
        let label = match rating {
            Rating::Again => "again".red(),
            Rating::Hard => "hard".yellow(),
            Rating::Good => "good".green(),
            _ => "easy".blue(),
        };
        println!(
            "  {:6} {:11} {}  ({:>8})  S {:>9.2}  D {:>5.2}",
            label,
            state_label(result.card.state),
            format_date(result.card.due),
            show_diff_message(result.card.due, now, true),
            result.card.stability,
            result.card.difficulty
        );
    }
    Ok(())
}

fn state_label(state: LearningState) -> String {
    match state {
        LearningState::New => "new".dimmed().to_string(),
        LearningState::Learning => "learning".yellow().to_string(),
        LearningState::Review => "review".green().to_string(),
        LearningState::Relearning => "relearning".red().to_string(),
    }
}

fn run_review(
    scheduler: &FSRSScheduler,
    card_path: &Path,
    now: DateTime<Utc>,
    rating: Rating,
) -> anyhow::Result<()> {
    let card = read_card(card_path)?;
    let result = scheduler.review(&card, now, rating)?;
    print_json(&result)
}

fn run_retrievability(
    scheduler: &FSRSScheduler,
    card_path: &Path,
    now: DateTime<Utc>,
    raw: bool,
) -> anyhow::Result<()> {
    let card = read_card(card_path)?;
    if raw {
        println!("{}", scheduler.retrievability(&card, now));
    } else {
        println!("{}", scheduler.retrievability_percent(&card, now));
    }
    Ok(())
}

fn run_rollback(scheduler: &FSRSScheduler, card_path: &Path, log_path: &Path) -> anyhow::Result<()> {
    let card = read_card(card_path)?;
    let log = match read_json::<LogInput>(log_path)? {
        LogInput::Result(result) => result.log,
        LogInput::Log(log) => log,
    };
    print_json(&scheduler.rollback(&card, &log)?)
}

fn run_reschedule(
    scheduler: &FSRSScheduler,
    card_path: &Path,
    history_path: &Path,
    options: &RescheduleOptions,
) -> anyhow::Result<()> {
    let card = read_card(card_path)?;
    let history: Vec<ReplayEntry> = read_json(history_path)?;
    let result = scheduler.reschedule(&card, &history, options)?;
    print_json(&result)
}

fn run_queue(
    items_path: &Path,
    now: DateTime<Utc>,
    mut budget: DailyBudget,
    day: Option<NaiveDate>,
) -> anyhow::Result<()> {
    let items: Vec<QueueItem> = read_json(items_path)?;
    let queue = match day {
        Some(day) => items_due_on(&items, day, now.date_naive()),
        None => due_items(&items, now, &mut budget, &mut rand::thread_rng()),
    };

    if queue.is_empty() {
        println!("{}", "Nothing to review.".dimmed());
        return Ok(());
    }
    println!("{} {}", queue.len().to_string().cyan().bold(), "cards to review".white().bold());
    for item in queue {
        println!(
            "  {:24} {:11} {}",
            item.id,
            state_label(item.card.state),
            format_date(item.card.due)
        );
    }
    Ok(())
}
