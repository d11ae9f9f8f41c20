//! CourseTrack CLI - lesson progress and course completion.

mod terminal;

use std::future::Future;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use coursetrack_core::{CourseConfig, LessonId};
use coursetrack_progress::{
    apply_commands, watch_changes, Presenter, ProgressTracker, ResetConfirmation, ResetOutcome,
    Reward, RewardOutcome,
};
use coursetrack_storage::{ChangeNotifier, JsonFileStore};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use terminal::{print_snapshot, TerminalPresenter};

#[derive(Parser)]
#[command(name = "coursetrack")]
#[command(about = "Track lesson progress through a course", long_about = None)]
struct Cli {
    /// Progress store file
    #[arg(long, global = true, default_value = ".coursetrack/progress.json")]
    store: PathBuf,

    /// Course definition (JSON); the built-in course when omitted
    #[arg(long, global = true)]
    course: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show progress per module
    Status,
    /// Mark a lesson complete
    Complete {
        /// Lesson ID, e.g. modul1_bilder_completed
        lesson: String,
    },
    /// Mark every lesson complete
    Simulate,
    /// Erase all progress and rewards
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Follow changes written by other processes
    Watch {
        /// Poll interval in milliseconds
        #[arg(long, default_value = "500")]
        interval_ms: u64,
    },
    /// Print the course certificate
    Certificate,
    /// Unlock a reward
    Unlock {
        /// Reward to unlock
        reward: RewardArg,
    },
    /// Dump diagnostics as JSON
    Debug,
}

#[derive(Clone, Copy, ValueEnum)]
enum RewardArg {
    AdvancedProjects,
    MentorMode,
    Portfolio,
}

impl From<RewardArg> for Reward {
    fn from(arg: RewardArg) -> Self {
        match arg {
            RewardArg::AdvancedProjects => Reward::AdvancedProjects,
            RewardArg::MentorMode => Reward::MentorMode,
            RewardArg::Portfolio => Reward::Portfolio,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let course = match &cli.course {
        Some(path) => CourseConfig::from_path(path)
            .with_context(|| format!("loading course from {}", path.display()))?,
        None => CourseConfig::reference(),
    };

    let store = Arc::new(
        JsonFileStore::open(&cli.store)
            .with_context(|| format!("opening store {}", cli.store.display()))?,
    );
    let mut tracker = ProgressTracker::new(course, Arc::clone(&store));
    let mut presenter = TerminalPresenter::from_store(&*store);

    match cli.command {
        Commands::Status => {
            print_snapshot(&tracker.snapshot());
            tracker.initialize_with(&mut presenter);
        }
        Commands::Complete { lesson } => {
            let lesson = LessonId::from(lesson);
            let visibility = presenter.is_section_visible()?.into();
            let Some(evaluation) = tracker.complete_lesson(&lesson, visibility) else {
                bail!("Unknown lesson: {}", lesson);
            };
            println!("Completed {}", lesson);
            apply_commands(&mut presenter, &evaluation.commands);
        }
        Commands::Simulate => {
            let visibility = presenter.is_section_visible()?.into();
            let evaluation = tracker.simulate_all(visibility);
            apply_commands(&mut presenter, &evaluation.commands);
            println!("All lessons marked complete");
        }
        Commands::Reset { yes } => {
            let confirmation = if yes { ResetConfirmation::Confirmed } else { confirm_reset()? };
            match tracker.reset_with(&mut presenter, confirmation) {
                ResetOutcome::Declined => println!("Nothing was reset"),
                ResetOutcome::Reset { .. } => println!("All progress reset"),
            }
        }
        Commands::Watch { interval_ms } => {
            watch(tracker, presenter, store, Duration::from_millis(interval_ms.max(1))).await;
        }
        Commands::Certificate => match tracker.certificate() {
            Some(certificate) => println!("{}", certificate),
            None => {
                let overall = tracker.snapshot().overall;
                println!(
                    "No certificate yet: {}/{} lessons complete",
                    overall.completed, overall.total
                );
            }
        },
        Commands::Unlock { reward } => {
            let reward = Reward::from(reward);
            match tracker.unlock(reward) {
                RewardOutcome::Unlocked { .. } => println!("Unlocked {}", reward),
                RewardOutcome::AlreadyUnlocked => println!("{} was already unlocked", reward),
                RewardOutcome::CourseIncomplete => {
                    println!("Finish every lesson to unlock {}", reward)
                }
            }
        }
        Commands::Debug => {
            let report = tracker.debug_report();
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

async fn watch(
    mut tracker: ProgressTracker<Arc<JsonFileStore>>,
    mut presenter: TerminalPresenter,
    store: Arc<JsonFileStore>,
    interval: Duration,
) {
    let mut changes = store.subscribe();
    let (stop, shutdown) = mpsc::channel(1);

    tokio::spawn(forward_stop(tokio::signal::ctrl_c(), stop));

    let poller = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            if let Err(e) = store.reload() {
                warn!("Reload failed: {}", e);
            }
        }
    });

    print_snapshot(&tracker.snapshot());
    tracker.initialize_with(&mut presenter);
    info!("Watching for changes, Ctrl-C to stop");

    let evaluations = watch_changes(&mut tracker, &mut presenter, &mut changes, shutdown).await;
    poller.abort();
    info!("Stopped after {} evaluations", evaluations);
}

/// Send `stop` once `signal` resolves. If the signal cannot be listened for,
/// `stop` is held open so the watch loop keeps running.
async fn forward_stop<F>(signal: F, stop: mpsc::Sender<()>)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => {
            let _ = stop.send(()).await;
        }
        Err(e) => {
            warn!("Cannot listen for Ctrl-C, stop the process another way: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

fn confirm_reset() -> Result<ResetConfirmation> {
    print!("Reset ALL progress? This cannot be undone. [y/N] ");
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    let confirmed = matches!(answer.trim().to_lowercase().as_str(), "y" | "yes");
    Ok(confirmed.into())
}
