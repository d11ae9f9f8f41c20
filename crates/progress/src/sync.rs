//! Keeping a tracker in step with changes made elsewhere.
//!
//! Other contexts (tabs, processes) write to the same store. Their changes
//! arrive on a [`ChangeReceiver`] with no ordering guarantee beyond arrival
//! order; each burst of lesson changes triggers one re-evaluation.

use coursetrack_storage::{ChangeReceiver, KeyValueStore};
use tokio::sync::mpsc;
use tokio::time::{timeout_at, Instant};
use tracing::debug;

use crate::presenter::Presenter;
use crate::tracker::ProgressTracker;

/// Process external changes until `shutdown` fires or the change stream
/// closes. Returns the number of evaluations performed.
///
/// A lesson change invalidates the memoised count at once; evaluation waits
/// until no further lesson change has arrived for the configured debounce.
/// Shutdown takes priority over new changes; whatever is already queued
/// when it fires gets one final evaluation without waiting.
pub async fn watch_changes<S, P>(
    tracker: &mut ProgressTracker<S>,
    presenter: &mut P,
    changes: &mut ChangeReceiver,
    mut shutdown: mpsc::Receiver<()>,
) -> usize
where
    S: KeyValueStore,
    P: Presenter + ?Sized,
{
    let mut evaluations = 0;

    loop {
        tokio::select! {
            biased;

            _ = shutdown.recv() => {
                if drain(changes) > 0 {
                    tracker.evaluate_with(presenter);
                    evaluations += 1;
                }
                break;
            }
            change = changes.recv() => {
                let Some(change) = change else {
                    debug!("Change stream closed");
                    break;
                };
                if !change.is_lesson_change() {
                    debug!("Ignoring change to {}", change.key);
                    continue;
                }

                tracker.invalidate_cache();
                let coalesced = settle(tracker, changes).await;
                debug!("Re-evaluating after {} lesson changes", coalesced + 1);

                tracker.evaluate_with(presenter);
                evaluations += 1;
            }
        }
    }

    evaluations
}

/// Absorb lesson changes until the stream has been quiet for the debounce
/// period. Returns how many were absorbed.
async fn settle<S: KeyValueStore>(
    tracker: &mut ProgressTracker<S>,
    changes: &mut ChangeReceiver,
) -> usize {
    let debounce = tracker.config().debounce;
    let mut absorbed = 0;
    let mut deadline = Instant::now() + debounce;

    while let Ok(Some(change)) = timeout_at(deadline, changes.recv()).await {
        if change.is_lesson_change() {
            tracker.invalidate_cache();
            absorbed += 1;
            deadline = Instant::now() + debounce;
        }
    }

    absorbed
}

/// Empty the queue without waiting. Returns how many lesson changes it held.
fn drain(changes: &mut ChangeReceiver) -> usize {
    let mut lessons = 0;
    while let Ok(change) = changes.try_recv() {
        if change.is_lesson_change() {
            lessons += 1;
        }
    }
    lessons
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presenter::apply_commands;
    use crate::testing::RecordingPresenter;
    use crate::tracker::TrackerConfig;
    use coursetrack_core::{keys, CourseConfig, SectionVisibility};
    use coursetrack_storage::{ChangeNotifier, MemoryStore};
    use std::time::Duration;

    fn tracker(store: MemoryStore) -> ProgressTracker<MemoryStore> {
        ProgressTracker::new(CourseConfig::reference(), store)
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_tab_completing_course_unlocks() {
        let ours = MemoryStore::new();
        let theirs = ours.open_context();
        let mut changes = ours.subscribe();
        let mut tracker = tracker(ours);
        let mut presenter = RecordingPresenter::default();
        let (stop, shutdown) = mpsc::channel(1);

        // Prime the memo so a stale count would be visible.
        assert_eq!(tracker.completed_count(), 0);

        for id in tracker.course().lesson_ids() {
            theirs.set(id.as_str(), "true").unwrap();
        }
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            let _ = stop.send(()).await;
        });

        let started = Instant::now();
        let evaluations = watch_changes(&mut tracker, &mut presenter, &mut changes, shutdown).await;

        assert_eq!(evaluations, 1);
        assert!(started.elapsed() >= tracker.config().debounce);
        assert!(presenter.visible);
        assert_eq!(presenter.shown, 1);
        assert!(tracker.store().is_true(keys::COMPLETION_SECTION_UNLOCKED));
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_is_coalesced_into_one_evaluation() {
        let ours = MemoryStore::new();
        let theirs = ours.open_context();
        let mut changes = ours.subscribe();
        let mut tracker = tracker(ours);
        let mut presenter = RecordingPresenter::default();
        let (stop, shutdown) = mpsc::channel(1);

        for id in tracker.course().lesson_ids() {
            theirs.set(id.as_str(), "true").unwrap();
        }
        stop.send(()).await.unwrap();

        let evaluations = watch_changes(&mut tracker, &mut presenter, &mut changes, shutdown).await;
        assert_eq!(evaluations, 1);
        assert_eq!(presenter.shown, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_external_reset_hides_section() {
        let ours = MemoryStore::new();
        let theirs = ours.open_context();
        let mut changes = ours.subscribe();
        let mut tracker = tracker(ours);
        let mut presenter = RecordingPresenter::default();

        let evaluation = tracker.simulate_all(SectionVisibility::Hidden);
        apply_commands(&mut presenter, &evaluation.commands);
        assert!(presenter.visible);

        theirs.remove("modul4_spill_completed").unwrap();
        let (stop, shutdown) = mpsc::channel(1);
        stop.send(()).await.unwrap();

        let evaluations = watch_changes(&mut tracker, &mut presenter, &mut changes, shutdown).await;
        assert_eq!(evaluations, 1);
        assert!(!presenter.visible);
        assert_eq!(presenter.hidden, 1);
        assert!(tracker.store().get(keys::COMPLETION_SECTION_UNLOCKED).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_lesson_keys_are_ignored() {
        let ours = MemoryStore::new();
        let theirs = ours.open_context();
        let mut changes = ours.subscribe();
        let mut tracker = tracker(ours);
        let mut presenter = RecordingPresenter::default();
        let (stop, shutdown) = mpsc::channel(1);

        theirs.set(keys::COMPLETION_SECTION_UNLOCKED, "true").unwrap();
        theirs.set("theme", "dark").unwrap();
        stop.send(()).await.unwrap();

        let evaluations = watch_changes(&mut tracker, &mut presenter, &mut changes, shutdown).await;
        assert_eq!(evaluations, 0);
        assert_eq!(presenter.shown, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_wins_over_busy_stream() {
        let ours = MemoryStore::new();
        let theirs = ours.open_context();
        let mut changes = ours.subscribe();
        let mut tracker = tracker(ours);
        let mut presenter = RecordingPresenter::default();
        let (stop, shutdown) = mpsc::channel(1);

        let writer = tokio::spawn(async move {
            for i in 0u64.. {
                let _ = theirs.set("theme", &i.to_string());
                tokio::task::yield_now().await;
            }
        });
        tokio::task::yield_now().await;
        stop.send(()).await.unwrap();

        let evaluations = watch_changes(&mut tracker, &mut presenter, &mut changes, shutdown).await;
        writer.abort();
        assert_eq!(evaluations, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_queued_changes_evaluated_on_shutdown() {
        let ours = MemoryStore::new();
        let theirs = ours.open_context();
        let mut changes = ours.subscribe();
        let mut tracker = tracker(ours);
        let mut presenter = RecordingPresenter::default();
        let (stop, shutdown) = mpsc::channel(1);

        for id in tracker.course().lesson_ids() {
            theirs.set(id.as_str(), "true").unwrap();
        }
        stop.send(()).await.unwrap();

        let started = Instant::now();
        let evaluations = watch_changes(&mut tracker, &mut presenter, &mut changes, shutdown).await;
        assert_eq!(evaluations, 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert!(presenter.visible);
    }

    #[tokio::test(start_paused = true)]
    async fn test_works_without_memo() {
        let ours = MemoryStore::new();
        let theirs = ours.open_context();
        let mut changes = ours.subscribe();
        let mut tracker = tracker(ours).with_config(TrackerConfig {
            count_ttl: Duration::ZERO,
            debounce: Duration::ZERO,
            ..TrackerConfig::default()
        });
        let mut presenter = RecordingPresenter::default();
        let (stop, shutdown) = mpsc::channel(1);

        for id in tracker.course().lesson_ids() {
            theirs.set(id.as_str(), "true").unwrap();
        }
        stop.send(()).await.unwrap();

        let evaluations = watch_changes(&mut tracker, &mut presenter, &mut changes, shutdown).await;
        assert!(evaluations >= 1);
        assert!(presenter.visible);
        assert_eq!(presenter.shown, 1);
    }
}
