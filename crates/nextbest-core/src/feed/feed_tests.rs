//! Tests for the passive feed: caching, optimistic status changes, dismissals.

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::api::NextQuery;
    use crate::task::Task;
    use chrono::Utc;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::{mpsc, oneshot};

    fn task(id: &str, status: TaskStatus) -> Task {
        let now = Utc::now();
        Task {
            id: id.into(),
            title: format!("Task {id}"),
            status,
            sort_order: 0.0,
            tags: vec![],
            project_id: None,
            goal_id: None,
            hard_due_at: None,
            soft_due_at: None,
            effort_minutes: Some(25.0),
            created_at: now.to_rfc3339(),
            updated_at: now.to_rfc3339(),
        }
    }

    fn item(id: &str) -> RecommendationItem {
        RecommendationItem {
            task: task(id, TaskStatus::Todo),
            score: 1.0,
            factors: None,
            why: "Due soon".into(),
        }
    }

    fn server_down() -> ApiError {
        ApiError::Status {
            endpoint: "tasks/T1".into(),
            status: 500,
            body: "internal error".into(),
        }
    }

    struct FixedSource {
        items: Vec<RecommendationItem>,
        calls: AtomicUsize,
    }

    impl FixedSource {
        fn new(ids: &[&str]) -> Self {
            Self {
                items: ids.iter().map(|id| item(id)).collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl RecommendationSource for FixedSource {
        async fn list_recommendations(&self, _limit: u32) -> Result<Vec<RecommendationItem>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.items.clone())
        }

        async fn get_next_recommendations(&self, _query: &NextQuery) -> Result<Vec<RecommendationItem>, ApiError> {
            Ok(vec![])
        }

        async fn suggest_week(&self, _limit: u32) -> Result<Vec<RecommendationItem>, ApiError> {
            Ok(vec![])
        }
    }

    /// Answers immediately, either accepting or refusing every change.
    struct ImmediateMutator {
        accept: bool,
    }

    impl TaskMutator for ImmediateMutator {
        async fn update_task_status(&self, task_id: &str, status: TaskStatus) -> Result<Option<Task>, ApiError> {
            if self.accept {
                Ok(Some(task(task_id, status)))
            } else {
                Err(server_down())
            }
        }

        async fn promote_tasks_to_week(&self, task_ids: &[String]) -> Result<usize, ApiError> {
            Ok(task_ids.len())
        }
    }

    /// Parks each status change until the test releases it.
    struct GatedMutator {
        gates: Mutex<VecDeque<oneshot::Receiver<Result<Option<Task>, ApiError>>>>,
        started: mpsc::UnboundedSender<String>,
        calls: AtomicUsize,
    }

    impl GatedMutator {
        fn new(
            gates: Vec<oneshot::Receiver<Result<Option<Task>, ApiError>>>,
        ) -> (Self, mpsc::UnboundedReceiver<String>) {
            let (started, rx) = mpsc::unbounded_channel();
            let mutator = Self {
                gates: Mutex::new(gates.into()),
                started,
                calls: AtomicUsize::new(0),
            };
            (mutator, rx)
        }
    }

    impl TaskMutator for GatedMutator {
        async fn update_task_status(&self, task_id: &str, status: TaskStatus) -> Result<Option<Task>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let gate = self.gates.lock().unwrap().pop_front();
            let _ = self.started.send(task_id.to_string());
            match gate {
                Some(rx) => rx.await.unwrap_or_else(|_| Err(server_down())),
                None => Ok(Some(task(task_id, status))),
            }
        }

        async fn promote_tasks_to_week(&self, task_ids: &[String]) -> Result<usize, ApiError> {
            Ok(task_ids.len())
        }
    }

    fn status_of<S, M>(feed: &RecommendationFeed<S, M>, id: &str) -> TaskStatus
    where
        S: RecommendationSource,
        M: TaskMutator,
    {
        feed.items()
            .into_iter()
            .find(|i| i.task.id == id)
            .map(|i| i.task.status)
            .unwrap()
    }

    #[tokio::test]
    async fn refresh_reads_through_cache() {
        let feed = RecommendationFeed::new(FixedSource::new(&["T1", "T2"]), ImmediateMutator { accept: true });

        assert_eq!(feed.refresh().await.unwrap().len(), 2);
        assert_eq!(feed.refresh().await.unwrap().len(), 2);
        assert_eq!(feed.source.calls.load(Ordering::SeqCst), 1);

        feed.cache().lock().unwrap().invalidate_all();
        feed.refresh().await.unwrap();
        assert_eq!(feed.source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn mark_done_is_visible_before_server_answers() {
        let (tx, rx) = oneshot::channel();
        let (mutator, mut started) = GatedMutator::new(vec![rx]);
        let feed = RecommendationFeed::new(FixedSource::new(&["T1", "T2"]), mutator);
        feed.refresh().await.unwrap();

        let check = async {
            started.recv().await;
            assert_eq!(status_of(&feed, "T1"), TaskStatus::Done);
            assert_eq!(status_of(&feed, "T2"), TaskStatus::Todo);
            let _ = tx.send(Ok(Some(task("T1", TaskStatus::Done))));
        };
        let (settlement, ()) = tokio::join!(feed.mark_done("T1"), check);

        assert_eq!(settlement.unwrap(), Settlement::Committed);
        assert!(feed.cache().lock().unwrap().get(&feed.key()).is_none());
        let notices = feed.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Info);
        assert!(feed.take_notices().is_empty());
    }

    #[tokio::test]
    async fn failed_mark_done_rolls_back_and_notifies() {
        let feed = RecommendationFeed::new(FixedSource::new(&["T1"]), ImmediateMutator { accept: false });
        feed.refresh().await.unwrap();

        let settlement = feed.mark_done("T1").await.unwrap();

        assert_eq!(settlement, Settlement::RolledBack);
        assert_eq!(status_of(&feed, "T1"), TaskStatus::Todo);
        assert!(feed.cache().lock().unwrap().is_stale(&feed.key()));

        let notices = feed.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert_eq!(notices[0].task_id.as_deref(), Some("T1"));
        assert!(notices[0].message.contains("500"));
    }

    #[tokio::test]
    async fn second_change_to_same_task_waits_for_first() {
        let (first_tx, first_rx) = oneshot::channel();
        let (second_tx, second_rx) = oneshot::channel();
        let (mutator, mut started) = GatedMutator::new(vec![first_rx, second_rx]);
        let feed = RecommendationFeed::new(FixedSource::new(&["T1"]), mutator);
        feed.refresh().await.unwrap();

        let driver = async {
            started.recv().await;
            for _ in 0..5 {
                tokio::task::yield_now().await;
            }
            assert_eq!(feed.mutator.calls.load(Ordering::SeqCst), 1);

            let _ = first_tx.send(Ok(None));
            started.recv().await;
            assert_eq!(feed.mutator.calls.load(Ordering::SeqCst), 2);
            let _ = second_tx.send(Ok(Some(task("T1", TaskStatus::Done))));
        };

        let (a, b, ()) = tokio::join!(
            feed.set_status("T1", TaskStatus::Doing),
            feed.set_status("T1", TaskStatus::Done),
            driver
        );
        assert_eq!(a.unwrap(), Settlement::Committed);
        assert_eq!(b.unwrap(), Settlement::Committed);
        assert_eq!(status_of(&feed, "T1"), TaskStatus::Done);
    }

    #[tokio::test]
    async fn refetch_during_change_keeps_optimistic_state() {
        let (tx, rx) = oneshot::channel();
        let (mutator, mut started) = GatedMutator::new(vec![rx]);
        let feed = RecommendationFeed::new(FixedSource::new(&["T1"]), mutator);
        feed.refresh().await.unwrap();

        let racer = async {
            started.recv().await;
            // The server still reports the old status.
            let items = feed.force_refresh().await.unwrap();
            assert_eq!(items[0].task.status, TaskStatus::Done);
            assert_eq!(status_of(&feed, "T1"), TaskStatus::Done);
            let _ = tx.send(Ok(Some(task("T1", TaskStatus::Done))));
        };
        let (settlement, ()) = tokio::join!(feed.mark_done("T1"), racer);
        assert_eq!(settlement.unwrap(), Settlement::Committed);
    }

    #[tokio::test]
    async fn dismiss_is_local_and_idempotent() {
        let feed = RecommendationFeed::new(FixedSource::new(&["T1", "T2"]), ImmediateMutator { accept: true });
        feed.refresh().await.unwrap();
        let before = feed.items();

        assert!(feed.dismiss("T1"));
        assert!(!feed.dismiss("T1"));
        assert!(feed.is_dismissed("T1"));
        assert_eq!(feed.top_recommendation().unwrap().task.id, "T2");
        assert_eq!(feed.items(), before);
        assert_eq!(feed.source.calls.load(Ordering::SeqCst), 1);

        // A refetch brings the task back into the cache but it stays hidden.
        feed.force_refresh().await.unwrap();
        assert!(feed.items().iter().any(|i| i.task.id == "T1"));
        assert_eq!(feed.top_recommendation().unwrap().task.id, "T2");

        feed.clear_dismissed();
        assert_eq!(feed.top_recommendation().unwrap().task.id, "T1");
    }

    #[tokio::test]
    async fn dismissing_everything_leaves_no_top() {
        let feed = RecommendationFeed::new(FixedSource::new(&["T1"]), ImmediateMutator { accept: true });
        feed.refresh().await.unwrap();
        feed.dismiss("T1");
        feed.dismiss("not-listed");
        assert!(feed.top_recommendation().is_none());
        assert!(feed.visible_items().is_empty());
    }

    #[tokio::test]
    async fn settlement_invalidates_other_modes() {
        let feed = RecommendationFeed::new(FixedSource::new(&["T1"]), ImmediateMutator { accept: true });
        feed.refresh().await.unwrap();
        let week = CacheKey::suggest_week(5);
        feed.cache().lock().unwrap().set(week, vec![item("T1")]);

        feed.mark_done("T1").await.unwrap();
        assert!(feed.cache().lock().unwrap().is_stale(&week));
    }
}
