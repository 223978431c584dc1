//! Pending task set: append-only group of spawned tasks with snapshot joins
//!
//! ```text
//!   spawn(a) spawn(b)  snapshot()  spawn(c)
//!      │        │          │          │
//!      └────────┴──── [a, b] ─────────┘   snapshot.join() waits on a, b only
//!                                          drain() waits on a, b, c
//! ```
//!
//! A snapshot only ever contains tasks spawned strictly before it was taken.
use crate::plugin::{PluginError, PluginOutcome};
use futures::future::{join_all, BoxFuture, Shared};
use futures::FutureExt;
use std::future::Future;

/// Handle of one spawned task, awaitable from several places
pub type TaskHandle = Shared<BoxFuture<'static, PluginOutcome>>;

#[derive(Default)]
pub struct PendingTaskSet {
    tasks: Vec<TaskHandle>,
}

impl PendingTaskSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `task` on the runtime and append it to the set.
    ///
    /// The task starts running immediately whether or not anyone awaits it.
    /// Must be called from within a tokio runtime.
    pub fn spawn<F>(&mut self, name: impl Into<String>, task: F)
    where
        F: Future<Output = PluginOutcome> + Send + 'static,
    {
        let name = name.into();
        let handle = tokio::spawn(task);
        let joined = async move {
            match handle.await {
                Ok(outcome) => outcome,
                Err(error) => PluginOutcome::failure(
                    name,
                    PluginError::new(anyhow::anyhow!("task did not complete: {}", error)),
                ),
            }
        }
        .boxed()
        .shared();
        self.tasks.push(joined);
    }

    /// Tasks spawned so far
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tasks: self.tasks.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Await every task, outcomes in spawn order
    pub async fn drain(&mut self) -> Vec<PluginOutcome> {
        let tasks = std::mem::take(&mut self.tasks);
        join_all(tasks).await
    }
}

impl std::fmt::Debug for PendingTaskSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingTaskSet")
            .field("tasks", &self.tasks.len())
            .finish()
    }
}

/// Point-in-time copy of a [`PendingTaskSet`]
#[derive(Clone)]
pub struct Snapshot {
    tasks: Vec<TaskHandle>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Await exactly the tasks captured by this snapshot
    pub async fn join(self) -> Vec<PluginOutcome> {
        join_all(self.tasks).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_drain_returns_in_spawn_order() {
        let mut pending = PendingTaskSet::new();
        pending.spawn("slow", async {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            PluginOutcome::success("slow", json!(1))
        });
        pending.spawn("fast", async { PluginOutcome::success("fast", json!(2)) });

        let outcomes = pending.drain().await;
        let names: Vec<&str> = outcomes.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["slow", "fast"]);
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_excludes_later_tasks() {
        let mut pending = PendingTaskSet::new();
        pending.spawn("before", async { PluginOutcome::success("before", json!(true)) });
        let snapshot = pending.snapshot();

        let (release, gate) = oneshot::channel::<()>();
        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();
        pending.spawn("after", async move {
            let _ = gate.await;
            flag.store(true, Ordering::SeqCst);
            PluginOutcome::success("after", json!(true))
        });

        // would hang if the snapshot waited on "after"
        let joined = snapshot.join().await;
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].name, "before");
        assert!(!finished.load(Ordering::SeqCst));

        release.send(()).unwrap();
        let all = pending.drain().await;
        assert_eq!(all.len(), 2);
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_same_task_joined_twice() {
        let mut pending = PendingTaskSet::new();
        pending.spawn("shared", async { PluginOutcome::success("shared", json!("v")) });
        let first = pending.snapshot().join().await;
        let second = pending.drain().await;
        assert_eq!(first[0].name, second[0].name);
        assert_eq!(second[0].result.as_ref().unwrap(), &json!("v"));
    }

    #[tokio::test]
    #[allow(unreachable_code)]
    async fn test_panicking_task_becomes_failure() {
        let mut pending = PendingTaskSet::new();
        pending.spawn("broken", async {
            panic!("boom");
            PluginOutcome::success("broken", json!(null))
        });
        let outcomes = pending.drain().await;
        assert_eq!(outcomes[0].name, "broken");
        assert!(outcomes[0].result.is_err());
    }
}
