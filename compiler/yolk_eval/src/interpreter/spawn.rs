//! `spawn { ... }`: every block runs on its own OS thread.
//!
//! The language has no join or cancel. Hosts get one through [`TaskGroup`],
//! which records the handle of every task launched from an interpreter and
//! from the tasks it forked.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use yolk_ir::Block;

use super::{Flow, Interpreter};
use crate::environment::Environment;
use crate::errors::EvalError;

#[derive(Default)]
struct TaskGroupInner {
    handles: Mutex<Vec<JoinHandle<()>>>,
    launched: AtomicUsize,
}

/// Join handles of spawned tasks, shared by an interpreter and its forks.
#[derive(Clone, Default)]
pub struct TaskGroup {
    inner: Arc<TaskGroupInner>,
}

impl TaskGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks launched so far.
    pub fn launched(&self) -> usize {
        self.inner.launched.load(Ordering::Relaxed)
    }

    /// Tasks that have not finished yet.
    pub fn pending(&self) -> usize {
        self.inner
            .handles
            .lock()
            .iter()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    /// Join every recorded task, including tasks spawned while joining.
    pub fn join_all(&self) {
        loop {
            let handles = std::mem::take(&mut *self.inner.handles.lock());
            if handles.is_empty() {
                return;
            }
            handles.into_iter().for_each(join_logged);
        }
    }

    fn next_id(&self) -> usize {
        self.inner.launched.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Keep `handle`, reaping tasks that already finished.
    fn record(&self, handle: JoinHandle<()>) {
        let finished = {
            let mut handles = self.inner.handles.lock();
            let (finished, running) = std::mem::take(&mut *handles)
                .into_iter()
                .partition::<Vec<_>, _>(JoinHandle::is_finished);
            *handles = running;
            handles.push(handle);
            finished
        };
        finished.into_iter().for_each(join_logged);
    }
}

fn join_logged(handle: JoinHandle<()>) {
    let name = handle.thread().name().unwrap_or("<unnamed>").to_string();
    if handle.join().is_err() {
        tracing::warn!(task = %name, "task panicked");
    }
}

impl fmt::Debug for TaskGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskGroup")
            .field("launched", &self.launched())
            .field("recorded", &self.inner.handles.lock().len())
            .finish()
    }
}

/// Log how a task ended. Failures stay inside the task.
fn report(task: &str, outcome: Result<Flow, EvalError>) {
    match outcome {
        Ok(Flow::Normal | Flow::Return(_)) => tracing::trace!(task, "task finished"),
        Ok(Flow::Raised(err)) => {
            tracing::warn!(task, error = %err.message, "task stopped on an error");
        }
        Ok(Flow::Break | Flow::Continue) => {
            tracing::warn!(task, "break or continue outside a loop in task");
        }
        Err(err) => tracing::warn!(task, error = %err, "task failed"),
    }
}

impl Interpreter {
    /// Launch `block` on a new thread, in a child of `env`.
    ///
    /// The task shares every binding reachable from `env` and owns its own
    /// defers.
    pub(crate) fn spawn_block(&mut self, block: Arc<Block>, env: &Environment) -> Result<(), EvalError> {
        let mut task = self.fork();
        let frame = env.call_frame();
        let name = format!("{}{}", self.config.task_name_prefix, self.tasks.next_id());

        let task_name = name.clone();
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                let outcome = task.exec_block(&block.stmts, &frame);
                let outcome = task.finish_frame(&frame, outcome);
                report(&task_name, outcome);
            })
            .map_err(|err| EvalError::new(format!("failed to spawn task: {err}")))?;

        self.tasks.record(handle);
        tracing::debug!(task = %name, "spawned task");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_join_all_waits_for_nested_handles() {
        let group = TaskGroup::new();
        let inner = group.clone();
        let counter = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&counter);
        let first = thread::spawn(move || {
            let seen2 = Arc::clone(&seen);
            inner.record(thread::spawn(move || {
                seen2.fetch_add(1, Ordering::SeqCst);
            }));
            seen.fetch_add(1, Ordering::SeqCst);
        });
        group.record(first);
        group.join_all();
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(group.pending(), 0);
    }

    #[test]
    fn test_record_reaps_finished_tasks() {
        let group = TaskGroup::new();
        group.record(thread::spawn(|| {}));
        while group.pending() > 0 {
            thread::yield_now();
        }
        let (release, wait) = std::sync::mpsc::channel::<()>();
        group.record(thread::spawn(move || {
            let _ = wait.recv();
        }));
        assert_eq!(group.inner.handles.lock().len(), 1);
        assert_eq!(group.pending(), 1);
        drop(release);
        group.join_all();
        assert_eq!(group.inner.handles.lock().len(), 0);
    }

    #[test]
    fn test_task_ids_count_up() {
        let group = TaskGroup::new();
        assert_eq!(group.next_id(), 1);
        assert_eq!(group.next_id(), 2);
        assert_eq!(group.launched(), 2);
    }
}
