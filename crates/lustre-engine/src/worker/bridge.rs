use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use crate::logging::WORKER_TARGET;
use crate::script::console::{ConsoleEnv, HostFunction};

use super::task::{self, TaskId, TaskOutcome, TaskSpec};
use super::value::ScriptValue;

/// Parameters of one `Launch` call.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    /// Chunk source; script strings are bytes and need not be UTF-8.
    pub source: Vec<u8>,
    /// Main-object method that receives the results.
    pub callback: String,
    /// Host functions installed into the worker interpreter.
    pub exposed: Vec<HostFunction>,
    pub args: Vec<ScriptValue>,
}

/// A finished task handed back to the main thread.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub id: TaskId,
    pub callback: String,
    pub outcome: TaskOutcome,
}

struct WorkerTask {
    id: TaskId,
    callback: String,
    abort: Arc<AtomicBool>,
    handle: JoinHandle<TaskOutcome>,
}

/// Runs scripts on dedicated threads, one isolated interpreter each.
///
/// Tasks are kept in creation order; [`take_finished`](Self::take_finished)
/// hands finished ones back in that order regardless of the order in which
/// their threads ended. A task is forgotten only after its thread has been
/// joined.
pub struct WorkerBridge {
    env: ConsoleEnv,
    tasks: Vec<WorkerTask>,
    next_id: TaskId,
}

impl WorkerBridge {
    /// `env` is shared by every worker's console functions.
    pub fn new(env: ConsoleEnv) -> Self {
        Self { env, tasks: Vec::new(), next_id: 1 }
    }

    /// Starts `spec` on a new thread and returns its id immediately.
    pub fn launch(&mut self, spec: LaunchSpec) -> io::Result<TaskId> {
        let id = self.next_id;
        let abort = Arc::new(AtomicBool::new(false));

        let task_spec = TaskSpec {
            id,
            source: spec.source,
            exposed: spec.exposed,
            args: spec.args,
            env: self.env.clone(),
        };
        let flag = Arc::clone(&abort);
        let handle = thread::Builder::new()
            .name(format!("lustre-worker-{id}"))
            .spawn(move || task::run(task_spec, flag))?;

        self.next_id += 1;
        self.tasks.push(WorkerTask { id, callback: spec.callback, abort, handle });
        log::debug!(target: WORKER_TARGET, "task {id} launched");
        Ok(id)
    }

    /// True while the task's thread has not finished.
    pub fn is_running(&self, id: TaskId) -> bool {
        self.tasks
            .iter()
            .any(|t| t.id == id && !t.handle.is_finished())
    }

    /// Requests cooperative cancellation. Returns false for unknown ids.
    pub fn abort(&self, id: TaskId) -> bool {
        match self.tasks.iter().find(|t| t.id == id) {
            Some(t) => {
                t.abort.store(true, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Number of tasks not yet handed back.
    #[inline]
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Joins every finished task and returns them in creation order.
    ///
    /// Aborted tasks are joined and dropped without a completion.
    pub fn take_finished(&mut self) -> Vec<Completion> {
        let mut done = Vec::new();
        let mut i = 0;
        while i < self.tasks.len() {
            if !self.tasks[i].handle.is_finished() {
                i += 1;
                continue;
            }
            // `remove` keeps the remaining tasks in creation order.
            let task = self.tasks.remove(i);
            let aborted = task.abort.load(Ordering::Relaxed);
            let outcome = match task.handle.join() {
                Ok(outcome) => outcome,
                Err(_) => TaskOutcome::Failed("worker thread panicked".to_string()),
            };
            if aborted || outcome == TaskOutcome::Aborted {
                log::debug!(target: WORKER_TARGET, "task {} discarded after abort", task.id);
                continue;
            }
            done.push(Completion { id: task.id, callback: task.callback, outcome });
        }
        done
    }
}

impl Drop for WorkerBridge {
    fn drop(&mut self) {
        for t in &self.tasks {
            t.abort.store(true, Ordering::Relaxed);
        }
        for t in self.tasks.drain(..) {
            if t.handle.join().is_err() {
                log::warn!(target: WORKER_TARGET, "task {} panicked during shutdown", t.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{Duration, Instant};

    fn bridge() -> WorkerBridge {
        WorkerBridge::new(ConsoleEnv {
            start: Instant::now(),
            script_dir: PathBuf::from("."),
            user_dir: PathBuf::from("."),
            log_target: WORKER_TARGET,
        })
    }

    fn launch(b: &mut WorkerBridge, source: &str, args: Vec<ScriptValue>) -> TaskId {
        b.launch(LaunchSpec {
            source: source.as_bytes().to_vec(),
            callback: "OnTaskFinished".to_string(),
            exposed: vec![],
            args,
        })
        .unwrap()
    }

    fn drain(b: &mut WorkerBridge) -> Vec<Completion> {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut all = Vec::new();
        while b.pending() > 0 && Instant::now() < deadline {
            all.extend(b.take_finished());
            thread::sleep(Duration::from_millis(5));
        }
        all
    }

    // Busy-waits so the test does not depend on an exposed sleep function.
    const SPIN: &str = "local n = ... local t = os.clock() while os.clock() - t < n do end return n";

    #[test]
    fn delivers_in_creation_order_when_finishing_in_reverse() {
        let mut b = bridge();
        let slow = launch(&mut b, SPIN, vec![ScriptValue::Number(0.3)]);
        let fast = launch(&mut b, SPIN, vec![ScriptValue::Number(0.0)]);

        // Wait until only the fast one is done; it must not be handed out
        // ahead of the slow one within the same poll.
        let deadline = Instant::now() + Duration::from_secs(10);
        while b.is_running(slow) && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }

        let got = drain(&mut b);
        let ids: Vec<TaskId> = got.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![slow, fast]);
        assert_eq!(b.pending(), 0);
    }

    #[test]
    fn finished_task_is_delivered_while_an_earlier_one_is_held() {
        let dir = tempfile::tempdir().unwrap();
        let gate = dir.path().join("release");
        let gate_arg = ScriptValue::String(gate.to_string_lossy().into_owned().into_bytes());

        let mut b = bridge();
        let held = launch(
            &mut b,
            "local gate = ... while not io.open(gate) do end return 'held'",
            vec![gate_arg],
        );
        let quick = launch(&mut b, "return 'quick'", vec![]);

        let deadline = Instant::now() + Duration::from_secs(10);
        let mut first = Vec::new();
        while first.is_empty() && Instant::now() < deadline {
            first = b.take_finished();
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(first.iter().map(|c| c.id).collect::<Vec<_>>(), vec![quick]);
        assert!(b.is_running(held));
        assert_eq!(b.pending(), 1);
        assert!(b.take_finished().is_empty());

        std::fs::write(&gate, b"").unwrap();
        let second = drain(&mut b);
        assert_eq!(second.iter().map(|c| c.id).collect::<Vec<_>>(), vec![held]);
        assert_eq!(
            second[0].outcome,
            TaskOutcome::Returned(crate::worker::Marshaled {
                values: vec![ScriptValue::String(b"held".to_vec())],
                error: None,
            })
        );
        assert_eq!(b.pending(), 0);
    }

    #[test]
    fn each_task_is_delivered_exactly_once() {
        let mut b = bridge();
        let ids: Vec<TaskId> = (0..4)
            .map(|i| launch(&mut b, "return ...", vec![ScriptValue::Integer(i)]))
            .collect();
        let got = drain(&mut b);
        assert_eq!(got.iter().map(|c| c.id).collect::<Vec<_>>(), ids);
        assert!(b.take_finished().is_empty());
        for (i, c) in got.iter().enumerate() {
            assert_eq!(
                c.outcome,
                TaskOutcome::Returned(crate::worker::Marshaled {
                    values: vec![ScriptValue::Integer(i as i64)],
                    error: None,
                })
            );
        }
    }

    #[test]
    fn aborted_tasks_are_dropped_silently() {
        let mut b = bridge();
        let id = launch(&mut b, "while true do end", vec![]);
        assert!(b.is_running(id));
        assert!(b.abort(id));
        assert!(drain(&mut b).is_empty());
        assert!(!b.is_running(id));
        assert!(!b.abort(id));
    }

    #[test]
    fn drop_stops_runaway_tasks() {
        let mut b = bridge();
        launch(&mut b, "while true do end", vec![]);
        drop(b);
    }
}
