//! Work-stealing task queue.
//!
//! Every worker owns a double-ended queue of tasks: it pops its own tasks
//! from the back and, when it runs out of work, steals from the front of the
//! other workers' queues. The queue runs until every task, including the ones
//! pushed by running tasks, has completed.
//!
//! The first error returned by a task is reported once all workers are done;
//! tasks that have not started by then are dropped. A panicking task is
//! resumed on the calling thread after all workers have stopped.

use crate::errors::{WorkQueueError, WorkQueueResult};
use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;

/// Drives the workers of a queue: calls the body once per worker id, maybe
/// concurrently, and returns once every call has returned.
pub type CustomRunner = Arc<dyn Fn(usize, &(dyn Fn(usize) + Sync)) + Send + Sync>;

#[derive(Clone, Default)]
pub enum Runner {
    /// One scoped OS thread per worker.
    #[default]
    Threads,
    /// Workers are spawned in the current rayon thread pool.
    Rayon,
    Custom(CustomRunner),
}

impl fmt::Debug for Runner {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Threads => write!(f, "Threads"),
            Self::Rayon => write!(f, "Rayon"),
            Self::Custom(_) => write!(f, "Custom"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkQueueOptions {
    pub num_threads: usize,
    /// Whether running tasks may push new tasks.
    pub push_tasks_while_running: bool,
    pub runner: Runner,
}

impl Default for WorkQueueOptions {
    fn default() -> Self {
        Self {
            num_threads: thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
            push_tasks_while_running: false,
            runner: Runner::default(),
        }
    }
}

fn lock<U>(mutex: &Mutex<U>) -> MutexGuard<'_, U> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Queue<T> {
    deques: Vec<Mutex<VecDeque<T>>>,
    /// Tasks pushed and not yet finished.
    pending: AtomicUsize,
    idle: Mutex<()>,
    wakeup: Condvar,
    push_allowed: bool,
}

impl<T> Queue<T> {
    fn new(num_threads: usize, push_allowed: bool) -> Self {
        Self {
            deques: (0..num_threads).map(|_| Mutex::new(VecDeque::new())).collect(),
            pending: AtomicUsize::new(0),
            idle: Mutex::new(()),
            wakeup: Condvar::new(),
            push_allowed,
        }
    }

    fn push(&self, worker_id: usize, task: T) {
        self.pending.fetch_add(1, Ordering::AcqRel);
        lock(&self.deques[worker_id]).push_back(task);
        let _idle = lock(&self.idle);
        self.wakeup.notify_all();
    }

    fn pop(&self, worker_id: usize) -> Option<T> {
        if let Some(task) = lock(&self.deques[worker_id]).pop_back() {
            return Some(task);
        }
        let n = self.deques.len();
        (1..n).find_map(|offset| lock(&self.deques[(worker_id + offset) % n]).pop_front())
    }

    fn finish(&self) {
        if self.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            let _idle = lock(&self.idle);
            self.wakeup.notify_all();
        }
    }

    /// Blocks until some task can be popped (true) or every task has
    /// finished (false).
    fn wait(&self) -> bool {
        let mut idle = lock(&self.idle);
        loop {
            if self.pending.load(Ordering::Acquire) == 0 {
                return false;
            }
            if self.deques.iter().any(|deque| !lock(deque).is_empty()) {
                return true;
            }
            idle = self
                .wakeup
                .wait(idle)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

struct Failure<E> {
    failed: AtomicBool,
    error: Mutex<Option<E>>,
    panic: Mutex<Option<Box<dyn Any + Send>>>,
}

impl<E> Failure<E> {
    fn new() -> Self {
        Self {
            failed: AtomicBool::new(false),
            error: Mutex::new(None),
            panic: Mutex::new(None),
        }
    }

    fn record_error(&self, err: E) {
        self.failed.store(true, Ordering::Release);
        lock(&self.error).get_or_insert(err);
    }

    fn record_panic(&self, payload: Box<dyn Any + Send>) {
        self.failed.store(true, Ordering::Release);
        lock(&self.panic).get_or_insert(payload);
    }

    fn into_result(self) -> Result<(), E> {
        let panic = self.panic.into_inner().unwrap_or_else(PoisonError::into_inner);
        if let Some(payload) = panic {
            panic::resume_unwind(payload);
        }
        match self.error.into_inner().unwrap_or_else(PoisonError::into_inner) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Handle given to a running task.
pub struct WorkerContext<'q, T> {
    queue: &'q Queue<T>,
    worker_id: usize,
}

impl<'q, T> WorkerContext<'q, T> {
    pub fn worker_id(&self) -> usize {
        self.worker_id
    }

    /// Pushes a new task on the current worker's queue.
    pub fn push_task(&self, task: T) -> WorkQueueResult<()> {
        if !self.queue.push_allowed {
            return Err(WorkQueueError::PushWhileRunning);
        }
        self.queue.push(self.worker_id, task);
        Ok(())
    }
}

fn work<T, E, F>(queue: &Queue<T>, failure: &Failure<E>, executor: &F, worker_id: usize)
where
    F: Fn(&WorkerContext<'_, T>, T) -> Result<(), E>,
{
    let context = WorkerContext { queue, worker_id };
    let mut executed = 0usize;
    loop {
        match queue.pop(worker_id) {
            Some(task) => {
                if !failure.failed.load(Ordering::Acquire) {
                    executed += 1;
                    match panic::catch_unwind(AssertUnwindSafe(|| executor(&context, task))) {
                        Ok(Ok(())) => (),
                        Ok(Err(err)) => failure.record_error(err),
                        Err(payload) => failure.record_panic(payload),
                    }
                }
                queue.finish();
            }
            None => {
                if !queue.wait() {
                    break;
                }
            }
        }
    }
    log::trace!("worker {worker_id} stopped after {executed} tasks");
}

/// Runs `executor` on every task, and on every task pushed meanwhile, using
/// `options.num_threads` workers.
pub fn run<T, E, F, I>(executor: F, tasks: I, options: &WorkQueueOptions) -> Result<(), E>
where
    T: Send,
    E: From<WorkQueueError> + Send,
    F: Fn(&WorkerContext<'_, T>, T) -> Result<(), E> + Sync,
    I: IntoIterator<Item = T>,
{
    let num_threads = options.num_threads;
    if num_threads == 0 {
        return Err(WorkQueueError::NoThreads.into());
    }

    let queue = Queue::new(num_threads, options.push_tasks_while_running);
    for (i, task) in tasks.into_iter().enumerate() {
        queue.push(i % num_threads, task);
    }
    log::debug!(
        "running {} tasks on {num_threads} workers ({:?})",
        queue.pending.load(Ordering::Acquire),
        options.runner
    );

    let failure = Failure::new();
    let body = |worker_id: usize| work(&queue, &failure, &executor, worker_id);
    match &options.runner {
        Runner::Threads => thread::scope(|scope| {
            for worker_id in 0..num_threads {
                let body = &body;
                scope.spawn(move || body(worker_id));
            }
        }),
        Runner::Rayon => rayon::scope(|scope| {
            for worker_id in 0..num_threads {
                let body = &body;
                scope.spawn(move |_| body(worker_id));
            }
        }),
        Runner::Custom(runner) => runner(num_threads, &body),
    }

    failure.into_result()
}
