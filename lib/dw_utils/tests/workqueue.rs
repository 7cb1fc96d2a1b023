use dw_utils::errors::WorkQueueError;
use dw_utils::workqueue::{run, Runner, WorkQueueOptions, WorkerContext};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, PartialEq)]
enum TestError {
    Queue(WorkQueueError),
    Failed(u32),
}

impl From<WorkQueueError> for TestError {
    fn from(err: WorkQueueError) -> Self {
        Self::Queue(err)
    }
}

fn options(num_threads: usize, push: bool, runner: Runner) -> WorkQueueOptions {
    WorkQueueOptions {
        num_threads,
        push_tasks_while_running: push,
        runner,
    }
}

#[test]
fn all_tasks_are_executed() {
    let sum = AtomicUsize::new(0);
    let result: Result<(), TestError> = run(
        |_, n: usize| {
            sum.fetch_add(n, Ordering::Relaxed);
            Ok(())
        },
        1..=100,
        &options(4, false, Runner::Threads),
    );
    assert_eq!(result, Ok(()));
    assert_eq!(sum.load(Ordering::Relaxed), 5050);
}

#[test]
fn empty_task_set_terminates() {
    let result: Result<(), TestError> =
        run(|_, _: u32| Ok(()), Vec::new(), &options(3, true, Runner::Threads));
    assert_eq!(result, Ok(()));
}

#[test]
fn tasks_can_push_tasks() {
    // Task `n` spawns two tasks `n - 1`: a binary tree of 2^(d+1) - 1 tasks.
    let count = AtomicUsize::new(0);
    let result: Result<(), TestError> = run(
        |ctx: &WorkerContext<'_, u32>, depth: u32| {
            count.fetch_add(1, Ordering::Relaxed);
            if depth > 0 {
                ctx.push_task(depth - 1)?;
                ctx.push_task(depth - 1)?;
            }
            Ok(())
        },
        [8],
        &options(4, true, Runner::Threads),
    );
    assert_eq!(result, Ok(()));
    assert_eq!(count.load(Ordering::Relaxed), 511);
}

#[test]
fn push_is_rejected_when_not_allowed() {
    let result: Result<(), TestError> = run(
        |ctx: &WorkerContext<'_, u32>, n: u32| {
            ctx.push_task(n + 1)?;
            Ok(())
        },
        [0],
        &options(2, false, Runner::Threads),
    );
    assert_eq!(result, Err(TestError::Queue(WorkQueueError::PushWhileRunning)));
}

#[test]
fn zero_threads_is_an_error() {
    let result: Result<(), TestError> =
        run(|_, _: u32| Ok(()), [1, 2, 3], &options(0, false, Runner::Threads));
    assert_eq!(result, Err(TestError::Queue(WorkQueueError::NoThreads)));
}

#[test]
fn error_is_reported() {
    let result: Result<(), TestError> = run(
        |_, n: u32| {
            if n == 7 {
                Err(TestError::Failed(n))
            } else {
                Ok(())
            }
        },
        0..20,
        &options(3, false, Runner::Threads),
    );
    assert_eq!(result, Err(TestError::Failed(7)));
}

#[test]
fn single_worker_reports_first_error() {
    let result: Result<(), TestError> = run(
        |_, n: u32| {
            if n % 2 == 1 {
                Err(TestError::Failed(n))
            } else {
                Ok(())
            }
        },
        [0, 2, 4],
        &options(1, false, Runner::Threads),
    );
    assert_eq!(result, Ok(()));

    // A single worker pops its own queue from the back.
    let result: Result<(), TestError> = run(
        |_, n: u32| {
            if n % 2 == 1 {
                Err(TestError::Failed(n))
            } else {
                Ok(())
            }
        },
        [1, 3, 4],
        &options(1, false, Runner::Threads),
    );
    assert_eq!(result, Err(TestError::Failed(3)));
}

#[test]
fn panics_are_propagated() {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let _: Result<(), TestError> = run(
            |_, n: u32| {
                if n == 3 {
                    panic!("task {n} failed");
                }
                Ok(())
            },
            0..10,
            &options(2, false, Runner::Threads),
        );
    }));
    assert!(outcome.is_err());
}

#[test]
fn rayon_runner() {
    let sum = AtomicUsize::new(0);
    let result: Result<(), TestError> = run(
        |ctx: &WorkerContext<'_, usize>, n: usize| {
            sum.fetch_add(n, Ordering::Relaxed);
            if n >= 10 {
                ctx.push_task(n / 10)?;
            }
            Ok(())
        },
        [10, 20, 30],
        &options(3, true, Runner::Rayon),
    );
    assert_eq!(result, Ok(()));
    assert_eq!(sum.load(Ordering::Relaxed), 66);
}

#[test]
fn custom_sequential_runner() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&calls);
    let runner = Runner::Custom(Arc::new(move |n, body| {
        for worker_id in 0..n {
            recorded.lock().unwrap().push(worker_id);
            body(worker_id);
        }
    }));

    let seen = Mutex::new(Vec::new());
    let result: Result<(), TestError> = run(
        |_, n: u32| {
            seen.lock().unwrap().push(n);
            Ok(())
        },
        0..6,
        &options(3, false, runner),
    );
    assert_eq!(result, Ok(()));
    assert_eq!(*calls.lock().unwrap(), vec![0, 1, 2]);
    let mut seen = seen.into_inner().unwrap();
    seen.sort_unstable();
    assert_eq!(seen, vec![0, 1, 2, 3, 4, 5]);
}

#[test]
fn worker_ids_are_in_range() {
    let max = AtomicUsize::new(0);
    let result: Result<(), TestError> = run(
        |ctx: &WorkerContext<'_, u32>, _| {
            max.fetch_max(ctx.worker_id(), Ordering::Relaxed);
            Ok(())
        },
        0..50,
        &options(4, false, Runner::Threads),
    );
    assert_eq!(result, Ok(()));
    assert!(max.load(Ordering::Relaxed) < 4);
}
