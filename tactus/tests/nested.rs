mod common;

use tactus::{Co, Command, Coroutine, CoroutineHandle, ResultCell, Scheduler, Status};

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn countdown(yields: usize, result: i32) -> Coroutine<i32> {
    Coroutine::new(move || {
        std::iter::repeat_with(|| Command::Yield)
            .take(yields)
            .chain(std::iter::once(Command::Result(result)))
    })
}

/// Counts every resume in `steps` and finishes with the count once it
/// reaches `limit`.
fn counted(steps: Arc<AtomicUsize>, limit: usize) -> Coroutine<usize> {
    Coroutine::new(move || {
        let steps = steps.clone();

        std::iter::from_fn(move || {
            let step = steps.fetch_add(1, Ordering::SeqCst) + 1;

            if step < limit {
                Some(Command::Yield)
            } else {
                Some(Command::Result(step))
            }
        })
    })
}

#[test]
fn parent_is_suspended_until_child_completes() {
    common::init_logging();

    let steps = Arc::new(AtomicUsize::new(0));
    let shared = steps.clone();

    let mut parent = Coroutine::from_async(move |co: Co<i32>| {
        let steps = shared.clone();

        async move {
            steps.fetch_add(1, Ordering::SeqCst);
            let value = co.join(countdown(3, 10)).await;
            steps.fetch_add(1, Ordering::SeqCst);

            co.finish(value.unwrap_or_default() * 2).await;
        }
    });

    assert!(parent.update());
    assert_eq!(steps.load(Ordering::SeqCst), 1);

    // One tick per child yield, the parent routine does not move.
    for _ in 0..3 {
        assert!(parent.update());
        assert_eq!(steps.load(Ordering::SeqCst), 1);
    }

    // The child finishes and the parent resumes within the same tick.
    assert!(!parent.update());
    assert_eq!(steps.load(Ordering::SeqCst), 2);
    assert_eq!(parent.take_result(), Some(20));
}

#[test]
fn child_result_is_forwarded_through_the_cell() {
    let (command, value) = Command::<()>::join(countdown(1, 7));

    let mut pending = Some(command);
    let mut parent = Coroutine::new(move || pending.take().into_iter());

    assert!(parent.update());
    assert!(!value.is_set());

    parent.wait();

    assert_eq!(value.take(), Some(7));
}

#[test]
fn nested_grandchildren_each_take_their_ticks() {
    common::init_logging();

    let mut root = Coroutine::from_async(|co: Co<i32>| async move {
        let middle = Coroutine::from_async(|co: Co<i32>| async move {
            let leaf = co.join(countdown(2, 1)).await.unwrap_or_default();
            co.finish(leaf + 1).await;
        });

        let value = co.join(middle).await.unwrap_or_default();
        co.finish(value + 1).await;
    });

    assert_eq!(root.get_result(), Some(3));
}

#[test]
fn shared_handle_child_is_driven_by_the_parent() {
    let child = CoroutineHandle::new(countdown(2, 5));
    let joined = child.clone();

    let mut parent = Coroutine::from_async(move |co: Co<bool>| {
        let child = joined.clone();

        async move {
            co.join(child).await;
            co.finish(true).await;
        }
    });

    assert_eq!(child.status(), Status::WaitingToRun);
    assert_eq!(parent.get_result(), Some(true));
    assert_eq!(child.status(), Status::RanToCompletion);

    // The join moved the result into the parent's routine.
    assert_eq!(child.take_result(), None);
}

#[test]
fn cancelled_child_releases_the_parent_without_a_result() {
    common::init_logging();

    let child = CoroutineHandle::new(Coroutine::<i32>::from_async(|co| async move {
        loop {
            co.yield_now().await;
        }
    }));
    let joined = child.clone();

    let mut parent = Coroutine::from_async(move |co: Co<bool>| {
        let child = joined.clone();

        async move {
            let value = co.join(child).await;
            co.finish(value.is_none()).await;
        }
    });

    assert!(parent.update());
    assert!(parent.update());
    assert_eq!(child.status(), Status::Running);

    child.cancel();

    assert!(!parent.update());
    assert_eq!(parent.take_result(), Some(true));
}

#[test]
fn scheduled_child_joined_by_a_sibling_is_ticked_once_per_update() {
    common::init_logging();

    let steps = Arc::new(AtomicUsize::new(0));
    let scheduler = Scheduler::new();

    let child = scheduler.spawn(counted(steps.clone(), usize::MAX));
    let joined = child.clone();

    let parent = scheduler.run_async(move |co: Co<()>| {
        let child = joined.clone();

        async move {
            co.join(child).await;
        }
    });

    assert!(child.is_enlisted());

    for update in 1..=4 {
        assert!(scheduler.update());
        assert_eq!(steps.load(Ordering::SeqCst), update, "one child step per update");
    }

    assert_eq!(parent.status(), Status::Running);
}

#[test]
fn sibling_join_is_released_when_the_scheduled_child_finishes() {
    common::init_logging();

    let steps = Arc::new(AtomicUsize::new(0));
    let scheduler = Scheduler::new();

    // The parent is registered first, so it looks at the child before the
    // child's own turn in every update.
    let slot = ResultCell::new();
    let parent = scheduler.run_async({
        let slot = slot.clone();

        move |co: Co<usize>| {
            let slot: ResultCell<CoroutineHandle<usize>> = slot.clone();

            async move {
                let Some(child) = slot.get() else {
                    return;
                };

                let value = co.join(child).await;
                co.finish(value.unwrap_or_default()).await;
            }
        }
    });

    let child = scheduler.spawn(counted(steps.clone(), 3));
    slot.set(child.clone());

    assert!(scheduler.update());
    assert!(scheduler.update());
    assert!(scheduler.update());
    assert_eq!(child.status(), Status::RanToCompletion);
    assert_eq!(parent.status(), Status::Running);

    // The parent sees the finished child on its next turn.
    assert!(!scheduler.update());
    assert_eq!(steps.load(Ordering::SeqCst), 3);
    assert_eq!(parent.take_result(), Some(3));
}

#[test]
fn cancelling_the_parent_leaves_a_scheduled_child_running() {
    let scheduler = Scheduler::new();

    let child = scheduler.spawn(countdown(8, 1));
    let joined = child.clone();

    let parent = scheduler.run_async(move |co: Co<()>| {
        let child = joined.clone();

        async move {
            co.join(child).await;
        }
    });

    assert!(scheduler.update());
    parent.cancel();

    assert!(scheduler.update());
    assert_eq!(parent.status(), Status::Canceled);
    assert_eq!(child.status(), Status::Running);

    scheduler.wait_all();
    assert_eq!(child.take_result(), Some(1));
}
