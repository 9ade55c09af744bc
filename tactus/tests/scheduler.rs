mod common;

use tactus::{
    Background, Co, Command, ContextScheduler, ResultCell, Scheduler, SchedulerBuilder,
    SharedContext, Status, delay,
};

use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::Duration;

#[test]
fn restart_until_counter_reaches_zero() {
    common::init_logging();

    let counter = Arc::new(AtomicI32::new(5));
    let shared = counter.clone();

    let scheduler = Scheduler::new();
    let handle = scheduler.run(move || {
        let counter = shared.clone();

        std::iter::from_fn(move || {
            if counter.load(Ordering::SeqCst) == 0 {
                return None;
            }

            counter.fetch_sub(1, Ordering::SeqCst);
            Some(Command::<()>::Reset)
        })
    });

    scheduler.wait_all();

    assert_eq!(counter.load(Ordering::SeqCst), 0);
    assert_eq!(handle.status(), Status::RanToCompletion);
    assert_eq!(scheduler.status(), Status::RanToCompletion);
    assert!(scheduler.is_empty());
}

#[test]
fn awaited_background_value_is_captured() {
    common::init_logging();

    let captured = ResultCell::new();
    let sink = captured.clone();

    let scheduler = Scheduler::new();
    scheduler.run_async(move |co: Co<()>| {
        let sink = sink.clone();

        async move {
            let greeting = co
                .wait_for(Background::future(|| async { "Hello, world!".to_string() }))
                .await;

            if let Some(greeting) = greeting {
                sink.set(greeting);
            }
        }
    });

    scheduler.wait_all();

    assert_eq!(captured.take().as_deref(), Some("Hello, world!"));
}

#[test]
fn handle_outlives_the_scheduler_membership() {
    let scheduler = Scheduler::new();

    let handle = scheduler.run_async(|co: Co<u32>| async move {
        co.wait(delay(Duration::from_millis(5))).await;
        co.finish(42).await;
    });

    assert_eq!(handle.status(), Status::WaitingToRun);

    while scheduler.update() {}

    assert!(handle.is_finished());
    assert_eq!(handle.result(), Some(42));
    assert_eq!(handle.take_result(), Some(42));
    assert_eq!(handle.take_result(), None);
}

#[test]
fn cancelling_one_handle_removes_only_that_coroutine() {
    common::init_logging();

    let scheduler = Scheduler::new();
    let handles: Vec<_> = (0..3)
        .map(|_| {
            scheduler.run_async(|co: Co<()>| async move {
                loop {
                    co.yield_now().await;
                }
            })
        })
        .collect();

    assert!(scheduler.update());

    for (i, handle) in handles.iter().enumerate() {
        if i == 1 {
            handle.cancel();
        }
    }

    assert!(scheduler.update());
    assert_eq!(scheduler.len(), 2);
    assert_eq!(handles[1].status(), Status::Canceled);
    assert_eq!(scheduler.status(), Status::Running);

    scheduler.cancel();

    assert!(!scheduler.update());
    assert!(handles.iter().all(|handle| handle.status() == Status::Canceled));
}

#[test]
fn run_all_registers_every_factory() {
    let scheduler = Scheduler::new();

    let handles =
        scheduler.run_all((1..=3).map(|n| move || std::iter::once(Command::Result(n * 10))));

    assert_eq!(scheduler.len(), 3);

    scheduler.wait_all();

    let results: Vec<_> = handles.iter().map(|handle| handle.take_result()).collect();
    assert_eq!(results, [Some(10), Some(20), Some(30)]);
}

#[test]
fn dispose_cancels_registered_coroutines() {
    let scheduler = Scheduler::new();
    let handle = scheduler.run_async(|co: Co<()>| async move {
        loop {
            co.yield_now().await;
        }
    });

    scheduler.update();
    scheduler.dispose();

    assert!(scheduler.is_empty());
    assert_eq!(handle.status(), Status::Canceled);
}

#[test]
fn builder_configures_the_scheduler() {
    let scheduler = SchedulerBuilder::new().name("ui").capacity(16).build();

    assert_eq!(scheduler.name(), "ui");
    assert!(scheduler.is_empty());

    assert_eq!(Scheduler::new().name(), "tactus");
    assert_eq!(Scheduler::builder().build().name(), "tactus");
    assert_eq!(SchedulerBuilder::default().build().name(), "tactus");
}

#[test]
fn context_mutations_are_visible_later_in_the_same_tick() {
    common::init_logging();

    let scheduler = SchedulerBuilder::new().name("ctx").build_with_context(0u32);

    scheduler.run_async(|_co: Co<()>, ctx: SharedContext<u32>| async move {
        ctx.set(1);
    });

    let reader = scheduler.run_async(|co: Co<u32>, ctx: SharedContext<u32>| async move {
        co.finish(ctx.get()).await;
    });

    assert!(!scheduler.update());
    assert_eq!(reader.take_result(), Some(1));
    assert_eq!(scheduler.name(), "ctx");
}

#[test]
fn context_is_shared_across_restarts() {
    let scheduler = ContextScheduler::new(Vec::<u32>::new());

    let handle = scheduler.run(|ctx: SharedContext<Vec<u32>>| {
        std::iter::once_with(move || {
            let len = ctx.with(|seen| {
                seen.push(seen.len() as u32);
                seen.len()
            });

            if len < 4 {
                Command::Reset
            } else {
                Command::Result(len)
            }
        })
    });

    scheduler.wait_all();

    assert_eq!(handle.take_result(), Some(4));
    assert_eq!(scheduler.context().get(), [0, 1, 2, 3]);
}

#[test]
fn context_cancel_request_cancels_every_coroutine() {
    common::init_logging();

    let scheduler = ContextScheduler::<u32>::default();

    let watchers: Vec<_> = (0..2)
        .map(|_| {
            scheduler.run_async(|co: Co<()>, _ctx| async move {
                loop {
                    co.yield_now().await;
                }
            })
        })
        .collect();

    let requester = scheduler.run_async(|co: Co<()>, ctx: SharedContext<u32>| async move {
        co.yield_now().await;
        ctx.cancel();

        loop {
            co.yield_now().await;
        }
    });

    assert!(scheduler.update());
    assert!(scheduler.update());
    assert!(scheduler.context().is_cancel_requested());

    assert!(!scheduler.update());
    assert!(!scheduler.context().is_cancel_requested(), "request is consumed");
    assert!(watchers.iter().all(|handle| handle.status() == Status::Canceled));
    assert_eq!(requester.status(), Status::Canceled);
}

#[test]
#[should_panic(expected = "must not be called from inside a coroutine tick")]
fn wait_all_inside_a_tick_panics() {
    let scheduler = Arc::new(Scheduler::new());
    let inner = scheduler.clone();

    scheduler.run(move || {
        let inner = inner.clone();

        std::iter::once_with(move || {
            inner.wait_all();
            Command::<()>::Yield
        })
    });

    scheduler.update();
}

#[test]
fn routine_can_cancel_its_own_scheduler() {
    common::init_logging();

    let scheduler = Arc::new(Scheduler::new());
    let inner = scheduler.clone();

    let requester = scheduler.run_async(move |co: Co<()>| {
        let inner = inner.clone();

        async move {
            co.yield_now().await;
            inner.cancel();

            loop {
                co.yield_now().await;
            }
        }
    });

    let ticks = Arc::new(AtomicI32::new(0));
    let watcher = scheduler.run_async({
        let ticks = ticks.clone();

        move |co: Co<()>| {
            let ticks = ticks.clone();

            async move {
                loop {
                    ticks.fetch_add(1, Ordering::SeqCst);
                    co.yield_now().await;
                }
            }
        }
    });

    assert!(scheduler.update());
    assert!(scheduler.update());

    // The rest of the pass still ran before the request was applied.
    assert_eq!(ticks.load(Ordering::SeqCst), 2);
    assert_eq!(requester.status(), Status::Canceled);
    assert_eq!(watcher.status(), Status::Canceled);

    assert!(!scheduler.update());
    assert_eq!(ticks.load(Ordering::SeqCst), 2);
}

#[test]
#[should_panic(expected = "cannot be called from inside a tick of the pool or coroutine it targets")]
fn querying_the_scheduler_from_its_own_tick_panics() {
    let scheduler = Arc::new(Scheduler::new());
    let inner = scheduler.clone();

    scheduler.run(move || {
        let inner = inner.clone();

        std::iter::once_with(move || Command::Result(inner.len()))
    });

    scheduler.update();
}

#[test]
fn scheduler_stays_usable_after_an_in_tick_dispose_panics() {
    let scheduler = Arc::new(Scheduler::new());
    let inner = scheduler.clone();

    scheduler.run(move || {
        let inner = inner.clone();

        std::iter::once_with(move || {
            inner.dispose();
            Command::<()>::Yield
        })
    });

    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| scheduler.update()));
    assert!(outcome.is_err());

    // Nothing is left marked as inside the pass.
    assert_eq!(scheduler.len(), 1);
    scheduler.cancel();
    assert!(!scheduler.update());
}
