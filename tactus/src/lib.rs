//! # Tactus
//!
//! **Tactus** is a cooperative coroutine runtime for Rust, designed for hosts
//! that already own a tick loop (a game frame, a UI refresh, a simulation
//! step) and want to express multi-tick logic as straight-line routines.
//!
//! Unlike a general-purpose async runtime, Tactus has no executor thread,
//! no reactor and no wakers. The host calls `update()` once
//! per tick and every live coroutine advances by exactly one step, up to its
//! next suspension point. Everything between two suspension points runs
//! uninterrupted on the host's thread.
//!
//! Tactus offers:
//!
//! - A **coroutine engine** with a small lifecycle (waiting, running,
//!   completed, cancelled) and lazy, cooperative cancellation
//! - A closed **command vocabulary** (yield, await, reset, result) that
//!   routines use to talk to the engine
//! - **Awaitables** for delays, background work and nested coroutines
//! - **Pools and schedulers** that tick many coroutines as one unit, with an
//!   optional shared context
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tactus::{Co, Scheduler, delay};
//! use std::time::Duration;
//!
//! let scheduler = Scheduler::new();
//!
//! let greeting = scheduler.run_async(|co: Co<String>| async move {
//!     co.wait(delay(Duration::from_millis(100))).await;
//!     co.finish("Hello, world!".to_owned()).await;
//! });
//!
//! // The host loop.
//! while scheduler.update() {}
//!
//! assert_eq!(greeting.take_result().as_deref(), Some("Hello, world!"));
//! ```
//!
//! ## Modules
//!
//! - [`awaitable`] — Suspension sources: delays, background operations
//! - [`coroutine`] — The coroutine engine and its handles
//! - [`routine`] — The routine authoring surface and commands
//!
//! ## Getting Started
//!
//! Add Tactus to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! tactus = { git = "https://github.com/Nebula-ecosystem/Tactus", package = "tactus" }
//! ```

mod context;
mod error;
mod pool;
mod scheduler;
mod status;
mod utils;

pub mod awaitable;
pub mod coroutine;
pub mod routine;

pub use awaitable::{Awaitable, Background, Completer, Delay, Promise, Resolve, ResultCell, delay, promise};
pub use context::in_tick;
pub use coroutine::{Cooperative, Coroutine, CoroutineHandle, CoroutineId, Join};
pub use error::{Error, Result};
pub use pool::Pool;
pub use routine::{Co, Command, Routine};
pub use scheduler::{ContextScheduler, Scheduler, SchedulerBuilder, SharedContext};
pub use status::{AwaiterStatus, Status};
