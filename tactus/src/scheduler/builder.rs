use super::{ContextScheduler, DEFAULT_NAME, Scheduler};

/// Builder for configuring and creating a scheduler.
///
/// `SchedulerBuilder` allows customizing scheduler parameters before
/// constructing it: the name recorded on its tracing spans and the
/// initial capacity of its member set.
///
/// # Examples
///
/// ```rust,ignore
/// let scheduler = SchedulerBuilder::new()
///     .name("ui")
///     .capacity(64)
///     .build();
/// ```
pub struct SchedulerBuilder {
    /// Name attached to tracing spans.
    name: String,

    /// Number of members the scheduler has room for up front.
    capacity: usize,
}

impl SchedulerBuilder {
    /// Creates a new `SchedulerBuilder` with default configuration.
    ///
    /// By default the scheduler is named `"tactus"` and starts with an
    /// empty member set.
    pub fn new() -> Self {
        Self {
            name: DEFAULT_NAME.to_owned(),
            capacity: 0,
        }
    }

    /// Sets the name attached to the scheduler's tracing spans.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Pre-sizes the member set for `capacity` coroutines.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let builder = SchedulerBuilder::new()
    ///     .capacity(128);
    /// ```
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Builds the scheduler with the configured options.
    pub fn build(self) -> Scheduler {
        Scheduler::with_config(self.name, self.capacity)
    }

    /// Builds a [`ContextScheduler`] sharing `value` with every routine.
    pub fn build_with_context<C>(self, value: C) -> ContextScheduler<C>
    where
        C: Send + 'static,
    {
        ContextScheduler::with_scheduler(self.build(), value)
    }
}

impl Default for SchedulerBuilder {
    /// Creates a default `SchedulerBuilder`.
    fn default() -> Self {
        Self::new()
    }
}
