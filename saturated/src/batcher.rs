//! Batching queue implementation.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tracing::{debug, trace};

use crate::config::Options;
use crate::error::{Error, Result};
use crate::timer::Timer;

type Consumer<T> = Box<dyn Fn(Vec<T>) + Send + Sync>;

/// A batching queue that hands items to a consumer in groups.
///
/// Items are delivered when the queue reaches `max` items, when `interval`
/// elapses since the previous flush, or on an explicit [`flush`](Self::flush),
/// whichever comes first. The consumer is always called with the lock
/// released, so it may push into, flush, inspect or end the same batcher
/// (through a [`WeakBatcher`]).
///
/// # Semantics
///
/// - **Push**: Never blocks or rejects; flushes inline once `max` is reached
/// - **Flush**: Delivers up to `max` items from the front, even an empty batch
/// - **End**: Stops the timer for good, optionally flushing once first
///
/// # Example
///
/// ```
/// use saturated::{Batcher, Options};
/// use std::sync::{Arc, Mutex};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> saturated::Result<()> {
/// let batches = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&batches);
///
/// let batcher = Batcher::new(
///     move |batch: Vec<&'static str>| sink.lock().unwrap().push(batch),
///     Options::new().with_max(2),
/// )?;
///
/// assert_eq!(batcher.push("a"), 1);
/// assert_eq!(batcher.push("b"), 2); // reaches max, flushed inline
/// assert_eq!(batcher.size(), 0);
///
/// batcher.push("c");
/// batcher.end(true);
///
/// assert_eq!(*batches.lock().unwrap(), vec![vec!["a", "b"], vec!["c"]]);
/// # Ok(())
/// # }
/// ```
pub struct Batcher<T> {
    shared: Arc<Shared<T>>,
}

/// A non-owning handle to a [`Batcher`].
///
/// Consumers that need to reach their own batcher should capture one of these
/// rather than a `Batcher` clone, which would keep the instance alive forever.
pub struct WeakBatcher<T> {
    shared: Weak<Shared<T>>,
}

struct Shared<T> {
    state: Mutex<State<T>>,
    consumer: Consumer<T>,
    options: Options,
    runtime: Handle,
}

struct State<T> {
    queue: VecDeque<T>,
    timer: Timer,
    running: bool,
}

/// What caused a flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Manual,
    Saturated,
    Timer(u64),
    End,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Manual => write!(f, "manual"),
            Trigger::Saturated => write!(f, "max reached"),
            Trigger::Timer(epoch) => write!(f, "timer, epoch={}", epoch),
            Trigger::End => write!(f, "end"),
        }
    }
}

impl<T> Clone for Batcher<T> {
    fn clone(&self) -> Self {
        Batcher {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Clone for WeakBatcher<T> {
    fn clone(&self) -> Self {
        WeakBatcher {
            shared: Weak::clone(&self.shared),
        }
    }
}

impl<T: Send + 'static> Batcher<T> {
    /// Creates a running batcher on the current tokio runtime.
    ///
    /// The flush timer starts immediately. Returns [`Error::NoRuntime`] when
    /// called outside a runtime; use [`with_runtime`](Self::with_runtime) there.
    pub fn new<F>(consumer: F, options: Options) -> Result<Self>
    where
        F: Fn(Vec<T>) + Send + Sync + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| Error::NoRuntime)?;
        Self::with_runtime(consumer, options, runtime)
    }

    /// Creates a running batcher whose timer runs on `runtime`.
    ///
    /// The runtime must have the time driver enabled.
    pub fn with_runtime<F>(consumer: F, options: Options, runtime: Handle) -> Result<Self>
    where
        F: Fn(Vec<T>) + Send + Sync + 'static,
    {
        options.validate()?;

        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                queue: VecDeque::new(),
                timer: Timer::new(),
                running: true,
            }),
            consumer: Box::new(consumer),
            options,
            runtime,
        });
        shared.rearm();
        debug!(
            "Batcher started (interval={:?}, max={:?})",
            options.interval, options.max
        );

        Ok(Batcher { shared })
    }

    /// Appends an item and returns the new queue length.
    ///
    /// If the length reaches `max` while running, the queue is flushed before
    /// this returns; the returned length is the one observed right after the
    /// append.
    pub fn push(&self, item: T) -> usize {
        let (len, saturated) = {
            let mut state = self.shared.state.lock();
            state.queue.push_back(item);
            let len = state.queue.len();
            (len, state.running && self.shared.options.is_saturated(len))
        };

        if saturated {
            self.shared.flush(Trigger::Saturated);
        }
        len
    }

    /// Pushes every item in order, as repeated [`push`](Self::push) calls.
    ///
    /// Returns the length reported by the last push, or the current size when
    /// `items` is empty.
    pub fn extend<I>(&self, items: I) -> usize
    where
        I: IntoIterator<Item = T>,
    {
        items
            .into_iter()
            .fold(None, |_, item| Some(self.push(item)))
            .unwrap_or_else(|| self.size())
    }

    /// Delivers up to `max` items from the front of the queue to the consumer.
    ///
    /// The consumer is called exactly once, with an empty batch if nothing is
    /// queued. Restarts the interval while running. Returns the batch length.
    pub fn flush(&self) -> usize {
        self.shared.flush(Trigger::Manual)
    }

    /// Stops the batcher, optionally flushing once first.
    ///
    /// The final flush is capped at `max` like any other; anything beyond it
    /// stays queued and is never delivered automatically. Calling `end` again
    /// is a no-op apart from the optional flush.
    pub fn end(&self, flush_first: bool) {
        if flush_first {
            self.shared.flush(Trigger::End);
        }

        let mut state = self.shared.state.lock();
        state.timer.cancel();
        if state.running {
            state.running = false;
            debug!("Batcher stopped ({} items left queued)", state.queue.len());
        }
    }
}

impl<T> Batcher<T> {
    /// Returns the number of queued, not yet flushed items.
    pub fn size(&self) -> usize {
        self.shared.state.lock().queue.len()
    }

    /// Returns true if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Returns true until [`end`](Self::end) is called.
    pub fn is_running(&self) -> bool {
        self.shared.state.lock().running
    }

    /// Returns the options this batcher was created with.
    pub fn options(&self) -> &Options {
        &self.shared.options
    }

    /// Creates a [`WeakBatcher`] for this instance.
    pub fn downgrade(&self) -> WeakBatcher<T> {
        WeakBatcher {
            shared: Arc::downgrade(&self.shared),
        }
    }
}

impl<T> WeakBatcher<T> {
    /// Returns the batcher if it is still alive.
    pub fn upgrade(&self) -> Option<Batcher<T>> {
        self.shared.upgrade().map(|shared| Batcher { shared })
    }
}

impl<T> fmt::Debug for Batcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("Batcher")
            .field("size", &state.queue.len())
            .field("running", &state.running)
            .field("armed", &state.timer.is_armed())
            .field("options", &self.shared.options)
            .finish()
    }
}

impl<T> fmt::Debug for WeakBatcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakBatcher")
            .field("alive", &(self.shared.strong_count() > 0))
            .finish()
    }
}

impl<T: Send + 'static> Shared<T> {
    fn flush(self: &Arc<Self>, trigger: Trigger) -> usize {
        let batch: Vec<T> = {
            let mut state = self.state.lock();
            if let Trigger::Timer(epoch) = trigger {
                if !state.running || !state.timer.is_current(epoch) {
                    trace!("Ignoring stale timer wake-up (epoch={})", epoch);
                    return 0;
                }
            }
            state.timer.cancel();
            let n = self.options.batch_len(state.queue.len());
            state.queue.drain(..n).collect()
        };

        let len = batch.len();
        debug!("Flushing {} items ({})", len, trigger);

        // Re-armed on return and on unwind, so a panicking consumer does not
        // leave a running batcher without a timer.
        let _rearm = Rearm(self);
        (self.consumer)(batch);
        len
    }

    /// Schedule the next timer flush one interval from now, if running.
    fn rearm(self: &Arc<Self>) {
        let mut state = self.state.lock();
        if !state.running {
            return;
        }
        let shared = Arc::downgrade(self);
        state
            .timer
            .arm(&self.runtime, self.options.interval, move |epoch| {
                if let Some(shared) = shared.upgrade() {
                    shared.flush(Trigger::Timer(epoch));
                }
            });
    }
}

struct Rearm<'a, T: Send + 'static>(&'a Arc<Shared<T>>);

impl<T: Send + 'static> Drop for Rearm<'_, T> {
    fn drop(&mut self) {
        self.0.rearm();
    }
}
